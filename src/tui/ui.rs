use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use chrono::{Datelike, Local, Utc};
use crate::models::Task;
use crate::recycle_bin::days_left;
use crate::store::TaskStore;
use super::app::{App, InputField, InputMode, PendingAction, ViewMode};

pub fn ui<S: TaskStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // View
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let title = format!(
                "Taskbin - Tasks [status: {} | category: {}]",
                app.filter.status.label(),
                app.filter.category.as_deref().unwrap_or("any"),
            );
            let table = task_table(&app.tasks, &title);
            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Calendar => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(38), Constraint::Min(0)].as_ref())
                .split(chunks[0]);

            let rows: Vec<Row> = app
                .grid
                .chunks(7)
                .map(|week| {
                    Row::new(week.iter().map(|c| {
                        let label = format!("{:>2}{}", c.date.day(), if c.has_tasks { "*" } else { " " });
                        let mut style = Style::default();
                        if !c.in_month {
                            style = style.fg(Color::DarkGray);
                        } else if c.has_tasks {
                            style = style.fg(Color::Yellow);
                        }
                        if c.is_today {
                            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                        }
                        if c.is_selected {
                            style = style.bg(Color::DarkGray).add_modifier(Modifier::REVERSED);
                        }
                        Cell::from(label).style(style)
                    }).collect::<Vec<_>>())
                })
                .collect();

            let grid = Table::new(rows, [Constraint::Length(4); 7])
                .header(Row::new(vec!["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(format!("Taskbin - {}", app.month.title())));
            f.render_widget(grid, columns[0]);

            let title = format!("Due {}", app.selected_date);
            f.render_widget(task_table(&app.day_tasks, &title), columns[1]);
        }
        ViewMode::Bin => {
            let now = Utc::now();
            let rows: Vec<Row> = app
                .bin
                .iter()
                .map(|e| {
                    let left = days_left(e, now);
                    let style = if left <= 3 {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from(e.id().to_string()),
                        Cell::from(e.task.title.clone()),
                        Cell::from(e.task.category.clone()),
                        Cell::from(e.task.due_date.map(|d| d.to_string()).unwrap_or_default()),
                        Cell::from(e.deleted_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
                        Cell::from(format!("{}d", left.max(0))),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(18),
                Constraint::Length(8),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Category", "Due", "Deleted", "Expires"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Taskbin - Recycle Bin (kept 30 days)"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.bin_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | t: Title | e: Desc | u: Due | c: Category | Space: Toggle Done | d: Delete | f: Status | g: Category Filter | v: Calendar",
            ViewMode::Calendar => "q: Quit | Arrows/hjkl: Day | [ ]: Month | .: Today | v: Recycle Bin",
            ViewMode::Bin => "q: Quit | r: Restore | x: Delete Forever | E: Empty Bin | v: Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
        InputMode::Confirm => "y: Yes | n/Esc: No",
    };

    let mut help_block = Block::default().borders(Borders::ALL);
    if let Some(status) = &app.status {
        help_block = help_block.title(status.as_str());
    }
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(help_block);

    f.render_widget(help, chunks[1]);

    // Popups
    match app.input_mode {
        InputMode::Editing | InputMode::Adding => {
            let area = centered_rect(60, 3, f.area());
            f.render_widget(Clear, area);

            let title = match app.input_mode {
                InputMode::Adding => match app.add_state.step {
                    0 => "Add Task: Enter Title",
                    1 => "Add Task: Enter Description (Optional)",
                    2 => "Add Task: Enter Due Date (YYYY-MM-DD, Optional)",
                    3 => "Add Task: Enter Category (Optional)",
                    _ => "Add Task",
                },
                _ => match app.input_field {
                    InputField::Title => "Edit Title",
                    InputField::Description => "Edit Description",
                    InputField::Due => "Edit Due Date (YYYY-MM-DD, empty clears)",
                    InputField::Category => "Edit Category",
                    InputField::None => "Edit",
                },
            };

            let input = Paragraph::new(app.input_buffer.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title(title));

            f.render_widget(input, area);
        }
        InputMode::Confirm => {
            let question = match &app.pending {
                Some(PendingAction::Recycle(id)) => format!("Move task {} to the recycle bin? (y/n)", id),
                Some(PendingAction::Purge(entry)) => format!("Permanently delete task {}? This cannot be undone. (y/n)", entry.id()),
                Some(PendingAction::Empty) => "Empty the recycle bin? This cannot be undone. (y/n)".to_string(),
                None => String::new(),
            };
            let area = centered_rect(60, 3, f.area());
            f.render_widget(Clear, area);
            let popup = Paragraph::new(question)
                .style(Style::default().fg(Color::Red))
                .block(Block::default().borders(Borders::ALL).title("Confirm"));
            f.render_widget(popup, area);
        }
        InputMode::Normal => {}
    }
}

fn task_table<'a>(tasks: &'a [Task], title: &str) -> Table<'a> {
    let today = Local::now().date_naive();

    let rows: Vec<Row> = tasks
        .iter()
        .map(|t| {
            let overdue = !t.completed && t.due_date.is_some_and(|d| d < today);
            let style = if t.completed {
                Style::default().fg(Color::DarkGray)
            } else if overdue {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(t.id.to_string()),
                Cell::from(t.title.as_str()),
                Cell::from(t.category.as_str()),
                Cell::from(t.due_date.map(|d| d.to_string()).unwrap_or_default()),
                Cell::from(if t.completed { "Done" } else { "Pending" }),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Title", "Category", "Due", "Status"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ")
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
