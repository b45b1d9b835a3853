use std::io::{self, Write};
use chrono::{Datelike, Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crate::calendar::{Calendar, YearMonth};
use crate::models::{NewTask, Task, TaskFilter, TaskId, TaskUpdate};
use crate::recycle_bin::{days_left, RecycleBinManager};
use crate::store::TaskStore;

/// Parses a `YYYY-MM-DD` date, reporting the problem unless `silent`.
pub fn parse_date(input: &str, silent: bool) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(e) => {
            if !silent { eprintln!("Invalid date '{}': {}. Use YYYY-MM-DD.", input, e); }
            None
        }
    }
}

/// Asks a yes/no question on stdin. Anything but "y" is a no.
pub fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}

/// Adds a new task to the store.
pub async fn cmd_add<S: TaskStore>(store: &S, title: String, description: Option<String>, due: Option<String>, category: Option<String>, silent: bool) {
    let due_date = match due {
        Some(d) => match parse_date(&d, silent) {
            Some(date) => Some(date),
            None => return,
        },
        None => None,
    };
    let new_task = NewTask { title, description, due_date, category };
    match store.create(new_task).await {
        Ok(t) => { if !silent { println!("Task added (id = {})", t.id); } }
        Err(e) => { if !silent { eprintln!("Failed to add task: {}", e); } }
    }
}

/// Edits an existing task's details.
pub async fn cmd_edit<S: TaskStore>(store: &S, id: TaskId, title: Option<String>, description: Option<String>, due: Option<String>, category: Option<String>, clear_due: bool, silent: bool) {
    let mut update = TaskUpdate {
        title,
        description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
        category,
        ..Default::default()
    };
    if clear_due {
        update.due_date = Some(None);
    } else if let Some(d) = due {
        match parse_date(&d, silent) {
            Some(date) => update.due_date = Some(Some(date)),
            None => return,
        }
    }
    if update.is_empty() {
        if !silent { println!("Nothing to change."); }
        return;
    }
    match store.update(id, update).await {
        Ok(_) => { if !silent { println!("Task {} updated.", id); } }
        Err(e) => { if !silent { eprintln!("Failed to update task {}: {}", id, e); } }
    }
}

/// Flips a task between pending and done.
pub async fn cmd_toggle<S: TaskStore>(store: &S, id: TaskId, silent: bool) {
    let task = match store.get(id).await {
        Ok(t) => t,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return;
        }
    };
    match store.update(id, TaskUpdate::completed(!task.completed)).await {
        Ok(t) => {
            if !silent {
                let state = if t.completed { "complete" } else { "pending" };
                println!("Task {} marked as {}.", id, state);
            }
        }
        Err(e) => { if !silent { eprintln!("Failed to update task {}: {}", id, e); } }
    }
}

/// Moves a task to the recycle bin after confirmation.
pub async fn cmd_remove<S: TaskStore>(manager: &mut RecycleBinManager<S>, id: TaskId, force: bool, silent: bool) {
    if !force && !confirm(&format!("Move task {} to the recycle bin?", id)) {
        if !silent { println!("Aborted."); }
        return;
    }
    let remaining = manager.recycle(id).await;
    if !silent {
        if manager.is_recycled(id, &remaining) {
            println!("Task {} moved to the recycle bin. It will be kept for 30 days.", id);
        } else if remaining.iter().any(|t| t.id == id) {
            eprintln!("Failed to delete task {}; it is still active.", id);
        } else {
            println!("Task {} not found.", id);
        }
    }
}

/// Prints a single task.
pub async fn cmd_show<S: TaskStore>(store: &S, id: TaskId) {
    match store.get(id).await {
        Ok(t) => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.add_row(vec!["ID".to_string(), t.id.to_string()]);
            table.add_row(vec!["Title".to_string(), t.title.clone()]);
            table.add_row(vec!["Description".to_string(), t.description.clone().unwrap_or_default()]);
            table.add_row(vec!["Due".to_string(), t.due_date.map(|d| d.to_string()).unwrap_or_default()]);
            table.add_row(vec!["Category".to_string(), t.category.clone()]);
            table.add_row(vec!["Status".to_string(), status_label(&t).to_string()]);
            table.add_row(vec!["Created".to_string(), t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()]);
            println!("{table}");
        }
        Err(e) => eprintln!("{}", e),
    }
}

/// Lists tasks in store order, after applying `filter`.
pub async fn cmd_list<S: TaskStore>(store: &S, filter: &TaskFilter) {
    let tasks = match store.list().await {
        Ok(tasks) => filter.apply(tasks),
        Err(e) => {
            eprintln!("Failed to load tasks: {}", e);
            return;
        }
    };
    print_tasks(&tasks);
}

fn status_label(t: &Task) -> &'static str {
    if t.completed { "Done" } else { "Pending" }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let today = Local::now().date_naive();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let overdue = !t.completed && t.due_date.is_some_and(|d| d < today);
        let status_color = if t.completed { Color::Green } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title),
            Cell::new(&t.category),
            Cell::new(t.due_date.map(|d| d.to_string()).unwrap_or_default())
                .fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(status_label(t)).fg(status_color),
        ]);
    }
    println!("{table}");
}

/// Shows the recycle bin, purging expired entries first.
pub async fn cmd_bin_list<S: TaskStore>(manager: &mut RecycleBinManager<S>) {
    let entries = manager.open_bin().await.to_vec();
    if entries.is_empty() {
        println!("Recycle bin is empty.");
        return;
    }
    let now = chrono::Utc::now();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Deleted").add_attribute(Attribute::Bold),
            Cell::new("Expires In").add_attribute(Attribute::Bold),
        ]);

    for e in entries {
        let left = days_left(&e, now);
        table.add_row(vec![
            Cell::new(e.id()),
            Cell::new(&e.task.title),
            Cell::new(&e.task.category),
            Cell::new(e.task.due_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(e.deleted_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{}d", left.max(0))).fg(if left <= 3 { Color::Red } else { Color::Reset }),
        ]);
    }
    println!("{table}");
}

/// Restores a task from the recycle bin.
pub async fn cmd_bin_restore<S: TaskStore>(manager: &mut RecycleBinManager<S>, id: TaskId, silent: bool) {
    if manager.get(id).is_none() {
        if !silent { eprintln!("Task {} is not in the recycle bin.", id); }
        return;
    }
    manager.restore(id).await;
    if !silent {
        if manager.get(id).is_some() {
            eprintln!("Failed to restore task {}; it is still in the recycle bin.", id);
        } else {
            println!("Task {} restored.", id);
        }
    }
}

/// Permanently deletes one recycle-bin entry after confirmation.
pub fn cmd_bin_purge<S: TaskStore>(manager: &mut RecycleBinManager<S>, id: TaskId, force: bool, silent: bool) {
    if manager.get(id).is_none() {
        if !silent { eprintln!("Task {} is not in the recycle bin.", id); }
        return;
    }
    if !force && !confirm(&format!("Permanently delete task {}? This cannot be undone.", id)) {
        if !silent { println!("Aborted."); }
        return;
    }
    manager.permanently_delete(id);
    if !silent { println!("Task {} permanently deleted.", id); }
}

/// Empties the recycle bin after confirmation.
pub fn cmd_bin_empty<S: TaskStore>(manager: &mut RecycleBinManager<S>, force: bool, silent: bool) {
    if manager.list().is_empty() {
        if !silent { println!("Recycle bin is already empty."); }
        return;
    }
    if !force && !confirm("Permanently delete everything in the recycle bin? This cannot be undone.") {
        if !silent { println!("Aborted."); }
        return;
    }
    let removed = manager.empty_all();
    if !silent { println!("Recycle bin emptied ({} tasks).", removed); }
}

/// Prints a month grid and the tasks due on the selected day.
pub async fn cmd_calendar<S: TaskStore>(calendar: &mut Calendar<S>, month: Option<String>, selected: Option<String>) {
    let selected = match selected {
        Some(s) => match parse_date(&s, false) {
            Some(d) => Some(d),
            None => return,
        },
        None => None,
    };
    let month = match month {
        Some(m) => match m.parse::<YearMonth>() {
            Ok(ym) => ym,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        },
        None => YearMonth::of(selected.unwrap_or_else(|| calendar.today())),
    };

    let cells = calendar.month_grid(month, selected).await;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .into_iter()
            .map(|d| Cell::new(d).add_attribute(Attribute::Bold)));

    for week in cells.chunks(7) {
        let row: Vec<Cell> = week
            .iter()
            .map(|c| {
                let mut label = format!("{:>2}", c.date.day());
                if c.has_tasks {
                    label.push('*');
                }
                if c.is_selected {
                    label = format!("[{}]", label);
                }
                let mut cell = Cell::new(label);
                if !c.in_month {
                    cell = cell.fg(Color::DarkGrey);
                } else if c.is_today {
                    cell = cell.fg(Color::Cyan).add_attribute(Attribute::Bold);
                } else if c.has_tasks {
                    cell = cell.fg(Color::Yellow);
                }
                cell
            })
            .collect();
        table.add_row(row);
    }

    println!("{}", month.title());
    println!("{table}");

    if let Some(date) = selected {
        println!("Tasks due {}:", date);
        print_tasks(&calendar.tasks_on_date(date).await);
    }
}

/// Lists every date that has at least one task due.
pub async fn cmd_dates<S: TaskStore>(calendar: &mut Calendar<S>) {
    let dates = calendar.dates_with_tasks().await;
    if dates.is_empty() {
        println!("No tasks have a due date.");
        return;
    }
    for d in dates {
        println!("{}", d);
    }
}

/// Lists the tasks due on a given date.
pub async fn cmd_on<S: TaskStore>(calendar: &mut Calendar<S>, date: String) {
    if let Some(d) = parse_date(&date, false) {
        print_tasks(&calendar.tasks_on_date(d).await);
    }
}
