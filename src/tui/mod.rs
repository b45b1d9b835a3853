pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use crate::calendar::Calendar;
use crate::recycle_bin::RecycleBinManager;
use crate::store::TaskStore;
use app::{App, InputField, InputMode, ViewMode};
use ui::ui;

pub async fn run_tui<S: TaskStore>(manager: RecycleBinManager<S>, calendar: Calendar<S>) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(manager, calendar).await;

    // Run loop
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

async fn run_app<B: Backend, S: TaskStore>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // key reads block; keep them off the async workers
        let Event::Key(key) = tokio::task::block_in_place(event::read)? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.input_mode {
            InputMode::Normal => match (app.view_mode, key.code) {
                (_, KeyCode::Char('q')) => return Ok(()),
                (_, KeyCode::Char('v')) => app.cycle_view().await,

                (ViewMode::Calendar, KeyCode::Left | KeyCode::Char('h')) => app.move_day(-1).await,
                (ViewMode::Calendar, KeyCode::Right | KeyCode::Char('l')) => app.move_day(1).await,
                (ViewMode::Calendar, KeyCode::Up | KeyCode::Char('k')) => app.move_day(-7).await,
                (ViewMode::Calendar, KeyCode::Down | KeyCode::Char('j')) => app.move_day(7).await,
                (ViewMode::Calendar, KeyCode::Char('[')) => app.shift_month(false).await,
                (ViewMode::Calendar, KeyCode::Char(']')) => app.shift_month(true).await,
                (ViewMode::Calendar, KeyCode::Char('.')) => app.jump_today().await,

                (_, KeyCode::Down | KeyCode::Char('j')) => app.next(),
                (_, KeyCode::Up | KeyCode::Char('k')) => app.previous(),

                (ViewMode::Tasks, KeyCode::Char(' ')) => app.toggle_selected().await,
                (ViewMode::Tasks, KeyCode::Char('d') | KeyCode::Delete) => app.request_recycle(),
                (ViewMode::Tasks, KeyCode::Char('a')) => app.start_add(),
                (ViewMode::Tasks, KeyCode::Char('t')) => app.start_edit(InputField::Title),
                (ViewMode::Tasks, KeyCode::Char('e')) => app.start_edit(InputField::Description),
                (ViewMode::Tasks, KeyCode::Char('u')) => app.start_edit(InputField::Due),
                (ViewMode::Tasks, KeyCode::Char('c')) => app.start_edit(InputField::Category),
                (ViewMode::Tasks, KeyCode::Char('f')) => app.cycle_status_filter().await,
                (ViewMode::Tasks, KeyCode::Char('g')) => app.cycle_category_filter().await,

                (ViewMode::Bin, KeyCode::Char('r')) => app.restore_selected().await,
                (ViewMode::Bin, KeyCode::Char('x') | KeyCode::Delete) => app.request_purge(),
                (ViewMode::Bin, KeyCode::Char('E')) => app.request_empty(),
                _ => {}
            },
            InputMode::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm(true).await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm(false).await,
                _ => {}
            },
            InputMode::Editing | InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input().await,
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            }
        }
    }
}
