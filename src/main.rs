//! # Taskbin
//!
//! A personal task manager with a small REST backend, a recycle bin for
//! deleted tasks and a month calendar. The backend keeps tasks in memory; the
//! CLI and the terminal UI talk to it over HTTP and keep the recycle bin in a
//! local file.
//!
//! ## Usage
//!
//! ### Server
//!
//! ```bash
//! taskbin serve --addr 127.0.0.1:3000
//! ```
//!
//! ### Interactive Mode (TUI)
//!
//! Run without arguments to open the interactive UI:
//!
//! ```bash
//! taskbin
//! # or explicitly
//! taskbin ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! **Global**
//! *   `q`: Quit
//! *   `v`: Cycle Tasks / Calendar / Recycle Bin views
//!
//! **Task View**
//! *   `a`: Add new task
//! *   `Space`: Toggle completion
//! *   `d`: Move selected task to the recycle bin
//! *   `t`: Edit title, `e`: Edit description, `u`: Edit due date, `c`: Edit category
//! *   `f`: Cycle status filter, `g`: Cycle category filter
//!
//! **Calendar View**
//! *   Arrow keys / `h` `j` `k` `l`: Move the selected day
//! *   `[` / `]`: Previous / next month
//! *   `.`: Jump to today
//!
//! **Recycle Bin View**
//! *   `r`: Restore selected task
//! *   `x`: Delete selected task permanently
//! *   `E`: Empty the recycle bin
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! taskbin add "Write report" --category work --due 2025-12-01
//! taskbin list --status active
//! taskbin remove 3
//! taskbin bin list
//! taskbin bin restore 3
//! taskbin calendar --month 2025-12 --select 2025-12-01
//! ```
//!
//! ## Configuration
//!
//! *   `TASKBIN_SERVER`: URL of the backend (default `http://127.0.0.1:3000`)
//! *   `TASKBIN_ADDR`: address `serve` binds (default `127.0.0.1:3000`)
//! *   `TASKBIN_BIN`: recycle-bin file (default `~/.local/share/taskbin/recycle_bin.json`)
//! *   `RUST_LOG`: log filter
//!
//! Recycled tasks are kept for 30 days and purged the next time the bin is opened.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use taskbin::api::HttpTaskStore;
use taskbin::calendar::Calendar;
use taskbin::commands::*;
use taskbin::config::Config;
use taskbin::models::{StatusFilter, TaskFilter, TaskId};
use taskbin::recycle_bin::RecycleBinManager;
use taskbin::storage::RecycleBin;
use taskbin::tui::run_tui;
use taskbin::{logging, server};

#[derive(Parser)]
#[command(name = "taskbin")]
#[command(about = "Personal task manager with a recycle bin and calendar", long_about = None)]
struct Cli {
    /// Backend URL (overrides TASKBIN_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST backend
    Serve {
        /// Address to listen on (overrides TASKBIN_ADDR)
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
        /// Category tag
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List tasks
    List {
        /// Completion state to show
        #[arg(short, long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one task
    Show {
        id: TaskId,
    },
    /// Edit a task
    Edit {
        id: TaskId,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description (empty string clears it)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New due date
        #[arg(short, long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Toggle a task between pending and done
    Toggle {
        id: TaskId,
    },
    /// Move a task to the recycle bin
    Remove {
        id: TaskId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Manage the recycle bin
    Bin {
        #[command(subcommand)]
        command: BinCommands,
    },
    /// Show a month calendar
    Calendar {
        /// Month in YYYY-MM (defaults to the selected day's month, or today's)
        #[arg(short, long)]
        month: Option<String>,
        /// Day to highlight and list tasks for, in YYYY-MM-DD
        #[arg(short, long)]
        select: Option<String>,
    },
    /// List the dates that have tasks due
    Dates,
    /// List tasks due on a date
    On {
        /// Date in YYYY-MM-DD
        date: String,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum BinCommands {
    /// List recycled tasks
    List,
    /// Restore a recycled task
    Restore {
        id: TaskId,
    },
    /// Permanently delete a recycled task
    Purge {
        id: TaskId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Permanently delete everything in the bin
    Empty {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

fn open_manager(config: &Config, store: HttpTaskStore) -> Option<RecycleBinManager<HttpTaskStore>> {
    match RecycleBin::open(config.bin_path.clone()) {
        Ok(bin) => Some(RecycleBinManager::new(store, bin)),
        Err(e) => {
            eprintln!("Failed to open recycle bin {}: {}", config.bin_path.display(), e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_default = match cli.command {
        Some(Commands::Serve { .. }) => "info",
        Some(Commands::Ui) | None => "off",
        _ => "warn",
    };
    logging::init(log_default);

    let config = Config::from_env().with_server(cli.server);
    let store = HttpTaskStore::new(config.server_url.clone());

    match cli.command {
        Some(Commands::Serve { addr }) => {
            let config = config.with_listen_addr(addr);
            if let Err(e) = server::run(&config.listen_addr).await {
                eprintln!("Server error: {}", e);
            }
        }
        Some(Commands::Add { title, description, due, category }) => cmd_add(&store, title, description, due, category, false).await,
        Some(Commands::List { status, category }) => cmd_list(&store, &TaskFilter { status, category }).await,
        Some(Commands::Show { id }) => cmd_show(&store, id).await,
        Some(Commands::Edit { id, title, description, due, clear_due, category }) => cmd_edit(&store, id, title, description, due, category, clear_due, false).await,
        Some(Commands::Toggle { id }) => cmd_toggle(&store, id, false).await,
        Some(Commands::Remove { id, force }) => {
            if let Some(mut manager) = open_manager(&config, store) {
                cmd_remove(&mut manager, id, force, false).await;
            }
        }
        Some(Commands::Bin { command }) => {
            let Some(mut manager) = open_manager(&config, store) else { return };
            match command {
                BinCommands::List => cmd_bin_list(&mut manager).await,
                BinCommands::Restore { id } => cmd_bin_restore(&mut manager, id, false).await,
                BinCommands::Purge { id, force } => cmd_bin_purge(&mut manager, id, force, false),
                BinCommands::Empty { force } => cmd_bin_empty(&mut manager, force, false),
            }
        }
        Some(Commands::Calendar { month, select }) => cmd_calendar(&mut Calendar::new(store), month, select).await,
        Some(Commands::Dates) => cmd_dates(&mut Calendar::new(store)).await,
        Some(Commands::On { date }) => cmd_on(&mut Calendar::new(store), date).await,
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "taskbin", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            let Some(manager) = open_manager(&config, store.clone()) else { return };
            if let Err(e) = run_tui(manager, Calendar::new(store)).await {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
