//! Task store, recycle bin and calendar queries behind the `taskbin` CLI,
//! REST server and terminal UI.

pub mod api;
pub mod calendar;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod recycle_bin;
pub mod server;
pub mod storage;
pub mod store;
pub mod tui;

pub use error::{Result, TaskError};
