use std::fs;
use std::path::PathBuf;

/// Default address of the REST backend.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings, taken from the environment unless overridden on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL the client uses to reach the task store.
    pub server_url: String,
    /// Address `serve` listens on.
    pub listen_addr: String,
    /// Recycle-bin file.
    pub bin_path: PathBuf,
}

impl Config {
    /// Reads `TASKBIN_SERVER`, `TASKBIN_ADDR` and `TASKBIN_BIN`.
    pub fn from_env() -> Self {
        let listen_addr = std::env::var("TASKBIN_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let server_url = std::env::var("TASKBIN_SERVER")
            .unwrap_or_else(|_| format!("http://{}", DEFAULT_ADDR));
        Config { server_url, listen_addr, bin_path: bin_path() }
    }

    pub fn with_server(mut self, server_url: Option<String>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        self
    }

    pub fn with_listen_addr(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.listen_addr = addr;
        }
        self
    }
}

/// Returns the path to the recycle-bin file (`recycle_bin.json`).
///
/// The path is determined in the following order:
/// 1. `TASKBIN_BIN` environment variable.
/// 2. `~/.local/share/taskbin/recycle_bin.json` (on Linux).
/// 3. `./recycle_bin.json` (fallback).
pub fn bin_path() -> PathBuf {
    std::env::var("TASKBIN_BIN").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("taskbin");
        if !p.exists() {
            let _ = fs::create_dir_all(&p);
        }
        p.push("recycle_bin.json");
        p
    })
}
