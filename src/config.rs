use std::env;
use std::path::PathBuf;

use log::{info, warn};

pub const DB_ENV: &str = "SERVDESK_DB";

pub struct Config {
    /// Directory holding one JSON file per storage key.
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolves the data directory, in order:
    /// 1. `SERVDESK_DB` environment variable.
    /// 2. `~/.local/share/servdesk` (on Linux).
    /// 3. `./servdesk` (fallback).
    pub fn load() -> Self {
        Self { data_dir: data_dir() }
    }
}

fn data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DB_ENV) {
        info!("{DB_ENV} set, using {dir}");
        return PathBuf::from(dir);
    }
    let mut p = dirs::data_local_dir().unwrap_or_else(|| {
        warn!("No local data directory on this platform, using the working directory");
        PathBuf::from(".")
    });
    p.push("servdesk");
    p
}
