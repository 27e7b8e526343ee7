pub mod client_db;
pub mod database;

pub use client_db::{ClientDatabase, TOKEN_KEY};

use std::fs;
use std::path::Path;

/// Ensure data directory exists
pub fn ensure_data_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}
