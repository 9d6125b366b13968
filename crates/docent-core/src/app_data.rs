//! Where Docent stores its own data (config).
//!
//! Uploaded documents are never written here; they live only in the session cache.

use std::path::PathBuf;

/// Returns the directory where Docent stores its config.
/// On macOS: `~/Library/Application Support/Docent/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Docent", "Docent")?
        .data_local_dir()
        .to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
