use anyhow::{bail, Result};
use std::path::PathBuf;

pub fn get_home() -> Result<PathBuf> {
    if let Some(dir) = home::home_dir() {
        return Ok(dir);
    }

    bail!("Unable to locate user home directory");
}

/// Saved authorization tokens, written after a successful interactive flow.
pub fn token_file() -> Result<PathBuf> {
    Ok(get_home()?.join(".google_drive_token.json"))
}

/// Preferred (hidden) location for the user-supplied OAuth client file.
pub fn hidden_credentials_file() -> Result<PathBuf> {
    Ok(get_home()?.join(".google_drive_credentials.json"))
}

pub fn visible_credentials_file() -> Result<PathBuf> {
    Ok(get_home()?.join("google_drive_credentials.json"))
}
