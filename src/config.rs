use std::{
    collections::HashSet,
    env,
    path::PathBuf,
};

pub const WATCH_FOLDERS_VAR: &str = "MCP_SCREENSHOT_FOLDER";
pub const DRIVE_FOLDER_VAR: &str = "MCP_DRIVE_FOLDER";
pub const DEFAULT_FOLDER_NAME: &str = "MCP Screenshots";

#[derive(Debug, Clone)]
pub struct Config {
    pub watch_folders: Vec<PathBuf>,
    pub folder_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        let raw = env::var(WATCH_FOLDERS_VAR).ok();
        let watch_folders = watch_folders(raw.as_deref(), env::temp_dir(), exe_dir());
        let folder_name =
            env::var(DRIVE_FOLDER_VAR).unwrap_or_else(|_| DEFAULT_FOLDER_NAME.to_string());

        Self {
            watch_folders,
            folder_name,
        }
    }
}

fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

/// Resolves the effective watch list from the comma-separated variable.
/// When the list is exactly the default temp directory, the executable's
/// own directory is appended as a fallback location.
pub fn watch_folders(
    raw: Option<&str>,
    default_dir: PathBuf,
    fallback: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut folders: Vec<PathBuf> = match raw {
        Some(list) => list
            .split(',')
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
            .collect(),
        None => Vec::new(),
    };

    if folders.is_empty() {
        folders.push(default_dir.clone());
    }

    if folders.len() == 1 && folders[0] == default_dir {
        if let Some(extra) = fallback {
            folders.push(extra);
        }
    }

    let mut seen = HashSet::new();
    folders.retain(|f| seen.insert(f.clone()));

    folders
}
