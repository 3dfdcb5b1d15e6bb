mod auth;
mod config;
mod errors;
mod files;
mod google_drive;
mod log;
mod parse_url;
mod paths;
mod redirect_listener;
mod uploader;
mod watcher;

use clap::{App, Arg};
use config::Config;
use std::path::{Path, PathBuf};
use std::process::exit;
use watcher::{LocalWatcher, SETTLE_DELAY};

fn main() {
    let matches = App::new("driveshot")
        .about("Watches folders for new screenshots and uploads them to Google Drive.")
        .arg(
            Arg::with_name("FILE")
                .help("Upload this single file and exit instead of watching")
                .index(1),
        )
        .arg(
            Arg::with_name("folder-name")
                .long("folder-name")
                .takes_value(true)
                .value_name("NAME")
                .help("Google Drive folder to upload into"),
        )
        .after_help(
            "Without FILE the tool watches the configured folders \
             (MCP_SCREENSHOT_FOLDER, comma-separated) and uploads every new \
             screenshot it sees. MCP_DRIVE_FOLDER overrides the destination \
             folder name.",
        )
        .get_matches();

    if let Err(e) = ctrlc::set_handler(|| {
        println!("\nStopping screenshot watcher...");
        exit(0);
    }) {
        log::warn(format!("Unable to install shutdown handler: {}", e));
    }

    let config = Config::from_env();
    let folder_name = matches
        .value_of("folder-name")
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.folder_name.clone());

    if let Some(file) = matches.value_of("FILE") {
        match uploader::upload_file_to_drive(Path::new(file), &folder_name) {
            Ok(_) => exit(0),
            Err(e) => {
                log::error(format!("{}", e));
                exit(1);
            }
        }
    }

    run_watch(config.watch_folders, folder_name);
}

fn run_watch(dirs: Vec<PathBuf>, folder_name: String) {
    log::info(format!(
        "Watching folders: {}",
        dirs.iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    log::info(format!(
        "Uploading to Google Drive folder: \"{}\"",
        folder_name
    ));
    println!("\nPress Ctrl+C to stop watching...\n");

    let mut daemon = LocalWatcher::new(folder_name, SETTLE_DELAY, |path: &Path, folder: &str| {
        uploader::upload_file_to_drive(path, folder)
    });

    if let Err(e) = daemon.start(&dirs) {
        log::error(format!("{}", e));
        exit(1);
    }
}
