/*
    Watches the configured directories for freshly written screenshots and
    feeds each one into the uploader. Uploads are deduplicated by file
    identity so a re-fired event for the same write is skipped, while an
    in-place overwrite counts as a new candidate.
*/

use crate::log;
use anyhow::{bail, Result};
use notify::{watcher, DebouncedEvent, RecursiveMode, Watcher};
use regex::Regex;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::mpsc::channel,
    time::{Duration, SystemTime},
};

pub const IMAGE_PATTERN: &str = r"(?i)\.(png|jpg|jpeg|gif|webp)$";

/// Fixed pause between a filesystem event and inspecting the file, so an
/// in-progress write can finish first.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Identity of an already-uploaded file: path plus size plus mtime, never
/// the filename alone. Two files sharing a name get distinct keys, and an
/// overwrite changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileKey {
    path: PathBuf,
    size: u64,
    mtime: SystemTime,
}

impl FileKey {
    pub fn new(path: PathBuf, meta: &fs::Metadata) -> Result<Self> {
        Ok(Self {
            path,
            size: meta.len(),
            mtime: meta.modified()?,
        })
    }
}

struct TrackedFile {
    uploaded_at: chrono::DateTime<chrono::Utc>,
}

pub struct LocalWatcher<U> {
    folder_name: String,
    pattern: Regex,
    settle: Duration,
    uploaded: HashMap<FileKey, TrackedFile>,
    upload: U,
}

impl<U> LocalWatcher<U>
where
    U: FnMut(&Path, &str) -> Result<String>,
{
    pub fn new(folder_name: String, settle: Duration, upload: U) -> Self {
        Self {
            folder_name,
            pattern: Regex::new(IMAGE_PATTERN).unwrap(),
            settle,
            uploaded: HashMap::new(),
            upload,
        }
    }

    /// Blocks for the life of the process, feeding debounced events through
    /// the image filter and into the uploader. Returns early only when no
    /// directory can be watched at all or the event channel dies.
    pub fn start(&mut self, dirs: &[PathBuf]) -> Result<()> {
        let (tx, rx) = channel();
        let mut fs_watcher = match watcher(tx, self.settle) {
            Ok(w) => w,
            Err(e) => bail!("Unable to create filesystem watcher.\nDetails: {}", e),
        };

        let mut watching = 0;
        for dir in dirs {
            if !dir.exists() {
                log::warn(format!("Watch folder does not exist: {}", dir.display()));
                continue;
            }

            match fs_watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    log::info(format!("Watching: {}", dir.display()));
                    watching += 1;
                }
                Err(e) => log::warn(format!(
                    "Could not watch folder {}: {}",
                    dir.display(),
                    e
                )),
            }
        }

        if watching == 0 {
            bail!("None of the configured folders can be watched");
        }

        loop {
            match rx.recv() {
                Ok(event) => match event {
                    DebouncedEvent::Create(path)
                    | DebouncedEvent::Write(path)
                    | DebouncedEvent::Rename(_, path) => {
                        if self.is_image(&path) {
                            self.process(&path);
                        }
                    }
                    _ => {}
                },
                Err(e) => bail!("Unable to continue watching local files.\nDetails: {}", e),
            }
        }
    }

    fn is_image(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.pattern.is_match(name),
            None => false,
        }
    }

    /// Per-file handling. Errors are logged and swallowed here so one bad
    /// file never kills the watch loop.
    fn process(&mut self, path: &Path) {
        // The file may already be gone by the time the settle delay passed.
        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(_) => return,
        };
        if !meta.is_file() {
            return;
        }

        let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let key = match FileKey::new(abs, &meta) {
            Ok(k) => k,
            Err(e) => {
                log::warn(format!(
                    "Unable to read metadata for {}: {}",
                    path.display(),
                    e
                ));
                return;
            }
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("?")
            .to_string();

        if let Some(record) = self.uploaded.get(&key) {
            log::info(format!(
                "Skipping already uploaded: {} (uploaded at {})",
                name,
                record.uploaded_at.format("%H:%M:%S")
            ));
            return;
        }

        log::info(format!("New screenshot detected: {}", name));
        match (self.upload)(path, &self.folder_name) {
            Ok(id) => {
                self.uploaded.insert(
                    key,
                    TrackedFile {
                        uploaded_at: chrono::Utc::now(),
                    },
                );
                log::success(format!("Uploaded successfully! (ID: {})", id));
            }
            // No record is kept for a failed upload; a re-detection of the
            // same file retries it.
            Err(e) => log::error(format!("Upload failed: {}", e)),
        }
    }
}
