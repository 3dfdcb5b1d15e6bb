use crate::{auth, log};
use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Remote names carry a compact UTC timestamp so repeated uploads of the
/// same local file never collide in the destination folder.
pub fn drive_filename(path: &Path, now: DateTime<Utc>) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let timestamp = now.format("%Y%m%d_%H%M%S");

    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, timestamp, ext),
        None => format!("{}_{}", stem, timestamp),
    }
}

pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Uploads one local file into the named Drive folder and returns the
/// remote file id. May trigger the full interactive authorization flow.
pub fn upload_file_to_drive(path: &Path, folder_name: &str) -> Result<String> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    log::info("Authenticating with Google Drive...".to_string());
    let client = auth::authorize()?;

    log::info(format!("Finding or creating folder '{}'...", folder_name));
    let folder_id = client.find_or_create_folder(folder_name)?;

    let remote_name = drive_filename(path, Utc::now());
    let mime = mime_type(path);

    log::info(format!(
        "Uploading {} as {}...",
        path.display(),
        remote_name
    ));
    let file = client.upload_file(path, &remote_name, &folder_id, mime)?;

    let id = file
        .id
        .ok_or_else(|| anyhow!("Upload response carried no file id"))?;

    log::success(format!("Upload successful! (ID: {})", id));
    if let Some(name) = file.name {
        log::info(format!("   File Name: {}", name));
    }
    if let Some(link) = file.web_view_link {
        log::info(format!("   View Link: {}", link));
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn remote_name_has_compact_timestamp() {
        let at = Utc.ymd(2026, 8, 28).and_hms(7, 5, 9);
        let name = drive_filename(Path::new("/tmp/shot.png"), at);
        assert_eq!(name, "shot_20260828_070509.png");
    }

    #[test]
    fn remote_name_without_extension() {
        let at = Utc.ymd(2026, 1, 2).and_hms(3, 4, 5);
        let name = drive_filename(Path::new("/tmp/capture"), at);
        assert_eq!(name, "capture_20260102_030405");
    }

    #[test]
    fn uploads_a_second_apart_get_distinct_names() {
        let first = Utc.ymd(2026, 8, 28).and_hms(7, 5, 9);
        let second = Utc.ymd(2026, 8, 28).and_hms(7, 5, 10);
        let path = Path::new("/tmp/shot.png");
        assert_ne!(drive_filename(path, first), drive_filename(path, second));
    }

    #[test]
    fn mime_table_covers_known_extensions() {
        assert_eq!(mime_type(Path::new("a.png")), "image/png");
        assert_eq!(mime_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_type(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_type(Path::new("a.pdf")), "application/pdf");
        assert_eq!(mime_type(Path::new("a.txt")), "text/plain");
        assert_eq!(mime_type(Path::new("a.exe")), "application/octet-stream");
        assert_eq!(mime_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn missing_file_fails_before_any_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");

        let err = upload_file_to_drive(&path, "Shots").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
