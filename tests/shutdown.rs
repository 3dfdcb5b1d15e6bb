#![cfg(unix)]

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

#[test]
fn sigterm_prints_shutdown_message_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_driveshot"))
        .env("MCP_SCREENSHOT_FOLDER", dir.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Let the process install its handler and watch subscriptions.
    thread::sleep(Duration::from_millis(800));

    let killed = Command::new("kill")
        .arg("-TERM")
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(killed.success());

    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "expected exit code 0, got {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stopping screenshot watcher"));
}
