//! Restarting the Claude desktop app so it rereads its config.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Process name used to stop the running app.
#[cfg(target_os = "windows")]
const PROCESS_NAME: &str = "Claude.exe";
#[cfg(not(target_os = "windows"))]
const PROCESS_NAME: &str = "Claude";

/// Stop the running app (if any) and launch it again.
///
/// A failure to stop is ignored since the app may simply not be running;
/// a failure to launch is returned.
pub fn restart() -> Result<()> {
    let stopped = stop_command()
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match stopped {
        Ok(status) => tracing::debug!(%status, "Stop command finished"),
        Err(err) => tracing::warn!(error = %err, "Failed to stop desktop app"),
    }

    launch_command()
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to launch the desktop app")?;

    tracing::info!("Restarted desktop app");
    Ok(())
}

#[cfg(target_os = "windows")]
fn stop_command() -> Command {
    let mut command = Command::new("taskkill");
    command.args(["/F", "/IM", PROCESS_NAME]);
    command
}

#[cfg(not(target_os = "windows"))]
fn stop_command() -> Command {
    let mut command = Command::new("pkill");
    command.args(["-x", PROCESS_NAME]);
    command
}

#[cfg(target_os = "windows")]
fn launch_command() -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", PROCESS_NAME]);
    command
}

#[cfg(target_os = "macos")]
fn launch_command() -> Command {
    let mut command = Command::new("open");
    command.args(["-a", PROCESS_NAME]);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launch_command() -> Command {
    Command::new(PROCESS_NAME)
}
