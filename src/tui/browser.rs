use std::process::{Command, ExitStatus, Stdio};

use anyhow::{Context, Result, bail};

/// Opens `url` in a new browser tab or window via the platform opener.
pub fn open_link(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("refusing to open non-http link: {url}");
    }
    open_native(url)
}

#[cfg(target_os = "macos")]
fn open_native(url: &str) -> Result<()> {
    let status = quiet(Command::new("open").arg(url))
        .status()
        .context("failed to run open")?;
    ensure_success(status, "open")
}

#[cfg(target_os = "linux")]
fn open_native(url: &str) -> Result<()> {
    let status = quiet(Command::new("xdg-open").arg(url))
        .status()
        .context("failed to run xdg-open")?;
    ensure_success(status, "xdg-open")
}

#[cfg(target_os = "windows")]
fn open_native(url: &str) -> Result<()> {
    let status = quiet(Command::new("cmd").arg("/C").arg("start").arg("").arg(url))
        .status()
        .context("failed to run start")?;
    ensure_success(status, "start")
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn open_native(_url: &str) -> Result<()> {
    bail!("opening links is not supported on this platform")
}

// The opener must not scribble over the alternate screen.
#[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
fn quiet(command: &mut Command) -> &mut Command {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
}

#[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
fn ensure_success(status: ExitStatus, program: &str) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        bail!("{program} exited with {status}")
    }
}
