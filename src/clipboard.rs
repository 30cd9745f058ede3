use crate::error::RepoError;
use anyhow::Result;
use arboard::Clipboard;
#[cfg(target_os = "linux")]
use arboard::SetExtLinux;

/// Hidden argument that turns the binary into a clipboard owner process.
pub const DAEMON_FLAG: &str = "__ghyank_clipboard_daemon";

// X11 and Wayland drop the selection when its owner exits, so a detached copy
// of ourselves holds it until another program takes the clipboard.
#[cfg(target_os = "linux")]
fn serve_clipboard() -> Result<()> {
    let text = std::io::read_to_string(std::io::stdin())?;
    let mut clipboard = Clipboard::new()?;
    // Blocks until the selection is replaced.
    clipboard.set().wait().text(text)?;
    Ok(())
}

/// Runs the daemon when the hidden flag is present. Returns `true` if it did.
pub fn run_daemon_if_requested() -> Result<bool> {
    if !std::env::args().any(|a| a == DAEMON_FLAG) {
        return Ok(false);
    }
    #[cfg(target_os = "linux")]
    serve_clipboard()?;
    #[cfg(not(target_os = "linux"))]
    tracing::warn!("{DAEMON_FLAG} is only meaningful on Linux; ignoring");
    Ok(true)
}

pub fn copy_to_clipboard(text: &str) -> Result<(), RepoError> {
    #[cfg(not(target_os = "linux"))]
    {
        let mut clipboard = Clipboard::new()?;
        clipboard.set_text(text)?;
    }

    #[cfg(target_os = "linux")]
    {
        use std::io::{self, Write};
        use std::process::{Command, Stdio};

        let mut child = Command::new(std::env::current_exe()?)
            .arg(DAEMON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .current_dir("/")
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("Failed to open stdin of the clipboard daemon"))?;
        stdin.write_all(text.as_bytes())?;
        stdin.flush()?;
        tracing::debug!(pid = child.id(), "handed text to clipboard daemon");
    }
    Ok(())
}
