//! Async command runner for the external media tools
//!
//! Every child is spawned with `kill_on_drop`, so dropping the future (or the
//! stream wrapping its stdout) terminates the process.

use std::process::{Output, Stdio};

use bitflags::bitflags;
use tokio::process::Command;
use tracing::{debug, trace};

pub const YT_DL: &str = "youtube-dl";
pub const YT_DLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const FFXXX_DEFAULT_ARGS: [&str; 3] = ["-hide_banner", "-loglevel", "error"];

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDIN = 0b0000001;
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

fn stdio(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

/// Build a command for `program` with killing on drop enabled
pub fn command(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.kill_on_drop(true);
    cmd
}

/// Run a command to completion, returning its raw output.
///
/// IO handles are captured only if the caller asked for them or if the log
/// level is Debug; in that case `stdout` and `stderr` sizes are logged.
///
/// Only a failure to execute is an error: a non-0 status code is returned
/// as is in the output.
pub async fn run_command<F>(program: &str, f: F, capture: Capture) -> std::io::Result<Output>
where
    F: FnOnce(&mut Command) -> &mut Command,
{
    let is_debug = tracing::enabled!(tracing::Level::DEBUG);

    let mut cmd = command(program);
    let cmd = f(&mut cmd)
        .stdin(stdio(capture.contains(Capture::STDIN)))
        .stdout(stdio(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(stdio(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd.output().await?;

    if is_debug {
        debug!("status: {}", res.status);
        debug!("stdout: {} bytes long", res.stdout.len());
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        debug!("stderr: {} bytes long", res.stderr.len());
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Whether `program` runs and exits successfully with `version_arg`
pub async fn is_available(program: &str, version_arg: &str) -> bool {
    match run_command(program, |cmd| cmd.arg(version_arg), Capture::empty()).await {
        Ok(res) => res.status.success(),
        Err(_) => false,
    }
}

/// Last non-empty lines of a tool's stderr, joined with `; `
pub fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let mut tail: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .rev()
        .take(lines)
        .collect();
    tail.reverse();
    tail.join("; ")
}
