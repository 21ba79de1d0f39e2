//! Audio extraction backend over the `yt-dlp` subprocess.
//!
//! Blocking by design; `core-ingest` offloads calls to a worker thread and
//! owns the async-facing timeout. A process-level timeout is still enforced
//! here so a wedged subprocess is killed rather than orphaned.

use gateway_traits::{
    audio::{AudioBackend, AudioProbe, FormatPreferences},
    error::{GatewayError, Result},
};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const YT_DLP: &str = "yt-dlp";
const YOUTUBE_DL: &str = "youtube-dl";

/// Poll interval for the kill-on-timeout wait loop.
const WAIT_POLL: Duration = Duration::from_millis(200);

pub struct YtDlpBackend {
    program: &'static str,
    process_timeout: Duration,
}

impl YtDlpBackend {
    /// Locate a usable downloader binary.
    ///
    /// # Errors
    ///
    /// `NotAvailable` when neither `yt-dlp` nor `youtube-dl` answers
    /// `--version`; this is construction-time fatal.
    pub fn new(process_timeout: Duration) -> Result<Self> {
        for program in [YT_DLP, YOUTUBE_DL] {
            let found = Command::new(program)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false);
            if found {
                debug!(program, "audio backend located");
                return Ok(Self {
                    program,
                    process_timeout,
                });
            }
        }
        Err(GatewayError::NotAvailable(
            "neither yt-dlp nor youtube-dl found on PATH".to_string(),
        ))
    }

    /// Run the configured command, killing the child at the process timeout.
    fn run(&self, configure: impl FnOnce(&mut Command) -> &mut Command) -> Result<Output> {
        let mut command = Command::new(self.program);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        configure(&mut command);

        let mut child = command.spawn()?;
        let deadline = Instant::now() + self.process_timeout;
        loop {
            match child.try_wait()? {
                Some(_) => break,
                None if Instant::now() >= deadline => {
                    error!(
                        timeout_secs = self.process_timeout.as_secs(),
                        "subprocess timed out, killing"
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GatewayError::Timeout);
                }
                None => std::thread::sleep(WAIT_POLL),
            }
        }
        let output = child.wait_with_output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let unavailable = stderr.lines().any(|line| {
            line.starts_with("ERROR:")
                && (line.to_lowercase().contains("unavailable")
                    || line.to_lowercase().contains("private")
                    || line.to_lowercase().contains("removed"))
        });
        if unavailable {
            return Err(GatewayError::Unavailable(first_error_line(&stderr)));
        }
        if !output.status.success() {
            warn!(status = ?output.status, "subprocess failed");
            return Err(GatewayError::OperationFailed(first_error_line(&stderr)));
        }
        Ok(output)
    }
}

fn first_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .find(|line| line.starts_with("ERROR:"))
        .unwrap_or("subprocess reported no error detail")
        .to_string()
}

impl AudioBackend for YtDlpBackend {
    fn download(&self, url: &str, prefs: &FormatPreferences, dest_dir: &Path) -> Result<()> {
        self.run(|cmd| {
            cmd.arg("--quiet")
                .arg("--no-warnings")
                .arg("--no-playlist")
                .arg("--no-progress")
                .args(["-f", &prefs.format])
                .arg("-P")
                .arg(dest_dir);
            if let Some(quality) = &prefs.audio_quality {
                cmd.arg("-x").args(["--audio-quality", quality]);
            }
            if let Some(template) = &prefs.output_template {
                cmd.args(["-o", template]);
            }
            cmd.arg("--").arg(url)
        })?;
        Ok(())
    }

    fn probe(&self, url: &str) -> Result<AudioProbe> {
        let output = self.run(|cmd| {
            cmd.arg("-q")
                .arg("--skip-download")
                .arg("--no-playlist")
                .arg("-j")
                .arg("--")
                .arg(url)
        })?;

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| GatewayError::OperationFailed(format!("probe output not JSON: {e}")))?;

        let title = json
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let duration_seconds = json.get("duration").and_then(|v| v.as_u64()).unwrap_or(0);
        let uploader = json
            .get("uploader")
            .and_then(|v| v.as_str())
            .map(String::from);
        let formats = json
            .get("formats")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("format").and_then(|f| f.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AudioProbe {
            title,
            duration_seconds,
            uploader,
            formats,
        })
    }
}
