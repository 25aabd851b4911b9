//! Thin layer over the external `yt-dlp` and `ffmpeg` executables.
//!
//! Both programs are always invoked through a [`Toolchain`] so tests can point
//! the chef at stub scripts instead of the real binaries.

use crate::config::ChefConfig;
use anyhow::{Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Best mp4 stream at or below 480p, falling back to a progressive mp4 when
/// separate video and audio tracks are unavailable.
pub const FORMAT_SELECTOR: &str =
    "bestvideo[height<=480][ext=mp4]+bestaudio[ext=m4a]/best[height<=480][ext=mp4]";

#[derive(Debug, Clone)]
pub struct Toolchain {
    yt_dlp: PathBuf,
    ffmpeg: PathBuf,
}

impl Toolchain {
    pub fn new(yt_dlp: impl Into<PathBuf>, ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    pub fn from_config(config: &ChefConfig) -> Self {
        Self::new(&config.yt_dlp_bin, &config.ffmpeg_bin)
    }

    pub fn yt_dlp_command(&self) -> Command {
        Command::new(&self.yt_dlp)
    }

    pub fn ffmpeg_command(&self) -> Command {
        Command::new(&self.ffmpeg)
    }

    /// Fails loudly when either executable is missing, before any work starts.
    pub fn ensure_available(&self) -> Result<()> {
        ensure_program_available(&self.yt_dlp, "--version")?;
        ensure_program_available(&self.ffmpeg, "-version")
    }
}

/// Runs `<program> <version_flag>` and reports whether it could be executed.
pub fn ensure_program_available(program: &Path, version_flag: &str) -> Result<()> {
    let status = Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => bail!(
            "{} is installed but returned a failure status",
            program.display()
        ),
        Err(err) => bail!(
            "{} is not installed or not in PATH: {}",
            program.display(),
            err
        ),
    }
}

/// Executes `command`, expecting a single JSON document on stdout.
///
/// The error string carries the exit status and the last line yt-dlp printed
/// to stderr, which is usually its `ERROR:` message.
pub(crate) fn run_json<T: DeserializeOwned>(command: &mut Command) -> Result<T, String> {
    debug!(?command, "running extractor");
    let output = command
        .stdin(Stdio::null())
        .output()
        .map_err(|err| format!("could not execute: {err}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no error output");
        return Err(format!("exited with {}: {}", output.status, reason));
    }

    // `--no-simulate` may interleave progress lines; the JSON document is the
    // last non-empty line.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let payload = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| "produced no output".to_string())?;
    serde_json::from_str(payload).map_err(|err| format!("invalid JSON output: {err}"))
}

/// Subset of `yt-dlp --dump-single-json` for a flat playlist.
#[derive(Debug, Deserialize)]
pub struct PlaylistInfo {
    pub entries: Option<Vec<Option<PlaylistEntry>>>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
}

impl PlaylistEntry {
    /// Watch-page URL of the entry. Flat extraction sometimes reports only a
    /// bare id in `url`.
    pub fn canonical_url(&self) -> Option<String> {
        let absolute =
            |value: &&String| value.starts_with("http://") || value.starts_with("https://");
        self.webpage_url
            .as_ref()
            .filter(absolute)
            .or_else(|| self.url.as_ref().filter(absolute))
            .cloned()
            .or_else(|| self.id.as_deref().map(crate::source::watch_url))
    }
}

/// Subset of `yt-dlp --dump-single-json` for a single video.
#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub fulltitle: Option<String>,
    pub ext: Option<String>,
    pub filepath: Option<String>,
    #[serde(rename = "_filename")]
    pub filename: Option<String>,
    #[serde(default)]
    pub requested_downloads: Vec<RequestedDownload>,
    #[serde(default)]
    pub subtitles: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct RequestedDownload {
    pub filepath: Option<String>,
}

impl VideoInfo {
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.fulltitle.as_deref())
            .filter(|title| !title.trim().is_empty())
    }

    /// Path yt-dlp reported for the final (merged) file, if any.
    pub fn reported_path(&self) -> Option<PathBuf> {
        self.requested_downloads
            .iter()
            .find_map(|download| download.filepath.clone())
            .or_else(|| self.filepath.clone())
            .or_else(|| self.filename.clone())
            .map(PathBuf::from)
    }

    /// Languages with manually provided subtitles, in sorted order.
    pub fn subtitle_languages(&self) -> Vec<String> {
        self.subtitles
            .as_ref()
            .map(|subs| subs.keys().cloned().collect())
            .unwrap_or_default()
    }
}
