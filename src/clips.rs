//! Cutting lesson clips out of long grammar recordings.
//!
//! Each range of a downloaded video becomes its own file next to the parent,
//! named after the parent with the range's seconds appended
//! (`abc.mp4` + `10..20` → `abc10_20.mp4`). A clip file that already exists
//! is never re-encoded or inspected.

use crate::downloader::DownloadedAsset;
use crate::error::{AcquisitionError, Result};
use crate::ytdlp::Toolchain;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info, warn};

pub const CLIP_FRAME_RATE: u32 = 25;
pub const CLIP_AUDIO_CODEC: &str = "aac";

/// Seconds from the start of the parent video, `start` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub start: u32,
    pub end: u32,
}

impl ClipRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl From<(u32, u32)> for ClipRange {
    fn from((start, end): (u32, u32)) -> Self {
        Self { start, end }
    }
}

/// A cut segment. `asset` is an independent copy of the parent with the
/// clip's own path, identifier and numbered title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipAsset {
    pub asset: DownloadedAsset,
    pub range: ClipRange,
}

/// Output location of `range` cut from `parent`.
pub fn clip_path(parent: &Path, range: ClipRange) -> PathBuf {
    let stem = parent
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match parent.extension() {
        Some(ext) => format!(
            "{stem}{}_{}.{}",
            range.start,
            range.end,
            ext.to_string_lossy()
        ),
        None => format!("{stem}{}_{}", range.start, range.end),
    };
    parent.with_file_name(name)
}

/// Parent title minus its last three characters, followed by the counter.
pub fn clip_title(parent_title: &str, counter: u32) -> String {
    let mut chars = parent_title.chars();
    for _ in 0..3 {
        chars.next_back();
    }
    format!("{} {}", chars.as_str(), counter)
}

pub struct ClipCutter<'a> {
    tools: &'a Toolchain,
}

impl<'a> ClipCutter<'a> {
    pub fn new(tools: &'a Toolchain) -> Self {
        Self { tools }
    }

    /// Lazily cuts `ranges` out of `parent`.
    ///
    /// Every yielded clip comes with the counter value the next clip should
    /// use. Ranges that cannot be encoded are logged and skipped without
    /// consuming a counter value.
    pub fn cut<'c>(
        &'c self,
        parent: &'c DownloadedAsset,
        ranges: impl IntoIterator<Item = ClipRange>,
        start_counter: u32,
    ) -> ClipCuts<'c> {
        ClipCuts {
            tools: self.tools,
            parent,
            ranges: ranges.into_iter().collect::<Vec<_>>().into_iter(),
            counter: start_counter,
        }
    }
}

pub struct ClipCuts<'c> {
    tools: &'c Toolchain,
    parent: &'c DownloadedAsset,
    ranges: std::vec::IntoIter<ClipRange>,
    counter: u32,
}

impl ClipCuts<'_> {
    /// Counter value the next yielded clip will carry.
    pub fn counter(&self) -> u32 {
        self.counter
    }
}

impl Iterator for ClipCuts<'_> {
    type Item = (ClipAsset, u32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let range = self.ranges.next()?;
            let path = clip_path(&self.parent.path, range);

            if path.exists() {
                debug!(path = %path.display(), "clip already cut");
            } else if let Err(err) = encode_clip(self.tools, &self.parent.path, range, &path) {
                warn!(
                    kind = err.kind(),
                    url = %self.parent.source_id,
                    start = range.start,
                    end = range.end,
                    "skipping clip: {err}"
                );
                continue;
            } else {
                info!(path = %path.display(), "cut clip");
            }

            let mut asset = self.parent.clone();
            asset.source_id = path.to_string_lossy().into_owned();
            asset.title = clip_title(&self.parent.title, self.counter);
            asset.path = path;
            self.counter += 1;
            return Some((ClipAsset { asset, range }, self.counter));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ranges.len()))
    }
}

/// Re-encodes `range` of `source` into `output` at a fixed frame rate and
/// audio codec. The clip is written to a `.part` file first so `output` only
/// ever appears complete.
fn encode_clip(tools: &Toolchain, source: &Path, range: ClipRange, output: &Path) -> Result<()> {
    if range.end <= range.start {
        return Err(AcquisitionError::encode(
            output,
            format!("empty range {}..{}", range.start, range.end),
        ));
    }
    if !source.exists() {
        return Err(AcquisitionError::encode(
            output,
            format!("source video {} is not on disk", source.display()),
        ));
    }

    let partial = output.with_extension("part");
    let mut command = tools.ffmpeg_command();
    command
        .arg("-hide_banner")
        .arg("-loglevel")
        .arg("error")
        .arg("-nostdin")
        .arg("-y")
        .arg("-ss")
        .arg(range.start.to_string())
        .arg("-to")
        .arg(range.end.to_string())
        .arg("-i")
        .arg(source)
        .arg("-r")
        .arg(CLIP_FRAME_RATE.to_string())
        .arg("-c:a")
        .arg(CLIP_AUDIO_CODEC)
        .arg("-f")
        .arg("mp4")
        .arg(&partial)
        .stdin(Stdio::null());

    debug!(?command, "encoding clip");
    let result = command.output();
    let failure = match result {
        Ok(out) if out.status.success() => None,
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let reason = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("no error output")
                .to_string();
            Some(format!("ffmpeg exited with {}: {reason}", out.status))
        }
        Err(err) => Some(format!("could not execute ffmpeg: {err}")),
    };

    if let Some(message) = failure {
        let _ = fs::remove_file(&partial);
        return Err(AcquisitionError::encode(output, message));
    }

    fs::rename(&partial, output).map_err(|err| {
        AcquisitionError::encode(output, format!("finalizing {}: {err}", partial.display()))
    })
}
