//! Single-video downloads through yt-dlp.
//!
//! Every video is fetched at no more than 480p into `<target_dir>/<id>.mp4`
//! together with its subtitle tracks. Failures are logged and the video is
//! skipped; the run never aborts because of one video.

use crate::config::ChefConfig;
use crate::error::{AcquisitionError, Result};
use crate::source::VideoSource;
use crate::ytdlp::{FORMAT_SELECTOR, Toolchain, VideoInfo, run_json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const OUTPUT_EXT: &str = "mp4";

/// Subtitle track published for a video. Always a subtitle file; only the
/// language varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub video_id: String,
    pub language: String,
}

/// A video that is present (or, in metadata-only runs, expected) on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub source_id: String,
    pub video_id: String,
    pub title: String,
    pub path: PathBuf,
    pub language: String,
    pub subtitles: Vec<SubtitleTrack>,
}

pub struct Downloader<'a> {
    tools: &'a Toolchain,
    download_media: bool,
    skip_existing: bool,
    language: String,
}

impl<'a> Downloader<'a> {
    pub fn new(
        tools: &'a Toolchain,
        download_media: bool,
        skip_existing: bool,
        language: &str,
    ) -> Self {
        Self {
            tools,
            download_media,
            skip_existing,
            language: language.to_string(),
        }
    }

    pub fn from_config(tools: &'a Toolchain, config: &ChefConfig) -> Self {
        Self::new(
            tools,
            config.download_videos,
            config.skip_existing_downloads,
            &config.language,
        )
    }

    /// Downloads `source`, logging and swallowing any failure.
    pub fn fetch(
        &self,
        source: &VideoSource,
        target_dir: &Path,
        want_subtitles: bool,
    ) -> Option<DownloadedAsset> {
        match self.try_fetch(source, target_dir, want_subtitles) {
            Ok(asset) => Some(asset),
            Err(err) => {
                warn!(kind = err.kind(), url = %source, "skipping video: {err}");
                None
            }
        }
    }

    pub fn try_fetch(
        &self,
        source: &VideoSource,
        target_dir: &Path,
        want_subtitles: bool,
    ) -> Result<DownloadedAsset> {
        fs::create_dir_all(target_dir).map_err(|err| {
            AcquisitionError::download(
                source.url(),
                format!("creating {}: {err}", target_dir.display()),
            )
        })?;

        let existing = if self.skip_existing {
            source
                .video_id()
                .map(|id| default_path(target_dir, id))
                .filter(|path| path.exists())
        } else {
            None
        };
        let fetch_media = self.download_media && existing.is_none();

        let output_template = target_dir.join("%(id)s.%(ext)s");
        let mut command = self.tools.yt_dlp_command();
        command
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--restrict-filenames")
            .arg("--continue")
            .arg("--format")
            .arg(FORMAT_SELECTOR)
            .arg("--merge-output-format")
            .arg(OUTPUT_EXT)
            .arg("--output")
            .arg(output_template.to_string_lossy().to_string());

        if fetch_media {
            command.arg("--no-simulate");
            if want_subtitles {
                command.arg("--write-subs").arg("--sub-langs").arg("all");
            }
        } else {
            command.arg("--skip-download");
        }
        command.arg(source.url());

        let info: VideoInfo = run_json(&mut command)
            .map_err(|message| AcquisitionError::download(source.url(), message))?;

        let video_id = info
            .id
            .clone()
            .or_else(|| source.video_id().map(str::to_owned))
            .ok_or_else(|| AcquisitionError::malformed(source.url(), "id"))?;
        let title = info
            .display_title()
            .map(str::to_owned)
            .ok_or_else(|| AcquisitionError::malformed(source.url(), "title"))?;

        let path = match existing {
            Some(path) => path,
            None => info
                .reported_path()
                .unwrap_or_else(|| default_path(target_dir, &video_id)),
        };
        if fetch_media && !path.exists() {
            return Err(AcquisitionError::download(
                source.url(),
                format!("extractor reported {} but it is not on disk", path.display()),
            ));
        }

        let subtitles = if want_subtitles {
            info.subtitle_languages()
                .into_iter()
                .map(|language| SubtitleTrack {
                    video_id: video_id.clone(),
                    language,
                })
                .collect()
        } else {
            Vec::new()
        };

        info!(
            video_id = %video_id,
            path = %path.display(),
            downloaded = fetch_media,
            "fetched video"
        );

        Ok(DownloadedAsset {
            source_id: source.url().to_string(),
            video_id,
            title,
            path,
            language: self.language.clone(),
            subtitles,
        })
    }
}

fn default_path(target_dir: &Path, video_id: &str) -> PathBuf {
    target_dir.join(format!("{video_id}.{OUTPUT_EXT}"))
}
