//! Helpers shared by unit tests: stub executables and throwaway configs.

use crate::config::ChefConfig;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable bash script named `name` into `dir`.
pub fn install_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let script_path = dir.join(name);
    let script = format!("#!/usr/bin/env bash\nset -eu\n{body}");
    fs::write(&script_path, script).unwrap();
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
    }
    script_path
}

/// Number of lines in an invocation log written by a stub, zero when the stub
/// never ran.
pub fn invocation_count(log: &Path) -> usize {
    fs::read_to_string(log)
        .map(|content| content.lines().count())
        .unwrap_or(0)
}

pub fn test_config(data_dir: &Path, yt_dlp: &Path, ffmpeg: &Path) -> ChefConfig {
    ChefConfig {
        data_dir: data_dir.to_path_buf(),
        channel_url: "https://www.youtube.com/channel/UCtest/videos".into(),
        editing_csv: data_dir.join("video_editing_data.csv"),
        language: "en".into(),
        yt_dlp_bin: yt_dlp.to_path_buf(),
        ffmpeg_bin: ffmpeg.to_path_buf(),
        download_videos: true,
        load_video_list: false,
        skip_existing_downloads: false,
    }
}
