#![forbid(unsafe_code)]

//! Run configuration for the chef.
//!
//! Values are layered: a `.env`-style file provides defaults, process
//! environment variables override the file, and explicit overrides (usually
//! coming from the command line) win over both.

use anyhow::{Context, Result, bail};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_DATA_DIR: &str = "chefdata";
pub const DEFAULT_CHANNEL_URL: &str =
    "https://www.youtube.com/channel/UCdvmxJ8AmQBtcveTIBW3Qvw/videos";
pub const DEFAULT_EDITING_CSV: &str = "video_editing_data.csv";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_YT_DLP_BIN: &str = "yt-dlp";
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

/// Identifier of the channel inside the content pipeline. Also names the
/// directory holding memoized playlist resolutions.
pub const CHANNEL_SOURCE_ID: &str = "sushi-chef-hello-channel";

const MEDIA_SUBDIR: &str = "data";
const TREES_SUBDIR: &str = "trees";

/// Everything the resolver, downloader and clip cutter need to know about the
/// current run. Built once by the entry point and passed down by reference.
#[derive(Debug, Clone)]
pub struct ChefConfig {
    pub data_dir: PathBuf,
    pub channel_url: String,
    pub editing_csv: PathBuf,
    pub language: String,
    pub yt_dlp_bin: PathBuf,
    pub ffmpeg_bin: PathBuf,
    /// When off, only metadata is fetched and no media is written.
    pub download_videos: bool,
    /// Trust a previously cached playlist resolution. Cached lists are never
    /// refreshed; delete the cache file to force a new resolution.
    pub load_video_list: bool,
    /// Skip the media fetch for videos whose `<id>.mp4` is already on disk.
    pub skip_existing_downloads: bool,
}

impl ChefConfig {
    /// Directory receiving downloaded videos, subtitles and cut clips.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join(MEDIA_SUBDIR)
    }

    /// Directory holding one JSON file per resolved playlist.
    pub fn playlist_cache_dir(&self) -> PathBuf {
        self.data_dir.join(CHANNEL_SOURCE_ID)
    }

    pub fn trees_dir(&self) -> PathBuf {
        self.data_dir.join(TREES_SUBDIR)
    }

    /// Creates every directory the run writes to.
    pub fn prepare(&self) -> Result<()> {
        for dir in [self.media_dir(), self.playlist_cache_dir(), self.trees_dir()] {
            fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub channel_url: Option<String>,
    pub editing_csv: Option<PathBuf>,
    pub download_videos: Option<bool>,
    pub load_video_list: Option<bool>,
    pub skip_existing_downloads: Option<bool>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_config(overrides: ConfigOverrides) -> Result<ChefConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_config_with_overrides(&file_vars, env_var_string, overrides)
}

#[cfg(test)]
fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ChefConfig> {
    build_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default())
}

fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<ChefConfig> {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);

    let data_dir = overrides
        .data_dir
        .or_else(|| lookup("CHEF_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let channel_url = overrides
        .channel_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup("CHEF_CHANNEL_URL"))
        .unwrap_or_else(|| DEFAULT_CHANNEL_URL.to_string());
    let editing_csv = overrides
        .editing_csv
        .or_else(|| lookup("CHEF_EDITING_CSV").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EDITING_CSV));
    let language = lookup("CHEF_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let yt_dlp_bin = lookup("YT_DLP_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YT_DLP_BIN));
    let ffmpeg_bin = lookup("FFMPEG_BIN")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_BIN));

    let download_videos = match overrides.download_videos {
        Some(value) => value,
        None => lookup_flag("CHEF_DOWNLOAD_VIDEOS", &lookup)?.unwrap_or(true),
    };
    let load_video_list = match overrides.load_video_list {
        Some(value) => value,
        None => lookup_flag("CHEF_LOAD_VIDEO_LIST", &lookup)?.unwrap_or(false),
    };
    let skip_existing_downloads = match overrides.skip_existing_downloads {
        Some(value) => value,
        None => lookup_flag("CHEF_SKIP_EXISTING", &lookup)?.unwrap_or(false),
    };

    Ok(ChefConfig {
        data_dir,
        channel_url,
        editing_csv,
        language,
        yt_dlp_bin,
        ffmpeg_bin,
        download_videos,
        load_video_list,
        skip_existing_downloads,
    })
}

fn lookup_flag(key: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<bool>> {
    lookup(key).map(|value| parse_flag(key, &value)).transpose()
}

/// Accepts the usual spellings of a boolean switch, including the `0`/`1`
/// values the chef's run options have always used.
pub fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be a boolean (0/1, true/false), got {value:?}"),
    }
}

fn env_var_string(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Process environment first, then the `.env` file. Blank values count as
/// unset at both layers.
fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

/// Reads `KEY=value` pairs. A missing file is an empty set of values.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content
        .lines()
        .filter_map(parse_env_line)
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

/// Splits one assignment, accepting an `export` prefix and one level of
/// single or double quotes. Comments and lines without `=` yield nothing.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
