//! Channel and playlist resolution with an on-disk memo.
//!
//! Resolving the channel means one extractor call to enumerate the uploads
//! plus one call per upload to learn its title, so the result is cached as
//! `<cache_dir>/<cache_key>.json`. A cached list is reused only when the run
//! asks for it, and it is never checked for staleness: delete the file to
//! force a fresh resolution.

use crate::config::ChefConfig;
use crate::error::{AcquisitionError, Result};
use crate::source::VideoSource;
use crate::ytdlp::{PlaylistInfo, Toolchain, VideoInfo, run_json};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One upload of a resolved playlist. Serialized as a `[title, url]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ResolvedEntry {
    pub title: String,
    pub url: String,
}

impl ResolvedEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

impl From<(String, String)> for ResolvedEntry {
    fn from((title, url): (String, String)) -> Self {
        Self { title, url }
    }
}

impl From<ResolvedEntry> for (String, String) {
    fn from(entry: ResolvedEntry) -> Self {
        (entry.title, entry.url)
    }
}

/// Directory of memoized resolutions, one JSON file per source URL.
#[derive(Debug, Clone)]
pub struct PlaylistCache {
    dir: PathBuf,
}

impl PlaylistCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source: &VideoSource) -> PathBuf {
        self.dir.join(format!("{}.json", source.cache_key()))
    }

    /// Returns the cached entries, or `None` when nothing was cached yet.
    pub fn load(&self, source: &VideoSource) -> anyhow::Result<Option<Vec<ResolvedEntry>>> {
        let path = self.path_for(source);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let entries =
            serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(entries))
    }

    pub fn store(&self, source: &VideoSource, entries: &[ResolvedEntry]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(source);
        let tmp_path = path.with_extension("tmp");
        let payload = serde_json::to_vec(entries).context("serializing playlist")?;
        fs::write(&tmp_path, payload).with_context(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).with_context(|| format!("finalizing {}", path.display()))?;
        Ok(())
    }
}

pub struct PlaylistResolver<'a> {
    tools: &'a Toolchain,
    cache: PlaylistCache,
    reuse_cache: bool,
}

impl<'a> PlaylistResolver<'a> {
    pub fn new(tools: &'a Toolchain, cache: PlaylistCache, reuse_cache: bool) -> Self {
        Self {
            tools,
            cache,
            reuse_cache,
        }
    }

    pub fn from_config(tools: &'a Toolchain, config: &ChefConfig) -> Self {
        Self::new(
            tools,
            PlaylistCache::new(config.playlist_cache_dir()),
            config.load_video_list,
        )
    }

    pub fn cache_path(&self, source: &VideoSource) -> PathBuf {
        self.cache.path_for(source)
    }

    /// Lists `(title, url)` for every upload of `source`, in extractor order.
    ///
    /// Entries whose metadata cannot be fetched are logged and left out. When
    /// the listing itself fails the result is empty and nothing is cached.
    pub fn resolve_playlist(&self, source: &VideoSource) -> Vec<ResolvedEntry> {
        if self.reuse_cache {
            match self.cache.load(source) {
                Ok(Some(entries)) => {
                    info!(
                        source = %source,
                        entries = entries.len(),
                        "using cached playlist"
                    );
                    return entries;
                }
                Ok(None) => debug!(source = %source, "no cached playlist"),
                Err(err) => warn!(source = %source, "ignoring unreadable playlist cache: {err:#}"),
            }
        }

        let urls = match self.playlist_links(source) {
            Ok(urls) => urls,
            Err(err) => {
                warn!(kind = err.kind(), source = %source, "{err}");
                return Vec::new();
            }
        };

        let total = urls.len();
        let mut entries = Vec::with_capacity(total);
        for (index, url) in urls.into_iter().enumerate() {
            match self.entry_title(&url) {
                Ok(title) => {
                    debug!("[{}/{}] {}", index + 1, total, title);
                    entries.push(ResolvedEntry::new(title, url));
                }
                Err(err) => warn!(kind = err.kind(), url = %url, "{err}"),
            }
        }

        if let Err(err) = self.cache.store(source, &entries) {
            warn!(source = %source, "could not cache playlist: {err:#}");
        }
        info!(source = %source, entries = entries.len(), "resolved playlist");
        entries
    }

    /// Enumerates the watch-page URL of every entry without downloading.
    pub fn playlist_links(&self, source: &VideoSource) -> Result<Vec<String>> {
        let mut command = self.tools.yt_dlp_command();
        command
            .arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--yes-playlist")
            .arg("--no-warnings")
            .arg(source.url());

        let info: PlaylistInfo = run_json(&mut command)
            .map_err(|message| AcquisitionError::resolution(source.url(), message))?;
        let entries = info
            .entries
            .ok_or_else(|| AcquisitionError::malformed(source.url(), "entries"))?;

        let mut urls = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().flatten() {
            match entry.canonical_url() {
                Some(url) => urls.push(url),
                None => {
                    let err = AcquisitionError::malformed(source.url(), "webpage_url");
                    warn!(kind = err.kind(), "{err}");
                }
            }
        }
        Ok(urls)
    }

    fn entry_title(&self, url: &str) -> Result<String> {
        let mut command = self.tools.yt_dlp_command();
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(url);

        let info: VideoInfo =
            run_json(&mut command).map_err(|message| AcquisitionError::download(url, message))?;
        info.display_title()
            .map(str::to_owned)
            .ok_or_else(|| AcquisitionError::malformed(url, "title"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{install_stub, invocation_count};
    use std::path::Path;
    use tempfile::tempdir;

    const CHANNEL: &str = "https://www.youtube.com/channel/UCtest/videos";

    /// Stub yt-dlp: the playlist lists five videos, `v3` fails with an
    /// extractor error and every other video reports `Title <id>`.
    fn playlist_stub(dir: &Path) -> (PathBuf, PathBuf) {
        let log = dir.join("yt-dlp.log");
        let body = format!(
            r#"echo "$*" >> '{log}'
url="${{@: -1}}"
if printf '%s\n' "$@" | grep -q -- '--flat-playlist'; then
  echo '{{"id":"UCtest","entries":[{{"id":"v1","url":"https://www.youtube.com/watch?v=v1"}},{{"id":"v2","url":"v2"}},{{"id":"v3"}},{{"id":"v4","webpage_url":"https://www.youtube.com/watch?v=v4"}},{{"id":"v5"}}]}}'
  exit 0
fi
id="${{url##*v=}}"
if [[ "$id" == "v3" ]]; then
  echo "ERROR: [youtube] v3: Private video" >&2
  exit 1
fi
echo "{{\"id\":\"$id\",\"title\":\"Title $id\"}}"
"#,
            log = log.display()
        );
        (install_stub(dir, "yt-dlp", &body), log)
    }

    fn resolver_for<'a>(tools: &'a Toolchain, dir: &Path, reuse: bool) -> PlaylistResolver<'a> {
        PlaylistResolver::new(tools, PlaylistCache::new(dir.join("cache")), reuse)
    }

    #[test]
    fn failing_entry_does_not_abort_resolution() {
        let dir = tempdir().unwrap();
        let (stub, _log) = playlist_stub(dir.path());
        let tools = Toolchain::new(stub, "ffmpeg");
        let resolver = resolver_for(&tools, dir.path(), false);

        let entries = resolver.resolve_playlist(&VideoSource::new(CHANNEL));
        let ids: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(ids, vec!["Title v1", "Title v2", "Title v4", "Title v5"]);
        assert_eq!(entries[1].url, "https://www.youtube.com/watch?v=v2");
    }

    #[test]
    fn cached_list_is_reused_without_network() {
        let dir = tempdir().unwrap();
        let (stub, log) = playlist_stub(dir.path());
        let tools = Toolchain::new(stub, "ffmpeg");
        let source = VideoSource::new(CHANNEL);

        let first = resolver_for(&tools, dir.path(), false).resolve_playlist(&source);
        let calls_after_first = invocation_count(&log);
        assert_eq!(calls_after_first, 6);

        let second = resolver_for(&tools, dir.path(), true).resolve_playlist(&source);
        assert_eq!(first, second);
        assert_eq!(invocation_count(&log), calls_after_first);
    }

    #[test]
    fn cache_is_ignored_without_reuse_flag() {
        let dir = tempdir().unwrap();
        let (stub, log) = playlist_stub(dir.path());
        let tools = Toolchain::new(stub, "ffmpeg");
        let source = VideoSource::new(CHANNEL);
        let cache = PlaylistCache::new(dir.path().join("cache"));
        cache
            .store(&source, &[ResolvedEntry::new("Stale", "https://stale")])
            .unwrap();

        let entries = resolver_for(&tools, dir.path(), false).resolve_playlist(&source);
        assert_eq!(entries.len(), 4);
        assert!(invocation_count(&log) > 0);
        assert_eq!(cache.load(&source).unwrap().unwrap(), entries);
    }

    #[test]
    fn unreadable_cache_is_resolved_again() {
        let dir = tempdir().unwrap();
        let (stub, log) = playlist_stub(dir.path());
        let tools = Toolchain::new(stub, "ffmpeg");
        let source = VideoSource::new(CHANNEL);
        let cache = PlaylistCache::new(dir.path().join("cache"));
        fs::create_dir_all(dir.path().join("cache")).unwrap();
        fs::write(cache.path_for(&source), "{not json").unwrap();

        let entries = resolver_for(&tools, dir.path(), true).resolve_playlist(&source);
        assert_eq!(entries.len(), 4);
        assert_eq!(invocation_count(&log), 6);
        assert_eq!(cache.load(&source).unwrap(), Some(entries));
    }

    #[test]
    fn cache_roundtrip_preserves_order() {
        let dir = tempdir().unwrap();
        let cache = PlaylistCache::new(dir.path());
        let source = VideoSource::new(CHANNEL);
        let entries = vec![
            ResolvedEntry::new("B lesson", "https://www.youtube.com/watch?v=b"),
            ResolvedEntry::new("A lesson", "https://www.youtube.com/watch?v=a"),
            ResolvedEntry::new("B lesson", "https://www.youtube.com/watch?v=c"),
        ];
        cache.store(&source, &entries).unwrap();
        assert_eq!(cache.load(&source).unwrap(), Some(entries));
    }

    #[test]
    fn cache_file_is_array_of_pairs() {
        let dir = tempdir().unwrap();
        let cache = PlaylistCache::new(dir.path());
        let source = VideoSource::new(CHANNEL);
        cache
            .store(&source, &[ResolvedEntry::new("T", "https://u")])
            .unwrap();
        let raw = fs::read_to_string(cache.path_for(&source)).unwrap();
        assert_eq!(raw, r#"[["T","https://u"]]"#);
    }

    #[test]
    fn trailing_slash_shares_cache_file() {
        let dir = tempdir().unwrap();
        let cache = PlaylistCache::new(dir.path());
        assert_eq!(
            cache.path_for(&VideoSource::new(&format!("{CHANNEL}/"))),
            cache.path_for(&VideoSource::new(CHANNEL)),
        );
    }

    #[test]
    fn failed_listing_yields_nothing_and_caches_nothing() {
        let dir = tempdir().unwrap();
        let stub = install_stub(
            dir.path(),
            "yt-dlp",
            "echo 'ERROR: Unable to download webpage' >&2\nexit 1\n",
        );
        let tools = Toolchain::new(stub, "ffmpeg");
        let resolver = resolver_for(&tools, dir.path(), false);
        let source = VideoSource::new(CHANNEL);

        assert!(resolver.resolve_playlist(&source).is_empty());
        assert!(!resolver.cache_path(&source).exists());

        let err = resolver.playlist_links(&source).unwrap_err();
        assert!(matches!(err, AcquisitionError::Resolution { .. }));
    }

    #[test]
    fn listing_without_entries_is_malformed() {
        let dir = tempdir().unwrap();
        let stub = install_stub(dir.path(), "yt-dlp", "echo '{\"id\":\"x\"}'\n");
        let tools = Toolchain::new(stub, "ffmpeg");
        let err = resolver_for(&tools, dir.path(), false)
            .playlist_links(&VideoSource::new(CHANNEL))
            .unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::MalformedResponse {
                field: "entries",
                ..
            }
        ));
    }
}
