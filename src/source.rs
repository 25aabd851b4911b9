//! Canonical identity of a YouTube video, playlist or channel URL.

use std::fmt;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// A normalized video or playlist URL. Two spellings of the same URL that
/// differ only by a trailing slash or surrounding whitespace compare equal and
/// share a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoSource {
    url: String,
}

impl VideoSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: clean_url(url),
        }
    }

    /// Builds a source from an embed URL (`…/embed/<id>?…`), rewriting it to
    /// the regular watch page.
    pub fn from_embed(url: &str) -> Self {
        Self::new(&transform_embed(url))
    }

    pub fn from_video_id(video_id: &str) -> Self {
        Self::new(&watch_url(video_id))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hex digest naming the on-disk memo of this source's resolution.
    pub fn cache_key(&self) -> String {
        blake3::hash(self.url.as_bytes()).to_hex().to_string()
    }

    /// Platform identifier of a single video, when the URL names one.
    pub fn video_id(&self) -> Option<&str> {
        let without_fragment = self.url.split('#').next().unwrap_or(&self.url);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        if let Some(query) = query {
            for pair in query.split('&') {
                if let Some(id) = pair.strip_prefix("v=")
                    && !id.is_empty()
                {
                    return Some(id);
                }
            }
        }

        let path = path.trim_end_matches('/');
        if let Some((host_and_path, id)) = path.rsplit_once('/') {
            let is_video_path = host_and_path.ends_with("youtu.be")
                || host_and_path.ends_with("/shorts")
                || host_and_path.ends_with("/embed");
            if is_video_path && !id.is_empty() {
                return Some(id);
            }
        }
        None
    }

    pub fn is_youtube(&self) -> bool {
        is_youtube(&self.url, false)
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

/// Trims whitespace and a single trailing slash.
pub fn clean_url(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).trim().to_string()
}

/// Drops the query string and turns `embed/` into `watch?v=`.
pub fn transform_embed(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.replace("embed/", "watch?v=").trim().to_string()
}

/// True for youtube.com / youtu.be URLs. User and custom-name channel pages
/// only count when `allow_channel` is set.
pub fn is_youtube(url: &str, allow_channel: bool) -> bool {
    let youtube = url.contains("youtube") || url.contains("youtu.be");
    if allow_channel {
        youtube
    } else {
        youtube && !url.contains("user") && !url.contains("/c/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYLIST: &str = "https://www.youtube.com/playlist?list=PL123";

    #[test]
    fn trailing_slash_does_not_change_identity() {
        let with_slash = VideoSource::new(&format!("{PLAYLIST}/"));
        let without = VideoSource::new(PLAYLIST);
        assert_eq!(with_slash, without);
        assert_eq!(with_slash.url(), PLAYLIST);
        assert_eq!(with_slash.cache_key(), without.cache_key());
    }

    #[test]
    fn cache_key_is_hex_digest() {
        let key = VideoSource::new(PLAYLIST).cache_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, VideoSource::new("https://www.youtube.com/watch?v=a").cache_key());
    }

    #[test]
    fn surrounding_whitespace_is_removed() {
        assert_eq!(
            VideoSource::new("  https://youtu.be/abc/ \n").url(),
            "https://youtu.be/abc"
        );
    }

    #[test]
    fn embed_urls_become_watch_urls() {
        let source = VideoSource::from_embed("https://www.youtube.com/embed/xyz?rel=0&start=4");
        assert_eq!(source.url(), "https://www.youtube.com/watch?v=xyz");
        assert_eq!(source.video_id(), Some("xyz"));
    }

    #[test]
    fn video_id_forms() {
        let cases = [
            ("https://www.youtube.com/watch?v=abc123", Some("abc123")),
            ("https://www.youtube.com/watch?feature=share&v=def", Some("def")),
            ("https://youtu.be/ghi", Some("ghi")),
            ("https://www.youtube.com/shorts/jkl/", Some("jkl")),
            ("https://www.youtube.com/embed/mno", Some("mno")),
            (PLAYLIST, None),
            ("https://www.youtube.com/channel/UCdvmxJ8AmQBtcveTIBW3Qvw/videos", None),
        ];
        for (url, expected) in cases {
            assert_eq!(VideoSource::new(url).video_id(), expected, "{url}");
        }
    }

    #[test]
    fn from_video_id_builds_watch_url() {
        let source = VideoSource::from_video_id("abc");
        assert_eq!(source.url(), "https://www.youtube.com/watch?v=abc");
        assert_eq!(source.to_string(), source.url());
    }

    #[test]
    fn youtube_detection_excludes_user_pages_by_default() {
        assert!(is_youtube("https://youtu.be/abc", false));
        assert!(!is_youtube("https://www.youtube.com/user/someone", false));
        assert!(!is_youtube("https://www.youtube.com/c/someone", false));
        assert!(is_youtube("https://www.youtube.com/c/someone", true));
        assert!(!is_youtube("https://vimeo.com/1", true));
        assert!(VideoSource::new(PLAYLIST).is_youtube());
    }
}
