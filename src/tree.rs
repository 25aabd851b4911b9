//! Node descriptors for the ingestion pipeline and the JSON tree file.

use crate::clips::ClipAsset;
use crate::config::ChefConfig;
use crate::downloader::DownloadedAsset;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CHANNEL_NAME: &str = "Free English with Hello Channel";
pub const AUTHOR: &str = "Free English with Hello Channel";
pub const COPYRIGHT_HOLDER: &str = "Free English with Hello Channel";
pub const LICENSE_ID: &str = "CC BY";
pub const TREE_FILE_NAME: &str = "ricecooker_json_tree.json";
pub const DESCRIPTION_LIMIT: usize = 400;

const CHANNEL_DESCRIPTION: &str = "This YouTube channel teaches conversational English, English for social life
and grammar by using Hello Channel\u{2019}s TV educational shows with ESL learners.
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub license_id: String,
    pub copyright_holder: String,
}

impl License {
    pub fn channel_default() -> Self {
        Self {
            license_id: LICENSE_ID.to_string(),
            copyright_holder: COPYRIGHT_HOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "file_type", rename_all = "lowercase")]
pub enum FileDescriptor {
    Video { path: String },
    Subtitles { youtube_id: String, language: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentNode {
    Topic(TopicNode),
    Video(VideoNode),
}

impl ContentNode {
    pub fn source_id(&self) -> &str {
        match self {
            ContentNode::Topic(topic) => &topic.source_id,
            ContentNode::Video(video) => &video.source_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentNode::Topic(topic) => &topic.title,
            ContentNode::Video(video) => &video.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    pub source_id: String,
    pub title: String,
    pub description: Option<String>,
    pub language: String,
    pub author: String,
    pub license: License,
    pub children: Vec<ContentNode>,
}

impl TopicNode {
    /// A topic identified by its own title.
    pub fn new(title: &str, language: &str) -> Self {
        Self {
            source_id: title.to_string(),
            title: title.to_string(),
            description: None,
            language: language.to_string(),
            author: AUTHOR.to_string(),
            license: License::channel_default(),
            children: Vec::new(),
        }
    }

    /// Appends `node`, or replaces the child already carrying its source id
    /// without moving it.
    pub fn add_node(&mut self, node: ContentNode) {
        match self
            .children
            .iter_mut()
            .find(|child| child.source_id() == node.source_id())
        {
            Some(slot) => *slot = node,
            None => self.children.push(node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoNode {
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub license: License,
    pub files: Vec<FileDescriptor>,
}

impl DownloadedAsset {
    pub fn to_node(&self) -> ContentNode {
        let mut files = vec![FileDescriptor::Video {
            path: self.path.to_string_lossy().into_owned(),
        }];
        files.extend(self.subtitles.iter().map(|track| FileDescriptor::Subtitles {
            youtube_id: track.video_id.clone(),
            language: track.language.clone(),
        }));
        ContentNode::Video(VideoNode {
            source_id: self.source_id.clone(),
            title: self.title.clone(),
            description: String::new(),
            author: AUTHOR.to_string(),
            language: self.language.clone(),
            license: License::channel_default(),
            files,
        })
    }
}

impl ClipAsset {
    pub fn to_node(&self) -> ContentNode {
        self.asset.to_node()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelNode {
    pub source_domain: String,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub author: String,
    pub language: String,
    pub license: License,
    pub children: Vec<ContentNode>,
}

impl ChannelNode {
    pub fn new(config: &ChefConfig) -> Self {
        Self {
            source_domain: config.channel_url.clone(),
            source_id: config.channel_url.clone(),
            title: CHANNEL_NAME.to_string(),
            description: CHANNEL_DESCRIPTION.chars().take(DESCRIPTION_LIMIT).collect(),
            thumbnail: None,
            author: AUTHOR.to_string(),
            language: config.language.clone(),
            license: License::channel_default(),
            children: Vec::new(),
        }
    }
}

pub fn write_tree(path: &Path, channel: &ChannelNode) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let payload = serde_json::to_string_pretty(channel).context("serializing channel tree")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("moving tree into {}", path.display()))?;
    Ok(())
}

pub fn read_tree(path: &Path) -> Result<ChannelNode> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
