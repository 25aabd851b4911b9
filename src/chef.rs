//! Topic assembly and the end-to-end run.
//!
//! The vocabulary topic comes from the channel listing, the grammar topic
//! from the edit list. Both end up as children of one channel node written to
//! `<data_dir>/trees`.

use crate::clips::ClipCutter;
use crate::config::ChefConfig;
use crate::downloader::Downloader;
use crate::editing::read_video_editing_file;
use crate::resolver::{PlaylistResolver, ResolvedEntry};
use crate::source::VideoSource;
use crate::titles::{VOCABULARY_PREFIX, clean_grammar_title, clean_vocabulary_title};
use crate::tree::{ChannelNode, ContentNode, TREE_FILE_NAME, TopicNode, write_tree};
use crate::ytdlp::Toolchain;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

pub const VOCABULARY_TOPIC: &str = "Vocabulary and Conversational English";
pub const GRAMMAR_TOPIC: &str = "English Grammar";
pub const FIRST_CLIP_NUMBER: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub vocabulary_lessons: usize,
    pub grammar_clips: usize,
    pub tree_path: PathBuf,
}

/// Vocabulary uploads grouped by exact title, titles in ascending order and
/// URLs in listing order.
pub fn group_vocabulary_units(entries: Vec<ResolvedEntry>) -> BTreeMap<String, Vec<String>> {
    let mut units: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        if entry.title.starts_with(VOCABULARY_PREFIX) {
            units.entry(entry.title).or_default().push(entry.url);
        }
    }
    units
}

pub struct Chef<'a> {
    config: &'a ChefConfig,
    tools: &'a Toolchain,
}

impl<'a> Chef<'a> {
    pub fn new(config: &'a ChefConfig, tools: &'a Toolchain) -> Self {
        Self { config, tools }
    }

    pub fn vocabulary_topic(&self) -> TopicNode {
        let mut topic = TopicNode::new(VOCABULARY_TOPIC, &self.config.language);
        let resolver = PlaylistResolver::from_config(self.tools, self.config);
        let downloader = Downloader::from_config(self.tools, self.config);
        let media_dir = self.config.media_dir();

        let entries = resolver.resolve_playlist(&VideoSource::new(&self.config.channel_url));
        for (_, urls) in group_vocabulary_units(entries) {
            for url in urls {
                let Some(mut asset) = downloader.fetch(&VideoSource::new(&url), &media_dir, true)
                else {
                    continue;
                };
                asset.title = clean_vocabulary_title(&asset.title);
                info!("+ {}", asset.title);
                topic.add_node(asset.to_node());
            }
        }
        topic
    }

    /// Fails only when the edit list cannot be read. Clips keep the parent's
    /// subtitle tracks.
    pub fn grammar_topic(&self) -> Result<TopicNode> {
        let schedule = read_video_editing_file(&self.config.editing_csv)?;
        info!(
            videos = schedule.len(),
            clips = schedule.clip_count(),
            "loaded edit list"
        );

        let mut topic = TopicNode::new(GRAMMAR_TOPIC, &self.config.language);
        let downloader = Downloader::from_config(self.tools, self.config);
        let cutter = ClipCutter::new(self.tools);
        let media_dir = self.config.media_dir();

        let mut counter = FIRST_CLIP_NUMBER;
        for (url, ranges) in schedule.iter() {
            let Some(parent) = downloader.fetch(&VideoSource::new(url), &media_dir, true) else {
                warn!(url = %url, clips = ranges.len(), "no clips cut from unavailable video");
                continue;
            };
            for (mut clip, next) in cutter.cut(&parent, ranges.iter().copied(), counter) {
                clip.asset.title = clean_grammar_title(&clip.asset.title);
                info!("+ {}", clip.asset.title);
                topic.add_node(clip.to_node());
                counter = next;
            }
        }
        Ok(topic)
    }

    /// Builds the whole channel: grammar first, then vocabulary.
    pub fn scrape(&self) -> Result<ChannelNode> {
        let mut channel = ChannelNode::new(self.config);
        let vocabulary = self.vocabulary_topic();
        let grammar = self.grammar_topic()?;
        channel.children.push(ContentNode::Topic(grammar));
        channel.children.push(ContentNode::Topic(vocabulary));
        Ok(channel)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let channel = self.scrape()?;
        let tree_path = self.config.trees_dir().join(TREE_FILE_NAME);
        write_tree(&tree_path, &channel)?;

        let count = |title: &str| {
            channel
                .children
                .iter()
                .find_map(|child| match child {
                    ContentNode::Topic(topic) if topic.title == title => Some(topic.children.len()),
                    _ => None,
                })
                .unwrap_or(0)
        };
        let summary = RunSummary {
            vocabulary_lessons: count(VOCABULARY_TOPIC),
            grammar_clips: count(GRAMMAR_TOPIC),
            tree_path,
        };
        info!(
            vocabulary = summary.vocabulary_lessons,
            grammar = summary.grammar_clips,
            path = %summary.tree_path.display(),
            "wrote channel tree"
        );
        Ok(summary)
    }
}
