#![forbid(unsafe_code)]

//! Content chef for the "Free English with Hello Channel" YouTube channel.
//!
//! The library resolves the channel into lessons, downloads every video with
//! its subtitles, cuts grammar clips out of long recordings and renders the
//! resulting topic tree as JSON.

pub mod chef;
pub mod clips;
pub mod config;
pub mod downloader;
pub mod editing;
pub mod error;
pub mod resolver;
pub mod source;
pub mod titles;
pub mod tree;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod test_support;
