#![forbid(unsafe_code)]

//! Scrapes the Hello Channel into a JSON topic tree.
//!
//! Vocabulary lessons are resolved from the channel listing, grammar clips are
//! cut according to the edit list, and the finished tree is written to
//! `<data_dir>/trees/ricecooker_json_tree.json`.

use anyhow::{Context, Result};
use clap::Parser;
use hello_channel_chef::chef::Chef;
use hello_channel_chef::config::{ConfigOverrides, parse_flag, resolve_config};
use hello_channel_chef::ytdlp::Toolchain;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "hello_channel_chef", version, about)]
struct ChefArgs {
    /// Download media (1) or only collect metadata (0).
    #[arg(long = "download-video", value_name = "0|1", value_parser = parse_switch)]
    download_video: Option<bool>,

    /// Reuse the cached channel listing (1). Cached listings never expire;
    /// delete the file under `<data-dir>/sushi-chef-hello-channel` to refresh.
    #[arg(long = "load-video-list", value_name = "0|1", value_parser = parse_switch)]
    load_video_list: Option<bool>,

    /// Skip downloading videos whose file is already present.
    #[arg(long)]
    skip_existing: bool,

    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "URL")]
    channel_url: Option<String>,

    /// CSV with `video_url`, `start` and `stop` columns.
    #[arg(long, value_name = "FILE")]
    editing_csv: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

impl ChefArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            data_dir: self.data_dir.clone(),
            channel_url: self.channel_url.clone(),
            editing_csv: self.editing_csv.clone(),
            download_videos: self.download_video,
            load_video_list: self.load_video_list,
            skip_existing_downloads: self.skip_existing.then_some(true),
            env_path: self.env_file.clone(),
        }
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    parse_flag("switch", value)
}

/// `--quiet` and `--verbose` win over `RUST_LOG`; an unset or unparsable
/// `RUST_LOG` falls back to `info`.
fn log_filter(verbose: bool, quiet: bool, rust_log: Option<&str>) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        rust_log
            .and_then(|value| EnvFilter::try_new(value).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(verbose, quiet, rust_log.as_deref()))
        .with(fmt::layer().with_target(false).with_level(verbose))
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = ChefArgs::parse();
    init_logging(args.verbose, args.quiet)?;

    let config = resolve_config(args.overrides())?;
    let tools = Toolchain::from_config(&config);
    tools.ensure_available()?;
    config.prepare()?;

    println!("===================================");
    println!("Hello Channel Chef");
    println!("===================================");
    println!("Channel: {}", config.channel_url);
    println!("Data directory: {}", config.data_dir.display());
    println!("Edit list: {}", config.editing_csv.display());
    println!(
        "Download videos: {}",
        if config.download_videos { "yes" } else { "no" }
    );
    println!();

    let summary = Chef::new(&config, &tools).run()?;

    println!();
    println!("Vocabulary lessons: {}", summary.vocabulary_lessons);
    println!("Grammar clips: {}", summary.grammar_clips);
    println!("Tree written to {}", summary.tree_path.display());
    Ok(())
}
