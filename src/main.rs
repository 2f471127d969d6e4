//! Entry point for the console contract reader.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Fetch the contract and FAQ documents.
//! - Wire the console collaborators into a `ReaderPage` and run the loop.

mod console_speech;
mod content_source;
mod file_store;
mod runtime;
mod scheduler;
mod voice_clips;

use crate::console_speech::ConsoleSpeech;
use crate::content_source::ContentSource;
use crate::file_store::FileStore;
use crate::scheduler::Scheduler;
use crate::voice_clips::ClipDirectory;
use anyhow::{Context, Result, anyhow};
use recital_core::ReaderPage;
use recital_core::avatar::VoiceClipPlayer;
use recital_core::config::{ReaderConfig, load_config};
use recital_core::content::LoadedContent;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

#[derive(Debug)]
struct Args {
    source: ContentSource,
    clips: Option<PathBuf>,
    config: PathBuf,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        source = %args.source.identity(),
        level = %config.log_level,
        rate = config.default_rate,
        continuous = config.continuous_play,
        "Starting contract reader"
    );

    let content = match load_content(&args.source) {
        Ok(content) => content,
        Err(err) => {
            println!("{}", config.load_failure_message);
            return Err(err);
        }
    };

    let scheduler = Scheduler::shared();
    let engine = ConsoleSpeech::new(scheduler.clone());
    let storage = FileStore::for_source(&args.source.identity());
    info!(dir = %storage.dir().display(), "Progress storage ready");
    let avatar = args
        .clips
        .as_deref()
        .and_then(|dir| open_clips(dir, &config, scheduler.clone()));

    let page = match ReaderPage::open(config.clone(), content, engine, storage, avatar) {
        Ok(page) => page,
        Err(err) => {
            println!("{}", config.load_failure_message);
            return Err(anyhow::Error::new(err).context("Failed to index contract structure"));
        }
    };
    runtime::run(page, scheduler)
}

fn load_content(source: &ContentSource) -> Result<LoadedContent> {
    let raw = source.load().context("Failed to fetch contract content")?;
    raw.parse().context("Failed to parse contract content")
}

fn open_clips(
    dir: &Path,
    config: &ReaderConfig,
    scheduler: scheduler::SharedScheduler,
) -> Option<Box<dyn VoiceClipPlayer>> {
    if !config.prefer_voice_clips {
        info!("Voice clips disabled by config");
        return None;
    }
    match ClipDirectory::scan(dir, scheduler) {
        Ok(clips) => Some(Box::new(clips)),
        Err(err) => {
            warn!("Voice clips unavailable; using speech engine: {err:#}");
            None
        }
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Args> {
    let mut source = None;
    let mut clips = None;
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--clips" => {
                let dir = args.next().ok_or_else(|| anyhow!("--clips needs a directory"))?;
                clips = Some(PathBuf::from(dir));
            }
            "--config" => {
                let path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                config = PathBuf::from(path);
            }
            _ if source.is_none() => source = Some(ContentSource::parse(&arg)),
            _ => return Err(anyhow!("Unexpected argument: {arg}")),
        }
    }
    let source = source.ok_or_else(|| {
        anyhow!("Usage: recital <content-dir-or-url> [--clips <dir>] [--config <path>]")
    })?;
    Ok(Args {
        source,
        clips,
        config,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
