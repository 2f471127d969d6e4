//! Voice clips read from a directory of pre-recorded files.
//!
//! A clip's number is the first run of digits in its file name, so
//! `voice_01.wav` is clip 1. WAV durations come from the header; other
//! formats play for a fixed fallback duration.

use crate::scheduler::{Due, SharedScheduler};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use recital_core::avatar::VoiceClipPlayer;
use recital_core::narration::{EngineEvent, SessionToken};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

static RE_CLIP_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

const CLIP_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg"];
const FALLBACK_CLIP_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct Clip {
    path: PathBuf,
    duration: Duration,
}

pub struct ClipDirectory {
    clips: BTreeMap<usize, Clip>,
    scheduler: SharedScheduler,
    playing: Option<SessionToken>,
}

impl ClipDirectory {
    pub fn scan(dir: &Path, scheduler: SharedScheduler) -> Result<Self> {
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
        let mut clips = BTreeMap::new();
        for entry in entries {
            let path = entry.context("Failed to read clip entry")?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| CLIP_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !supported {
                continue;
            }
            let Some(number) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(clip_number)
            else {
                debug!(path = %path.display(), "Skipping clip without a number");
                continue;
            };
            let duration = clip_duration(&path);
            if let Some(previous) = clips.insert(number, Clip { path, duration }) {
                warn!(
                    number,
                    replaced = %previous.path.display(),
                    "Duplicate clip number; keeping the later file"
                );
            }
        }
        info!(dir = %dir.display(), clips = clips.len(), "Loaded voice clips");
        Ok(Self {
            clips,
            scheduler,
            playing: None,
        })
    }
}

impl VoiceClipPlayer for ClipDirectory {
    fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn has_clip(&self, index: usize) -> bool {
        self.clips.contains_key(&index)
    }

    fn trigger_voice(&mut self, index: usize, token: SessionToken) -> bool {
        let Some(clip) = self.clips.get(&index) else {
            return false;
        };
        println!("[voice clip {index}] {}", clip.path.display());
        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.schedule(Duration::ZERO, Due::Engine(EngineEvent::Started(token)));
        scheduler.schedule(clip.duration, Due::Engine(EngineEvent::Ended(token)));
        drop(scheduler);
        self.playing = Some(token);
        true
    }

    fn stop_lip_sync(&mut self) {
        if let Some(token) = self.playing.take() {
            self.scheduler
                .borrow_mut()
                .take_where(|due| matches!(due, Due::Engine(event) if event.token() == token));
            debug!(%token, "Stopped voice clip");
        }
    }
}

fn clip_number(file_name: &str) -> Option<usize> {
    RE_CLIP_NUMBER
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

fn clip_duration(path: &Path) -> Duration {
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return FALLBACK_CLIP_DURATION;
    }
    match hound::WavReader::open(path) {
        Ok(reader) => {
            let spec = reader.spec();
            if spec.sample_rate == 0 {
                return FALLBACK_CLIP_DURATION;
            }
            Duration::from_secs_f64(f64::from(reader.duration()) / f64::from(spec.sample_rate))
        }
        Err(err) => {
            warn!(path = %path.display(), "Failed to read WAV header: {err}");
            FALLBACK_CLIP_DURATION
        }
    }
}
