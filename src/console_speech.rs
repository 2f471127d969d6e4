//! Speech engine that prints utterances and simulates their duration.
//!
//! `Started` is reported immediately and `Ended` after an estimate derived
//! from the text length and rate. Pausing freezes the remaining time.

use crate::scheduler::{Due, SharedScheduler};
use recital_core::error::EngineUnavailable;
use recital_core::narration::{EngineEvent, SessionToken, SpeechEngine, Utterance};
use std::time::{Duration, Instant};
use tracing::debug;

const BASE_CHARS_PER_SECOND: f64 = 8.0;
const MIN_UTTERANCE: Duration = Duration::from_millis(400);

pub struct ConsoleSpeech {
    scheduler: SharedScheduler,
    current: Option<SessionToken>,
    paused_remaining: Option<Duration>,
    chars_per_second: f64,
}

impl ConsoleSpeech {
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            scheduler,
            current: None,
            paused_remaining: None,
            chars_per_second: BASE_CHARS_PER_SECOND,
        }
    }

    #[cfg(test)]
    fn with_chars_per_second(mut self, chars_per_second: f64) -> Self {
        self.chars_per_second = chars_per_second;
        self
    }

    fn estimate(&self, utterance: &Utterance) -> Duration {
        let chars = utterance.text.chars().count() as f64;
        let rate = f64::from(utterance.rate).max(0.1);
        let secs = chars / (self.chars_per_second * rate);
        Duration::from_secs_f64(secs).max(MIN_UTTERANCE)
    }

    fn drop_events(&mut self, token: SessionToken) -> Vec<(Instant, Due)> {
        self.scheduler
            .borrow_mut()
            .take_where(|due| matches!(due, Due::Engine(event) if event.token() == token))
    }
}

impl SpeechEngine for ConsoleSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineUnavailable> {
        if utterance.text.trim().is_empty() {
            return Err(EngineUnavailable::new("nothing to speak"));
        }
        let duration = self.estimate(utterance);
        println!(
            "[speech {} x{:.1}] {}",
            utterance.lang, utterance.rate, utterance.text
        );
        debug!(
            token = %utterance.token,
            duration_ms = duration.as_millis() as u64,
            "Scheduled console utterance"
        );
        let mut scheduler = self.scheduler.borrow_mut();
        scheduler.schedule(Duration::ZERO, Due::Engine(EngineEvent::Started(utterance.token)));
        scheduler.schedule(duration, Due::Engine(EngineEvent::Ended(utterance.token)));
        drop(scheduler);
        self.current = Some(utterance.token);
        self.paused_remaining = None;
        Ok(())
    }

    fn pause(&mut self) {
        let Some(token) = self.current else {
            return;
        };
        if self.paused_remaining.is_some() {
            return;
        }
        let now = Instant::now();
        let remaining = self
            .drop_events(token)
            .into_iter()
            .find_map(|(at, due)| match due {
                Due::Engine(EngineEvent::Ended(_)) => Some(at.saturating_duration_since(now)),
                _ => None,
            })
            .unwrap_or(Duration::ZERO);
        self.paused_remaining = Some(remaining);
        println!("[speech paused]");
    }

    fn resume(&mut self) {
        let (Some(token), Some(remaining)) = (self.current, self.paused_remaining.take()) else {
            return;
        };
        self.scheduler
            .borrow_mut()
            .schedule(remaining, Due::Engine(EngineEvent::Ended(token)));
        println!("[speech resumed]");
    }

    fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            self.drop_events(token);
            debug!(%token, "Cancelled console utterance");
        }
        self.paused_remaining = None;
    }

    fn is_speaking(&self) -> bool {
        self.current.is_some()
    }
}
