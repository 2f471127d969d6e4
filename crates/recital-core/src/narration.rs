//! Narration lifecycle over a speech engine.
//!
//! At most one narration session is live at a time. Every start draws a new
//! [`SessionToken`] from a generation counter and the engine echoes that token
//! back in its [`EngineEvent`]s, so callbacks from a superseded session are
//! recognised and dropped instead of being attributed to the current one.
//! Auto-advance between sections is armed as an [`AdvanceTicket`] that any
//! later stop or start invalidates.

use crate::avatar::VoiceClipPlayer;
use crate::config::{RateRange, ReaderConfig};
use crate::error::EngineUnavailable;
use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

/// Speech synthesis capability.
///
/// Implementations report [`EngineEvent::Started`] and [`EngineEvent::Ended`]
/// for the utterance's token and must not report `Ended` once `cancel` has
/// been called for it.
pub trait SpeechEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineUnavailable>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
    fn is_speaking(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    /// Rebuild a token reported back by an out-of-process engine.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub token: SessionToken,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub lang: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Started(SessionToken),
    Ended(SessionToken),
}

impl EngineEvent {
    pub fn token(self) -> SessionToken {
        match self {
            Self::Started(token) | Self::Ended(token) => token,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NarrationStatus {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Which narration path owns the live session.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NarrationPath {
    /// Section narration, eligible for continuous play.
    Primary,
    /// One-shot FAQ/chat answer.
    Answer,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum VoiceSource {
    Engine,
    Clip { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum NarrationOutcome {
    /// The event belonged to a superseded or cancelled session.
    Stale,
    Started,
    Finished {
        path: NarrationPath,
        continuous: bool,
    },
}

#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub pitch: f32,
    pub lang: String,
    pub rates: RateRange,
    pub prefer_voice_clips: bool,
}

impl VoiceSettings {
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self {
            pitch: config.pitch,
            lang: config.lang.clone(),
            rates: config.rate_range(),
            prefer_voice_clips: config.prefer_voice_clips,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    token: SessionToken,
    text: String,
    path: NarrationPath,
    voice: VoiceSource,
    clip_hint: Option<usize>,
}

pub struct NarrationController<E> {
    engine: E,
    avatar: Option<Box<dyn VoiceClipPlayer>>,
    settings: VoiceSettings,
    status: NarrationStatus,
    rate: f32,
    continuous: bool,
    session: Option<ActiveSession>,
    generation: u64,
    pending_advance: Option<AdvanceTicket>,
    engine_available: bool,
}

impl<E: SpeechEngine> NarrationController<E> {
    pub fn new(
        engine: E,
        avatar: Option<Box<dyn VoiceClipPlayer>>,
        settings: VoiceSettings,
    ) -> Self {
        Self {
            engine,
            avatar,
            rate: settings.rates.default,
            settings,
            status: NarrationStatus::Idle,
            continuous: false,
            session: None,
            generation: 0,
            pending_advance: None,
            engine_available: true,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn status(&self) -> NarrationStatus {
        self.status
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn engine_available(&self) -> bool {
        self.engine_available
    }

    /// A session exists, whether or not the engine has reported its start.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn path(&self) -> Option<NarrationPath> {
        self.session.as_ref().map(|session| session.path)
    }

    pub fn voice(&self) -> Option<VoiceSource> {
        self.session.as_ref().map(|session| session.voice)
    }

    pub fn current_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|session| session.token)
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending_advance.is_some()
    }

    pub fn clip_count(&self) -> usize {
        self.avatar.as_ref().map_or(0, |avatar| avatar.clip_count())
    }

    /// Begin narrating `text`, cancelling whatever was live before.
    pub fn start(
        &mut self,
        text: String,
        rate: f32,
        continuous: bool,
        clip_hint: Option<usize>,
    ) -> Result<SessionToken, EngineUnavailable> {
        self.stop();
        self.rate = self.settings.rates.clamp(rate);
        self.launch(text, NarrationPath::Primary, clip_hint, continuous)
    }

    /// Speak a one-shot answer. Cancels primary narration and continuous
    /// play first; never auto-advances.
    pub fn speak_answer(&mut self, text: String) -> Result<SessionToken, EngineUnavailable> {
        self.stop();
        self.launch(text, NarrationPath::Answer, None, false)
    }

    pub fn toggle_pause(&mut self) -> NarrationStatus {
        match self.status {
            NarrationStatus::Speaking => {
                if matches!(self.voice(), Some(VoiceSource::Clip { .. })) {
                    debug!("Voice clips cannot be paused; ignoring");
                    return self.status;
                }
                self.engine.pause();
                self.status = NarrationStatus::Paused;
                info!("Paused narration");
            }
            NarrationStatus::Paused => {
                self.engine.resume();
                self.status = NarrationStatus::Speaking;
                info!("Resumed narration");
            }
            NarrationStatus::Idle => debug!("Pause toggled while idle; ignoring"),
        }
        self.status
    }

    /// Cancel playback and return to idle. Safe to call in any state.
    pub fn stop(&mut self) {
        self.engine.cancel();
        if let Some(session) = self.session.take() {
            if matches!(session.voice, VoiceSource::Clip { .. }) {
                if let Some(avatar) = self.avatar.as_mut() {
                    avatar.stop_lip_sync();
                }
            }
            debug!(token = %session.token, "Stopped narration session");
        }
        self.status = NarrationStatus::Idle;
        self.continuous = false;
        self.pending_advance = None;
    }

    /// Switch continuous play for the live primary session. Turning it off
    /// also drops an armed advance.
    pub fn set_continuous(&mut self, continuous: bool) {
        if !continuous {
            self.continuous = false;
            self.pending_advance = None;
            return;
        }
        if self.path() == Some(NarrationPath::Primary) {
            self.continuous = true;
        }
    }

    /// Store a new rate; an engine session that is speaking restarts its text
    /// at that rate and keeps its continuous flag. Returns whether a restart
    /// happened.
    pub fn set_rate(&mut self, rate: f32) -> bool {
        self.rate = self.settings.rates.clamp(rate);
        let Some(session) = self.session.clone() else {
            debug!(rate = self.rate, "Stored narration rate for next start");
            return false;
        };
        if self.status != NarrationStatus::Speaking {
            debug!(
                rate = self.rate,
                status = ?self.status,
                "Stored narration rate for next start"
            );
            return false;
        }
        if matches!(session.voice, VoiceSource::Clip { .. }) {
            debug!(rate = self.rate, "Voice clip playback ignores rate");
            return false;
        }
        let continuous = self.continuous;
        info!(rate = self.rate, continuous, "Restarting narration at new rate");
        self.stop();
        self.launch(session.text, session.path, session.clip_hint, continuous)
            .is_ok()
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> NarrationOutcome {
        let Some(session) = self.session.as_ref() else {
            debug!(token = %event.token(), "Ignoring engine event with no live session");
            return NarrationOutcome::Stale;
        };
        if session.token != event.token() {
            debug!(
                token = %event.token(),
                current = %session.token,
                "Ignoring stale engine event"
            );
            return NarrationOutcome::Stale;
        }
        match event {
            EngineEvent::Started(_) => {
                if self.status == NarrationStatus::Idle {
                    self.status = NarrationStatus::Speaking;
                }
                NarrationOutcome::Started
            }
            EngineEvent::Ended(token) => {
                let path = session.path;
                self.session = None;
                self.status = NarrationStatus::Idle;
                let continuous = self.continuous && path == NarrationPath::Primary;
                if !continuous {
                    self.continuous = false;
                }
                info!(%token, ?path, continuous, "Narration finished");
                NarrationOutcome::Finished { path, continuous }
            }
        }
    }

    /// Record that the next section should start after a delay.
    pub fn arm_advance(&mut self) -> AdvanceTicket {
        self.generation += 1;
        let ticket = AdvanceTicket(self.generation);
        self.pending_advance = Some(ticket);
        self.continuous = true;
        ticket
    }

    /// Claim an armed advance. False when the ticket was invalidated by a
    /// stop or start in the meantime. The chained start uses the current
    /// stored rate.
    pub fn take_advance(&mut self, ticket: AdvanceTicket) -> bool {
        if self.pending_advance == Some(ticket) {
            self.pending_advance = None;
            return true;
        }
        debug!(?ticket, "Ignoring cancelled auto-advance");
        false
    }

    /// Stop and restore the configured rate.
    pub fn reset(&mut self) {
        self.stop();
        self.rate = self.settings.rates.default;
    }

    fn next_token(&mut self) -> SessionToken {
        self.generation += 1;
        SessionToken(self.generation)
    }

    fn launch(
        &mut self,
        text: String,
        path: NarrationPath,
        clip_hint: Option<usize>,
        continuous: bool,
    ) -> Result<SessionToken, EngineUnavailable> {
        let token = self.next_token();
        let voice = match self.try_clip(path, clip_hint, token) {
            Some(voice) => voice,
            None => {
                let utterance = Utterance {
                    token,
                    text: text.clone(),
                    rate: self.rate,
                    pitch: self.settings.pitch,
                    lang: self.settings.lang.clone(),
                };
                if let Err(err) = self.engine.speak(&utterance) {
                    warn!("Narration engine refused utterance: {err}");
                    self.engine_available = false;
                    self.continuous = false;
                    return Err(err);
                }
                self.engine_available = true;
                VoiceSource::Engine
            }
        };
        info!(
            %token,
            ?path,
            ?voice,
            rate = self.rate,
            continuous,
            "Started narration session"
        );
        self.continuous = continuous;
        self.session = Some(ActiveSession {
            token,
            text,
            path,
            voice,
            clip_hint,
        });
        Ok(token)
    }

    fn try_clip(
        &mut self,
        path: NarrationPath,
        clip_hint: Option<usize>,
        token: SessionToken,
    ) -> Option<VoiceSource> {
        if path != NarrationPath::Primary || !self.settings.prefer_voice_clips {
            return None;
        }
        let index = clip_hint?;
        let avatar = self.avatar.as_mut()?;
        if avatar.clip_count() == 0 || !avatar.has_clip(index) {
            return None;
        }
        if avatar.trigger_voice(index, token) {
            Some(VoiceSource::Clip { index })
        } else {
            warn!(index, "Voice clip failed to start; falling back to engine");
            None
        }
    }
}
