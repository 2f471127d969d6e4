//! Page controller.
//!
//! `ReaderPage` owns the index, navigation, narration, progress and FAQ state
//! as plain fields and is the only place they meet. Hosts feed it commands,
//! engine callbacks, timer firings and lifecycle events; every entry point
//! returns the new view plus the [`Effect`]s the host must carry out.

use crate::avatar::VoiceClipPlayer;
use crate::config::ReaderConfig;
use crate::content::LoadedContent;
use crate::error::LoadError;
use crate::faq::{ChatTicket, ChatTranscript, FaqBook, FaqToggle};
use crate::index::{DocumentIndex, Position};
use crate::lifecycle::{LifecycleEvent, LifecycleGuard, LifecycleOutcome};
use crate::narration::{
    AdvanceTicket, EngineEvent, NarrationController, NarrationOutcome, NarrationPath,
    NarrationStatus, SpeechEngine, VoiceSettings,
};
use crate::navigation::{NavigationState, PositionChange};
use crate::progress::{KeyValueStore, ProgressSnapshot, ProgressStore};
use crate::text_utils::narration_text;
use crate::view::{FaqItemView, GroupView, NarrationView, PageView, SectionLink};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommand {
    GetView,
    Next,
    Prev,
    GoTo {
        group_key: String,
        section_id: String,
    },
    TogglePlayPause,
    Play,
    Stop,
    SetRate {
        rate: f32,
    },
    SetContinuous {
        enabled: bool,
    },
    ToggleFaqAnswer {
        index: usize,
    },
    AskFaq {
        index: usize,
    },
    Complete,
    DismissCompletion,
    Restart,
}

impl PageCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetView => "contract_get_view",
            Self::Next => "contract_next",
            Self::Prev => "contract_prev",
            Self::GoTo { .. } => "contract_go_to",
            Self::TogglePlayPause => "contract_toggle_play_pause",
            Self::Play => "contract_play",
            Self::Stop => "contract_stop",
            Self::SetRate { .. } => "contract_set_rate",
            Self::SetContinuous { .. } => "contract_set_continuous",
            Self::ToggleFaqAnswer { .. } => "contract_toggle_faq_answer",
            Self::AskFaq { .. } => "contract_ask_faq",
            Self::Complete => "contract_complete",
            Self::DismissCompletion => "contract_dismiss_completion",
            Self::Restart => "contract_restart",
        }
    }
}

/// Fixed-delay callbacks the host schedules on the page's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    AutoAdvance(AdvanceTicket),
    ChatReply(ChatTicket),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ScheduleTimer { timer: Timer, delay: Duration },
    PositionChanged { from: Position, to: Position },
    NarrationChanged { status: NarrationStatus },
    ShowCompletion { completed_at: u64 },
}

#[derive(Debug, Clone)]
pub struct PageUpdate {
    pub action: &'static str,
    pub view: PageView,
    pub effects: Vec<Effect>,
}

pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

pub struct ReaderPage<E, S> {
    config: ReaderConfig,
    index: DocumentIndex,
    faq: FaqBook,
    chat: ChatTranscript,
    navigation: NavigationState,
    narration: NarrationController<E>,
    progress: ProgressStore<S>,
    guard: LifecycleGuard,
    continuous_play: bool,
    completion_visible: bool,
    clock: fn() -> u64,
}

impl<E: SpeechEngine, S: KeyValueStore> ReaderPage<E, S> {
    /// Build the page from loaded content and apply the fresh-load policy,
    /// which discards any stored progress.
    pub fn open(
        config: ReaderConfig,
        content: LoadedContent,
        engine: E,
        storage: S,
        avatar: Option<Box<dyn VoiceClipPlayer>>,
    ) -> Result<Self, LoadError> {
        let config = config.sanitized();
        let index = DocumentIndex::load(&content.structure, &config.group_order)?;
        let start = start_position(&config, &index)?;
        info!(
            start = %start,
            sections = index.total_count(),
            faq = content.faq.len(),
            "Opening contract reader"
        );

        let mut page = Self {
            narration: NarrationController::new(
                engine,
                avatar,
                VoiceSettings::from_config(&config),
            ),
            progress: ProgressStore::new(
                storage,
                config.storage_key.clone(),
                config.completion_key.clone(),
            ),
            guard: LifecycleGuard::new(config.unload_warning.clone()),
            navigation: NavigationState::new(start),
            faq: FaqBook::new(content.faq),
            chat: ChatTranscript::default(),
            continuous_play: config.continuous_play,
            completion_visible: false,
            clock: unix_millis,
            index,
            config,
        };
        page.handle_lifecycle(LifecycleEvent::FreshLoad);
        Ok(page)
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn position(&self) -> &Position {
        self.navigation.position()
    }

    pub fn narration(&self) -> &NarrationController<E> {
        &self.narration
    }

    pub fn engine_mut(&mut self) -> &mut E {
        self.narration.engine_mut()
    }

    pub fn progress(&self) -> &ProgressStore<S> {
        &self.progress
    }

    pub fn apply_command(&mut self, command: PageCommand) -> PageUpdate {
        let action = command.action();
        let before = self.narration.status();
        let mut effects = Vec::new();
        match command {
            PageCommand::GetView => {}
            PageCommand::Next => {
                self.navigate_by(1, &mut effects);
            }
            PageCommand::Prev => {
                self.navigate_by(-1, &mut effects);
            }
            PageCommand::GoTo {
                group_key,
                section_id,
            } => self.go_to(&group_key, &section_id, &mut effects),
            PageCommand::TogglePlayPause => self.toggle_play_pause(),
            PageCommand::Play => self.play(),
            PageCommand::Stop => {
                self.narration.stop();
                self.continuous_play = false;
            }
            PageCommand::SetRate { rate } => {
                self.narration.set_rate(rate);
            }
            PageCommand::SetContinuous { enabled } => {
                self.continuous_play = enabled;
                self.narration.set_continuous(enabled);
            }
            PageCommand::ToggleFaqAnswer { index } => self.toggle_faq_answer(index),
            PageCommand::AskFaq { index } => self.ask_faq(index, &mut effects),
            PageCommand::Complete => self.complete(&mut effects),
            PageCommand::DismissCompletion => self.completion_visible = false,
            PageCommand::Restart => self.restart(&mut effects),
        }
        self.finish(action, before, effects)
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) -> PageUpdate {
        let before = self.narration.status();
        let mut effects = Vec::new();
        if let NarrationOutcome::Finished {
            path: NarrationPath::Primary,
            continuous: true,
        } = self.narration.handle_event(event)
        {
            self.advance_after_end(&mut effects);
        }
        self.finish("contract_narration_event", before, effects)
    }

    pub fn handle_timer(&mut self, timer: Timer) -> PageUpdate {
        let before = self.narration.status();
        match timer {
            Timer::AutoAdvance(ticket) => {
                if self.narration.take_advance(ticket) {
                    let rate = self.narration.rate();
                    self.start_current(rate, true);
                }
            }
            Timer::ChatReply(ticket) => {
                if let Some(answer) = self.chat.take_reply(ticket) {
                    self.speak_answer(answer);
                }
            }
        }
        self.finish("contract_timer", before, Vec::new())
    }

    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) -> LifecycleOutcome {
        let outcome = self.guard.decide(
            event,
            self.progress.is_started(),
            self.progress.has_saved(),
        );
        match outcome {
            LifecycleOutcome::Checkpointed => {
                let snapshot = self.snapshot();
                self.progress.save(&snapshot);
            }
            LifecycleOutcome::Cleared => {
                let mut effects = Vec::new();
                self.restart(&mut effects);
            }
            LifecycleOutcome::Ignored
            | LifecycleOutcome::PromptUnload { .. }
            | LifecycleOutcome::AllowUnload => {}
        }
        outcome
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let position = self.navigation.position();
        let voice_cursor = if self.narration.path() == Some(NarrationPath::Primary) {
            self.navigation.global_index(&self.index)
        } else {
            None
        };
        ProgressSnapshot {
            current_group_key: position.group_key.clone(),
            current_section_id: position.section_id.clone(),
            voice_cursor,
            session_started: self.progress.is_started(),
            timestamp: (self.clock)(),
        }
    }

    pub fn view(&self) -> PageView {
        let position = self.navigation.position().clone();
        let (title, content) = self
            .navigation
            .current(&self.index)
            .map(|section| (section.title.clone(), section.content.clone()))
            .unwrap_or_default();
        let global = self.navigation.global_index(&self.index);
        let total = self.index.total_count();
        let is_last = matches!(global, Some(at) if at + 1 == total);

        let groups = self
            .index
            .groups()
            .iter()
            .map(|group| {
                let active = group.key == position.group_key;
                GroupView {
                    key: group.key.clone(),
                    active,
                    sections: group
                        .sections
                        .iter()
                        .map(|section| SectionLink {
                            section_id: section.id.clone(),
                            title: section.title.clone(),
                            active: active && section.id == position.section_id,
                        })
                        .collect(),
                }
            })
            .collect();

        let faq = self
            .faq
            .entries()
            .iter()
            .enumerate()
            .map(|(idx, entry)| FaqItemView {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                open: self.faq.is_open(idx),
            })
            .collect();

        PageView {
            progress: self.navigation.progress(&self.index),
            can_prev: matches!(global, Some(at) if at > 0),
            can_next: matches!(global, Some(at) if at + 1 < total),
            show_complete: is_last,
            narration: NarrationView {
                status: self.narration.status(),
                rate: self.narration.rate(),
                min_rate: self.config.min_rate,
                max_rate: self.config.max_rate,
                continuous: self.continuous_play,
                path: self.narration.path(),
                voice: self.narration.voice(),
                engine_available: self.narration.engine_available(),
                active: self.narration.is_active(),
                clip_count: self.narration.clip_count(),
            },
            session_started: self.progress.is_started(),
            completion_visible: self.completion_visible,
            completed_at: self
                .progress
                .completion()
                .map(|record| record.completed_at),
            groups,
            faq,
            chat: self.chat.messages().to_vec(),
            chat_waiting: self.chat.is_waiting(),
            position,
            title,
            content,
        }
    }

    fn finish(
        &self,
        action: &'static str,
        before: NarrationStatus,
        mut effects: Vec<Effect>,
    ) -> PageUpdate {
        let after = self.narration.status();
        if after != before {
            effects.push(Effect::NarrationChanged { status: after });
        }
        PageUpdate {
            action,
            view: self.view(),
            effects,
        }
    }

    fn navigate_by(&mut self, delta: isize, effects: &mut Vec<Effect>) -> bool {
        match self.navigation.move_by_offset(&self.index, delta) {
            Ok(Some(change)) => {
                self.after_move(change, effects);
                true
            }
            Ok(None) => false,
            Err(miss) => {
                warn!("Offset navigation failed: {miss}");
                false
            }
        }
    }

    fn go_to(&mut self, group_key: &str, section_id: &str, effects: &mut Vec<Effect>) {
        match self.navigation.move_to(&self.index, group_key, section_id) {
            Ok(change) => self.after_move(change, effects),
            Err(miss) => debug!("Section link ignored: {miss}"),
        }
    }

    fn after_move(&mut self, change: PositionChange, effects: &mut Vec<Effect>) {
        self.narration.stop();
        if !change.is_same_section() {
            effects.push(Effect::PositionChanged {
                from: change.from,
                to: change.to,
            });
        }
        self.checkpoint();
    }

    /// Continuous play reached the end of a section.
    fn advance_after_end(&mut self, effects: &mut Vec<Effect>) {
        if self.navigation.is_last(&self.index) {
            info!("Continuous play reached the last section");
            self.narration.stop();
            self.continuous_play = false;
            return;
        }
        if !self.navigate_by(1, effects) {
            return;
        }
        let ticket = self.narration.arm_advance();
        effects.push(Effect::ScheduleTimer {
            timer: Timer::AutoAdvance(ticket),
            delay: self.config.auto_advance_delay(),
        });
    }

    fn toggle_play_pause(&mut self) {
        if self.narration.is_active() {
            self.narration.toggle_pause();
        } else {
            self.play();
        }
    }

    fn play(&mut self) {
        let rate = self.narration.rate();
        if self.start_current(rate, self.continuous_play) {
            self.mark_started();
        }
    }

    fn start_current(&mut self, rate: f32, continuous: bool) -> bool {
        let Some(section) = self.navigation.current(&self.index) else {
            warn!(position = %self.navigation.position(), "No section to narrate");
            return false;
        };
        let text = narration_text(section, &self.config.title_separator);
        if is_blank(&text) {
            debug!(position = %self.navigation.position(), "Section has nothing to narrate");
            self.narration.stop();
            return false;
        }
        let clip_hint = self.navigation.global_index(&self.index).map(|at| at + 1);
        match self.narration.start(text, rate, continuous, clip_hint) {
            Ok(token) => {
                debug!(%token, "Narrating current section");
                true
            }
            Err(err) => {
                warn!("Play ignored: {err}");
                false
            }
        }
    }

    /// Answers interrupt the section narration and end continuous play.
    fn speak_answer(&mut self, answer: String) {
        self.continuous_play = false;
        if is_blank(&answer) {
            debug!("FAQ answer is blank; nothing to speak");
            self.narration.stop();
            return;
        }
        if let Err(err) = self.narration.speak_answer(answer) {
            warn!("FAQ answer not spoken: {err}");
        }
    }

    fn toggle_faq_answer(&mut self, index: usize) {
        match self.faq.toggle(index) {
            Some(FaqToggle::Opened) => {
                let Some(answer) = self.faq.get(index).map(|entry| entry.answer.clone()) else {
                    return;
                };
                self.speak_answer(answer);
                self.mark_started();
            }
            Some(FaqToggle::Closed) | None => {}
        }
    }

    fn ask_faq(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(ticket) = self.chat.ask(index, &self.faq) else {
            debug!(index, "Chat question out of range; ignoring");
            return;
        };
        self.mark_started();
        effects.push(Effect::ScheduleTimer {
            timer: Timer::ChatReply(ticket),
            delay: self.config.chat_reply_delay(),
        });
    }

    fn complete(&mut self, effects: &mut Vec<Effect>) {
        if !self.navigation.is_last(&self.index) {
            debug!(position = %self.navigation.position(), "Completion requested before last section");
            return;
        }
        self.narration.stop();
        self.continuous_play = false;
        let completed_at = (self.clock)();
        self.progress.record_completion(completed_at);
        self.completion_visible = true;
        effects.push(Effect::ShowCompletion { completed_at });
    }

    /// Discard stored progress and return every component to its initial
    /// configuration.
    fn restart(&mut self, effects: &mut Vec<Effect>) {
        self.narration.reset();
        self.progress.clear();
        self.faq.close_all();
        self.chat.clear();
        self.completion_visible = false;
        self.continuous_play = self.config.continuous_play;
        let from = self.navigation.position().clone();
        self.navigation.reset();
        let to = self.navigation.position().clone();
        if from != to {
            effects.push(Effect::PositionChanged { from, to });
        }
    }

    fn mark_started(&mut self) {
        if self.progress.is_started() {
            return;
        }
        let snapshot = self.snapshot();
        self.progress.mark_started(snapshot);
    }

    /// First navigation starts the session; later ones overwrite the
    /// snapshot.
    fn checkpoint(&mut self) {
        if self.progress.is_started() {
            let snapshot = self.snapshot();
            self.progress.save(&snapshot);
        } else {
            self.mark_started();
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|ch| ch.is_whitespace() || ch.is_ascii_punctuation() || ch == '。')
}

fn start_position(config: &ReaderConfig, index: &DocumentIndex) -> Result<Position, LoadError> {
    if let (Some(group), Some(section)) = (&config.start_group, &config.start_section) {
        if index.section_at(group, section).is_some() {
            return Ok(Position::new(group, section));
        }
        warn!(
            group = %group,
            section = %section,
            "Configured start section not found; using first section"
        );
    }
    index.first_position().ok_or(LoadError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FaqEntry;
    use crate::index::tests::order;
    use crate::progress::MemoryStore;
    use crate::testing::{ClipCall, RecordingClips, RecordingEngine};
    use serde_json::json;

    const NOW: u64 = 1_700_000_000_000;

    fn fixed_clock() -> u64 {
        NOW
    }

    fn content() -> LoadedContent {
        LoadedContent {
            structure: json!({
                "A": [
                    {"id": "a1", "title": "First", "content": "Alpha one."},
                    {"id": "a2", "title": "Second", "content": "Alpha two."}
                ],
                "B": [
                    {"id": "b1", "title": "Third", "content": "Beta one."}
                ]
            }),
            faq: vec![FaqEntry {
                question: "Can I cancel?".to_string(),
                answer: "Within eight days.".to_string(),
            }],
        }
    }

    fn config() -> ReaderConfig {
        ReaderConfig {
            group_order: order(&["A", "B"]),
            ..ReaderConfig::default()
        }
    }

    fn open_with(storage: MemoryStore) -> ReaderPage<RecordingEngine, MemoryStore> {
        ReaderPage::open(config(), content(), RecordingEngine::default(), storage, None)
            .expect("valid content")
            .with_clock(fixed_clock)
    }

    fn open() -> ReaderPage<RecordingEngine, MemoryStore> {
        open_with(MemoryStore::new())
    }

    fn stored_snapshot(page: &ReaderPage<RecordingEngine, MemoryStore>) -> Option<ProgressSnapshot> {
        page.progress().load()
    }

    fn start_event(page: &mut ReaderPage<RecordingEngine, MemoryStore>) -> PageUpdate {
        let token = page.narration().current_token().expect("live session");
        page.handle_engine_event(EngineEvent::Started(token))
    }

    fn end_event(page: &mut ReaderPage<RecordingEngine, MemoryStore>) -> PageUpdate {
        let token = page.narration().current_token().expect("live session");
        page.handle_engine_event(EngineEvent::Ended(token))
    }

    fn scheduled_advance(update: &PageUpdate) -> Option<Timer> {
        update.effects.iter().find_map(|effect| match effect {
            Effect::ScheduleTimer {
                timer: timer @ Timer::AutoAdvance(_),
                ..
            } => Some(*timer),
            _ => None,
        })
    }

    #[test]
    fn fresh_load_discards_stored_progress() {
        let mut storage = MemoryStore::new();
        let stored = ProgressSnapshot {
            current_group_key: "B".to_string(),
            current_section_id: "b1".to_string(),
            voice_cursor: Some(2),
            session_started: true,
            timestamp: 1,
        };
        storage
            .set(
                "contractProgress",
                &serde_json::to_string(&stored).expect("encodes"),
            )
            .expect("memory store");

        let page = open_with(storage);
        assert_eq!(page.position(), &Position::new("A", "a1"));
        assert_eq!(
            page.progress().storage().get("contractProgress").expect("readable"),
            None
        );
        assert!(!page.progress().is_started());
    }

    #[test]
    fn configured_start_section_is_used_when_present() {
        let config = ReaderConfig {
            start_group: Some("A".to_string()),
            start_section: Some("a2".to_string()),
            ..config()
        };
        let page = ReaderPage::open(
            config,
            content(),
            RecordingEngine::default(),
            MemoryStore::new(),
            None,
        )
        .expect("valid");
        assert_eq!(page.position(), &Position::new("A", "a2"));
    }

    #[test]
    fn missing_group_is_a_load_error() {
        let config = ReaderConfig {
            group_order: order(&["A", "C"]),
            ..config()
        };
        let result = ReaderPage::open(
            config,
            content(),
            RecordingEngine::default(),
            MemoryStore::new(),
            None,
        );
        assert!(matches!(result, Err(LoadError::MissingGroup { key }) if key == "C"));
    }

    #[test]
    fn next_moves_stops_narration_and_starts_session() {
        let mut page = open();
        page.apply_command(PageCommand::Play);
        start_event(&mut page);

        let update = page.apply_command(PageCommand::Next);
        assert_eq!(update.action, "contract_next");
        assert!(update.effects.contains(&Effect::PositionChanged {
            from: Position::new("A", "a1"),
            to: Position::new("A", "a2"),
        }));
        assert!(update.effects.contains(&Effect::NarrationChanged {
            status: NarrationStatus::Idle
        }));
        assert!(!page.narration().is_active());
        assert_eq!(update.view.progress.label, "2 / 3");
        assert!(update.view.can_prev);

        let stored = stored_snapshot(&page).expect("saved on navigation");
        assert_eq!(stored.current_section_id, "a2");
        assert!(stored.session_started);
    }

    #[test]
    fn complete_button_only_at_last_section() {
        let mut page = open();
        let update = page.apply_command(PageCommand::Complete);
        assert!(update.effects.is_empty());
        assert!(!update.view.completion_visible);
        assert!(!update.view.show_complete);

        page.apply_command(PageCommand::GoTo {
            group_key: "B".to_string(),
            section_id: "b1".to_string(),
        });
        let update = page.apply_command(PageCommand::Complete);
        assert!(update.view.show_complete);
        assert!(!update.view.can_next);
        assert!(update.view.completion_visible);
        assert_eq!(update.view.completed_at, Some(NOW));
        assert!(update.effects.contains(&Effect::ShowCompletion { completed_at: NOW }));

        let update = page.apply_command(PageCommand::DismissCompletion);
        assert!(!update.view.completion_visible);
    }

    #[test]
    fn next_at_last_section_changes_nothing() {
        let mut page = open();
        page.apply_command(PageCommand::GoTo {
            group_key: "B".to_string(),
            section_id: "b1".to_string(),
        });
        let saves = page.progress().save_count();
        let update = page.apply_command(PageCommand::Next);
        assert!(update.effects.is_empty());
        assert_eq!(page.position(), &Position::new("B", "b1"));
        assert_eq!(page.progress().save_count(), saves);
    }

    #[test]
    fn unknown_section_link_is_ignored() {
        let mut page = open();
        let update = page.apply_command(PageCommand::GoTo {
            group_key: "B".to_string(),
            section_id: "missing".to_string(),
        });
        assert!(update.effects.is_empty());
        assert_eq!(page.position(), &Position::new("A", "a1"));
        assert!(!page.progress().is_started());
    }

    #[test]
    fn continuous_end_advances_one_section_and_restarts_at_same_rate() {
        let mut page = open();
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::SetRate { rate: 1.25 });
        page.apply_command(PageCommand::Play);
        let update = start_event(&mut page);
        assert!(update.effects.contains(&Effect::NarrationChanged {
            status: NarrationStatus::Speaking
        }));

        let update = end_event(&mut page);
        assert_eq!(page.position(), &Position::new("A", "a2"));
        let timer = scheduled_advance(&update).expect("advance scheduled");
        assert!(update.effects.contains(&Effect::ScheduleTimer {
            timer,
            delay: Duration::from_millis(600),
        }));

        page.handle_timer(timer);
        let utterance = page.narration().engine().last_utterance().expect("spoken");
        assert_eq!(utterance.text, "Second。Alpha two.");
        assert_eq!(utterance.rate, 1.25);
        assert!(page.narration().is_continuous());
        assert_eq!(page.narration().path(), Some(NarrationPath::Primary));
    }

    #[test]
    fn rate_change_during_advance_delay_applies_to_next_section() {
        let mut page = open();
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::Play);
        start_event(&mut page);
        let update = end_event(&mut page);
        let timer = scheduled_advance(&update).expect("advance scheduled");

        let update = page.apply_command(PageCommand::SetRate { rate: 1.75 });
        assert_eq!(update.view.narration.rate, 1.75);
        assert!(page.narration().has_pending_advance());

        page.handle_timer(timer);
        let utterance = page.narration().engine().last_utterance().expect("spoken");
        assert_eq!(utterance.text, "Second。Alpha two.");
        assert_eq!(utterance.rate, 1.75);
    }

    #[test]
    fn stop_during_advance_delay_suppresses_restart() {
        let mut page = open();
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::Play);
        start_event(&mut page);
        let update = end_event(&mut page);
        let timer = scheduled_advance(&update).expect("advance scheduled");

        page.apply_command(PageCommand::Stop);
        page.handle_timer(timer);
        assert!(!page.narration().is_active());
        assert_eq!(page.narration().engine().spoken_texts().len(), 1);
    }

    #[test]
    fn continuous_play_stops_at_last_section() {
        let mut page = open();
        page.apply_command(PageCommand::GoTo {
            group_key: "B".to_string(),
            section_id: "b1".to_string(),
        });
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::Play);
        start_event(&mut page);

        let update = end_event(&mut page);
        assert!(scheduled_advance(&update).is_none());
        assert_eq!(page.position(), &Position::new("B", "b1"));
        assert!(!page.narration().is_continuous());
        assert!(!update.view.narration.continuous);
    }

    #[test]
    fn plain_end_does_not_advance() {
        let mut page = open();
        page.apply_command(PageCommand::Play);
        start_event(&mut page);
        let update = end_event(&mut page);
        assert!(scheduled_advance(&update).is_none());
        assert_eq!(page.position(), &Position::new("A", "a1"));
        assert_eq!(update.view.narration.status, NarrationStatus::Idle);
    }

    #[test]
    fn toggle_play_pause_starts_then_pauses() {
        let mut page = open();
        page.apply_command(PageCommand::TogglePlayPause);
        assert!(page.narration().is_active());
        assert_eq!(
            page.narration().engine().spoken_texts(),
            vec!["First。Alpha one."]
        );
        start_event(&mut page);

        let update = page.apply_command(PageCommand::TogglePlayPause);
        assert_eq!(update.view.narration.status, NarrationStatus::Paused);
        let update = page.apply_command(PageCommand::TogglePlayPause);
        assert_eq!(update.view.narration.status, NarrationStatus::Speaking);
    }

    #[test]
    fn play_marks_session_started_exactly_once() {
        let mut page = open();
        page.apply_command(PageCommand::Play);
        page.apply_command(PageCommand::Play);
        assert!(page.progress().is_started());
        assert_eq!(page.progress().save_count(), 1);
        let stored = stored_snapshot(&page).expect("saved");
        assert_eq!(stored.voice_cursor, Some(0));
        assert_eq!(stored.timestamp, NOW);
    }

    #[test]
    fn unavailable_engine_leaves_play_inert() {
        let mut page = ReaderPage::open(
            config(),
            content(),
            RecordingEngine::unavailable(),
            MemoryStore::new(),
            None,
        )
        .expect("valid");
        let update = page.apply_command(PageCommand::Play);
        assert!(!update.view.narration.engine_available);
        assert!(!update.view.narration.active);
        assert!(!page.progress().is_started());
    }

    #[test]
    fn opening_faq_answer_speaks_it_and_cancels_continuous_play() {
        let mut page = open();
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::Play);
        start_event(&mut page);

        let update = page.apply_command(PageCommand::ToggleFaqAnswer { index: 0 });
        assert!(update.view.faq[0].open);
        assert_eq!(update.view.narration.path, Some(NarrationPath::Answer));
        assert!(!page.narration().is_continuous());
        assert!(!update.view.narration.continuous);
        assert_eq!(page.position(), &Position::new("A", "a1"));

        let update = end_event(&mut page);
        assert!(scheduled_advance(&update).is_none());

        let update = page.apply_command(PageCommand::ToggleFaqAnswer { index: 0 });
        assert!(!update.view.faq[0].open);
        assert_eq!(page.narration().engine().spoken_texts().len(), 2);
    }

    #[test]
    fn chat_reply_ends_continuous_play_in_the_view() {
        let mut page = open();
        page.apply_command(PageCommand::SetContinuous { enabled: true });
        page.apply_command(PageCommand::Play);
        let update = page.apply_command(PageCommand::AskFaq { index: 0 });
        let timer = update
            .effects
            .iter()
            .find_map(|effect| match effect {
                Effect::ScheduleTimer { timer, .. } => Some(*timer),
                _ => None,
            })
            .expect("reply scheduled");

        let update = page.handle_timer(timer);
        assert!(!update.view.narration.continuous);
        page.apply_command(PageCommand::Play);
        assert!(!page.narration().is_continuous());
    }

    #[test]
    fn blank_answer_is_not_sent_to_the_engine() {
        let mut content = content();
        content.faq[0].answer = "  ".to_string();
        let mut page = ReaderPage::open(
            config(),
            content,
            RecordingEngine::default(),
            MemoryStore::new(),
            None,
        )
        .expect("valid");
        page.apply_command(PageCommand::Play);

        let update = page.apply_command(PageCommand::ToggleFaqAnswer { index: 0 });
        assert!(update.view.faq[0].open);
        assert!(update.view.narration.engine_available);
        assert!(!update.view.narration.active);
        assert_eq!(
            page.narration().engine().spoken_texts(),
            vec!["First。Alpha one."]
        );
    }

    #[test]
    fn chat_reply_is_spoken_after_delay() {
        let mut page = open();
        let update = page.apply_command(PageCommand::AskFaq { index: 0 });
        let timer = update
            .effects
            .iter()
            .find_map(|effect| match effect {
                Effect::ScheduleTimer {
                    timer: timer @ Timer::ChatReply(_),
                    delay,
                } => {
                    assert_eq!(*delay, Duration::from_millis(800));
                    Some(*timer)
                }
                _ => None,
            })
            .expect("reply scheduled");
        assert!(update.view.chat_waiting);
        assert_eq!(update.view.chat.len(), 1);

        let update = page.handle_timer(timer);
        assert_eq!(update.view.chat.len(), 2);
        assert_eq!(
            page.narration().engine().spoken_texts(),
            vec!["Within eight days."]
        );
    }

    #[test]
    fn hide_checkpoints_and_unload_prompts_after_session_start() {
        let mut page = open();
        assert_eq!(
            page.handle_lifecycle(LifecycleEvent::VisibilityHidden),
            LifecycleOutcome::Ignored
        );
        assert_eq!(
            page.handle_lifecycle(LifecycleEvent::BeforeUnload),
            LifecycleOutcome::AllowUnload
        );

        page.apply_command(PageCommand::Next);
        assert_eq!(
            page.handle_lifecycle(LifecycleEvent::PageHide),
            LifecycleOutcome::Checkpointed
        );
        assert_eq!(page.progress().save_count(), 2);
        assert!(matches!(
            page.handle_lifecycle(LifecycleEvent::BeforeUnload),
            LifecycleOutcome::PromptUnload { .. }
        ));
    }

    #[test]
    fn restart_returns_to_start_and_clears_progress() {
        let mut page = open();
        page.apply_command(PageCommand::Next);
        page.apply_command(PageCommand::Play);
        let update = page.apply_command(PageCommand::Restart);

        assert!(update.effects.contains(&Effect::PositionChanged {
            from: Position::new("A", "a2"),
            to: Position::new("A", "a1"),
        }));
        assert!(!page.narration().is_active());
        assert!(!update.view.session_started);
        assert_eq!(stored_snapshot(&page), None);
    }

    #[test]
    fn voice_clip_numbered_by_global_position() {
        let clips = RecordingClips::with_clips(&[1, 2, 3]);
        let log = clips.log();
        let mut page = ReaderPage::open(
            config(),
            content(),
            RecordingEngine::default(),
            MemoryStore::new(),
            Some(Box::new(clips)),
        )
        .expect("valid");
        page.apply_command(PageCommand::Next);
        let update = page.apply_command(PageCommand::Play);

        let token = page.narration().current_token().expect("live");
        assert_eq!(log.borrow().last(), Some(&ClipCall::Trigger(2, token)));
        assert_eq!(update.view.narration.clip_count, 3);
        assert!(page.narration().engine().spoken_texts().is_empty());
    }

    #[test]
    fn section_links_mark_the_active_section() {
        let mut page = open();
        let update = page.apply_command(PageCommand::GoTo {
            group_key: "A".to_string(),
            section_id: "a2".to_string(),
        });
        let active: Vec<_> = update
            .view
            .groups
            .iter()
            .flat_map(|group| group.sections.iter())
            .filter(|link| link.active)
            .map(|link| link.section_id.as_str())
            .collect();
        assert_eq!(active, vec!["a2"]);
        assert!(update.view.groups[0].active);
        assert!(!update.view.groups[1].active);
    }
}
