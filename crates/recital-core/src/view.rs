//! Serializable page state handed to the rendering surface.

use crate::faq::ChatMessage;
use crate::index::Position;
use crate::narration::{NarrationPath, NarrationStatus, VoiceSource};
use crate::navigation::Progress;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct NarrationView {
    pub status: NarrationStatus,
    pub rate: f32,
    pub min_rate: f32,
    pub max_rate: f32,
    pub continuous: bool,
    pub path: Option<NarrationPath>,
    pub voice: Option<VoiceSource>,
    /// `false` once the engine refused to speak; the play control is inert.
    pub engine_available: bool,
    pub active: bool,
    pub clip_count: usize,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SectionLink {
    pub section_id: String,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct GroupView {
    pub key: String,
    pub active: bool,
    pub sections: Vec<SectionLink>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct FaqItemView {
    pub question: String,
    pub answer: String,
    pub open: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PageView {
    pub position: Position,
    pub title: String,
    pub content: String,
    pub progress: Progress,
    pub can_prev: bool,
    pub can_next: bool,
    pub show_complete: bool,
    pub narration: NarrationView,
    pub session_started: bool,
    pub completion_visible: bool,
    #[ts(type = "number | null")]
    pub completed_at: Option<u64>,
    pub groups: Vec<GroupView>,
    pub faq: Vec<FaqItemView>,
    pub chat: Vec<ChatMessage>,
    pub chat_waiting: bool,
}
