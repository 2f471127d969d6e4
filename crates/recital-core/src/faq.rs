//! Canned FAQ answers and the chat transcript built from them.

use crate::content::FaqEntry;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqToggle {
    Opened,
    Closed,
}

#[derive(Debug, Clone)]
pub struct FaqBook {
    entries: Vec<FaqEntry>,
    open: BTreeSet<usize>,
}

impl FaqBook {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries,
            open: BTreeSet::new(),
        }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&FaqEntry> {
        self.entries.get(index)
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.contains(&index)
    }

    /// Flip one answer open or closed; answers toggle independently.
    /// Unknown indices return `None`.
    pub fn toggle(&mut self, index: usize) -> Option<FaqToggle> {
        if index >= self.entries.len() {
            debug!(index, "FAQ index out of range; ignoring");
            return None;
        }
        if self.open.remove(&index) {
            Some(FaqToggle::Closed)
        } else {
            self.open.insert(index);
            Some(FaqToggle::Opened)
        }
    }

    pub fn close_all(&mut self) {
        self.open.clear();
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChatRole {
    Reader,
    Guide,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTicket(u64);

#[derive(Debug, Clone)]
struct PendingReply {
    ticket: ChatTicket,
    answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    pending: Option<PendingReply>,
    next_ticket: u64,
}

impl ChatTranscript {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Post the reader's question and queue the guide's reply. A newer ask
    /// replaces any reply still waiting.
    pub fn ask(&mut self, index: usize, faq: &FaqBook) -> Option<ChatTicket> {
        let entry = faq.get(index)?;
        self.messages.push(ChatMessage {
            role: ChatRole::Reader,
            text: entry.question.clone(),
        });
        self.next_ticket += 1;
        let ticket = ChatTicket(self.next_ticket);
        if self.pending.is_some() {
            debug!("Superseding pending chat reply");
        }
        self.pending = Some(PendingReply {
            ticket,
            answer: entry.answer.clone(),
        });
        Some(ticket)
    }

    /// Append the queued reply if `ticket` is still the latest ask.
    pub fn take_reply(&mut self, ticket: ChatTicket) -> Option<String> {
        match self.pending.take() {
            Some(pending) if pending.ticket == ticket => {
                self.messages.push(ChatMessage {
                    role: ChatRole::Guide,
                    text: pending.answer.clone(),
                });
                Some(pending.answer)
            }
            other => {
                self.pending = other;
                debug!(?ticket, "Ignoring superseded chat reply");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending = None;
    }
}
