//! Persistence policy around page lifecycle events.
//!
//! The guard only decides; [`crate::page::ReaderPage::handle_lifecycle`]
//! carries the decision out against the progress store. Saved progress is
//! checkpointed on every hide yet cleared on every fresh load, so a reload
//! always starts from the beginning.

use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    FreshLoad,
    VisibilityHidden,
    VisibilityVisible,
    PageHide,
    BeforeUnload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum LifecycleOutcome {
    Ignored,
    Checkpointed,
    Cleared,
    /// Advisory only: the host may show `message` and let the reader cancel.
    PromptUnload { message: String },
    AllowUnload,
}

#[derive(Debug, Clone)]
pub struct LifecycleGuard {
    warning: String,
}

impl LifecycleGuard {
    pub fn new(warning: impl Into<String>) -> Self {
        Self {
            warning: warning.into(),
        }
    }

    pub fn decide(
        &self,
        event: LifecycleEvent,
        session_started: bool,
        has_saved: bool,
    ) -> LifecycleOutcome {
        let outcome = match event {
            LifecycleEvent::FreshLoad => LifecycleOutcome::Cleared,
            LifecycleEvent::VisibilityHidden | LifecycleEvent::PageHide => {
                if session_started {
                    LifecycleOutcome::Checkpointed
                } else {
                    LifecycleOutcome::Ignored
                }
            }
            LifecycleEvent::BeforeUnload => {
                if session_started && has_saved {
                    LifecycleOutcome::PromptUnload {
                        message: self.warning.clone(),
                    }
                } else {
                    LifecycleOutcome::AllowUnload
                }
            }
            LifecycleEvent::VisibilityVisible => LifecycleOutcome::Ignored,
        };
        debug!(?event, session_started, has_saved, ?outcome, "Lifecycle decision");
        outcome
    }
}
