//! Scripted collaborators shared by the unit tests.

use crate::avatar::VoiceClipPlayer;
use crate::error::EngineUnavailable;
use crate::narration::{SessionToken, SpeechEngine, Utterance};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineCall {
    Speak(Utterance),
    Pause,
    Resume,
    Cancel,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub(crate) calls: Vec<EngineCall>,
    speaking: bool,
    blocked: bool,
}

impl RecordingEngine {
    pub(crate) fn unavailable() -> Self {
        Self {
            blocked: true,
            ..Self::default()
        }
    }

    pub(crate) fn spoken_texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Speak(utterance) => Some(utterance.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_utterance(&self) -> Option<&Utterance> {
        self.calls.iter().rev().find_map(|call| match call {
            EngineCall::Speak(utterance) => Some(utterance),
            _ => None,
        })
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Cancel))
            .count()
    }
}

impl SpeechEngine for RecordingEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineUnavailable> {
        if self.blocked {
            return Err(EngineUnavailable::new("speech synthesis blocked"));
        }
        self.speaking = true;
        self.calls.push(EngineCall::Speak(utterance.clone()));
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.push(EngineCall::Resume);
    }

    fn cancel(&mut self) {
        self.speaking = false;
        self.calls.push(EngineCall::Cancel);
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ClipCall {
    Trigger(usize, SessionToken),
    StopLipSync,
}

pub(crate) struct RecordingClips {
    clips: BTreeSet<usize>,
    log: Rc<RefCell<Vec<ClipCall>>>,
}

impl RecordingClips {
    pub(crate) fn with_clips(indices: &[usize]) -> Self {
        Self {
            clips: indices.iter().copied().collect(),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub(crate) fn log(&self) -> Rc<RefCell<Vec<ClipCall>>> {
        Rc::clone(&self.log)
    }
}

impl VoiceClipPlayer for RecordingClips {
    fn clip_count(&self) -> usize {
        self.clips.len()
    }

    fn has_clip(&self, index: usize) -> bool {
        self.clips.contains(&index)
    }

    fn trigger_voice(&mut self, index: usize, token: SessionToken) -> bool {
        self.log.borrow_mut().push(ClipCall::Trigger(index, token));
        true
    }

    fn stop_lip_sync(&mut self) {
        self.log.borrow_mut().push(ClipCall::StopLipSync);
    }
}
