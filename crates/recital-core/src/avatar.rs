//! Optional avatar collaborator that plays pre-recorded voice clips with lip
//! sync instead of synthesized speech.

use crate::narration::SessionToken;

/// Capability exposed by an avatar renderer.
///
/// Clips are numbered from 1. A player reports the clip's start and end
/// through the same [`crate::narration::EngineEvent`] stream as the speech
/// engine, tagged with the token passed to [`VoiceClipPlayer::trigger_voice`],
/// and never reports an end after [`VoiceClipPlayer::stop_lip_sync`].
pub trait VoiceClipPlayer {
    fn clip_count(&self) -> usize;

    fn has_clip(&self, index: usize) -> bool;

    /// Start playing clip `index`; returns `false` when the clip cannot be
    /// played.
    fn trigger_voice(&mut self, index: usize, token: SessionToken) -> bool;

    fn stop_lip_sync(&mut self);
}
