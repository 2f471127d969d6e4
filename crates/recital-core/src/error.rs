//! Failure taxonomy for the reader core.
//!
//! None of these reach the rendering layer as panics: a `LoadError` turns the
//! page into a static error message, everything else is logged and degrades
//! to a no-op or an inert control.

use thiserror::Error;

/// Content could not be fetched or did not have the expected shape.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {resource}: {reason}")]
    Fetch {
        resource: &'static str,
        reason: String,
    },

    #[error("failed to parse {resource}")]
    Parse {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("document structure must be an object keyed by group")]
    NotAnObject,

    #[error("document group `{key}` is missing")]
    MissingGroup { key: String },

    #[error("document group `{key}` has malformed sections")]
    MalformedGroup {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document group `{key}` repeats section id `{id}`")]
    DuplicateSection { key: String, id: String },

    #[error("document structure contains no sections")]
    Empty,
}

/// The narration engine refused or is not reachable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("narration engine unavailable: {reason}")]
pub struct EngineUnavailable {
    pub reason: String,
}

impl EngineUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Persistent storage read/write failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read `{key}`: {reason}")]
    Read { key: String, reason: String },

    #[error("failed to write `{key}`: {reason}")]
    Write { key: String, reason: String },

    #[error("failed to remove `{key}`: {reason}")]
    Remove { key: String, reason: String },

    #[error("failed to encode value for `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A requested group/section pair does not exist in the loaded structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no section `{section_id}` in group `{group_key}`")]
pub struct NavigationMiss {
    pub group_key: String,
    pub section_id: String,
}

impl NavigationMiss {
    pub fn new(group_key: &str, section_id: &str) -> Self {
        Self {
            group_key: group_key.to_string(),
            section_id: section_id.to_string(),
        }
    }
}
