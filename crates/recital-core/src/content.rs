//! Content records supplied by the content provider.
//!
//! The provider exposes two documents at load time: the grouped contract
//! structure (`contract.json`, an object keyed by group) and a flat FAQ list
//! (`faq.json`). Both are parsed here; validation of the structure against
//! the configured group order happens in [`crate::index::DocumentIndex::load`].

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const STRUCTURE_RESOURCE: &str = "contract.json";
pub const FAQ_RESOURCE: &str = "faq.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    pub key: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Raw text of both provider documents, as fetched.
#[derive(Debug, Clone)]
pub struct RawContent {
    pub structure: String,
    pub faq: String,
}

/// Parsed provider documents, ready to build an index from.
#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub structure: serde_json::Value,
    pub faq: Vec<FaqEntry>,
}

impl RawContent {
    pub fn parse(&self) -> Result<LoadedContent, LoadError> {
        Ok(LoadedContent {
            structure: parse_structure(&self.structure)?,
            faq: parse_faq(&self.faq)?,
        })
    }
}

pub fn parse_structure(raw: &str) -> Result<serde_json::Value, LoadError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|source| LoadError::Parse {
            resource: STRUCTURE_RESOURCE,
            source,
        })?;
    if !value.is_object() {
        return Err(LoadError::NotAnObject);
    }
    Ok(value)
}

pub fn parse_faq(raw: &str) -> Result<Vec<FaqEntry>, LoadError> {
    serde_json::from_str(raw).map_err(|source| LoadError::Parse {
        resource: FAQ_RESOURCE,
        source,
    })
}
