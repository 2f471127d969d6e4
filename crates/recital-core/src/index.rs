//! Global ordering over grouped sections.
//!
//! Groups are concatenated in the configured order and sections keep their
//! order inside each group; a section's global position is its offset into
//! that concatenation.

use crate::content::{DocumentGroup, Section};
use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use ts_rs::TS;

/// A reader position expressed as group key and section id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Position {
    pub group_key: String,
    pub section_id: String,
}

impl Position {
    pub fn new(group_key: impl Into<String>, section_id: impl Into<String>) -> Self {
        Self {
            group_key: group_key.into(),
            section_id: section_id.into(),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group_key, self.section_id)
    }
}

#[derive(Debug, Clone)]
pub struct DocumentIndex {
    groups: Vec<DocumentGroup>,
    total: usize,
}

impl DocumentIndex {
    /// Build the index from the provider's structure object, keeping only the
    /// configured groups in the configured order.
    pub fn load(structure: &serde_json::Value, group_order: &[String]) -> Result<Self, LoadError> {
        let object = structure.as_object().ok_or(LoadError::NotAnObject)?;
        let mut groups = Vec::with_capacity(group_order.len());
        for key in group_order {
            let raw = object
                .get(key)
                .ok_or_else(|| LoadError::MissingGroup { key: key.clone() })?;
            let sections: Vec<Section> =
                serde_json::from_value(raw.clone()).map_err(|source| {
                    LoadError::MalformedGroup {
                        key: key.clone(),
                        source,
                    }
                })?;
            groups.push(DocumentGroup {
                key: key.clone(),
                sections,
            });
        }
        Self::from_groups(groups)
    }

    pub fn from_groups(groups: Vec<DocumentGroup>) -> Result<Self, LoadError> {
        for group in &groups {
            let mut seen = HashSet::with_capacity(group.sections.len());
            for section in &group.sections {
                if !seen.insert(section.id.as_str()) {
                    return Err(LoadError::DuplicateSection {
                        key: group.key.clone(),
                        id: section.id.clone(),
                    });
                }
            }
        }
        let total: usize = groups.iter().map(|group| group.sections.len()).sum();
        if total == 0 {
            return Err(LoadError::Empty);
        }
        info!(
            groups = groups.len(),
            sections = total,
            "Indexed document structure"
        );
        Ok(Self { groups, total })
    }

    pub fn groups(&self) -> &[DocumentGroup] {
        &self.groups
    }

    pub fn total_count(&self) -> usize {
        self.total
    }

    pub fn section_at(&self, group_key: &str, section_id: &str) -> Option<&Section> {
        self.group(group_key)?
            .sections
            .iter()
            .find(|section| section.id == section_id)
    }

    /// Global position of a section, or `None` when the pair is unknown.
    pub fn locate(&self, group_key: &str, section_id: &str) -> Option<usize> {
        let mut base = 0usize;
        for group in &self.groups {
            if group.key == group_key {
                let local = group
                    .sections
                    .iter()
                    .position(|section| section.id == section_id)?;
                return Some(base + local);
            }
            base += group.sections.len();
        }
        None
    }

    /// Global position of a section; unknown pairs map to 0.
    pub fn global_index_of(&self, group_key: &str, section_id: &str) -> usize {
        self.locate(group_key, section_id).unwrap_or_else(|| {
            debug!(group_key, section_id, "Unknown section; defaulting to index 0");
            0
        })
    }

    pub fn position_at(&self, global: usize) -> Option<Position> {
        let mut remaining = global;
        for group in &self.groups {
            let count = group.sections.len();
            if remaining < count {
                return Some(Position::new(&group.key, &group.sections[remaining].id));
            }
            remaining -= count;
        }
        None
    }

    pub fn section_at_global(&self, global: usize) -> Option<&Section> {
        let position = self.position_at(global)?;
        self.section_at(&position.group_key, &position.section_id)
    }

    pub fn first_position(&self) -> Option<Position> {
        self.position_at(0)
    }

    fn group(&self, group_key: &str) -> Option<&DocumentGroup> {
        self.groups.iter().find(|group| group.key == group_key)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn order(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    pub(crate) fn two_group_index() -> DocumentIndex {
        let structure = json!({
            "A": [
                {"id": "a1", "title": "First", "content": "Alpha one."},
                {"id": "a2", "title": "Second", "content": "Alpha two."}
            ],
            "B": [
                {"id": "b1", "title": "Third", "content": "Beta one."}
            ]
        });
        DocumentIndex::load(&structure, &order(&["A", "B"])).expect("valid structure")
    }

    #[test]
    fn global_indices_follow_group_then_section_order() {
        let index = two_group_index();
        assert_eq!(index.total_count(), 3);
        assert_eq!(index.global_index_of("A", "a1"), 0);
        assert_eq!(index.global_index_of("A", "a2"), 1);
        assert_eq!(index.global_index_of("B", "b1"), 2);
    }

    #[test]
    fn position_round_trips_for_every_section() {
        let index = two_group_index();
        let mut previous = None;
        for group in index.groups() {
            for section in &group.sections {
                let global = index.global_index_of(&group.key, &section.id);
                if let Some(previous) = previous {
                    assert!(global > previous);
                }
                previous = Some(global);
                assert_eq!(
                    index.position_at(global),
                    Some(Position::new(&group.key, &section.id))
                );
            }
        }
        assert_eq!(previous, Some(index.total_count() - 1));
        assert_eq!(index.position_at(index.total_count()), None);
    }

    #[test]
    fn unknown_section_defaults_to_zero_but_locate_reports_it() {
        let index = two_group_index();
        assert_eq!(index.global_index_of("B", "zz"), 0);
        assert_eq!(index.global_index_of("C", "a1"), 0);
        assert_eq!(index.locate("B", "zz"), None);
        assert_eq!(index.locate("A", "a1"), Some(0));
    }

    #[test]
    fn unordered_keys_are_ignored_and_order_comes_from_config() {
        let structure = json!({
            "B": [{"id": "b1", "title": "t", "content": "c"}],
            "A": [{"id": "a1", "title": "t", "content": "c"}],
            "extra": [{"id": "x", "title": "t", "content": "c"}]
        });
        let index = DocumentIndex::load(&structure, &order(&["A", "B"])).expect("valid");
        assert_eq!(index.total_count(), 2);
        assert_eq!(index.position_at(0), Some(Position::new("A", "a1")));
        assert_eq!(index.section_at("extra", "x"), None);
    }

    #[test]
    fn empty_groups_are_skipped_when_resolving_positions() {
        let structure = json!({
            "A": [],
            "B": [{"id": "b1", "title": "t", "content": "c"}]
        });
        let index = DocumentIndex::load(&structure, &order(&["A", "B"])).expect("valid");
        assert_eq!(index.first_position(), Some(Position::new("B", "b1")));
    }

    #[test]
    fn missing_group_fails_to_load() {
        let structure = json!({"A": []});
        let err = DocumentIndex::load(&structure, &order(&["A", "B"])).unwrap_err();
        assert!(matches!(err, LoadError::MissingGroup { key } if key == "B"));
    }

    #[test]
    fn malformed_sections_fail_to_load() {
        let structure = json!({"A": {"id": "a1"}});
        let err = DocumentIndex::load(&structure, &order(&["A"])).unwrap_err();
        assert!(matches!(err, LoadError::MalformedGroup { key, .. } if key == "A"));

        let structure = json!({"A": [{"id": "a1", "title": "missing content"}]});
        let err = DocumentIndex::load(&structure, &order(&["A"])).unwrap_err();
        assert!(matches!(err, LoadError::MalformedGroup { .. }));
    }

    #[test]
    fn duplicate_ids_and_empty_structures_are_rejected() {
        let structure = json!({"A": [
            {"id": "a1", "title": "t", "content": "c"},
            {"id": "a1", "title": "t", "content": "c"}
        ]});
        let err = DocumentIndex::load(&structure, &order(&["A"])).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateSection { id, .. } if id == "a1"));

        let structure = json!({"A": []});
        let err = DocumentIndex::load(&structure, &order(&["A"])).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }
}
