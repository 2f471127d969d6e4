//! Reader position and the progress derived from it.

use crate::content::Section;
use crate::error::NavigationMiss;
use crate::index::{DocumentIndex, Position};
use serde::Serialize;
use tracing::{debug, warn};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Progress {
    /// Zero-based global position.
    pub index: usize,
    pub total: usize,
    pub percent: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionChange {
    pub from: Position,
    pub to: Position,
}

impl PositionChange {
    pub fn is_same_section(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone)]
pub struct NavigationState {
    start: Position,
    current: Position,
}

impl NavigationState {
    pub fn new(start: Position) -> Self {
        Self {
            current: start.clone(),
            start,
        }
    }

    pub fn position(&self) -> &Position {
        &self.current
    }

    pub fn start(&self) -> &Position {
        &self.start
    }

    pub fn reset(&mut self) {
        self.current = self.start.clone();
    }

    pub fn current<'a>(&self, index: &'a DocumentIndex) -> Option<&'a Section> {
        index.section_at(&self.current.group_key, &self.current.section_id)
    }

    /// Set the position when the pair resolves; otherwise keep it unchanged.
    pub fn move_to(
        &mut self,
        index: &DocumentIndex,
        group_key: &str,
        section_id: &str,
    ) -> Result<PositionChange, NavigationMiss> {
        if index.section_at(group_key, section_id).is_none() {
            warn!(group_key, section_id, "Navigation target not found; ignoring");
            return Err(NavigationMiss::new(group_key, section_id));
        }
        let to = Position::new(group_key, section_id);
        let from = std::mem::replace(&mut self.current, to.clone());
        debug!(%from, %to, "Moved reader position");
        Ok(PositionChange { from, to })
    }

    /// Step by `delta` sections in global order, clamped to the document
    /// bounds. Returns `Ok(None)` when clamping lands on the current section.
    pub fn move_by_offset(
        &mut self,
        index: &DocumentIndex,
        delta: isize,
    ) -> Result<Option<PositionChange>, NavigationMiss> {
        let here = index
            .locate(&self.current.group_key, &self.current.section_id)
            .ok_or_else(|| {
                warn!(position = %self.current, "Current position is not in the index");
                NavigationMiss::new(&self.current.group_key, &self.current.section_id)
            })?;
        let last = index.total_count().saturating_sub(1);
        let target = here.saturating_add_signed(delta).min(last);
        if target == here {
            debug!(here, delta, "Offset move clamped to current section");
            return Ok(None);
        }
        let Some(position) = index.position_at(target) else {
            return Err(NavigationMiss::new(
                &self.current.group_key,
                &self.current.section_id,
            ));
        };
        self.move_to(index, &position.group_key, &position.section_id)
            .map(Some)
    }

    pub fn global_index(&self, index: &DocumentIndex) -> Option<usize> {
        index.locate(&self.current.group_key, &self.current.section_id)
    }

    pub fn is_first(&self, index: &DocumentIndex) -> bool {
        self.global_index(index) == Some(0)
    }

    pub fn is_last(&self, index: &DocumentIndex) -> bool {
        self.global_index(index) == Some(index.total_count().saturating_sub(1))
    }

    pub fn progress(&self, index: &DocumentIndex) -> Progress {
        let total = index.total_count();
        let position = index.global_index_of(&self.current.group_key, &self.current.section_id);
        let percent = if total == 0 {
            0.0
        } else {
            ((position + 1) as f64 / total as f64) * 100.0
        };
        Progress {
            index: position,
            total,
            percent: (percent * 10.0).round() / 10.0,
            label: format!("{} / {}", position + 1, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::two_group_index;

    fn at(group: &str, section: &str) -> NavigationState {
        NavigationState::new(Position::new(group, section))
    }

    #[test]
    fn next_from_second_section_crosses_into_next_group() {
        let index = two_group_index();
        let mut nav = at("A", "a2");

        let change = nav
            .move_by_offset(&index, 1)
            .expect("valid position")
            .expect("moved");

        assert_eq!(change.to, Position::new("B", "b1"));
        assert!(nav.is_last(&index));
        assert!(!nav.is_first(&index));
    }

    #[test]
    fn next_at_last_section_is_a_no_op() {
        let index = two_group_index();
        let mut nav = at("B", "b1");
        assert_eq!(nav.move_by_offset(&index, 1), Ok(None));
        assert_eq!(nav.position(), &Position::new("B", "b1"));
        assert!(nav.is_last(&index));
    }

    #[test]
    fn large_offsets_clamp_to_bounds() {
        let index = two_group_index();
        let mut nav = at("A", "a2");
        nav.move_by_offset(&index, 50).expect("valid");
        assert_eq!(nav.global_index(&index), Some(2));
        nav.move_by_offset(&index, -50).expect("valid");
        assert_eq!(nav.global_index(&index), Some(0));
        assert!(nav.is_first(&index));
    }

    #[test]
    fn miss_keeps_current_position() {
        let index = two_group_index();
        let mut nav = at("A", "a1");
        let err = nav.move_to(&index, "B", "nope").unwrap_err();
        assert_eq!(err, NavigationMiss::new("B", "nope"));
        assert_eq!(nav.position(), &Position::new("A", "a1"));
        assert_eq!(nav.current(&index).map(|s| s.id.as_str()), Some("a1"));
    }

    #[test]
    fn unresolvable_current_position_returns_none_without_fallback() {
        let index = two_group_index();
        let nav = at("Z", "z1");
        assert!(nav.current(&index).is_none());
        assert!(!nav.is_first(&index));
        assert!(!nav.is_last(&index));
    }

    #[test]
    fn progress_reports_one_based_label() {
        let index = two_group_index();
        let mut nav = at("A", "a1");
        nav.move_to(&index, "A", "a2").expect("exists");
        let progress = nav.progress(&index);
        assert_eq!(progress.index, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.label, "2 / 3");
        assert_eq!(progress.percent, 66.7);
    }

    #[test]
    fn reset_returns_to_start() {
        let index = two_group_index();
        let mut nav = at("A", "a1");
        nav.move_to(&index, "B", "b1").expect("exists");
        nav.reset();
        assert_eq!(nav.position(), nav.start());
    }
}
