//! Undo/redo history.
//!
//! A linear sequence of full shape-list snapshots with a cursor. Saving
//! after an undo prunes everything past the cursor, so redo is lost once a
//! new change is made. Capacity is bounded; the oldest snapshot is evicted
//! when it is exceeded.
//!
//! Invariant: `-1 <= index <= len - 1`, with `-1` meaning nothing saved yet.

use sg_core::{HistoryState, Shape};
use std::collections::VecDeque;

pub const DEFAULT_MAX_HISTORY: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    states: VecDeque<HistoryState>,
    index: isize,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            states: VecDeque::with_capacity(max_size.min(64)),
            index: -1,
            max_size: max_size.max(1),
        }
    }

    /// Snapshot `shapes` after the cursor, dropping any redo branch.
    pub fn save(&mut self, shapes: &[Shape]) {
        let keep = (self.index + 1) as usize;
        if self.states.len() > keep {
            log::debug!("history: pruned {} redo states", self.states.len() - keep);
            self.states.truncate(keep);
        }
        self.states.push_back(HistoryState::capture(shapes));
        if self.states.len() > self.max_size {
            self.states.pop_front();
        }
        self.index = self.states.len() as isize - 1;
    }

    /// Step back. Returns the shape list to restore, or `None` at the
    /// earliest snapshot.
    pub fn undo(&mut self) -> Option<Vec<Shape>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.states[self.index as usize].shapes.clone())
    }

    /// Step forward. Returns the shape list to restore, or `None` at the
    /// latest snapshot.
    pub fn redo(&mut self) -> Option<Vec<Shape>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.states[self.index as usize].shapes.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.states.len() as isize - 1
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.index = -1;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Cursor position; `-1` when empty.
    pub fn index(&self) -> isize {
        self.index
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn current(&self) -> Option<&HistoryState> {
        usize::try_from(self.index).ok().and_then(|i| self.states.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sg_core::{ShapeId, ShapeKind};

    fn shapes(n: usize) -> Vec<Shape> {
        (0..n)
            .map(|i| {
                Shape::with_id(
                    ShapeId::intern(&format!("h{i}")),
                    i as f64,
                    0.0,
                    ShapeKind::Circle { radius: 10.0 },
                )
            })
            .collect()
    }

    #[test]
    fn empty_history() {
        let h = History::default();
        assert_eq!(h.index(), -1);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn single_state_cannot_undo() {
        let mut h = History::default();
        h.save(&shapes(0));
        assert_eq!(h.index(), 0);
        assert!(!h.can_undo());
        assert_eq!(h.undo(), None);
    }

    #[test]
    fn undo_redo_walks_the_cursor() {
        let mut h = History::default();
        for n in 0..3 {
            h.save(&shapes(n));
        }
        assert_eq!(h.undo().map(|s| s.len()), Some(1));
        assert_eq!(h.undo().map(|s| s.len()), Some(0));
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo().map(|s| s.len()), Some(1));
        assert_eq!(h.redo().map(|s| s.len()), Some(2));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn save_after_undo_prunes_redo_branch() {
        let mut h = History::default();
        for n in 0..5 {
            h.save(&shapes(n));
        }
        h.undo();
        h.undo();
        assert_eq!(h.index(), 2);
        h.save(&shapes(9));
        assert_eq!(h.len(), 4);
        assert_eq!(h.index(), 3);
        assert!(!h.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = History::new(3);
        for n in 0..5 {
            h.save(&shapes(n));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert_eq!(h.current().map(|s| s.shapes.len()), Some(4));
        assert_eq!(h.undo().map(|s| s.len()), Some(3));
        assert_eq!(h.undo().map(|s| s.len()), Some(2));
        assert!(!h.can_undo());
    }
}
