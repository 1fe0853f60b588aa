use crate::grid::GridSnapshot;

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Snapshot history of the grid for undo/redo.
///
/// The top of the undo stack is always the current state, so a history with a
/// single entry has nothing to undo. The stack holds at most `capacity`
/// snapshots; the oldest is dropped first.
#[derive(Debug, Clone)]
pub struct History {
    /// Stack of snapshots that can be returned to
    undo_stack: Vec<GridSnapshot>,
    /// Stack of snapshots that were undone
    redo_stack: Vec<GridSnapshot>,
    capacity: usize,
}

impl History {
    /// Creates a history whose only entry is `initial`.
    pub fn new(initial: GridSnapshot, capacity: usize) -> Self {
        Self {
            undo_stack: vec![initial],
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records a new current state. Clears the redo stack.
    pub fn push(&mut self, snapshot: GridSnapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.capacity {
            let excess = self.undo_stack.len() - self.capacity;
            self.undo_stack.drain(..excess);
            log::debug!("History full, dropped {} oldest snapshot(s)", excess);
        }
    }

    /// Steps back one state and returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&GridSnapshot> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        let current = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        self.undo_stack.last()
    }

    /// Steps forward one state and returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&GridSnapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(next);
        self.undo_stack.last()
    }

    /// Forgets everything and starts over from `initial`.
    pub fn reset(&mut self, initial: GridSnapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.undo_stack.push(initial);
    }

    pub fn current(&self) -> Option<&GridSnapshot> {
        self.undo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps available
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len().saturating_sub(1)
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerId;

    fn snapshot(tag: u8) -> GridSnapshot {
        GridSnapshot {
            width: 1,
            height: 1,
            layers: vec![(LayerId::new(), vec![tag, 0, 0, 255])],
        }
    }

    #[test]
    fn test_single_entry_cannot_undo() {
        let mut history = History::new(snapshot(0), 10);
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert!(history.current().is_some());
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn test_undo_redo() {
        let initial = snapshot(0);
        let mut history = History::new(initial.clone(), 10);
        let next = snapshot(1);
        history.push(next.clone());

        assert_eq!(history.undo().cloned().map(|s| s.layers[0].1.clone()), Some(initial.layers[0].1.clone()));
        assert_eq!(history.redo_depth(), 1);
        assert_eq!(history.redo().cloned().map(|s| s.layers[0].1.clone()), Some(next.layers[0].1.clone()));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new(snapshot(0), 10);
        history.push(snapshot(1));
        history.undo();
        history.push(snapshot(2));
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(snapshot(0), 3);
        for tag in 1..=5 {
            history.push(snapshot(tag));
        }
        assert_eq!(history.undo_depth(), 2);
        let tags: Vec<u8> = std::iter::from_fn(|| history.undo().map(|s| s.layers[0].1[0])).collect();
        assert_eq!(tags, vec![4, 3]);
    }
}
