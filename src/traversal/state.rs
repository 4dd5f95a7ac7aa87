//! Position and undo history of one traversal.

/// Where the operator is in the ordered image list.
///
/// `current_index` may equal the list length, meaning the set is exhausted.
/// The history is a LIFO of indices left by committing actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraversalState {
    current_index: usize,
    history: Vec<usize>,
}

impl TraversalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh state positioned at `index` with an empty history.
    pub fn starting_at(index: usize) -> Self {
        Self {
            current_index: index,
            history: Vec::new(),
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Records the current index on the history and moves to `next`.
    pub fn advance(&mut self, next: usize) {
        self.history.push(self.current_index);
        self.current_index = next;
    }

    /// Pops the last recorded index and moves back to it. Returns `None`,
    /// leaving the position unchanged, when the history is empty.
    pub fn undo(&mut self) -> Option<usize> {
        let previous = self.history.pop()?;
        self.current_index = previous;
        Some(previous)
    }
}
