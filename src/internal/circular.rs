//! Circular dependency detection for graph walks.

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Services currently being resolved in one graph walk, outermost first.
///
/// The walk owns the stack, so detection is per resolution and needs no
/// thread-local state.
pub(crate) struct ResolutionStack {
    frames: Vec<Key>,
    max_depth: usize,
}

impl ResolutionStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Pushes `key`, failing if it is already on the stack or the walk is too deep.
    ///
    /// On a cycle the error carries the whole stack plus the repeated key,
    /// e.g. `["A", "B", "A"]`.
    pub(crate) fn enter(&mut self, key: &Key) -> DiResult<()> {
        // Circular detection BEFORE pushing the new key
        if self.frames.iter().any(|frame| frame == key) {
            let mut path: Vec<&'static str> = self.frames.iter().map(Key::display_name).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }

        if self.frames.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.frames.len()));
        }

        self.frames.push(key.clone());
        Ok(())
    }

    pub(crate) fn leave(&mut self, key: &Key) {
        let last = self.frames.pop();
        debug_assert_eq!(last.as_ref(), Some(key));
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }
}
