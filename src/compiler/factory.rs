use std::fmt;

use once_cell::sync::OnceCell;

use super::{Emitted, Slots};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::AnyArc;

/// Executable factory for one root service.
///
/// Self-contained: holds its slot table, its emitted initializer and
/// entry, and a listing of the program it came from. Invoking it needs
/// no registry access.
pub struct CompiledFactory {
    pub(crate) root: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) slots: Box<Slots>,
    pub(crate) initializer: Vec<Emitted>,
    pub(crate) initialized: OnceCell<()>,
    pub(crate) entry: Emitted,
    pub(crate) node_count: usize,
    pub(crate) listing: String,
}

impl CompiledFactory {
    /// Produces one instance of the root service.
    ///
    /// The first successful call runs the initializer, filling every
    /// singleton slot in dependency order. Shared slots already filled by
    /// another factory are left as they are. A failed initializer leaves
    /// unfilled slots empty and is retried on the next call.
    pub fn invoke(&self) -> DiResult<AnyArc> {
        let slots: &Slots = &self.slots;
        self.initialized.get_or_try_init(|| -> DiResult<()> {
            for step in &self.initializer {
                step(slots)?;
            }
            Ok(())
        })?;

        (self.entry)(slots)?.ok_or(DiError::NotFound(self.root.display_name()))
    }

    pub fn root(&self) -> &Key {
        &self.root
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Nodes in the construction plan this factory was compiled from.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether the initializer has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get().is_some()
    }

    /// Text rendering of the compiled program.
    pub fn listing(&self) -> &str {
        &self.listing
    }
}

impl fmt::Debug for CompiledFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFactory")
            .field("root", &self.root)
            .field("lifetime", &self.lifetime)
            .field("slots", &self.slots.len())
            .field("initializer", &self.initializer.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
