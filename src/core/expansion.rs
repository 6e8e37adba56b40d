//! Expansion state of a network view.
//!
//! One set of expanded node ids per view. The view owns it and is the only
//! writer; everything that renders nodes gets `&ExpansionState` and asks.

use std::collections::HashSet;

/// Set of expanded node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    /// Whether `id` is currently expanded.
    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Number of expanded nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    /// True when nothing is expanded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    /// Flips `id` and returns whether it is expanded afterwards.
    pub(crate) fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub(crate) fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }
}
