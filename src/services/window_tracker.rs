use crate::models::WindowHandle;
use std::collections::{BTreeSet, HashSet};

/// WindowTracker correlates launched clients with windows without a process→window API.
///
/// Responsibilities (strict):
/// - Remember the *initial* windows that existed before any launch; they are never claimed.
/// - Remember every *claimed* window; a claimed window is never reported as new again.
/// - Do NOT know about accounts or timing; the orchestrator decides when to poll and who gets
///   the window.
#[derive(Debug, Default)]
pub struct WindowTracker {
    initial: HashSet<WindowHandle>,
    claimed: HashSet<WindowHandle>,
}

impl WindowTracker {
    pub fn new(initial: impl IntoIterator<Item = WindowHandle>) -> Self {
        Self {
            initial: initial.into_iter().collect(),
            claimed: HashSet::new(),
        }
    }

    pub fn initial_count(&self) -> usize {
        self.initial.len()
    }

    pub fn claimed(&self) -> &HashSet<WindowHandle> {
        &self.claimed
    }

    /// Забирает первое окно снимка, которого нет ни в initial, ни в claimed.
    pub fn claim_new(&mut self, snapshot: &BTreeSet<WindowHandle>) -> Option<WindowHandle> {
        let handle = snapshot
            .iter()
            .copied()
            .find(|h| !self.initial.contains(h) && !self.claimed.contains(h))?;

        self.claimed.insert(handle);
        Some(handle)
    }
}
