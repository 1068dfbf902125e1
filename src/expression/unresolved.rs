//! Live cursor over placeholders that still need a value.

use super::Replacement;
use std::collections::{HashSet, VecDeque};
use tokio::sync::mpsc;

/// Iterator returned by [`super::ConfigurationExpression::unresolved`].
///
/// Yields the placeholders that were unresolved when the cursor was created,
/// then any placeholder uncovered while resolving earlier ones. Each literal
/// id is yielded at most once. Dropping the cursor unsubscribes it.
#[derive(Debug)]
pub struct Unresolved {
    pending: VecDeque<Replacement>,
    discovered: mpsc::UnboundedReceiver<Replacement>,
    yielded: HashSet<String>,
}

impl Unresolved {
    pub(crate) fn new(
        pending: VecDeque<Replacement>,
        discovered: mpsc::UnboundedReceiver<Replacement>,
    ) -> Self {
        Self {
            pending,
            discovered,
            yielded: HashSet::new(),
        }
    }

    fn next_candidate(&mut self) -> Option<Replacement> {
        self.pending
            .pop_front()
            .or_else(|| self.discovered.try_recv().ok())
    }
}

impl Iterator for Unresolved {
    type Item = Replacement;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(candidate) = self.next_candidate() {
            if self.yielded.insert(candidate.id().to_owned()) {
                return Some(candidate);
            }
        }
        None
    }
}
