use std::{collections::VecDeque, fmt::Debug};

use log::{debug, warn};

/// A result that is ready to be retired back to `origin`, but whose release
/// may have to wait behind a deferred message
#[derive(Clone, Debug)]
pub struct RetirementTuple<O> {
    pub origin: O,
    pub response: Vec<u8>,
}

impl<O> RetirementTuple<O> {
    pub fn new(origin: O, response: Vec<u8>) -> Self {
        Self { origin, response }
    }
}

// One link in the deferral chain, with the tuples queued behind it
struct DeferralMarker<K, O> {
    blocker: K,
    resolved: bool,
    tuples: Vec<RetirementTuple<O>>,
}

/// Orders the release of retirement tuples relative to "blocking" messages.
///
/// While no deferral is outstanding, a tuple is released by the next call to
/// [`retireable_list_after_message_done`](Self::retireable_list_after_message_done).
/// Once [`defer_current_message`](Self::defer_current_message) has been
/// called, every tuple added afterwards is held until each blocker ahead of
/// it, in the order the blockers were deferred, has been marked done. Held
/// tuples are released in the order they were added.
///
/// Mutated only from a server's single dispatch thread.
pub struct RetirementManager<K, O> {
    chain: VecDeque<DeferralMarker<K, O>>,
    releasable: Vec<RetirementTuple<O>>,
}

impl<K: PartialEq + Debug, O> RetirementManager<K, O> {
    pub fn new() -> Self {
        Self {
            chain: VecDeque::new(),
            releasable: Vec::new(),
        }
    }

    /// The message currently being processed may not retire until `blocker`
    /// is done
    pub fn defer_current_message(&mut self, blocker: K) {
        debug!("Deferring retirement behind {:?}", blocker);
        self.chain.push_back(DeferralMarker {
            blocker,
            resolved: false,
            tuples: Vec::new(),
        });
    }

    pub fn add_retirement_tuple(&mut self, tuple: RetirementTuple<O>) {
        // the newest marker may already be resolved while an older one is
        // not; queueing behind it still keeps registration order
        match self.chain.back_mut() {
            Some(marker) => marker.tuples.push(tuple),
            None => self.releasable.push(tuple),
        }
    }

    /// Marks `done_message` finished and returns the tuples this releases.
    ///
    /// `None` (or a message nobody deferred on) resolves nothing and only
    /// hands back tuples that were already releasable.
    pub fn retireable_list_after_message_done(
        &mut self,
        done_message: Option<&K>,
    ) -> Vec<RetirementTuple<O>> {
        if let Some(done_message) = done_message {
            let mut found = false;
            for marker in self.chain.iter_mut() {
                if !marker.resolved && marker.blocker == *done_message {
                    marker.resolved = true;
                    found = true;
                }
            }
            if found {
                debug!("Blocker {:?} resolved", done_message);
            }
        }

        while let Some(marker) = self.chain.front() {
            if !marker.resolved {
                break;
            }
            let Some(marker) = self.chain.pop_front() else {
                break;
            };
            self.releasable.extend(marker.tuples);
        }

        std::mem::take(&mut self.releasable)
    }

    /// Resolves a blocker that is known to be a deferral target, warning when
    /// it is not
    pub fn resolve_blocker(&mut self, blocker: &K) -> Vec<RetirementTuple<O>> {
        if !self.chain.iter().any(|marker| marker.blocker == *blocker) {
            warn!("{:?} is not blocking any retirement", blocker);
        }
        self.retireable_list_after_message_done(Some(blocker))
    }

    /// Number of deferral markers not yet released
    pub fn outstanding_deferrals(&self) -> usize {
        self.chain.len()
    }

    /// Number of tuples held behind unresolved blockers
    pub fn held_tuple_count(&self) -> usize {
        self.chain.iter().map(|marker| marker.tuples.len()).sum()
    }
}

impl<K: PartialEq + Debug, O> Default for RetirementManager<K, O> {
    fn default() -> Self {
        Self::new()
    }
}
