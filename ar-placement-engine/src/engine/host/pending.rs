use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use constants::session::MAX_ORPHANED_ACQUISITIONS;

use crate::error::HostError;

enum Slot<T> {
    Waiting,
    Resolved(Result<T, HostError>),
    Taken,
}

/// Consumer half of a one-shot host acquisition.
///
/// The engine polls it once per tick with [`Pending::try_take`]; the host
/// completes it through the matching [`Resolver`], possibly long after the
/// request was issued.
pub struct Pending<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

/// Producer half of a one-shot host acquisition.
pub struct Resolver<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

/// Create a linked resolver/pending pair.
pub fn pending_pair<T>() -> (Resolver<T>, Pending<T>) {
    let slot = Arc::new(Mutex::new(Slot::Waiting));
    (
        Resolver { slot: slot.clone() },
        Pending { slot },
    )
}

impl<T> Pending<T> {
    /// An acquisition that completed synchronously.
    pub fn ready(result: Result<T, HostError>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Resolved(result))),
        }
    }

    /// Take the result if the host has delivered it. Yields a value at most once.
    pub fn try_take(&self) -> Option<Result<T, HostError>> {
        let Ok(mut slot) = self.slot.lock() else {
            return None;
        };
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Resolved(result) => Some(result),
            other => {
                *slot = other;
                None
            }
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| matches!(*slot, Slot::Waiting))
            .unwrap_or(false)
    }
}

impl<T> Resolver<T> {
    /// Deliver the acquisition result. Later resolutions of the same pair are ignored.
    pub fn resolve(self, result: Result<T, HostError>) {
        if let Ok(mut slot) = self.slot.lock() {
            if matches!(*slot, Slot::Waiting) {
                *slot = Slot::Resolved(result);
            }
        }
    }
}

/// Acquisitions abandoned before they resolved.
///
/// Late grants are handed back through [`OrphanedAcquisitions::release`] so
/// the caller can free them. A host that never resolves would otherwise grow
/// the list with every abandoned request, so it keeps at most `capacity`
/// entries and forgets the oldest.
pub struct OrphanedAcquisitions<T> {
    waiting: VecDeque<Pending<T>>,
    capacity: usize,
}

impl<T> Default for OrphanedAcquisitions<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_ORPHANED_ACQUISITIONS)
    }
}

impl<T> OrphanedAcquisitions<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            waiting: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, pending: Pending<T>) {
        if self.waiting.len() >= self.capacity {
            self.waiting.pop_front();
            warn!(
                "Dropped an unresolved acquisition, {} still waiting on the host",
                self.capacity
            );
        }
        self.waiting.push_back(pending);
    }

    /// Hand every late grant to `release`. Failed and resolved entries leave the list.
    pub fn release(&mut self, mut release: impl FnMut(T)) {
        self.waiting.retain(|pending| match pending.try_take() {
            Some(Ok(value)) => {
                release(value);
                false
            }
            Some(Err(_)) => false,
            None => true,
        });
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
