use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{
    sync::watch::{channel as watch_channel, Receiver, Sender},
    task::AbortHandle,
};

/// Single-assignment slot shared by every waiter of a group
pub(crate) type Slot<Value> = Option<Arc<Value>>;

/// One coalescing group
struct Entry<Value> {
    generation: u64,
    receiver: Receiver<Slot<Value>>,
    waiters: usize,
    handle: Option<AbortHandle>,
}

/// Outcome of [`Registry::join_or_create`]
pub(crate) struct Membership<Value> {
    pub generation: u64,
    pub receiver: Receiver<Slot<Value>>,
    /// Present only for the caller that created the group
    pub sender: Option<Sender<Slot<Value>>>,
}

#[cfg(test)]
impl<Value> Membership<Value> {
    pub fn is_leader(&self) -> bool {
        self.sender.is_some()
    }
}

struct Inner<Id, Value> {
    next_generation: u64,
    entries: HashMap<Id, Entry<Value>>,
}

/// Map of in-flight groups, every operation runs under one short-lived lock.
///
/// Groups are tagged with a generation so that a stale leader or waiter can
/// never touch a newer group that reused the same key.
pub(crate) struct Registry<Id, Value> {
    inner: Mutex<Inner<Id, Value>>,
}

impl<Id: Hash + Eq, Value> Registry<Id, Value> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<Id, Value>> {
        // Nothing inside the lock can leave the map half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the group for `id`, or create it if there is none
    pub fn join_or_create(&self, id: Id) -> Membership<Value> {
        let mut inner = self.lock();

        if let Some(entry) = inner.entries.get_mut(&id) {
            entry.waiters += 1;

            return Membership {
                generation: entry.generation,
                receiver: entry.receiver.clone(),
                sender: None,
            };
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;

        let (sender, receiver) = watch_channel(None);
        inner.entries.insert(
            id,
            Entry {
                generation,
                receiver: receiver.clone(),
                waiters: 1,
                handle: None,
            },
        );

        Membership {
            generation,
            receiver,
            sender: Some(sender),
        }
    }

    /// Record the handle of the task running on behalf of a group
    pub fn attach(&self, id: &Id, generation: u64, handle: AbortHandle) {
        let mut inner = self.lock();

        match inner.entries.get_mut(id) {
            Some(entry) if entry.generation == generation => entry.handle = Some(handle),
            // The task already finished and cleaned up after itself
            _ => {}
        }
    }

    /// Drop one waiter from a group.
    ///
    /// Returns the handle to abort when this was the last waiter and nothing
    /// has been published yet. The group is unlinked at the same time so any
    /// new caller starts a fresh one.
    pub fn release(&self, id: &Id, generation: u64) -> Option<AbortHandle> {
        let mut inner = self.lock();

        let entry = inner.entries.get_mut(id)?;
        if entry.generation != generation {
            return None;
        }

        entry.waiters -= 1;
        if entry.waiters > 0 || entry.receiver.borrow().is_some() {
            return None;
        }

        inner.entries.remove(id).and_then(|entry| entry.handle)
    }

    /// Unlink a group and publish its value in one step, so no caller can
    /// join a group that has already been settled.
    pub fn settle(
        &self,
        id: &Id,
        generation: u64,
        sender: &Sender<Slot<Value>>,
        value: Arc<Value>,
    ) {
        let mut inner = self.lock();
        Self::unlink(&mut inner, id, generation);
        sender.send_replace(Some(value));
    }

    /// Unlink a group without publishing anything
    pub fn remove(&self, id: &Id, generation: u64) -> bool {
        Self::unlink(&mut self.lock(), id, generation)
    }

    fn unlink(inner: &mut Inner<Id, Value>, id: &Id, generation: u64) -> bool {
        if inner
            .entries
            .get(id)
            .is_some_and(|entry| entry.generation == generation)
        {
            inner.entries.remove(id);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[cfg(test)]
    pub fn waiters(&self, id: &Id) -> Option<usize> {
        self.lock().entries.get(id).map(|entry| entry.waiters)
    }
}
