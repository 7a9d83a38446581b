use std::{fmt::Debug, future::Future, hash::Hash, sync::Arc};

use tokio::{
    sync::watch::{Receiver, Sender},
    time::{sleep_until, Instant},
};

use crate::{
    registry::{Registry, Slot},
    CoalescionServiceConfig, Error,
};

/// Runs at most one instance of an operation per key at a time and hands its
/// result to every caller that asked for the same key while it was running.
///
/// Nothing is kept once a group settles: the next caller for the key starts a
/// new operation. Clones share the same registry.
pub struct CoalescionService<Id, Value> {
    config: Arc<CoalescionServiceConfig>,
    registry: Arc<Registry<Id, Value>>,
}

impl<Id, Value> Clone for CoalescionService<Id, Value> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<Id: Hash + Eq, Value> Debug for CoalescionService<Id, Value> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescionService")
            .field("config", &self.config)
            .field("in_flight", &self.registry.len())
            .finish()
    }
}

/// A caller's membership in a group, released when dropped.
///
/// Dropping happens both after a normal wake-up and when the caller's own
/// future is cancelled mid-wait.
struct Waiter<Id: Hash + Eq + Debug, Value> {
    registry: Arc<Registry<Id, Value>>,
    id: Id,
    generation: u64,
}

impl<Id: Hash + Eq + Debug, Value> Drop for Waiter<Id, Value> {
    fn drop(&mut self) {
        if let Some(handle) = self.registry.release(&self.id, self.generation) {
            tracing::info!("All waiters left {:?}, aborting shared task", self.id);
            handle.abort();
        }
    }
}

/// Unlinks the group if the shared task unwinds without settling it
struct Cleanup<Id: Hash + Eq, Value> {
    registry: Arc<Registry<Id, Value>>,
    id: Id,
    generation: u64,
}

impl<Id: Hash + Eq, Value> Drop for Cleanup<Id, Value> {
    fn drop(&mut self) {
        self.registry.remove(&self.id, self.generation);
    }
}

impl<Id, Value> CoalescionService<Id, Value>
where
    Id: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    Value: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CoalescionServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
        }
    }

    pub fn config(&self) -> &CoalescionServiceConfig {
        &self.config
    }

    async fn wait_for(&self, mut receiver: Receiver<Slot<Value>>) -> Result<Arc<Value>, Error> {
        let value = {
            let slot = receiver
                .wait_for(Option::is_some)
                .await
                .map_err(|_| Error::RecvError)?;

            slot.clone()
        };

        value.ok_or(Error::RecvError)
    }

    /// Body of the shared task, runs detached from every caller
    async fn lead<Fut: Future<Output = Value>>(
        self,
        id: Id,
        generation: u64,
        sender: Sender<Slot<Value>>,
        operation: Fut,
    ) {
        let _cleanup = Cleanup {
            registry: self.registry.clone(),
            id: id.clone(),
            generation,
        };

        let started = Instant::now();
        let value = operation.await;

        if !self.config.min_window.is_zero() {
            sleep_until(started + self.config.min_window).await;
        }

        tracing::debug!("Settling {id:?} after {:?}", started.elapsed());
        self.registry.settle(&id, generation, &sender, Arc::new(value));
    }

    /// Run `func` for `id`, or wait for the run already in progress for it.
    ///
    /// `func` is only invoked when this caller ends up leading; the future it
    /// returns is spawned onto the runtime so that no single caller's
    /// cancellation can tear it down while others are still waiting on it.
    pub async fn execute<F, Fut>(&self, id: Id, func: F) -> Result<Arc<Value>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let membership = self.registry.join_or_create(id.clone());
        let generation = membership.generation;

        let _waiter = Waiter {
            registry: self.registry.clone(),
            id: id.clone(),
            generation,
        };

        if let Some(sender) = membership.sender {
            tracing::debug!("Leading {id:?}");

            let task = tokio::spawn(self.clone().lead(id.clone(), generation, sender, func()));
            self.registry.attach(&id, generation, task.abort_handle());
        } else {
            tracing::debug!("Joining in-flight {id:?}");
        }

        self.wait_for(membership.receiver).await
    }

    /// Number of groups currently in flight
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight() == 0
    }
}

impl<Id, Value> Default for CoalescionService<Id, Value>
where
    Id: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    Value: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::from_config(CoalescionServiceConfig::default())
    }
}
