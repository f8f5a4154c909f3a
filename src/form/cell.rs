use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::trace;

use super::controller::{FormResult, read_lock, write_lock};

pub type Updater<S> = Box<dyn FnOnce(&S) -> FormResult<S> + Send>;
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Next value for a [`StateCell`]: either a replacement or a function of
/// the previous value. A failing updater leaves the cell untouched.
pub enum CellWrite<S> {
    Next(S),
    Update(Updater<S>),
}

impl<S> CellWrite<S> {
    pub fn update(f: impl FnOnce(&S) -> FormResult<S> + Send + 'static) -> Self {
        Self::Update(Box::new(f))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(pub u64);

/// Host-owned storage for form state.
///
/// A UI runtime implements this over whatever it re-renders from. Writes
/// notify every listener synchronously once the new value is in place.
pub trait StateCell<S>: Send + Sync {
    fn read(&self) -> FormResult<S>;
    fn write(&self, next: CellWrite<S>) -> FormResult<()>;
    fn subscribe(&self, listener: Listener<S>) -> FormResult<SubscriptionId>;
    fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool>;
}

/// In-process [`StateCell`] used when no host cell is supplied.
pub struct LocalCell<S> {
    value: RwLock<S>,
    listeners: RwLock<BTreeMap<SubscriptionId, Listener<S>>>,
    next_id: AtomicU64,
}

impl<S> LocalCell<S> {
    pub fn new(value: S) -> Self {
        Self {
            value: RwLock::new(value),
            listeners: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<S> StateCell<S> for LocalCell<S>
where
    S: Clone + Send + Sync,
{
    fn read(&self) -> FormResult<S> {
        Ok(read_lock(&self.value, "reading state cell")?.clone())
    }

    fn write(&self, next: CellWrite<S>) -> FormResult<()> {
        let current = {
            let mut value = write_lock(&self.value, "writing state cell")?;
            *value = match next {
                CellWrite::Next(next) => next,
                CellWrite::Update(update) => update(&*value)?,
            };
            value.clone()
        };

        let listeners = read_lock(&self.listeners, "reading state cell listeners")?
            .values()
            .cloned()
            .collect::<Vec<_>>();
        trace!(listeners = listeners.len(), "state cell written");
        for listener in listeners {
            listener(&current);
        }
        Ok(())
    }

    fn subscribe(&self, listener: Listener<S>) -> FormResult<SubscriptionId> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        write_lock(&self.listeners, "subscribing to state cell")?.insert(id, listener);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        Ok(write_lock(&self.listeners, "unsubscribing from state cell")?
            .remove(&id)
            .is_some())
    }
}
