//! Listener registries with RAII subscription handles.
//!
//! A registry keeps its entries in registration order together with a per-entry key
//! (watched ranges, a file id, ...). Dispatch takes a snapshot of the matching callbacks
//! and releases the registry lock before invoking them, so callbacks may subscribe,
//! unsubscribe or read the document freely.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Identifier of one registration, unique within its registry.
pub type ListenerId = u64;

struct Entry<K, F: ?Sized> {
    id: ListenerId,
    key: K,
    callback: Arc<F>,
}

struct Registry<K, F: ?Sized> {
    next_id: ListenerId,
    entries: Vec<Entry<K, F>>,
}

trait RegistryHandle: Send + Sync {
    fn remove(&self, id: ListenerId) -> bool;
    fn contains(&self, id: ListenerId) -> bool;
}

impl<K, F> RegistryHandle for Mutex<Registry<K, F>>
where
    K: Send,
    F: ?Sized + Send + Sync,
{
    fn remove(&self, id: ListenerId) -> bool {
        let mut reg = self.lock();
        let before = reg.entries.len();
        reg.entries.retain(|e| e.id != id);
        reg.entries.len() != before
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.lock().entries.iter().any(|e| e.id == id)
    }
}

/// A keyed, ordered set of callbacks.
pub struct Listeners<K, F: ?Sized> {
    inner: Arc<Mutex<Registry<K, F>>>,
}

impl<K, F> Default for Listeners<K, F>
where
    F: ?Sized,
{
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }
}

impl<K, F> fmt::Debug for Listeners<K, F>
where
    F: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.inner.lock().entries.len())
            .finish()
    }
}

impl<K, F> Listeners<K, F>
where
    K: Send + 'static,
    F: ?Sized + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `key`. The callback stays registered until the returned
    /// handle is dropped or unsubscribed.
    pub fn subscribe(&self, key: K, callback: Arc<F>) -> Subscription {
        let id = {
            let mut reg = self.inner.lock();
            let id = reg.next_id;
            reg.next_id += 1;
            reg.entries.push(Entry { id, key, callback });
            id
        };
        let handle: Arc<dyn RegistryHandle> = self.inner.clone();
        Subscription {
            id,
            registry: Arc::downgrade(&handle),
        }
    }

    /// Replace the key of a live registration. Returns false if it is no longer registered.
    pub fn rekey(&self, id: ListenerId, key: K) -> bool {
        let mut reg = self.inner.lock();
        match reg.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.key = key;
                true
            }
            None => false,
        }
    }

    /// Callbacks whose key satisfies `pred`, in registration order.
    pub fn matching(&self, mut pred: impl FnMut(&K) -> bool) -> Vec<Arc<F>> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| pred(&e.key))
            .map(|e| e.callback.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a live registration. Dropping it unregisters the callback.
#[must_use = "dropping a Subscription unregisters its callback immediately"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<dyn RegistryHandle>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// True while the callback is still registered and its registry is alive.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|reg| reg.contains(self.id))
    }

    /// Unregister now. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            reg.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
