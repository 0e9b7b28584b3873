//! Modify listeners registered by chart consumers on a sequence.

use std::sync::Arc;

use chartseq_doc::ListenerId;
use parking_lot::Mutex;

use crate::error::Result;

/// Identifies a sequence in notifications. Unique for the process lifetime.
pub type SequenceId = u64;

/// Sent to modify listeners when a sequence's cached values became stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifyEvent {
    pub source: SequenceId,
}

/// Receiver of [`ModifyEvent`]s.
///
/// An error returned by one listener is logged and does not stop delivery to the others.
pub trait ModifyListener: Send + Sync {
    fn modified(&self, event: &ModifyEvent) -> Result<()>;
}

impl<F> ModifyListener for F
where
    F: Fn(&ModifyEvent) -> Result<()> + Send + Sync,
{
    fn modified(&self, event: &ModifyEvent) -> Result<()> {
        self(event)
    }
}

#[derive(Default)]
struct Registered {
    next_id: ListenerId,
    entries: Vec<(ListenerId, Arc<dyn ModifyListener>)>,
}

#[derive(Default)]
pub(crate) struct ModifyListeners {
    inner: Mutex<Registered>,
}

impl ModifyListeners {
    pub(crate) fn add(&self, listener: Arc<dyn ModifyListener>) -> ListenerId {
        let mut reg = self.inner.lock();
        reg.next_id += 1;
        let id = reg.next_id;
        reg.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut reg = self.inner.lock();
        let before = reg.entries.len();
        reg.entries.retain(|(i, _)| *i != id);
        reg.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Deliver `event` to every listener registered at the time of the call.
    /// Returns the number of listeners that failed.
    pub(crate) fn broadcast(&self, event: &ModifyEvent) -> usize {
        let snapshot: Vec<_> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        let mut failed = 0;
        for listener in snapshot {
            if let Err(_err) = listener.modified(event) {
                failed += 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(sequence = event.source, error = %_err, "modify listener failed");
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChartError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn failing_listener_does_not_stop_delivery() {
        let listeners = ModifyListeners::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        listeners.add(Arc::new(|_: &ModifyEvent| -> Result<()> {
            Err(ChartError::Runtime("boom".into()))
        }));
        let id = listeners.add(Arc::new(move |_: &ModifyEvent| -> Result<()> {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        let event = ModifyEvent { source: 7 };
        assert_eq!(listeners.broadcast(&event), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.broadcast(&event);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.len(), 1);
    }
}
