//! Transaction Lifecycle Notifications
//!
//! A session announces every transaction boundary on its [`LifecycleHub`].
//! Observers are called on every event, whatever caused it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Transaction boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    /// Transaction started (explicitly or implicitly)
    Start,
    /// Commit is about to happen
    PreCommit,
    /// Transaction committed
    Commit,
    /// Transaction aborted, for any reason
    Abort,
}

impl TransactionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionEvent::Start => "start",
            TransactionEvent::PreCommit => "pre_commit",
            TransactionEvent::Commit => "commit",
            TransactionEvent::Abort => "abort",
        }
    }
}

impl fmt::Display for TransactionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked on every transaction event
pub trait TransactionObserver: Send + Sync {
    fn on_event(&self, event: TransactionEvent);
}

/// Handle returned by [`LifecycleHub::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registry of transaction observers for one session
#[derive(Default)]
pub struct LifecycleHub {
    observers: RwLock<Vec<(ObserverId, Arc<dyn TransactionObserver>)>>,
    next_id: AtomicU64,
}

impl fmt::Debug for LifecycleHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHub")
            .field("observers", &self.len())
            .finish()
    }
}

impl LifecycleHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer
    pub fn register(&self, observer: Arc<dyn TransactionObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut observers) = self.observers.write() {
            observers.push((id, observer));
        }
        id
    }

    /// Detach an observer; returns false if it was not attached
    pub fn unregister(&self, id: ObserverId) -> bool {
        match self.observers.write() {
            Ok(mut observers) => {
                let before = observers.len();
                observers.retain(|(oid, _)| *oid != id);
                observers.len() != before
            }
            Err(_) => false,
        }
    }

    /// Deliver `event` to every observer, in registration order
    pub fn notify(&self, event: TransactionEvent) {
        // Observers run outside the lock so they may register or unregister
        let observers: Vec<Arc<dyn TransactionObserver>> = match self.observers.read() {
            Ok(observers) => observers.iter().map(|(_, o)| Arc::clone(o)).collect(),
            Err(_) => return,
        };
        for observer in observers {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<TransactionEvent>>,
    }

    impl TransactionObserver for Recorder {
        fn on_event(&self, event: TransactionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_notify_reaches_every_observer() {
        let hub = LifecycleHub::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        hub.register(a.clone());
        hub.register(b.clone());

        hub.notify(TransactionEvent::Start);
        hub.notify(TransactionEvent::Abort);

        assert_eq!(
            *a.events.lock().unwrap(),
            vec![TransactionEvent::Start, TransactionEvent::Abort]
        );
        assert_eq!(b.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unregister() {
        let hub = LifecycleHub::new();
        let recorder = Arc::new(Recorder::default());
        let id = hub.register(recorder.clone());

        assert!(hub.unregister(id));
        assert!(!hub.unregister(id));
        assert!(hub.is_empty());

        hub.notify(TransactionEvent::Commit);
        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
