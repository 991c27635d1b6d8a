//! Status observers and their registration table.
//!
//! Observers are registered as `Arc<dyn StatusListener>` and keyed by pointer
//! identity, so registering the same `Arc` twice keeps a single entry. A
//! fan-out works on a copy of the table taken when it starts, which lets
//! observers register or unregister others while being notified.

use std::sync::{Arc, Mutex};

use crate::error::{Result, SecurityError};
use crate::models::AlarmStatus;

// ── StatusListener ────────────────────────────────────────────────────────────

/// Receives push notifications from the security engine.
pub trait StatusListener: Send + Sync {
    /// The alarm status was written.
    fn on_alarm_status_changed(&self, status: AlarmStatus);

    /// A camera frame was processed.
    fn on_cat_detected(&self, cat_detected: bool);

    /// Something about the sensors or the arming status changed.
    fn on_sensor_status_changed(&self);
}

// ── ListenerRegistry ──────────────────────────────────────────────────────────

/// Identity-keyed set of observers.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn StatusListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. Returns `false` when it was already registered.
    pub fn add(&self, listener: Arc<dyn StatusListener>) -> Result<bool> {
        let mut listeners = self.lock()?;
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return Ok(false);
        }
        listeners.push(listener);
        Ok(true)
    }

    /// Unregister `listener`. Returns `false` when it was not registered.
    pub fn remove(&self, listener: &Arc<dyn StatusListener>) -> Result<bool> {
        let mut listeners = self.lock()?;
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        Ok(listeners.len() != before)
    }

    pub fn contains(&self, listener: &Arc<dyn StatusListener>) -> Result<bool> {
        Ok(self.lock()?.iter().any(|l| same_listener(l, listener)))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// Copy of the current registrations.
    pub fn snapshot(&self) -> Result<Vec<Arc<dyn StatusListener>>> {
        Ok(self.lock()?.clone())
    }

    pub fn notify_alarm_status(&self, status: AlarmStatus) -> Result<()> {
        for listener in self.snapshot()? {
            listener.on_alarm_status_changed(status);
        }
        Ok(())
    }

    pub fn notify_cat_detected(&self, cat_detected: bool) -> Result<()> {
        for listener in self.snapshot()? {
            listener.on_cat_detected(cat_detected);
        }
        Ok(())
    }

    pub fn notify_sensor_status_changed(&self) -> Result<()> {
        for listener in self.snapshot()? {
            listener.on_sensor_status_changed();
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Arc<dyn StatusListener>>>> {
        self.listeners
            .lock()
            .map_err(|_| SecurityError::LockPoisoned("listener registry"))
    }
}

/// Compare data pointers only; vtable pointers for the same object may differ
/// across codegen units.
fn same_listener(a: &Arc<dyn StatusListener>, b: &Arc<dyn StatusListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingListener {
        alarms: Mutex<Vec<AlarmStatus>>,
        cats: Mutex<Vec<bool>>,
        pings: AtomicUsize,
    }

    impl StatusListener for CountingListener {
        fn on_alarm_status_changed(&self, status: AlarmStatus) {
            self.alarms.lock().unwrap().push(status);
        }

        fn on_cat_detected(&self, cat_detected: bool) {
            self.cats.lock().unwrap().push(cat_detected);
        }

        fn on_sensor_status_changed(&self) {
            self.pings.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting() -> (Arc<CountingListener>, Arc<dyn StatusListener>) {
        let concrete = Arc::new(CountingListener::default());
        let erased: Arc<dyn StatusListener> = concrete.clone();
        (concrete, erased)
    }

    #[test]
    fn test_add_collapses_duplicates() {
        let registry = ListenerRegistry::new();
        let (_, listener) = counting();
        assert!(registry.add(listener.clone()).unwrap());
        assert!(!registry.add(listener.clone()).unwrap());
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_distinct_listeners_are_kept_apart() {
        let registry = ListenerRegistry::new();
        let (_, a) = counting();
        let (_, b) = counting();
        registry.add(a).unwrap();
        registry.add(b).unwrap();
        assert_eq!(registry.len().unwrap(), 2);
    }

    #[test]
    fn test_remove_unknown_returns_false() {
        let registry = ListenerRegistry::new();
        let (_, listener) = counting();
        assert!(!registry.remove(&listener).unwrap());
        assert!(registry.is_empty().unwrap());
    }

    #[test]
    fn test_notifications_reach_every_listener() {
        let registry = ListenerRegistry::new();
        let (first, first_dyn) = counting();
        let (second, second_dyn) = counting();
        registry.add(first_dyn).unwrap();
        registry.add(second_dyn).unwrap();

        registry.notify_alarm_status(AlarmStatus::PendingAlarm).unwrap();
        registry.notify_cat_detected(true).unwrap();
        registry.notify_sensor_status_changed().unwrap();

        for listener in [&first, &second] {
            assert_eq!(*listener.alarms.lock().unwrap(), vec![AlarmStatus::PendingAlarm]);
            assert_eq!(*listener.cats.lock().unwrap(), vec![true]);
            assert_eq!(listener.pings.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_removed_listener_keeps_past_but_misses_future() {
        let registry = ListenerRegistry::new();
        let (concrete, listener) = counting();
        registry.add(listener.clone()).unwrap();

        registry.notify_alarm_status(AlarmStatus::Alarm).unwrap();
        assert!(registry.remove(&listener).unwrap());
        registry.notify_alarm_status(AlarmStatus::NoAlarm).unwrap();

        assert_eq!(*concrete.alarms.lock().unwrap(), vec![AlarmStatus::Alarm]);
        assert!(!registry.contains(&listener).unwrap());
    }

    /// Registers a second listener the first time it is notified.
    struct RegisteringListener {
        registry: Arc<ListenerRegistry>,
        late: Arc<dyn StatusListener>,
    }

    impl StatusListener for RegisteringListener {
        fn on_alarm_status_changed(&self, _status: AlarmStatus) {
            self.registry.add(self.late.clone()).unwrap();
        }

        fn on_cat_detected(&self, _cat_detected: bool) {}

        fn on_sensor_status_changed(&self) {}
    }

    #[test]
    fn test_registration_during_fan_out_sees_subsequent_notifications() {
        let registry = Arc::new(ListenerRegistry::new());
        let (late, late_dyn) = counting();
        let registering: Arc<dyn StatusListener> = Arc::new(RegisteringListener {
            registry: registry.clone(),
            late: late_dyn,
        });
        registry.add(registering).unwrap();

        registry.notify_alarm_status(AlarmStatus::PendingAlarm).unwrap();
        registry.notify_alarm_status(AlarmStatus::Alarm).unwrap();

        let seen = late.alarms.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&AlarmStatus::Alarm));
        assert_eq!(registry.len().unwrap(), 2);
    }
}
