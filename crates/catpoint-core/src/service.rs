//! The alarm decision engine.
//!
//! [`SecurityService`] mediates every change to the arming status, sensor
//! activation and alarm status. Each command runs read, decide, persist and
//! notify under one lock, so concurrent callers always decide against a
//! consistent view of the store.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::classifier::{CameraImage, ImageClassifier};
use crate::error::{Result, SecurityError};
use crate::listeners::{ListenerRegistry, StatusListener};
use crate::models::{AlarmStatus, ArmingStatus, Sensor};
use crate::repository::SecurityRepository;
use crate::rules::{self, ArmingPlan, SensorDecision};

/// State guarded by the engine lock.
struct EngineState<R> {
    repository: R,
    /// Result of the last processed camera frame.
    cat_detected: bool,
}

/// Security controller combining a store, a cat classifier and observers.
///
/// # Example
///
/// ```
/// use catpoint_core::classifier::CameraImage;
/// use catpoint_core::error::Result;
/// use catpoint_core::models::{AlarmStatus, ArmingStatus, Sensor, SensorType};
/// use catpoint_core::repository::InMemoryRepository;
/// use catpoint_core::service::SecurityService;
///
/// let service = SecurityService::new(InMemoryRepository::new(), |_: &CameraImage| -> Result<bool> {
///     Ok(false)
/// });
/// let mut door = Sensor::new("Front Door", SensorType::Door);
/// service.add_sensor(door.clone()).unwrap();
///
/// service.set_arming_status(ArmingStatus::ArmedAway).unwrap();
/// service.change_sensor_activation_status(&mut door, true).unwrap();
/// assert_eq!(service.alarm_status().unwrap(), AlarmStatus::PendingAlarm);
/// ```
pub struct SecurityService<R, C> {
    state: Mutex<EngineState<R>>,
    classifier: C,
    listeners: ListenerRegistry,
}

impl<R, C> SecurityService<R, C>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    pub fn new(repository: R, classifier: C) -> Self {
        Self {
            state: Mutex::new(EngineState {
                repository,
                cat_detected: false,
            }),
            classifier,
            listeners: ListenerRegistry::new(),
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Change the arming status.
    ///
    /// Disarming clears the alarm. Arming in either mode deactivates every
    /// stored sensor first, and arming at home while a cat is in view raises
    /// the alarm immediately. Observers hear about the change only once every
    /// write has succeeded; a failed write rolls the earlier ones back.
    pub fn set_arming_status(&self, status: ArmingStatus) -> Result<()> {
        let mut state = self.lock()?;
        let plan = rules::on_arming_change(status, state.cat_detected);
        let previous_alarm = state.repository.alarm_status()?;
        let previous_sensors = state.repository.sensors()?;

        if let Err(err) = persist_arming(&mut state.repository, status, &plan, &previous_sensors) {
            tracing::warn!(error = %err, arming = status.as_str(), "arming change failed; rolling back");
            let sensors: &[Sensor] = if plan.reset_sensors {
                &previous_sensors
            } else {
                &[]
            };
            restore(
                &mut state.repository,
                plan.alarm.map(|_| previous_alarm),
                sensors,
            );
            return Err(err);
        }
        tracing::info!(arming = status.as_str(), "arming status changed");

        if let Some(alarm) = plan.alarm {
            self.announce_alarm_status(alarm)?;
        }
        self.listeners.notify_sensor_status_changed()
    }

    /// Classify a camera frame and update the alarm accordingly.
    ///
    /// `None` means no frame is available; it counts as "no cat" for
    /// observers but leaves the alarm untouched, and the classifier is not
    /// called. Returns the detection result.
    pub fn process_image(&self, image: Option<&CameraImage>) -> Result<bool> {
        let Some(image) = image else {
            let mut state = self.lock()?;
            state.cat_detected = false;
            tracing::debug!("no camera frame; reporting no cat");
            self.listeners.notify_cat_detected(false)?;
            return Ok(false);
        };

        let cat_present = self.classifier.image_contains_cat(image)?;

        let mut state = self.lock()?;
        let arming = state.repository.arming_status()?;
        let sensors_active = any_active(&state.repository.sensors()?);
        let alarm = rules::on_image(cat_present, arming, sensors_active);
        if let Some(alarm) = alarm {
            state.repository.set_alarm_status(alarm)?;
        }
        state.cat_detected = cat_present;
        tracing::debug!(cat_present, "camera frame processed");

        if let Some(alarm) = alarm {
            self.announce_alarm_status(alarm)?;
        }
        self.listeners.notify_cat_detected(cat_present)?;
        Ok(cat_present)
    }

    /// Activate or deactivate `sensor`, updating the alarm if necessary.
    ///
    /// While the alarm is ringing the request is dropped: nothing is
    /// persisted, `sensor` is left as it was and no observer is notified.
    /// Otherwise the update is persisted (upsert) and `sensor.active` is set.
    /// If the alarm write fails the sensor update is undone.
    pub fn change_sensor_activation_status(&self, sensor: &mut Sensor, active: bool) -> Result<()> {
        let mut state = self.lock()?;
        let alarm = state.repository.alarm_status()?;
        let arming = state.repository.arming_status()?;
        let stored = state.repository.sensors()?;

        let previous = stored.iter().find(|s| s.same_identity(sensor)).cloned();
        let was_active = previous.as_ref().map_or(sensor.active, |s| s.active);
        let any_active_after =
            active || stored.iter().any(|s| s.active && !s.same_identity(sensor));

        match rules::on_sensor_change(arming, alarm, was_active, active, any_active_after) {
            SensorDecision::Ignore => {
                tracing::debug!(sensor = %sensor.name, active, "alarm active; sensor change ignored");
                Ok(())
            }
            SensorDecision::Persist { alarm: next } => {
                let updated = sensor.clone().with_active(active);
                state.repository.update_sensor(&updated)?;

                if let Some(next) = next {
                    if let Err(err) = state.repository.set_alarm_status(next) {
                        tracing::warn!(error = %err, sensor = %sensor.name, "alarm write failed; rolling back");
                        match &previous {
                            Some(previous) => restore(
                                &mut state.repository,
                                None,
                                std::slice::from_ref(previous),
                            ),
                            None => {
                                if let Err(e) = state.repository.remove_sensor(&updated) {
                                    tracing::error!(error = %e, "rollback failed; store may be inconsistent");
                                }
                            }
                        }
                        return Err(err);
                    }
                }
                sensor.active = active;
                tracing::debug!(sensor = %sensor.name, was_active, active, "sensor updated");

                if let Some(next) = next {
                    self.announce_alarm_status(next)?;
                }
                self.listeners.notify_sensor_status_changed()
            }
        }
    }

    /// Unconditionally write the alarm status and notify every observer.
    pub fn set_alarm_status(&self, status: AlarmStatus) -> Result<()> {
        let mut state = self.lock()?;
        state.repository.set_alarm_status(status)?;
        self.announce_alarm_status(status)
    }

    /// Store a new sensor. No alarm side effects.
    pub fn add_sensor(&self, sensor: Sensor) -> Result<()> {
        tracing::debug!(sensor = %sensor.name, kind = sensor.sensor_type.as_str(), "adding sensor");
        self.lock()?.repository.add_sensor(sensor)
    }

    /// Forget a sensor. No alarm side effects.
    pub fn remove_sensor(&self, sensor: &Sensor) -> Result<()> {
        tracing::debug!(sensor = %sensor.name, "removing sensor");
        self.lock()?.repository.remove_sensor(sensor)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn alarm_status(&self) -> Result<AlarmStatus> {
        self.lock()?.repository.alarm_status()
    }

    pub fn arming_status(&self) -> Result<ArmingStatus> {
        self.lock()?.repository.arming_status()
    }

    /// Snapshot of the stored sensors; mutating it does not affect the store.
    pub fn sensors(&self) -> Result<Vec<Sensor>> {
        self.lock()?.repository.sensors()
    }

    /// First stored sensor called `name`.
    pub fn find_sensor(&self, name: &str) -> Result<Sensor> {
        self.sensors()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SecurityError::SensorNotFound(name.to_string()))
    }

    pub fn any_sensor_active(&self) -> Result<bool> {
        Ok(any_active(&self.sensors()?))
    }

    /// Result of the most recent camera frame.
    pub fn is_cat_detected(&self) -> Result<bool> {
        Ok(self.lock()?.cat_detected)
    }

    // ── Observers ─────────────────────────────────────────────────────────────

    /// Returns `false` when the listener was already registered.
    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) -> Result<bool> {
        self.listeners.add(listener)
    }

    /// Returns `false` when the listener was not registered.
    pub fn remove_status_listener(&self, listener: &Arc<dyn StatusListener>) -> Result<bool> {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> Result<usize> {
        self.listeners.len()
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Log and broadcast an alarm status that has already been persisted.
    fn announce_alarm_status(&self, status: AlarmStatus) -> Result<()> {
        tracing::info!(alarm = status.as_str(), "alarm status changed");
        self.listeners.notify_alarm_status(status)
    }

    fn lock(&self) -> Result<MutexGuard<'_, EngineState<R>>> {
        self.state
            .lock()
            .map_err(|_| SecurityError::LockPoisoned("engine state"))
    }
}

fn any_active(sensors: &[Sensor]) -> bool {
    sensors.iter().any(|s| s.active)
}

/// Writes for an arming change, in order; stops at the first failure.
fn persist_arming<R: SecurityRepository>(
    repository: &mut R,
    status: ArmingStatus,
    plan: &ArmingPlan,
    sensors: &[Sensor],
) -> Result<()> {
    if plan.reset_sensors {
        for sensor in sensors {
            repository.update_sensor(&sensor.clone().with_active(false))?;
        }
    }
    if let Some(alarm) = plan.alarm {
        repository.set_alarm_status(alarm)?;
    }
    repository.set_arming_status(status)
}

/// Best-effort undo of a partially applied command.
fn restore<R: SecurityRepository>(
    repository: &mut R,
    alarm: Option<AlarmStatus>,
    sensors: &[Sensor],
) {
    let mut result = sensors.iter().try_for_each(|s| repository.update_sensor(s));
    if let Some(alarm) = alarm {
        result = result.and(repository.set_alarm_status(alarm));
    }
    if let Err(err) = result {
        tracing::error!(error = %err, "rollback failed; store may be inconsistent");
    }
}
