//! Alarm-status transition rules.
//!
//! Every decision the [`SecurityService`](crate::service::SecurityService)
//! makes is computed here from a snapshot of the current statuses, so the
//! full rule table can be exercised without a store or observers.

use crate::models::{AlarmStatus, ArmingStatus};

// ── Sensor activation ─────────────────────────────────────────────────────────

/// Outcome of a sensor activation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDecision {
    /// The alarm is ringing: the sensor change is dropped without persisting.
    Ignore,
    /// Persist the sensor update, then move to `alarm` when present.
    Persist { alarm: Option<AlarmStatus> },
}

/// Decide how a sensor activation change affects the alarm.
///
/// `any_active_after` is the "any sensor active" scan taken after the sensor
/// itself has been updated, so the changing sensor is counted exactly once.
pub fn on_sensor_change(
    arming: ArmingStatus,
    alarm: AlarmStatus,
    was_active: bool,
    active: bool,
    any_active_after: bool,
) -> SensorDecision {
    if alarm == AlarmStatus::Alarm {
        return SensorDecision::Ignore;
    }

    let next = if active {
        // Any `true` write counts as an activation, including re-activation.
        match (arming.is_armed(), alarm) {
            (false, _) => None,
            (true, AlarmStatus::NoAlarm) => Some(AlarmStatus::PendingAlarm),
            (true, AlarmStatus::PendingAlarm) => Some(AlarmStatus::Alarm),
            (true, AlarmStatus::Alarm) => None,
        }
    } else if was_active && alarm == AlarmStatus::PendingAlarm && !any_active_after {
        Some(AlarmStatus::NoAlarm)
    } else {
        None
    };

    SensorDecision::Persist { alarm: next }
}

// ── Arming ────────────────────────────────────────────────────────────────────

/// Effects of an arming-status change, applied in field order before the new
/// arming status itself is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmingPlan {
    /// Deactivate every stored sensor.
    pub reset_sensors: bool,
    /// Alarm status to apply, if any.
    pub alarm: Option<AlarmStatus>,
}

/// Plan the effects of switching to `target`.
pub fn on_arming_change(target: ArmingStatus, cat_detected: bool) -> ArmingPlan {
    match target {
        ArmingStatus::Disarmed => ArmingPlan {
            reset_sensors: false,
            alarm: Some(AlarmStatus::NoAlarm),
        },
        ArmingStatus::ArmedHome => ArmingPlan {
            reset_sensors: true,
            alarm: cat_detected.then_some(AlarmStatus::Alarm),
        },
        ArmingStatus::ArmedAway => ArmingPlan {
            reset_sensors: true,
            alarm: None,
        },
    }
}

// ── Camera ────────────────────────────────────────────────────────────────────

/// Decide how a classified camera image affects the alarm.
pub fn on_image(cat_present: bool, arming: ArmingStatus, any_active: bool) -> Option<AlarmStatus> {
    if cat_present && arming == ArmingStatus::ArmedHome {
        Some(AlarmStatus::Alarm)
    } else if !cat_present && !any_active {
        Some(AlarmStatus::NoAlarm)
    } else {
        None
    }
}
