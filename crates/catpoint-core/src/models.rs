use crate::error::{Result, SecurityError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

// ── ArmingStatus ──────────────────────────────────────────────────────────────

/// Whether the system is disarmed or armed in a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    /// Sensors are ignored.
    #[default]
    Disarmed,
    /// Occupants are home; cat sightings raise the alarm.
    ArmedHome,
    /// Nobody is home.
    ArmedAway,
}

impl ArmingStatus {
    /// Every variant, in declaration order.
    pub const ALL: [ArmingStatus; 3] = [
        ArmingStatus::Disarmed,
        ArmingStatus::ArmedHome,
        ArmingStatus::ArmedAway,
    ];

    /// The canonical lowercase identifier for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "disarmed",
            ArmingStatus::ArmedHome => "armed_home",
            ArmingStatus::ArmedAway => "armed_away",
        }
    }

    /// Human-readable label shown to operators.
    pub fn description(&self) -> &'static str {
        match self {
            ArmingStatus::Disarmed => "Disarmed",
            ArmingStatus::ArmedHome => "Armed - At Home",
            ArmingStatus::ArmedAway => "Armed - Away",
        }
    }

    /// `true` for both armed modes.
    pub fn is_armed(&self) -> bool {
        !matches!(self, ArmingStatus::Disarmed)
    }
}

impl FromStr for ArmingStatus {
    type Err = SecurityError;

    /// Case-insensitive; also accepts the short forms `home` and `away`.
    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "disarmed" => Ok(ArmingStatus::Disarmed),
            "armed_home" | "home" => Ok(ArmingStatus::ArmedHome),
            "armed_away" | "away" => Ok(ArmingStatus::ArmedAway),
            other => Err(SecurityError::InvalidArmingStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ArmingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

// ── AlarmStatus ───────────────────────────────────────────────────────────────

/// Three-level escalation state of the alarm itself.
///
/// Severity grows `NoAlarm` < `PendingAlarm` < `Alarm`; no numeric ordering is
/// exposed because transitions are decided by the rules module, never by
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl AlarmStatus {
    /// Every variant, in order of severity.
    pub const ALL: [AlarmStatus; 3] = [
        AlarmStatus::NoAlarm,
        AlarmStatus::PendingAlarm,
        AlarmStatus::Alarm,
    ];

    /// The canonical lowercase identifier for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "no_alarm",
            AlarmStatus::PendingAlarm => "pending_alarm",
            AlarmStatus::Alarm => "alarm",
        }
    }

    /// Human-readable label shown to operators.
    pub fn description(&self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "Cool and Good",
            AlarmStatus::PendingAlarm => "I'm in Danger...",
            AlarmStatus::Alarm => "Awooga!",
        }
    }
}

impl FromStr for AlarmStatus {
    type Err = SecurityError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "no_alarm" => Ok(AlarmStatus::NoAlarm),
            "pending_alarm" => Ok(AlarmStatus::PendingAlarm),
            "alarm" => Ok(AlarmStatus::Alarm),
            other => Err(SecurityError::InvalidAlarmStatus(other.to_string())),
        }
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

// ── SensorType ────────────────────────────────────────────────────────────────

/// Kind of physical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [SensorType::Door, SensorType::Window, SensorType::Motion];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Door => "door",
            SensorType::Window => "window",
            SensorType::Motion => "motion",
        }
    }
}

impl FromStr for SensorType {
    type Err = SecurityError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "door" => Ok(SensorType::Door),
            "window" => Ok(SensorType::Window),
            "motion" => Ok(SensorType::Motion),
            other => Err(SecurityError::InvalidSensorType(other.to_string())),
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Sensor ────────────────────────────────────────────────────────────────────

/// A door, window or motion sensor.
///
/// Identity is the `(name, sensor_type)` pair. Equality, hashing and ordering
/// ignore `active`, so a sensor can be looked up in a set regardless of its
/// current activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub sensor_type: SensorType,
    #[serde(default)]
    pub active: bool,
}

impl Sensor {
    /// Create an inactive sensor.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            sensor_type,
            active: false,
        }
    }

    /// Builder-style helper setting the initial activation.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// `true` when `other` names the same physical sensor.
    pub fn same_identity(&self, other: &Sensor) -> bool {
        self.name == other.name && self.sensor_type == other.sensor_type
    }
}

impl PartialEq for Sensor {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for Sensor {}

impl Hash for Sensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.sensor_type.hash(state);
    }
}

impl PartialOrd for Sensor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sensor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then(self.sensor_type.cmp(&other.sensor_type))
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "active" } else { "inactive" };
        write!(f, "{} ({}) - {}", self.name, self.sensor_type, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_arming_status_from_str_all_valid() {
        for status in ArmingStatus::ALL {
            assert_eq!(status.as_str().parse::<ArmingStatus>().unwrap(), status);
        }
        assert_eq!("HOME".parse::<ArmingStatus>().unwrap(), ArmingStatus::ArmedHome);
        assert_eq!("away".parse::<ArmingStatus>().unwrap(), ArmingStatus::ArmedAway);
    }

    #[test]
    fn test_arming_status_from_str_invalid() {
        let err = "armed_garden".parse::<ArmingStatus>().unwrap_err();
        assert!(matches!(err, SecurityError::InvalidArmingStatus(ref s) if s == "armed_garden"));
    }

    #[test]
    fn test_arming_status_is_armed() {
        assert!(!ArmingStatus::Disarmed.is_armed());
        assert!(ArmingStatus::ArmedHome.is_armed());
        assert!(ArmingStatus::ArmedAway.is_armed());
    }

    #[test]
    fn test_alarm_status_from_str_case_insensitive() {
        assert_eq!("PENDING_ALARM".parse::<AlarmStatus>().unwrap(), AlarmStatus::PendingAlarm);
        assert!("siren".parse::<AlarmStatus>().is_err());
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(AlarmStatus::NoAlarm.to_string(), "Cool and Good");
        assert_eq!(AlarmStatus::PendingAlarm.to_string(), "I'm in Danger...");
        assert_eq!(AlarmStatus::Alarm.to_string(), "Awooga!");
        assert_eq!(ArmingStatus::ArmedHome.to_string(), "Armed - At Home");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ArmingStatus::default(), ArmingStatus::Disarmed);
        assert_eq!(AlarmStatus::default(), AlarmStatus::NoAlarm);
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&AlarmStatus::PendingAlarm).unwrap();
        assert_eq!(json, "\"PENDING_ALARM\"");
        let back: ArmingStatus = serde_json::from_str("\"ARMED_AWAY\"").unwrap();
        assert_eq!(back, ArmingStatus::ArmedAway);
    }

    #[test]
    fn test_sensor_new_is_inactive() {
        let sensor = Sensor::new("Front Door", SensorType::Door);
        assert!(!sensor.active);
    }

    #[test]
    fn test_sensor_identity_ignores_activation() {
        let a = Sensor::new("Hall", SensorType::Motion);
        let b = Sensor::new("Hall", SensorType::Motion).with_active(true);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.insert(b));
    }

    #[test]
    fn test_sensor_identity_includes_type() {
        let door = Sensor::new("Kitchen", SensorType::Door);
        let window = Sensor::new("Kitchen", SensorType::Window);
        assert_ne!(door, window);
    }

    #[test]
    fn test_sensor_ordering_by_name_then_type() {
        let mut sensors = vec![
            Sensor::new("b", SensorType::Door),
            Sensor::new("a", SensorType::Motion),
            Sensor::new("a", SensorType::Door),
        ];
        sensors.sort();
        assert_eq!(sensors[0].sensor_type, SensorType::Door);
        assert_eq!(sensors[0].name, "a");
        assert_eq!(sensors[1].sensor_type, SensorType::Motion);
        assert_eq!(sensors[2].name, "b");
    }

    #[test]
    fn test_sensor_display() {
        let sensor = Sensor::new("Garage", SensorType::Window).with_active(true);
        assert_eq!(sensor.to_string(), "Garage (window) - active");
    }

    #[test]
    fn test_sensor_deserialize_defaults_active() {
        let sensor: Sensor =
            serde_json::from_str(r#"{"name":"Porch","sensor_type":"MOTION"}"#).unwrap();
        assert!(!sensor.active);
        assert_eq!(sensor.sensor_type, SensorType::Motion);
    }
}
