//! Sensor and status storage.
//!
//! Stores are passive records. They never apply business rules of their own:
//! resetting sensors on arm and clearing the alarm on disarm belong to the
//! [`SecurityService`](crate::service::SecurityService) alone.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SecurityError};
use crate::models::{AlarmStatus, ArmingStatus, Sensor};

// ── Contract ──────────────────────────────────────────────────────────────────

/// Storage consumed by the security engine.
pub trait SecurityRepository: Send {
    /// Point-in-time copy of every stored sensor.
    fn sensors(&self) -> Result<Vec<Sensor>>;
    /// Store `sensor`, replacing any sensor with the same identity.
    fn add_sensor(&mut self, sensor: Sensor) -> Result<()>;
    /// Forget the sensor with the same identity as `sensor`, if any.
    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()>;
    /// Upsert by identity.
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()>;
    fn alarm_status(&self) -> Result<AlarmStatus>;
    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()>;
    fn arming_status(&self) -> Result<ArmingStatus>;
    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()>;
}

/// Lets a store chosen at runtime (`Box<dyn SecurityRepository>`) back the engine.
impl<R: SecurityRepository + ?Sized> SecurityRepository for Box<R> {
    fn sensors(&self) -> Result<Vec<Sensor>> {
        (**self).sensors()
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<()> {
        (**self).add_sensor(sensor)
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        (**self).remove_sensor(sensor)
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        (**self).update_sensor(sensor)
    }

    fn alarm_status(&self) -> Result<AlarmStatus> {
        (**self).alarm_status()
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        (**self).set_alarm_status(status)
    }

    fn arming_status(&self) -> Result<ArmingStatus> {
        (**self).arming_status()
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        (**self).set_arming_status(status)
    }
}

// ── SecuritySnapshot ──────────────────────────────────────────────────────────

/// Complete stored state. This is also the on-disk document of
/// [`JsonFileRepository`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    #[serde(default)]
    pub alarm_status: AlarmStatus,
    #[serde(default)]
    pub arming_status: ArmingStatus,
    #[serde(default)]
    pub sensors: BTreeSet<Sensor>,
    /// When the snapshot was last written to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SecuritySnapshot {
    fn upsert(&mut self, sensor: Sensor) {
        // BTreeSet::insert keeps the old element on a match, so replace explicitly.
        self.sensors.replace(sensor);
    }
}

// ── InMemoryRepository ────────────────────────────────────────────────────────

/// Volatile store. Starts disarmed with no alarm and no sensors.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    state: SecuritySnapshot,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecurityRepository for InMemoryRepository {
    fn sensors(&self) -> Result<Vec<Sensor>> {
        Ok(self.state.sensors.iter().cloned().collect())
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<()> {
        self.state.upsert(sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.state.sensors.remove(sensor);
        Ok(())
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.state.upsert(sensor.clone());
        Ok(())
    }

    fn alarm_status(&self) -> Result<AlarmStatus> {
        Ok(self.state.alarm_status)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.state.alarm_status = status;
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus> {
        Ok(self.state.arming_status)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        self.state.arming_status = status;
        Ok(())
    }
}

// ── JsonFileRepository ────────────────────────────────────────────────────────

/// Store persisted as a pretty-printed JSON document.
///
/// Every mutation rewrites the whole document through a temporary file and a
/// rename. When a write fails the in-memory state is rolled back so the
/// store never reports a value that is not on disk.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    state: SecuritySnapshot,
}

impl JsonFileRepository {
    /// Open the store at `path`.
    ///
    /// A missing file yields the default state; the file is created on the
    /// first mutation. An unreadable or malformed file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|source| SecurityError::FileRead {
                    path: path.clone(),
                    source,
                })?;
            serde_json::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "store file absent; starting empty");
            SecuritySnapshot::default()
        };
        Ok(Self { path, state })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist, restoring the previous state on failure.
    fn mutate(&mut self, change: impl FnOnce(&mut SecuritySnapshot)) -> Result<()> {
        let previous = self.state.clone();
        change(&mut self.state);
        self.state.saved_at = Some(Utc::now());
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to save store");
            self.state = previous;
            return Err(e);
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let write_err = |source: std::io::Error| SecurityError::FileWrite {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.state)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl SecurityRepository for JsonFileRepository {
    fn sensors(&self) -> Result<Vec<Sensor>> {
        Ok(self.state.sensors.iter().cloned().collect())
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<()> {
        self.mutate(|s| s.upsert(sensor))
    }

    fn remove_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        self.mutate(|s| {
            s.sensors.remove(sensor);
        })
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<()> {
        let sensor = sensor.clone();
        self.mutate(|s| s.upsert(sensor))
    }

    fn alarm_status(&self) -> Result<AlarmStatus> {
        Ok(self.state.alarm_status)
    }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<()> {
        self.mutate(|s| s.alarm_status = status)
    }

    fn arming_status(&self) -> Result<ArmingStatus> {
        Ok(self.state.arming_status)
    }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<()> {
        self.mutate(|s| s.arming_status = status)
    }
}
