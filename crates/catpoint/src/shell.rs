//! Line-oriented console for driving the security engine.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use catpoint_core::classifier::ImageClassifier;
use catpoint_core::listeners::StatusListener;
use catpoint_core::models::{AlarmStatus, ArmingStatus, Sensor, SensorType};
use catpoint_core::repository::SecurityRepository;
use catpoint_core::service::SecurityService;
use catpoint_image::load_ppm;
use chrono::{DateTime, Local};

pub const HELP: &str = "\
Commands:
  status                       show arming, alarm and camera state
  arm home|away                arm the system
  disarm                       disarm the system and clear the alarm
  sensors                      list sensors
  add <name> <door|window|motion>
  remove <name>
  activate <name>              trip a sensor
  deactivate <name>            reset a sensor
  camera <path.ppm>            classify a camera frame
  camera none                  report that no frame is available
  alarm <no_alarm|pending_alarm|alarm>
  help
  quit";

// ── Command parsing ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Arm(ArmingStatus),
    Disarm,
    Sensors,
    Add { name: String, sensor_type: SensorType },
    Remove(String),
    Activate(String),
    Deactivate(String),
    Camera(Option<PathBuf>),
    Alarm(AlarmStatus),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    /// Sensor names may contain spaces; for `add` the last word is the type.
    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "status" => Command::Status,
            "disarm" => Command::Disarm,
            "sensors" => Command::Sensors,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "arm" => {
                let status: ArmingStatus = required(rest, "arm home|away")?.parse()?;
                if !status.is_armed() {
                    bail!("use `disarm` to disarm");
                }
                Command::Arm(status)
            }
            "alarm" => Command::Alarm(required(rest, "alarm <status>")?.parse()?),
            "add" => {
                let Some((name, kind)) = rest.rsplit_once(char::is_whitespace) else {
                    bail!("usage: add <name> <door|window|motion>");
                };
                Command::Add {
                    name: name.trim().to_string(),
                    sensor_type: kind.parse()?,
                }
            }
            "remove" => Command::Remove(required(rest, "remove <name>")?.to_string()),
            "activate" => Command::Activate(required(rest, "activate <name>")?.to_string()),
            "deactivate" => Command::Deactivate(required(rest, "deactivate <name>")?.to_string()),
            "camera" => match required(rest, "camera <path.ppm>|none")? {
                none if none.eq_ignore_ascii_case("none") => Command::Camera(None),
                path => Command::Camera(Some(PathBuf::from(path))),
            },
            "" => bail!("empty command"),
            other => bail!("unknown command `{other}`; type `help`"),
        };
        Ok(command)
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> anyhow::Result<&'a str> {
    if rest.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(rest)
}

// ── Execution ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// Run one command against the engine.
pub fn execute<R, C>(service: &SecurityService<R, C>, command: Command) -> anyhow::Result<Reply>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    let text = match command {
        Command::Quit => return Ok(Reply::Quit),
        Command::Help => HELP.to_string(),
        Command::Status => status_report(service)?,
        Command::Sensors => sensor_report(&service.sensors()?),
        Command::Arm(status) => {
            service.set_arming_status(status)?;
            format!("System {status}. Alarm: {}", service.alarm_status()?)
        }
        Command::Disarm => {
            service.set_arming_status(ArmingStatus::Disarmed)?;
            format!("System {}.", ArmingStatus::Disarmed)
        }
        Command::Add { name, sensor_type } => {
            if let Ok(existing) = service.find_sensor(&name) {
                bail!("a sensor named `{}` already exists ({})", name, existing.sensor_type);
            }
            let sensor = Sensor::new(name, sensor_type);
            service.add_sensor(sensor.clone())?;
            format!("Added {sensor}")
        }
        Command::Remove(name) => {
            let sensor = service.find_sensor(&name)?;
            service.remove_sensor(&sensor)?;
            format!("Removed {}", sensor.name)
        }
        Command::Activate(name) => set_activation(service, &name, true)?,
        Command::Deactivate(name) => set_activation(service, &name, false)?,
        Command::Camera(None) => {
            service.process_image(None)?;
            "No camera frame.".to_string()
        }
        Command::Camera(Some(path)) => {
            let image =
                load_ppm(&path).with_context(|| format!("loading {}", path.display()))?;
            let cat = service.process_image(Some(&image))?;
            format!(
                "{}. Alarm: {}",
                if cat { "Cat detected" } else { "No cat" },
                service.alarm_status()?
            )
        }
        Command::Alarm(status) => {
            service.set_alarm_status(status)?;
            format!("Alarm set to {status}")
        }
    };
    Ok(Reply::Text(text))
}

fn set_activation<R, C>(
    service: &SecurityService<R, C>,
    name: &str,
    active: bool,
) -> anyhow::Result<String>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    let mut sensor = service.find_sensor(name)?;
    service.change_sensor_activation_status(&mut sensor, active)?;
    Ok(format!("{sensor}. Alarm: {}", service.alarm_status()?))
}

fn status_report<R, C>(service: &SecurityService<R, C>) -> anyhow::Result<String>
where
    R: SecurityRepository,
    C: ImageClassifier,
{
    let sensors = service.sensors()?;
    let active = sensors.iter().filter(|s| s.active).count();
    let camera = if service.is_cat_detected()? {
        "cat detected"
    } else {
        "no cat"
    };
    Ok(format!(
        "Arming:  {}\nAlarm:   {}\nCamera:  {camera}\nSensors: {} ({active} active)",
        service.arming_status()?,
        service.alarm_status()?,
        sensors.len(),
    ))
}

fn sensor_report(sensors: &[Sensor]) -> String {
    if sensors.is_empty() {
        return "No sensors.".to_string();
    }
    let mut out = String::new();
    for sensor in sensors {
        let _ = writeln!(out, "  {sensor}");
    }
    out.trim_end().to_string()
}

// ── ConsoleListener ───────────────────────────────────────────────────────────

/// Prints engine notifications to stdout as they happen.
#[derive(Debug, Default)]
pub struct ConsoleListener;

/// A single notification, as rendered on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Alarm(AlarmStatus),
    Cat(bool),
    Sensors,
}

impl ConsoleListener {
    pub fn format(event: StatusEvent, at: DateTime<Local>) -> String {
        let message = match event {
            StatusEvent::Alarm(status) => format!("alarm -> {status}"),
            StatusEvent::Cat(true) => "camera: cat detected".to_string(),
            StatusEvent::Cat(false) => "camera: no cat".to_string(),
            StatusEvent::Sensors => "sensors updated".to_string(),
        };
        format!("[{}] {message}", at.format("%H:%M:%S"))
    }

    fn print(&self, event: StatusEvent) {
        println!("{}", Self::format(event, Local::now()));
    }
}

impl StatusListener for ConsoleListener {
    fn on_alarm_status_changed(&self, status: AlarmStatus) {
        self.print(StatusEvent::Alarm(status));
    }

    fn on_cat_detected(&self, cat_detected: bool) {
        self.print(StatusEvent::Cat(cat_detected));
    }

    fn on_sensor_status_changed(&self) {
        self.print(StatusEvent::Sensors);
    }
}
