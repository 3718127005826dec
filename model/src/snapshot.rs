use serde::{Deserialize, Serialize};

/// One status document as served by the backend.
///
/// Every field is optional on the wire. Backends only fill in the parts they
/// know about, so missing keys fall back to their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Snapshot {
    pub plc1: ConveyorStatus,
    pub plc2: StationStatus,
    pub plc3: StationStatus,
    pub robot: RobotStatus,
    pub log: Vec<String>,
}

/// The conveyor belt (`plc1`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ConveyorStatus {
    pub state: String,
    #[serde(rename = "focos")]
    pub lamps: ConveyorLamps,
    #[serde(rename = "botones")]
    pub buttons: ConveyorButtons,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConveyorLamps {
    #[serde(rename = "encendido")]
    pub power: bool,
    #[serde(rename = "adelante")]
    pub forward: bool,
    #[serde(rename = "reversa")]
    pub reverse: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConveyorButtons {
    #[serde(rename = "encender")]
    pub power: bool,
    #[serde(rename = "adelante")]
    pub forward: bool,
    #[serde(rename = "reversa")]
    pub reverse: bool,
}

/// A processing station with a progress counter (`plc2` mixer, `plc3` packer).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct StationStatus {
    pub progress: f64,
    #[serde(rename = "focos")]
    pub lamps: StationLamps,
    #[serde(rename = "botones")]
    pub buttons: StationButtons,
}

impl StationStatus {
    /// The progress clamped to `0.0..=100.0`, unrounded.
    pub fn progress_value(&self) -> f64 {
        clamp_progress(self.progress)
    }

    /// The progress as a whole percentage in `0..=100`.
    pub fn percent(&self) -> u8 {
        round_percent(self.progress_value())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StationLamps {
    #[serde(rename = "deteccion")]
    pub detection: bool,
    #[serde(rename = "trabajando")]
    pub working: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StationButtons {
    pub toggle: bool,
    #[serde(rename = "reiniciar")]
    pub restart: bool,
    pub skip: bool,
}

/// The robot running a G-code program.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct RobotStatus {
    #[serde(rename = "foco")]
    pub state: RobotState,
    pub gcode_line: u32,
    pub total_lines: u32,
    /// Only sent by newer backends. When absent the progress is derived from
    /// the G-code line counter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(rename = "botones")]
    pub buttons: StationButtons,
}

impl RobotStatus {
    /// The progress clamped to `0.0..=100.0`, unrounded.
    pub fn progress_value(&self) -> f64 {
        match self.progress {
            Some(progress) => clamp_progress(progress),
            None if self.total_lines == 0 => 0.0,
            None => clamp_progress(self.gcode_line as f64 / self.total_lines as f64 * 100.0),
        }
    }

    /// The progress as a whole percentage in `0..=100`.
    pub fn percent(&self) -> u8 {
        round_percent(self.progress_value())
    }
}

/// The robot status lamp.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RobotState {
    #[serde(rename = "trabajando")]
    Working,
    #[serde(rename = "detenido")]
    Stopped,
    #[serde(rename = "terminado")]
    Finished,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RobotState {
    pub fn label(self) -> &'static str {
        match self {
            RobotState::Working => "Working",
            RobotState::Stopped => "Stopped",
            RobotState::Finished => "Finished",
            RobotState::Unknown => "Unknown",
        }
    }
}

fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn round_percent(value: f64) -> u8 {
    clamp_progress(value).round() as u8
}
