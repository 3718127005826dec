use crate::command::Device;
use crate::logpanel::LogEntry;
use crate::snapshot::RobotState;

/// The indicator lamps shown on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lamp {
    ConveyorPower,
    ConveyorForward,
    ConveyorReverse,
    MixerDetection,
    MixerWorking,
    PackerDetection,
    PackerWorking,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EfficiencyLevel {
    #[default]
    Poor,
    Fair,
    Good,
}

impl EfficiencyLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            p if p > 75 => EfficiencyLevel::Good,
            p if p > 40 => EfficiencyLevel::Fair,
            _ => EfficiencyLevel::Poor,
        }
    }
}

/// A single change to apply to the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewUpdate {
    Lamp { lamp: Lamp, on: bool },
    /// Free text state of the conveyor.
    StateText { device: Device, text: String },
    Progress { device: Device, percent: u8 },
    /// The power button of the conveyor or the run/pause toggle of the others.
    /// `engaged` means the device is commanded to run.
    Control { device: Device, engaged: bool },
    ControlsEnabled { device: Device, enabled: bool },
    RobotBadge(RobotState),
    RobotLines { line: u32, total: u32 },
    Elapsed { device: Device, text: String },
    Efficiency { percent: u8, level: EfficiencyLevel },
    /// The whole operator log, newest first.
    Log(Vec<LogEntry>),
}

/// The dashboard as seen by the renderer.
///
/// Implementations are bound once at startup and only ever receive the
/// updates that actually change what is displayed.
pub trait View {
    fn apply(&mut self, update: ViewUpdate);
}

/// Records updates instead of displaying them. Handy for headless runs and tests.
impl View for Vec<ViewUpdate> {
    fn apply(&mut self, update: ViewUpdate) {
        self.push(update);
    }
}
