use std::path::Path;
use std::rc::Rc;

use slint::{ComponentHandle as _, ModelRc, VecModel};

use scada_dashboard_model::{
    Action, Device, EfficiencyLevel, Lamp, LogEntry, LogLevel, RobotState, View, ViewUpdate,
};

use crate::{
    AppWindow, Control, EfficiencyGrade, LogKind, LogRecord, Machine, RobotBadge, ViewModel,
};

/// The `ViewModel` global of the Slint window as seen by the renderer.
pub struct SlintView {
    ui: slint::Weak<AppWindow>,
    log: Rc<VecModel<LogRecord>>,
}

impl SlintView {
    pub fn new(ui: &AppWindow) -> Self {
        // Create a shared model for the log records
        let log: Rc<VecModel<LogRecord>> = Rc::default();
        ui.global::<ViewModel>().set_log(ModelRc::from(log.clone()));

        Self {
            ui: ui.as_weak(),
            log,
        }
    }

    fn with_model(&self, f: impl FnOnce(ViewModel<'_>)) {
        match self.ui.upgrade() {
            Some(ui) => f(ui.global::<ViewModel>()),
            None => log::debug!("window is gone, dropping view update"),
        }
    }

    pub fn set_webcam_active(&self, active: bool) {
        self.with_model(|model| model.set_webcam_active(active));
    }

    pub fn set_last_capture(&self, path: &Path) {
        let text = format!("Last capture: {}", path.display());
        self.with_model(|model| model.set_last_capture(text.into()));
    }
}

impl View for SlintView {
    fn apply(&mut self, update: ViewUpdate) {
        let update = match update {
            ViewUpdate::Log(entries) => {
                let records: Vec<LogRecord> = entries.into_iter().map(LogRecord::from).collect();
                self.log.set_vec(records);
                return;
            }
            other => other,
        };

        self.with_model(|model| match update {
            ViewUpdate::Lamp { lamp, on } => match lamp {
                Lamp::ConveyorPower => model.set_conveyor_power(on),
                Lamp::ConveyorForward => model.set_conveyor_forward(on),
                Lamp::ConveyorReverse => model.set_conveyor_reverse(on),
                Lamp::MixerDetection => model.set_mixer_detection(on),
                Lamp::MixerWorking => model.set_mixer_working(on),
                Lamp::PackerDetection => model.set_packer_detection(on),
                Lamp::PackerWorking => model.set_packer_working(on),
            },
            ViewUpdate::StateText { device, text } => match device {
                Device::Conveyor => model.set_conveyor_state(text.into()),
                other => log::warn!("no state text for {}", other.label()),
            },
            ViewUpdate::Progress { device, percent } => {
                let percent = i32::from(percent);
                match device {
                    Device::Mixer => model.set_mixer_progress(percent),
                    Device::Packer => model.set_packer_progress(percent),
                    Device::Robot => model.set_robot_progress(percent),
                    Device::Conveyor => log::warn!("the conveyor has no progress"),
                }
            }
            ViewUpdate::Control { device, engaged } => match device {
                Device::Conveyor => model.set_conveyor_engaged(engaged),
                Device::Mixer => model.set_mixer_engaged(engaged),
                Device::Packer => model.set_packer_engaged(engaged),
                Device::Robot => model.set_robot_engaged(engaged),
            },
            ViewUpdate::ControlsEnabled { device, enabled } => match device {
                Device::Conveyor => model.set_conveyor_enabled(enabled),
                Device::Mixer => model.set_mixer_enabled(enabled),
                Device::Packer => model.set_packer_enabled(enabled),
                Device::Robot => model.set_robot_enabled(enabled),
            },
            ViewUpdate::RobotBadge(state) => model.set_robot_badge(state.into()),
            ViewUpdate::RobotLines { line, total } => {
                model.set_robot_line(i32::try_from(line).unwrap_or(i32::MAX));
                model.set_robot_total(i32::try_from(total).unwrap_or(i32::MAX));
            }
            ViewUpdate::Elapsed { device, text } => match device {
                Device::Conveyor => model.set_conveyor_elapsed(text.into()),
                Device::Mixer => model.set_mixer_elapsed(text.into()),
                Device::Packer => model.set_packer_elapsed(text.into()),
                Device::Robot => model.set_robot_elapsed(text.into()),
            },
            ViewUpdate::Efficiency { percent, level } => {
                model.set_efficiency(i32::from(percent));
                model.set_efficiency_grade(level.into());
            }
            ViewUpdate::Log(_) => {}
        });
    }
}

impl From<Machine> for Device {
    fn from(machine: Machine) -> Self {
        match machine {
            Machine::Conveyor => Device::Conveyor,
            Machine::Mixer => Device::Mixer,
            Machine::Packer => Device::Packer,
            Machine::Robot => Device::Robot,
        }
    }
}

impl From<Control> for Action {
    fn from(control: Control) -> Self {
        match control {
            Control::Power => Action::Power,
            Control::Forward => Action::Forward,
            Control::Reverse => Action::Reverse,
            Control::Toggle => Action::Toggle,
            Control::Restart => Action::Restart,
            Control::Skip => Action::Skip,
        }
    }
}

impl From<RobotState> for RobotBadge {
    fn from(state: RobotState) -> Self {
        match state {
            RobotState::Working => RobotBadge::Working,
            RobotState::Stopped => RobotBadge::Stopped,
            RobotState::Finished => RobotBadge::Finished,
            RobotState::Unknown => RobotBadge::Unknown,
        }
    }
}

impl From<EfficiencyLevel> for EfficiencyGrade {
    fn from(level: EfficiencyLevel) -> Self {
        match level {
            EfficiencyLevel::Good => EfficiencyGrade::Good,
            EfficiencyLevel::Fair => EfficiencyGrade::Fair,
            EfficiencyLevel::Poor => EfficiencyGrade::Poor,
        }
    }
}

/// Convert an operator log entry into a log record.
impl From<LogEntry> for LogRecord {
    fn from(entry: LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp.into(),
            kind: match entry.level {
                LogLevel::Info => LogKind::Info,
                LogLevel::Warning => LogKind::Warning,
                LogLevel::Error => LogKind::Error,
                LogLevel::Success => LogKind::Success,
            },
            message: entry.message.into(),
        }
    }
}
