use crate::backend::{BackendError, StatusBackend};
use crate::command::{Action, Command, Device};
use crate::logpanel::{LogLevel, LogPanel};
use crate::snapshot::{
    ConveyorLamps, ConveyorStatus, RobotState, RobotStatus, Snapshot, StationLamps,
    StationStatus,
};
use crate::timers::{format_elapsed, TimerChange, TimerRegistry};
use crate::view::{EfficiencyLevel, Lamp, View, ViewUpdate};

/// Message shown to the operator whenever a status poll fails.
pub const COMMUNICATION_ERROR: &str = "Communication error with the server";

/// Log lines and lamps that differ between the two processing stations.
struct StationProfile {
    device: Device,
    detection: Lamp,
    working: Lamp,
    detected: &'static str,
    cleared: &'static str,
    started: &'static str,
    stopped: &'static str,
    completed: &'static str,
    restarted: &'static str,
    resumed: &'static str,
    paused: &'static str,
}

const MIXER: StationProfile = StationProfile {
    device: Device::Mixer,
    detection: Lamp::MixerDetection,
    working: Lamp::MixerWorking,
    detected: "Mixer: part detected",
    cleared: "Mixer: detection cleared",
    started: "Pistons: starting work",
    stopped: "Pistons: stopping work",
    completed: "Mixer: process completed at 100%",
    restarted: "Mixer: process restarted",
    resumed: "Mixer: control set to run",
    paused: "Mixer: control set to pause",
};

const PACKER: StationProfile = StationProfile {
    device: Device::Packer,
    detection: Lamp::PackerDetection,
    working: Lamp::PackerWorking,
    detected: "Packer: part detected",
    cleared: "Packer: detection cleared",
    started: "Packer: starting work",
    stopped: "Packer: stopping work",
    completed: "Packer: process completed at 100%",
    restarted: "Packer: process restarted",
    resumed: "Packer: control set to run",
    paused: "Packer: control set to pause",
};

#[derive(Clone, Debug, Default)]
struct ConveyorRendered {
    state: String,
    lamps: ConveyorLamps,
    power_control: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct ProgressRendered {
    percent: u8,
    value: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct StationRendered {
    progress: ProgressRendered,
    lamps: StationLamps,
    toggle: bool,
}

#[derive(Clone, Copy, Debug, Default)]
struct RobotRendered {
    state: RobotState,
    progress: ProgressRendered,
    line: u32,
    total: u32,
    toggle: bool,
}

/// What is currently on screen, used only to detect changes.
#[derive(Clone, Debug, Default)]
struct PreviousState {
    conveyor: ConveyorRendered,
    mixer: StationRendered,
    packer: StationRendered,
    robot: RobotRendered,
    backend_log: Vec<String>,
    efficiency: u8,
}

/// One render pass: forwards view updates and publishes the operator log
/// once at the end if anything was added to it.
struct Pass<'a, 'v> {
    view: &'a mut (dyn View + 'v),
    log: &'a mut LogPanel,
    logged: bool,
}

impl<'a, 'v> Pass<'a, 'v> {
    fn new(view: &'a mut (dyn View + 'v), log: &'a mut LogPanel) -> Self {
        Self {
            view,
            log,
            logged: false,
        }
    }

    fn apply(&mut self, update: ViewUpdate) {
        self.view.apply(update);
    }

    fn note(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        log::debug!("operator log: {message}");
        self.log.push(level, message);
        self.logged = true;
    }

    fn finish(self) {
        if self.logged {
            self.view.apply(ViewUpdate::Log(self.log.to_vec()));
        }
    }
}

/// Stores `current` into `previous` and tells whether it differed.
fn sync<T: PartialEq>(previous: &mut T, current: T) -> bool {
    if *previous == current {
        return false;
    }
    *previous = current;
    true
}

/// Applies a lamp update when the lamp changed and tells whether it did.
fn sync_lamp(pass: &mut Pass, previous: &mut bool, on: bool, lamp: Lamp) -> bool {
    let changed = sync(previous, on);
    if changed {
        pass.apply(ViewUpdate::Lamp { lamp, on });
    }
    changed
}

/// Displays progress by whole percent, but decides completion and restart on
/// the unrounded value so 99.6 is not reported as completed.
fn sync_progress(
    pass: &mut Pass,
    device: Device,
    previous: &mut ProgressRendered,
    value: f64,
    completed: &str,
    restarted: &str,
) {
    let percent = value.round() as u8;
    if sync(&mut previous.percent, percent) {
        pass.apply(ViewUpdate::Progress { device, percent });
    }

    let before = std::mem::replace(&mut previous.value, value);
    if value >= 100.0 && before < 100.0 {
        pass.note(LogLevel::Success, completed);
    } else if value <= 0.0 && before > 0.0 {
        pass.note(LogLevel::Info, restarted);
    }
}

fn render_conveyor(
    pass: &mut Pass,
    previous: &mut ConveyorRendered,
    timers: &mut TimerRegistry,
    status: &ConveyorStatus,
) {
    if previous.state != status.state {
        previous.state.clone_from(&status.state);
        pass.apply(ViewUpdate::StateText {
            device: Device::Conveyor,
            text: status.state.clone(),
        });
    }

    let lamps = status.lamps;
    if sync_lamp(pass, &mut previous.lamps.power, lamps.power, Lamp::ConveyorPower) {
        match lamps.power {
            true => pass.note(LogLevel::Info, "Conveyor: switched on"),
            false => pass.note(LogLevel::Warning, "Conveyor: switched off"),
        }
    }
    if sync_lamp(pass, &mut previous.lamps.forward, lamps.forward, Lamp::ConveyorForward) {
        match lamps.forward {
            true => pass.note(LogLevel::Info, "Conveyor: moving forward"),
            false => pass.note(LogLevel::Warning, "Conveyor: forward motion stopped"),
        }
    }
    if sync_lamp(pass, &mut previous.lamps.reverse, lamps.reverse, Lamp::ConveyorReverse) {
        match lamps.reverse {
            true => pass.note(LogLevel::Info, "Conveyor: moving in reverse"),
            false => pass.note(LogLevel::Warning, "Conveyor: reverse motion stopped"),
        }
    }

    let engaged = status.buttons.power;
    if sync(&mut previous.power_control, engaged) {
        pass.apply(ViewUpdate::Control {
            device: Device::Conveyor,
            engaged,
        });
        match engaged {
            true => pass.note(LogLevel::Info, "Conveyor: power control engaged"),
            false => pass.note(LogLevel::Info, "Conveyor: power control released"),
        }
    }

    timers.toggle(Device::Conveyor, lamps.power);
}

fn render_station(
    pass: &mut Pass,
    profile: &StationProfile,
    previous: &mut StationRendered,
    timers: &mut TimerRegistry,
    status: &StationStatus,
) {
    sync_progress(
        pass,
        profile.device,
        &mut previous.progress,
        status.progress_value(),
        profile.completed,
        profile.restarted,
    );

    let lamps = status.lamps;
    if sync_lamp(pass, &mut previous.lamps.detection, lamps.detection, profile.detection) {
        match lamps.detection {
            true => pass.note(LogLevel::Info, profile.detected),
            false => pass.note(LogLevel::Info, profile.cleared),
        }
    }
    if sync_lamp(pass, &mut previous.lamps.working, lamps.working, profile.working) {
        match lamps.working {
            true => pass.note(LogLevel::Info, profile.started),
            false => pass.note(LogLevel::Warning, profile.stopped),
        }
    }

    let engaged = status.buttons.toggle;
    if sync(&mut previous.toggle, engaged) {
        pass.apply(ViewUpdate::Control {
            device: profile.device,
            engaged,
        });
        match engaged {
            true => pass.note(LogLevel::Info, profile.resumed),
            false => pass.note(LogLevel::Info, profile.paused),
        }
    }

    timers.toggle(profile.device, lamps.working);
}

fn render_robot(
    pass: &mut Pass,
    previous: &mut RobotRendered,
    timers: &mut TimerRegistry,
    status: &RobotStatus,
) {
    sync_progress(
        pass,
        Device::Robot,
        &mut previous.progress,
        status.progress_value(),
        "Robot: G-code completed at 100%",
        "Robot: G-code restarted",
    );

    if previous.line != status.gcode_line || previous.total != status.total_lines {
        previous.line = status.gcode_line;
        previous.total = status.total_lines;
        pass.apply(ViewUpdate::RobotLines {
            line: status.gcode_line,
            total: status.total_lines,
        });
    }

    let engaged = status.buttons.toggle;
    if sync(&mut previous.toggle, engaged) {
        pass.apply(ViewUpdate::Control {
            device: Device::Robot,
            engaged,
        });
        match engaged {
            true => pass.note(LogLevel::Info, "Robot: control set to run"),
            false => pass.note(LogLevel::Info, "Robot: control set to pause"),
        }
    }

    if sync(&mut previous.state, status.state) {
        pass.apply(ViewUpdate::RobotBadge(status.state));
        match status.state {
            RobotState::Working => pass.note(LogLevel::Info, "Robot: starting work"),
            RobotState::Stopped => pass.note(LogLevel::Warning, "Robot: stopped"),
            RobotState::Finished => pass.note(LogLevel::Success, "Robot: process finished"),
            RobotState::Unknown => pass.note(LogLevel::Warning, "Robot: state unknown"),
        }
    }

    timers.toggle(Device::Robot, status.state == RobotState::Working);
}

/// Share of running machines, in steps of 25 %.
fn efficiency(snapshot: &Snapshot) -> u8 {
    let active = [
        snapshot.plc1.lamps.power,
        snapshot.plc2.lamps.working,
        snapshot.plc3.lamps.working,
        snapshot.robot.state == RobotState::Working,
    ]
    .into_iter()
    .filter(|active| *active)
    .count();

    (active * 100 / 4) as u8
}

/// Length of the longest tail of `previous` that `current` starts with.
fn log_overlap(previous: &[String], current: &[String]) -> usize {
    let longest = previous.len().min(current.len());
    (0..=longest)
        .rev()
        .find(|&len| previous[previous.len() - len..] == current[..len])
        .unwrap_or_default()
}

/// Appends the backend log entries the operator has not seen yet.
///
/// The backend keeps a rolling window, so the new document may have dropped
/// entries from its front while adding new ones at its back.
fn merge_backend_log(pass: &mut Pass, previous: &mut Vec<String>, current: &[String]) {
    if previous.as_slice() == current {
        return;
    }
    let seen = log_overlap(previous, current);
    for entry in &current[seen..] {
        let level = match entry.starts_with("ERROR") {
            true => LogLevel::Error,
            false => LogLevel::Info,
        };
        pass.note(level, entry.as_str());
    }
    previous.clear();
    previous.extend_from_slice(current);
}

/// Keeps the dashboard in sync with the backend.
///
/// The renderer owns everything the dashboard remembers between polls: the
/// last rendered values, the operation timers and the operator log. Views
/// only ever receive the updates for values that changed.
#[derive(Debug, Default)]
pub struct Renderer {
    previous: PreviousState,
    timers: TimerRegistry,
    log: LogPanel,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `snapshot` to `view`, touching only what changed since the
    /// previous render.
    pub fn render(&mut self, view: &mut dyn View, snapshot: &Snapshot) {
        let previous = &mut self.previous;
        let timers = &mut self.timers;
        let mut pass = Pass::new(view, &mut self.log);

        render_conveyor(&mut pass, &mut previous.conveyor, timers, &snapshot.plc1);
        render_station(&mut pass, &MIXER, &mut previous.mixer, timers, &snapshot.plc2);
        render_station(&mut pass, &PACKER, &mut previous.packer, timers, &snapshot.plc3);
        render_robot(&mut pass, &mut previous.robot, timers, &snapshot.robot);
        merge_backend_log(&mut pass, &mut previous.backend_log, &snapshot.log);

        let percent = efficiency(snapshot);
        if sync(&mut previous.efficiency, percent) {
            pass.apply(ViewUpdate::Efficiency {
                percent,
                level: EfficiencyLevel::from_percent(percent),
            });
        }

        pass.finish();
    }

    /// Renders a poll result. A failed poll leaves the view untouched apart
    /// from a single error line in the operator log.
    pub fn handle_status(&mut self, view: &mut dyn View, result: Result<Snapshot, BackendError>) {
        match result {
            Ok(snapshot) => self.render(view, &snapshot),
            Err(err) => {
                log::error!("Error fetching data: {err}");
                self.log_event(view, LogLevel::Error, COMMUNICATION_ERROR);
            }
        }
    }

    /// Polls `backend` once and renders the outcome.
    pub fn fetch_and_render(&mut self, backend: &dyn StatusBackend, view: &mut dyn View) {
        let result = backend.fetch_status();
        self.handle_status(view, result);
    }

    /// Builds the command for a button press. Toggles ask for the opposite
    /// of what is currently displayed.
    ///
    /// Returns `None` if `device` has no such control.
    pub fn command(&self, device: Device, action: Action) -> Option<Command> {
        if !device.accepts(action) {
            return None;
        }
        let command = match action {
            Action::Power => Command::power(!self.control_engaged(Device::Conveyor)),
            Action::Toggle => Command::toggle(device, !self.control_engaged(device)),
            _ => Command::new(device, action),
        };
        Some(command)
    }

    /// The last rendered power or run/pause flag of `device`.
    fn control_engaged(&self, device: Device) -> bool {
        match device {
            Device::Conveyor => self.previous.conveyor.power_control,
            Device::Mixer => self.previous.mixer.toggle,
            Device::Packer => self.previous.packer.toggle,
            Device::Robot => self.previous.robot.toggle,
        }
    }

    /// Logs `command` and locks the controls of its device until
    /// [`Renderer::finish_command`] is called.
    pub fn begin_command(&mut self, view: &mut dyn View, command: &Command) {
        log::info!("sending {:?} to {}", command.action, command.device.key());
        view.apply(ViewUpdate::ControlsEnabled {
            device: command.device,
            enabled: false,
        });
        self.log_event(view, LogLevel::Info, command.describe());
    }

    /// Re-enables the controls of the device and renders the reply.
    pub fn finish_command(
        &mut self,
        view: &mut dyn View,
        command: &Command,
        result: Result<Snapshot, BackendError>,
    ) {
        view.apply(ViewUpdate::ControlsEnabled {
            device: command.device,
            enabled: true,
        });
        match result {
            Ok(snapshot) => self.render(view, &snapshot),
            Err(err) => {
                log::error!(
                    "Error sending {} to {}: {err}",
                    command.action.wire_name(),
                    command.device.key()
                );
                self.log_event(view, LogLevel::Error, command.failure_message());
            }
        }
    }

    /// Sends `command` through `backend` and renders the updated status.
    pub fn issue_command(
        &mut self,
        backend: &dyn StatusBackend,
        view: &mut dyn View,
        command: &Command,
    ) {
        self.begin_command(view, command);
        let result = backend.send_command(command);
        self.finish_command(view, command, result);
    }

    /// Starts or stops the operation timer of `device`. Repeated calls with
    /// the same state have no effect.
    pub fn toggle_timer(&mut self, device: Device, active: bool) -> TimerChange {
        let change = self.timers.toggle(device, active);
        if change != TimerChange::Unchanged {
            log::debug!("operation timer of {} {change:?}", device.key());
        }
        change
    }

    /// Advances the running operation timers by one second.
    pub fn tick(&mut self, view: &mut dyn View) {
        for (device, seconds) in self.timers.tick() {
            view.apply(ViewUpdate::Elapsed {
                device,
                text: format_elapsed(seconds),
            });
        }
    }

    /// Adds a line to the operator log and publishes it.
    pub fn log_event(&mut self, view: &mut dyn View, level: LogLevel, message: impl Into<String>) {
        let mut pass = Pass::new(view, &mut self.log);
        pass.note(level, message);
        pass.finish();
    }

    /// Empties the operator log. The backend log is merged again from
    /// scratch on the next render.
    pub fn clear_log(&mut self, view: &mut dyn View) {
        self.log.clear();
        self.previous.backend_log.clear();
        self.log_event(view, LogLevel::Info, "Log cleared by user");
    }

    pub fn log(&self) -> &LogPanel {
        &self.log
    }

    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }
}
