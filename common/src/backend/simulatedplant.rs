// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, PoisonError};

use scada_dashboard_model::{
    Action, BackendError, Command, Device, RobotState, Snapshot, StationStatus, StatusBackend,
};

/// Number of entries the simulated backend keeps in its own log.
const BACKEND_LOG_CAPACITY: usize = 100;

/// Progress a working station makes per status read, in percent.
const STATION_STEP: f64 = 5.0;

/// An in-process production line that behaves like the demo server.
///
/// Every status read advances the machines that are working, so the
/// dashboard has something to show without any hardware around.
pub struct SimulatedPlant {
    state: Mutex<Snapshot>,
}

impl SimulatedPlant {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./initialstatus.json");

        Ok(Self::from_snapshot(serde_json::from_str(json_data)?))
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

fn append_log(snapshot: &mut Snapshot, entry: impl Into<String>) {
    snapshot.log.push(entry.into());
    if snapshot.log.len() > BACKEND_LOG_CAPACITY {
        let excess = snapshot.log.len() - BACKEND_LOG_CAPACITY;
        snapshot.log.drain(..excess);
    }
}

fn advance_station(station: &mut StationStatus) {
    if !station.lamps.working || station.progress >= 100.0 {
        return;
    }
    station.progress = (station.progress + STATION_STEP).min(100.0);
    station.lamps.detection = station.progress < 100.0;
}

fn advance(snapshot: &mut Snapshot) {
    advance_station(&mut snapshot.plc2);
    advance_station(&mut snapshot.plc3);

    let robot = &mut snapshot.robot;
    if robot.state == RobotState::Working && robot.gcode_line < robot.total_lines {
        robot.gcode_line += 1;
        if robot.gcode_line == robot.total_lines {
            robot.state = RobotState::Finished;
            robot.buttons.toggle = false;
            append_log(snapshot, "Robot: program finished");
        }
    }
}

fn control_conveyor(snapshot: &mut Snapshot, action: Action) -> Result<(), BackendError> {
    let conveyor = &mut snapshot.plc1;
    match action {
        Action::Power => {
            let on = !conveyor.lamps.power;
            conveyor.lamps.power = on;
            conveyor.buttons.power = on;
            if on {
                conveyor.state = "Encendido".into();
            } else {
                conveyor.state = "En espera".into();
                conveyor.lamps.forward = false;
                conveyor.lamps.reverse = false;
            }
            append_log(snapshot, format!("PLC1: power set to {on}"));
            Ok(())
        }
        Action::Forward | Action::Reverse if !conveyor.lamps.power => {
            append_log(snapshot, "PLC1: cannot move, system is switched off");
            Err(BackendError::Rejected(format!(
                "cannot run {} while switched off",
                action.label()
            )))
        }
        Action::Forward | Action::Reverse => {
            let forward = action == Action::Forward;
            let engage = match forward {
                true => !conveyor.lamps.forward,
                false => !conveyor.lamps.reverse,
            };
            conveyor.lamps.forward = engage && forward;
            conveyor.lamps.reverse = engage && !forward;
            conveyor.state = match (engage, forward) {
                (false, _) => "Encendido",
                (true, true) => "Adelante",
                (true, false) => "Reversa",
            }
            .into();
            let entry = format!("PLC1: mode set to {}", conveyor.state);
            append_log(snapshot, entry);
            Ok(())
        }
        _ => Err(unknown_action(Device::Conveyor, action)),
    }
}

fn control_station(
    station: &mut StationStatus,
    device: Device,
    action: Action,
) -> Result<String, BackendError> {
    let label = device.label();
    match action {
        Action::Toggle => {
            let working = !station.lamps.working;
            station.lamps.working = working;
            station.buttons.toggle = working;
            if working && station.progress < 100.0 {
                station.lamps.detection = true;
            }
            Ok(match working {
                true => format!("{label}: work started"),
                false => format!("{label}: work paused"),
            })
        }
        Action::Restart => {
            station.progress = 0.0;
            Ok(format!("{label}: process restarted"))
        }
        Action::Skip => {
            station.progress = 100.0;
            station.lamps.detection = false;
            Ok(format!("{label}: process completed (skip)"))
        }
        _ => Err(unknown_action(device, action)),
    }
}

fn control_robot(snapshot: &mut Snapshot, action: Action) -> Result<(), BackendError> {
    let robot = &mut snapshot.robot;
    let entry = match action {
        Action::Toggle => {
            robot.state = match robot.state {
                RobotState::Working => RobotState::Stopped,
                _ => RobotState::Working,
            };
            robot.buttons.toggle = robot.state == RobotState::Working;
            if robot.state == RobotState::Working && robot.gcode_line >= robot.total_lines {
                robot.gcode_line = 0;
            }
            match robot.state {
                RobotState::Working => "Robot: starting work",
                _ => "Robot: stopped",
            }
        }
        Action::Restart => {
            robot.gcode_line = 0;
            "Robot: process restarted"
        }
        Action::Skip => {
            robot.gcode_line = robot.total_lines;
            "Robot: process completed (skip)"
        }
        _ => return Err(unknown_action(Device::Robot, action)),
    };
    append_log(snapshot, entry);
    Ok(())
}

fn unknown_action(device: Device, action: Action) -> BackendError {
    BackendError::Rejected(format!(
        "unknown action {} for {}",
        action.wire_name(),
        device.key()
    ))
}

impl StatusBackend for SimulatedPlant {
    fn fetch_status(&self) -> Result<Snapshot, BackendError> {
        Ok(self.with_state(|snapshot| {
            advance(snapshot);
            snapshot.clone()
        }))
    }

    fn send_command(&self, command: &Command) -> Result<Snapshot, BackendError> {
        log::debug!("simulating {:?}", command);
        self.with_state(|snapshot: &mut Snapshot| -> Result<Snapshot, BackendError> {
            match command.device {
                Device::Conveyor => control_conveyor(snapshot, command.action)?,
                Device::Mixer => {
                    let entry = control_station(&mut snapshot.plc2, Device::Mixer, command.action)?;
                    append_log(snapshot, entry);
                }
                Device::Packer => {
                    let entry = control_station(&mut snapshot.plc3, Device::Packer, command.action)?;
                    append_log(snapshot, entry);
                }
                Device::Robot => control_robot(snapshot, command.action)?,
            }
            Ok(snapshot.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status() {
        let plant = SimulatedPlant::new().unwrap();
        let snapshot = plant.fetch_status().unwrap();

        assert_eq!(snapshot.plc1.state, "En espera");
        assert_eq!(snapshot.robot.state, RobotState::Stopped);
        assert_eq!(snapshot.robot.total_lines, 120);
        assert_eq!(snapshot.log.len(), 1);
    }

    #[test]
    fn test_working_station_advances_per_read() {
        let plant = SimulatedPlant::new().unwrap();
        plant
            .send_command(&Command::toggle(Device::Mixer, true))
            .unwrap();

        plant.fetch_status().unwrap();
        let snapshot = plant.fetch_status().unwrap();
        assert_eq!(snapshot.plc2.percent(), 10);
        assert!(snapshot.plc2.lamps.working);
        assert_eq!(snapshot.plc3.percent(), 0);
    }

    #[test]
    fn test_skip_and_restart() {
        let plant = SimulatedPlant::new().unwrap();
        let snapshot = plant
            .send_command(&Command::new(Device::Packer, Action::Skip))
            .unwrap();
        assert_eq!(snapshot.plc3.percent(), 100);

        let snapshot = plant
            .send_command(&Command::new(Device::Packer, Action::Restart))
            .unwrap();
        assert_eq!(snapshot.plc3.percent(), 0);
        assert_eq!(snapshot.log.last().unwrap(), "Packer: process restarted");
    }

    #[test]
    fn test_conveyor_needs_power_to_move() {
        let plant = SimulatedPlant::new().unwrap();
        let result = plant.send_command(&Command::new(Device::Conveyor, Action::Forward));
        assert!(matches!(result, Err(BackendError::Rejected(_))));

        plant.send_command(&Command::power(true)).unwrap();
        let snapshot = plant
            .send_command(&Command::new(Device::Conveyor, Action::Forward))
            .unwrap();
        assert!(snapshot.plc1.lamps.forward);
        assert_eq!(snapshot.plc1.state, "Adelante");

        let snapshot = plant
            .send_command(&Command::new(Device::Conveyor, Action::Reverse))
            .unwrap();
        assert!(!snapshot.plc1.lamps.forward);
        assert!(snapshot.plc1.lamps.reverse);

        let snapshot = plant.send_command(&Command::power(false)).unwrap();
        assert!(!snapshot.plc1.lamps.power);
        assert!(!snapshot.plc1.lamps.reverse);
    }

    #[test]
    fn test_robot_finishes_program() {
        let mut snapshot = Snapshot::default();
        snapshot.robot.total_lines = 2;
        let plant = SimulatedPlant::from_snapshot(snapshot);

        plant
            .send_command(&Command::toggle(Device::Robot, true))
            .unwrap();
        plant.fetch_status().unwrap();
        let snapshot = plant.fetch_status().unwrap();

        assert_eq!(snapshot.robot.gcode_line, 2);
        assert_eq!(snapshot.robot.state, RobotState::Finished);
        assert_eq!(snapshot.robot.percent(), 100);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let plant = SimulatedPlant::new().unwrap();
        let result = plant.send_command(&Command::new(Device::Robot, Action::Power));
        assert!(matches!(result, Err(BackendError::Rejected(_))));
    }

    #[test]
    fn test_backend_log_is_capped() {
        let plant = SimulatedPlant::new().unwrap();
        for _ in 0..150 {
            plant
                .send_command(&Command::new(Device::Mixer, Action::Restart))
                .unwrap();
        }
        assert_eq!(plant.fetch_status().unwrap().log.len(), BACKEND_LOG_CAPACITY);
    }
}
