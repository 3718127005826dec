use serde::Serialize;

/// A monitored unit of the production line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Device {
    Conveyor,
    Mixer,
    Packer,
    Robot,
}

impl Device {
    pub const ALL: [Device; 4] = [Device::Conveyor, Device::Mixer, Device::Packer, Device::Robot];

    /// The key of the device in the status document.
    pub fn key(self) -> &'static str {
        match self {
            Device::Conveyor => "plc1",
            Device::Mixer => "plc2",
            Device::Packer => "plc3",
            Device::Robot => "robot",
        }
    }

    /// Human readable name used in log messages.
    pub fn label(self) -> &'static str {
        match self {
            Device::Conveyor => "Conveyor",
            Device::Mixer => "Mixer",
            Device::Packer => "Packer",
            Device::Robot => "Robot",
        }
    }

    /// Path of the command endpoint, relative to the backend base URL.
    pub fn command_path(self) -> String {
        format!("/api/{}/button", self.key())
    }

    /// Whether the device has a control for `action`.
    pub fn accepts(self, action: Action) -> bool {
        match self {
            Device::Conveyor => matches!(action, Action::Power | Action::Forward | Action::Reverse),
            _ => matches!(action, Action::Toggle | Action::Restart | Action::Skip),
        }
    }
}

/// An operator action, as understood by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Power,
    Forward,
    Reverse,
    Toggle,
    Restart,
    Skip,
}

impl Action {
    pub fn wire_name(self) -> &'static str {
        match self {
            Action::Power => "encender",
            Action::Forward => "adelante",
            Action::Reverse => "reversa",
            Action::Toggle => "toggle",
            Action::Restart => "reiniciar",
            Action::Skip => "skip",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "encender" => Some(Action::Power),
            "adelante" => Some(Action::Forward),
            "reversa" => Some(Action::Reverse),
            "toggle" => Some(Action::Toggle),
            "reiniciar" => Some(Action::Restart),
            "skip" => Some(Action::Skip),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Power => "power",
            Action::Forward => "forward",
            Action::Reverse => "reverse",
            Action::Toggle => "toggle",
            Action::Restart => "restart",
            Action::Skip => "skip",
        }
    }
}

/// A command addressed to one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    pub device: Device,
    pub action: Action,
    /// The state the operator asks for. Only sent on the wire for toggles.
    pub new_state: Option<bool>,
}

/// The JSON body posted to a command endpoint.
#[derive(Serialize, Debug, PartialEq)]
pub struct CommandPayload {
    pub action: &'static str,
    #[serde(rename = "newState", skip_serializing_if = "Option::is_none")]
    pub new_state: Option<bool>,
}

impl Command {
    pub fn new(device: Device, action: Action) -> Self {
        Self {
            device,
            action,
            new_state: None,
        }
    }

    pub fn toggle(device: Device, new_state: bool) -> Self {
        Self {
            device,
            action: Action::Toggle,
            new_state: Some(new_state),
        }
    }

    pub fn power(on: bool) -> Self {
        Self {
            device: Device::Conveyor,
            action: Action::Power,
            new_state: Some(on),
        }
    }

    pub fn payload(&self) -> CommandPayload {
        CommandPayload {
            action: self.action.wire_name(),
            new_state: match self.action {
                Action::Toggle => self.new_state,
                _ => None,
            },
        }
    }

    /// The line written to the operator log when the command is issued.
    pub fn describe(&self) -> String {
        let device = self.device.label().to_lowercase();
        match (self.action, self.new_state) {
            (Action::Toggle, Some(true)) => format!("Command: resume {device}"),
            (Action::Toggle, Some(false)) => format!("Command: pause {device}"),
            (Action::Power, Some(true)) => format!("Command: switch {device} on"),
            (Action::Power, Some(false)) => format!("Command: switch {device} off"),
            (action, _) => format!("Command: {} {device}", action.label()),
        }
    }

    /// The line written to the operator log when the command request fails.
    pub fn failure_message(&self) -> String {
        format!(
            "Failed to send {} command to {}",
            self.action.label(),
            self.device.label().to_lowercase()
        )
    }
}
