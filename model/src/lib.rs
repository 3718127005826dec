//! Data model and change-driven rendering of the production line dashboard.
//!
//! Nothing in here knows about a concrete UI toolkit or HTTP client. Front
//! ends implement [`View`] and back ends implement [`StatusBackend`].

pub mod backend;
pub mod command;
pub mod logpanel;
pub mod renderer;
pub mod snapshot;
pub mod timers;
pub mod view;

pub use backend::{BackendError, StatusBackend, StatusBackendPointer, STATUS_PATH};
pub use command::{Action, Command, CommandPayload, Device};
pub use logpanel::{LogEntry, LogLevel, LogPanel, LOG_CAPACITY};
pub use renderer::{Renderer, COMMUNICATION_ERROR};
pub use snapshot::{
    ConveyorButtons, ConveyorLamps, ConveyorStatus, RobotState, RobotStatus, Snapshot,
    StationButtons, StationLamps, StationStatus,
};
pub use timers::{format_elapsed, TimerChange, TimerRegistry};
pub use view::{EfficiencyLevel, Lamp, View, ViewUpdate};
