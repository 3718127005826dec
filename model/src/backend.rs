use crate::command::Command;
use crate::snapshot::Snapshot;

/// Path of the status endpoint, relative to the backend base URL.
pub const STATUS_PATH: &str = "/api/data";

/// Any failure to obtain a snapshot from the backend.
///
/// The renderer treats all variants the same way; they only differ in what
/// ends up in the process log.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend answered with http status {0}")]
    Status(u16),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
}

/// The source of status snapshots and the sink of operator commands.
pub trait StatusBackend {
    /// Fetches the current status document.
    fn fetch_status(&self) -> Result<Snapshot, BackendError>;

    /// Sends `command` and returns the updated status document.
    fn send_command(&self, command: &Command) -> Result<Snapshot, BackendError>;
}

pub type StatusBackendPointer = Box<dyn StatusBackend + Send>;
