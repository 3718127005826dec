pub mod backend;
pub mod config;
pub mod webcam;
pub mod worker;

pub use backend::build_backend;
pub use config::{ConfigError, DashboardConfig};
pub use webcam::{build_webcam, save_capture, Webcam, WebcamError, WebcamPointer};
pub use worker::{BackendWorker, Reply, Request, WebcamReply, WebcamRequest};

#[cfg(feature = "http")]
pub use webcam::WebcamClient;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Convenience helper for passing values from one thread to another. For example from the
/// thread talking to the backend to the UI thread, which drains it from a timer.
///
/// Unlike a channel both ends are the same type, so it can be cloned freely into closures.
pub struct Mailbox<T>(Arc<Mutex<VecDeque<T>>>);

// Both ends share the queue, the values themselves are never cloned.
impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self(Arc::default())
    }
}

impl<T> Mailbox<T> {
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // A panicking producer must not take the UI down with it.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value` behind everything posted before.
    pub fn push(&self, value: T) {
        self.lock().push_back(value);
    }

    /// Takes all posted values, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scada_dashboard_model::{BackendError, Command, Device};

    #[test]
    fn test_mailbox_keeps_order() {
        let mailbox = Mailbox::default();
        let sender = mailbox.clone();
        std::thread::spawn(move || {
            for i in 0..3 {
                sender.push(i);
            }
        })
        .join()
        .unwrap();

        assert!(!mailbox.is_empty());
        assert_eq!(mailbox.drain(), vec![0, 1, 2]);
        assert!(mailbox.is_empty());
        assert!(mailbox.drain().is_empty());
    }

    #[test]
    fn test_mailbox_shares_replies() {
        // Replies carry errors and cannot be cloned, the mailbox still can.
        let replies: Mailbox<Reply> = Mailbox::default();
        let sender = replies.clone();
        std::thread::spawn(move || {
            sender.push(Reply::Status(Err(BackendError::Status(503))));
            sender.push(Reply::Command(
                Command::toggle(Device::Robot, true),
                Err(BackendError::Transport("refused".into())),
            ));
        })
        .join()
        .unwrap();

        let replies = replies.drain();
        assert_eq!(replies.len(), 2);
        assert!(matches!(replies[0], Reply::Status(Err(BackendError::Status(503)))));
        assert!(matches!(&replies[1], Reply::Command(c, Err(_)) if c.device == Device::Robot));
    }
}
