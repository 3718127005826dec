use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use scada_dashboard_model::{BackendError, Command, Snapshot, StatusBackendPointer};

use crate::webcam::{save_capture, WebcamError, WebcamPointer};
use crate::Mailbox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebcamRequest {
    Status,
    Start,
    Stop,
    Capture,
}

#[derive(Debug)]
pub enum WebcamReply {
    Status(bool),
    Started,
    Stopped,
    /// The capture was written to this file.
    Captured(PathBuf),
    Failed(WebcamRequest, WebcamError),
}

/// Work for the backend thread.
#[derive(Debug)]
pub enum Request {
    Status,
    Command(Command),
    Webcam(WebcamRequest),
}

/// Answers of the backend thread, posted in request order.
#[derive(Debug)]
pub enum Reply {
    Status(Result<Snapshot, BackendError>),
    Command(Command, Result<Snapshot, BackendError>),
    Webcam(WebcamReply),
}

/// Runs all backend requests on one background thread, so a slow backend never
/// blocks the UI and replies arrive in the order the requests were made.
pub struct BackendWorker {
    tx: mpsc::Sender<Request>,
    poll_pending: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

struct WorkerState {
    backend: StatusBackendPointer,
    webcam: Option<WebcamPointer>,
    capture_dir: PathBuf,
    poll_pending: Arc<AtomicBool>,
    replies: Mailbox<Reply>,
}

impl WorkerState {
    fn run(self, rx: mpsc::Receiver<Request>) {
        log::info!("backend worker started");
        while let Ok(request) = rx.recv() {
            let reply = self.handle(request);
            self.replies.push(reply);
        }
        log::info!("backend worker stopped");
    }

    fn handle(&self, request: Request) -> Reply {
        match request {
            Request::Status => {
                // Polls requested from now on need a fresh read.
                self.poll_pending.store(false, Ordering::SeqCst);
                Reply::Status(self.backend.fetch_status())
            }
            Request::Command(command) => {
                let result = self.backend.send_command(&command);
                Reply::Command(command, result)
            }
            Request::Webcam(request) => {
                let reply = self
                    .webcam(request)
                    .unwrap_or_else(|err| WebcamReply::Failed(request, err));
                Reply::Webcam(reply)
            }
        }
    }

    fn webcam(&self, request: WebcamRequest) -> Result<WebcamReply, WebcamError> {
        let Some(webcam) = &self.webcam else {
            return Err(WebcamError::Rejected("no webcam available".into()));
        };
        Ok(match request {
            WebcamRequest::Status => WebcamReply::Status(webcam.status()?),
            WebcamRequest::Start => {
                webcam.start()?;
                WebcamReply::Started
            }
            WebcamRequest::Stop => {
                webcam.stop()?;
                WebcamReply::Stopped
            }
            WebcamRequest::Capture => {
                let jpeg = webcam.capture()?;
                WebcamReply::Captured(save_capture(&self.capture_dir, &jpeg)?)
            }
        })
    }
}

impl BackendWorker {
    /// Starts the worker thread. Every reply is pushed to `replies`.
    pub fn spawn(
        backend: StatusBackendPointer,
        webcam: Option<WebcamPointer>,
        capture_dir: PathBuf,
        replies: Mailbox<Reply>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let poll_pending = Arc::new(AtomicBool::new(false));

        let state = WorkerState {
            backend,
            webcam,
            capture_dir,
            poll_pending: poll_pending.clone(),
            replies,
        };

        let handle = thread::Builder::new()
            .name("backend".into())
            .spawn(move || state.run(rx))?;

        Ok(Self {
            tx,
            poll_pending,
            handle,
        })
    }

    fn send(&self, request: Request) -> bool {
        match self.tx.send(request) {
            Ok(()) => true,
            Err(err) => {
                log::error!("backend worker is gone, dropping {:?}", err.0);
                false
            }
        }
    }

    /// Requests a status read unless one is already queued.
    pub fn poll(&self) -> bool {
        if self.poll_pending.swap(true, Ordering::SeqCst) {
            log::trace!("status read already pending");
            return false;
        }
        self.send(Request::Status)
    }

    pub fn send_command(&self, command: Command) -> bool {
        self.send(Request::Command(command))
    }

    pub fn webcam(&self, request: WebcamRequest) -> bool {
        self.send(Request::Webcam(request))
    }

    /// Lets the worker finish the queued requests and waits for it.
    pub fn shutdown(self) {
        drop(self.tx);
        if self.handle.join().is_err() {
            log::error!("backend worker panicked");
        }
    }
}
