// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

mod view;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use slint::ComponentHandle as _;

use scada_dashboard_common::{
    build_backend, build_webcam, BackendWorker, DashboardConfig, Mailbox, Reply, WebcamReply,
    WebcamRequest,
};
use scada_dashboard_model::{Action, BackendError, Device, LogLevel, Renderer};

use view::SlintView;

/// The renderer together with the view it renders into. Both live on the UI thread.
struct Dashboard {
    renderer: Renderer,
    view: SlintView,
}

impl Dashboard {
    /// Handles a button press.
    fn press(&mut self, worker: &BackendWorker, device: Device, action: Action) {
        let Some(command) = self.renderer.command(device, action) else {
            log::warn!("{} has no {} control", device.label(), action.label());
            return;
        };

        self.renderer.begin_command(&mut self.view, &command);
        if !worker.send_command(command) {
            let err = BackendError::Transport("backend worker stopped".into());
            self.renderer.finish_command(&mut self.view, &command, Err(err));
        }
    }

    fn handle_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Status(result) => self.renderer.handle_status(&mut self.view, result),
            Reply::Command(command, result) => {
                self.renderer
                    .finish_command(&mut self.view, &command, result)
            }
            Reply::Webcam(reply) => self.handle_webcam(reply),
        }
    }

    fn handle_webcam(&mut self, reply: WebcamReply) {
        match reply {
            WebcamReply::Status(active) => self.view.set_webcam_active(active),
            WebcamReply::Started => {
                self.view.set_webcam_active(true);
                self.renderer
                    .log_event(&mut self.view, LogLevel::Info, "Webcam started");
            }
            WebcamReply::Stopped => {
                self.view.set_webcam_active(false);
                self.renderer
                    .log_event(&mut self.view, LogLevel::Info, "Webcam stopped");
            }
            WebcamReply::Captured(path) => {
                log::info!("capture written to {}", path.display());
                self.view.set_last_capture(&path);
                self.renderer
                    .log_event(&mut self.view, LogLevel::Success, "Image captured");
            }
            WebcamReply::Failed(request, err) => {
                log::error!("webcam {request:?} failed: {err}");
                let message = match request {
                    WebcamRequest::Status => "Cannot read the webcam status",
                    WebcamRequest::Start => "Failed to start the webcam",
                    WebcamRequest::Stop => "Failed to stop the webcam",
                    WebcamRequest::Capture => "Failed to capture an image",
                };
                self.renderer
                    .log_event(&mut self.view, LogLevel::Error, message);
            }
        }
    }
}

/// Our App struct that holds the UI, the renderer and the backend worker.
///
/// Three timers drive it: one requests a status read every poll interval, one
/// advances the operation timers every second and one hands the replies of the
/// backend worker over to the renderer.
struct App {
    ui: AppWindow,
    config: DashboardConfig,
    dashboard: Rc<RefCell<Dashboard>>,
    worker: Rc<BackendWorker>,
    replies: Mailbox<Reply>,
    has_webcam: bool,
    poll_timer: slint::Timer,
    clock_timer: slint::Timer,
    pump_timer: slint::Timer,
}

impl App {
    const CLOCK_INTERVAL: Duration = Duration::from_secs(1);
    const PUMP_INTERVAL: Duration = Duration::from_millis(50);

    /// Create a new App struct.
    ///
    /// Without a configured backend URL the dashboard runs against the simulated plant.
    fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        let backend = build_backend(&config)?;
        let webcam = build_webcam(&config);
        let has_webcam = webcam.is_some();

        let replies = Mailbox::default();
        let worker = BackendWorker::spawn(
            backend,
            webcam,
            config.capture_dir.clone(),
            replies.clone(),
        )?;

        let dashboard = Dashboard {
            renderer: Renderer::new(),
            view: SlintView::new(&ui),
        };

        Ok(Self {
            ui,
            config,
            dashboard: Rc::new(RefCell::new(dashboard)),
            worker: Rc::new(worker),
            replies,
            has_webcam,
            poll_timer: slint::Timer::default(),
            clock_timer: slint::Timer::default(),
            pump_timer: slint::Timer::default(),
        })
    }

    /// Wire the buttons of the view model to the backend worker.
    fn connect_callbacks(&self) {
        let model = self.ui.global::<ViewModel>();

        let dashboard = self.dashboard.clone();
        let worker = self.worker.clone();
        model.on_command(move |machine, control| {
            dashboard
                .borrow_mut()
                .press(&worker, machine.into(), control.into());
        });

        let dashboard = self.dashboard.clone();
        model.on_clear_log(move || {
            let mut dashboard = dashboard.borrow_mut();
            let Dashboard { renderer, view } = &mut *dashboard;
            renderer.clear_log(view);
        });

        let worker = self.worker.clone();
        model.on_webcam_start(move || {
            worker.webcam(WebcamRequest::Start);
        });

        let worker = self.worker.clone();
        model.on_webcam_stop(move || {
            worker.webcam(WebcamRequest::Stop);
        });

        let worker = self.worker.clone();
        model.on_webcam_capture(move || {
            worker.webcam(WebcamRequest::Capture);
        });
    }

    /// Run the App, start the timers and request the first status read.
    fn run(&mut self) -> anyhow::Result<()> {
        self.connect_callbacks();

        let worker = self.worker.clone();
        self.poll_timer.start(
            slint::TimerMode::Repeated,
            self.config.poll_interval,
            move || {
                worker.poll();
            },
        );

        let dashboard = self.dashboard.clone();
        self.clock_timer
            .start(slint::TimerMode::Repeated, Self::CLOCK_INTERVAL, move || {
                let mut dashboard = dashboard.borrow_mut();
                let Dashboard { renderer, view } = &mut *dashboard;
                renderer.tick(view);
            });

        let dashboard = self.dashboard.clone();
        let replies = self.replies.clone();
        self.pump_timer
            .start(slint::TimerMode::Repeated, Self::PUMP_INTERVAL, move || {
                for reply in replies.drain() {
                    dashboard.borrow_mut().handle_reply(reply);
                }
            });

        // Render right away instead of waiting for the first poll interval.
        self.worker.poll();
        if self.has_webcam {
            self.worker.webcam(WebcamRequest::Status);
        }

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }
}

/// A minimal main function that reads the configuration, initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    log::info!("starting with {config:?}");

    let mut app = App::new(config)?;

    app.run()
}
