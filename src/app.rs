//! Application runtime for spl-gui
//!
//! The thread that builds an [`Application`] becomes the UI thread: it owns
//! the calloop event loop and every widget. The user's program runs on a
//! worker thread and talks to the UI thread through a [`Gui`] context.

use crate::config::GuiConfig;
use crate::dispatch::Dispatcher;
use crate::error::{GuiError, Result};
use crate::thread::{WorkerState, WorkerThread};
use crate::widget::headless::HeadlessTextEdit;
use crate::widget::{ColorChooser, ColorDialogBackend, TextArea};
use calloop::{EventLoop, LoopSignal};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Initialize env_logger, honoring `RUST_LOG` over the configured filter.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &GuiConfig) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .try_init();
    if result.is_err() {
        debug!("Logger already initialized");
    }
}

/// Requests to stop the event loop, usable from any thread.
#[derive(Clone)]
pub struct ExitHandle {
    code: Arc<Mutex<Option<i32>>>,
    signal: LoopSignal,
}

impl ExitHandle {
    /// Ask the event loop to exit with `code`. The first request wins.
    pub fn exit_graphics(&self, code: i32) {
        {
            let mut requested = self.code.lock();
            if requested.is_none() {
                info!("Exit requested with code {}", code);
                *requested = Some(code);
            }
        }
        self.signal.wakeup();
    }

    pub fn requested_code(&self) -> Option<i32> {
        *self.code.lock()
    }

    fn wake(&self) {
        self.signal.wakeup();
    }
}

/// What the user's program gets to talk to the GUI.
#[derive(Clone)]
pub struct Gui {
    dispatcher: Dispatcher,
    exit: ExitHandle,
    config: Arc<GuiConfig>,
}

impl Gui {
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &GuiConfig {
        &self.config
    }

    pub fn exit_graphics(&self, code: i32) {
        self.exit.exit_graphics(code);
    }

    /// Run `f` on the UI thread and wait for it.
    pub fn run_on_ui_thread<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.dispatcher.submit_sync(f)
    }

    /// Queue `f` for the UI thread without waiting.
    pub fn run_on_ui_thread_async<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatcher.submit_async(f)
    }

    pub fn is_ui_thread(&self) -> bool {
        self.dispatcher.is_ui_thread()
    }

    pub fn is_worker_thread(&self) -> bool {
        self.dispatcher.is_worker_thread()
    }

    /// A text area with the configured font, size and wrapping.
    pub fn text_area(&self) -> Result<TextArea> {
        let metrics = self.config.font.metrics();
        let defaults = self.config.text_area.clone();
        let area = TextArea::with_rows_columns(
            &self.dispatcher,
            move || HeadlessTextEdit::new(metrics),
            defaults.rows,
            defaults.columns,
        )?;
        area.set_line_wrap(defaults.line_wrap)?;
        Ok(area)
    }

    pub fn color_chooser<B, F>(&self, make_backend: F) -> Result<ColorChooser>
    where
        B: ColorDialogBackend + 'static,
        F: FnOnce() -> B + Send + 'static,
    {
        ColorChooser::new(&self.dispatcher, make_backend)
    }
}

struct LoopState {
    dispatcher: Dispatcher,
    drained: usize,
}

pub struct Application {
    config: Arc<GuiConfig>,
    event_loop: EventLoop<'static, LoopState>,
    dispatcher: Dispatcher,
    exit: ExitHandle,
}

impl Application {
    /// Set up the event loop on the calling thread, which becomes the UI thread.
    pub fn new(config: GuiConfig) -> Result<Self> {
        let event_loop: EventLoop<'static, LoopState> = EventLoop::try_new()?;
        let (ping, ping_source) = calloop::ping::make_ping()?;
        let dispatcher = Dispatcher::new(ping);

        event_loop
            .handle()
            .insert_source(ping_source, |_, _, state: &mut LoopState| {
                match state.dispatcher.drain_all() {
                    Ok(ran) => state.drained += ran,
                    Err(e) => error!("Failed to drain dispatch queue: {}", e),
                }
            })
            .map_err(|e| GuiError::EventLoop(e.error))?;

        let exit = ExitHandle {
            code: Arc::new(Mutex::new(None)),
            signal: event_loop.get_signal(),
        };
        info!("UI thread ready");

        Ok(Self {
            config: Arc::new(config),
            event_loop,
            dispatcher,
            exit,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    pub fn gui(&self) -> Gui {
        Gui {
            dispatcher: self.dispatcher.clone(),
            exit: self.exit.clone(),
            config: Arc::clone(&self.config),
        }
    }

    /// Run `main` on the worker thread and the event loop here until done.
    ///
    /// The loop ends when `exit_graphics` is called or, with
    /// `exit_on_worker_finish`, when `main` returns. An explicit exit code
    /// wins over `main`'s return value.
    pub fn run<F>(mut self, main: F) -> Result<i32>
    where
        F: FnOnce(Gui) -> i32 + Send + 'static,
    {
        self.dispatcher.ensure_ui_thread("Application::run")?;

        let gui = self.gui();
        let finished = self.exit.clone();
        let mut worker = WorkerThread::new(self.config.worker_thread_name.clone());
        worker.start(&self.dispatcher, move || main(gui), move |_| finished.wake())?;

        let mut state = LoopState {
            dispatcher: self.dispatcher.clone(),
            drained: 0,
        };
        let timeout = Duration::from_millis(self.config.loop_timeout_ms.max(1));
        let exit_on_finish = self.config.exit_on_worker_finish;

        info!("Entering event loop");
        let pumped = loop {
            if self.exit.requested_code().is_some() {
                break Ok(());
            }
            if exit_on_finish && worker.state() == WorkerState::Finished {
                break Ok(());
            }
            if let Err(e) = self.event_loop.dispatch(Some(timeout), &mut state) {
                break Err(GuiError::from(e));
            }
        };

        // The queue is closed even when the loop failed, so no caller is left waiting.
        state.drained += self.dispatcher.drain_all()?;
        self.dispatcher.close()?;
        if let Err(e) = pumped {
            error!("Event loop failed: {}", e);
            return Err(e);
        }
        info!("Event loop finished after {} dispatched call(s)", state.drained);

        let result = if worker.state() == WorkerState::Finished {
            worker.join()
        } else {
            warn!(
                "Worker '{}' still running at exit; its UI calls will now fail",
                worker.name()
            );
            None
        };

        Ok(self.exit.requested_code().or(result).unwrap_or(0))
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if self.dispatcher.is_closed() || !self.dispatcher.is_ui_thread() {
            return;
        }
        debug!("Application dropped without finishing; closing dispatch queue");
        if let Err(e) = self.dispatcher.close() {
            error!("Failed to close dispatch queue: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::HasText;

    fn quiet_config() -> GuiConfig {
        GuiConfig {
            loop_timeout_ms: 10,
            ..GuiConfig::default()
        }
    }

    #[test]
    fn returns_worker_exit_code() {
        let app = Application::new(quiet_config()).unwrap();
        let code = app.run(|gui| {
            assert!(gui.is_worker_thread());
            assert!(!gui.is_ui_thread());
            7
        });
        assert_eq!(code.unwrap(), 7);
    }

    #[test]
    fn worker_drives_text_area() {
        let app = Application::new(quiet_config()).unwrap();
        let code = app
            .run(|gui| {
                let area = gui.text_area().unwrap();
                area.set_text("from the worker").unwrap();
                let on_ui = gui.run_on_ui_thread({
                    let d = gui.dispatcher().clone();
                    move || d.is_ui_thread()
                });
                if area.text().unwrap() == "from the worker" && on_ui.unwrap() {
                    0
                } else {
                    2
                }
            })
            .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn explicit_exit_code_wins() {
        let app = Application::new(quiet_config()).unwrap();
        let code = app
            .run(|gui| {
                gui.exit_graphics(3);
                gui.exit_graphics(4);
                0
            })
            .unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn keeps_running_after_worker_until_exit_requested() {
        let config = GuiConfig {
            exit_on_worker_finish: false,
            ..quiet_config()
        };
        let app = Application::new(config).unwrap();
        let exit = app.exit_handle();
        let code = app
            .run(move |gui| {
                let later = gui.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(50));
                    later.exit_graphics(9);
                });
                1
            })
            .unwrap();
        assert_eq!(code, 9);
        assert_eq!(exit.requested_code(), Some(9));
    }

    #[test]
    fn dropping_without_run_disconnects_callers() {
        let app = Application::new(quiet_config()).unwrap();
        let gui = app.gui();
        let pending = gui.run_on_ui_thread_async(|| {});
        assert!(pending);
        drop(app);
        assert!(gui.dispatcher().is_closed());

        let (tx, rx) = crossbeam_channel::bounded(1);
        let remote = gui.clone();
        std::thread::spawn(move || {
            let _ = tx.send(remote.run_on_ui_thread(|| 1));
        });
        let outcome = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("caller still blocked after the application was dropped");
        assert!(matches!(outcome, Err(GuiError::Disconnected)));
    }

    #[test]
    fn panicking_main_reports_failure() {
        let app = Application::new(quiet_config()).unwrap();
        let code = app.run(|_| panic!("student error")).unwrap();
        assert_eq!(code, crate::thread::PANIC_EXIT_CODE);
    }
}
