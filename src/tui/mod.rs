//! Interactive terminal console.
//!
//! - `app`: console state, key handling and remote jobs
//! - `ui`: layout and widgets
//! - `mod.rs` (this file): terminal lifecycle and the event loop
//!
//! # Event Loop
//!
//! Each frame the loop hands queued jobs to worker threads, draws, polls
//! for one input event, applies every finished job received over the
//! channel and advances the refresh timer. Workers never touch console
//! state; they only send a [`JobResult`] back.

mod app;
mod ui;

pub use app::{ConsoleApp, Focus, Job, JobResult, View};

use crate::api::{CrudApi, HttpClient, ResourceApi};
use crate::config::Config;
use crate::error::{BackstageError, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Target frames per second for the render loop.
const TARGET_FPS: u64 = 10;

const FRAME_DURATION: Duration = Duration::from_millis(1000 / TARGET_FPS);

type ConsoleTerminal = Terminal<CrosstermBackend<Stdout>>;

pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Error types for the terminal console.
#[derive(Debug)]
pub enum ConsoleError {
    /// IO error from terminal operations
    Io(io::Error),
    /// Error from API or config operations
    Backstage(BackstageError),
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::Io(e) => write!(f, "IO error: {}", e),
            ConsoleError::Backstage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        ConsoleError::Io(err)
    }
}

impl From<BackstageError> for ConsoleError {
    fn from(err: BackstageError) -> Self {
        ConsoleError::Backstage(err)
    }
}

impl From<ConsoleError> for BackstageError {
    fn from(err: ConsoleError) -> Self {
        match err {
            ConsoleError::Io(io_err) => BackstageError::Io(io_err),
            ConsoleError::Backstage(err) => err,
        }
    }
}

/// Initialize the terminal for TUI mode.
pub fn init_terminal() -> ConsoleResult<ConsoleTerminal> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(terminal: &mut ConsoleTerminal) -> ConsoleResult<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the console against the configured API until the user quits.
pub fn run_console(config: &Config) -> Result<()> {
    let http = HttpClient::new(&config.api_base_url, config.token(), config.timeout())?;
    let api: Arc<dyn CrudApi + Send + Sync> = Arc::new(ResourceApi::article(http));

    // Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = init_terminal()?;
    let mut app = ConsoleApp::new(config);
    info!(api = %config.api_base_url, "console started");

    let outcome = event_loop(&mut terminal, &mut app, api);
    restore_terminal(&mut terminal)?;
    info!("console stopped");
    Ok(outcome?)
}

fn event_loop(
    terminal: &mut ConsoleTerminal,
    app: &mut ConsoleApp,
    api: Arc<dyn CrudApi + Send + Sync>,
) -> ConsoleResult<()> {
    let (tx, rx) = mpsc::channel();
    app.set_viewport_width(terminal.size()?.width);

    loop {
        dispatch_jobs(app, &api, &tx);
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                // Only key presses; release and repeat events are ignored.
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                Event::Resize(width, _) => app.set_viewport_width(width),
                _ => {}
            }
        }

        drain_results(app, &rx);
        app.tick(Instant::now());

        if app.should_quit() {
            return Ok(());
        }
    }
}

fn dispatch_jobs(app: &mut ConsoleApp, api: &Arc<dyn CrudApi + Send + Sync>, tx: &Sender<JobResult>) {
    for job in app.take_jobs() {
        debug!(view = job.view(), "dispatching job");
        let api = Arc::clone(api);
        let tx = tx.clone();
        thread::spawn(move || {
            // The receiver is gone once the console has quit.
            let _ = tx.send(job.run(api.as_ref()));
        });
    }
}

fn drain_results(app: &mut ConsoleApp, rx: &Receiver<JobResult>) {
    while let Ok(result) = rx.try_recv() {
        app.apply(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::full_permissions;
    use std::sync::Mutex;

    /// Thread-safe stand-in for the HTTP API.
    struct StaticApi {
        calls: Mutex<usize>,
    }

    impl CrudApi for StaticApi {
        fn list(&self, _query: &crate::api::FormData) -> Result<crate::api::PageResult> {
            *self.calls.lock().unwrap() += 1;
            Ok(crate::api::PageResult::default())
        }
        fn get_by_id(&self, id: &str) -> Result<crate::api::FormData> {
            Err(crate::error::BackstageError::NotFound(id.to_string()))
        }
        fn create(&self, _record: &crate::api::FormData) -> Result<crate::api::ApiMessage> {
            Ok(crate::api::ApiMessage::ok(""))
        }
        fn update(
            &self,
            _id: &str,
            _record: &crate::api::FormData,
        ) -> Result<crate::api::ApiMessage> {
            Ok(crate::api::ApiMessage::ok(""))
        }
        fn delete(&self, _id: &str) -> Result<crate::api::ApiMessage> {
            Ok(crate::api::ApiMessage::ok(""))
        }
    }

    #[test]
    fn test_console_error_display() {
        let io_err = ConsoleError::Io(io::Error::new(io::ErrorKind::Other, "test error"));
        assert!(io_err.to_string().contains("IO error"));
        assert!(io_err.to_string().contains("test error"));

        let converted: BackstageError = ConsoleError::Backstage(BackstageError::Http("down".into())).into();
        assert!(matches!(converted, BackstageError::Http(_)));
    }

    #[test]
    fn test_jobs_round_trip_through_worker_threads() {
        let config = Config {
            permissions: full_permissions()
                .sorted()
                .into_iter()
                .map(str::to_string)
                .collect(),
            home_route: crate::menu::ARTICLE_ROUTE.to_string(),
            ..Default::default()
        };
        let mut app = ConsoleApp::new(&config);
        let api_impl = Arc::new(StaticApi {
            calls: Mutex::new(0),
        });
        let api: Arc<dyn CrudApi + Send + Sync> = api_impl.clone();
        let (tx, rx) = mpsc::channel();

        dispatch_jobs(&mut app, &api, &tx);
        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        app.apply(result);
        drain_results(&mut app, &rx);

        assert_eq!(*api_impl.calls.lock().unwrap(), 1);
        match app.active_view() {
            Some(View::List(v)) => assert!(!v.page.is_loading()),
            other => panic!("expected list view, got {:?}", other),
        }
    }
}
