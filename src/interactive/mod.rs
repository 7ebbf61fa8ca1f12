use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, poll,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::Config;

mod application;
mod constants;
pub mod domain;
pub mod ui;

#[cfg(test)]
mod test_support;

use self::application::{fetch_service::FetchService, outbound};
use self::constants::{INPUT_POLL_INTERVAL, REDRAW_INTERVAL};
use self::ui::{
    app_state::{AppState, Settings},
    commands::Command,
    events::Message,
    renderer::Renderer,
};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// The event loop: one task owns the state and applies messages from the
/// input reader, the fetch tasks and the timers in arrival order.
pub struct InteractiveApp {
    state: AppState,
    renderer: Renderer,
    fetcher: FetchService,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl InteractiveApp {
    pub fn new(config: &Config, backend: Arc<dyn Backend>) -> Self {
        let settings = Settings::from_config(config, backend.name(), backend.indices());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(config, settings),
            renderer: Renderer::new(),
            fetcher: FetchService::new(backend),
            tx,
            rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let stop = Arc::new(AtomicBool::new(false));
        let reader = spawn_input_reader(self.tx.clone(), Arc::clone(&stop));

        let result = self.run_app(&mut terminal).await;

        stop.store(true, Ordering::Relaxed);
        self.state.requests.cancel_all();
        let cleanup = cleanup_terminal(&mut terminal);
        if reader.join().is_err() {
            warn!("input reader panicked");
        }
        info!("session ended");
        result.and(cleanup)
    }

    async fn run_app(&mut self, terminal: &mut Tui) -> Result<()> {
        let size = terminal.size().context("Failed to read terminal size")?;
        self.handle_message(Message::Resize(size.width, size.height));
        if self.handle_message(Message::Start) {
            return Ok(());
        }

        let mut redraw = tokio::time::interval(REDRAW_INTERVAL);
        redraw.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            terminal.draw(|f| self.renderer.render(f, &self.state))?;

            let message = tokio::select! {
                Some(message) = self.rx.recv() => message,
                _ = redraw.tick() => Message::Redraw,
            };
            if self.handle_message(message) {
                return Ok(());
            }
            // Apply whatever else already arrived before drawing again.
            while let Ok(message) = self.rx.try_recv() {
                if self.handle_message(message) {
                    return Ok(());
                }
            }
        }
    }

    /// Returns true once the app should exit.
    fn handle_message(&mut self, message: Message) -> bool {
        let command = self.state.update(message);
        self.execute_command(command)
    }

    fn execute_command(&mut self, command: Command) -> bool {
        match command {
            Command::None => {}
            Command::Fetch(job) => {
                self.fetcher.spawn(job, self.tx.clone());
            }
            Command::ScheduleTick(delay) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if tx.send(Message::Tick).is_err() {
                        debug!("event loop gone; dropping tick");
                    }
                });
            }
            Command::CopyToClipboard(text) => {
                if let Err(e) = outbound::copy_to_clipboard(&text) {
                    warn!(error = %e, "clipboard copy failed");
                    self.state.set_status(format!("Failed to copy: {e}"));
                }
            }
            Command::OpenUrl(url) => {
                if let Err(e) = outbound::open_url(&url) {
                    warn!(error = %e, %url, "opening browser failed");
                    self.state.set_status(format!("Failed to open browser: {e}"));
                }
            }
            Command::ApplyCredentials(credentials) => {
                self.fetcher.backend().set_credentials(credentials);
            }
            Command::Quit => return true,
            Command::Batch(commands) => {
                for command in commands {
                    if self.execute_command(command) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Blocking crossterm reads on a dedicated thread, forwarded to the loop.
fn spawn_input_reader(tx: UnboundedSender<Message>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match poll(INPUT_POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(error = %e, "polling terminal input failed");
                    break;
                }
            }
            let message = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Message::Key(key),
                Ok(Event::Mouse(mouse)) => Message::Mouse(mouse),
                Ok(Event::Resize(width, height)) => Message::Resize(width, height),
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "reading terminal input failed");
                    break;
                }
            };
            if tx.send(message).is_err() {
                break;
            }
        }
    })
}
