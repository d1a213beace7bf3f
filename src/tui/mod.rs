mod app;
pub mod input;
mod message;
mod ui;

use crate::config::Config;
use crate::sources::TabSource;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;

pub use app::{App, PAGE_STEP, SPINNER_FRAMES};
pub use message::Message;
pub use ui::{format_last_accessed, truncate_to_width};

pub async fn run(config: Config, source: Arc<dyn TabSource>) -> Result<()> {
    if !std::io::IsTerminal::is_terminal(&io::stdout()) {
        anyhow::bail!("tabscope requires an interactive terminal; use `tabscope list` instead");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, source);

    // UI shows immediately with loading state
    app.update(Message::Refresh);

    let result = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = std::time::Instant::now();
    let mut input_state = input::InputState::new();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let msg = input::dispatch(app, &mut input_state, key);
                    if app.update(msg) {
                        return Ok(());
                    }
                }
            }
        }

        if input_state.has_timed_out() {
            input_state.clear();
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick_spinner();
            app.poll_pending();
            last_tick = std::time::Instant::now();
        }

        // Let the background operation make progress between frames
        tokio::task::yield_now().await;
    }
}
