mod browser;
mod controller;
mod state;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::interval;
use tracing::{info, warn};

pub use controller::ViewController;
pub use state::{App, FocusArea};

pub async fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(app.page_title.as_str()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let outcome = event_loop(&mut terminal, &mut app).await;

    app.controller.detach();
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    outcome
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(200));

    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => {},
            maybe_event = reader.next() => {
                if let Some(Ok(event)) = maybe_event {
                    handle_event(app, event);
                }
            }
            changed = app.state_rx.changed() => {
                if changed.is_ok() {
                    app.sync();
                }
            }
        }

        if app.should_quit {
            info!("quitting");
            return Ok(());
        }
    }
}

fn handle_event(app: &mut App, event: Event) {
    if let Event::Key(key_event) = event {
        if key_event.kind == KeyEventKind::Press {
            handle_key_event(app, key_event);
        }
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Tab => app.next_focus(),
        KeyCode::BackTab => app.previous_focus(),
        _ => match app.focus {
            FocusArea::Input => handle_input_keys(app, key),
            FocusArea::Results => handle_results_keys(app, key),
        },
    }
}

fn handle_input_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => submit(app),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(ch) => {
            if !key.modifiers.contains(KeyModifiers::ALT)
                && !key.modifiers.contains(KeyModifiers::CONTROL)
            {
                app.push_char(ch);
            }
        }
        _ => {}
    }
}

fn handle_results_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Char('i') => app.controller.toggle_info_panel(),
        KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
        _ => {}
    }
}

fn submit(app: &App) {
    if app.view.lifecycle.submit_control().disabled {
        return;
    }
    tokio::spawn(app.controller.submit_query());
}

fn open_selected(app: &App) {
    let Some(url) = app
        .selected_recommendation()
        .and_then(|item| item.listen_link())
        .map(str::to_owned)
    else {
        return;
    };

    tokio::task::spawn_blocking(move || {
        if let Err(err) = browser::open_link(&url) {
            warn!("failed to open {url}: {err:#}");
        }
    });
}
