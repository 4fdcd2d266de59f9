//! Terminal UI
//!
//! [`run_picker`] owns the terminal and the picker's message loop. Key events
//! are read on a blocking thread and posted to the same channel background
//! navigation tasks report on, so the picker only ever sees one message at a
//! time.

pub mod picker;
pub mod theme;

pub use theme::Theme;

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::debug;

use crate::picker::{Message, Picker, PickerOutcome};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(100);

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the picker until it is done and return how it ended
pub async fn run_picker(picker: Picker) -> Result<PickerOutcome> {
    let mut terminal = init_terminal()?;
    let mut picker = picker;

    let result = run_event_loop(&mut terminal, &mut picker).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result.map(|_| picker.into_outcome())
}

async fn run_event_loop(terminal: &mut Tui, picker: &mut Picker) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Message>(64);

    // key reader; stops once the loop below drops the receiver
    let key_tx = tx.clone();
    tokio::task::spawn_blocking(move || {
        while !key_tx.is_closed() {
            match event::poll(TICK_RATE) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key_tx.blocking_send(Message::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    while !picker.is_done() {
        terminal.draw(|frame| self::picker::render(frame, picker))?;

        let Some(message) = rx.recv().await else {
            break;
        };

        let mut next = picker.update(message);
        while let Some(task) = next.take() {
            if task.blocking {
                terminal.draw(|frame| self::picker::render(frame, picker))?;
                let message = task.future.await;
                next = picker.update(message);
            } else {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(task.future.await).await;
                });
            }
        }
    }

    debug!(outcome = ?picker.outcome(), "picker finished");
    Ok(())
}
