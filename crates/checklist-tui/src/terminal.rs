//! Terminal driver for running one session locally.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering.

use std::io::{self, Stdout, stdout};

use checklist_app::{Driver, KeyInput, SessionEvent};
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    text::Text,
    widgets::{Paragraph, Wrap},
};
use thiserror::Error;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    stopped: bool,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, stopped: false })
    }

    /// Initial terminal dimensions (columns, rows).
    pub fn size(&self) -> Result<(u16, u16), TerminalError> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }
}

/// Convert a crossterm key press to `KeyInput`.
pub fn convert_key(event: KeyEvent) -> Option<KeyInput> {
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(event.code, KeyCode::Char('c')).then_some(KeyInput::Interrupt);
    }

    match event.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Backspace => Some(KeyInput::Backspace),
        KeyCode::Tab => Some(KeyInput::Tab),
        KeyCode::Esc => Some(KeyInput::Esc),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        _ => None,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<SessionEvent>, Self::Error> {
        loop {
            match self.event_stream.next().await {
                Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                    if let Some(key) = convert_key(key_event) {
                        return Ok(Some(SessionEvent::Key(key)));
                    }
                },
                Some(Ok(Event::Resize(cols, rows))) => {
                    return Ok(Some(SessionEvent::Resize(cols, rows)));
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(TerminalError::Io(e)),
                None => return Ok(None),
            }
        }
    }

    async fn render(&mut self, frame: &Text<'_>) -> Result<(), Self::Error> {
        let paragraph = Paragraph::new(frame.clone()).wrap(Wrap { trim: false });
        self.terminal.draw(|f| f.render_widget(paragraph, f.area()))?;
        Ok(())
    }

    fn stop(&mut self) {
        if std::mem::replace(&mut self.stopped, true) {
            return;
        }
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
