//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event as one line
//! through the `log` facade, prefixed with its transport tag (`IP: ` /
//! `BLE: `).  The most recent lines are also kept in memory, the way a
//! scrolling text view would show them.

use std::collections::VecDeque;

use log::log;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Lines retained by the transcript.
pub const TRANSCRIPT_LINES: usize = 256;

/// Adapter that logs every [`AppEvent`] and keeps a bounded transcript.
pub struct LogEventSink {
    transcript: VecDeque<String>,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self {
            transcript: VecDeque::with_capacity(TRANSCRIPT_LINES),
        }
    }

    /// Render one event as a single text line.
    pub fn render(event: &AppEvent) -> String {
        match event.transport() {
            Some(t) => format!("{}: {}", t.log_prefix(), event),
            None => event.to_string(),
        }
    }

    /// Retained lines, oldest first.
    pub fn transcript(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let line = Self::render(event);
        log!(event.level(), "{}", line);
        if self.transcript.len() == TRANSCRIPT_LINES {
            self.transcript.pop_front();
        }
        self.transcript.push_back(line);
    }
}
