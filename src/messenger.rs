// 💬 Messenger - where human-readable migration messages go
// The CLI prints them, the web server collects them for the result page.

use crate::batch::BatchState;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Status,
    Warning,
    Error,
}

impl MessageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLevel::Status => "status",
            MessageLevel::Warning => "warning",
            MessageLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

pub trait Messenger {
    fn add(&self, level: MessageLevel, text: String);

    fn add_status(&self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.add(MessageLevel::Status, text.into());
    }

    fn add_warning(&self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.add(MessageLevel::Warning, text.into());
    }

    fn add_error(&self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.add(MessageLevel::Error, text.into());
    }

    /// Called after every chunk; silent unless the surface shows progress
    fn progress(&self, _state: &BatchState) {}
}

// ============================================================================
// CONSOLE
// ============================================================================

/// Prints every message (and per-chunk progress) to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleMessenger;

impl Messenger for ConsoleMessenger {
    fn add(&self, level: MessageLevel, text: String) {
        match level {
            MessageLevel::Status => println!("{}", text),
            MessageLevel::Warning => println!("[warning] {}", text),
            MessageLevel::Error => println!("[error] {}", text),
        }
    }

    fn progress(&self, state: &BatchState) {
        println!(
            "Processed {} of {} users ({}%)",
            state.progress,
            state.max,
            state.percent()
        );
    }
}

// ============================================================================
// COLLECTING
// ============================================================================

/// Keeps messages in memory until the caller drains them
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<Message>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|mut m| std::mem::take(&mut *m))
            .unwrap_or_default()
    }

    pub fn texts(&self, level: MessageLevel) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.level == level)
            .map(|m| m.text)
            .collect()
    }
}

impl Messenger for MessageLog {
    fn add(&self, level: MessageLevel, text: String) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(Message { level, text });
        }
    }
}
