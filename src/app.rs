//! Translator state and event handlers.
//!
//! `App` owns everything the screen shows. Handlers mutate it and return the
//! side effects the runtime has to carry out, so nothing here touches the
//! terminal, the network or a timer directly.

use std::time::Duration;

use crate::clipboard::ClipboardError;
use crate::translator::TranslationError;

pub const PLACEHOLDER: &str = "Translation will appear here...";
pub const ERROR_MESSAGE: &str = "Error: Unable to translate. Please try again.";
pub const COPIED: &str = "Translation copied to clipboard!";
pub const NOTHING_TO_COPY: &str = "Nothing to copy!";
pub const COPY_FAILED: &str = "Failed to copy. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub seq: u64,
    pub text: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Placeholder,
    Loading,
    Result(String),
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: &'static str,
}

#[derive(Debug)]
pub enum Event {
    InputChanged(String),
    SourceChanged(String),
    TargetChanged(String),
    Swap,
    Clear,
    Copy,
    Example(usize),
    DebounceElapsed(u64),
    TranslationFinished {
        seq: u64,
        result: Result<String, TranslationError>,
    },
    CopyFinished(Result<(), ClipboardError>),
    NotificationExpired(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScheduleDebounce { generation: u64 },
    CancelDebounce,
    Translate(TranslationRequest),
    CopyToClipboard(String),
    ExpireNotification { id: u64, after: Duration },
}

pub struct App {
    input: String,
    source: String,
    target: String,
    output: Output,
    char_count: usize,
    notification: Option<Notification>,
    examples: Vec<String>,
    notification_duration: Duration,
    latest_seq: u64,
    debounce_generation: u64,
    next_notification_id: u64,
}

impl App {
    pub fn new(
        source: String,
        target: String,
        examples: Vec<String>,
        notification_duration: Duration,
    ) -> Self {
        Self {
            input: String::new(),
            source,
            target,
            output: Output::Placeholder,
            char_count: 0,
            notification: None,
            examples,
            notification_duration,
            latest_seq: 0,
            debounce_generation: 0,
            next_notification_id: 0,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn is_loading(&self) -> bool {
        self.output == Output::Loading
    }

    /// Text shown in the output area.
    pub fn output_text(&self) -> &str {
        match &self.output {
            Output::Placeholder => PLACEHOLDER,
            Output::Loading => "",
            Output::Result(text) => text.as_str(),
            Output::Error => ERROR_MESSAGE,
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::InputChanged(text) => self.set_input(text),
            Event::SourceChanged(code) => {
                self.source = code;
                self.request_translation()
            }
            Event::TargetChanged(code) => {
                self.target = code;
                self.request_translation()
            }
            Event::Swap => self.swap(),
            Event::Clear => self.clear(),
            Event::Copy => self.copy(),
            Event::Example(index) => match self.examples.get(index) {
                Some(text) => {
                    let text = text.clone();
                    self.set_input(text)
                }
                None => {
                    tracing::warn!("No example at index {}", index);
                    Vec::new()
                }
            },
            Event::DebounceElapsed(generation) => {
                // A timer that fired just before a newer keystroke may still be queued.
                if generation != self.debounce_generation {
                    tracing::debug!("Ignoring stale debounce #{}", generation);
                    return Vec::new();
                }
                self.request_translation()
            }
            Event::TranslationFinished { seq, result } => {
                self.finish_translation(seq, result);
                Vec::new()
            }
            Event::CopyFinished(Ok(())) => self.notify(COPIED),
            Event::CopyFinished(Err(e)) => {
                tracing::error!("Copy failed: {}", e);
                self.notify(COPY_FAILED)
            }
            Event::NotificationExpired(id) => {
                if self.notification.as_ref().is_some_and(|n| n.id == id) {
                    self.notification = None;
                }
                Vec::new()
            }
        }
    }

    fn set_input(&mut self, text: String) -> Vec<Effect> {
        self.input = text;
        self.char_count = self.input.chars().count();
        self.debounce_generation += 1;
        vec![Effect::ScheduleDebounce {
            generation: self.debounce_generation,
        }]
    }

    fn request_translation(&mut self) -> Vec<Effect> {
        // Any answer still in flight is now out of date.
        self.latest_seq += 1;

        let text = self.input.trim();
        if text.is_empty() {
            self.output = Output::Placeholder;
            return Vec::new();
        }

        self.output = Output::Loading;
        vec![Effect::Translate(TranslationRequest {
            seq: self.latest_seq,
            text: text.to_string(),
            source: self.source.clone(),
            target: self.target.clone(),
        })]
    }

    fn finish_translation(&mut self, seq: u64, result: Result<String, TranslationError>) {
        if seq != self.latest_seq {
            tracing::debug!("Discarding stale translation #{} (latest #{})", seq, self.latest_seq);
            return;
        }
        self.output = match result {
            Ok(text) => Output::Result(text),
            Err(e) => {
                tracing::error!("Translation error: {}", e);
                Output::Error
            }
        };
    }

    fn swap(&mut self) -> Vec<Effect> {
        std::mem::swap(&mut self.source, &mut self.target);
        match &self.output {
            Output::Result(text) if !text.is_empty() => {
                let text = text.clone();
                self.set_input(text)
            }
            _ => Vec::new(),
        }
    }

    fn clear(&mut self) -> Vec<Effect> {
        self.input.clear();
        self.char_count = 0;
        self.output = Output::Placeholder;
        self.latest_seq += 1;
        self.debounce_generation += 1;
        vec![Effect::CancelDebounce]
    }

    fn copy(&mut self) -> Vec<Effect> {
        match &self.output {
            Output::Result(text) if !text.is_empty() => vec![Effect::CopyToClipboard(text.clone())],
            Output::Error => vec![Effect::CopyToClipboard(ERROR_MESSAGE.to_string())],
            _ => self.notify(NOTHING_TO_COPY),
        }
    }

    fn notify(&mut self, message: &'static str) -> Vec<Effect> {
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notification = Some(Notification { id, message });
        vec![Effect::ExpireNotification {
            id,
            after: self.notification_duration,
        }]
    }
}
