// Diagnostic sinks: where advisory messages are delivered

use std::sync::{Mutex, MutexGuard};

/// Receiver of formatted diagnostic messages.
///
/// Any `Fn(&str)` closure is a sink, so tests and embedders can capture
/// messages without a dedicated type.
pub trait DiagnosticSink {
    fn report(&self, message: &str);
}

impl<F: Fn(&str)> DiagnosticSink for F {
    fn report(&self, message: &str) {
        self(message)
    }
}

/// The default sink: forwards every message to `tracing` at WARN level
/// under the `misprint` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, message: &str) {
        tracing::warn!(target: "misprint", "{message}");
    }
}

/// Buffers messages in memory. Safe to share between threads.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages received so far.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Drain and return the buffered messages.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Check whether any buffered message contains `part`.
    pub fn contains(&self, part: &str) -> bool {
        self.lock().iter().any(|m| m.contains(part))
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A panicking reporter cannot leave the Vec half-written.
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}

/// Prepends an identity such as `Calling foo(): ` to each message before
/// handing it to the inner sink.
pub struct Prefixed<'a> {
    prefix: String,
    inner: &'a dyn DiagnosticSink,
}

impl<'a> Prefixed<'a> {
    pub fn new(prefix: impl Into<String>, inner: &'a dyn DiagnosticSink) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }

    /// Prefix used when intercepting a function call.
    pub fn calling(function: &str, inner: &'a dyn DiagnosticSink) -> Self {
        Self::new(format!("Calling {function}(): "), inner)
    }

    /// Prefix used when intercepting a construction.
    pub fn creating(instance: &str, inner: &'a dyn DiagnosticSink) -> Self {
        Self::new(format!("Creating {instance}: "), inner)
    }
}

impl DiagnosticSink for Prefixed<'_> {
    fn report(&self, message: &str) {
        self.inner.report(&format!("{}{}", self.prefix, message));
    }
}
