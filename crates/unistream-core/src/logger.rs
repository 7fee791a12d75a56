//! Context-tagged logger
//!
//! Every adapter and the player own one `Logger` created on construction.
//! Messages go to `tracing` with a `context` field naming the owner; debug
//! output is gated on the session's debug flag so it can be switched on at
//! `init` time without touching the global subscriber.

use std::cell::Cell;
use std::fmt;

/// Logger tagged with the component that owns it
#[derive(Debug)]
pub struct Logger {
    context: &'static str,
    debug: Cell<bool>,
}

impl Logger {
    /// Create a logger for `context` with debug output disabled
    pub fn new(context: &'static str) -> Self {
        Self::with_debug(context, false)
    }

    pub fn with_debug(context: &'static str, debug: bool) -> Self {
        Self {
            context,
            debug: Cell::new(debug),
        }
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.set(debug);
    }

    pub fn is_debug(&self) -> bool {
        self.debug.get()
    }

    /// Debug message, emitted only when debug output is enabled
    pub fn d(&self, message: impl fmt::Display) {
        if self.debug.get() {
            tracing::debug!(context = self.context, "{}", message);
        }
    }

    pub fn i(&self, message: impl fmt::Display) {
        tracing::info!(context = self.context, "{}", message);
    }

    pub fn w(&self, message: impl fmt::Display) {
        tracing::warn!(context = self.context, "{}", message);
    }

    pub fn e(&self, message: impl fmt::Display) {
        tracing::error!(context = self.context, "{}", message);
    }
}
