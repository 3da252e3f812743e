//! Transient notifications
//!
//! Each toast gets a new generation. A timer armed for an older toast holds
//! a stale [`ToastTicket`] and cannot clear the one that replaced it.

use std::time::Duration;

/// Token a timer presents to expire the toast it was armed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTicket {
    generation: u64,
    /// How long until the toast should be expired
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Toast {
    message: Option<String>,
    generation: u64,
    duration: Duration,
}

impl Toast {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            message: None,
            generation: 0,
            duration: Duration::from_millis(duration_ms),
        }
    }

    /// Show `message`, replacing any visible toast.
    pub fn show(&mut self, message: impl Into<String>) -> ToastTicket {
        self.generation = self.generation.wrapping_add(1);
        self.message = Some(message.into());
        ToastTicket {
            generation: self.generation,
            duration: self.duration,
        }
    }

    /// Hide the toast if `ticket` belongs to it. Returns whether it was hidden.
    pub fn expire(&mut self, ticket: ToastTicket) -> bool {
        if ticket.generation != self.generation || self.message.is_none() {
            return false;
        }
        self.message = None;
        true
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
