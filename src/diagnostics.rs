//! Runtime acquisition counters.
//!
//! The worker bumps these as frames flow through the pipeline; the shell
//! reads a [`DiagnosticsSnapshot`] on demand for the `status` command.
//! Counters are cumulative across connections for the life of the
//! controller.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct LinkDiagnostics {
    sessions_started: AtomicU32,
    frames_received: AtomicU32,
    levels_published: AtomicU32,
    frames_skipped_disabled: AtomicU32,
    parse_failures: AtomicU32,
    read_failures: AtomicU32,
    links_lost: AtomicU32,
}

/// Point-in-time copy of [`LinkDiagnostics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    /// Acquisition workers spawned.
    pub sessions_started: u32,
    /// Complete lines read from the link.
    pub frames_received: u32,
    /// Levels written to the shared slot.
    pub levels_published: u32,
    /// Valid frames ignored because the tank height was disabled.
    pub frames_skipped_disabled: u32,
    pub parse_failures: u32,
    pub read_failures: u32,
    /// Connections dropped by the worker itself.
    pub links_lost: u32,
}

impl LinkDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session_started(&self) {
        bump(&self.sessions_started);
    }

    pub fn record_frame(&self) {
        bump(&self.frames_received);
    }

    pub fn record_published(&self) {
        bump(&self.levels_published);
    }

    pub fn record_skipped_disabled(&self) {
        bump(&self.frames_skipped_disabled);
    }

    pub fn record_parse_failure(&self) {
        bump(&self.parse_failures);
    }

    pub fn record_read_failure(&self) {
        bump(&self.read_failures);
    }

    pub fn record_link_lost(&self) {
        bump(&self.links_lost);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            levels_published: self.levels_published.load(Ordering::Relaxed),
            frames_skipped_disabled: self.frames_skipped_disabled.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            links_lost: self.links_lost.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}
