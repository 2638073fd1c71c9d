//! Scripted serial transport for integration tests.
//!
//! Every link handed out by [`MockTransport`] replays a queue of read
//! results and then goes quiet.  Shared [`LinkProbe`] counters let tests
//! observe the worker from the outside without touching its thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tankgauge::app::events::AppEvent;
use tankgauge::app::ports::{EventSink, SerialLink, SerialTransport};
use tankgauge::config::{LinkSettings, MonitorConfig};
use tankgauge::error::{ConnectError, ReadError};

pub type Script = Vec<Result<Vec<u8>, ReadError>>;

/// Script of well-formed lines.
pub fn lines(lines: &[&str]) -> Script {
    lines.iter().map(|l| Ok(l.as_bytes().to_vec())).collect()
}

/// Config with cadences short enough for tests.
pub fn fast_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: 5,
        read_timeout_ms: 50,
        refresh_interval_ms: 5,
        ..MonitorConfig::default()
    }
}

/// Spin until `cond` holds or `timeout` passes.  Returns the last result.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

pub const WAIT: Duration = Duration::from_secs(5);

// ── Probe ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LinkProbe {
    opens: Arc<AtomicUsize>,
    polls: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl LinkProbe {
    /// Successful and failed open attempts.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// `has_data` calls across every link.
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// True once the most recently opened link was closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

// ── Link ──────────────────────────────────────────────────────

pub struct MockLink {
    script: VecDeque<Result<Vec<u8>, ReadError>>,
    probe: LinkProbe,
}

impl SerialLink for MockLink {
    fn has_data(&mut self) -> Result<bool, ReadError> {
        self.probe.polls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.script.is_empty())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ReadError> {
        self.script.pop_front().unwrap_or(Err(ReadError::Timeout))
    }

    fn close(&mut self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}

// ── Transport ─────────────────────────────────────────────────

pub struct MockTransport {
    fail_first: usize,
    scripts: VecDeque<Script>,
    probe: LinkProbe,
}

#[allow(dead_code)]
impl MockTransport {
    /// Transport whose first link replays `script`.
    pub fn new(script: Script) -> Self {
        Self::with_scripts(vec![script])
    }

    /// One script per successful open, in order.  Later opens get a quiet
    /// link.
    pub fn with_scripts(scripts: Vec<Script>) -> Self {
        Self {
            fail_first: 0,
            scripts: scripts.into(),
            probe: LinkProbe::default(),
        }
    }

    /// Refuse the first `n` open attempts with `NotFound`.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn probe(&self) -> LinkProbe {
        self.probe.clone()
    }
}

impl SerialTransport for MockTransport {
    type Link = MockLink;

    fn open(&mut self, port_name: &str, _settings: &LinkSettings) -> Result<MockLink, ConnectError> {
        let attempt = self.probe.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_first {
            return Err(ConnectError::NotFound {
                port: port_name.to_owned(),
            });
        }
        self.probe.closed.store(false, Ordering::SeqCst);
        Ok(MockLink {
            script: self.scripts.pop_front().unwrap_or_default().into(),
            probe: self.probe.clone(),
        })
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
