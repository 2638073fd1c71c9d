//! Lock-free cells shared between the control flow and the acquisition
//! worker.
//!
//! ```text
//! ┌──────────────┐  publish()   ┌───────────┐  latest()   ┌──────────────┐
//! │ Acquisition  │─────────────▶│ LevelSlot │────────────▶│ Display flow │
//! │ worker       │              └───────────┘             │ (any number) │
//! │              │  load()   ┌────────────────┐  store()  │              │
//! │              │◀──────────│ TankHeightCell │◀──────────│ Control flow │
//! └──────────────┘           └────────────────┘           └──────────────┘
//! ```
//!
//! `f32` values travel as their bit pattern inside a single atomic word,
//! so a reader sees either the previous or the new value, never a torn one.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::TankConfig;
use crate::diagnostics::LinkDiagnostics;
use crate::sensors::LevelPercentage;

/// Handles to every cell the worker touches.  Cloning shares the cells.
#[derive(Debug, Clone)]
pub struct SharedState {
    pub level: Arc<LevelSlot>,
    pub tank: Arc<TankHeightCell>,
    pub diagnostics: Arc<LinkDiagnostics>,
}

impl SharedState {
    pub fn new(tank: TankConfig) -> Self {
        Self {
            level: Arc::new(LevelSlot::new()),
            tank: Arc::new(TankHeightCell::new(tank)),
            diagnostics: Arc::new(LinkDiagnostics::new()),
        }
    }
}

/// A published level together with its publish sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSnapshot {
    pub level: LevelPercentage,
    /// Increments by one per publish; 1 for the first.
    pub seq: u32,
}

/// Single-slot, last-writer-wins holder of the current fill level.
///
/// The sequence number lives in the high half of the word and the level
/// bits in the low half, so one load always yields a matching pair.
/// One writer (the acquisition worker); readers never block.
#[derive(Debug, Default)]
pub struct LevelSlot {
    word: AtomicU64,
}

impl LevelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current level.
    pub fn publish(&self, level: LevelPercentage) {
        let prev_seq = (self.word.load(Ordering::Acquire) >> 32) as u32;
        // Sequence 0 is reserved for "nothing published".
        let seq = prev_seq.wrapping_add(1).max(1);
        let word = (u64::from(seq) << 32) | u64::from(level.value().to_bits());
        self.word.store(word, Ordering::Release);
    }

    /// Latest level, or `None` before the first publish.
    pub fn latest(&self) -> Option<LevelSnapshot> {
        let word = self.word.load(Ordering::Acquire);
        let seq = (word >> 32) as u32;
        if seq == 0 {
            return None;
        }
        let level = LevelPercentage::clamped(f32::from_bits(word as u32))?;
        Some(LevelSnapshot { level, seq })
    }

    pub fn level(&self) -> Option<LevelPercentage> {
        self.latest().map(|s| s.level)
    }

    /// Sequence number of the latest publish (0 if none).
    pub fn publish_count(&self) -> u32 {
        (self.word.load(Ordering::Acquire) >> 32) as u32
    }
}

/// Tank height written by the control flow, read by the worker each cycle.
///
/// The worker may act on a value one cycle stale.
#[derive(Debug)]
pub struct TankHeightCell {
    bits: AtomicU32,
}

impl TankHeightCell {
    pub fn new(tank: TankConfig) -> Self {
        Self {
            bits: AtomicU32::new(tank.height_cm.to_bits()),
        }
    }

    pub fn store(&self, tank: TankConfig) {
        self.bits.store(tank.height_cm.to_bits(), Ordering::Release);
    }

    pub fn load(&self) -> TankConfig {
        TankConfig::new(f32::from_bits(self.bits.load(Ordering::Acquire)))
    }
}

impl Default for TankHeightCell {
    fn default() -> Self {
        Self::new(TankConfig::default())
    }
}
