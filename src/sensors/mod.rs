//! Sensor pipeline: raw serial frames to a bounded fill level.
//!
//! ```text
//!  bytes ──▶ FrameAssembler ──▶ parse() ──▶ Reading ──▶ compute() ──▶ LevelPercentage
//! ```
//!
//! Distances and the tank height share one unit (centimetres) by
//! convention; nothing here converts between units.

pub mod frame;
pub mod level;

pub use frame::{FrameAssembler, parse};
pub use level::{LevelPercentage, compute};

/// One distance measurement decoded from a frame.
///
/// Transient: it is converted to a percentage and dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Sensor-to-surface distance (cm).
    pub distance_cm: f32,
}
