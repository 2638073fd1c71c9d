//! Distance to fill-level conversion.
//!
//! The sensor sits at the top of the tank looking down, so the water
//! column is `height - distance`.  Noise or an over-range reading can push
//! the ratio outside 0–100 %; the result is clamped rather than rejected.

use core::fmt;

/// Fill level in percent, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LevelPercentage(f32);

impl LevelPercentage {
    pub const EMPTY: Self = Self(0.0);
    pub const FULL: Self = Self(100.0);

    /// Clamp an arbitrary ratio into range.  `None` for NaN.
    pub fn clamped(value: f32) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Some(Self(value.clamp(0.0, 100.0)))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Status line text, e.g. `Water Level: 42.5 %`.
    pub fn label(self) -> String {
        format!("Water Level: {:.1} %", self.0)
    }

    /// Status line text before the first reading.
    pub fn placeholder_label() -> &'static str {
        "Water Level: -- %"
    }
}

impl fmt::Display for LevelPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// Convert a distance reading to a fill level.
///
/// Returns `None` while the tank height is not strictly positive (the
/// "disabled" sentinel) or when either input is not finite; the caller
/// keeps the previously published level in that case.
pub fn compute(distance_cm: f32, tank_height_cm: f32) -> Option<LevelPercentage> {
    if !tank_height_cm.is_finite() || tank_height_cm <= 0.0 || !distance_cm.is_finite() {
        return None;
    }
    let water_level = tank_height_cm - distance_cm;
    LevelPercentage::clamped(water_level / tank_height_cm * 100.0)
}
