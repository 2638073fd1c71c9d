//! Gauge model: fill level to a renderable dial description.
//!
//! The dial sweeps 180°.  Percent maps linearly onto degrees
//! (`angle = percent * 1.8`) and the axis is split into three fixed bands:
//!
//! ```text
//!   0 %          30 %               70 %          100 %
//!   ├── Low/red ──┼──── Mid/orange ───┼── High/green ──┤
//!   0°           54°                126°            180°
//! ```
//!
//! Band membership is half-open except the top band, which includes 100 %.
//! The renderer owns orientation (start offset, direction); this module
//! only supplies raw angles.

use crate::sensors::LevelPercentage;

/// Degrees of dial sweep per percent.
pub const DEGREES_PER_PERCENT: f32 = 1.8;

/// Total dial sweep in degrees.
pub const SWEEP_DEG: f32 = 100.0 * DEGREES_PER_PERCENT;

/// Title drawn above the dial.
pub const GAUGE_TITLE: &str = "Water Level Gauge";

/// Upper (exclusive) bound of the low band, in percent.
const LOW_UPPER_PCT: f32 = 30.0;
/// Upper (exclusive) bound of the mid band, in percent.
const MID_UPPER_PCT: f32 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneBand {
    Low,
    Mid,
    High,
}

impl ZoneBand {
    pub const ALL: [Self; 3] = [Self::Low, Self::Mid, Self::High];

    /// Band that contains `percentage`.
    pub fn for_level(level: LevelPercentage) -> Self {
        let p = level.value();
        if p < LOW_UPPER_PCT {
            Self::Low
        } else if p < MID_UPPER_PCT {
            Self::Mid
        } else {
            Self::High
        }
    }

    /// Percent range covered by the band.
    pub fn percent_range(self) -> (f32, f32) {
        match self {
            Self::Low => (0.0, LOW_UPPER_PCT),
            Self::Mid => (LOW_UPPER_PCT, MID_UPPER_PCT),
            Self::High => (MID_UPPER_PCT, 100.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    pub fn colour(self) -> &'static str {
        match self {
            Self::Low => "red",
            Self::Mid => "orange",
            Self::High => "green",
        }
    }
}

/// One coloured arc of the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeZone {
    pub start_deg: f32,
    pub end_deg: f32,
    pub band: ZoneBand,
}

impl GaugeZone {
    pub fn sweep_deg(&self) -> f32 {
        self.end_deg - self.start_deg
    }
}

/// Everything a renderer needs to draw the dial for one level.
///
/// Rebuilt from scratch for every published level.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSpec {
    /// Zones ordered by increasing angle.
    pub zones: [GaugeZone; 3],
    /// Raw needle angle in `[0, 180]`, before any renderer offset.
    pub needle_angle_deg: f32,
    /// Level the spec was built from.
    pub level: LevelPercentage,
    /// Band the needle currently points into.
    pub active_band: ZoneBand,
}

/// Build the dial description for `level`.
pub fn render_spec(level: LevelPercentage) -> GaugeSpec {
    let zones = ZoneBand::ALL.map(|band| {
        let (start, end) = band.percent_range();
        GaugeZone {
            start_deg: start * DEGREES_PER_PERCENT,
            end_deg: end * DEGREES_PER_PERCENT,
            band,
        }
    });

    GaugeSpec {
        zones,
        needle_angle_deg: needle_angle(level),
        level,
        active_band: ZoneBand::for_level(level),
    }
}

pub fn needle_angle(level: LevelPercentage) -> f32 {
    level.value() * DEGREES_PER_PERCENT
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn render_is_pure(p in 0.0f32..=100.0) {
            let level = LevelPercentage::clamped(p).unwrap();
            prop_assert_eq!(render_spec(level), render_spec(level));
        }

        #[test]
        fn needle_stays_on_dial(p in 0.0f32..=100.0) {
            let spec = render_spec(LevelPercentage::clamped(p).unwrap());
            prop_assert!((0.0..=SWEEP_DEG).contains(&spec.needle_angle_deg));
        }
    }
}
