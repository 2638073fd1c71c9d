//! Terminal gauge renderer.
//!
//! Draws the dial as a one-line strip, 5° per cell, left edge = 0°:
//!
//! ```text
//! Water Level Gauge [-----------========|=====###########] Water Level: 55.0 % (mid)
//! ```
//!
//! `-` low, `=` mid, `#` high, `|` needle.

use std::io::Write;

use log::warn;

use crate::app::ports::GaugeRenderer;
use crate::gauge::{GAUGE_TITLE, GaugeSpec, SWEEP_DEG, ZoneBand};

/// Number of cells in the strip.
pub const STRIP_CELLS: usize = 36;

const DEG_PER_CELL: f32 = SWEEP_DEG / STRIP_CELLS as f32;

pub struct TextGaugeRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextGaugeRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GaugeRenderer for TextGaugeRenderer<W> {
    fn render(&mut self, spec: &GaugeSpec) {
        let line = draw(spec);
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("gauge render failed: {}", e);
        }
    }
}

/// Render `spec` to a single line of text.
pub fn draw(spec: &GaugeSpec) -> String {
    let needle = needle_cell(spec.needle_angle_deg);
    let strip: String = (0..STRIP_CELLS)
        .map(|cell| {
            if cell == needle {
                return '|';
            }
            let mid_deg = (cell as f32 + 0.5) * DEG_PER_CELL;
            let band = spec
                .zones
                .iter()
                .find(|z| mid_deg >= z.start_deg && mid_deg < z.end_deg)
                .map_or(ZoneBand::High, |z| z.band);
            glyph(band)
        })
        .collect();

    format!(
        "{GAUGE_TITLE} [{strip}] {} ({})",
        spec.level.label(),
        spec.active_band.label()
    )
}

fn needle_cell(angle_deg: f32) -> usize {
    ((angle_deg / DEG_PER_CELL) as usize).min(STRIP_CELLS - 1)
}

fn glyph(band: ZoneBand) -> char {
    match band {
        ZoneBand::Low => '-',
        ZoneBand::Mid => '=',
        ZoneBand::High => '#',
    }
}
