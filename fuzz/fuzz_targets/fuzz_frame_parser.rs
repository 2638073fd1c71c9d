//! Fuzz target: `FrameAssembler` + `parse_bytes` + `compute`
//!
//! Streams arbitrary bytes through the assembler in uneven chunks and
//! pushes every line it yields through parsing and level computation.
//! Nothing may panic, no line may exceed the frame limit, and every
//! computed level must stay within 0–100 %.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use tankgauge::sensors::frame::{FrameAssembler, MAX_FRAME_LEN, parse_bytes};
use tankgauge::sensors::level::compute;

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk % 32) + 1;

    let mut assembler = FrameAssembler::new();
    for piece in stream.chunks(chunk) {
        let _ = assembler.extend(piece);
        while let Some(line) = assembler.next_line() {
            assert!(line.len() < MAX_FRAME_LEN, "line exceeds frame buffer");
            if let Ok(reading) = parse_bytes(&line) {
                assert!(reading.distance_cm.is_finite());
                if let Some(level) = compute(reading.distance_cm, 200.0) {
                    assert!((0.0..=100.0).contains(&level.value()));
                }
            }
        }
    }
});
