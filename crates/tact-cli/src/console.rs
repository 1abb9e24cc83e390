//! Haptic output for a terminal: cues are printed with their pulse pattern,
//! actuator traffic is logged.

use tact_core::{Actuator, BedLevel, CueSink, HapticEvent, Impulse};

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleHaptics;

/// One line per cue: the name, then each pulse as `offset+duration@intensity`
/// (duration omitted for transients), then the total span.
pub fn describe(cue: HapticEvent) -> String {
    let pulses: Vec<String> = cue
        .pattern()
        .iter()
        .map(|p| match p.duration_ms {
            0 => format!("{}ms@{:.1}", p.offset_ms, p.intensity),
            d => format!("{}ms+{d}ms@{:.1}", p.offset_ms, p.intensity),
        })
        .collect();
    format!("{cue} [{}] {}ms", pulses.join(" "), cue.span_ms())
}

impl CueSink for ConsoleHaptics {
    fn play(&self, cue: HapticEvent) {
        println!("~ {}", describe(cue));
    }
}

impl Actuator for ConsoleHaptics {
    fn impulse(&self, impulse: Impulse) {
        tracing::trace!(style = ?impulse.style, intensity = impulse.intensity, "impulse");
    }

    fn continuous(&self, level: BedLevel) {
        tracing::trace!(
            intensity = level.intensity,
            sharpness = level.sharpness,
            "bed"
        );
    }

    fn silence(&self) {
        tracing::trace!("silence");
    }
}
