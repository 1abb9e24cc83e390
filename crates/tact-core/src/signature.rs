//! Emotional signatures: baseline intensity, cadence and sharpness per mood,
//! plus the per-tick modulation each mood applies to its baseline.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageCategory, ParseError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HapticSignature {
    Urgent,
    Calm,
    Empathy,
    Anger,
    Neutral,
}

/// Modulation of a signature's baseline for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SignatureFrame {
    pub tick_active: bool,
    pub tick_intensity_scale: f64,
    pub bed_intensity_scale: f64,
    pub sharpness_scale: f64,
}

impl SignatureFrame {
    const fn steady(tick: f64, bed: f64, sharpness: f64) -> Self {
        Self {
            tick_active: true,
            tick_intensity_scale: tick,
            bed_intensity_scale: bed,
            sharpness_scale: sharpness,
        }
    }
}

impl HapticSignature {
    pub const ALL: [HapticSignature; 5] = [
        HapticSignature::Urgent,
        HapticSignature::Calm,
        HapticSignature::Empathy,
        HapticSignature::Anger,
        HapticSignature::Neutral,
    ];

    /// Baseline energy before density blending.
    pub fn intensity(self) -> f64 {
        match self {
            HapticSignature::Urgent => 0.85,
            HapticSignature::Calm => 0.25,
            HapticSignature::Empathy => 0.35,
            HapticSignature::Anger => 0.95,
            HapticSignature::Neutral => 0.5,
        }
    }

    /// Tick cadence.
    pub fn tick_interval(self) -> Duration {
        let ms = match self {
            HapticSignature::Urgent => 20,
            HapticSignature::Calm => 45,
            HapticSignature::Empathy => 30,
            HapticSignature::Anger => 18,
            HapticSignature::Neutral => 33,
        };
        Duration::from_millis(ms)
    }

    /// Baseline sharpness before density blending.
    pub fn sharpness(self) -> f64 {
        match self {
            HapticSignature::Urgent => 0.95,
            HapticSignature::Calm => 0.18,
            HapticSignature::Empathy => 0.35,
            HapticSignature::Anger => 1.0,
            HapticSignature::Neutral => 0.45,
        }
    }

    /// Modulation frame for `tick_index`, `elapsed` seconds into the segment.
    pub fn frame(self, tick_index: u64, elapsed: f64) -> SignatureFrame {
        match self {
            // Fast and sharp, accent every fourth tick.
            HapticSignature::Urgent => {
                let accent = if tick_index % 4 == 0 { 1.0 } else { 0.88 };
                SignatureFrame::steady(accent, 0.92, 1.0)
            }
            HapticSignature::Calm => SignatureFrame::steady(0.55, 0.68, 0.65),
            // Slow swell around a soft baseline.
            HapticSignature::Empathy => {
                let wave = ((elapsed * PI * 2.2).sin() + 1.0) / 2.0;
                SignatureFrame::steady(
                    0.60 + 0.25 * wave,
                    0.60 + 0.25 * wave,
                    0.70 + 0.20 * wave,
                )
            }
            // Harsh segments: on, on, off, on, off, off.
            HapticSignature::Anger => {
                let active = matches!(tick_index % 6, 0 | 1 | 3);
                SignatureFrame {
                    tick_active: active,
                    tick_intensity_scale: if active { 1.0 } else { 0.15 },
                    bed_intensity_scale: if active { 1.0 } else { 0.05 },
                    sharpness_scale: 1.0,
                }
            }
            HapticSignature::Neutral => SignatureFrame::steady(0.78, 0.75, 0.85),
        }
    }

    /// Derive a signature from classification output.
    pub fn from_category(category: MessageCategory, urgency: f64) -> Self {
        match category {
            MessageCategory::Urgent => HapticSignature::Urgent,
            MessageCategory::Work if urgency > 0.7 => HapticSignature::Anger,
            MessageCategory::Work => HapticSignature::Neutral,
            MessageCategory::Personal => HapticSignature::Empathy,
            MessageCategory::Other => HapticSignature::Calm,
        }
    }

    pub fn for_message(message: &Message) -> Self {
        Self::from_category(message.category, message.urgency())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HapticSignature::Urgent => "urgent",
            HapticSignature::Calm => "calm",
            HapticSignature::Empathy => "empathy",
            HapticSignature::Anger => "anger",
            HapticSignature::Neutral => "neutral",
        }
    }
}

impl fmt::Display for HapticSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HapticSignature {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HapticSignature::ALL
            .into_iter()
            .find(|sig| sig.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("signature", s))
    }
}
