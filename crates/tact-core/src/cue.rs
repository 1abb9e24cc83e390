//! Discrete haptic cues and the pulse pattern each one plays as.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of discrete cue kinds the session machine can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HapticEvent {
    CategorySwitch,
    SendSuccess,
    SendFailure,
    EndOfCategory,
    UrgentQueuedAlert,
    EnterFullMode,
    FocusChanged,
    Preview,
    Activate,
    UrgentTriplePulse,
    FreezeConfirm,
}

/// One element of a cue pattern.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CuePulse {
    /// Offset from the start of the cue, in milliseconds.
    pub offset_ms: u32,
    /// Zero for a transient pulse.
    pub duration_ms: u32,
    pub intensity: f64,
    pub sharpness: f64,
}

const fn transient(offset_ms: u32, intensity: f64, sharpness: f64) -> CuePulse {
    CuePulse {
        offset_ms,
        duration_ms: 0,
        intensity,
        sharpness,
    }
}

const fn sustained(duration_ms: u32, intensity: f64, sharpness: f64) -> CuePulse {
    CuePulse {
        offset_ms: 0,
        duration_ms,
        intensity,
        sharpness,
    }
}

const CATEGORY_SWITCH: &[CuePulse] = &[transient(0, 0.6, 0.5)];
const SEND_SUCCESS: &[CuePulse] = &[transient(0, 0.8, 0.3), transient(100, 1.0, 0.5)];
const SEND_FAILURE: &[CuePulse] = &[sustained(300, 0.7, 0.9)];
const END_OF_CATEGORY: &[CuePulse] = &[transient(0, 0.5, 0.8), transient(150, 0.5, 0.8)];
const URGENT_QUEUED_ALERT: &[CuePulse] = &[sustained(500, 1.0, 0.7)];
const ENTER_FULL_MODE: &[CuePulse] = &[transient(0, 0.4, 0.2)];
const FOCUS_CHANGED: &[CuePulse] = &[transient(0, 0.5, 0.7)];
const PREVIEW: &[CuePulse] = &[transient(0, 0.6, 0.4)];
const ACTIVATE: &[CuePulse] = &[transient(0, 0.9, 0.6), transient(80, 1.0, 0.8)];
const URGENT_TRIPLE_PULSE: &[CuePulse] = &[
    transient(0, 1.0, 1.0),
    transient(100, 1.0, 1.0),
    transient(200, 1.0, 1.0),
];
const FREEZE_CONFIRM: &[CuePulse] = &[transient(0, 1.0, 0.5), transient(150, 1.0, 0.5)];

impl HapticEvent {
    pub const ALL: [HapticEvent; 11] = [
        HapticEvent::CategorySwitch,
        HapticEvent::SendSuccess,
        HapticEvent::SendFailure,
        HapticEvent::EndOfCategory,
        HapticEvent::UrgentQueuedAlert,
        HapticEvent::EnterFullMode,
        HapticEvent::FocusChanged,
        HapticEvent::Preview,
        HapticEvent::Activate,
        HapticEvent::UrgentTriplePulse,
        HapticEvent::FreezeConfirm,
    ];

    /// The pulse pattern an actuator renders for this cue.
    pub fn pattern(self) -> &'static [CuePulse] {
        match self {
            HapticEvent::CategorySwitch => CATEGORY_SWITCH,
            HapticEvent::SendSuccess => SEND_SUCCESS,
            HapticEvent::SendFailure => SEND_FAILURE,
            HapticEvent::EndOfCategory => END_OF_CATEGORY,
            HapticEvent::UrgentQueuedAlert => URGENT_QUEUED_ALERT,
            HapticEvent::EnterFullMode => ENTER_FULL_MODE,
            HapticEvent::FocusChanged => FOCUS_CHANGED,
            HapticEvent::Preview => PREVIEW,
            HapticEvent::Activate => ACTIVATE,
            HapticEvent::UrgentTriplePulse => URGENT_TRIPLE_PULSE,
            HapticEvent::FreezeConfirm => FREEZE_CONFIRM,
        }
    }

    /// Total length of the pattern in milliseconds.
    pub fn span_ms(self) -> u32 {
        self.pattern()
            .iter()
            .map(|p| p.offset_ms + p.duration_ms)
            .max()
            .unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HapticEvent::CategorySwitch => "category-switch",
            HapticEvent::SendSuccess => "send-success",
            HapticEvent::SendFailure => "send-failure",
            HapticEvent::EndOfCategory => "end-of-category",
            HapticEvent::UrgentQueuedAlert => "urgent-queued-alert",
            HapticEvent::EnterFullMode => "enter-full-mode",
            HapticEvent::FocusChanged => "focus-changed",
            HapticEvent::Preview => "preview",
            HapticEvent::Activate => "activate",
            HapticEvent::UrgentTriplePulse => "urgent-triple-pulse",
            HapticEvent::FreezeConfirm => "freeze-confirm",
        }
    }
}

impl fmt::Display for HapticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
