use std::time::Duration;

/// Inactivity window after the most recent interaction before a session exits.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Number of chordable dots in a braille cell.
pub const DOT_COUNT: u8 = 6;

/// Mask covering all six dots.
pub const DOT_MASK: u8 = 0b11_1111;

/// Upper bound for live density observations (raised dots under the finger).
pub const MAX_DENSITY: i32 = 6;

/// Ticks boosted after each density update.
pub const MOVEMENT_BOOST_TICKS: u32 = 3;

/// Multiplier applied to tick and bed intensity while the boost window is open.
pub const MOVEMENT_BOOST: f64 = 1.30;

/// Tick channel blend: signature share vs density share.
pub const TICK_SIGNATURE_WEIGHT: f64 = 0.45;
pub const TICK_DENSITY_WEIGHT: f64 = 0.55;

/// Bed channel intensity blend.
pub const BED_SIGNATURE_WEIGHT: f64 = 0.40;
pub const BED_DENSITY_WEIGHT: f64 = 0.60;

/// Bed channel sharpness blend.
pub const SHARPNESS_SIGNATURE_WEIGHT: f64 = 0.45;
pub const SHARPNESS_DENSITY_WEIGHT: f64 = 0.55;

/// Idle bed level on start, as fractions of the signature baseline.
pub const IDLE_BED_INTENSITY: f64 = 0.20;
pub const IDLE_BED_SHARPNESS: f64 = 0.60;

/// Extra burst delay after a raised dot.
pub const RAISED_DOT_GAP: Duration = Duration::from_millis(20);

/// Extra burst delay after a flat dot.
pub const FLAT_DOT_GAP: Duration = Duration::from_millis(10);

/// Zone boundary bump strength.
pub const BOUNDARY_INTENSITY: f64 = 0.65;

/// Base timer for the empty-zone ambient pulse (25Hz).
pub const AMBIENT_BASE_PERIOD: Duration = Duration::from_millis(40);

/// Ambient pulse fires on every Nth base tick (~4Hz effective).
pub const AMBIENT_PULSE_EVERY: u32 = 6;

/// Ambient pulse strength.
pub const AMBIENT_INTENSITY: f64 = 0.20;

/// Senders whose conversations route into the security alert flow.
pub const DEFAULT_ALERT_SENDER: &str = "Bank Alert";
