//! Decision-and-feedback core of a tactile-first reading device.
//!
//! A session state machine decides what the user is doing (navigation,
//! composition, the urgent queue, the security-alert flow) and a pair of
//! haptic engines decide how that feels: a signature-driven tick/bed engine
//! and a zone-aware per-character burst engine.
//!
//! Zero I/O. Time comes from an injected [`Scheduler`]; output goes to
//! injected [`CueSink`] and [`Actuator`] implementations.

pub mod braille;
pub mod constants;
pub mod counter;
pub mod cue;
pub mod density;
pub mod message;
pub mod mode;
pub mod output;
pub mod repository;
pub mod scenario;
pub mod scheduler;
pub mod session;
pub mod signature;
pub mod tactile;
pub mod transport;
pub mod zone;

pub use braille::{cells_for_text, char_to_mask, dot_to_char, raised_count};
pub use constants::{DEFAULT_ALERT_SENDER, INACTIVITY_TIMEOUT};
pub use counter::CountedTick;
pub use cue::{CuePulse, HapticEvent};
pub use density::{bed_intensity, bed_sharpness, clamp_density, tick_intensity};
pub use message::{Message, MessageCategory, ParseError, Tone, UrgencyOutOfRange};
pub use mode::{
    FraudAlertPhase, InputMode, NavigateContext, ReadContext, ReadingMode, SendResult, SessionMode,
};
pub use output::{
    Actuator, BedLevel, CueSink, ImpactStyle, Impulse, NullHaptics, Output, Recorded, Recorder,
};
pub use repository::{DraftStore, InMemoryDrafts, InMemoryRepository, MessageRepository};
pub use scenario::DemoScenario;
pub use scheduler::{Action, ScheduledAction, Scheduler, VirtualScheduler};
pub use session::{APPS, Collaborators, DotMapper, Session, SessionConfig, SessionSnapshot};
pub use signature::{HapticSignature, SignatureFrame};
pub use tactile::{TactileEngine, TactileFrame, blend, elapsed_at, idle_bed};
pub use transport::{MockTransport, SendError, SendTransport};
pub use zone::{BurstPulse, Zone, ZoneEngine, burst_schedule};
