//! Sinks the core drives: discrete cues and the raw actuator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::cue::HapticEvent;
use crate::scheduler::VirtualScheduler;

/// Impact generator flavour for a transient impulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Rigid,
    Medium,
    Light,
    Soft,
}

/// One transient impulse.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Impulse {
    pub style: ImpactStyle,
    pub intensity: f64,
}

/// Level of the sustained (bed) vibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BedLevel {
    pub intensity: f64,
    pub sharpness: f64,
}

/// Plays discrete cues.
pub trait CueSink: Send + Sync {
    fn play(&self, cue: HapticEvent);
}

/// Low-level actuator: transient impulses plus one continuous channel.
pub trait Actuator: Send + Sync {
    fn impulse(&self, impulse: Impulse);
    /// Set (or start) the continuous channel at `level`.
    fn continuous(&self, level: BedLevel);
    /// Stop the continuous channel.
    fn silence(&self);
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHaptics;

impl CueSink for NullHaptics {
    fn play(&self, _cue: HapticEvent) {}
}

impl Actuator for NullHaptics {
    fn impulse(&self, _impulse: Impulse) {}
    fn continuous(&self, _level: BedLevel) {}
    fn silence(&self) {}
}

/// Anything the recorder captured.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Output {
    Cue { cue: HapticEvent },
    Impulse(Impulse),
    Bed(BedLevel),
    Silence,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Recorded {
    /// Virtual time of the output, when the recorder is clocked.
    pub at_ms: Option<u64>,
    #[serde(flatten)]
    pub output: Output,
}

/// Records every cue and actuator call, optionally stamped with virtual time.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<Recorded>>>,
    clock: Option<Arc<VirtualScheduler>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that stamps entries with `scheduler`'s virtual time.
    pub fn clocked(scheduler: Arc<VirtualScheduler>) -> Self {
        Self {
            log: Arc::default(),
            clock: Some(scheduler),
        }
    }

    fn log(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, output: Output) {
        let at_ms = self
            .clock
            .as_ref()
            .map(|c| duration_ms(c.now()));
        self.log().push(Recorded { at_ms, output });
    }

    pub fn entries(&self) -> Vec<Recorded> {
        self.log().clone()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn cues(&self) -> Vec<HapticEvent> {
        self.log()
            .iter()
            .filter_map(|r| match r.output {
                Output::Cue { cue } => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn count_cue(&self, cue: HapticEvent) -> usize {
        self.cues().into_iter().filter(|c| *c == cue).count()
    }

    pub fn impulses(&self) -> Vec<Impulse> {
        self.log()
            .iter()
            .filter_map(|r| match r.output {
                Output::Impulse(i) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Impulses with their virtual timestamps (0 when unclocked).
    pub fn timed_impulses(&self) -> Vec<(u64, Impulse)> {
        self.log()
            .iter()
            .filter_map(|r| match r.output {
                Output::Impulse(i) => Some((r.at_ms.unwrap_or(0), i)),
                _ => None,
            })
            .collect()
    }

    pub fn bed_levels(&self) -> Vec<BedLevel> {
        self.log()
            .iter()
            .filter_map(|r| match r.output {
                Output::Bed(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn silences(&self) -> usize {
        self.log()
            .iter()
            .filter(|r| matches!(r.output, Output::Silence))
            .count()
    }
}

impl CueSink for Recorder {
    fn play(&self, cue: HapticEvent) {
        self.push(Output::Cue { cue });
    }
}

impl Actuator for Recorder {
    fn impulse(&self, impulse: Impulse) {
        self.push(Output::Impulse(impulse));
    }

    fn continuous(&self, level: BedLevel) {
        self.push(Output::Bed(level));
    }

    fn silence(&self) {
        self.push(Output::Silence);
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
