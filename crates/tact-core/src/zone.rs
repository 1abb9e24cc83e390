//! Zone-aware burst rendering.
//!
//! Over content, each cell change plays one micro-pulse per raised dot in scan
//! order, so every character has its own rhythm. Over empty space a soft
//! ambient pulse keeps the surface feeling alive. Crossing between the two
//! always bumps once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::constants::{
    AMBIENT_BASE_PERIOD, AMBIENT_INTENSITY, AMBIENT_PULSE_EVERY, BOUNDARY_INTENSITY, DOT_COUNT,
    FLAT_DOT_GAP, RAISED_DOT_GAP,
};
use crate::counter::CountedTick;
use crate::output::{Actuator, ImpactStyle, Impulse};
use crate::scheduler::{ScheduledAction, Scheduler, cancel_slot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Content,
    Empty,
}

/// One pulse of a cell burst.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BurstPulse {
    /// Dot number, 1..=6.
    pub dot: u8,
    pub delay: Duration,
    pub impulse: Impulse,
}

/// Strength of a dot's pulse; depends only on its row.
pub fn dot_impulse(dot_index: u8) -> Impulse {
    let (style, intensity) = match dot_index % 3 {
        0 => (ImpactStyle::Rigid, 1.0),
        1 => (ImpactStyle::Medium, 0.80),
        _ => (ImpactStyle::Light, 0.60),
    };
    Impulse { style, intensity }
}

pub fn boundary_impulse() -> Impulse {
    Impulse {
        style: ImpactStyle::Medium,
        intensity: BOUNDARY_INTENSITY,
    }
}

pub fn ambient_impulse() -> Impulse {
    Impulse {
        style: ImpactStyle::Soft,
        intensity: AMBIENT_INTENSITY,
    }
}

/// Pulse plan for a cell. Raised dots push later pulses back by 20ms, flat
/// dots by 10ms. Bits above the sixth are ignored.
pub fn burst_schedule(bitmask: u8) -> Vec<BurstPulse> {
    let mut delay = Duration::ZERO;
    let mut plan = Vec::new();
    for dot in 0..DOT_COUNT {
        if (bitmask >> dot) & 1 == 1 {
            plan.push(BurstPulse {
                dot: dot + 1,
                delay,
                impulse: dot_impulse(dot),
            });
            delay += RAISED_DOT_GAP;
        } else {
            delay += FLAT_DOT_GAP;
        }
    }
    plan
}

struct ZoneState {
    active: bool,
    zone: Zone,
    cell: Option<usize>,
    burst: Vec<ScheduledAction>,
    ambient: Option<ScheduledAction>,
    ambient_ticks: CountedTick,
    generation: u64,
}

impl Default for ZoneState {
    fn default() -> Self {
        Self {
            active: false,
            zone: Zone::Empty,
            cell: None,
            burst: Vec::new(),
            ambient: None,
            ambient_ticks: CountedTick::new(AMBIENT_PULSE_EVERY),
            generation: 0,
        }
    }
}

impl ZoneState {
    fn cancel_burst(&mut self) {
        for handle in self.burst.drain(..) {
            handle.cancel();
        }
    }

    fn cancel_ambient(&mut self) {
        cancel_slot(&mut self.ambient);
        self.ambient_ticks.reset();
    }
}

struct Shared {
    scheduler: Arc<dyn Scheduler>,
    actuator: Arc<dyn Actuator>,
    state: Mutex<ZoneState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ZoneState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one zone engine. Clones share the same engine.
#[derive(Clone)]
pub struct ZoneEngine {
    shared: Arc<Shared>,
}

impl ZoneEngine {
    pub fn new(scheduler: Arc<dyn Scheduler>, actuator: Arc<dyn Actuator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                scheduler,
                actuator,
                state: Mutex::new(ZoneState::default()),
            }),
        }
    }

    /// Begin reading in the empty zone with the ambient pulse running.
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if state.active {
            return;
        }
        state.active = true;
        state.generation += 1;
        state.zone = Zone::Empty;
        state.cell = None;
        arm_ambient(&self.shared, &mut state);
        debug!("zone engine started");
    }

    /// Finger over content at `cell`. Bursts only when the cell changes.
    pub fn update_content(&self, cell: usize, bitmask: u8) {
        let mut state = self.shared.lock();
        if !state.active {
            return;
        }
        if state.zone != Zone::Content {
            state.cancel_ambient();
            state.cancel_burst();
            state.zone = Zone::Content;
            self.shared.actuator.impulse(boundary_impulse());
        }
        if state.cell != Some(cell) {
            state.cell = Some(cell);
            state.cancel_burst();
            schedule_burst(&self.shared, &mut state, bitmask);
        }
    }

    /// Finger over empty space.
    pub fn enter_empty(&self) {
        let mut state = self.shared.lock();
        if !state.active || state.zone == Zone::Empty {
            return;
        }
        state.cancel_burst();
        state.cell = None;
        state.zone = Zone::Empty;
        self.shared.actuator.impulse(boundary_impulse());
        arm_ambient(&self.shared, &mut state);
    }

    /// Cancel everything pending. Idempotent.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        state.cancel_burst();
        state.cancel_ambient();
        state.generation += 1;
        if state.active {
            debug!("zone engine stopped");
        }
        state.active = false;
        state.zone = Zone::Empty;
        state.cell = None;
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().active
    }

    pub fn zone(&self) -> Zone {
        self.shared.lock().zone
    }

    pub fn current_cell(&self) -> Option<usize> {
        self.shared.lock().cell
    }

    /// Burst pulses not yet fired or cancelled.
    pub fn pending_burst(&self) -> usize {
        self.shared
            .lock()
            .burst
            .iter()
            .filter(|h| h.is_pending())
            .count()
    }
}

fn schedule_burst(shared: &Arc<Shared>, state: &mut ZoneState, bitmask: u8) {
    let generation = state.generation;
    for pulse in burst_schedule(bitmask) {
        let weak: Weak<Shared> = Arc::downgrade(shared);
        let handle = shared.scheduler.schedule(
            pulse.delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    let state = shared.lock();
                    if state.active && state.generation == generation {
                        shared.actuator.impulse(pulse.impulse);
                    }
                }
            }),
        );
        state.burst.push(handle);
    }
}

fn arm_ambient(shared: &Arc<Shared>, state: &mut ZoneState) {
    cancel_slot(&mut state.ambient);
    let generation = state.generation;
    let weak: Weak<Shared> = Arc::downgrade(shared);
    state.ambient = Some(shared.scheduler.schedule(
        AMBIENT_BASE_PERIOD,
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                ambient_tick(&shared, generation);
            }
        }),
    ));
}

fn ambient_tick(shared: &Arc<Shared>, generation: u64) {
    let mut state = shared.lock();
    if !state.active || state.zone != Zone::Empty || state.generation != generation {
        return;
    }
    if state.ambient_ticks.advance_periodic() {
        shared.actuator.impulse(ambient_impulse());
    }
    arm_ambient(shared, &mut state);
}
