//! Two-layer tactile reading: a discrete tick channel on the signature's
//! cadence and a continuously adjusted bed, both blended with live density.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::constants::{
    BED_DENSITY_WEIGHT, BED_SIGNATURE_WEIGHT, IDLE_BED_INTENSITY, IDLE_BED_SHARPNESS,
    MOVEMENT_BOOST, MOVEMENT_BOOST_TICKS, SHARPNESS_DENSITY_WEIGHT, SHARPNESS_SIGNATURE_WEIGHT,
    TICK_DENSITY_WEIGHT, TICK_SIGNATURE_WEIGHT,
};
use crate::counter::CountedTick;
use crate::density::{bed_intensity, bed_sharpness, clamp01, clamp_density, tick_intensity};
use crate::output::{Actuator, BedLevel, ImpactStyle, Impulse};
use crate::scheduler::{ScheduledAction, Scheduler, cancel_slot};
use crate::signature::{HapticSignature, SignatureFrame};

/// Output of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TactileFrame {
    /// Impulse strength, or `None` when the frame suppresses the tick.
    pub tick: Option<f64>,
    pub bed: BedLevel,
}

/// Blend a signature frame with live density into one tick's output.
///
/// The movement boost scales tick and bed intensity but never sharpness.
pub fn blend(
    signature: HapticSignature,
    frame: &SignatureFrame,
    density: i32,
    boosted: bool,
) -> TactileFrame {
    let n = clamp_density(density);
    let boost = if boosted { MOVEMENT_BOOST } else { 1.0 };

    let baseline_tick = signature.intensity() * frame.tick_intensity_scale;
    let tick = clamp01(TICK_SIGNATURE_WEIGHT * baseline_tick + TICK_DENSITY_WEIGHT * tick_intensity(n));

    let baseline_bed = signature.intensity() * frame.bed_intensity_scale;
    let bed = clamp01(BED_SIGNATURE_WEIGHT * baseline_bed + BED_DENSITY_WEIGHT * bed_intensity(n));

    let baseline_sharp = signature.sharpness() * frame.sharpness_scale;
    let sharpness = clamp01(
        SHARPNESS_SIGNATURE_WEIGHT * baseline_sharp + SHARPNESS_DENSITY_WEIGHT * bed_sharpness(n),
    );

    TactileFrame {
        tick: frame.tick_active.then(|| clamp01(tick * boost)),
        bed: BedLevel {
            intensity: clamp01(bed * boost),
            sharpness,
        },
    }
}

/// Bed level a segment opens with, before the first tick.
pub fn idle_bed(signature: HapticSignature) -> BedLevel {
    BedLevel {
        intensity: signature.intensity() * IDLE_BED_INTENSITY,
        sharpness: signature.sharpness() * IDLE_BED_SHARPNESS,
    }
}

/// Elapsed seconds at `tick_index`, derived from the cadence.
pub fn elapsed_at(tick_index: u64, interval: Duration) -> f64 {
    (tick_index + 1) as f64 * interval.as_secs_f64()
}

struct Segment {
    signature: HapticSignature,
    density: i32,
    tick_index: u64,
    boost: CountedTick,
    timer: Option<ScheduledAction>,
}

#[derive(Default)]
struct TactileState {
    segment: Option<Segment>,
    generation: u64,
}

struct Shared {
    scheduler: Arc<dyn Scheduler>,
    actuator: Arc<dyn Actuator>,
    state: Mutex<TactileState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TactileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one tactile engine. Clones share the same engine.
#[derive(Clone)]
pub struct TactileEngine {
    shared: Arc<Shared>,
}

impl TactileEngine {
    pub fn new(scheduler: Arc<dyn Scheduler>, actuator: Arc<dyn Actuator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                scheduler,
                actuator,
                state: Mutex::new(TactileState::default()),
            }),
        }
    }

    /// Begin a segment: idle bed now, first tick one interval later.
    /// Restarts cleanly if a segment is already running.
    pub fn start(&self, signature: HapticSignature) {
        let mut state = self.shared.lock();
        if let Some(mut old) = state.segment.take() {
            cancel_slot(&mut old.timer);
        }
        state.generation += 1;
        state.segment = Some(Segment {
            signature,
            density: 0,
            tick_index: 0,
            boost: CountedTick::expired(MOVEMENT_BOOST_TICKS),
            timer: None,
        });
        self.shared.actuator.continuous(idle_bed(signature));
        arm(&self.shared, &mut state);
        debug!(%signature, "tactile segment started");
    }

    /// Record a new density and reopen the movement boost window.
    pub fn update_density(&self, dot_count: i32) {
        let mut state = self.shared.lock();
        if let Some(segment) = state.segment.as_mut() {
            segment.density = clamp_density(dot_count);
            segment.boost.reset();
        }
    }

    /// Disarm the tick channel and silence the bed. Idempotent.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        state.generation += 1;
        if let Some(mut segment) = state.segment.take() {
            cancel_slot(&mut segment.timer);
            self.shared.actuator.silence();
            debug!(ticks = segment.tick_index, "tactile segment stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().segment.is_some()
    }

    pub fn signature(&self) -> Option<HapticSignature> {
        self.shared.lock().segment.as_ref().map(|s| s.signature)
    }

    pub fn density(&self) -> i32 {
        self.shared.lock().segment.as_ref().map_or(0, |s| s.density)
    }

    /// Ticks fired in the current segment.
    pub fn tick_index(&self) -> u64 {
        self.shared.lock().segment.as_ref().map_or(0, |s| s.tick_index)
    }

    pub fn boost_active(&self) -> bool {
        self.shared
            .lock()
            .segment
            .as_ref()
            .is_some_and(|s| s.boost.within_window())
    }
}

fn arm(shared: &Arc<Shared>, state: &mut TactileState) {
    let generation = state.generation;
    let Some(segment) = state.segment.as_mut() else {
        return;
    };
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let handle = shared.scheduler.schedule(
        segment.signature.tick_interval(),
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                tick(&shared, generation);
            }
        }),
    );
    segment.timer = Some(handle);
}

fn tick(shared: &Arc<Shared>, generation: u64) {
    let mut state = shared.lock();
    if state.generation != generation {
        return;
    }
    let Some(segment) = state.segment.as_mut() else {
        return;
    };

    let signature = segment.signature;
    let elapsed = elapsed_at(segment.tick_index, signature.tick_interval());
    let frame = signature.frame(segment.tick_index, elapsed);
    let out = blend(signature, &frame, segment.density, segment.boost.within_window());

    if let Some(intensity) = out.tick {
        shared.actuator.impulse(Impulse {
            style: ImpactStyle::Rigid,
            intensity,
        });
    }
    shared.actuator.continuous(out.bed);

    segment.boost.advance();
    segment.tick_index += 1;
    arm(shared, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Recorder;
    use crate::scheduler::VirtualScheduler;
    use approx::assert_abs_diff_eq;

    fn engine() -> (Arc<VirtualScheduler>, Recorder, TactileEngine) {
        let clock = Arc::new(VirtualScheduler::new());
        let rec = Recorder::clocked(Arc::clone(&clock));
        let engine = TactileEngine::new(clock.clone(), Arc::new(rec.clone()));
        (clock, rec, engine)
    }

    #[test]
    fn test_blend_neutral_mid_density() {
        let sig = HapticSignature::Neutral;
        let out = blend(sig, &sig.frame(0, 0.0), 3, false);
        // 0.45 * (0.5 * 0.78) + 0.55 * 0.51
        assert_abs_diff_eq!(out.tick.unwrap(), 0.456, epsilon = 1e-9);
        // 0.40 * (0.5 * 0.75) + 0.60 * 0.35
        assert_abs_diff_eq!(out.bed.intensity, 0.36, epsilon = 1e-9);
        // 0.45 * (0.45 * 0.85) + 0.55 * 0.50
        assert_abs_diff_eq!(out.bed.sharpness, 0.447125, epsilon = 1e-9);
    }

    #[test]
    fn test_blend_boost_leaves_sharpness_alone() {
        let sig = HapticSignature::Urgent;
        let frame = sig.frame(0, 0.0);
        let plain = blend(sig, &frame, 2, false);
        let boosted = blend(sig, &frame, 2, true);
        assert_abs_diff_eq!(
            boosted.tick.unwrap(),
            (plain.tick.unwrap() * MOVEMENT_BOOST).min(1.0),
            epsilon = 1e-9
        );
        assert_eq!(plain.bed.sharpness, boosted.bed.sharpness);
    }

    #[test]
    fn test_blend_clamps_to_unit() {
        let sig = HapticSignature::Anger;
        let out = blend(sig, &sig.frame(0, 0.0), 6, true);
        assert!(out.tick.unwrap() <= 1.0);
        assert!(out.bed.intensity <= 1.0);
    }

    #[test]
    fn test_start_sets_idle_bed_then_ticks_on_cadence() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Neutral);

        let beds = rec.bed_levels();
        assert_eq!(beds.len(), 1);
        assert_abs_diff_eq!(beds[0].intensity, 0.10, epsilon = 1e-9);
        assert_abs_diff_eq!(beds[0].sharpness, 0.27, epsilon = 1e-9);
        assert!(rec.impulses().is_empty());

        clock.advance_ms(100);
        let times: Vec<u64> = rec.timed_impulses().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![33, 66, 99]);
        assert_eq!(engine.tick_index(), 3);
        assert_eq!(rec.bed_levels().len(), 4);
    }

    #[test]
    fn test_no_ghost_tick_after_stop() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Urgent);
        clock.advance_ms(30);
        assert_eq!(rec.impulses().len(), 1);

        engine.stop();
        assert_eq!(clock.pending_count(), 0);
        clock.advance_ms(1_000);
        assert_eq!(rec.impulses().len(), 1);
        assert_eq!(rec.silences(), 1);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_clock, rec, engine) = engine();
        engine.stop();
        engine.start(HapticSignature::Calm);
        engine.stop();
        engine.stop();
        assert_eq!(rec.silences(), 1);
    }

    #[test]
    fn test_restart_replaces_cadence() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Urgent);
        engine.start(HapticSignature::Calm);
        assert_eq!(clock.pending_count(), 1);

        clock.advance_ms(45);
        assert_eq!(rec.timed_impulses().len(), 1);
        assert_eq!(rec.timed_impulses()[0].0, 45);
        assert_eq!(engine.signature(), Some(HapticSignature::Calm));
    }

    #[test]
    fn test_update_density_never_ticks() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Neutral);
        for n in 0..10 {
            engine.update_density(n);
        }
        assert!(rec.impulses().is_empty());
        assert_eq!(engine.density(), 6);
        assert_eq!(clock.pending_count(), 1);
    }

    #[test]
    fn test_boost_lasts_three_ticks() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Neutral);
        engine.update_density(3);
        assert!(engine.boost_active());

        clock.advance_ms(33 * 5);
        let strengths: Vec<f64> = rec.impulses().iter().map(|i| i.intensity).collect();
        assert_eq!(strengths.len(), 5);
        for s in &strengths[..3] {
            assert_abs_diff_eq!(*s, 0.456 * MOVEMENT_BOOST, epsilon = 1e-9);
        }
        for s in &strengths[3..] {
            assert_abs_diff_eq!(*s, 0.456, epsilon = 1e-9);
        }
        assert!(!engine.boost_active());
    }

    #[test]
    fn test_repeated_update_rearms_boost() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Neutral);
        engine.update_density(3);
        clock.advance_ms(66);
        engine.update_density(3);
        clock.advance_ms(99);
        let strengths: Vec<f64> = rec.impulses().iter().map(|i| i.intensity).collect();
        assert_eq!(strengths.len(), 5);
        assert!(strengths.iter().all(|s| (s - 0.456 * MOVEMENT_BOOST).abs() < 1e-9));
    }

    #[test]
    fn test_anger_suppresses_ticks_but_updates_bed() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Anger);
        clock.advance_ms(18 * 6);

        let times: Vec<u64> = rec.timed_impulses().iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![18, 36, 72]);
        assert_eq!(rec.bed_levels().len(), 1 + 6);
    }

    #[test]
    fn test_ticks_use_rigid_impacts() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Empathy);
        clock.advance_ms(90);
        assert!(rec.impulses().iter().all(|i| i.style == ImpactStyle::Rigid));
    }

    #[test]
    fn test_dropped_engine_stops_ticking() {
        let (clock, rec, engine) = engine();
        engine.start(HapticSignature::Urgent);
        drop(engine);
        clock.advance_ms(200);
        assert!(rec.impulses().is_empty());
    }
}
