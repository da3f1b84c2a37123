//! Engine (runner): registry of active tween instances, slot pool, the
//! per-tick update loop, factories, and handle mutators.
//!
//! Single-threaded and cooperative: one `tick(dt, unscaled_dt)` call
//! advances every active instance synchronously. The engine is an
//! explicit object owned by the embedding application; constructing two
//! engines gives two fully independent registries.

use crate::config::Config;
use crate::ease::EaseKind;
use crate::ids::{IdAllocator, TweenHandle};
use crate::target::TransformTarget;
use crate::tween::{
    DurationState, KindState, LoopCount, LoopType, Sample, Space, TweenInstance,
};
use nalgebra::{UnitQuaternion, Vector3};
use std::rc::Rc;
use tracing::{debug, warn};

/// Guard subtracted from active time before computing the cycle index, so
/// a sample landing exactly on a cycle edge is attributed to the earlier
/// cycle instead of flickering into the next one.
pub(crate) const CYCLE_EPSILON: f32 = 1e-4;

enum StepOutcome {
    /// Still scheduled or running; keep in the registry.
    Keep,
    /// Remove and recycle without callbacks (killed, or target lost, or a
    /// callback fault already terminated it).
    Discard,
    /// Reached its terminal value this tick; completion already fired.
    Finished,
}

pub struct Engine {
    slots: Vec<TweenInstance>,
    active: Vec<u32>,
    free: Vec<u32>,
    ids: IdAllocator,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        let mut slots = Vec::with_capacity(cfg.initial_slots);
        for _ in 0..cfg.initial_slots {
            slots.push(TweenInstance::blank());
        }
        // Filled descending so pop() hands out slot 0 first.
        let free: Vec<u32> = (0..cfg.initial_slots as u32).rev().collect();
        Self {
            slots,
            active: Vec::with_capacity(cfg.active_capacity),
            free,
            ids: IdAllocator::new(),
        }
    }

    /// Number of instances currently registered (including killed ones
    /// awaiting their lazy removal pass).
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// A handle is valid while its captured id matches the slot's current
    /// instance and that instance has not completed. Recycling a slot
    /// assigns a fresh id, so stale handles fail this check.
    pub fn is_valid(&self, handle: TweenHandle) -> bool {
        self.instance(handle).is_some()
    }

    fn instance(&self, handle: TweenHandle) -> Option<&TweenInstance> {
        let inst = self.slots.get(handle.slot as usize)?;
        (inst.id == handle.id && !inst.completed).then_some(inst)
    }

    fn instance_mut(&mut self, handle: TweenHandle) -> Option<&mut TweenInstance> {
        let inst = self.slots.get_mut(handle.slot as usize)?;
        (inst.id == handle.id && !inst.completed).then_some(inst)
    }

    fn spawn(&mut self, build: impl FnOnce(&mut TweenInstance)) -> TweenHandle {
        let slot = self.free.pop().unwrap_or_else(|| {
            self.slots.push(TweenInstance::blank());
            (self.slots.len() - 1) as u32
        });
        let id = self.ids.alloc();
        let inst = &mut self.slots[slot as usize];
        inst.reset();
        inst.id = id;
        inst.completed = false;
        build(inst);
        self.active.push(slot);
        TweenHandle::new(slot, id)
    }

    fn spawn_targeted(
        &mut self,
        target: Rc<dyn TransformTarget>,
        duration: f32,
        build: impl FnOnce(&mut TweenInstance),
    ) -> TweenHandle {
        if !target.is_alive() {
            warn!("tween requested for a destroyed target; returning invalid handle");
            return TweenHandle::invalid();
        }
        self.spawn(|inst| {
            inst.target = Some(target);
            inst.duration = DurationState::Fixed(duration.max(0.0));
            build(inst);
        })
    }

    // ---- factories -----------------------------------------------------

    /// Move between two explicit positions; the start is known up front.
    pub fn move_between(
        &mut self,
        target: Rc<dyn TransformTarget>,
        from: Vector3<f32>,
        to: Vector3<f32>,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.captured = true;
            inst.state = KindState::Move {
                start: from,
                end: to,
            };
        })
    }

    /// Move to an absolute position; the start is captured from the target
    /// when the tween first runs.
    pub fn move_to(
        &mut self,
        target: Rc<dyn TransformTarget>,
        to: Vector3<f32>,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.state = KindState::Move {
                start: Vector3::zeros(),
                end: to,
            };
        })
    }

    /// Move by a delta relative to wherever the target is when the tween
    /// first runs.
    pub fn move_by(
        &mut self,
        target: Rc<dyn TransformTarget>,
        delta: Vector3<f32>,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.relative = true;
            inst.state = KindState::Move {
                start: Vector3::zeros(),
                end: delta,
            };
        })
    }

    /// Jump between two explicit positions with a sine arc of `height`
    /// repeated `arcs` times.
    #[allow(clippy::too_many_arguments)]
    pub fn jump_between(
        &mut self,
        target: Rc<dyn TransformTarget>,
        from: Vector3<f32>,
        to: Vector3<f32>,
        height: f32,
        arcs: u32,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.captured = true;
            inst.state = KindState::Jump {
                start: from,
                end: to,
                height,
                arcs,
            };
        })
    }

    pub fn jump_to(
        &mut self,
        target: Rc<dyn TransformTarget>,
        to: Vector3<f32>,
        height: f32,
        arcs: u32,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.state = KindState::Jump {
                start: Vector3::zeros(),
                end: to,
                height,
                arcs,
            };
        })
    }

    /// Decaying positional oscillation around wherever the target is when
    /// the tween first runs. `vibrato` is the oscillation count (3 is the
    /// customary default).
    pub fn punch_position(
        &mut self,
        target: Rc<dyn TransformTarget>,
        amplitude: Vector3<f32>,
        vibrato: u32,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.state = KindState::Punch {
                origin: Vector3::zeros(),
                amplitude,
                vibrato,
            };
        })
    }

    /// Decaying oscillation of the local scale.
    pub fn punch_scale(
        &mut self,
        target: Rc<dyn TransformTarget>,
        amplitude: Vector3<f32>,
        vibrato: u32,
        duration: f32,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.state = KindState::PunchScale {
                origin: Vector3::zeros(),
                amplitude,
                vibrato,
            };
        })
    }

    /// Rotate between two explicit orientations via spherical
    /// interpolation; the start is known up front.
    pub fn rotate_between(
        &mut self,
        target: Rc<dyn TransformTarget>,
        from: UnitQuaternion<f32>,
        to: UnitQuaternion<f32>,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.captured = true;
            inst.state = KindState::RotateQuat {
                start: from,
                end: to,
            };
        })
    }

    /// Rotate to an absolute orientation via spherical interpolation.
    pub fn rotate_to(
        &mut self,
        target: Rc<dyn TransformTarget>,
        to: UnitQuaternion<f32>,
        duration: f32,
        space: Space,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.space = space;
            inst.state = KindState::RotateQuat {
                start: UnitQuaternion::identity(),
                end: to,
            };
        })
    }

    /// Rotate by a euler-angle delta (degrees) relative to the captured
    /// local euler angles. Linear over euler components, for the cases
    /// where shortest-path quaternion interpolation is not wanted.
    pub fn rotate_by(
        &mut self,
        target: Rc<dyn TransformTarget>,
        delta_degrees: Vector3<f32>,
        duration: f32,
    ) -> TweenHandle {
        self.spawn_targeted(target, duration, |inst| {
            inst.state = KindState::RotateEuler {
                start: Vector3::zeros(),
                delta: delta_degrees,
            };
        })
    }

    /// Interpolate an arbitrary scalar, delivering each sample to `apply`
    /// and to any update callbacks.
    pub fn tween_float(
        &mut self,
        from: f32,
        to: f32,
        duration: f32,
        apply: impl FnMut(f32) + 'static,
    ) -> TweenHandle {
        self.spawn(|inst| {
            inst.duration = DurationState::Fixed(duration.max(0.0));
            inst.captured = true;
            inst.state = KindState::Scalar {
                from,
                to,
                apply: Box::new(apply),
            };
        })
    }

    // ---- handle mutators -----------------------------------------------

    pub fn set_ease(&mut self, handle: TweenHandle, ease: EaseKind) {
        if let Some(inst) = self.instance_mut(handle) {
            inst.ease = ease;
        }
    }

    /// Set the loop count and policy. Negative counts mean infinite; zero
    /// is normalized to one. No-op once a sequence sealed the timing.
    pub fn set_loops(&mut self, handle: TweenHandle, count: i64, loop_type: LoopType) {
        if let Some(inst) = self.instance_mut(handle) {
            if inst.sealed {
                return;
            }
            inst.loops = LoopCount::from_request(count);
            inst.loop_type = loop_type;
        }
    }

    /// Delay before the tween starts running. No-op once sealed.
    pub fn set_delay(&mut self, handle: TweenHandle, seconds: f32) {
        if let Some(inst) = self.instance_mut(handle) {
            if inst.sealed {
                return;
            }
            inst.delay = seconds.max(0.0);
        }
    }

    /// Reinterpret the configured duration as a speed; the actual duration
    /// becomes distance / speed once a start value is known. No-op once
    /// sealed or if already speed-based.
    pub fn set_speed_based(&mut self, handle: TweenHandle) {
        if let Some(inst) = self.instance_mut(handle) {
            if inst.sealed {
                return;
            }
            if let DurationState::Fixed(speed) = inst.duration {
                inst.duration = DurationState::SpeedBased {
                    speed,
                    resolved: None,
                    estimated: false,
                };
            }
        }
    }

    /// Advance this tween with the unscaled clock.
    pub fn set_ignore_time_scale(&mut self, handle: TweenHandle, ignore: bool) {
        if let Some(inst) = self.instance_mut(handle) {
            inst.use_unscaled_time = ignore;
        }
    }

    /// Register a completion callback. Callbacks are multicast: every
    /// registered one fires, in registration order.
    pub fn on_complete(&mut self, handle: TweenHandle, callback: impl FnMut() + 'static) {
        if let Some(inst) = self.instance_mut(handle) {
            inst.on_complete.push(Box::new(callback));
        }
    }

    /// Register a per-tick update callback. Targeted tweens report cycle
    /// progress in [0,1]; scalar tweens report the interpolated value.
    pub fn on_update(&mut self, handle: TweenHandle, callback: impl FnMut(f32) + 'static) {
        if let Some(inst) = self.instance_mut(handle) {
            inst.on_update.push(Box::new(callback));
        }
    }

    /// Flag the tween for lazy removal. No terminal value is written and
    /// no completion callback fires; the handle is invalid immediately.
    pub fn kill(&mut self, handle: TweenHandle) {
        if let Some(inst) = self.instance_mut(handle) {
            inst.completed = true;
        }
    }

    /// Force the terminal value and fire completion callbacks now,
    /// independent of the tick loop. Works on infinite-loop tweens, which
    /// never complete naturally.
    pub fn complete(&mut self, handle: TweenHandle) {
        if let Some(inst) = self.instance_mut(handle) {
            if inst.needs_target() && !inst.target_alive() {
                inst.completed = true;
                return;
            }
            if !inst.capture_start() {
                inst.completed = true;
                return;
            }
            let terminal = inst.terminal_sample();
            if inst.write(terminal) {
                inst.fire_complete();
            }
            inst.completed = true;
        }
    }

    /// Drop every registered tween down the kill path: no writes, no
    /// callbacks. Leaves the engine empty and every handle invalid.
    pub fn kill_all(&mut self) {
        debug!(count = self.active.len(), "killing all tweens");
        for &slot in &self.active {
            let inst = &mut self.slots[slot as usize];
            inst.reset();
            self.free.push(slot);
        }
        self.active.clear();
    }

    // ---- accessors & sequence support ----------------------------------

    /// Current delay in seconds, `None` for an invalid handle.
    pub fn delay_of(&self, handle: TweenHandle) -> Option<f32> {
        self.instance(handle).map(|inst| inst.delay)
    }

    /// Single-cycle duration in seconds. `None` for an invalid handle or
    /// while a speed-based duration is unresolved.
    pub fn duration_of(&self, handle: TweenHandle) -> Option<f32> {
        self.instance(handle).and_then(|inst| inst.duration.value())
    }

    /// Whether a sequence already claimed this tween's timing.
    pub(crate) fn is_sealed(&self, handle: TweenHandle) -> bool {
        self.instance(handle).is_some_and(|inst| inst.sealed)
    }

    pub(crate) fn is_speed_based(&self, handle: TweenHandle) -> bool {
        matches!(
            self.instance(handle).map(|inst| &inst.duration),
            Some(DurationState::SpeedBased { .. })
        )
    }

    /// Capture the start value out of band and resolve a pending duration,
    /// so a sequence can place the tween before it ever runs. If capture
    /// is impossible (target already gone), resolve an estimate from the
    /// supplied endpoints instead; the true start re-resolves it later.
    pub(crate) fn force_resolve(&mut self, handle: TweenHandle) {
        if let Some(inst) = self.instance_mut(handle) {
            if !inst.capture_start() {
                inst.resolve_duration();
            }
        }
    }

    /// Duration of all cycles, infinity for infinite loops; `None` if a
    /// speed-based duration is still unresolved.
    pub(crate) fn timeline_total(&self, handle: TweenHandle) -> Option<f32> {
        self.instance(handle).and_then(|inst| inst.total_duration())
    }

    /// Rewrite the delay for timeline placement and seal the timing so the
    /// tween cannot be re-placed or retimed afterwards. A tween that is
    /// already sealed keeps its placement.
    pub(crate) fn place_in_timeline(&mut self, handle: TweenHandle, delay: f32) {
        if let Some(inst) = self.instance_mut(handle) {
            if inst.sealed {
                return;
            }
            inst.delay = delay.max(0.0);
            inst.sealed = true;
        }
    }

    // ---- tick loop ------------------------------------------------------

    /// Advance every active instance. `dt` is the scaled frame delta,
    /// `unscaled_dt` the wall-clock delta; each instance picks per its
    /// ignore-time-scale flag. All work completes before this returns.
    pub fn tick(&mut self, dt: f32, unscaled_dt: f32) {
        // Reverse iteration so swap-remove only disturbs already-visited
        // entries. Registry order carries no semantics.
        let mut i = self.active.len();
        while i > 0 {
            i -= 1;
            let slot = self.active[i];
            let outcome = step_instance(&mut self.slots[slot as usize], dt, unscaled_dt);
            match outcome {
                StepOutcome::Keep => {}
                StepOutcome::Discard | StepOutcome::Finished => {
                    self.active.swap_remove(i);
                    self.slots[slot as usize].reset();
                    self.free.push(slot);
                }
            }
        }
    }
}

/// Advance a single instance by one tick. Performs the elapsed/delay
/// bookkeeping, capture and duration resolution, cycle math, easing,
/// interpolation, target write, callbacks, and the exact terminal write on
/// the final boundary.
fn step_instance(inst: &mut TweenInstance, dt: f32, unscaled_dt: f32) -> StepOutcome {
    // Killed out of band, or the host object went away: reclaim silently.
    if inst.completed {
        return StepOutcome::Discard;
    }
    if inst.needs_target() && !inst.target_alive() {
        inst.completed = true;
        return StepOutcome::Discard;
    }

    inst.elapsed += if inst.use_unscaled_time {
        unscaled_dt
    } else {
        dt
    };
    let active_time = inst.elapsed - inst.delay;
    if active_time < 0.0 {
        return StepOutcome::Keep;
    }

    if !inst.capture_start() {
        inst.completed = true;
        return StepOutcome::Discard;
    }
    let Some(duration) = inst.duration.value() else {
        // Unreachable after capture, but never wedge the registry on it.
        inst.completed = true;
        return StepOutcome::Discard;
    };

    // Zero-length tweens finish on their first running tick.
    if duration <= 0.0 {
        return finish(inst);
    }

    let finite_loops = match inst.loops {
        LoopCount::Finite(n) => Some(n),
        LoopCount::Infinite => None,
    };

    let raw_cycle = ((active_time - CYCLE_EPSILON) / duration).floor().max(0.0);
    let mut cycle = raw_cycle as u64;
    if let Some(n) = finite_loops {
        cycle = cycle.min(n - 1);
    }
    let cycle_time = (active_time - cycle as f32 * duration).clamp(0.0, duration);
    let progress = (cycle_time / duration).clamp(0.0, 1.0);
    let k = inst.ease.sample(progress);

    let sample = inst.sample(k, cycle);
    let update_value = match &sample {
        Sample::Scalar(v) => *v,
        _ => progress,
    };
    if !inst.write(sample) {
        inst.completed = true;
        return StepOutcome::Discard;
    }
    if !inst.fire_update(update_value) {
        inst.completed = true;
        return StepOutcome::Discard;
    }

    if let Some(n) = finite_loops {
        if active_time >= duration * n as f32 {
            return finish(inst);
        }
    }
    StepOutcome::Keep
}

/// Write the exact terminal value and fire completion callbacks.
fn finish(inst: &mut TweenInstance) -> StepOutcome {
    let terminal = inst.terminal_sample();
    if inst.write(terminal) {
        inst.fire_complete();
    }
    inst.completed = true;
    StepOutcome::Finished
}
