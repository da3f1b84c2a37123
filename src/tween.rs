//! Tween instance: the per-animation data and timing state machine.
//!
//! An instance moves Capturing -> Scheduled -> Running -> Completed. The
//! engine owns every instance through its slot registry; application code
//! only ever sees `TweenHandle`s.

use crate::ease::EaseKind;
use crate::ids::TweenId;
use crate::interp::{
    cycle_endpoints_f32, cycle_endpoints_quat, cycle_endpoints_vec3, jump_offset, lerp_f32,
    lerp_vec3, punch_factor, rotation_angle_deg, slerp_unclamped, terminal_f32, terminal_quat,
    terminal_vec3,
};
use crate::target::TransformTarget;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use tracing::error;

/// Loop policy across cycles.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoopType {
    #[default]
    Restart,
    /// Swap endpoints on alternating cycles.
    Yoyo,
    /// Shift both endpoints by the prior cycle's delta each repetition.
    Incremental,
}

/// Total cycle count. Finite counts are always >= 1; a requested count of
/// zero is normalized to one at assignment.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LoopCount {
    Finite(u64),
    Infinite,
}

impl LoopCount {
    /// Normalize a signed request: negative => infinite, 0 => 1.
    pub fn from_request(count: i64) -> Self {
        if count < 0 {
            LoopCount::Infinite
        } else {
            LoopCount::Finite((count as u64).max(1))
        }
    }
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Finite(1)
    }
}

/// Which accessor pair of the target a tween reads and writes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Space {
    #[default]
    World,
    Local,
}

/// Duration as a two-state value: either fixed up front, or derived from a
/// speed once a travel distance is knowable. A speed-based duration
/// resolved before the start value was captured is an estimate and is
/// re-resolved exactly once at capture.
#[derive(Debug)]
pub(crate) enum DurationState {
    Fixed(f32),
    SpeedBased {
        speed: f32,
        resolved: Option<f32>,
        estimated: bool,
    },
}

impl DurationState {
    #[inline]
    pub fn value(&self) -> Option<f32> {
        match self {
            DurationState::Fixed(d) => Some(*d),
            DurationState::SpeedBased { resolved, .. } => *resolved,
        }
    }
}

/// Per-kind interpolation state. Endpoints live in the variant; capture
/// fills in the start (or origin) field once the tween begins running.
pub(crate) enum KindState {
    Move {
        start: Vector3<f32>,
        end: Vector3<f32>,
    },
    Jump {
        start: Vector3<f32>,
        end: Vector3<f32>,
        height: f32,
        arcs: u32,
    },
    Punch {
        origin: Vector3<f32>,
        amplitude: Vector3<f32>,
        vibrato: u32,
    },
    PunchScale {
        origin: Vector3<f32>,
        amplitude: Vector3<f32>,
        vibrato: u32,
    },
    RotateQuat {
        start: UnitQuaternion<f32>,
        end: UnitQuaternion<f32>,
    },
    /// Relative rotation over euler-angle vectors (degrees), for cases
    /// where shortest-path quaternion interpolation is the wrong semantic.
    RotateEuler {
        start: Vector3<f32>,
        delta: Vector3<f32>,
    },
    Scalar {
        from: f32,
        to: f32,
        apply: Box<dyn FnMut(f32)>,
    },
}

/// A value computed for one sample, destined for one target accessor or
/// the scalar setter.
pub(crate) enum Sample {
    Position(Vector3<f32>),
    Rotation(UnitQuaternion<f32>),
    Euler(Vector3<f32>),
    Scale(Vector3<f32>),
    Scalar(f32),
}

pub(crate) struct TweenInstance {
    pub id: TweenId,
    pub target: Option<Rc<dyn TransformTarget>>,
    pub space: Space,
    pub use_unscaled_time: bool,
    pub ease: EaseKind,
    pub state: KindState,
    /// Start endpoint has been recorded. Factories with an explicit start
    /// set this at creation; capture-on-play tweens record it on their
    /// first running tick (or when force-started by a sequence).
    pub captured: bool,
    /// Move/Jump only: `end` holds a delta until capture rewrites it.
    pub relative: bool,
    pub duration: DurationState,
    pub delay: f32,
    pub elapsed: f32,
    pub loops: LoopCount,
    pub loop_type: LoopType,
    /// Timing was claimed by a sequence; delay/loop/speed mutators no-op.
    pub sealed: bool,
    pub completed: bool,
    pub on_complete: Vec<Box<dyn FnMut()>>,
    pub on_update: Vec<Box<dyn FnMut(f32)>>,
}

impl TweenInstance {
    pub fn blank() -> Self {
        Self {
            id: TweenId::NONE,
            target: None,
            space: Space::World,
            use_unscaled_time: false,
            ease: EaseKind::Linear,
            state: KindState::Move {
                start: Vector3::zeros(),
                end: Vector3::zeros(),
            },
            captured: false,
            relative: false,
            duration: DurationState::Fixed(0.0),
            delay: 0.0,
            elapsed: 0.0,
            loops: LoopCount::default(),
            loop_type: LoopType::Restart,
            sealed: false,
            completed: true,
            on_complete: Vec::new(),
            on_update: Vec::new(),
        }
    }

    /// Return the slot to a reusable blank. Callback vectors keep their
    /// capacity; target and closures are dropped.
    pub fn reset(&mut self) {
        self.id = TweenId::NONE;
        self.target = None;
        self.space = Space::World;
        self.use_unscaled_time = false;
        self.ease = EaseKind::Linear;
        self.state = KindState::Move {
            start: Vector3::zeros(),
            end: Vector3::zeros(),
        };
        self.captured = false;
        self.relative = false;
        self.duration = DurationState::Fixed(0.0);
        self.delay = 0.0;
        self.elapsed = 0.0;
        self.loops = LoopCount::default();
        self.loop_type = LoopType::Restart;
        self.sealed = false;
        self.completed = true;
        self.on_complete.clear();
        self.on_update.clear();
    }

    /// Every kind except Scalar drives a target capability.
    #[inline]
    pub fn needs_target(&self) -> bool {
        !matches!(self.state, KindState::Scalar { .. })
    }

    #[inline]
    pub fn target_alive(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.is_alive())
    }

    /// Record the start value from the target's current state. Returns
    /// false when a required target is gone. Re-resolves a speed-based
    /// duration that was only estimated so far.
    pub fn capture_start(&mut self) -> bool {
        if !self.captured {
            if self.needs_target() {
                let Some(target) = self.target.clone() else {
                    return false;
                };
                if !target.is_alive() {
                    return false;
                }
                let space = self.space;
                let relative = self.relative;
                match &mut self.state {
                    KindState::Move { start, end } | KindState::Jump { start, end, .. } => {
                        *start = read_position(&*target, space);
                        if relative {
                            *end += *start;
                        }
                    }
                    KindState::Punch { origin, .. } => {
                        *origin = read_position(&*target, space);
                    }
                    KindState::PunchScale { origin, .. } => {
                        *origin = target.local_scale();
                    }
                    KindState::RotateQuat { start, .. } => {
                        *start = read_rotation(&*target, space);
                    }
                    KindState::RotateEuler { start, .. } => {
                        *start = target.local_euler_angles();
                    }
                    KindState::Scalar { .. } => {}
                }
            }
            self.captured = true;
        }
        self.resolve_duration();
        true
    }

    /// Scalar travel distance for speed-based duration resolution.
    fn distance(&self) -> f32 {
        match &self.state {
            KindState::Move { start, end } | KindState::Jump { start, end, .. } => {
                if self.relative && !self.captured {
                    // `end` still holds the delta.
                    end.norm()
                } else {
                    (end - start).norm()
                }
            }
            KindState::Punch { amplitude, .. } | KindState::PunchScale { amplitude, .. } => {
                amplitude.norm()
            }
            KindState::RotateQuat { start, end } => rotation_angle_deg(start, end),
            KindState::RotateEuler { delta, .. } => delta.norm(),
            KindState::Scalar { from, to, .. } => (to - from).abs(),
        }
    }

    /// Compute a pending speed-based duration, or recompute one that was
    /// estimated from pre-capture endpoints. No-op for fixed durations.
    pub fn resolve_duration(&mut self) {
        let (speed, stale) = match self.duration {
            DurationState::SpeedBased {
                speed,
                resolved,
                estimated,
            } => (speed, resolved.is_none() || estimated),
            DurationState::Fixed(_) => return,
        };
        if !stale {
            return;
        }
        let dist = self.distance();
        let duration = if speed <= 0.0 || dist <= 0.0 {
            0.0
        } else {
            dist / speed
        };
        self.duration = DurationState::SpeedBased {
            speed,
            resolved: Some(duration),
            estimated: !self.captured,
        };
    }

    /// Duration of all cycles combined; `None` while a speed-based
    /// duration is unresolved, infinity for infinite loops.
    pub fn total_duration(&self) -> Option<f32> {
        let d = self.duration.value()?;
        Some(match self.loops {
            LoopCount::Finite(n) => d * n as f32,
            LoopCount::Infinite => f32::INFINITY,
        })
    }

    /// Interpolated value at eased factor `k` within the given cycle.
    pub fn sample(&self, k: f32, cycle: u64) -> Sample {
        let lt = self.loop_type;
        match &self.state {
            KindState::Move { start, end } => {
                let (s, e) = cycle_endpoints_vec3(*start, *end, lt, cycle);
                Sample::Position(lerp_vec3(s, e, k))
            }
            KindState::Jump {
                start,
                end,
                height,
                arcs,
            } => {
                let (s, e) = cycle_endpoints_vec3(*start, *end, lt, cycle);
                let mut v = lerp_vec3(s, e, k);
                v.y += jump_offset(k, *height, *arcs);
                Sample::Position(v)
            }
            KindState::Punch {
                origin,
                amplitude,
                vibrato,
            } => Sample::Position(origin + amplitude * punch_factor(k, *vibrato)),
            KindState::PunchScale {
                origin,
                amplitude,
                vibrato,
            } => Sample::Scale(origin + amplitude * punch_factor(k, *vibrato)),
            KindState::RotateQuat { start, end } => {
                let (s, e) = cycle_endpoints_quat(start, end, lt, cycle);
                Sample::Rotation(slerp_unclamped(&s, &e, k))
            }
            KindState::RotateEuler { start, delta } => {
                let (s, e) = cycle_endpoints_vec3(*start, *start + *delta, lt, cycle);
                Sample::Euler(lerp_vec3(s, e, k))
            }
            KindState::Scalar { from, to, .. } => {
                let (s, e) = cycle_endpoints_f32(*from, *to, lt, cycle);
                Sample::Scalar(lerp_f32(s, e, k))
            }
        }
    }

    /// Exact completion value, independent of the last interpolated
    /// sample. Infinite-loop tweens terminate on the end endpoint (only
    /// reachable through an explicit complete).
    pub fn terminal_sample(&self) -> Sample {
        let lt = self.loop_type;
        let n = match self.loops {
            LoopCount::Finite(n) => n,
            LoopCount::Infinite => 1,
        };
        match &self.state {
            KindState::Move { start, end } | KindState::Jump { start, end, .. } => {
                Sample::Position(terminal_vec3(*start, *end, lt, n))
            }
            // Displacement decays to zero by construction; write the
            // literal origin to kill residual floating error.
            KindState::Punch { origin, .. } => Sample::Position(*origin),
            KindState::PunchScale { origin, .. } => Sample::Scale(*origin),
            KindState::RotateQuat { start, end } => {
                Sample::Rotation(terminal_quat(start, end, lt, n))
            }
            KindState::RotateEuler { start, delta } => {
                Sample::Euler(terminal_vec3(*start, *start + *delta, lt, n))
            }
            KindState::Scalar { from, to, .. } => Sample::Scalar(terminal_f32(*from, *to, lt, n)),
        }
    }

    /// Write a targeted sample to the selected accessor, or push a scalar
    /// through the setter capability. Returns false when the setter
    /// panicked (the caller terminates the instance).
    pub fn write(&mut self, sample: Sample) -> bool {
        match sample {
            Sample::Scalar(v) => {
                if let KindState::Scalar { apply, .. } = &mut self.state {
                    let id = self.id;
                    if catch_unwind(AssertUnwindSafe(|| apply(v))).is_err() {
                        error!(tween = id.0, "scalar setter panicked; tween aborted");
                        return false;
                    }
                }
                true
            }
            Sample::Position(v) => {
                if let Some(t) = &self.target {
                    match self.space {
                        Space::World => t.set_position(v),
                        Space::Local => t.set_local_position(v),
                    }
                }
                true
            }
            Sample::Rotation(q) => {
                if let Some(t) = &self.target {
                    match self.space {
                        Space::World => t.set_rotation(q),
                        Space::Local => t.set_local_rotation(q),
                    }
                }
                true
            }
            Sample::Euler(e) => {
                if let Some(t) = &self.target {
                    t.set_local_euler_angles(e);
                }
                true
            }
            Sample::Scale(s) => {
                if let Some(t) = &self.target {
                    t.set_local_scale(s);
                }
                true
            }
        }
    }

    /// Fire update callbacks in registration order. A panicking callback
    /// is logged and stops the instance; no further callbacks run.
    pub fn fire_update(&mut self, value: f32) -> bool {
        let id = self.id;
        for cb in &mut self.on_update {
            if catch_unwind(AssertUnwindSafe(|| cb(value))).is_err() {
                error!(tween = id.0, "update callback panicked; tween aborted");
                return false;
            }
        }
        true
    }

    /// Fire completion callbacks in registration order. Panics are logged;
    /// the instance is already terminal either way.
    pub fn fire_complete(&mut self) {
        let id = self.id;
        for cb in &mut self.on_complete {
            if catch_unwind(AssertUnwindSafe(|| cb())).is_err() {
                error!(tween = id.0, "completion callback panicked");
                return;
            }
        }
    }
}

#[inline]
fn read_position(target: &dyn TransformTarget, space: Space) -> Vector3<f32> {
    match space {
        Space::World => target.position(),
        Space::Local => target.local_position(),
    }
}

#[inline]
fn read_rotation(target: &dyn TransformTarget, space: Space) -> UnitQuaternion<f32> {
    match space {
        Space::World => target.rotation(),
        Space::Local => target.local_rotation(),
    }
}
