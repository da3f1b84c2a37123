//! Interpolation helpers:
//! - unclamped scalar/vector lerp
//! - unclamped quaternion SLERP with an NLERP fallback near 180 degrees
//! - per-cycle effective endpoints for Restart/Yoyo/Incremental loops
//! - terminal (exact completion) values per loop policy
//! - jump-arc and decaying punch offsets

use crate::tween::LoopType;
use nalgebra::{UnitQuaternion, Vector3};
use std::f32::consts::PI;

/// Linear interpolation of scalars, unclamped.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise vector lerp, unclamped.
#[inline]
pub fn lerp_vec3(a: Vector3<f32>, b: Vector3<f32>, t: f32) -> Vector3<f32> {
    a + (b - a) * t
}

/// Spherical interpolation without clamping `t`. Extrapolated results
/// (t outside [0,1]) come back unit-length by construction. Antipodal
/// endpoints have no unique shortest arc; fall back to hemisphere-aligned
/// NLERP there.
#[inline]
pub fn slerp_unclamped(
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
    t: f32,
) -> UnitQuaternion<f32> {
    match a.try_slerp(b, t, 1.0e-6) {
        Some(q) => q,
        None => {
            let mut qb = b.into_inner();
            if a.coords.dot(&b.coords) < 0.0 {
                qb = -qb;
            }
            UnitQuaternion::new_normalize(a.into_inner().lerp(&qb, t))
        }
    }
}

/// Shortest rotation angle between two orientations, in degrees.
#[inline]
pub fn rotation_angle_deg(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>) -> f32 {
    a.angle_to(b).to_degrees()
}

/// Vertical offset of a jump arc at eased factor `k`. Zero once the arc
/// lands (k >= 1).
#[inline]
pub fn jump_offset(k: f32, height: f32, arcs: u32) -> f32 {
    if k < 1.0 {
        (k * arcs as f32 * PI).sin() * height
    } else {
        0.0
    }
}

/// Decaying oscillation factor for punch effects: sin(k * vibrato * 2pi)
/// damped by (1 - k)^3 so the displacement is exactly zero at k = 1.
#[inline]
pub fn punch_factor(k: f32, vibrato: u32) -> f32 {
    let decay = 1.0 - k;
    (k * vibrato as f32 * 2.0 * PI).sin() * decay * decay * decay
}

/// Effective endpoints for a given 0-based cycle under a loop policy.
/// Incremental shifts both endpoints by the accumulated per-cycle delta;
/// Yoyo swaps them on odd cycles; Restart always uses the originals.
#[inline]
pub fn cycle_endpoints_vec3(
    start: Vector3<f32>,
    end: Vector3<f32>,
    loop_type: LoopType,
    cycle: u64,
) -> (Vector3<f32>, Vector3<f32>) {
    match loop_type {
        LoopType::Restart => (start, end),
        LoopType::Yoyo => {
            if cycle % 2 == 1 {
                (end, start)
            } else {
                (start, end)
            }
        }
        LoopType::Incremental => {
            let shift = (end - start) * cycle as f32;
            (start + shift, end + shift)
        }
    }
}

#[inline]
pub fn cycle_endpoints_f32(start: f32, end: f32, loop_type: LoopType, cycle: u64) -> (f32, f32) {
    match loop_type {
        LoopType::Restart => (start, end),
        LoopType::Yoyo => {
            if cycle % 2 == 1 {
                (end, start)
            } else {
                (start, end)
            }
        }
        LoopType::Incremental => {
            let shift = (end - start) * cycle as f32;
            (start + shift, end + shift)
        }
    }
}

/// Quaternion form of the cycle shift. The incremental delta is the
/// rotation carrying start onto end, applied `cycle` times via the
/// quaternion power.
#[inline]
pub fn cycle_endpoints_quat(
    start: &UnitQuaternion<f32>,
    end: &UnitQuaternion<f32>,
    loop_type: LoopType,
    cycle: u64,
) -> (UnitQuaternion<f32>, UnitQuaternion<f32>) {
    match loop_type {
        LoopType::Restart => (*start, *end),
        LoopType::Yoyo => {
            if cycle % 2 == 1 {
                (*end, *start)
            } else {
                (*start, *end)
            }
        }
        LoopType::Incremental => {
            let delta = start.inverse() * end;
            let shifted = *start * delta.powf(cycle as f32);
            (shifted, shifted * delta)
        }
    }
}

/// Exact completion value after `loops` finite cycles. Yoyo lands on the
/// start endpoint when the loop count is even; Incremental accumulates the
/// full delta per cycle; Restart always lands on the end endpoint.
#[inline]
pub fn terminal_vec3(
    start: Vector3<f32>,
    end: Vector3<f32>,
    loop_type: LoopType,
    loops: u64,
) -> Vector3<f32> {
    match loop_type {
        LoopType::Restart => end,
        LoopType::Yoyo => {
            if loops % 2 == 0 {
                start
            } else {
                end
            }
        }
        LoopType::Incremental => start + (end - start) * loops as f32,
    }
}

#[inline]
pub fn terminal_f32(start: f32, end: f32, loop_type: LoopType, loops: u64) -> f32 {
    match loop_type {
        LoopType::Restart => end,
        LoopType::Yoyo => {
            if loops % 2 == 0 {
                start
            } else {
                end
            }
        }
        LoopType::Incremental => start + (end - start) * loops as f32,
    }
}

#[inline]
pub fn terminal_quat(
    start: &UnitQuaternion<f32>,
    end: &UnitQuaternion<f32>,
    loop_type: LoopType,
    loops: u64,
) -> UnitQuaternion<f32> {
    match loop_type {
        LoopType::Restart => *end,
        LoopType::Yoyo => {
            if loops % 2 == 0 {
                *start
            } else {
                *end
            }
        }
        LoopType::Incremental => {
            let delta = start.inverse() * end;
            *start * delta.powf(loops as f32)
        }
    }
}
