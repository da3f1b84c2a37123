//! Target capability consumed by the engine.
//!
//! Hosts expose their scene-graph object behind this trait; methods take
//! `&self` so implementations use interior mutability (the engine is
//! single-threaded, see `Engine`). Euler angles are degrees throughout.

use nalgebra::{UnitQuaternion, Vector3};

/// Get/set surface for world and local position, rotation, local euler
/// angles, and local scale, plus a liveness probe. A dead target is treated
/// exactly like an absent one: the tween is dropped without callbacks.
pub trait TransformTarget {
    fn position(&self) -> Vector3<f32>;
    fn set_position(&self, value: Vector3<f32>);

    fn local_position(&self) -> Vector3<f32>;
    fn set_local_position(&self, value: Vector3<f32>);

    fn rotation(&self) -> UnitQuaternion<f32>;
    fn set_rotation(&self, value: UnitQuaternion<f32>);

    fn local_rotation(&self) -> UnitQuaternion<f32>;
    fn set_local_rotation(&self, value: UnitQuaternion<f32>);

    /// Local euler angles in degrees.
    fn local_euler_angles(&self) -> Vector3<f32>;
    fn set_local_euler_angles(&self, value: Vector3<f32>);

    fn local_scale(&self) -> Vector3<f32>;
    fn set_local_scale(&self, value: Vector3<f32>);

    /// Whether the underlying host object still exists.
    fn is_alive(&self) -> bool {
        true
    }
}
