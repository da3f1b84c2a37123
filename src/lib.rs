//! tween-core: an engine-agnostic tween engine.
//!
//! One `Engine` owns a registry of tween instances and advances them all
//! on each `tick(dt, unscaled_dt)` call: eased interpolation of positions,
//! rotations, scale punches, and arbitrary scalars, with delays, loop
//! policies (restart / yoyo / incremental), speed-derived durations, and
//! timeline composition through `Sequence`.
//!
//! Hosts plug in by implementing [`TransformTarget`] for their scene-graph
//! object and calling `tick` once per frame. Application code holds only
//! [`TweenHandle`]s; a handle goes invalid the moment its tween completes,
//! is killed, or its pooled slot is recycled.

pub mod config;
pub mod ease;
pub mod engine;
pub mod ids;
pub mod interp;
pub mod sequence;
pub mod target;
pub mod tween;

pub use config::Config;
pub use ease::EaseKind;
pub use engine::Engine;
pub use ids::{TweenHandle, TweenId};
pub use sequence::Sequence;
pub use target::TransformTarget;
pub use tween::{LoopCount, LoopType, Space};
