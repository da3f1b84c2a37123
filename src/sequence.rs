//! Sequence composer: stitches independent tweens into one timeline by
//! rewriting their delays, then seals their timing so a tween cannot be
//! placed into two timelines with conflicting delays.

use crate::engine::Engine;
use crate::ids::TweenHandle;

/// Transient composition state. `append` builds sequential timelines,
/// `join` overlays a tween onto the start of the previously appended
/// segment, `append_interval` inserts a gap. Once a segment of unbounded
/// duration is appended the sequence locks: nothing can follow infinity,
/// so later appends kill their tween and leave the timeline unchanged.
#[derive(Debug, Default)]
pub struct Sequence {
    /// End of the timeline built so far.
    cursor: f32,
    /// Start of the last appended segment; join anchors here.
    prev_cursor: f32,
    locked: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total timeline length so far; infinite once locked.
    pub fn duration(&self) -> f32 {
        self.cursor
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Place a tween after everything appended so far. The tween's own
    /// delay is preserved as a gap before it. Speed-based tweens are
    /// force-started so their true duration is known before placement.
    /// A tween already placed in a timeline keeps its placement and is
    /// skipped here.
    pub fn append(&mut self, engine: &mut Engine, handle: TweenHandle) -> &mut Self {
        if !engine.is_valid(handle) || engine.is_sealed(handle) {
            return self;
        }
        if self.locked {
            engine.kill(handle);
            return self;
        }
        let (delay, total) = resolve_segment(engine, handle);
        engine.place_in_timeline(handle, self.cursor + delay);
        self.prev_cursor = self.cursor;
        if total.is_infinite() {
            self.locked = true;
            self.cursor = f32::INFINITY;
        } else {
            self.cursor += total + delay;
        }
        self
    }

    /// Place a tween alongside the previously appended segment instead of
    /// after it. Extends the timeline only if the joined tween outlasts
    /// what is already there; the join anchor does not advance.
    pub fn join(&mut self, engine: &mut Engine, handle: TweenHandle) -> &mut Self {
        if !engine.is_valid(handle) || engine.is_sealed(handle) {
            return self;
        }
        if self.locked {
            engine.kill(handle);
            return self;
        }
        let (delay, total) = resolve_segment(engine, handle);
        engine.place_in_timeline(handle, self.prev_cursor + delay);
        if total.is_infinite() {
            self.locked = true;
            self.cursor = f32::INFINITY;
        } else {
            self.cursor = self.cursor.max(self.prev_cursor + delay + total);
        }
        self
    }

    /// Pure bookkeeping gap; no tween involved.
    pub fn append_interval(&mut self, seconds: f32) -> &mut Self {
        if self.locked {
            self.cursor = f32::INFINITY;
            return self;
        }
        self.prev_cursor = self.cursor;
        self.cursor += seconds.max(0.0);
        self
    }
}

/// Current delay and total duration of a segment, resolving speed-based
/// durations by force-starting the tween first.
fn resolve_segment(engine: &mut Engine, handle: TweenHandle) -> (f32, f32) {
    if engine.is_speed_based(handle) {
        engine.force_resolve(handle);
    }
    let delay = engine.delay_of(handle).unwrap_or(0.0);
    let total = engine.timeline_total(handle).unwrap_or(0.0);
    (delay, total)
}
