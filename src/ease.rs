//! Easing library: a stateless mapping from (curve kind, normalized time)
//! to an eased factor. Back/elastic curves overshoot outside [0,1] but are
//! anchored at the endpoints; everything else maps 0 -> 0 and 1 -> 1.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const HALF_PI: f32 = PI / 2.0;

/// Named easing curves. `Linear` plus In/Out/InOut for ten families.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EaseKind {
    #[default]
    Linear,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InBack,
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    InBounce,
    OutBounce,
    InOutBounce,
}

/// Piecewise bounce-out over quarters of the unit interval.
#[inline]
fn out_bounce(mut t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        t -= 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        t -= 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        t -= 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl EaseKind {
    /// Evaluate the curve at `t` (expected in [0,1]). The result is not
    /// bounded to [0,1] for the overshooting families.
    pub fn sample(self, t: f32) -> f32 {
        const C1: f32 = 1.70158;
        const C2: f32 = 2.5949095;
        const C3: f32 = 2.70158;
        const C4: f32 = (2.0 * PI) / 3.0;
        const C5: f32 = (2.0 * PI) / 4.5;

        match self {
            EaseKind::Linear => t,
            EaseKind::InSine => 1.0 - (t * HALF_PI).cos(),
            EaseKind::OutSine => (t * HALF_PI).sin(),
            EaseKind::InOutSine => -((PI * t).cos() - 1.0) / 2.0,
            EaseKind::InQuad => t * t,
            EaseKind::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            EaseKind::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            EaseKind::InCubic => t * t * t,
            EaseKind::OutCubic => 1.0 - (1.0 - t).powi(3),
            EaseKind::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            EaseKind::InQuart => t * t * t * t,
            EaseKind::OutQuart => 1.0 - (1.0 - t).powi(4),
            EaseKind::InOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            EaseKind::InQuint => t * t * t * t * t,
            EaseKind::OutQuint => 1.0 - (1.0 - t).powi(5),
            EaseKind::InOutQuint => {
                if t < 0.5 {
                    16.0 * t * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            EaseKind::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0f32.powf(10.0 * t - 10.0)
                }
            }
            EaseKind::OutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0f32.powf(-10.0 * t)
                }
            }
            EaseKind::InOutExpo => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    2.0f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2.0f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            EaseKind::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EaseKind::OutCirc => (1.0 - (t - 1.0) * (t - 1.0)).max(0.0).sqrt(),
            EaseKind::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }
            EaseKind::InBack => C3 * t * t * t - C1 * t * t,
            EaseKind::OutBack => 1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2),
            EaseKind::InOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((C2 + 1.0) * 2.0 * t - C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((C2 + 1.0) * (t * 2.0 - 2.0) + C2) + 2.0) / 2.0
                }
            }
            EaseKind::InElastic => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    -(2.0f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * C4).sin()
                }
            }
            EaseKind::OutElastic => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    2.0f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0
                }
            }
            EaseKind::InOutElastic => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    -(2.0f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0
                } else {
                    (2.0f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * C5).sin()) / 2.0 + 1.0
                }
            }
            EaseKind::InBounce => 1.0 - out_bounce(1.0 - t),
            EaseKind::OutBounce => out_bounce(t),
            EaseKind::InOutBounce => {
                if t < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}
