//! Where things are at clock value `t`: the runner along its path, the ball along its
//! throws, and the wedge that follows (or stands in for) the ball.

use crate::geometry::{Pt, angle_deg, distance, lerp, wedge_path};
use crate::plays::{BASE_R, HOME, Play, Segment, Spray};

/// Keeps the ball in the last slot at the exact loop boundary.
const BALL_T_MAX: f64 = 0.999_999;
pub const CONE_HALF_ANGLE: f64 = 9.0;
pub const CONE_RADIUS: f64 = BASE_R * 2.6;

/// Constant-speed position along `path`. Speed is normalized to the total path length,
/// so every segment is covered at the same rate. Zero-length paths park on their last point.
pub fn runner_position(path: &[Pt], t: f64) -> Option<Pt> {
    let last = *path.last()?;
    let lens: Vec<f64> = path.windows(2).map(|w| distance(w[0], w[1])).collect();
    let total: f64 = lens.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Some(last);
    }

    let mut remaining = t.clamp(0.0, 1.0) * total;
    for (i, d) in lens.iter().copied().enumerate() {
        if remaining <= d || i == lens.len() - 1 {
            let w = if d > 0.0 { remaining / d } else { 1.0 };
            return Some(lerp(path[i], path[i + 1], w.clamp(0.0, 1.0)));
        }
        remaining -= d;
    }
    Some(last)
}

/// Ball position with each throw given an equal share of the loop, regardless of distance.
pub fn ball_position(segments: &[Segment], t: f64) -> Option<Pt> {
    let n = segments.len();
    if n == 0 {
        return None;
    }
    let scaled = t.clamp(0.0, BALL_T_MAX) * n as f64;
    let k = (scaled.floor() as usize).min(n - 1);
    let local = (scaled - k as f64).clamp(0.0, 1.0);
    let (a, b) = segments[k];
    Some(lerp(a, b, local))
}

/// Visible fraction of throw `index` when `count` throws share the loop.
pub fn throw_progress(index: usize, t: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (t * count as f64 - index as f64).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub a0: f64,
    pub a1: f64,
    pub r: f64,
}

/// Wedge from home that tracks the ball in flight.
pub fn catcher_cone(ball: Option<Pt>) -> Option<Cone> {
    let ball = ball?;
    let center = angle_deg(HOME, ball);
    Some(Cone {
        a0: center - CONE_HALF_ANGLE,
        a1: center + CONE_HALF_ANGLE,
        r: CONE_RADIUS,
    })
}

/// The one wedge drawn from home plate. A live ball always wins over the static spray,
/// so the two never overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wedge {
    Spray(Spray),
    Cone(Cone),
}

impl Wedge {
    pub fn path(&self) -> String {
        match self {
            Wedge::Spray(s) => wedge_path(HOME, s.a0, s.a1, s.r),
            Wedge::Cone(c) => wedge_path(HOME, c.a0, c.a1, c.r),
        }
    }
}

pub fn active_wedge(play: &Play, ball: Option<Pt>) -> Option<Wedge> {
    if let Some(cone) = catcher_cone(ball) {
        return Some(Wedge::Cone(cone));
    }
    if play.has_ball() {
        return None;
    }
    play.spray.map(Wedge::Spray)
}
