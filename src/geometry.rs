use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pt {
    pub x: f64,
    pub y: f64,
}

impl Pt {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Pt {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Rounds to three decimals so emitted SVG stays stable across frames.
/// Non-finite input collapses to zero.
pub fn fx(n: f64) -> f64 {
    if !n.is_finite() {
        return 0.0;
    }
    let r = (n * 1000.0).round() / 1000.0;
    // Avoid printing "-0".
    if r == 0.0 { 0.0 } else { r }
}

/// Polar to Cartesian in screen space: 0° points along +x and angles grow clockwise
/// because y grows downward.
pub fn polar(center: Pt, r: f64, deg: f64) -> Pt {
    let rad = deg.to_radians();
    Pt::new(center.x + r * rad.cos(), center.y + r * rad.sin())
}

/// Linear interpolation. `t` is not clamped.
pub fn lerp(a: Pt, b: Pt, t: f64) -> Pt {
    Pt::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

pub fn distance(a: Pt, b: Pt) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Direction from `a` to `b`, in degrees (-180, 180].
pub fn angle_deg(a: Pt, b: Pt) -> f64 {
    (b.y - a.y).atan2(b.x - a.x).to_degrees()
}

/// Filled circular sector anchored at `origin`, swept clockwise from `a0` to `a1`.
pub fn wedge_path(origin: Pt, a0: f64, a1: f64, r: f64) -> String {
    let p0 = polar(origin, r, a0);
    let p1 = polar(origin, r, a1);
    let large = if (a1 - a0).abs() > 180.0 { 1 } else { 0 };
    format!(
        "M {} {} L {} {} A {} {} 0 {} 1 {} {} Z",
        fx(origin.x),
        fx(origin.y),
        fx(p0.x),
        fx(p0.y),
        fx(r),
        fx(r),
        large,
        fx(p1.x),
        fx(p1.y)
    )
}

/// Rounded rectangle outline. The corner radius is capped at half the shorter side.
pub fn pill_path(x: f64, y: f64, w: f64, h: f64, r: f64) -> String {
    let r = r.max(0.0).min(w.abs() / 2.0).min(h.abs() / 2.0);
    format!(
        "M {} {} H {} A {r} {r} 0 0 1 {} {} V {} A {r} {r} 0 0 1 {} {} H {} A {r} {r} 0 0 1 {} {} V {} A {r} {r} 0 0 1 {} {} Z",
        fx(x + r),
        fx(y),
        fx(x + w - r),
        fx(x + w),
        fx(y + r),
        fx(y + h - r),
        fx(x + w - r),
        fx(y + h),
        fx(x + r),
        fx(x),
        fx(y + h - r),
        fx(y + r),
        fx(x + r),
        fx(y),
        r = fx(r),
    )
}

/// Sparkline through `samples` (each in 0..=1), spread evenly across `w`.
pub fn spark_path(samples: &[f64], w: f64, h: f64) -> String {
    let Some(first) = samples.first() else {
        return String::new();
    };
    let step = w / (samples.len().saturating_sub(1).max(1) as f64);
    let mut d = format!("M 0 {}", fx(h * (1.0 - first)));
    for (i, v) in samples.iter().enumerate().skip(1) {
        d.push_str(&format!(" L {} {}", fx(i as f64 * step), fx(h * (1.0 - v))));
    }
    d
}
