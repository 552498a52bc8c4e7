//! Field diagram renderer.
//!
//! [`Scene::compose`] resolves everything that depends on the clock into plain values;
//! [`Scene::to_svg`] turns that snapshot into markup. Both are pure, so they are safe to call
//! once per repaint.

use chrono::{Datelike, Utc};

use crate::geometry::{Pt, fx, lerp, pill_path, polar};
use crate::motion::{Wedge, active_wedge, ball_position, runner_position, throw_progress};
use crate::plays::{CANVAS, CENTER, FIRST, HOME, MOUND, Play, RINGS, SECOND, THIRD};
use crate::readouts::{
    CARD_PAD, CardLayout, PviSnapshot, Telemetry, VALUE_COLUMN, WinExpectancy, card_layout,
    telemetry, win_expectancy,
};

const GAUGE_OFFSET: f64 = 14.0;
const GAUGE_START_DEG: f64 = -90.0;
// A full 360° arc collapses to nothing in SVG.
const GAUGE_MAX_SWEEP: f64 = 359.99;
const LANDED_AT: f64 = 0.99;
const SAFE_INSET: f64 = 18.0;
const TIGHT_INSET: f64 = 8.0;
const MONO: &str = r#"ui-monospace,SFMono-Regular,Menlo,Monaco,"Courier New",monospace"#;
const FOOTER_RIGHT: &str = "OPERATIONAL UNIT: SB-25V04";
const RAIL_TEXT: &str = "SIGNAL RANGE · 1.000 MHz — 801.808 MHz";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudOptions {
    pub show_play_card: bool,
    pub clamp_to_safe_area: bool,
    pub year: i32,
}

impl Default for HudOptions {
    fn default() -> Self {
        Self {
            show_play_card: true,
            clamp_to_safe_area: true,
            year: Utc::now().year(),
        }
    }
}

impl HudOptions {
    pub fn inset(&self) -> f64 {
        if self.clamp_to_safe_area {
            SAFE_INSET
        } else {
            TIGHT_INSET
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub radius: f64,
    pub sweep_deg: f64,
    pub expectancy: WinExpectancy,
}

impl Gauge {
    fn new(expectancy: WinExpectancy) -> Self {
        Self {
            radius: RINGS[0] + GAUGE_OFFSET,
            sweep_deg: (360.0 * expectancy.p).min(GAUGE_MAX_SWEEP),
            expectancy,
        }
    }

    pub fn arc_path(&self) -> String {
        let p0 = polar(CENTER, self.radius, GAUGE_START_DEG);
        let p1 = polar(CENTER, self.radius, GAUGE_START_DEG + self.sweep_deg);
        let large = if self.sweep_deg > 180.0 { 1 } else { 0 };
        format!(
            "M {} {} A {} {} 0 {} 1 {} {}",
            fx(p0.x),
            fx(p0.y),
            fx(self.radius),
            fx(self.radius),
            large,
            fx(p1.x),
            fx(p1.y)
        )
    }
}

/// One throw, drawn from its origin up to how far the ball has travelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throw {
    pub from: Pt,
    pub reached: Pt,
    pub landed: Option<Pt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub label: String,
    pub t: f64,
    pub telemetry: Telemetry,
    pub gauge: Gauge,
    pub wedge: Option<Wedge>,
    pub runner_trace: Vec<Pt>,
    pub runner: Option<Pt>,
    pub ball: Option<Pt>,
    pub aura: &'static str,
    pub throws: Vec<Throw>,
    pub blips: Vec<Pt>,
    pub card: Option<CardLayout>,
    pub footer_left: String,
}

impl Scene {
    pub fn compose(play: &Play, t: f64, opts: &HudOptions) -> Self {
        let pvi = PviSnapshot::headline();
        let ball = ball_position(&play.ball, t);
        let count = play.ball.len();
        let throws = play
            .ball
            .iter()
            .enumerate()
            .map(|(i, (a, b))| {
                let p = throw_progress(i, t, count);
                Throw {
                    from: *a,
                    reached: lerp(*a, *b, p),
                    landed: (p >= LANDED_AT).then_some(*b),
                }
            })
            .collect();

        Self {
            label: play.label.clone(),
            t,
            telemetry: telemetry(t),
            gauge: Gauge::new(win_expectancy(&play.card, t)),
            wedge: active_wedge(play, ball),
            runner_trace: play.runner.clone(),
            runner: runner_position(&play.runner, t),
            ball,
            aura: pvi.color(),
            throws,
            blips: play.blips.clone(),
            card: opts
                .show_play_card
                .then(|| card_layout(play, &pvi, opts.year, opts.inset())),
            footer_left: format!("© {} STATBASE.EU / ACTIVE NODE: PARIS", opts.year),
        }
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(8 * 1024);
        out.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {c} {c}" preserveAspectRatio="xMidYMid meet" shape-rendering="geometricPrecision" text-rendering="geometricPrecision">"#,
            c = CANVAS
        ));
        out.push_str(
            "<style>svg{--hud-line:#2d5f52;--hud-bright:#7cffb2;--hud-dashed:#4f8f7d;\
             --ink:#d8f3e8;--muted:#7fa397;--panel-2:#0d1714}</style>",
        );
        self.push_rails(&mut out);
        self.push_telemetry(&mut out);
        push_rings(&mut out);
        self.push_gauge(&mut out);
        push_diamond(&mut out);
        self.push_wedge(&mut out);
        self.push_runner(&mut out);
        self.push_throws(&mut out);
        self.push_blips(&mut out);
        if let Some(card) = &self.card {
            self.push_card(&mut out, card);
        }
        self.push_footer(&mut out);
        out.push_str("</svg>");
        out
    }

    fn push_rails(&self, out: &mut String) {
        out.push_str(&format!(
            r#"<g font-family='{MONO}' font-size="10" fill="var(--hud-bright)" opacity=".55"><text x="0" y="408" transform="rotate(-90 16 408)">{RAIL_TEXT}</text><text x="1024" y="408" text-anchor="end" transform="rotate(90 784 408)">{RAIL_TEXT}</text></g>"#
        ));
    }

    fn push_telemetry(&self, out: &mut String) {
        let (w, h, pad) = (310.0, 32.0, 10.0);
        out.push_str(&format!(
            r#"<g transform="translate(24,40)" opacity=".95"><path d="{}" fill="var(--panel-2)" stroke="var(--hud-line)"/>"#,
            pill_path(0.0, 0.0, w, h, 8.0)
        ));
        for led in &self.telemetry.leds {
            let (fill, opacity) = if led.on {
                ("var(--hud-bright)", 0.95)
            } else {
                ("var(--hud-line)", 0.55)
            };
            out.push_str(&format!(
                r#"<g transform="translate({},0)"><circle cx="{pad}" cy="{}" r="4" fill="{fill}" opacity="{opacity}"/><text x="{}" y="{}" font-family='{MONO}' font-size="11" fill="var(--ink)" opacity=".8">{}</text></g>"#,
                fx(led.offset),
                h / 2.0,
                pad + 10.0,
                h / 2.0 + 4.0,
                led.label
            ));
        }
        out.push_str(&format!(
            r#"<text x="{x}" y="{}" text-anchor="end" font-family='{MONO}' font-size="11" fill="var(--muted)">Link {}ms</text><text x="{x}" y="{}" text-anchor="end" font-family='{MONO}' font-size="11" fill="var(--muted)">{} fps</text></g>"#,
            h / 2.0 - 2.0,
            self.telemetry.link_ms,
            h / 2.0 + 10.0,
            self.telemetry.fps,
            x = w - pad
        ));
    }

    fn push_gauge(&self, out: &mut String) {
        let r = fx(self.gauge.radius);
        out.push_str(&format!(
            r#"<g opacity=".9"><circle cx="{cx}" cy="{cy}" r="{r}" stroke="var(--hud-line)" stroke-opacity=".25" fill="none"/><path d="{}" stroke="{}" stroke-width="4" fill="none"/><text x="{cx}" y="{}" text-anchor="middle" font-family='{MONO}' font-size="11" fill="var(--ink)" opacity=".8">WE {}%</text></g>"#,
            self.gauge.arc_path(),
            self.gauge.expectancy.color,
            fx(CENTER.y - self.gauge.radius - 8.0),
            self.gauge.expectancy.percent,
            cx = fx(CENTER.x),
            cy = fx(CENTER.y),
        ));
    }

    fn push_wedge(&self, out: &mut String) {
        let Some(wedge) = &self.wedge else {
            return;
        };
        let (fill, opacity) = match wedge {
            Wedge::Spray(_) => ("var(--hud-line)", ".18"),
            Wedge::Cone(_) => ("var(--hud-bright)", ".12"),
        };
        out.push_str(&format!(
            r#"<path d="{}" fill="{fill}" opacity="{opacity}"/>"#,
            wedge.path()
        ));
    }

    fn push_runner(&self, out: &mut String) {
        let points = self
            .runner_trace
            .iter()
            .map(|p| format!("{},{}", fx(p.x), fx(p.y)))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            r#"<polyline points="{points}" fill="none" stroke="var(--hud-dashed)" stroke-width="1.2" stroke-dasharray="4 8" opacity=".55"/>"#
        ));
        if let Some(p) = self.runner {
            out.push_str(&format!(
                r#"<g transform="translate({} {})"><circle r="10" fill="none" stroke="{}" stroke-opacity=".75" stroke-width="1.7"/><circle r="7" fill="var(--hud-bright)" opacity=".22"/><circle r="3.5" fill="var(--hud-bright)"/></g>"#,
                fx(p.x),
                fx(p.y),
                self.aura
            ));
        }
    }

    fn push_throws(&self, out: &mut String) {
        for throw in &self.throws {
            out.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="var(--hud-bright)" stroke-width="2" opacity=".9"/>"#,
                fx(throw.from.x),
                fx(throw.from.y),
                fx(throw.reached.x),
                fx(throw.reached.y)
            ));
            if let Some(end) = throw.landed {
                out.push_str(&format!(
                    r#"<circle cx="{}" cy="{}" r="5.5" fill="var(--hud-bright)"/>"#,
                    fx(end.x),
                    fx(end.y)
                ));
            }
        }
    }

    fn push_blips(&self, out: &mut String) {
        for p in &self.blips {
            out.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="5.5" fill="var(--hud-bright)" opacity=".55"/>"#,
                fx(p.x),
                fx(p.y)
            ));
        }
    }

    fn push_card(&self, out: &mut String, card: &CardLayout) {
        out.push_str(&format!(
            r#"<g transform="translate({},{})"><rect width="{}" height="{}" rx="10" ry="10" fill="var(--panel-2)" stroke="var(--hud-line)"/>"#,
            fx(card.x),
            fx(card.y),
            fx(card.w),
            fx(card.h)
        ));
        out.push_str(&format!(
            r#"<text x="{pad}" y="20" font-family='{MONO}' font-size="12" fill="var(--ink)" opacity=".7">{}</text><text x="{}" y="20" text-anchor="end" font-family='{MONO}' font-size="12" fill="var(--ink)" opacity=".7">{}</text>"#,
            card.left_title(),
            fx(card.w - CARD_PAD),
            escape_xml(&card.right_title),
            pad = CARD_PAD
        ));
        out.push_str(&format!(
            r#"<text x="{CARD_PAD}" y="42" font-family='{MONO}' font-size="13" font-weight="600" fill="var(--ink)">{}</text>"#,
            escape_xml(&self.label)
        ));
        for (i, (k, v)) in card.rows.iter().enumerate() {
            out.push_str(&format!(
                r#"<g transform="translate({CARD_PAD},{})"><text font-family='{MONO}' font-size="12" fill="var(--ink)" opacity=".7">{k}</text><text x="{VALUE_COLUMN}" font-family='{MONO}' font-size="12" fill="var(--ink)">{}</text></g>"#,
                64 + i * 18,
                escape_xml(v)
            ));
        }
        out.push_str("</g>");
    }

    fn push_footer(&self, out: &mut String) {
        out.push_str(&format!(
            r#"<g font-family='{MONO}' font-size="11" fill="var(--muted)"><text x="40" y="758">{}</text><text x="760" y="758" text-anchor="end">{FOOTER_RIGHT}</text></g>"#,
            escape_xml(&self.footer_left)
        ));
    }
}

fn push_rings(out: &mut String) {
    let (cx, cy) = (fx(CENTER.x), fx(CENTER.y));
    out.push_str(&format!(
        r#"<g stroke="var(--hud-line)" stroke-width="1.2" fill="none" opacity=".55"><circle cx="{cx}" cy="{cy}" r="{}"/><circle cx="{cx}" cy="{cy}" r="{}" stroke-dasharray="6 8"/><circle cx="{cx}" cy="{cy}" r="{}"/></g>"#,
        RINGS[0], RINGS[1], RINGS[2]
    ));
}

fn push_diamond(out: &mut String) {
    out.push_str(&format!(
        r#"<g stroke="var(--hud-line)" stroke-width="2" fill="none" opacity=".75"><polygon points="{},{} {},{} {},{} {},{}"/>"#,
        fx(SECOND.x),
        fx(SECOND.y),
        fx(THIRD.x),
        fx(THIRD.y),
        fx(HOME.x),
        fx(HOME.y),
        fx(FIRST.x),
        fx(FIRST.y)
    ));
    for base in [FIRST, SECOND, THIRD, HOME] {
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="10" height="10" rx="2" ry="2" opacity=".5"/>"#,
            fx(base.x - 5.0),
            fx(base.y - 5.0)
        ));
    }
    out.push_str(&format!(
        r#"<circle cx="{}" cy="{}" r="6.5" opacity=".5"/></g>"#,
        fx(MOUND.x),
        fx(MOUND.y)
    ));
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Composes and serializes one frame.
pub fn render_svg(play: &Play, t: f64, opts: &HudOptions) -> String {
    Scene::compose(play, t, opts).to_svg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plays::catalog;

    fn opts() -> HudOptions {
        HudOptions {
            show_play_card: true,
            clamp_to_safe_area: true,
            year: 2025,
        }
    }

    #[test]
    fn ball_in_flight_replaces_spray() {
        let play = catalog().get(0);
        let scene = Scene::compose(play, 0.3, &opts());
        assert!(scene.ball.is_some());
        assert!(matches!(scene.wedge, Some(Wedge::Cone(_))));
    }

    #[test]
    fn spray_shows_without_throws() {
        let mut play = catalog().get(0).clone();
        play.ball.clear();
        let scene = Scene::compose(&play, 0.3, &opts());
        assert!(scene.ball.is_none());
        assert!(matches!(scene.wedge, Some(Wedge::Spray(_))));
    }

    #[test]
    fn card_flag_controls_card() {
        let play = catalog().get(1);
        let mut o = opts();
        assert!(Scene::compose(play, 0.0, &o).card.is_some());
        o.show_play_card = false;
        let scene = Scene::compose(play, 0.0, &o);
        assert!(scene.card.is_none());
        assert!(!scene.to_svg().contains("PLAY CARD"));
    }

    #[test]
    fn safe_area_moves_card_inward() {
        let play = catalog().get(1);
        let mut o = opts();
        let safe = Scene::compose(play, 0.0, &o).card.expect("card");
        o.clamp_to_safe_area = false;
        let tight = Scene::compose(play, 0.0, &o).card.expect("card");
        assert!(safe.x < tight.x);
        assert!(safe.y > tight.y);
    }

    #[test]
    fn throws_land_progressively() {
        let play = catalog()
            .find("relay-cutoff-home")
            .expect("relay play");
        let early = Scene::compose(play, 0.25, &opts());
        assert!(early.throws[0].landed.is_none());
        assert_eq!(early.throws[1].reached, early.throws[1].from);
        let late = Scene::compose(play, 0.75, &opts());
        assert!(late.throws[0].landed.is_some());
        assert!(late.throws[1].landed.is_none());
    }

    #[test]
    fn svg_is_well_formed_and_escaped() {
        let mut play = catalog().get(2).clone();
        play.label = "Tag <fast> & loud".to_string();
        let svg = render_svg(&play, 0.4, &opts());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Tag &lt;fast&gt; &amp; loud"));
        assert!(svg.contains("© 2025 STATBASE.EU"));
        assert!(svg.contains("WE "));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn gauge_never_closes_the_circle() {
        let mut play = catalog().get(0).clone();
        play.card.xba = "1.000".to_string();
        let scene = Scene::compose(&play, 0.25, &opts());
        assert_eq!(scene.gauge.expectancy.percent, 100);
        assert!(scene.gauge.sweep_deg < 360.0);
        assert!(scene.gauge.arc_path().contains(" 0 1 1 "));
    }
}
