//! Figures derived from the active play: the win-expectancy gauge, the stat card box, the
//! PVI headline and the telemetry strip. All of these are presentation heuristics.

use std::f64::consts::PI;

use crate::plays::{CANVAS, Play, PlayCard};

// Win expectancy: base = min(1, xBA + EV_WEIGHT * ev_bonus + LAUNCH_WEIGHT * barrel).
pub const EV_FLOOR_MPH: f64 = 80.0;
pub const EV_SPAN_MPH: f64 = 35.0;
pub const EV_WEIGHT: f64 = 0.25;
pub const LAUNCH_SWEET_DEG: f64 = 15.0;
pub const LAUNCH_SPREAD_DEG: f64 = 12.0;
pub const LAUNCH_WEIGHT: f64 = 0.25;
pub const BREATHE_AMPLITUDE: f64 = 0.02;

// Stat card text metrics (monospace estimate, no glyph measurement).
pub const CARD_PAD: f64 = 12.0;
pub const CHAR_W_SMALL: f64 = 7.2;
pub const CHAR_W_LABEL: f64 = 7.8;
pub const TITLE_GAP: f64 = 16.0;
pub const VALUE_COLUMN: f64 = 110.0;
pub const ROW_HEIGHT: f64 = 18.0;
pub const HEADER_ALLOWANCE: f64 = 20.0 + 8.0 + 18.0;
pub const CARD_LEFT_TITLE: &str = "PLAY CARD";

/// Strips everything but digits and dots (and `-` when allowed) and parses what is left.
/// Anything unparseable reads as zero.
pub fn parse_stat(text: &str, allow_negative: bool) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || (allow_negative && *c == '-'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinExpectancy {
    pub p: f64,
    pub percent: u8,
    pub color: &'static str,
}

pub fn win_expectancy(card: &PlayCard, t: f64) -> WinExpectancy {
    let xba = parse_stat(&card.xba, false);
    let ev = parse_stat(&card.ev, false);
    let la = parse_stat(&card.la, true);

    let ev_bonus = ((ev - EV_FLOOR_MPH) / EV_SPAN_MPH).clamp(0.0, 1.0);
    let barrel = (-((la - LAUNCH_SWEET_DEG) / LAUNCH_SPREAD_DEG).powi(2)).exp();
    let base = (xba + EV_WEIGHT * ev_bonus + LAUNCH_WEIGHT * barrel).min(1.0);

    let breathe = BREATHE_AMPLITUDE * (t * 2.0 * PI).sin();
    let mut p = (base + breathe).clamp(0.0, 1.0);
    if !p.is_finite() {
        p = 0.0;
    }
    let percent = (p * 100.0).round() as u8;
    WinExpectancy {
        p,
        percent,
        color: pvi_color(f64::from(percent)),
    }
}

pub fn pvi_color(score: f64) -> &'static str {
    if score < 40.0 {
        "hsl(5 80% 60%)"
    } else if score < 70.0 {
        "hsl(36 85% 60%)"
    } else {
        "hsl(148 60% 55%)"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PviSnapshot {
    pub score: u32,
    pub delta: i32,
    pub pct: u32,
    pub spark: Vec<f64>,
}

impl PviSnapshot {
    /// Headline figures shown on the landing page.
    pub fn headline() -> Self {
        Self {
            score: 82,
            delta: 6,
            pct: 92,
            spark: vec![0.46, 0.53, 0.52, 0.61, 0.58, 0.67, 0.72, 0.78, 0.82],
        }
    }

    pub fn color(&self) -> &'static str {
        pvi_color(f64::from(self.score))
    }

    pub fn card_value(&self) -> String {
        format!("{} ({}th)", self.score, self.pct)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub right_title: String,
    pub rows: Vec<(&'static str, String)>,
}

impl CardLayout {
    pub fn left_title(&self) -> &'static str {
        CARD_LEFT_TITLE
    }
}

fn text_width(text: &str, char_w: f64) -> f64 {
    (text.chars().count() as f64 * char_w).ceil()
}

/// Sizes the stat card to its widest line so titles and rows never overlap, then pins it to
/// the top-right corner inside `inset`.
pub fn card_layout(play: &Play, pvi: &PviSnapshot, year: i32, inset: f64) -> CardLayout {
    let right_title = format!("SERIE-A / {year}");
    let rows = vec![
        ("Count", play.card.count.clone()),
        ("Outs", play.card.outs.to_string()),
        ("EV", play.card.ev.clone()),
        ("LA", play.card.la.clone()),
        ("xBA", play.card.xba.clone()),
        ("PVI", pvi.card_value()),
    ];

    let top_row = text_width(CARD_LEFT_TITLE, CHAR_W_SMALL)
        + TITLE_GAP
        + text_width(&right_title, CHAR_W_SMALL);
    let label = text_width(&play.label, CHAR_W_LABEL);
    let widest_value = rows
        .iter()
        .map(|(_, v)| v.chars().count())
        .max()
        .unwrap_or(0);
    let rows_w = (VALUE_COLUMN + widest_value as f64 * CHAR_W_SMALL).ceil();

    let inner = top_row.max(label).max(rows_w);
    let w = CARD_PAD * 2.0 + inner;
    let h = CARD_PAD * 2.0 + HEADER_ALLOWANCE + rows.len() as f64 * ROW_HEIGHT;

    CardLayout {
        x: CANVAS - (inset + 18.0) - w,
        y: inset + 20.0,
        w,
        h,
        right_title,
        rows,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Led {
    pub label: &'static str,
    pub on: bool,
    pub offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub leds: [Led; 3],
    pub link_ms: u32,
    pub fps: u32,
}

/// Decorative pipeline status, cycling with the clock.
pub fn telemetry(t: f64) -> Telemetry {
    let lit = |phase: f64| (t + phase).rem_euclid(1.0) < 0.7;
    let wave = |v: f64| 0.5 + 0.5 * v;
    Telemetry {
        leds: [
            Led {
                label: "INGEST",
                on: lit(0.0),
                offset: 0.0,
            },
            Led {
                label: "TRACK",
                on: lit(0.33),
                offset: 84.0,
            },
            Led {
                label: "MODEL",
                on: lit(0.66),
                offset: 168.0,
            },
        ],
        link_ms: 18 + (10.0 * wave((t * PI * 2.0).sin())).round() as u32,
        fps: 58 + (4.0 * wave((t * PI * 2.0).cos())).round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plays::catalog;

    fn card(ev: &str, la: &str, xba: &str) -> PlayCard {
        PlayCard {
            count: "0-0".to_string(),
            outs: 0,
            ev: ev.to_string(),
            la: la.to_string(),
            xba: xba.to_string(),
        }
    }

    #[test]
    fn parse_stat_strips_units() {
        assert_eq!(parse_stat("89 mph", false), 89.0);
        assert_eq!(parse_stat("-8°", true), -8.0);
        assert_eq!(parse_stat("-8°", false), 8.0);
        assert_eq!(parse_stat(".610", false), 0.61);
        assert_eq!(parse_stat("n/a", false), 0.0);
        assert_eq!(parse_stat("1.2.3", false), 0.0);
    }

    #[test]
    fn expectancy_matches_formula_at_rest() {
        // t = 0 has no breathing offset.
        let we = win_expectancy(&card("87 mph", "15°", ".100"), 0.0);
        assert!((we.p - 0.4).abs() < 1e-12);
        assert_eq!(we.percent, 40);
        assert_eq!(we.color, "hsl(36 85% 60%)");
    }

    #[test]
    fn expectancy_is_bounded() {
        let cases = [
            card("200 mph", "15°", ".999"),
            card("0 mph", "-90°", ".000"),
            card("", "", ""),
            card("99999999999999999999999999", "abc", "9"),
        ];
        for c in &cases {
            for step in 0..=20 {
                let we = win_expectancy(c, step as f64 / 20.0);
                assert!(we.percent <= 100);
                assert!((0.0..=1.0).contains(&we.p));
            }
        }
    }

    #[test]
    fn card_grows_with_longer_text() {
        let pvi = PviSnapshot::headline();
        let mut play = catalog().get(0).clone();
        let base = card_layout(&play, &pvi, 2025, 18.0);
        play.label.push_str(" with a much longer description than before");
        let longer = card_layout(&play, &pvi, 2025, 18.0);
        assert!(longer.w >= base.w);
        play.card.ev = "a".repeat(80);
        let widest = card_layout(&play, &pvi, 2025, 18.0);
        assert!(widest.w >= longer.w);
        assert_eq!(widest.h, base.h);
    }

    #[test]
    fn card_is_pinned_top_right() {
        let pvi = PviSnapshot::headline();
        let layout = card_layout(catalog().get(0), &pvi, 2025, 18.0);
        assert_eq!(layout.y, 38.0);
        assert_eq!(layout.x + layout.w, 800.0 - 36.0);
        assert_eq!(layout.h, 24.0 + 46.0 + 6.0 * 18.0);
        assert_eq!(layout.rows.len(), 6);
        assert_eq!(layout.rows[5].1, "82 (92th)");
    }

    #[test]
    fn telemetry_cycles() {
        let at0 = telemetry(0.0);
        assert!(at0.leds.iter().all(|l| l.on));
        let at_half = telemetry(0.5);
        assert!(at_half.leds[0].on);
        assert!(!at_half.leds[1].on);
        assert!(at_half.leds[2].on);
        assert_eq!(at0.link_ms, 23);
        assert_eq!(at0.fps, 62);
        let at_quarter = telemetry(0.25);
        assert_eq!(at_quarter.link_ms, 28);
        assert_eq!(at_quarter.fps, 60);
    }
}
