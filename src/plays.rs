use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

use crate::geometry::{Pt, lerp, polar};

// Logical canvas is 800x800 with the diamond centred.
pub const CANVAS: f64 = 800.0;
pub const CENTER: Pt = Pt::new(400.0, 400.0);
pub const BASE_R: f64 = 180.0;
pub const RINGS: [f64; 3] = [310.0, 220.0, 120.0];

pub const HOME: Pt = Pt::new(CENTER.x, CENTER.y + BASE_R);
pub const FIRST: Pt = Pt::new(CENTER.x + BASE_R, CENTER.y);
pub const SECOND: Pt = Pt::new(CENTER.x, CENTER.y - BASE_R);
pub const THIRD: Pt = Pt::new(CENTER.x - BASE_R, CENTER.y);
pub const MOUND: Pt = Pt::new(CENTER.x, CENTER.y + BASE_R * 0.12);

const OUTFIELD_R: f64 = BASE_R * 2.3;

/// Point on the outfield arc at the default depth.
pub fn outfield(deg: f64) -> Pt {
    outfield_at(deg, OUTFIELD_R)
}

pub fn outfield_at(deg: f64, r: f64) -> Pt {
    polar(CENTER, r, deg)
}

pub type Segment = (Pt, Pt);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Spray {
    pub a0: f64,
    pub a1: f64,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayCard {
    pub count: String,
    pub outs: u8,
    pub ev: String,
    pub la: String,
    pub xba: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub id: String,
    pub label: String,
    pub spray: Option<Spray>,
    /// Traversed start to end; never empty.
    pub runner: Vec<Pt>,
    /// Throws, played back one after another.
    pub ball: Vec<Segment>,
    pub blips: Vec<Pt>,
    pub card: PlayCard,
    pub notes: Vec<String>,
}

impl Play {
    pub fn has_ball(&self) -> bool {
        !self.ball.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    plays: Vec<Play>,
}

impl Catalog {
    pub fn new(plays: Vec<Play>) -> Result<Self> {
        if plays.is_empty() {
            return Err(anyhow!("play catalog is empty"));
        }
        let mut seen = HashSet::new();
        for play in &plays {
            if !seen.insert(play.id.as_str()) {
                return Err(anyhow!("duplicate play id {}", play.id));
            }
            if play.runner.is_empty() {
                return Err(anyhow!("play {} has an empty runner path", play.id));
            }
        }
        Ok(Self { plays })
    }

    pub fn len(&self) -> usize {
        self.plays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    /// Active play for an index; wraps around so any index is valid.
    pub fn get(&self, index: usize) -> &Play {
        &self.plays[index % self.plays.len()]
    }

    pub fn find(&self, id: &str) -> Option<&Play> {
        self.plays.iter().find(|p| p.id == id)
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog {
    plays: builtin_plays(),
});

/// The curated catalog shipped with the site.
pub fn catalog() -> &'static Catalog {
    &BUILTIN
}

#[derive(Debug, Deserialize)]
struct RawPlay {
    id: String,
    label: String,
    #[serde(default)]
    spray: Option<Spray>,
    runner: Vec<[f64; 2]>,
    #[serde(default)]
    ball: Option<Value>,
    #[serde(default)]
    blips: Vec<[f64; 2]>,
    card: PlayCard,
    #[serde(default)]
    notes: Vec<String>,
}

/// Parses a JSON array of plays. Throw entries that are not a pair of `[x, y]` points are
/// dropped rather than rejected.
pub fn load_catalog(raw: &str) -> Result<Catalog> {
    let rows: Vec<RawPlay> = serde_json::from_str(raw).context("parse playbook json")?;
    let plays = rows
        .into_iter()
        .map(|row| Play {
            id: row.id,
            label: row.label,
            spray: row.spray,
            runner: row.runner.into_iter().map(pt_from).collect(),
            ball: row.ball.as_ref().map(parse_ball).unwrap_or_default(),
            blips: row.blips.into_iter().map(pt_from).collect(),
            card: row.card,
            notes: row.notes,
        })
        .collect();
    Catalog::new(plays)
}

pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read playbook {}", path.display()))?;
    load_catalog(&raw).with_context(|| format!("load playbook {}", path.display()))
}

fn pt_from([x, y]: [f64; 2]) -> Pt {
    Pt::new(x, y)
}

fn parse_ball(value: &Value) -> Vec<Segment> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items.iter().filter_map(parse_segment).collect()
}

fn parse_segment(value: &Value) -> Option<Segment> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    Some((parse_point(&pair[0])?, parse_point(&pair[1])?))
}

fn parse_point(value: &Value) -> Option<Pt> {
    let xy = value.as_array()?;
    if xy.len() != 2 {
        return None;
    }
    let x = xy[0].as_f64()?;
    let y = xy[1].as_f64()?;
    (x.is_finite() && y.is_finite()).then_some(Pt::new(x, y))
}

fn card(count: &str, outs: u8, ev: &str, la: &str, xba: &str) -> PlayCard {
    PlayCard {
        count: count.to_string(),
        outs,
        ev: ev.to_string(),
        la: la.to_string(),
        xba: xba.to_string(),
    }
}

fn spray(a0: f64, a1: f64, r: f64) -> Option<Spray> {
    Some(Spray { a0, a1, r })
}

fn play(
    id: &str,
    label: &str,
    spray: Option<Spray>,
    runner: Vec<Pt>,
    ball: Vec<Segment>,
    blips: Vec<Pt>,
    card: PlayCard,
) -> Play {
    Play {
        id: id.to_string(),
        label: label.to_string(),
        spray,
        runner,
        ball,
        blips,
        card,
        notes: Vec::new(),
    }
}

fn builtin_plays() -> Vec<Play> {
    vec![
        play(
            "lf-single-1st-to-3rd",
            "Single LF → 1st to 3rd",
            spray(208.0, 228.0, BASE_R * 2.05),
            vec![FIRST, lerp(FIRST, SECOND, 0.08), SECOND, THIRD],
            vec![(outfield(220.0), SECOND)],
            vec![FIRST, SECOND, THIRD],
            card("0–0", 0, "89 mph", "14°", ".610"),
        ),
        play(
            "rf-single-hold-1b",
            "Single RF → hold at 1B",
            spray(320.0, 338.0, BASE_R * 2.0),
            vec![FIRST],
            vec![(outfield(330.0), FIRST)],
            vec![FIRST],
            card("1–0", 0, "92 mph", "11°", ".520"),
        ),
        play(
            "deep-cf-fly-tag",
            "Flyout deep CF (tag attempt)",
            spray(260.0, 275.0, BASE_R * 2.3),
            vec![THIRD, lerp(THIRD, HOME, 0.25), THIRD],
            vec![(outfield_at(268.0, BASE_R * 2.35), HOME)],
            vec![THIRD, HOME],
            card("1–1", 1, "96 mph", "28°", ".090"),
        ),
        play(
            "rf-assist-3b",
            "RF assist to 3B",
            spray(318.0, 336.0, BASE_R * 2.2),
            vec![FIRST, lerp(FIRST, SECOND, 0.25), FIRST],
            vec![(outfield(330.0), THIRD)],
            vec![THIRD],
            card("0–2", 1, "97 mph", "18°", ".210"),
        ),
        play(
            "relay-cutoff-home",
            "Relay → cutoff → home",
            spray(300.0, 318.0, BASE_R * 2.1),
            vec![
                SECOND,
                lerp(SECOND, THIRD, 0.45),
                THIRD,
                lerp(THIRD, HOME, 0.25),
            ],
            vec![(outfield(308.0), SECOND), (SECOND, HOME)],
            vec![SECOND, HOME],
            card("2–1", 1, "101 mph", "12°", ".540"),
        ),
        play(
            "squeeze",
            "Suicide squeeze",
            spray(350.0, 370.0, BASE_R * 1.2),
            vec![THIRD, lerp(THIRD, HOME, 0.35), HOME],
            vec![(MOUND, HOME)],
            vec![HOME],
            card("0–0", 0, "31 mph", "6°", ".420"),
        ),
        play(
            "gap-double-2b",
            "Gap double to LCF",
            spray(230.0, 248.0, BASE_R * 2.2),
            vec![FIRST, SECOND],
            vec![(outfield_at(242.0, BASE_R * 2.35), SECOND)],
            vec![SECOND],
            card("2–2", 0, "101 mph", "22°", ".680"),
        ),
        play(
            "grounder-63",
            "6–3 routine",
            spray(184.0, 198.0, BASE_R * 1.12),
            vec![HOME],
            vec![(polar(CENTER, BASE_R * 1.1, 190.0), FIRST)],
            vec![FIRST],
            card("0–1", 1, "81 mph", "-8°", ".070"),
        ),
        play(
            "sac-fly-rf",
            "Sac fly RF — run scores",
            spray(322.0, 340.0, BASE_R * 2.05),
            vec![THIRD, lerp(THIRD, HOME, 0.55), HOME],
            vec![(outfield(332.0), HOME)],
            vec![HOME],
            card("0–1", 1, "88 mph", "32°", ".650"),
        ),
        play(
            "rf-line-double",
            "RF line double — runner to 3B",
            spray(342.0, 352.0, BASE_R * 2.35),
            vec![FIRST, SECOND, THIRD],
            vec![(outfield_at(348.0, BASE_R * 2.4), SECOND)],
            vec![SECOND, THIRD],
            card("1–1", 0, "103 mph", "17°", ".720"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let plays = catalog().plays().to_vec();
        assert_eq!(plays.len(), 10);
        assert!(Catalog::new(plays).is_ok());
    }

    #[test]
    fn landmarks_sit_on_the_diamond() {
        assert_eq!(HOME, Pt::new(400.0, 580.0));
        assert_eq!(FIRST, Pt::new(580.0, 400.0));
        assert_eq!(SECOND, Pt::new(400.0, 220.0));
        assert_eq!(THIRD, Pt::new(220.0, 400.0));
    }

    #[test]
    fn get_wraps_index() {
        let c = catalog();
        assert_eq!(c.get(0).id, c.get(c.len()).id);
        assert_eq!(c.get(3).id, "rf-assist-3b");
    }

    #[test]
    fn malformed_throws_are_dropped() {
        let raw = r#"[{
            "id": "x", "label": "X",
            "runner": [[600, 580], [400, 220]],
            "ball": [[[1, 2], [3, 4]], "nope", [[1, 2]], [[1, 2], [3, "a"]], 7],
            "card": {"count": "0-0", "outs": 0, "ev": "90 mph", "la": "10°", "xba": ".300"}
        }]"#;
        let c = load_catalog(raw).expect("catalog parses");
        let p = c.get(0);
        assert_eq!(p.ball, vec![(Pt::new(1.0, 2.0), Pt::new(3.0, 4.0))]);
        assert!(p.spray.is_none());
    }

    #[test]
    fn non_array_ball_means_no_throw() {
        let raw = r#"[{
            "id": "x", "label": "X", "runner": [[1, 1]], "ball": {"a": 1},
            "card": {"count": "0-0", "outs": 0, "ev": "", "la": "", "xba": ""}
        }]"#;
        let c = load_catalog(raw).expect("catalog parses");
        assert!(!c.get(0).has_ball());
    }

    #[test]
    fn rejects_empty_and_duplicate_catalogs() {
        assert!(load_catalog("[]").is_err());
        let dup = r#"[
            {"id": "a", "label": "A", "runner": [[1, 1]], "card": {"count": "", "outs": 0, "ev": "", "la": "", "xba": ""}},
            {"id": "a", "label": "B", "runner": [[1, 1]], "card": {"count": "", "outs": 0, "ev": "", "la": "", "xba": ""}}
        ]"#;
        assert!(load_catalog(dup).is_err());
        let empty_runner = r#"[
            {"id": "a", "label": "A", "runner": [], "card": {"count": "", "outs": 0, "ev": "", "la": "", "xba": ""}}
        ]"#;
        assert!(load_catalog(empty_runner).is_err());
    }
}
