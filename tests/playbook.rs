use std::fs;
use std::path::PathBuf;

use statbase_site::geometry::Pt;
use statbase_site::motion::{Wedge, active_wedge};
use statbase_site::plays::{catalog, load_catalog, load_catalog_file};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn loads_fixture_and_drops_malformed_throws() {
    let catalog = load_catalog_file(&fixture_path("playbook.json")).expect("fixture should load");
    assert_eq!(catalog.len(), 2);

    let double = catalog.find("wall-ball-double").expect("double present");
    assert_eq!(double.ball, vec![(Pt::new(400.0, 30.0), Pt::new(400.0, 220.0))]);
    assert_eq!(double.card.outs, 2);
    assert_eq!(double.notes, vec!["Relay not needed".to_string()]);

    let walk = catalog.find("walk").expect("walk present");
    assert!(walk.spray.is_none());
    assert!(!walk.has_ball());
    assert!(active_wedge(walk, None).is_none());
}

#[test]
fn index_wraps_around_catalog() {
    let raw = fs::read_to_string(fixture_path("playbook.json")).expect("fixture readable");
    let catalog = load_catalog(&raw).expect("fixture should parse");
    assert_eq!(catalog.get(0).id, catalog.get(2).id);
    assert_eq!(catalog.get(1).id, "walk");
}

#[test]
fn rejects_invalid_catalogs() {
    assert!(load_catalog("[]").is_err());
    assert!(load_catalog("{").is_err());

    let dup = r#"[
        {"id": "a", "label": "A", "runner": [[0, 0]], "card": {"count": "0–0", "outs": 0, "ev": "", "la": "", "xba": ""}},
        {"id": "a", "label": "B", "runner": [[0, 0]], "card": {"count": "0–0", "outs": 0, "ev": "", "la": "", "xba": ""}}
    ]"#;
    assert!(load_catalog(dup).is_err());

    let empty_runner = r#"[
        {"id": "a", "label": "A", "runner": [], "card": {"count": "0–0", "outs": 0, "ev": "", "la": "", "xba": ""}}
    ]"#;
    assert!(load_catalog(empty_runner).is_err());
}

#[test]
fn builtin_catalog_is_complete() {
    let plays = catalog();
    assert_eq!(plays.len(), 10);
    for play in plays.plays() {
        assert!(!play.runner.is_empty(), "{}", play.id);
        assert!(play.spray.is_some(), "{}", play.id);
        let mut still = play.clone();
        still.ball.clear();
        assert!(matches!(active_wedge(&still, None), Some(Wedge::Spray(_))));
    }
}
