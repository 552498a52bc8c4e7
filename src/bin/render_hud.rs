use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use statbase_site::config::{SiteConfig, flag_value, load_dotenv};
use statbase_site::hud::{HudOptions, render_svg};
use statbase_site::plays::{self, Catalog, Play};

const DEFAULT_FRAMES: usize = 12;

/// Writes `frames` evenly spaced SVG frames of every play (or one play with `--play ID`).
fn main() -> Result<()> {
    load_dotenv();
    let cfg = SiteConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let out_dir = flag_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("hud_frames"));
    let frames = flag_value(&args, "--frames")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_FRAMES)
        .max(1);

    let catalog = match cfg.playbook_path.as_deref() {
        Some(path) => plays::load_catalog_file(path)?,
        None => plays::catalog().clone(),
    };
    let selected = select_plays(&catalog, flag_value(&args, "--play"))?;

    let opts = HudOptions {
        show_play_card: cfg.hud.show_play_card,
        clamp_to_safe_area: cfg.hud.clamp_to_safe_area,
        ..HudOptions::default()
    };

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir {}", out_dir.display()))?;
    let mut written = 0usize;
    for play in selected {
        for frame in 0..frames {
            let t = frame as f64 / frames as f64;
            let path = out_dir.join(format!("{}_{frame:03}.svg", play.id));
            fs::write(&path, render_svg(play, t, &opts))
                .with_context(|| format!("write {}", path.display()))?;
            written += 1;
        }
    }

    println!("HUD frames written");
    println!("Dir: {}", out_dir.display());
    println!("Files: {written}");
    Ok(())
}

fn select_plays<'a>(catalog: &'a Catalog, id: Option<&str>) -> Result<Vec<&'a Play>> {
    match id {
        Some(id) => catalog
            .find(id)
            .map(|p| vec![p])
            .ok_or_else(|| anyhow!("unknown play id {id}")),
        None => Ok(catalog.plays().iter().collect()),
    }
}
