use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::autoplay::DriverTimings;

const APP_DIR: &str = "statbase";
const DB_FILE: &str = "site.sqlite";

#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// Unlock secret. Unlock requests fail with a server error while this is unset.
    pub demo_password: Option<String>,
    pub upsilon_url: String,
    pub forward_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingConfig {
    pub app_host: String,
    pub privacy_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudConfig {
    pub timings: DriverTimings,
    pub show_play_card: bool,
    pub clamp_to_safe_area: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    pub playbook_path: Option<PathBuf>,
    pub log_json: bool,
    pub gate: GateConfig,
    pub routing: RoutingConfig,
    pub hud: HudConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            database_path: default_db_path().unwrap_or_else(|| PathBuf::from(DB_FILE)),
            playbook_path: None,
            log_json: false,
            gate: GateConfig {
                demo_password: None,
                upsilon_url: "https://upsilon.statbase.eu".to_string(),
                forward_token: None,
            },
            routing: RoutingConfig {
                app_host: "app.statbase.eu".to_string(),
                privacy_url: "https://statbase.eu/privacy".to_string(),
            },
            hud: HudConfig {
                timings: DriverTimings::default(),
                show_play_card: true,
                clamp_to_safe_area: true,
            },
        }
    }
}

impl SiteConfig {
    /// Reads the environment over the defaults. Unparseable values keep their default.
    pub fn from_env() -> Self {
        let d = Self::default();
        let timings = DriverTimings {
            period: Duration::from_millis(env_u64("HUD_PERIOD_MS", 2600).max(100)),
            advance: Duration::from_millis(env_u64("HUD_ADVANCE_MS", 3200).max(250)),
            frame: Duration::from_millis(env_u64("HUD_FRAME_MS", 16).max(1)),
        };
        Self {
            bind_addr: env_string("BIND_ADDR").unwrap_or(d.bind_addr),
            database_path: env_string("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.database_path),
            playbook_path: env_string("PLAYBOOK_PATH").map(PathBuf::from),
            log_json: env_bool("LOG_JSON", d.log_json),
            gate: GateConfig {
                demo_password: env_string("DEMO_PASSWORD"),
                upsilon_url: env_string("UPSILON_URL").unwrap_or(d.gate.upsilon_url),
                forward_token: env_string("DEMO_FORWARD_TOKEN"),
            },
            routing: RoutingConfig {
                app_host: env_string("APP_HOST").unwrap_or(d.routing.app_host),
                privacy_url: env_string("PRIVACY_URL").unwrap_or(d.routing.privacy_url),
            },
            hud: HudConfig {
                timings,
                show_play_card: env_bool("HUD_SHOW_CARD", d.hud.show_play_card),
                clamp_to_safe_area: env_bool("HUD_SAFE_AREA", d.hud.clamp_to_safe_area),
            },
        }
    }
}

/// `.env.local` wins over `.env`; both are optional.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".local").join("share").join(APP_DIR))
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

/// Value of `--name VALUE` or `--name=VALUE` in a tool's argument list. Blank values are
/// skipped.
pub fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim());
            }
        }
    }
    None
}

/// Arguments left once every `flags` entry (and its value) is removed.
pub fn positional_args<'a>(args: &'a [String], flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if flags.contains(&arg.as_str()) {
            iter.next();
            continue;
        }
        if flags
            .iter()
            .any(|flag| arg.strip_prefix(flag).is_some_and(|rest| rest.starts_with('=')))
        {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn flag_value_reads_both_spellings() {
        let a = args(&["list", "--db", "/tmp/a.sqlite"]);
        assert_eq!(flag_value(&a, "--db"), Some("/tmp/a.sqlite"));
        let a = args(&["--frames=24", "--play", " "]);
        assert_eq!(flag_value(&a, "--frames"), Some("24"));
        assert_eq!(flag_value(&a, "--play"), None);
        assert_eq!(flag_value(&args(&["--db"]), "--db"), None);
    }

    #[test]
    fn positional_args_drop_flags_and_their_values() {
        let a = args(&["--db", "x.sqlite", "add-domain", "fedball.eu"]);
        assert_eq!(positional_args(&a, &["--db"]), vec!["add-domain", "fedball.eu"]);
        let a = args(&["leads", "--db=x.sqlite", "--dbx"]);
        assert_eq!(positional_args(&a, &["--db"]), vec!["leads", "--dbx"]);
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn from_env_applies_floors_and_falls_back_on_bad_values() {
        let vars = [
            ("HUD_PERIOD_MS", "5"),
            ("HUD_ADVANCE_MS", "soon"),
            ("HUD_FRAME_MS", "0"),
            ("HUD_SHOW_CARD", "no"),
            ("HUD_SAFE_AREA", "maybe"),
            ("LOG_JSON", "1"),
            ("APP_HOST", "   "),
            ("DEMO_PASSWORD", " s3cret "),
            ("DEMO_FORWARD_TOKEN", ""),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DATABASE_PATH", ":memory:"),
        ];
        for (name, value) in vars {
            unsafe { env::set_var(name, value) };
        }

        let cfg = SiteConfig::from_env();
        assert_eq!(cfg.hud.timings.period, Duration::from_millis(100));
        assert_eq!(cfg.hud.timings.advance, Duration::from_millis(3200));
        assert_eq!(cfg.hud.timings.frame, Duration::from_millis(1));
        assert!(!cfg.hud.show_play_card);
        assert!(cfg.hud.clamp_to_safe_area);
        assert!(cfg.log_json);
        assert_eq!(cfg.routing.app_host, "app.statbase.eu");
        assert_eq!(cfg.gate.demo_password.as_deref(), Some("s3cret"));
        assert!(cfg.gate.forward_token.is_none());
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.database_path, PathBuf::from(":memory:"));

        for (name, _) in vars {
            unsafe { env::remove_var(name) };
        }
        let cfg = SiteConfig::from_env();
        assert_eq!(cfg.hud.timings.period, Duration::from_millis(2600));
        assert!(cfg.gate.demo_password.is_none());
        assert!(!cfg.log_json);
    }

    #[test]
    fn defaults_match_site() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.routing.app_host, "app.statbase.eu");
        assert_eq!(cfg.gate.upsilon_url, "https://upsilon.statbase.eu");
        assert!(cfg.gate.demo_password.is_none());
        assert_eq!(cfg.hud.timings.advance, Duration::from_millis(3200));
    }
}
