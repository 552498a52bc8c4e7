//! Host-based routing: on the app subdomain every page is the gate.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use crate::config::RoutingConfig;
use crate::server::AppState;

pub const GATE_PATH: &str = "/gate";

const ASSET_EXTENSIONS: [&str; 6] = [".png", ".svg", ".jpg", ".jpeg", ".gif", ".webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Pass,
    Redirect(String),
    Rewrite(String),
}

fn is_asset(path: &str) -> bool {
    if path.starts_with("/_next/") || path == "/favicon.ico" || path == "/og.jpg" {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn decide(host: &str, path: &str, cfg: &RoutingConfig) -> RouteDecision {
    if is_asset(path) {
        return RouteDecision::Pass;
    }
    let on_app_host = !cfg.app_host.is_empty() && host.starts_with(cfg.app_host.as_str());
    if !on_app_host {
        return RouteDecision::Pass;
    }
    if path.starts_with("/privacy") {
        return RouteDecision::Redirect(cfg.privacy_url.clone());
    }
    if path.starts_with("/api/") {
        return RouteDecision::Pass;
    }
    RouteDecision::Rewrite(GATE_PATH.to_string())
}

pub async fn host_routing(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let path = request.uri().path().to_string();

    match decide(&host, &path, &state.config.routing) {
        RouteDecision::Pass => next.run(request).await,
        RouteDecision::Redirect(to) => {
            debug!(host = %host, path = %path, to = %to, "redirecting to canonical host");
            Redirect::temporary(&to).into_response()
        }
        RouteDecision::Rewrite(to) => {
            debug!(host = %host, path = %path, to = %to, "rewriting to gate");
            // The rewritten URI carries no query string.
            if let Ok(uri) = to.parse::<Uri>() {
                *request.uri_mut() = uri;
            }
            next.run(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RoutingConfig {
        RoutingConfig {
            app_host: "app.statbase.eu".to_string(),
            privacy_url: "https://statbase.eu/privacy".to_string(),
        }
    }

    #[test]
    fn marketing_host_passes_everything() {
        assert_eq!(decide("statbase.eu", "/", &cfg()), RouteDecision::Pass);
        assert_eq!(decide("statbase.eu", "/privacy", &cfg()), RouteDecision::Pass);
    }

    #[test]
    fn app_host_is_gated() {
        assert_eq!(
            decide("app.statbase.eu", "/", &cfg()),
            RouteDecision::Rewrite("/gate".to_string())
        );
        assert_eq!(
            decide("app.statbase.eu:443", "/dashboard", &cfg()),
            RouteDecision::Rewrite("/gate".to_string())
        );
        assert_eq!(
            decide("app.statbase.eu", "/api/demo/unlock", &cfg()),
            RouteDecision::Pass
        );
        assert_eq!(
            decide("app.statbase.eu", "/privacy/cookies", &cfg()),
            RouteDecision::Redirect("https://statbase.eu/privacy".to_string())
        );
    }

    #[test]
    fn assets_bypass_gate() {
        for path in ["/_next/static/x.js", "/favicon.ico", "/og.jpg", "/logo.SVG", "/a/b.webp"] {
            assert_eq!(decide("app.statbase.eu", path, &cfg()), RouteDecision::Pass);
        }
    }
}
