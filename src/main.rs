use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use statbase_site::config::{SiteConfig, load_dotenv};
use statbase_site::db;
use statbase_site::plays::{self, Catalog};
use statbase_site::server::{AppState, build_router};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn load_plays(cfg: &SiteConfig) -> Catalog {
    let Some(path) = cfg.playbook_path.as_deref() else {
        return plays::catalog().clone();
    };
    match plays::load_catalog_file(path) {
        Ok(catalog) => {
            info!(path = %path.display(), plays = catalog.len(), "loaded playbook");
            catalog
        }
        Err(err) => {
            warn!("{err:#}; falling back to built-in plays");
            plays::catalog().clone()
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cfg = SiteConfig::from_env();
    init_tracing(cfg.log_json);

    if cfg.gate.demo_password.is_none() {
        warn!("DEMO_PASSWORD is not set; unlock requests will fail");
    }

    let conn = db::open_db(&cfg.database_path)?;
    info!(path = %cfg.database_path.display(), "database ready");
    let catalog = load_plays(&cfg);
    let bind_addr = cfg.bind_addr.clone();

    let state = AppState::new(cfg, conn, catalog);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    info!("statbase site listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server failed")?;
    info!("shutdown complete");
    Ok(())
}
