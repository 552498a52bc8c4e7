//! Demo gate endpoints: lead capture and password unlock.

use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::GateConfig;
use crate::db::{self, NewLead};
use crate::server::AppState;

#[derive(Debug)]
pub enum GateError {
    EmailRequired,
    ConsentRequired,
    MissingPassword,
    InvalidPassword,
    NotApproved,
    Storage(anyhow::Error),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::EmailRequired | GateError::ConsentRequired => StatusCode::BAD_REQUEST,
            GateError::MissingPassword | GateError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GateError::InvalidPassword => StatusCode::UNAUTHORIZED,
            GateError::NotApproved => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            GateError::EmailRequired => "Email required",
            GateError::ConsentRequired => "Consent is required",
            GateError::MissingPassword => "Missing DEMO_PASSWORD",
            GateError::InvalidPassword => "Invalid password",
            GateError::NotApproved => "Not yet approved. Please request access.",
            GateError::Storage(_) => "Internal error",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        if let GateError::Storage(err) = &self {
            error!("gate storage failure: {err:#}");
        }
        (self.status(), self.message()).into_response()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub note: String,
    /// Form posts send `"on"`, scripts send `true`; both count.
    #[serde(default)]
    pub consent: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnlockRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First hop of `x-forwarded-for`, or empty.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Where a successful unlock sends the visitor.
pub fn unlock_destination(cfg: &GateConfig) -> String {
    match cfg.forward_token.as_deref() {
        Some(token) if !token.is_empty() => {
            format!("{}?demo={}", cfg.upsilon_url, encode_component(token))
        }
        _ => cfg.upsilon_url.clone(),
    }
}

/// Everything outside the URI-component unreserved set.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, GateError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))?;
        f(&conn)
    })
    .await
    .map_err(|err| GateError::Storage(anyhow!("database task failed: {err}")))?
    .map_err(GateError::Storage)
}

pub async fn lead_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LeadRequest>,
) -> Result<Json<Ack>, GateError> {
    let email = req.email.trim().to_string();
    if email.is_empty() {
        return Err(GateError::EmailRequired);
    }
    if !is_truthy(&req.consent) {
        return Err(GateError::ConsentRequired);
    }

    let lead = NewLead {
        name: req.name,
        email,
        org: req.org,
        role: req.role,
        note: req.note,
        consent: true,
        consent_ip: client_ip(&headers),
        user_agent: user_agent(&headers),
    };
    let domain = db::email_domain(&lead.email);
    let id = with_db(&state, move |conn| db::insert_lead(conn, &lead)).await?;
    info!(lead_id = id, domain = %domain, "demo lead captured");
    Ok(Json(Ack {
        ok: true,
        next: None,
    }))
}

pub async fn unlock_handler(
    State(state): State<AppState>,
    Json(req): Json<UnlockRequest>,
) -> Result<Json<Ack>, GateError> {
    let email = req.email.trim().to_string();
    if email.is_empty() {
        return Err(GateError::EmailRequired);
    }
    let Some(expected) = state.config.gate.demo_password.as_deref() else {
        warn!("unlock attempted without DEMO_PASSWORD configured");
        return Err(GateError::MissingPassword);
    };
    if req.password != expected {
        warn!(domain = %db::email_domain(&email), "unlock rejected: wrong password");
        return Err(GateError::InvalidPassword);
    }

    let lookup = email.clone();
    let allowed = with_db(&state, move |conn| db::is_allowlisted(conn, &lookup)).await?;
    if !allowed {
        info!(domain = %db::email_domain(&email), "unlock rejected: not on allowlist");
        return Err(GateError::NotApproved);
    }

    info!(domain = %db::email_domain(&email), "demo unlocked");
    Ok(Json(Ack {
        ok: true,
        next: Some(unlock_destination(&state.config.gate)),
    }))
}
