use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use polyglot_deepl::{DeepLClient, DeepLError, Usage};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct HealthState {
    started_at: DateTime<Utc>,
    translator: Arc<DeepLClient>,
}

impl HealthState {
    pub fn new(translator: Arc<DeepLClient>) -> Self {
        Self { started_at: Utc::now(), translator }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub translator: HealthCheck,
    pub started_at: String,
    pub uptime_secs: i64,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let usage = state.translator.usage().await;
    if let Err(error) = &usage {
        warn!(
            event_name = "system.health.translator_check_failed",
            correlation_id = "health",
            quota_exceeded = error.is_quota_exceeded(),
            error = %error,
            "deepl usage check failed"
        );
    }
    let translator = translator_check(state.translator.base_url(), usage);
    let ready = translator.status == "ready";
    let now = Utc::now();

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "polyglot-server runtime initialized".to_string(),
        },
        translator,
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: (now - state.started_at).num_seconds().max(0),
        checked_at: now.to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn translator_check(base_url: &str, usage: Result<Usage, DeepLError>) -> HealthCheck {
    match usage {
        Ok(usage) if usage.is_exhausted() => HealthCheck {
            status: "degraded",
            detail: format!(
                "deepl character quota exhausted ({} of {})",
                usage.character_count, usage.character_limit
            ),
        },
        Ok(usage) => HealthCheck {
            status: "ready",
            detail: format!(
                "{} reachable; {} of {} characters used",
                base_url, usage.character_count, usage.character_limit
            ),
        },
        Err(error) if error.is_quota_exceeded() => HealthCheck {
            status: "degraded",
            detail: "deepl quota exceeded".to_string(),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("deepl unreachable: {error}"),
        },
    }
}
