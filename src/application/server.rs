#[cfg(test)]
#[path = "server_test.rs"]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use axum::Json;
use axum::Router;
use tokio::net::TcpListener;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::GenerationError;
use crate::infrastructure::gate::RateLimitStatus;
use crate::infrastructure::gate::RequestGate;

/// Longest a single generation may run before the upstream call is dropped.
pub const MAX_DURATION: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct GateState {
    gate: Arc<RequestGate>,
    upstream_url: String,
    trust_forwarded: bool,
    client: reqwest::Client,
}

impl GateState {
    pub fn new(gate: RequestGate, upstream_url: &str, trust_forwarded: bool) -> Result<GateState> {
        let client = reqwest::Client::builder().timeout(MAX_DURATION).build()?;

        return Ok(GateState {
            gate: Arc::new(gate),
            upstream_url: upstream_url.to_string(),
            trust_forwarded,
            client,
        });
    }
}

pub fn router(state: GateState) -> Router {
    return Router::new()
        .route("/api/chat", post(chat))
        .with_state(state);
}

/// Runs the gate server until the process is stopped.
pub async fn serve() -> Result<()> {
    let state = GateState::new(
        RequestGate::from_config()?,
        &Config::get(ConfigKey::UpstreamURL),
        Config::get_bool(ConfigKey::TrustForwardedFor),
    )?;

    let listener = TcpListener::bind(Config::get(ConfigKey::ServerAddr)).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, upstream = %state.upstream_url, "Gate server listening");
    println!("Listening on http://{local_addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    return Ok(());
}

/// Peer address, or the first hop of `X-Forwarded-For` when the server sits
/// behind a trusted proxy.
fn caller_identity(headers: &HeaderMap, addr: SocketAddr, trust_forwarded: bool) -> String {
    if !trust_forwarded {
        return addr.ip().to_string();
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| return value.to_str().ok())
        .and_then(|value| return value.split(',').next())
        .map(|value| return value.trim())
        .filter(|value| return !value.is_empty());

    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }

    return addr.ip().to_string();
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(status.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(status.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(status.reset));
}

fn error_response(err: GenerationError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut headers = HeaderMap::new();
    if let GenerationError::RateLimited {
        limit,
        remaining,
        reset,
    } = err
    {
        insert_rate_limit_headers(
            &mut headers,
            &RateLimitStatus {
                limit,
                remaining,
                reset,
            },
        );
    }

    return (status, headers, Json(err.to_body())).into_response();
}

async fn chat(
    State(state): State<GateState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(mut request): Json<ChatRequest>,
) -> Response {
    let caller = caller_identity(&headers, addr, state.trust_forwarded);

    let admission = match state.gate.admit(&request, &caller) {
        Ok(admission) => admission,
        Err(err) => {
            tracing::warn!(caller = %caller, kind = err.kind(), "Request refused by gate");
            return error_response(err);
        }
    };

    request.config.api_key = admission.api_key.clone();

    let res = state
        .client
        .post(&state.upstream_url)
        .json(&request)
        .send()
        .await;

    let res = match res {
        Ok(res) => res,
        Err(err) => {
            tracing::error!(caller = %caller, error = ?err, "Upstream request failed");
            return error_response(GenerationError::from(err));
        }
    };

    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        tracing::error!(caller = %caller, status = status, body = %body, "Upstream refused generation");
        return error_response(GenerationError::classify(status, &body));
    }

    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| return value.to_str().ok())
        .unwrap_or("application/x-ndjson")
        .to_string();

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(status) = &admission.rate_limit {
        insert_rate_limit_headers(&mut response_headers, status);
    }

    tracing::debug!(caller = %caller, "Streaming upstream generation");
    let body = Body::from_stream(res.bytes_stream());

    return (StatusCode::OK, response_headers, body).into_response();
}
