use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::services::{ServeDir, ServeFile};
use shared::protocol::{ALL_DEVICES_PATH, DEVICES_PATH, REAL_IP_HEADER, REGISTER_PATH, REGISTER_SUCCESS};
use shared::types::{DeviceEntry, RegisterRequest};
use crate::config::AuthConfig;
use crate::registry::DeviceRegistry;
use super::address::{external_address, parse_internal_address};
use super::auth;
use super::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub registry: DeviceRegistry,
    pub auth: Arc<AuthConfig>,
    /// Log every API request at debug level
    pub log_requests: bool,
}

/// API routes. The API key is checked before Basic credentials.
pub fn router(state: AppState) -> Router {
    let mut api = Router::new()
        .route(REGISTER_PATH, post(register_device))
        .route(DEVICES_PATH, get(list_devices))
        .route(ALL_DEVICES_PATH, get(list_all_devices))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_basic_auth))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    if state.log_requests {
        api = api.route_layer(middleware::from_fn(log_request));
    }

    api.with_state(state)
}

/// Frontend files; unknown paths get `index.html` so client-side routing works.
pub fn spa_service(public_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join("index.html")))
}

/// Peer address plus the forwarded address when a proxy supplied one
fn request_origin(peer: SocketAddr, headers: &HeaderMap) -> String {
    let forwarded = headers
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(real_ip) => format!("{} ({} {})", peer.ip(), REAL_IP_HEADER, real_ip),
        None => peer.ip().to_string(),
    }
}

async fn log_request(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let origin = request_origin(peer, req.headers());
    tracing::debug!(path = %req.uri().path(), external_ip = %origin, "Request");
    next.run(req).await
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn register_device(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    if !is_json(&headers) {
        return Err(ApiError::UnsupportedContentType);
    }
    if body.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let request: RegisterRequest = serde_json::from_slice(&body)?;
    let internal = parse_internal_address(&request.address)?;

    let peer = peer.ip().to_canonical();
    let external = external_address(peer, &headers).ok_or(ApiError::UnproxiedLoopback(peer))?;

    let outcome = state.registry.upsert(
        &external,
        internal,
        request.id,
        request.name.unwrap_or_default(),
        request.tags.unwrap_or_default(),
    );
    tracing::debug!("Registration from {}: {:?} {}", external, outcome, internal);

    Ok(REGISTER_SUCCESS)
}

async fn list_devices(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<DeviceEntry>>, ApiError> {
    let external = external_address(peer.ip(), &headers).ok_or(ApiError::NotFound)?;
    Ok(Json(state.registry.list_for(&external)))
}

async fn list_all_devices(State(state): State<AppState>) -> Json<Vec<DeviceEntry>> {
    Json(state.registry.list_all())
}
