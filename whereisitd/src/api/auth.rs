use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;
use shared::protocol::API_KEY_HEADER;
use super::error::ApiError;
use super::routes::AppState;

fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Rejects requests without the configured `x-api-key`.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if !secure_eq(presented, state.auth.api_key.as_bytes()) {
        return Err(ApiError::InvalidApiKey);
    }
    Ok(next.run(req).await)
}

/// Rejects requests without matching HTTP Basic credentials.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_basic_auth(req.headers(), &state.auth.username, &state.auth.password)?;
    Ok(next.run(req).await)
}

fn check_basic_auth(headers: &HeaderMap, username: &str, password: &str) -> Result<(), ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized { challenge: true })?;

    let encoded = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or(ApiError::Unauthorized { challenge: false })?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::Unauthorized { challenge: false })?;

    let (user, pass) = std::str::from_utf8(&decoded)
        .ok()
        .and_then(|creds| creds.split_once(':'))
        .ok_or(ApiError::Unauthorized { challenge: false })?;

    // Evaluate both so a wrong username costs the same as a wrong password
    let user_ok = secure_eq(user.as_bytes(), username.as_bytes());
    let pass_ok = secure_eq(pass.as_bytes(), password.as_bytes());
    if !(user_ok & pass_ok) {
        return Err(ApiError::Unauthorized { challenge: true });
    }
    Ok(())
}
