use std::net::IpAddr;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Request-path failures, each mapped to a plain-text client error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    #[error("No content")]
    EmptyBody,

    #[error("{0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("{0} is not a valid IP address")]
    InvalidAddress(String),

    #[error("Loopback is not allowed")]
    Loopback,

    /// Loopback peer without a forwarded address, i.e. a misconfigured proxy
    #[error("Host {0} is not allowed to register devices")]
    UnproxiedLoopback(IpAddr),

    #[error("404 page not found")]
    NotFound,

    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// `challenge` adds a WWW-Authenticate header to the response
    #[error("Unauthorized")]
    Unauthorized { challenge: bool },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidApiKey => StatusCode::FORBIDDEN,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!("Rejecting request: {}", self);
        let body = format!("{}\n", self);
        let mut response = (self.status(), body).into_response();
        if let ApiError::Unauthorized { challenge: true } = self {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static(r#"Basic realm="Restricted""#),
            );
        }
        response
    }
}
