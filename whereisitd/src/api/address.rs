use std::net::IpAddr;
use axum::http::HeaderMap;
use shared::protocol::REAL_IP_HEADER;
use super::error::ApiError;

/// The address a request effectively comes from.
///
/// A loopback peer is taken to be the local reverse proxy, so the real
/// client is read from `x-real-ip`. Returns `None` when that header is
/// missing or empty.
pub fn external_address(peer: IpAddr, headers: &HeaderMap) -> Option<String> {
    let peer = peer.to_canonical();
    if !peer.is_loopback() {
        return Some(peer.to_string());
    }

    let forwarded = headers
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(real_ip) => Some(real_ip.to_string()),
        None => {
            tracing::debug!("{} sent a request without {}, is the proxy configured?", peer, REAL_IP_HEADER);
            None
        }
    }
}

/// Parse a self-reported device address. Surrounding whitespace is ignored,
/// bracketed IPv6 and loopback addresses are rejected.
pub fn parse_internal_address(raw: &str) -> Result<IpAddr, ApiError> {
    let trimmed = raw.trim();
    let ip: IpAddr = trimmed
        .parse()
        .map_err(|_| ApiError::InvalidAddress(trimmed.to_string()))?;

    if ip.to_canonical().is_loopback() {
        return Err(ApiError::Loopback);
    }
    Ok(ip)
}
