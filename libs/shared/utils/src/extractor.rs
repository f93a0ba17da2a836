use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::{request::Parts, HeaderMap};

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";
const UNKNOWN_CLIENT: &str = "unknown";

/// Caller network address as reported by the fronting proxy.
///
/// Assumes exactly one trusted proxy in front of the API. Earlier `x-forwarded-for` hops are
/// whatever the caller sent, so only the right-most one (appended by that proxy) is used,
/// then `x-real-ip`. Requests that carry neither share the `unknown` bucket, so rate limits
/// still apply to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let real_ip = || {
            headers
                .get(REAL_IP)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let address = forwarded.or_else(real_ip).unwrap_or(UNKNOWN_CLIENT);
        ClientIp(address.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
