use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, HeaderMap};
use axum::http::request::Parts;

use crate::net::error::{self, AuthKind};
use crate::state::ArcShared;

pub const API_KEY_HEADER: &str = "x-api-key";

const BEARER_SCHEME: &str = "Bearer";

/// digest of a shared secret. equality on the digest runs in constant time
pub fn digest(key: &str) -> blake3::Hash {
    blake3::hash(key.as_bytes())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> error::Result<Option<&'a str>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let value = value.to_str()
        .map_err(|_| error::Error::api(AuthKind::InvalidApiKey))?
        .trim();

    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

/// the key supplied by the caller. the dedicated header wins over a bearer
/// authorization header and empty values count as absent
pub fn find_key(headers: &HeaderMap) -> error::Result<Option<&str>> {
    if let Some(key) = header_str(headers, API_KEY_HEADER)? {
        return Ok(Some(key));
    }

    let Some(authorization) = header_str(headers, AUTHORIZATION.as_str())? else {
        return Ok(None);
    };

    let key = match authorization.strip_prefix(BEARER_SCHEME) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => authorization,
    };

    if key.is_empty() {
        Ok(None)
    } else {
        Ok(Some(key))
    }
}

/// proof that the request carried the configured api key
#[derive(Debug)]
pub struct ApiKey;

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
    ArcShared: FromRef<S>,
{
    type Rejection = error::Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared = ArcShared::from_ref(state);

        let Some(given) = find_key(&parts.headers)? else {
            return Err(error::Error::api((
                AuthKind::ApiKeyMissing,
                "Invalid or missing API key"
            )));
        };

        if digest(given) != *shared.api_key() {
            return Err(error::Error::api((
                AuthKind::InvalidApiKey,
                "Invalid or missing API key"
            )));
        }

        Ok(ApiKey)
    }
}
