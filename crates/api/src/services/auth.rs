//! Session resolution for tracking requests.
//!
//! A request may carry its session token over several transports.
//! They are tried in a fixed order and the first one that resolves to
//! a valid, non-expired session wins:
//!
//! 1. A caller already bound to the request (an upstream layer put a
//!    [`Caller`] into the request extensions).
//! 2. `Authorization: Bearer <token>` header.
//! 3. The session cookie.
//! 4. A `session_token` field inside the request body.
//!
//! Tokens are never stored or compared in the clear. The SHA-256 digest
//! of the presented token is matched against the sessions table.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use shared::crypto::sha256_hex;
use sqlx::PgPool;
use uuid::Uuid;

use persistence::repositories::{SessionRepository, UserRepository};

use crate::error::ApiError;

/// Transport that carried the winning session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Caller was already resolved by an upstream layer.
    Session,
    /// `Authorization: Bearer` header.
    BearerHeader,
    /// Session cookie.
    Cookie,
    /// `session_token` field in the request body.
    BodyToken,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Session => "session",
            AuthMethod::BearerHeader => "bearer_header",
            AuthMethod::Cookie => "cookie",
            AuthMethod::BodyToken => "body_token",
        }
    }
}

/// The authenticated subject of a tracking request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub method: AuthMethod,
}

/// Extract the bearer token from the Authorization header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Candidate tokens in resolution order. Pure so the ordering is
/// testable without a database.
fn candidate_tokens<'a>(
    headers: &'a HeaderMap,
    jar: &'a CookieJar,
    cookie_name: &str,
    body_token: Option<&'a str>,
) -> Vec<(AuthMethod, &'a str)> {
    let mut candidates = Vec::new();
    if let Some(token) = bearer_token(headers) {
        candidates.push((AuthMethod::BearerHeader, token));
    }
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value();
        if !value.is_empty() {
            candidates.push((AuthMethod::Cookie, value));
        }
    }
    if let Some(token) = body_token {
        if !token.is_empty() {
            candidates.push((AuthMethod::BodyToken, token));
        }
    }
    candidates
}

/// Resolve the caller for a tracking request.
///
/// `existing` carries a caller bound by an upstream layer, which
/// short-circuits the chain. Otherwise each candidate token is hashed
/// and checked against the sessions table in order; the first valid
/// session wins and later candidates are not consulted.
pub async fn resolve_caller(
    pool: &PgPool,
    existing: Option<Caller>,
    headers: &HeaderMap,
    jar: &CookieJar,
    cookie_name: &str,
    body_token: Option<&str>,
) -> Result<Caller, ApiError> {
    if let Some(caller) = existing {
        return Ok(caller);
    }

    let sessions = SessionRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());

    let candidates = candidate_tokens(headers, jar, cookie_name, body_token);
    let mut attempted: Vec<&'static str> = Vec::new();

    for (method, token) in candidates {
        attempted.push(method.as_str());
        let token_hash = sha256_hex(token);
        let Some(session) = sessions.find_valid_by_token_hash(&token_hash).await? else {
            continue;
        };
        let Some(user) = users.find_by_id(session.user_id).await? else {
            tracing::warn!(
                user_id = %session.user_id,
                "Session references a user that no longer exists"
            );
            continue;
        };
        tracing::debug!(
            user_id = %user.id,
            method = method.as_str(),
            "Resolved tracking caller"
        );
        return Ok(Caller {
            user_id: user.id,
            family_id: user.family_id,
            method,
        });
    }

    let message = if attempted.is_empty() {
        "No session token presented".to_string()
    } else {
        format!("No valid session found (tried: {})", attempted.join(", "))
    };
    Err(ApiError::Unauthorized(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use axum_extra::extract::cookie::Cookie;

    fn jar_with(name: &str, value: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(name.to_string(), value.to_string()))
    }

    #[test]
    fn test_bearer_token_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_rejects_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_candidate_order_header_cookie_body() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer header-token".parse().unwrap());
        let jar = jar_with("fl_session", "cookie-token");

        let candidates = candidate_tokens(&headers, &jar, "fl_session", Some("body-token"));
        let methods: Vec<AuthMethod> = candidates.iter().map(|(m, _)| *m).collect();
        assert_eq!(
            methods,
            vec![
                AuthMethod::BearerHeader,
                AuthMethod::Cookie,
                AuthMethod::BodyToken
            ]
        );
        assert_eq!(candidates[0].1, "header-token");
        assert_eq!(candidates[1].1, "cookie-token");
        assert_eq!(candidates[2].1, "body-token");
    }

    #[test]
    fn test_candidate_skips_empty_body_token() {
        let headers = HeaderMap::new();
        let jar = CookieJar::new();
        let candidates = candidate_tokens(&headers, &jar, "fl_session", Some(""));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_candidate_ignores_other_cookies() {
        let headers = HeaderMap::new();
        let jar = jar_with("other_cookie", "value");
        let candidates = candidate_tokens(&headers, &jar, "fl_session", None);
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_auth_method_names() {
        assert_eq!(AuthMethod::Session.as_str(), "session");
        assert_eq!(AuthMethod::BearerHeader.as_str(), "bearer_header");
        assert_eq!(AuthMethod::Cookie.as_str(), "cookie");
        assert_eq!(AuthMethod::BodyToken.as_str(), "body_token");
    }
}
