//! Session cookie transport

use auth_identity::{Environment, IssuedToken};
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "token";

/// HTTP-only, same-site strict, secure outside development.
///
/// `lifetime` should be the token's own lifetime so the browser drops the
/// cookie when the token stops verifying.
pub fn session_cookie(
    token: &IssuedToken,
    lifetime: Duration,
    environment: Environment,
) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(!environment.is_development())
        .path("/")
        .max_age(lifetime)
        .build()
}

/// Empty value expiring at the epoch so browsers drop the session.
pub fn cleared_session_cookie(environment: Environment) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(!environment.is_development())
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Session token from the cookie, falling back to `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| bearer_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
