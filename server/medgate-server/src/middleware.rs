use crate::cookies::session_token;
use crate::error::ApiError;
use crate::state::AppState;
use async_trait::async_trait;
use auth_identity::{IdentityError, IdentityView, UnauthenticatedReason};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;

/// Request timing middleware
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        duration_ms = start.elapsed().as_millis(),
        status = response.status().as_u16(),
        "Request processed"
    );

    response
}

/// Resolves the session token and attaches the identity for handlers.
///
/// # Errors
///
/// Rejects with 401 when no valid session is presented.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(&jar, request.headers());
    let identity = state.identity.authenticate(token.as_deref()).await?;

    tracing::debug!(identity_id = %identity.id, role = %identity.role, "Session accepted");
    request
        .extensions_mut()
        .insert(AuthenticatedIdentity(identity));

    Ok(next.run(request).await)
}

/// Identity attached by [`require_session`]
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub IdentityView);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Identity(IdentityError::Unauthenticated(
                    UnauthenticatedReason::MissingToken,
                ))
            })
    }
}

/// CORS for the single trusted front end; cookies require credentials.
pub fn create_cors_layer(frontend_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
