use super::{parse_body, AuthResponse};
use crate::cookies::{cleared_session_cookie, session_cookie};
use crate::error::ApiError;
use crate::middleware::AuthenticatedIdentity;
use crate::state::AppState;
use auth_identity::{IdentityView, LoginRequest, RegistrationRequest, SessionView};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse<IdentityView>>), ApiError> {
    let request: RegistrationRequest = parse_body(&body)?;
    let registration = state.identity.register(request).await?;

    let jar = jar.add(session_cookie(
        &registration.token,
        state.session_lifetime(),
        state.environment,
    ));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse::with_user(
            "User registered successfully",
            registration.identity,
        )),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<AuthResponse<SessionView>>), ApiError> {
    let request: LoginRequest = parse_body(&body)?;
    let outcome = state.identity.login(request).await?;

    let jar = jar.add(session_cookie(
        &outcome.token,
        state.session_lifetime(),
        state.environment,
    ));
    Ok((
        jar,
        Json(AuthResponse::with_user("Login successful", outcome.identity)),
    ))
}

/// GET /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<AuthResponse<()>>) {
    (
        jar.add(cleared_session_cookie(state.environment)),
        Json(AuthResponse::message("Logged out successfully")),
    )
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
) -> Result<Json<AuthResponse<SessionView>>, ApiError> {
    let current = state.identity.current_identity(identity.id).await?;
    Ok(Json(AuthResponse::user(current)))
}
