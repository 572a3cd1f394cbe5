use crate::handlers::{auth, health};
use crate::middleware::require_session;
use crate::state::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Create all application routes
pub fn create_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .route_layer(from_fn_with_state(state, require_session));

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .merge(protected);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api/auth", auth_routes)
}
