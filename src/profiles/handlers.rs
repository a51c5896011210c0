//! Profile and follow routes. Follow relationships are not persisted yet; the
//! handlers only hold the route surface and answer with a placeholder.

use axum::{
    extract::Path,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::{require_auth, AuthUser},
    state::AppState,
};

pub fn profile_routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/profiles/:username", get(get_profile));

    let authenticated = Router::new()
        .route("/profiles/:username/follow", post(follow).delete(unfollow))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(authenticated)
}

#[instrument]
pub async fn get_profile(Path(username): Path<String>) -> Json<&'static str> {
    debug!(%username, "profile requested");
    Json("Get Profile")
}

#[instrument]
pub async fn follow(AuthUser(user_id): AuthUser, Path(username): Path<String>) -> Json<&'static str> {
    debug!(%user_id, %username, "follow requested");
    Json("Follow user")
}

#[instrument]
pub async fn unfollow(
    AuthUser(user_id): AuthUser,
    Path(username): Path<String>,
) -> Json<&'static str> {
    debug!(%user_id, %username, "unfollow requested");
    Json("Unfollow user")
}
