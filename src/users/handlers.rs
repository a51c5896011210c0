use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        require_auth, AuthUser,
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{LoginUser, RegisterUser, UpdateUser, UserBody, UserResponse},
        repo_types::{NewUser, User},
    },
    validation::{normalize_email, ValidatedJson},
};

pub fn user_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login));

    let authenticated = Router::new()
        .route("/user", get(current_user).put(update_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(authenticated)
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<UserBody<RegisterUser>>,
) -> Result<(StatusCode, Json<UserBody<UserResponse>>), ApiError> {
    let RegisterUser {
        username,
        email,
        password,
    } = body.user;

    let password_hash = hash_password(&password)?;
    let new_user = NewUser {
        username: username.trim().to_string(),
        email: normalize_email(&email),
        password_hash,
    };

    let user = state.users.create(new_user).await.map_err(|e| {
        warn!(error = %e, "create user failed");
        ApiError::from(e)
    })?;

    let token = state.jwt.issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::new(user, token))))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<UserBody<LoginUser>>,
) -> Result<Json<UserBody<UserResponse>>, ApiError> {
    let email = normalize_email(&body.user.email);

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&body.user.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.jwt.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(UserResponse::new(user, token)))
}

#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserBody<UserResponse>>, ApiError> {
    let user = load_user(&state, user_id).await?;
    let token = state.jwt.issue(user.id)?;
    Ok(Json(UserResponse::new(user, token)))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(body): ValidatedJson<UserBody<UpdateUser>>,
) -> Result<Json<UserBody<UserResponse>>, ApiError> {
    let mut user = load_user(&state, user_id).await?;
    let changes = body.user.into_changes()?;

    if !changes.is_empty() {
        let password_changed = changes.password_hash.is_some();
        user.apply(changes);
        user = state.users.update(&user).await.map_err(|e| {
            warn!(error = %e, %user_id, "update user failed");
            ApiError::from(e)
        })?;
        info!(%user_id, password_changed, "user updated");
    }

    let token = state.jwt.issue(user.id)?;
    Ok(Json(UserResponse::new(user, token)))
}

/// A verified token whose user no longer exists is treated as unauthenticated.
async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token refers to unknown user");
        ApiError::Unauthenticated("user not found")
    })
}
