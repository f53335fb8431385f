//! User routes: registration, login, logout and profiles.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use campus_core::Role;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration};
use crate::services::users::{UserChanges, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

/// Register a user.
///
/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    OptionalAuth(actor): OptionalAuth,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(body) = payload?;

    let user = AuthService::new(state.store())
        .register(
            Registration {
                name: body.name,
                email: body.email,
                password: body.password,
                role: body.role,
            },
            actor.as_ref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password and start a session.
///
/// POST /api/users/auth
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;

    let user = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|_| tracing::warn!("Failed login attempt"))?;

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({ "user": user })))
}

/// End the session.
///
/// POST /api/users/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in user's profile.
///
/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = UserService::new(state.store())
        .get(&current.id.to_string())
        .await?;
    Ok(Json(user))
}

/// GET /api/users?role=
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    query: std::result::Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<Vec<User>>> {
    let Query(query) = query?;
    let users = UserService::new(state.store()).list(query.role).await?;
    Ok(Json(users))
}

/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let user = UserService::new(state.store()).get(&id).await?;
    Ok(Json(user))
}

/// Update a profile. Editing yourself also refreshes the session.
///
/// PUT /api/users/{id}
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(body) = payload?;

    let user = UserService::new(state.store())
        .update(
            &current,
            &id,
            UserChanges {
                name: body.name,
                email: body.email,
                password: body.password,
                role: body.role,
            },
        )
        .await?;

    if user.id == current.id {
        set_current_user(&session, &CurrentUser::from(&user))
            .await
            .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    }

    Ok(Json(user))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    current.require_role(&[Role::Admin])?;
    UserService::new(state.store()).delete(&id).await?;
    Ok(Json(json!({ "message": "user deleted" })))
}
