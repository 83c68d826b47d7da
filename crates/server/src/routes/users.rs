//! Account routes: registration, login, profile and admin user management.

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use real_taste_core::{UserId, UserRole};

use super::{ApiResponse, not_found};
use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::{Json, Path, Query};
use crate::middleware::{
    RequireAdmin, RequireAuth, clear_current_user, refresh_current_user, set_current_user,
};
use crate::models::{CurrentUser, PageQuery, Pagination, User};
use crate::services::AuthService;
use crate::services::auth::ProfileChanges;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Admin edit of another account.
#[derive(Debug, Deserialize)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// POST /api/users/register
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&req.name, &req.email, &req.password)
        .await?;
    start_session(&session, &user).await?;

    info!(user_id = %user.id, "User registered");
    Ok(ApiResponse::data(user)
        .with_message("User registered successfully")
        .created())
}

/// POST /api/users/login
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    }

    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;
    start_session(&session, &user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(ApiResponse::data(user)
        .with_message("Login successful")
        .json())
}

/// POST /api/users/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<()>>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(ApiResponse::message("Logged out successfully").json())
}

/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<ApiResponse<User>>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::data(user).json())
}

/// PUT /api/users/profile
#[instrument(skip(state, session, current, req), fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<User>>> {
    let user = AuthService::new(state.pool())
        .update_profile(
            current.id,
            ProfileChanges {
                name: req.name.as_deref(),
                email: req.email.as_deref(),
                role: None,
            },
        )
        .await?;
    refresh_current_user(&session, &CurrentUser::from(&user)).await?;

    Ok(ApiResponse::data(user)
        .with_message("Profile updated successfully")
        .json())
}

/// PUT /api/users/password
#[instrument(skip(state, current, req), fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(req): Json<PasswordChange>,
) -> Result<Json<ApiResponse<()>>> {
    AuthService::new(state.pool())
        .change_password(current.id, &req.current_password, &req.new_password)
        .await?;
    info!("Password changed");
    Ok(ApiResponse::message("Password updated successfully").json())
}

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let (users, total) = UserRepository::new(state.pool()).list(&page).await?;
    Ok(ApiResponse::data(users)
        .with_pagination(Pagination::new(&page, total))
        .json())
}

/// GET /api/users/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<User>>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::data(user).json())
}

/// PUT /api/users/{id}
#[instrument(skip(state, session, admin, req), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(req): Json<AdminUserUpdate>,
) -> Result<Json<ApiResponse<User>>> {
    let user = AuthService::new(state.pool())
        .update_profile(
            id,
            ProfileChanges {
                name: req.name.as_deref(),
                email: req.email.as_deref(),
                role: req.role,
            },
        )
        .await?;

    if user.id == admin.id {
        refresh_current_user(&session, &CurrentUser::from(&user)).await?;
    }
    info!(user_id = %user.id, role = %user.role, "User updated by admin");

    Ok(ApiResponse::data(user)
        .with_message("User updated successfully")
        .json())
}

/// DELETE /api/users/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<()>>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found("User not found"))?;

    info!(user_id = %id, "User deleted");
    Ok(ApiResponse::message("User removed successfully").json())
}
