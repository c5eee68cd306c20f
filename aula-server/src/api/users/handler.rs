//! User API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use shared::models::{User, UserCreate, UserUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::validation::{MAX_NAME_LEN, MAX_PASSWORD_LEN, Violations};
use crate::utils::{AppError, AppResult};

fn validate_create(payload: &UserCreate) -> AppResult<()> {
    let mut v = Violations::new();
    v.require_text(&payload.username, "username", MAX_NAME_LEN);
    v.require_text(&payload.display_name, "display_name", MAX_NAME_LEN);
    v.require_text(&payload.password, "password", MAX_PASSWORD_LEN);
    v.into_result()
}

fn validate_update(payload: &UserUpdate) -> AppResult<()> {
    let mut v = Violations::new();
    if let Some(display_name) = &payload.display_name {
        v.require_text(display_name, "display_name", MAX_NAME_LEN);
    }
    if let Some(password) = &payload.password {
        v.require_text(password, "password", MAX_PASSWORD_LEN);
    }
    v.into_result()
}

/// GET /api/users - 获取所有用户
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<User>>> {
    let users = user::find_all(&state.pool).await?;
    Ok(Json(users))
}

/// GET /api/users/:id - 获取单个用户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    let item = user::find_by_id(&state.pool, &id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;
    Ok(Json(item))
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_create(&payload)?;

    let item = user::create(&state.pool, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/users/:id - 更新用户
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    validate_update(&payload)?;

    let item = user::update(&state.pool, &id.to_string(), payload).await?;
    Ok(Json(item))
}

/// DELETE /api/users/:id - 删除用户 (软删除)
///
/// 不允许删除自己的账户
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<bool>> {
    if current_user.id == id.to_string() {
        return Err(AppError::validation("Cannot delete your own account"));
    }

    let result = user::delete(&state.pool, &id.to_string()).await?;
    if !result {
        return Err(AppError::not_found(format!("User {} not found", id)));
    }
    Ok(Json(result))
}
