//! Auth API Handlers

use axum::{
    Json,
    extract::{Extension, State},
};

use shared::client::{LoginRequest, LoginResponse, UserInfo};
use shared::models::UserRole;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Permission strings granted per role, embedded in the token
fn permissions_for(role: UserRole) -> Vec<String> {
    match role {
        UserRole::Admin => vec!["all".into()],
        UserRole::Student => vec!["modules:read".into(), "pages:read".into()],
    }
}

/// POST /api/auth/login - 登录换取令牌
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let account = user::find_by_username(&state.pool, &payload.username)
        .await?
        .filter(|u| u.is_active);

    // 统一错误消息，防止用户名枚举
    let Some(account) = account else {
        security_log!("WARN", "login_unknown_user", username = payload.username.clone());
        return Err(AppError::invalid_credentials());
    };

    if !user::verify_password(&account.password_hash, &payload.password) {
        security_log!("WARN", "login_bad_password", username = payload.username.clone());
        return Err(AppError::invalid_credentials());
    }

    let permissions = permissions_for(account.role);
    let token = state
        .jwt_service
        .generate_token(
            &account.id,
            &account.username,
            account.role.as_str(),
            &permissions,
        )
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!(
        "INFO",
        "login_success",
        user_id = account.id.clone(),
        username = account.username.clone()
    );

    Ok(Json(LoginResponse {
        token,
        expires_in: state.jwt_service.config.expiration_minutes * 60,
        user: UserInfo {
            id: account.id,
            username: account.username,
            display_name: account.display_name,
            role: account.role,
        },
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserInfo>> {
    let account = user::find_by_id(&state.pool, &current_user.id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current_user.id)))?;

    Ok(Json(UserInfo {
        id: account.id,
        username: account.username,
        display_name: account.display_name,
        role: account.role,
    }))
}
