//! Module API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use shared::models::{Module, ModuleCreate, ModuleUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::module;
use crate::utils::validation::{
    MAX_MODULE_DESCRIPTION_LEN, MODULE_TITLE_MAX_LEN, MODULE_TITLE_MIN_LEN, Violations,
};
use crate::utils::{AppError, AppResult};

fn validate_create(payload: &ModuleCreate) -> AppResult<()> {
    let mut v = Violations::new();
    v.require_text_range(
        &payload.title,
        "title",
        MODULE_TITLE_MIN_LEN,
        MODULE_TITLE_MAX_LEN,
    );
    v.optional_text(&payload.description, "description", MAX_MODULE_DESCRIPTION_LEN);
    v.into_result()
}

fn validate_update(payload: &ModuleUpdate) -> AppResult<()> {
    let mut v = Violations::new();
    if let Some(title) = &payload.title {
        v.require_text_range(title, "title", MODULE_TITLE_MIN_LEN, MODULE_TITLE_MAX_LEN);
    }
    v.optional_text(&payload.description, "description", MAX_MODULE_DESCRIPTION_LEN);
    v.into_result()
}

/// GET /api/modules - 获取所有模块
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Module>>> {
    let modules = module::find_all(&state.pool).await?;
    Ok(Json(modules))
}

/// GET /api/modules/:id - 获取单个模块
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Module>> {
    let item = module::find_by_id(&state.pool, &id.to_string())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Module {} not found", id)))?;
    Ok(Json(item))
}

/// POST /api/modules - 创建模块
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<ModuleCreate>,
) -> AppResult<(StatusCode, Json<Module>)> {
    validate_create(&payload)?;

    let item = module::create(&state.pool, payload, &current_user.id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/modules/:id - 更新模块
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleUpdate>,
) -> AppResult<Json<Module>> {
    validate_update(&payload)?;

    let item = module::update(&state.pool, &id.to_string(), payload, &current_user.id).await?;
    Ok(Json(item))
}

/// DELETE /api/modules/:id - 删除模块 (级联删除页面)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<bool>> {
    let result = module::delete(&state.pool, &id.to_string()).await?;
    Ok(Json(result))
}
