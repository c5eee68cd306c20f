//! Module Page API Handlers
//!
//! 页面更新是乐观并发控制的写入：客户端通过 `If-Match` 头携带最后读取到的
//! 版本号，版本不匹配时返回 409 (E0007)。

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
};
use uuid::Uuid;

use shared::models::{
    ModulePage, PageBody, PageCreate, PageList, PageReorder, PageUpdate,
};

use crate::core::ServerState;
use crate::db::repository::{module, module_page};
use crate::utils::validation::{MAX_CODE_CONTENT_LEN, MAX_THEORY_CONTENT_LEN, Violations};
use crate::utils::{AppError, AppResult};

fn validate_create(payload: &PageCreate) -> AppResult<()> {
    let mut v = Violations::new();
    match &payload.body {
        PageBody::Theory { content } => {
            v.require_text(content, "content", MAX_THEORY_CONTENT_LEN);
        }
        PageBody::Code { content, .. } => {
            v.require_text(content, "content", MAX_CODE_CONTENT_LEN);
        }
    }
    if let Some(order) = payload.sort_order {
        v.non_negative(order, "order");
    }
    v.into_result()
}

fn validate_update(payload: &PageUpdate, existing: &ModulePage) -> AppResult<()> {
    let mut v = Violations::new();
    if let Some(content) = &payload.content {
        let max_len = match existing.kind {
            shared::models::PageKind::Theory => MAX_THEORY_CONTENT_LEN,
            shared::models::PageKind::Code => MAX_CODE_CONTENT_LEN,
        };
        v.require_text(content, "content", max_len);
    }
    if let Some(order) = payload.sort_order {
        v.non_negative(order, "order");
    }
    v.into_result()
}

fn validate_reorder(payload: &PageReorder) -> AppResult<()> {
    let mut v = Violations::new();
    if payload.updates.is_empty() {
        v.add("updates", "must not be empty");
    }
    for (idx, entry) in payload.updates.iter().enumerate() {
        if entry.order < 0 {
            v.add(
                &format!("updates[{idx}].order"),
                format!("must be non-negative, got {}", entry.order),
            );
        }
    }
    v.into_result()
}

/// 从 `If-Match` 头解析客户端最后读取到的版本号
fn expected_version(headers: &HeaderMap) -> AppResult<i64> {
    let raw = headers.get(header::IF_MATCH).ok_or_else(|| {
        AppError::validation("If-Match header with the last observed page version is required")
    })?;
    let value = raw
        .to_str()
        .map_err(|_| AppError::validation("If-Match header must be a plain integer version"))?;
    value
        .trim()
        .trim_matches('"')
        .parse()
        .map_err(|_| AppError::validation("If-Match header must be a plain integer version"))
}

/// 确认页面属于路径中的模块
async fn find_page_in_module(
    state: &ServerState,
    module_id: Uuid,
    page_id: Uuid,
) -> AppResult<ModulePage> {
    let page = module_page::find_by_id(&state.pool, &page_id.to_string())
        .await?
        .filter(|p| p.module_id == module_id.to_string())
        .ok_or_else(|| {
            AppError::not_found(format!("Page {page_id} not found in module {module_id}"))
        })?;
    Ok(page)
}

/// GET /api/modules/:module_id/pages - 获取模块全部页面 (按 order 升序)
pub async fn list(
    State(state): State<ServerState>,
    Path(module_id): Path<Uuid>,
) -> AppResult<Json<PageList>> {
    let module_id = module_id.to_string();
    module::find_by_id(&state.pool, &module_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Module {module_id} not found")))?;

    let pages = module_page::find_by_module(&state.pool, &module_id).await?;
    Ok(Json(PageList { pages }))
}

/// POST /api/modules/:module_id/pages - 创建页面
pub async fn create(
    State(state): State<ServerState>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<PageCreate>,
) -> AppResult<(StatusCode, Json<ModulePage>)> {
    validate_create(&payload)?;

    let page = module_page::create(&state.pool, &module_id.to_string(), payload).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

/// PUT /api/modules/:module_id/pages/:page_id - 条件更新页面
///
/// 版本检查与自增在同一条件写入中完成；影响 0 行即版本冲突 (409)。
pub async fn update(
    State(state): State<ServerState>,
    Path((module_id, page_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(payload): Json<PageUpdate>,
) -> AppResult<Json<ModulePage>> {
    let version = expected_version(&headers)?;
    let existing = find_page_in_module(&state, module_id, page_id).await?;
    validate_update(&payload, &existing)?;

    let page =
        module_page::update(&state.pool, &page_id.to_string(), payload, version).await?;
    Ok(Json(page))
}

/// DELETE /api/modules/:module_id/pages/:page_id - 删除页面并重排兄弟页面
pub async fn delete(
    State(state): State<ServerState>,
    Path((module_id, page_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ModulePage>> {
    find_page_in_module(&state, module_id, page_id).await?;

    let deleted = module_page::delete(&state.pool, &page_id.to_string()).await?;
    Ok(Json(deleted))
}

/// PATCH /api/modules/:module_id/pages/reorder - 批量重排
///
/// 全部成功或全部失败；每个被触及页面的版本号 +1。
pub async fn reorder(
    State(state): State<ServerState>,
    Path(module_id): Path<Uuid>,
    Json(payload): Json<PageReorder>,
) -> AppResult<Json<PageList>> {
    validate_reorder(&payload)?;

    let pages =
        module_page::reorder(&state.pool, &module_id.to_string(), &payload.updates).await?;
    Ok(Json(PageList { pages }))
}
