//! Module Repository

use sqlx::SqlitePool;
use uuid::Uuid;

use shared::models::{Module, ModuleCreate, ModuleStatus, ModuleUpdate};

use super::{RepoError, RepoResult};

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Module>> {
    let modules = sqlx::query_as::<_, Module>(
        "SELECT id, title, description, status, created_by, updated_by, created_at, updated_at FROM module ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(modules)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Module>> {
    let module = sqlx::query_as::<_, Module>(
        "SELECT id, title, description, status, created_by, updated_by, created_at, updated_at FROM module WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(module)
}

/// Create a new module; `actor` is recorded as creator and last editor
pub async fn create(pool: &SqlitePool, data: ModuleCreate, actor: &str) -> RepoResult<Module> {
    let now = shared::util::now_millis();
    let id = Uuid::new_v4().to_string();
    let status = data.status.unwrap_or(ModuleStatus::Draft);

    sqlx::query(
        "INSERT INTO module (id, title, description, status, created_by, updated_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(status)
    .bind(actor)
    .bind(actor)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create module".into()))
}

/// Partial update; absent fields are left untouched
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    data: ModuleUpdate,
    actor: &str,
) -> RepoResult<Module> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE module SET title = COALESCE(?, title), description = COALESCE(?, description), status = COALESCE(?, status), updated_by = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.status)
    .bind(actor)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Module {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Module {id} not found")))
}

/// Hard delete a module; owned pages go with it (FK cascade)
pub async fn delete(pool: &SqlitePool, id: &str) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM module WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Module {id} not found")));
    }
    Ok(true)
}
