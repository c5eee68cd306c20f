//! Module Page Repository
//!
//! The ordering and mutation core. Pages of one module keep a contiguous
//! 0-based `sort_order`; every row carries a `version` counter used for
//! optimistic concurrency control. Updates are single conditional writes
//! (`WHERE id = ? AND version = ?`) — never read-then-write pairs.

use std::collections::HashSet;

use sqlx::SqlitePool;
use uuid::Uuid;

use shared::models::{ModulePage, PageBody, PageCreate, PageKind, PageUpdate, ReorderEntry};

use crate::sanitize::sanitize_theory_html;

use super::{RepoError, RepoResult, module};

pub async fn find_by_module(pool: &SqlitePool, module_id: &str) -> RepoResult<Vec<ModulePage>> {
    let pages = sqlx::query_as::<_, ModulePage>(
        "SELECT id, module_id, sort_order, kind, content, language, version, created_at, updated_at FROM module_page WHERE module_id = ? ORDER BY sort_order",
    )
    .bind(module_id)
    .fetch_all(pool)
    .await?;
    Ok(pages)
}

pub async fn find_by_id(pool: &SqlitePool, page_id: &str) -> RepoResult<Option<ModulePage>> {
    let page = sqlx::query_as::<_, ModulePage>(
        "SELECT id, module_id, sort_order, kind, content, language, version, created_at, updated_at FROM module_page WHERE id = ?",
    )
    .bind(page_id)
    .fetch_optional(pool)
    .await?;
    Ok(page)
}

/// Create a new page at the caller-supplied position, or appended after the
/// module's last page. Theory content is sanitized; code content is persisted
/// verbatim. New pages always start at version 1.
pub async fn create(pool: &SqlitePool, module_id: &str, data: PageCreate) -> RepoResult<ModulePage> {
    module::find_by_id(pool, module_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Module {module_id} not found")))?;

    let (kind, content, language) = match data.body {
        PageBody::Theory { content } => (PageKind::Theory, sanitize_theory_html(&content), None),
        PageBody::Code { content, language } => (PageKind::Code, content, Some(language)),
    };

    let sort_order = match data.sort_order {
        Some(order) => order,
        None => next_order(pool, module_id).await?,
    };

    let now = shared::util::now_millis();
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO module_page (id, module_id, sort_order, kind, content, language, version, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&id)
    .bind(module_id)
    .bind(sort_order)
    .bind(kind)
    .bind(&content)
    .bind(language)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create module page".into()))
}

/// Conditional partial update.
///
/// The write only succeeds when the stored version equals `expected_version`;
/// the version check and the increment happen in one statement, so a
/// concurrent writer can never be silently overwritten. Zero affected rows on
/// an existing page means the caller lost the race.
pub async fn update(
    pool: &SqlitePool,
    page_id: &str,
    data: PageUpdate,
    expected_version: i64,
) -> RepoResult<ModulePage> {
    let existing = find_by_id(pool, page_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Page {page_id} not found")))?;

    let content = match data.content {
        Some(c) if existing.kind == PageKind::Theory => Some(sanitize_theory_html(&c)),
        other => other,
    };
    // Language is only meaningful on code pages; theory pages never persist one.
    let language = match existing.kind {
        PageKind::Code => data.language,
        PageKind::Theory => None,
    };

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE module_page SET content = COALESCE(?, content), language = COALESCE(?, language), sort_order = COALESCE(?, sort_order), version = version + 1, updated_at = ? WHERE id = ? AND version = ?",
    )
    .bind(&content)
    .bind(language)
    .bind(data.sort_order)
    .bind(now)
    .bind(page_id)
    .bind(expected_version)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::VersionConflict(format!(
            "Page {page_id} was modified since version {expected_version} was read"
        )));
    }

    find_by_id(pool, page_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Page {page_id} not found")))
}

/// Delete a page and close the gap it leaves behind.
///
/// The delete and the sibling reindex run in one transaction: siblings with a
/// greater order are shifted down by one, restoring contiguity. Returns the
/// deleted page's prior representation.
pub async fn delete(pool: &SqlitePool, page_id: &str) -> RepoResult<ModulePage> {
    let existing = find_by_id(pool, page_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Page {page_id} not found")))?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM module_page WHERE id = ?")
        .bind(page_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE module_page SET sort_order = sort_order - 1 WHERE module_id = ? AND sort_order > ?",
    )
    .bind(&existing.module_id)
    .bind(existing.sort_order)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(existing)
}

/// Apply a batch reorder as one atomic unit.
///
/// Every referenced page must belong to the module, and the submitted entries
/// must form a full permutation 0..n-1 of the module's pages — both checked
/// before any write. Each touched page's version is bumped by one. Returns
/// the module's page list ordered ascending.
pub async fn reorder(
    pool: &SqlitePool,
    module_id: &str,
    updates: &[ReorderEntry],
) -> RepoResult<Vec<ModulePage>> {
    module::find_by_id(pool, module_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Module {module_id} not found")))?;

    let pages = find_by_module(pool, module_id).await?;
    let member_ids: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut orders: Vec<i64> = Vec::with_capacity(updates.len());
    for entry in updates {
        let page_id = entry.page_id.to_string();
        if !member_ids.contains(page_id.as_str()) {
            return Err(RepoError::InvalidReference(format!(
                "Page {page_id} does not belong to module {module_id}"
            )));
        }
        if !seen_ids.insert(page_id) {
            return Err(RepoError::Validation(format!(
                "Page {} is listed more than once",
                entry.page_id
            )));
        }
        orders.push(entry.order);
    }

    // The submitted orders must cover every page exactly once as 0..n-1.
    if updates.len() != pages.len() {
        return Err(RepoError::Validation(format!(
            "Reorder must cover all {} pages of the module, got {}",
            pages.len(),
            updates.len()
        )));
    }
    orders.sort_unstable();
    if orders.iter().enumerate().any(|(i, &o)| o != i as i64) {
        return Err(RepoError::Validation(
            "Orders must form a contiguous permutation starting at 0".into(),
        ));
    }

    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    for entry in updates {
        sqlx::query(
            "UPDATE module_page SET sort_order = ?, version = version + 1, updated_at = ? WHERE id = ? AND module_id = ?",
        )
        .bind(entry.order)
        .bind(now)
        .bind(entry.page_id.to_string())
        .bind(module_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    find_by_module(pool, module_id).await
}

/// Next append position: max existing order + 1, or 0 for an empty module
async fn next_order(pool: &SqlitePool, module_id: &str) -> RepoResult<i64> {
    let next: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM module_page WHERE module_id = ?",
    )
    .bind(module_id)
    .fetch_one(pool)
    .await?;
    Ok(next)
}
