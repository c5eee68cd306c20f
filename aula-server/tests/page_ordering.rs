//! Integration tests for the page ordering and optimistic-concurrency core.
//! Run: cargo test -p aula-server --test page_ordering

use aula_server::db::DbService;
use aula_server::db::repository::{RepoError, module, module_page};
use shared::models::{
    ModuleCreate, PageBody, PageCreate, PageKind, PageUpdate, ProgrammingLanguage, ReorderEntry,
};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn setup() -> (SqlitePool, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("aula.db");
    let svc = DbService::new(db_path.to_str().unwrap()).await.unwrap();
    (svc.pool, tmp)
}

async fn make_module(pool: &SqlitePool) -> String {
    module::create(
        pool,
        ModuleCreate {
            title: "Intro to Rust".into(),
            description: None,
            status: None,
        },
        "tester",
    )
    .await
    .unwrap()
    .id
}

fn theory(content: &str) -> PageCreate {
    PageCreate {
        body: PageBody::Theory {
            content: content.into(),
        },
        sort_order: None,
    }
}

fn code(content: &str, language: ProgrammingLanguage) -> PageCreate {
    PageCreate {
        body: PageBody::Code {
            content: content.into(),
            language,
        },
        sort_order: None,
    }
}

/// (id, order, version) triples ordered by sort_order
async fn snapshot(pool: &SqlitePool, module_id: &str) -> Vec<(String, i64, i64)> {
    module_page::find_by_module(pool, module_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.id, p.sort_order, p.version))
        .collect()
}

#[tokio::test]
async fn create_appends_contiguously_from_zero() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let p0 = module_page::create(&pool, &module_id, theory("<p>one</p>"))
        .await
        .unwrap();
    let p1 = module_page::create(&pool, &module_id, theory("<p>two</p>"))
        .await
        .unwrap();
    let p2 = module_page::create(&pool, &module_id, code("fn main() {}", ProgrammingLanguage::Rust))
        .await
        .unwrap();

    assert_eq!(p0.sort_order, 0);
    assert_eq!(p1.sort_order, 1);
    assert_eq!(p2.sort_order, 2);
    assert_eq!(p0.version, 1);
    assert_eq!(p2.version, 1);
    assert_eq!(p2.kind, PageKind::Code);
    assert_eq!(p2.language, Some(ProgrammingLanguage::Rust));
}

#[tokio::test]
async fn create_honors_explicit_order() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let page = module_page::create(
        &pool,
        &module_id,
        PageCreate {
            body: PageBody::Theory {
                content: "<p>placed</p>".into(),
            },
            sort_order: Some(5),
        },
    )
    .await
    .unwrap();
    assert_eq!(page.sort_order, 5);
}

#[tokio::test]
async fn create_in_missing_module_is_not_found() {
    let (pool, _tmp) = setup().await;
    let err = module_page::create(&pool, &Uuid::new_v4().to_string(), theory("<p>x</p>"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got: {err:?}");
}

#[tokio::test]
async fn update_is_partial_and_bumps_version_by_one() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;
    let page = module_page::create(&pool, &module_id, code("SELECT 1", ProgrammingLanguage::Sql))
        .await
        .unwrap();

    let updated = module_page::update(
        &pool,
        &page.id,
        PageUpdate {
            content: Some("SELECT 2".into()),
            ..Default::default()
        },
        1,
    )
    .await
    .unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.content, "SELECT 2");
    // Untouched fields survive the partial update
    assert_eq!(updated.language, Some(ProgrammingLanguage::Sql));
    assert_eq!(updated.sort_order, page.sort_order);

    let again = module_page::update(
        &pool,
        &page.id,
        PageUpdate {
            language: Some(ProgrammingLanguage::Python),
            ..Default::default()
        },
        2,
    )
    .await
    .unwrap();
    assert_eq!(again.version, 3);
    assert_eq!(again.language, Some(ProgrammingLanguage::Python));
    assert_eq!(again.content, "SELECT 2");
}

#[tokio::test]
async fn stale_version_is_rejected_and_row_unchanged() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;
    let page = module_page::create(&pool, &module_id, theory("<p>v1</p>"))
        .await
        .unwrap();

    module_page::update(
        &pool,
        &page.id,
        PageUpdate {
            content: Some("<p>v2</p>".into()),
            ..Default::default()
        },
        1,
    )
    .await
    .unwrap();

    // A second writer still holding version 1 must lose
    let err = module_page::update(
        &pool,
        &page.id,
        PageUpdate {
            content: Some("<p>clobber</p>".into()),
            ..Default::default()
        },
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepoError::VersionConflict(_)), "got: {err:?}");

    let stored = module_page::find_by_id(&pool, &page.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "<p>v2</p>");
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn update_missing_page_is_not_found() {
    let (pool, _tmp) = setup().await;
    let err = module_page::update(
        &pool,
        &Uuid::new_v4().to_string(),
        PageUpdate::default(),
        1,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got: {err:?}");
}

#[tokio::test]
async fn theory_content_is_sanitized_code_is_verbatim() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let page = module_page::create(
        &pool,
        &module_id,
        theory("<p>safe</p><script>alert(1)</script>"),
    )
    .await
    .unwrap();
    assert_eq!(page.content, "<p>safe</p>");

    // Code content is data, never markup — stored byte-for-byte
    let snippet = "<script>alert(1)</script> && echo $HOME";
    let code_page = module_page::create(&pool, &module_id, code(snippet, ProgrammingLanguage::Html))
        .await
        .unwrap();
    assert_eq!(code_page.content, snippet);
}

#[tokio::test]
async fn theory_update_sanitizes_and_never_persists_language() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;
    let page = module_page::create(&pool, &module_id, theory("<p>start</p>"))
        .await
        .unwrap();

    let updated = module_page::update(
        &pool,
        &page.id,
        PageUpdate {
            content: Some("<p>next</p><iframe src=\"x\"></iframe>".into()),
            language: Some(ProgrammingLanguage::Python),
            ..Default::default()
        },
        1,
    )
    .await
    .unwrap();

    assert_eq!(updated.content, "<p>next</p>");
    assert_eq!(updated.language, None);
    assert_eq!(updated.kind, PageKind::Theory);
}

#[tokio::test]
async fn delete_reindexes_following_siblings() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let mut ids = Vec::new();
    for n in 0..4 {
        let page = module_page::create(&pool, &module_id, theory(&format!("<p>{n}</p>")))
            .await
            .unwrap();
        ids.push(page.id);
    }

    let deleted = module_page::delete(&pool, &ids[1]).await.unwrap();
    assert_eq!(deleted.id, ids[1]);
    assert_eq!(deleted.sort_order, 1);

    let after = snapshot(&pool, &module_id).await;
    assert_eq!(after.len(), 3);
    // Pages previously at {2,3} now occupy {1,2}; page 0 is untouched
    assert_eq!(after[0].0, ids[0]);
    assert_eq!(after[0].1, 0);
    assert_eq!(after[1].0, ids[2]);
    assert_eq!(after[1].1, 1);
    assert_eq!(after[2].0, ids[3]);
    assert_eq!(after[2].1, 2);
}

#[tokio::test]
async fn delete_missing_page_is_not_found() {
    let (pool, _tmp) = setup().await;
    let err = module_page::delete(&pool, &Uuid::new_v4().to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got: {err:?}");
}

#[tokio::test]
async fn reorder_applies_permutation_and_bumps_versions() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let mut ids = Vec::new();
    for n in 0..3 {
        let page = module_page::create(&pool, &module_id, theory(&format!("<p>{n}</p>")))
            .await
            .unwrap();
        ids.push(page.id);
    }

    // Reverse the order
    let updates = vec![
        ReorderEntry {
            page_id: ids[2].parse().unwrap(),
            order: 0,
        },
        ReorderEntry {
            page_id: ids[1].parse().unwrap(),
            order: 1,
        },
        ReorderEntry {
            page_id: ids[0].parse().unwrap(),
            order: 2,
        },
    ];
    let pages = module_page::reorder(&pool, &module_id, &updates).await.unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].id, ids[2]);
    assert_eq!(pages[1].id, ids[1]);
    assert_eq!(pages[2].id, ids[0]);
    assert!(pages.iter().all(|p| p.version == 2), "every touched page bumps");
    assert_eq!(
        pages.iter().map(|p| p.sort_order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn reorder_with_foreign_page_changes_nothing() {
    let (pool, _tmp) = setup().await;
    let module_a = make_module(&pool).await;
    let module_b = make_module(&pool).await;

    let a0 = module_page::create(&pool, &module_a, theory("<p>a0</p>")).await.unwrap();
    let _a1 = module_page::create(&pool, &module_a, theory("<p>a1</p>")).await.unwrap();
    let b0 = module_page::create(&pool, &module_b, theory("<p>b0</p>")).await.unwrap();

    let before = snapshot(&pool, &module_a).await;

    let updates = vec![
        ReorderEntry {
            page_id: b0.id.parse().unwrap(),
            order: 0,
        },
        ReorderEntry {
            page_id: a0.id.parse().unwrap(),
            order: 1,
        },
    ];
    let err = module_page::reorder(&pool, &module_a, &updates).await.unwrap_err();
    assert!(matches!(err, RepoError::InvalidReference(_)), "got: {err:?}");

    // All-or-nothing: no order or version moved
    assert_eq!(snapshot(&pool, &module_a).await, before);
    let b0_after = module_page::find_by_id(&pool, &b0.id).await.unwrap().unwrap();
    assert_eq!(b0_after.sort_order, 0);
    assert_eq!(b0_after.version, 1);
}

#[tokio::test]
async fn reorder_must_cover_every_page() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let p0 = module_page::create(&pool, &module_id, theory("<p>0</p>")).await.unwrap();
    let p1 = module_page::create(&pool, &module_id, theory("<p>1</p>")).await.unwrap();
    let _p2 = module_page::create(&pool, &module_id, theory("<p>2</p>")).await.unwrap();

    let updates = vec![
        ReorderEntry {
            page_id: p0.id.parse().unwrap(),
            order: 1,
        },
        ReorderEntry {
            page_id: p1.id.parse().unwrap(),
            order: 0,
        },
    ];
    let err = module_page::reorder(&pool, &module_id, &updates).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)), "got: {err:?}");
}

#[tokio::test]
async fn reorder_rejects_gapped_orders() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let p0 = module_page::create(&pool, &module_id, theory("<p>0</p>")).await.unwrap();
    let p1 = module_page::create(&pool, &module_id, theory("<p>1</p>")).await.unwrap();

    let updates = vec![
        ReorderEntry {
            page_id: p0.id.parse().unwrap(),
            order: 0,
        },
        ReorderEntry {
            page_id: p1.id.parse().unwrap(),
            order: 2,
        },
    ];
    let err = module_page::reorder(&pool, &module_id, &updates).await.unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)), "got: {err:?}");
}

#[tokio::test]
async fn reorder_on_missing_module_is_not_found() {
    let (pool, _tmp) = setup().await;
    let updates = vec![ReorderEntry {
        page_id: Uuid::new_v4(),
        order: 0,
    }];
    let err = module_page::reorder(&pool, &Uuid::new_v4().to_string(), &updates)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)), "got: {err:?}");
}

/// The end-to-end scenario: delete in the middle, append, then reorder.
#[tokio::test]
async fn delete_then_create_then_reorder_scenario() {
    let (pool, _tmp) = setup().await;
    let module_id = make_module(&pool).await;

    let p1 = module_page::create(&pool, &module_id, theory("<p>P1</p>")).await.unwrap();
    let p2 = module_page::create(&pool, &module_id, theory("<p>P2</p>")).await.unwrap();
    let p3 = module_page::create(&pool, &module_id, theory("<p>P3</p>")).await.unwrap();

    module_page::delete(&pool, &p2.id).await.unwrap();
    let after_delete = snapshot(&pool, &module_id).await;
    assert_eq!(after_delete[0], (p1.id.clone(), 0, 1));
    assert_eq!(after_delete[1], (p3.id.clone(), 1, 1));

    let new_page = module_page::create(&pool, &module_id, theory("<p>new</p>"))
        .await
        .unwrap();
    assert_eq!(new_page.sort_order, 2);

    let updates = vec![
        ReorderEntry {
            page_id: p3.id.parse().unwrap(),
            order: 0,
        },
        ReorderEntry {
            page_id: p1.id.parse().unwrap(),
            order: 1,
        },
        ReorderEntry {
            page_id: new_page.id.parse().unwrap(),
            order: 2,
        },
    ];
    let pages = module_page::reorder(&pool, &module_id, &updates).await.unwrap();

    assert_eq!(pages[0].id, p3.id);
    assert_eq!(pages[1].id, p1.id);
    assert_eq!(pages[2].id, new_page.id);
    // Each version incremented by exactly 1 from before the reorder call
    assert_eq!(pages[0].version, 2);
    assert_eq!(pages[1].version, 2);
    assert_eq!(pages[2].version, 2);
}
