//! Local page cache with the optimistic-mutation contract
//!
//! Every mutating call follows the same protocol:
//!
//! 1. take a snapshot of the cached list and apply the expected outcome
//!    locally (latency hiding, not a correctness mechanism),
//! 2. issue the request,
//! 3. on success reconcile with the authoritative server response and mark
//!    the cache stale so the next read refetches,
//! 4. on failure restore the pre-mutation snapshot exactly and surface the
//!    error kind — version conflicts stay distinguishable from generic
//!    failures.

use uuid::Uuid;

use shared::models::{ModulePage, PageBody, PageCreate, PageKind, PageUpdate, ReorderEntry};

use crate::error::{ClientError, ClientResult};
use crate::http::PagesApi;

/// Immutable snapshot of the cached page list
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pages: Vec<ModulePage>,
}

/// Cached page list of one module
#[derive(Debug)]
pub struct PageStore {
    module_id: String,
    pages: Vec<ModulePage>,
    stale: bool,
}

impl PageStore {
    pub fn new(module_id: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            pages: Vec::new(),
            stale: true,
        }
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    /// Cached pages, ordered by `order`
    pub fn pages(&self) -> &[ModulePage] {
        &self.pages
    }

    /// Whether the cache should be refetched before trusting reads
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Capture the current cached list
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            pages: self.pages.clone(),
        }
    }

    /// Restore a previously captured snapshot exactly
    pub fn restore(&mut self, snapshot: PageSnapshot) {
        self.pages = snapshot.pages;
    }

    /// Replace the cache with the server's authoritative list
    pub async fn refresh(&mut self, api: &dyn PagesApi) -> ClientResult<()> {
        let mut pages = api.list_pages(&self.module_id).await?;
        pages.sort_by_key(|p| p.sort_order);
        self.pages = pages;
        self.stale = false;
        Ok(())
    }

    /// Create a page: optimistic append, then reconcile with the created row
    pub async fn create_page(
        &mut self,
        api: &dyn PagesApi,
        payload: PageCreate,
    ) -> ClientResult<ModulePage> {
        let snapshot = self.snapshot();

        let placeholder_id = format!("optimistic-{}", Uuid::new_v4());
        self.pages.push(local_page(
            &placeholder_id,
            &self.module_id,
            &payload,
            self.next_order(&payload),
        ));

        match api.create_page(&self.module_id, &payload).await {
            Ok(created) => {
                if let Some(slot) = self.pages.iter_mut().find(|p| p.id == placeholder_id) {
                    *slot = created.clone();
                }
                self.pages.sort_by_key(|p| p.sort_order);
                self.stale = true;
                Ok(created)
            }
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Update a page; the cached version is the one the user last observed
    pub async fn update_page(
        &mut self,
        api: &dyn PagesApi,
        page_id: &str,
        payload: PageUpdate,
    ) -> ClientResult<ModulePage> {
        let expected_version = self
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .map(|p| p.version)
            .ok_or_else(|| ClientError::NotFound(format!("Page {page_id} is not cached")))?;

        let snapshot = self.snapshot();
        self.apply_update_locally(page_id, &payload);

        match api
            .update_page(&self.module_id, page_id, &payload, expected_version)
            .await
        {
            Ok(updated) => {
                if let Some(slot) = self.pages.iter_mut().find(|p| p.id == page_id) {
                    *slot = updated.clone();
                }
                self.pages.sort_by_key(|p| p.sort_order);
                self.stale = true;
                Ok(updated)
            }
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Delete a page: optimistic removal plus local reindex of the gap
    pub async fn delete_page(
        &mut self,
        api: &dyn PagesApi,
        page_id: &str,
    ) -> ClientResult<ModulePage> {
        let snapshot = self.snapshot();

        if let Some(pos) = self.pages.iter().position(|p| p.id == page_id) {
            let removed_order = self.pages[pos].sort_order;
            self.pages.remove(pos);
            for page in &mut self.pages {
                if page.sort_order > removed_order {
                    page.sort_order -= 1;
                }
            }
        }

        match api.delete_page(&self.module_id, page_id).await {
            Ok(deleted) => {
                self.stale = true;
                Ok(deleted)
            }
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Reorder pages: apply the permutation locally, then reconcile
    pub async fn reorder_pages(
        &mut self,
        api: &dyn PagesApi,
        updates: Vec<ReorderEntry>,
    ) -> ClientResult<Vec<ModulePage>> {
        let snapshot = self.snapshot();

        for entry in &updates {
            let id = entry.page_id.to_string();
            if let Some(page) = self.pages.iter_mut().find(|p| p.id == id) {
                page.sort_order = entry.order;
            }
        }
        self.pages.sort_by_key(|p| p.sort_order);

        match api.reorder_pages(&self.module_id, &updates).await {
            Ok(mut pages) => {
                pages.sort_by_key(|p| p.sort_order);
                self.pages = pages.clone();
                self.stale = true;
                Ok(pages)
            }
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    fn next_order(&self, payload: &PageCreate) -> i64 {
        payload.sort_order.unwrap_or_else(|| {
            self.pages
                .iter()
                .map(|p| p.sort_order)
                .max()
                .map_or(0, |max| max + 1)
        })
    }

    fn apply_update_locally(&mut self, page_id: &str, payload: &PageUpdate) {
        if let Some(page) = self.pages.iter_mut().find(|p| p.id == page_id) {
            if let Some(content) = &payload.content {
                page.content = content.clone();
            }
            if page.kind == PageKind::Code
                && let Some(language) = payload.language
            {
                page.language = Some(language);
            }
            if let Some(order) = payload.sort_order {
                page.sort_order = order;
            }
        }
        self.pages.sort_by_key(|p| p.sort_order);
    }
}

/// Placeholder page shown until the server confirms the create
fn local_page(id: &str, module_id: &str, payload: &PageCreate, order: i64) -> ModulePage {
    let (kind, content, language) = match &payload.body {
        PageBody::Theory { content } => (PageKind::Theory, content.clone(), None),
        PageBody::Code { content, language } => (PageKind::Code, content.clone(), Some(*language)),
    };
    ModulePage {
        id: id.to_string(),
        module_id: module_id.to_string(),
        sort_order: order,
        kind,
        content,
        language,
        // version 0 marks a page the server has not confirmed yet
        version: 0,
        created_at: 0,
        updated_at: 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    const MODULE: &str = "0b24b1a6-7cf0-4f2d-9a3e-111111111111";

    fn page(id: &str, order: i64, version: i64) -> ModulePage {
        ModulePage {
            id: id.to_string(),
            module_id: MODULE.to_string(),
            sort_order: order,
            kind: PageKind::Theory,
            content: format!("<p>{id}</p>"),
            language: None,
            version,
            created_at: 1,
            updated_at: 1,
        }
    }

    /// In-memory server emulation backing the reconcile paths
    struct InMemoryApi {
        pages: Mutex<Vec<ModulePage>>,
    }

    impl InMemoryApi {
        fn with_pages(pages: Vec<ModulePage>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    #[async_trait]
    impl PagesApi for InMemoryApi {
        async fn list_pages(&self, _module_id: &str) -> ClientResult<Vec<ModulePage>> {
            Ok(self.pages.lock().unwrap().clone())
        }

        async fn create_page(
            &self,
            module_id: &str,
            payload: &PageCreate,
        ) -> ClientResult<ModulePage> {
            let mut pages = self.pages.lock().unwrap();
            let order = payload
                .sort_order
                .unwrap_or_else(|| pages.iter().map(|p| p.sort_order).max().map_or(0, |m| m + 1));
            let created = ModulePage {
                id: Uuid::new_v4().to_string(),
                module_id: module_id.to_string(),
                sort_order: order,
                kind: payload.body.kind(),
                content: payload.body.content().to_string(),
                language: match &payload.body {
                    PageBody::Code { language, .. } => Some(*language),
                    PageBody::Theory { .. } => None,
                },
                version: 1,
                created_at: 2,
                updated_at: 2,
            };
            pages.push(created.clone());
            Ok(created)
        }

        async fn update_page(
            &self,
            _module_id: &str,
            page_id: &str,
            payload: &PageUpdate,
            expected_version: i64,
        ) -> ClientResult<ModulePage> {
            let mut pages = self.pages.lock().unwrap();
            let page = pages
                .iter_mut()
                .find(|p| p.id == page_id)
                .ok_or_else(|| ClientError::NotFound(page_id.to_string()))?;
            if page.version != expected_version {
                return Err(ClientError::VersionConflict(format!(
                    "expected {expected_version}, stored {}",
                    page.version
                )));
            }
            if let Some(content) = &payload.content {
                page.content = content.clone();
            }
            if let Some(order) = payload.sort_order {
                page.sort_order = order;
            }
            page.version += 1;
            Ok(page.clone())
        }

        async fn delete_page(&self, _module_id: &str, page_id: &str) -> ClientResult<ModulePage> {
            let mut pages = self.pages.lock().unwrap();
            let pos = pages
                .iter()
                .position(|p| p.id == page_id)
                .ok_or_else(|| ClientError::NotFound(page_id.to_string()))?;
            let removed = pages.remove(pos);
            for page in pages.iter_mut() {
                if page.sort_order > removed.sort_order {
                    page.sort_order -= 1;
                }
            }
            Ok(removed)
        }

        async fn reorder_pages(
            &self,
            _module_id: &str,
            updates: &[ReorderEntry],
        ) -> ClientResult<Vec<ModulePage>> {
            let mut pages = self.pages.lock().unwrap();
            for entry in updates {
                let id = entry.page_id.to_string();
                let page = pages
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or_else(|| ClientError::NotFound(id.clone()))?;
                page.sort_order = entry.order;
                page.version += 1;
            }
            let mut result = pages.clone();
            result.sort_by_key(|p| p.sort_order);
            Ok(result)
        }
    }

    /// Transport that rejects every call
    struct FailingApi;

    #[async_trait]
    impl PagesApi for FailingApi {
        async fn list_pages(&self, _module_id: &str) -> ClientResult<Vec<ModulePage>> {
            Err(ClientError::Api {
                status: 500,
                code: "E9002".into(),
                message: "boom".into(),
            })
        }

        async fn create_page(
            &self,
            _module_id: &str,
            _payload: &PageCreate,
        ) -> ClientResult<ModulePage> {
            Err(ClientError::Api {
                status: 500,
                code: "E9002".into(),
                message: "boom".into(),
            })
        }

        async fn update_page(
            &self,
            _module_id: &str,
            _page_id: &str,
            _payload: &PageUpdate,
            _expected_version: i64,
        ) -> ClientResult<ModulePage> {
            Err(ClientError::VersionConflict("stale".into()))
        }

        async fn delete_page(&self, _module_id: &str, _page_id: &str) -> ClientResult<ModulePage> {
            Err(ClientError::Api {
                status: 500,
                code: "E9002".into(),
                message: "boom".into(),
            })
        }

        async fn reorder_pages(
            &self,
            _module_id: &str,
            _updates: &[ReorderEntry],
        ) -> ClientResult<Vec<ModulePage>> {
            Err(ClientError::Api {
                status: 500,
                code: "E9002".into(),
                message: "boom".into(),
            })
        }
    }

    fn seeded_store() -> PageStore {
        let mut store = PageStore::new(MODULE);
        store.pages = vec![page("p0", 0, 1), page("p1", 1, 1), page("p2", 2, 1)];
        store.stale = false;
        store
    }

    #[tokio::test]
    async fn create_reconciles_with_server_response() {
        let api = InMemoryApi::with_pages(vec![]);
        let mut store = PageStore::new(MODULE);
        store.stale = false;

        let created = store
            .create_page(
                &api,
                PageCreate {
                    body: PageBody::Theory {
                        content: "<p>hello</p>".into(),
                    },
                    sort_order: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.pages().len(), 1);
        // The placeholder is replaced by the authoritative row
        assert_eq!(store.pages()[0].id, created.id);
        assert_eq!(store.pages()[0].version, 1);
        assert!(store.is_stale(), "cache is marked for refetch");
    }

    #[tokio::test]
    async fn update_success_reconciles() {
        let api = InMemoryApi::with_pages(vec![page("p0", 0, 1)]);
        let mut store = seeded_store();
        store.pages = vec![page("p0", 0, 1)];

        let updated = store
            .update_page(
                &api,
                "p0",
                PageUpdate {
                    content: Some("<p>edited</p>".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(store.pages()[0].version, 2);
        assert_eq!(store.pages()[0].content, "<p>edited</p>");
    }

    #[tokio::test]
    async fn update_conflict_restores_snapshot_exactly() {
        // Server already moved the page to version 2; the cache still holds 1
        let mut server_page = page("p1", 1, 2);
        server_page.content = "<p>newer</p>".into();
        let api = InMemoryApi::with_pages(vec![page("p0", 0, 1), server_page]);

        let mut store = seeded_store();
        let before = store.snapshot();

        let err = store
            .update_page(
                &api,
                "p1",
                PageUpdate {
                    content: Some("<p>clobber</p>".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_version_conflict(), "got: {err:?}");
        assert_eq!(store.snapshot(), before, "cache restored byte-for-byte");
        assert!(!store.is_stale());
    }

    #[tokio::test]
    async fn delete_applies_local_reindex_and_reconciles() {
        let api = InMemoryApi::with_pages(vec![
            page("p0", 0, 1),
            page("p1", 1, 1),
            page("p2", 2, 1),
        ]);
        let mut store = seeded_store();

        let deleted = store.delete_page(&api, "p1").await.unwrap();
        assert_eq!(deleted.id, "p1");

        let orders: Vec<(String, i64)> = store
            .pages()
            .iter()
            .map(|p| (p.id.clone(), p.sort_order))
            .collect();
        assert_eq!(orders, vec![("p0".into(), 0), ("p2".into(), 1)]);
        assert!(store.is_stale());
    }

    #[tokio::test]
    async fn failed_mutation_rolls_back() {
        let mut store = seeded_store();
        let before = store.snapshot();

        let err = store
            .reorder_pages(
                &FailingApi,
                vec![
                    ReorderEntry {
                        page_id: Uuid::new_v4(),
                        order: 0,
                    },
                ],
            )
            .await
            .unwrap_err();

        assert!(!err.is_version_conflict());
        assert_eq!(store.snapshot(), before);

        let err = store
            .delete_page(&FailingApi, "p0")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn reorder_success_adopts_server_list() {
        let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();
        let server_pages = vec![
            page(&ids[0], 0, 1),
            page(&ids[1], 1, 1),
            page(&ids[2], 2, 1),
        ];
        let api = InMemoryApi::with_pages(server_pages.clone());
        let mut store = PageStore::new(MODULE);
        store.pages = server_pages;
        store.stale = false;

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

        let pages = store.reorder_pages(&api, updates).await.unwrap();
        assert_eq!(pages[0].id, ids[2]);
        assert_eq!(pages[1].id, ids[1]);
        assert_eq!(pages[2].id, ids[0]);
        assert!(pages.iter().all(|p| p.version == 2));
        assert_eq!(store.pages()[0].id, ids[2]);
        assert!(store.is_stale());
    }
}
