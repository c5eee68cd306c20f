//! Aula Client - HTTP client for the Aula server
//!
//! Provides network-based HTTP calls to the Aula API plus a local page cache
//! with the optimistic-mutation contract: snapshot before mutate, reconcile
//! on success, restore exactly on failure.

pub mod cache;
pub mod error;
pub mod http;

pub use cache::{PageSnapshot, PageStore};
pub use error::{ClientError, ClientResult};
pub use http::{ApiClient, PagesApi};

// Re-export shared types for convenience
pub use shared::client::{LoginRequest, LoginResponse, UserInfo};
pub use shared::models::{ModulePage, PageCreate, PageUpdate, ReorderEntry};
