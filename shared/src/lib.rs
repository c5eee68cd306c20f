//! Shared types for the Aula learning platform
//!
//! Common types used by both the server and the client crate: entity
//! models, request/response payloads and small utilities.

pub mod client;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
