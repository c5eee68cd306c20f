//! Module Page Model
//!
//! A page is either rich-text theory content or a code snippet with a
//! language tag. The pages of one module carry a contiguous 0-based order
//! maintained by the server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content kind of a module page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type), sqlx(rename_all = "UPPERCASE"))]
pub enum PageKind {
    Theory,
    Code,
}

/// Closed set of code-snippet languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type), sqlx(rename_all = "lowercase"))]
pub enum ProgrammingLanguage {
    Python,
    Javascript,
    Java,
    Csharp,
    Php,
    Go,
    Ruby,
    Swift,
    Kotlin,
    Rust,
    Sql,
    Html,
    Css,
}

/// Module page entity
///
/// `version` starts at 1 and increments by exactly 1 on every successful
/// update; callers must present the version they last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ModulePage {
    pub id: String,
    pub module_id: String,
    #[serde(rename = "order")]
    pub sort_order: i64,
    #[serde(rename = "type")]
    pub kind: PageKind,
    pub content: String,
    /// Present on CODE pages only; THEORY pages never persist one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<ProgrammingLanguage>,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Page body, discriminated on `type`.
///
/// The THEORY branch ignores any `language` field a caller sends along; the
/// CODE branch requires one from the closed enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum PageBody {
    Theory {
        content: String,
    },
    Code {
        content: String,
        language: ProgrammingLanguage,
    },
}

impl PageBody {
    pub fn kind(&self) -> PageKind {
        match self {
            PageBody::Theory { .. } => PageKind::Theory,
            PageBody::Code { .. } => PageKind::Code,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            PageBody::Theory { content } | PageBody::Code { content, .. } => content,
        }
    }
}

/// Create page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCreate {
    #[serde(flatten)]
    pub body: PageBody,
    /// Explicit position; appended after the last page when omitted
    #[serde(default, rename = "order", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// Update page payload — partial; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Ignored for THEORY pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<ProgrammingLanguage>,
    #[serde(default, rename = "order", skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// One entry of a batch reorder request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub page_id: Uuid,
    pub order: i64,
}

/// Batch reorder payload — must assign a full permutation of the module's pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReorder {
    pub updates: Vec<ReorderEntry>,
}

/// Page list response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageList {
    pub pages: Vec<ModulePage>,
}
