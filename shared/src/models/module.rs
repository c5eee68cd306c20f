//! Module Model

use serde::{Deserialize, Serialize};

/// Lifecycle status of a learning module.
///
/// Transitions are unconstrained: any status may be set by any update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type), sqlx(rename_all = "UPPERCASE"))]
pub enum ModuleStatus {
    Draft,
    Active,
    Archived,
}

/// Learning module entity — a top-level unit containing ordered content pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ModuleStatus,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create module payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCreate {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to DRAFT when omitted
    pub status: Option<ModuleStatus>,
}

/// Update module payload — absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModuleStatus>,
}
