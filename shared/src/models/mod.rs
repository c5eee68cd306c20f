//! Data models shared between server and client

pub mod module;
pub mod module_page;
pub mod user;

// Re-exports
pub use module::{Module, ModuleCreate, ModuleStatus, ModuleUpdate};
pub use module_page::{
    ModulePage, PageBody, PageCreate, PageKind, PageList, PageReorder, PageUpdate,
    ProgrammingLanguage, ReorderEntry,
};
pub use user::{User, UserCreate, UserRole, UserUpdate};
