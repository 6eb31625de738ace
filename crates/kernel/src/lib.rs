//! Core traits, layered settings, and the module registry.

pub mod module;
pub mod registry;
pub mod settings;

pub use bookshelf_db::{Db, Migration};
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
