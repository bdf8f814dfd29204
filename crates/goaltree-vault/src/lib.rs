//! Goaltree Vault (goaltree-vault)
//!
//! Runs the goal engine against a store of markdown notes:
//! - `frontmatter`: YAML frontmatter split, parse and render
//! - `store`: [`DocumentStore`] seam and the filesystem [`VaultStore`]
//! - `pass`: one processing pass and the validate command
//! - `controller`: debounce, in-flight guard and pending changes
//! - `host`: notices and the plugin lifecycle
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use goaltree_vault::prelude::*;
//!
//! let store = Arc::new(VaultStore::new("/path/to/vault"));
//! let plugin = VaultPlugin::new(store, GoalSettings::default(), Arc::new(LogNotifier));
//! plugin.start().await?;
//!
//! plugin.controller().on_changed(NodeId::new("Goals/Launch.md"));
//! ```

#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod frontmatter;
pub mod host;
pub mod pass;
pub mod store;

// Re-exports
pub use controller::{PassController, DEFAULT_DEBOUNCE};
pub use error::{FrontmatterError, PassError, PassResult, StoreError, StoreResult};
pub use host::{GoalPlugin, LogNotifier, Notifier, VaultPlugin};
pub use pass::{PassReport, PassRunner, ValidationReport};
pub use store::{DocumentRef, DocumentStore, PropertyTransform, VaultStore};

/// Commonly used types
pub mod prelude {
    pub use crate::controller::PassController;
    pub use crate::error::{PassError, StoreError};
    pub use crate::host::{GoalPlugin, LogNotifier, Notifier, VaultPlugin};
    pub use crate::pass::{PassReport, PassRunner, ValidationReport};
    pub use crate::store::{DocumentRef, DocumentStore, VaultStore};
    pub use goaltree_core::{GoalSettings, NodeId, PropertyBag};
    pub use std::sync::Arc;
}
