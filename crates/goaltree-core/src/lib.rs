//! Goaltree Core (goaltree-core)
//!
//! Goal graph engine over a set of frontmatter documents:
//! 1. **Assembly**: resolve parent links and build the per-pass forest
//! 2. **Calculation**: rollups, hierarchy metrics and date metrics
//! 3. **Validation**: structural and data-quality issues
//! 4. **Writing**: merge derived fields back into property bags
//!
//! Nothing here touches storage; the host hands over documents and receives
//! updated bags.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use goaltree_core::prelude::*;
//!
//! let settings = GoalSettings::default();
//! let namespace = PathNamespace::new(documents.iter().map(|d| d.id.clone()));
//! let graph = GraphBuilder::new(&settings).build(&documents, &namespace);
//!
//! let writer = DerivedFieldWriter::new(&settings);
//! for id in plan_updates(&graph, &changed) {
//!     writer.update(&graph, &id, &mut bags[&id], today);
//! }
//! ```

#![warn(missing_docs)]

pub mod bag;
pub mod calc;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod link;
pub mod planner;
pub mod types;
pub mod validation;
pub mod writer;

// Re-exports
pub use bag::{DerivedField, DerivedValue, PropertyBag};
pub use config::{EnabledProperties, GoalSettings, ProgressMethod};
pub use error::{ConfigError, ConfigResult};
pub use graph::{Document, GoalGraph, GraphBuilder};
pub use types::{Category, EnergyType, GoalNode, NodeId, NodeType, TaskSize};

/// Commonly used types
pub mod prelude {
    pub use crate::bag::{DerivedField, DerivedValue, PropertyBag};
    pub use crate::calc::GoalStatus;
    pub use crate::config::{EnabledProperties, GoalSettings, ProgressMethod};
    pub use crate::error::{ConfigError, ConfigResult};
    pub use crate::extract::PropertyExtractor;
    pub use crate::graph::{Document, GoalGraph, GraphBuilder};
    pub use crate::link::{LinkNamespace, PathNamespace};
    pub use crate::planner::plan_updates;
    pub use crate::types::{Category, EnergyType, GoalNode, NodeId, NodeType, TaskSize};
    pub use crate::validation::{
        critical_issues, format_issues, summarize, validate_graph, IssueKind, IssueSummary,
        Severity, ValidationIssue,
    };
    pub use crate::writer::{DerivedFieldWriter, DerivedUpdate};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
