//! Engine configuration
//!
//! [`GoalSettings`] maps every user-authored field to its frontmatter key,
//! names the prefix that marks derived fields, selects the rollup method and
//! toggles each derived-field family. It is read from TOML; every key is
//! optional and falls back to the defaults below.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How internal nodes aggregate their children's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMethod {
    /// Priority-weighted average (priority 1 weighs most)
    #[default]
    Weighted,
    /// Plain average
    Simple,
}

/// Independently toggleable derived-field families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EnabledProperties {
    /// Root goal link and its priority
    pub root_goal: bool,
    /// Summed priority along the parent chain
    pub chain_priority: bool,
    /// Distance from the root
    pub depth: bool,
    /// Node type and leaf flag
    pub node_type: bool,
    /// Descendant, leaf and child counts plus child links
    pub hierarchy_metrics: bool,
    /// Blocked descendants
    pub blocked_tracking: bool,
    /// Urgent descendants and time estimates
    pub workflow_tracking: bool,
    /// Status label
    pub status: bool,
    /// Days remaining, overdue flag and completion date
    pub time_metrics: bool,
}

impl Default for EnabledProperties {
    fn default() -> Self {
        Self {
            root_goal: true,
            chain_priority: true,
            depth: true,
            node_type: true,
            hierarchy_metrics: true,
            blocked_tracking: true,
            workflow_tracking: true,
            status: true,
            time_metrics: true,
        }
    }
}

impl EnabledProperties {
    /// Every family disabled
    #[must_use]
    pub fn none() -> Self {
        Self {
            root_goal: false,
            chain_priority: false,
            depth: false,
            node_type: false,
            hierarchy_metrics: false,
            blocked_tracking: false,
            workflow_tracking: false,
            status: false,
            time_metrics: false,
        }
    }
}

/// Goal engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalSettings {
    /// Folder holding goal documents; empty means the whole vault
    pub goals_folder: String,
    /// Key linking a document to its parent goal
    pub goal_property: String,
    /// Key holding progress
    pub progress_property: String,
    /// Key holding priority
    pub priority_property: String,
    /// Key holding the target date
    pub expected_acquire_date_property: String,
    /// Key holding the blocked flag
    pub blocked_property: String,
    /// Key holding the urgent flag
    pub urgent_property: String,
    /// Key holding the explicit node type
    pub node_type_property: String,
    /// Key holding the workflow category
    pub category_property: String,
    /// Key holding the task size
    pub size_property: String,
    /// Key holding the energy type
    pub energy_type_property: String,
    /// Key holding the assignee
    pub assignee_property: String,
    /// Prefix marking derived keys
    pub computed_property_prefix: String,
    /// Rollup method for internal nodes
    pub progress_calculation_method: ProgressMethod,
    /// Derived-field families to write
    pub enabled_properties: EnabledProperties,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            goals_folder: "Goals".to_string(),
            goal_property: "goal".to_string(),
            progress_property: "progress".to_string(),
            priority_property: "priority".to_string(),
            expected_acquire_date_property: "expectedAcquireDate".to_string(),
            blocked_property: "blocked".to_string(),
            urgent_property: "urgent".to_string(),
            node_type_property: "nodeType".to_string(),
            category_property: "category".to_string(),
            size_property: "size".to_string(),
            energy_type_property: "energyType".to_string(),
            assignee_property: "assignee".to_string(),
            computed_property_prefix: "_".to_string(),
            progress_calculation_method: ProgressMethod::Weighted,
            enabled_properties: EnabledProperties::default(),
        }
    }
}

impl GoalSettings {
    /// Create default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With goals folder
    #[inline]
    #[must_use]
    pub fn with_goals_folder(mut self, folder: impl Into<String>) -> Self {
        self.goals_folder = folder.into();
        self
    }

    /// With derived-field prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.computed_property_prefix = prefix.into();
        self
    }

    /// With rollup method
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: ProgressMethod) -> Self {
        self.progress_calculation_method = method;
        self
    }

    /// With derived-field families
    #[inline]
    #[must_use]
    pub fn with_enabled(mut self, enabled: EnabledProperties) -> Self {
        self.enabled_properties = enabled;
        self
    }

    /// Parse settings from TOML text and check them
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let settings = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Render settings as TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject mappings the engine cannot work with
    ///
    /// User keys must be non-empty and must not start with the derived
    /// prefix, otherwise recomputation would read its own output.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.computed_property_prefix.is_empty() {
            return Err(ConfigError::invalid(
                "computed_property_prefix",
                "must not be empty",
            ));
        }

        for (field, key) in self.user_keys() {
            if key.is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
            if key.starts_with(&self.computed_property_prefix) {
                return Err(ConfigError::invalid(
                    field,
                    format!(
                        "'{key}' starts with the derived prefix '{}'",
                        self.computed_property_prefix
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Whether a key holds a derived value
    #[inline]
    #[must_use]
    pub fn is_derived_key(&self, key: &str) -> bool {
        key.starts_with(&self.computed_property_prefix)
    }

    /// Full derived key for a bare field name (`depth` → `_depth`)
    #[inline]
    #[must_use]
    pub fn derived_key(&self, name: &str) -> String {
        format!("{}{}", self.computed_property_prefix, name)
    }

    fn user_keys(&self) -> [(&'static str, &str); 11] {
        [
            ("goal_property", &self.goal_property),
            ("progress_property", &self.progress_property),
            ("priority_property", &self.priority_property),
            (
                "expected_acquire_date_property",
                &self.expected_acquire_date_property,
            ),
            ("blocked_property", &self.blocked_property),
            ("urgent_property", &self.urgent_property),
            ("node_type_property", &self.node_type_property),
            ("category_property", &self.category_property),
            ("size_property", &self.size_property),
            ("energy_type_property", &self.energy_type_property),
            ("assignee_property", &self.assignee_property),
        ]
    }
}
