//! Host integration
//!
//! - [`Notifier`]: transient user-facing notices
//! - [`GoalPlugin`]: lifecycle the host drives (start, stop, configuration)
//! - [`VaultPlugin`]: the plugin over a [`DocumentStore`]

use crate::controller::PassController;
use crate::error::PassResult;
use crate::pass::{PassReport, PassRunner, ValidationReport};
use crate::store::DocumentStore;
use async_trait::async_trait;
use goaltree_core::{ConfigResult, GoalSettings};
use std::sync::Arc;
use std::time::Duration;

/// Sink for short-lived notices shown to the user
pub trait Notifier: Send + Sync {
    /// Show `message` for roughly `duration`
    fn notify(&self, message: &str, duration: Duration);
}

/// Notifier that writes notices to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, duration: Duration) {
        tracing::info!(duration_ms = duration.as_millis(), "{}", message);
    }
}

/// Lifecycle of the goal plugin inside its host
#[async_trait]
pub trait GoalPlugin: Send + Sync {
    /// Initial full pass once the host is ready
    async fn start(&self) -> PassResult<Option<PassReport>>;

    /// Cancel pending work; an in-flight pass still runs to completion
    async fn stop(&self);

    /// Effective configuration as TOML
    fn render_configuration(&self) -> ConfigResult<String>;
}

/// Goal plugin over a document store
pub struct VaultPlugin<S: DocumentStore + ?Sized + 'static> {
    controller: PassController<S>,
}

impl<S: DocumentStore + ?Sized + 'static> VaultPlugin<S> {
    /// Plugin with the default debounce
    #[must_use]
    pub fn new(store: Arc<S>, settings: GoalSettings, notifier: Arc<dyn Notifier>) -> Self {
        let runner = Arc::new(PassRunner::new(store, settings, notifier));
        Self {
            controller: PassController::new(runner),
        }
    }

    /// Plugin over an existing controller
    #[must_use]
    pub fn with_controller(controller: PassController<S>) -> Self {
        Self { controller }
    }

    /// Event and scheduling handle
    #[inline]
    #[must_use]
    pub fn controller(&self) -> &PassController<S> {
        &self.controller
    }

    /// "Recalculate all goals": full pass now, unless one is running
    pub async fn recalculate(&self) -> PassResult<Option<PassReport>> {
        self.controller.clear_pending();
        self.controller.process().await
    }

    /// "Validate goal hierarchy"
    pub async fn validate(&self) -> PassResult<ValidationReport> {
        self.controller.runner().validate().await
    }

    /// Replace the settings used by later passes
    pub fn update_settings(&self, settings: GoalSettings) {
        self.controller.runner().set_settings(settings);
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized + 'static> GoalPlugin for VaultPlugin<S> {
    async fn start(&self) -> PassResult<Option<PassReport>> {
        tracing::info!("Goal plugin starting");
        self.recalculate().await
    }

    async fn stop(&self) {
        self.controller.cancel();
        tracing::info!("Goal plugin stopped");
    }

    fn render_configuration(&self) -> ConfigResult<String> {
        self.controller.runner().settings().to_toml_string()
    }
}
