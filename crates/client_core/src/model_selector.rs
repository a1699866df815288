use shared::domain::{ModelId, Route};
use tracing::info;

use crate::lifecycle::LifecycleController;

/// Tracks the model named by the current route. Any change of model, including
/// the first route seen, empties the lifecycle.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    default_model: ModelId,
    current: Option<ModelId>,
}

impl ModelSelector {
    pub fn new(default_model: ModelId) -> Self {
        Self {
            default_model,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ModelId> {
        self.current.as_ref()
    }

    pub fn resolve(&self, route: &Route) -> ModelId {
        route.model().unwrap_or_else(|| self.default_model.clone())
    }

    /// Returns `true` when the route selected a different model and the
    /// controller was reset.
    pub async fn observe(&mut self, route: &Route, controller: &LifecycleController) -> bool {
        let model = self.resolve(route);
        if self.current.as_ref() == Some(&model) {
            return false;
        }
        info!(
            from = self.current.as_ref().map(ModelId::as_str).unwrap_or("-"),
            to = %model,
            "model selection changed"
        );
        self.current = Some(model);
        controller.reset().await;
        true
    }
}
