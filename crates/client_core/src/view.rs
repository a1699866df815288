//! Composition of one annotation view: controller, navigation history and the
//! sync that ties them together.

use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{LifecyclePhase, ModelId, Route},
    protocol::SubmitInputs,
};

use crate::{
    annotation_client::AnnotationService,
    history::{InMemoryHistory, NavigationHistory},
    history_sync::HistorySync,
    lifecycle::{Lifecycle, LifecycleController, SubmitOutcome},
    model_selector::ModelSelector,
};

pub struct AnnotationView {
    controller: Arc<LifecycleController>,
    history: Arc<InMemoryHistory>,
    sync: HistorySync,
}

impl AnnotationView {
    pub async fn mount(
        service: Arc<dyn AnnotationService>,
        history: Arc<InMemoryHistory>,
        default_model: ModelId,
    ) -> Self {
        let shared_history: Arc<dyn NavigationHistory> = history.clone();
        let controller = Arc::new(LifecycleController::new(service, shared_history.clone()));
        let sync = HistorySync::mount(
            controller.clone(),
            shared_history,
            ModelSelector::new(default_model),
        )
        .await;
        Self {
            controller,
            history,
            sync,
        }
    }

    pub fn controller(&self) -> &Arc<LifecycleController> {
        &self.controller
    }

    pub fn history(&self) -> &Arc<InMemoryHistory> {
        &self.history
    }

    pub fn active_model(&self) -> Option<&ModelId> {
        self.sync.model()
    }

    pub async fn snapshot(&self) -> Lifecycle {
        self.controller.snapshot().await
    }

    /// The input form is disabled while a request is in flight.
    pub async fn input_enabled(&self) -> bool {
        self.controller.phase().await != LifecyclePhase::Working
    }

    pub async fn submit(&mut self, inputs: SubmitInputs) -> Result<SubmitOutcome> {
        let request = inputs.into_request()?;
        let outcome = self.controller.submit(request).await?;
        self.sync.sync_pending().await;
        Ok(outcome)
    }

    pub async fn navigate(&mut self, route: Route) {
        self.history.push_route(route).await;
        self.sync.sync_pending().await;
    }

    pub async fn back(&mut self) -> bool {
        let moved = self.history.back().await.is_some();
        self.sync.sync_pending().await;
        moved
    }

    pub async fn forward(&mut self) -> bool {
        let moved = self.history.forward().await.is_some();
        self.sync.sync_pending().await;
        moved
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
