use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use shared::{
    domain::{ModelId, Route},
    protocol::{AnnotationRequest, AnnotationResponse, ModelCatalog},
};
use tokio::sync::{Mutex, Notify, Semaphore};

use crate::{
    annotation_client::{AnnotationError, AnnotationService},
    history::InMemoryHistory,
    lifecycle::LifecycleController,
};

pub(crate) const PIERRE: &str = "Pierre Vinken died aged 81; immortalised aged 61.";

pub(crate) enum Reply {
    Tree(Value),
    Fail(String),
}

/// Annotation service double answering from a script. With a gate, every call
/// parks until the test releases a permit.
pub(crate) struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<AnnotationRequest>>,
    gate: Option<Arc<Semaphore>>,
    started: Notify,
}

impl ScriptedService {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            started: Notify::new(),
        }
    }

    pub(crate) fn gated(replies: impl IntoIterator<Item = Reply>) -> Self {
        let mut service = Self::new(replies);
        service.gate = Some(Arc::new(Semaphore::new(0)));
        service
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub(crate) async fn calls(&self) -> Vec<AnnotationRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AnnotationService for ScriptedService {
    async fn annotate(
        &self,
        request: &AnnotationRequest,
    ) -> Result<AnnotationResponse, AnnotationError> {
        self.calls.lock().await.push(request.clone());
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        match self.replies.lock().await.pop_front() {
            Some(Reply::Tree(tree)) => Ok(AnnotationResponse::new(tree)),
            Some(Reply::Fail(body)) => Err(AnnotationError::Status {
                status: StatusCode::BAD_GATEWAY,
                body,
            }),
            None => Err(AnnotationError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "no scripted reply".into(),
            }),
        }
    }

    async fn models(&self) -> Result<ModelCatalog, AnnotationError> {
        Ok(ModelCatalog::from([(
            en(),
            "English - en_core_web_sm (v2.0.0)".to_string(),
        )]))
    }
}

pub(crate) fn en() -> ModelId {
    ModelId::new("en_core_web_sm")
}

pub(crate) fn de() -> ModelId {
    ModelId::new("de_core_news_sm")
}

pub(crate) fn tree(word: &str) -> Value {
    json!({
        "text": word,
        "root": {
            "word": word,
            "nodeType": "ROOT",
            "attributes": ["VERB"],
            "link": "ROOT",
            "spans": [{"start": 0, "end": word.len()}],
        },
    })
}

pub(crate) fn request(text: &str) -> AnnotationRequest {
    AnnotationRequest::new(text, en())
}

pub(crate) fn fixture(
    service: ScriptedService,
) -> (
    Arc<ScriptedService>,
    Arc<InMemoryHistory>,
    Arc<LifecycleController>,
) {
    let service = Arc::new(service);
    let history = Arc::new(InMemoryHistory::new(Route::for_model(&en())));
    let controller = Arc::new(LifecycleController::new(
        service.clone(),
        history.clone(),
    ));
    (service, history, controller)
}
