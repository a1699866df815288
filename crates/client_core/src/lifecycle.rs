//! Request/response lifecycle of a single annotation view.
//!
//! ```text
//! empty|received|error --submit--> working --ok--> received
//!                                          \--err--> error
//! any --reset--> empty          any --restore--> received
//! ```

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use shared::{
    domain::{EntryId, LifecyclePhase},
    protocol::{AnnotationRequest, AnnotationResponse, HistoryPayload},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{annotation_client::AnnotationService, history::NavigationHistory};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Lifecycle {
    #[default]
    Empty,
    Working {
        request: AnnotationRequest,
    },
    Received {
        request: AnnotationRequest,
        response: AnnotationResponse,
    },
    Error {
        request: AnnotationRequest,
        message: String,
    },
}

impl Lifecycle {
    pub fn phase(&self) -> LifecyclePhase {
        match self {
            Self::Empty => LifecyclePhase::Empty,
            Self::Working { .. } => LifecyclePhase::Working,
            Self::Received { .. } => LifecyclePhase::Received,
            Self::Error { .. } => LifecyclePhase::Error,
        }
    }

    pub fn request(&self) -> Option<&AnnotationRequest> {
        match self {
            Self::Empty => None,
            Self::Working { request }
            | Self::Received { request, .. }
            | Self::Error { request, .. } => Some(request),
        }
    }

    pub fn response(&self) -> Option<&AnnotationResponse> {
        match self {
            Self::Received { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Parse tree handed to the renderer; absent unless a response is held.
    pub fn tree(&self) -> Option<&Value> {
        self.response().map(|response| &response.tree)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Received { history_index: usize },
    Failed,
    /// A call was already in flight; nothing was sent.
    Ignored,
    /// The view was reset or restored while the call was in flight.
    Stale,
}

#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    StateChanged(Lifecycle),
    RequestFailed {
        request: AnnotationRequest,
        message: String,
    },
}

#[derive(Default)]
struct ControllerInner {
    state: Lifecycle,
    next_ticket: u64,
    in_flight: Option<u64>,
    last_commit: Option<EntryId>,
}

pub struct LifecycleController {
    service: Arc<dyn AnnotationService>,
    history: Arc<dyn NavigationHistory>,
    inner: Mutex<ControllerInner>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleController {
    pub fn new(service: Arc<dyn AnnotationService>, history: Arc<dyn NavigationHistory>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            service,
            history,
            inner: Mutex::new(ControllerInner::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Lifecycle {
        self.inner.lock().await.state.clone()
    }

    pub async fn phase(&self) -> LifecyclePhase {
        self.inner.lock().await.state.phase()
    }

    /// Sends `request` to the annotation service unless a call is already in
    /// flight. The `working` transition is visible before the call resolves.
    pub async fn submit(&self, request: AnnotationRequest) -> Result<SubmitOutcome> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            if let Lifecycle::Working { request: pending } = &inner.state {
                debug!(
                    pending_model = %pending.model,
                    ignored_model = %request.model,
                    "submit ignored while a request is in flight"
                );
                return Ok(SubmitOutcome::Ignored);
            }
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.in_flight = Some(ticket);
            self.transition(
                &mut inner,
                Lifecycle::Working {
                    request: request.clone(),
                },
            );
            ticket
        };

        info!(
            model = %request.model,
            collapse_phrases = request.collapse_phrases,
            chars = request.text.chars().count(),
            "requesting annotations"
        );
        let result = self.service.annotate(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.in_flight != Some(ticket) {
            debug!(ticket, ok = result.is_ok(), "discarding stale annotation result");
            return Ok(SubmitOutcome::Stale);
        }
        inner.in_flight = None;

        match result {
            Ok(response) => {
                let payload = HistoryPayload::new(request.clone(), response.clone());
                let committed = match self.history.push_state(payload).await {
                    Ok(committed) => committed,
                    Err(err) => {
                        let err =
                            err.context("failed to commit annotation to navigation history");
                        self.fail(&mut inner, request, format!("{err:#}"));
                        return Err(err);
                    }
                };
                inner.last_commit = Some(committed.id);
                self.transition(&mut inner, Lifecycle::Received { request, response });
                info!(history_index = committed.index, "annotation received");
                Ok(SubmitOutcome::Received {
                    history_index: committed.index,
                })
            }
            Err(err) => {
                let message = err.to_string();
                warn!(model = %request.model, error = %message, "annotation request failed");
                self.fail(&mut inner, request, message);
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    /// Whether `id` is the entry this controller appended for its latest
    /// successful submit.
    pub async fn is_own_commit(&self, id: EntryId) -> bool {
        self.inner.lock().await.last_commit == Some(id)
    }

    /// Drops held request and response and disowns any in-flight call.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if inner.in_flight.take().is_some() {
            debug!("reset abandons in-flight annotation request");
        }
        if inner.state != Lifecycle::Empty {
            self.transition(&mut inner, Lifecycle::Empty);
        }
    }

    /// Adopts a pair replayed from navigation history without calling the
    /// service. Returns `false` when that pair is already held.
    pub async fn restore(&self, request: AnnotationRequest, response: AnnotationResponse) -> bool {
        let mut inner = self.inner.lock().await;
        if let Lifecycle::Received {
            request: held_request,
            response: held_response,
        } = &inner.state
        {
            if *held_request == request && *held_response == response {
                return false;
            }
        }
        inner.in_flight = None;
        self.transition(&mut inner, Lifecycle::Received { request, response });
        true
    }

    fn fail(&self, inner: &mut ControllerInner, request: AnnotationRequest, message: String) {
        self.transition(
            inner,
            Lifecycle::Error {
                request: request.clone(),
                message: message.clone(),
            },
        );
        let _ = self
            .events
            .send(LifecycleEvent::RequestFailed { request, message });
    }

    fn transition(&self, inner: &mut ControllerInner, next: Lifecycle) {
        debug!(from = %inner.state.phase(), to = %next.phase(), "lifecycle transition");
        inner.state = next;
        let _ = self
            .events
            .send(LifecycleEvent::StateChanged(inner.state.clone()));
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
