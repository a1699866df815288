//! Client core of the parse-tree viewer: annotation service client, request
//! lifecycle, and navigation-history replay.

pub mod annotation_client;
pub mod history;
pub mod history_sync;
pub mod lifecycle;
pub mod model_selector;
pub mod view;

pub use annotation_client::{AnnotationClient, AnnotationError, AnnotationService};
pub use history::{
    CommittedEntry, HistoryChange, InMemoryHistory, NavigationAction, NavigationHistory,
};
pub use history_sync::{HistorySync, SyncOutcome};
pub use lifecycle::{Lifecycle, LifecycleController, LifecycleEvent, SubmitOutcome};
pub use model_selector::ModelSelector;
pub use view::AnnotationView;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
