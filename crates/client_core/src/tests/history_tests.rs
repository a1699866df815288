use super::*;
use serde_json::json;
use shared::{
    domain::ModelId,
    protocol::{AnnotationRequest, AnnotationResponse},
};
use tokio::sync::broadcast::error::TryRecvError;

fn payload(text: &str) -> HistoryPayload {
    HistoryPayload::new(
        AnnotationRequest::new(text, ModelId::new("en_core_web_sm")),
        AnnotationResponse::new(json!({"text": text})),
    )
}

#[tokio::test]
async fn starts_with_initial_route_entry() {
    let history = InMemoryHistory::new(Route::new("/en_core_web_sm"));
    let current = history.current().await.expect("initial entry");
    assert_eq!(current.route, Route::new("/en_core_web_sm"));
    assert!(current.state.is_none());
    assert_eq!(history.len().await, 1);
}

#[tokio::test]
async fn push_state_keeps_current_route_and_notifies() {
    let history = InMemoryHistory::new(Route::new("/en_core_web_sm"));
    let mut changes = history.subscribe();

    let committed = history.push_state(payload("one")).await.expect("push");

    assert_eq!(committed.index, 1);
    let change = changes.try_recv().expect("change");
    assert_eq!(change.entry.id, committed.id);
    assert_eq!(change.action, NavigationAction::Push);
    assert_eq!(change.index, 1);
    assert_eq!(change.entry.route, Route::new("/en_core_web_sm"));
    assert_eq!(change.entry.state, Some(payload("one")));
    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn back_and_forward_move_cursor() {
    let history = InMemoryHistory::new(Route::root());
    history.push_state(payload("one")).await.expect("push");
    history.push_state(payload("two")).await.expect("push");
    let mut changes = history.subscribe();

    let entry = history.back().await.expect("back");
    assert_eq!(entry.state, Some(payload("one")));
    assert_eq!(history.position().await, 1);
    assert_eq!(changes.try_recv().expect("change").action, NavigationAction::Back);

    let entry = history.forward().await.expect("forward");
    assert_eq!(entry.state, Some(payload("two")));
    assert_eq!(changes.try_recv().expect("change").action, NavigationAction::Forward);

    assert!(history.forward().await.is_none());
    history.back().await.expect("back");
    history.back().await.expect("back");
    assert!(history.back().await.is_none());
    assert_eq!(history.position().await, 0);
}

#[tokio::test]
async fn push_after_back_drops_forward_entries() {
    let history = InMemoryHistory::new(Route::root());
    history.push_state(payload("one")).await.expect("push");
    history.push_state(payload("two")).await.expect("push");
    history.back().await.expect("back");

    history.push_route(Route::new("/de_core_news_sm")).await;

    let entries = history.entries().await;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].state, Some(payload("one")));
    assert_eq!(entries[2].route, Route::new("/de_core_news_sm"));
    assert!(history.forward().await.is_none());
}

#[tokio::test]
async fn capacity_evicts_oldest_entries() {
    let history = InMemoryHistory::with_capacity(Route::root(), 2);
    history.push_state(payload("one")).await.expect("push");
    history.push_state(payload("two")).await.expect("push");

    let entries = history.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].state, Some(payload("one")));
    assert_eq!(history.position().await, 1);
}
