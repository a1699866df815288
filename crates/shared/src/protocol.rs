use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    catalog,
    domain::{EntryId, ModelId, Route},
    error::InputError,
};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Body of `POST /annotate`.
///
/// `collapse_phrases` is only written when set; the service treats a missing
/// key as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub text: String,
    pub model: ModelId,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapse_phrases: bool,
}

impl AnnotationRequest {
    pub fn new(text: impl Into<String>, model: ModelId) -> Self {
        Self {
            text: text.into(),
            model,
            collapse_phrases: false,
        }
    }

    pub fn with_collapse_phrases(mut self, collapse_phrases: bool) -> Self {
        self.collapse_phrases = collapse_phrases;
        self
    }
}

/// Annotation document returned by the service. Only `tree` is required; all
/// other fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResponse {
    pub tree: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationResponse {
    pub fn new(tree: Value) -> Self {
        Self {
            tree,
            extra: Map::new(),
        }
    }
}

/// State attached to a navigation entry. Entries written by the lifecycle
/// controller always carry both halves; foreign entries may carry either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<AnnotationRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<AnnotationResponse>,
}

impl HistoryPayload {
    pub fn new(request: AnnotationRequest, response: AnnotationResponse) -> Self {
        Self {
            request_data: Some(request),
            response_data: Some(response),
        }
    }

    pub fn pair(&self) -> Option<(&AnnotationRequest, &AnnotationResponse)> {
        match (&self.request_data, &self.response_data) {
            (Some(request), Some(response)) => Some((request, response)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub id: EntryId,
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<HistoryPayload>,
    pub created_at: DateTime<Utc>,
}

impl NavigationEntry {
    pub fn new(route: Route, state: Option<HistoryPayload>) -> Self {
        Self {
            id: EntryId::generate(),
            route,
            state,
            created_at: Utc::now(),
        }
    }
}

/// Body of `GET /models`: model id to human-readable description.
pub type ModelCatalog = BTreeMap<ModelId, String>;

/// Raw values collected by the input form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInputs {
    pub sentence_value: String,
    pub model_value: ModelId,
    #[serde(default)]
    pub merge_np: bool,
}

impl SubmitInputs {
    pub fn new(sentence_value: impl Into<String>, model_value: ModelId) -> Self {
        Self {
            sentence_value: sentence_value.into(),
            model_value,
            merge_np: false,
        }
    }

    pub fn from_example(index: usize, model_value: ModelId) -> Result<Self, InputError> {
        let sentence = catalog::demo_sentence(index).ok_or(InputError::UnknownExample(index))?;
        Ok(Self::new(sentence, model_value))
    }

    pub fn with_merge_np(mut self, merge_np: bool) -> Self {
        self.merge_np = merge_np;
        self
    }

    pub fn into_request(self) -> Result<AnnotationRequest, InputError> {
        if self.sentence_value.trim().is_empty() {
            return Err(InputError::EmptySentence);
        }
        if self.model_value.as_str().trim().is_empty() {
            return Err(InputError::MissingModel);
        }
        Ok(AnnotationRequest::new(self.sentence_value, self.model_value)
            .with_collapse_phrases(self.merge_np))
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
