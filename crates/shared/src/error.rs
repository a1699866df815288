use thiserror::Error;

/// Rejections raised by the input form before a request reaches the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("sentence must not be empty")]
    EmptySentence,
    #[error("model must not be empty")]
    MissingModel,
    #[error("no example sentence at index {0}")]
    UnknownExample(usize),
}
