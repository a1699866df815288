//! Static choices offered by the input form.

use crate::domain::ModelId;

pub const DEFAULT_MODEL: &str = "en_core_web_sm";

pub const KNOWN_MODELS: &[&str] = &[
    "en_core_web_sm",
    "de_core_news_sm",
    "es_core_news_sm",
    "pt_core_news_sm",
    "fr_core_news_sm",
    "it_core_news_sm",
    "nl_core_news_sm",
];

pub const DEMO_SENTENCES: &[&str] = &[
    "Pierre Vinken died aged 81; immortalised aged 61.",
    "James went to the corner shop to buy some eggs, milk and bread for breakfast.",
    "If you bring $10 with you tomorrow, can you pay for me to eat too?",
    "True self-control is waiting until the movie starts to eat your popcorn.",
];

pub fn default_model() -> ModelId {
    ModelId::new(DEFAULT_MODEL)
}

pub fn is_known_model(model: &ModelId) -> bool {
    KNOWN_MODELS.contains(&model.as_str())
}

pub fn demo_sentence(index: usize) -> Option<&'static str> {
    DEMO_SENTENCES.get(index).copied()
}
