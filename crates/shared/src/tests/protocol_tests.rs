use super::*;
use serde_json::json;

fn en() -> ModelId {
    ModelId::new("en_core_web_sm")
}

#[test]
fn request_without_merge_np_omits_collapse_phrases() {
    let request = SubmitInputs::new("Pierre Vinken died aged 81; immortalised aged 61.", en())
        .into_request()
        .expect("valid input");

    let body = serde_json::to_value(&request).expect("serialize");
    assert_eq!(
        body,
        json!({
            "text": "Pierre Vinken died aged 81; immortalised aged 61.",
            "model": "en_core_web_sm",
        })
    );
    assert!(body.get("collapse_phrases").is_none());
}

#[test]
fn request_with_merge_np_sets_collapse_phrases_true() {
    let request = SubmitInputs::new("John likes ice cream.", en())
        .with_merge_np(true)
        .into_request()
        .expect("valid input");

    let body = serde_json::to_value(&request).expect("serialize");
    assert_eq!(body["collapse_phrases"], json!(true));
}

#[test]
fn empty_sentence_is_rejected_before_submit() {
    let err = SubmitInputs::new("   ", en())
        .into_request()
        .expect_err("must reject");
    assert_eq!(err, InputError::EmptySentence);

    let err = SubmitInputs::new("text", ModelId::new(""))
        .into_request()
        .expect_err("must reject");
    assert_eq!(err, InputError::MissingModel);
}

#[test]
fn example_inputs_use_demo_sentences() {
    let inputs = SubmitInputs::from_example(1, en()).expect("example exists");
    assert!(inputs.sentence_value.starts_with("James went"));

    let err = SubmitInputs::from_example(99, en()).expect_err("out of range");
    assert_eq!(err, InputError::UnknownExample(99));
}

#[test]
fn response_keeps_unknown_fields() {
    let raw = json!({
        "sentence": "Pierre Vinken died",
        "tree": {"text": "Pierre Vinken died", "root": {"word": "died"}},
    });

    let response: AnnotationResponse = serde_json::from_value(raw.clone()).expect("decode");
    assert_eq!(response.tree["root"]["word"], json!("died"));
    assert_eq!(response.extra["sentence"], json!("Pierre Vinken died"));
    assert_eq!(serde_json::to_value(&response).expect("encode"), raw);
}

#[test]
fn response_without_tree_is_rejected() {
    let result = serde_json::from_value::<AnnotationResponse>(json!({"sentence": "x"}));
    assert!(result.is_err());
}

#[test]
fn history_payload_uses_camel_case_keys() {
    let payload = HistoryPayload::new(
        AnnotationRequest::new("hello", en()),
        AnnotationResponse::new(json!({"root": {}})),
    );

    let value = serde_json::to_value(&payload).expect("serialize");
    assert_eq!(value["requestData"]["text"], json!("hello"));
    assert_eq!(value["responseData"]["tree"], json!({"root": {}}));
    assert!(payload.pair().is_some());
}

#[test]
fn partial_history_payload_has_no_pair() {
    let payload: HistoryPayload =
        serde_json::from_value(json!({"requestData": {"text": "a", "model": "en_core_web_sm"}}))
            .expect("decode");
    assert!(payload.request_data.is_some());
    assert!(payload.pair().is_none());
}
