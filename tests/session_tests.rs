//! End-to-end session tests against a mock scoring service

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use fedhealth_client::{
    ClientConfig, DiagnosticSession, Error, ModuleKind, PredictionPhase, RawForm,
};
use helpers::MockBackend;

fn cardio_form() -> RawForm {
    [
        ("age", "50"),
        ("gender", "1"),
        ("height", "170"),
        ("weight", "70"),
        ("ap_hi", "120"),
        ("ap_lo", "80"),
        ("cholesterol", "1"),
        ("gluc", "1"),
        ("smoke", "0"),
        ("alco", "0"),
        ("active", "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn session_for(backend: &MockBackend) -> DiagnosticSession {
    DiagnosticSession::new(&ClientConfig::with_base_url(&backend.base_url)).unwrap()
}

#[tokio::test]
async fn test_cardio_submission_converts_age_and_reaches_ready() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);

    session.select_module(ModuleKind::Cardio).await;
    session.submit_form(&cardio_form()).await.unwrap();

    // Payload on the wire carries age in days, everything else verbatim
    let request = backend
        .last_request("/predict/cardiovascular/result")
        .expect("result call recorded");
    assert_eq!(request.body["age"], 18250);
    assert_eq!(request.body["ap_hi"], 120);
    assert_eq!(request.body["active"], 1);

    match session.phase().await {
        PredictionPhase::Ready(result) => {
            assert_eq!(result.risk_probability, Some(0.42));
            assert_eq!(result.risk_category.as_deref(), Some("Moderate"));
        }
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_explanations_attached_in_server_order() {
    let backend = MockBackend::start().await;
    backend.set_top_factors(serde_json::json!([
        {"feature": "ap_hi", "impact": "increases"},
        {"feature": "cholesterol", "impact": "increases"},
        {"feature": "active", "impact": "decreases"},
    ]));
    let session = session_for(&backend);

    session.submit_form(&cardio_form()).await.unwrap();

    let result = session.current_result().await.unwrap();
    let features: Vec<String> = result
        .explanations
        .iter()
        .map(|f| f.feature.clone())
        .collect();
    assert_eq!(features, vec!["ap_hi", "cholesterol", "active"]);
}

#[tokio::test]
async fn test_explanation_failure_still_reaches_ready() {
    let backend = MockBackend::start().await;
    backend.fail_explanation();
    let session = session_for(&backend);

    session.submit_form(&cardio_form()).await.unwrap();

    match session.phase().await {
        PredictionPhase::Ready(result) => assert!(result.explanations.is_empty()),
        other => panic!("expected Ready despite explanation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_result_failure_reaches_failed_without_explanation_call() {
    let backend = MockBackend::start().await;
    backend.fail_result();
    let session = session_for(&backend);

    let err = session.submit_form(&cardio_form()).await.unwrap_err();
    assert!(matches!(err, Error::PredictionFailed(_)));

    assert!(matches!(session.phase().await, PredictionPhase::Failed(_)));
    // Fail-fast: the best-effort call is never issued
    assert_eq!(backend.count("/predict/cardiovascular/explanation"), 0);
}

#[tokio::test]
async fn test_invalid_payload_blocks_submission() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);

    let mut form = cardio_form();
    form.remove("gluc");

    let err = session.submit_form(&form).await.unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(field) if field == "gluc"));

    // Surfaced before any network call; the state machine never left NoResult
    assert!(backend.requests().is_empty());
    assert_eq!(session.phase().await, PredictionPhase::NoResult);
}

#[tokio::test]
async fn test_module_switch_mid_flight_drops_late_result() {
    let backend = MockBackend::start().await;
    backend.delay_result(300);
    let session = Arc::new(session_for(&backend));

    let submitting = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_form(&cardio_form()).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.phase().await, PredictionPhase::Loading);

    session.select_module(ModuleKind::Diabetes).await;
    assert_eq!(session.phase().await, PredictionPhase::NoResult);

    // The in-flight submission resolves against a superseded token
    submitting.await.unwrap().unwrap();
    assert_eq!(session.phase().await, PredictionPhase::NoResult);
}

#[tokio::test]
async fn test_member_switch_resets_ready_result() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);

    session.submit_form(&cardio_form()).await.unwrap();
    assert!(matches!(session.phase().await, PredictionPhase::Ready(_)));

    let original = session.active_member().await;
    let added = session.add_member("Jane Smith").await;
    assert_eq!(session.active_member().await, added);
    assert_eq!(session.phase().await, PredictionPhase::NoResult);

    // Re-selecting the original member also resets
    session.submit_form(&cardio_form()).await.unwrap();
    session.select_member(original.member_id).await;
    assert_eq!(session.phase().await, PredictionPhase::NoResult);
}

#[tokio::test]
async fn test_diabetes_payload_sent_verbatim() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);
    session.select_module(ModuleKind::Diabetes).await;

    let form: RawForm = [
        ("age", "45"),
        ("gender", "Male"),
        ("hypertension", "0"),
        ("heart_disease", "0"),
        ("smoking_history", "never"),
        ("bmi", "25.5"),
        ("HbA1c_level", "5.5"),
        ("blood_glucose_level", "100"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    session.submit_form(&form).await.unwrap();

    let request = backend.last_request("/predict/diabetes").unwrap();
    assert_eq!(request.body["age"], 45);
    assert_eq!(request.body["gender"], "Male");
    assert_eq!(request.body["smoking_history"], "never");
    assert_eq!(request.body["bmi"], 25.5);
}

#[tokio::test]
async fn test_transitions_are_broadcast() {
    let backend = MockBackend::start().await;
    let session = session_for(&backend);
    let mut transitions = session.subscribe();

    session.submit_form(&cardio_form()).await.unwrap();

    let first = transitions.recv().await.unwrap();
    assert_eq!(first.new_phase, "loading");
    let second = transitions.recv().await.unwrap();
    assert_eq!(second.old_phase, "loading");
    assert_eq!(second.new_phase, "ready");
}
