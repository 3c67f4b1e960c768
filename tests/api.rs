//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use beacon_line::api::{ApiState, router};
use beacon_line::llm::{AssistantTurn, Message};
use tower::ServiceExt;

mod common;
use common::{
    FakeModel, RecordingSender, Step, api_state, dispatcher, signed_request, text_event,
    wait_for, webhook_body,
};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn echo_model() -> Arc<FakeModel> {
    Arc::new(FakeModel::from_fn(|_, messages| match messages.first() {
        Some(Message::User { content }) => Step::Turn(AssistantTurn::text(format!("echo: {content}"))),
        _ => Step::Nothing,
    }))
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = router(Arc::new(ApiState::unconfigured()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_ready_endpoint_reports_missing_line_credentials() {
    let app = router(Arc::new(ApiState::unconfigured()));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["checks"]["line"]["status"], "fail");
    assert_eq!(json["checks"]["search"]["status"], "unavailable");
}

#[tokio::test]
async fn test_ready_endpoint_when_configured() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_valid_delivery_is_acked_and_answered() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let body = webhook_body(vec![text_event("hello", "rt-1")]);
    let response = app.oneshot(signed_request("/webhook", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);

    wait_for(|| !sender.replies().is_empty()).await;
    assert_eq!(
        sender.replies(),
        vec![("rt-1".to_string(), "echo: hello".to_string())]
    );
}

#[tokio::test]
async fn test_serverless_path_is_served() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let body = webhook_body(vec![text_event("hi", "rt-1")]);
    let response = app
        .oneshot(signed_request("/api/webhook", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    wait_for(|| !sender.replies().is_empty()).await;
    assert_eq!(sender.reply_for("rt-1").as_deref(), Some("echo: hi"));
}

#[tokio::test]
async fn test_tampered_signature_is_rejected_without_side_effects() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let signed = webhook_body(vec![text_event("hello", "rt-1")]);
    let tampered = webhook_body(vec![text_event("hello!", "rt-1")]);
    let mut request = signed_request("/webhook", &tampered);
    let signature = common::signed_request("/webhook", &signed)
        .headers()
        .get("x-line-signature")
        .cloned()
        .unwrap();
    request.headers_mut().insert("x-line-signature", signature);

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(model.call_count(), 0);
    assert!(sender.replies().is_empty());
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(webhook_body(vec![text_event("hi", "rt-1")])))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_signature_checked_before_json() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let mut request = signed_request("/webhook", "not json");
    request
        .headers_mut()
        .insert("x-line-signature", "bm9wZQ==".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let response = app
        .oneshot(signed_request("/webhook", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_non_post_is_method_not_allowed() {
    let app = router(Arc::new(ApiState::unconfigured()));

    let response = app
        .oneshot(Request::builder().uri("/webhook").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_missing_credentials_is_server_error() {
    let app = router(Arc::new(ApiState::unconfigured()));

    let response = app
        .oneshot(signed_request("/webhook", &webhook_body(vec![])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_verification_delivery_is_acked() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let response = app
        .oneshot(signed_request("/webhook", &webhook_body(vec![])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_image_event_makes_no_calls() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let image = serde_json::json!({
        "type": "message",
        "replyToken": "rt-img",
        "message": {"id": "2", "type": "image"}
    });
    let response = app
        .oneshot(signed_request("/webhook", &webhook_body(vec![image])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(model.call_count(), 0);
    assert!(sender.replies().is_empty());
}

#[tokio::test]
async fn test_model_failure_gets_fallback_and_spares_other_events() {
    let model = Arc::new(FakeModel::from_fn(|_, messages| match messages.first() {
        Some(Message::User { content }) if content == "break" => Step::Fail("connection reset"),
        Some(Message::User { content }) => Step::Turn(AssistantTurn::text(format!("echo: {content}"))),
        _ => Step::Nothing,
    }));
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let body = webhook_body(vec![text_event("break", "rt-1"), text_event("fine", "rt-2")]);
    let response = app.oneshot(signed_request("/webhook", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    wait_for(|| sender.replies().len() == 2).await;
    assert_eq!(
        sender.reply_for("rt-1").as_deref(),
        Some(beacon_line::api::webhooks::line::DEFAULT_FALLBACK_MESSAGE)
    );
    assert_eq!(sender.reply_for("rt-2").as_deref(), Some("echo: fine"));
}

#[tokio::test]
async fn test_mistyped_event_does_not_drop_its_batch() {
    let model = echo_model();
    let sender = Arc::new(RecordingSender::new());
    let app = router(api_state(dispatcher(&model, &sender, None)));

    let body = webhook_body(vec![
        text_event("hello", "rt-1"),
        serde_json::json!({"type": "sticker", "text": 42, "replyToken": 7}),
        serde_json::json!({"type": 1, "message": "oops"}),
    ]);
    let response = app.oneshot(signed_request("/webhook", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    wait_for(|| !sender.replies().is_empty()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(
        sender.replies(),
        vec![("rt-1".to_string(), "echo: hello".to_string())]
    );
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn test_well_formed_json_of_any_shape_is_acked() {
    for body in [
        r#"{"events": null}"#,
        r#"{"events": "none"}"#,
        r#"{"events": {"type": "message"}}"#,
        r#"{"destination": 5}"#,
        r#"[{"type": "message"}]"#,
        "null",
    ] {
        let model = echo_model();
        let sender = Arc::new(RecordingSender::new());
        let app = router(api_state(dispatcher(&model, &sender, None)));

        let response = app.oneshot(signed_request("/webhook", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "body: {body}");
        assert_eq!(body_json(response).await["ok"], true);
        assert_eq!(model.call_count(), 0);
    }
}
