use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mentor_api::build_app;
use serde_json::json;
use tower::ServiceExt;

const API_KEY: &str = "dev-mentor-key";

fn app() -> Router {
    // Keep the simulated turn latency out of the test runtime.
    std::env::set_var("MENTOR_CHAT_LATENCY_MS", "0");
    build_app()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert!(parsed.get("metrics").is_some());
}

#[tokio::test]
async fn chat_requires_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "how do I budget?" }).to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chat_answers_with_profile_tailored_reply() {
    let response = app()
        .oneshot(post_json(
            "/v1/chat",
            json!({
                "text": "I want to invest and save",
                "profile": "student"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    // "invest" is checked before "save" in the keyword table.
    assert_eq!(parsed["topic"], "invest");
    assert_eq!(parsed["reply"]["sender"], "bot");
    assert!(parsed["reply"]["text"]
        .as_str()
        .unwrap()
        .contains("Roth IRA"));
    // Greeting, user message, bot reply.
    assert_eq!(parsed["message_count"], 3);
}

#[tokio::test]
async fn blank_chat_submission_is_a_noop() {
    let response = app()
        .oneshot(post_json("/v1/chat", json!({ "text": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["accepted"], false);
    assert_eq!(parsed["reason"], "empty_submission");
}

#[tokio::test]
async fn submit_gates_a_second_message_until_resolution() {
    let app = app();

    let first = app
        .clone()
        .oneshot(post_json(
            "/v1/chat/submit",
            json!({ "text": "tax question" }),
        ))
        .await
        .unwrap();
    let first = json_body(first).await;
    assert_eq!(first["accepted"], true);
    let session_id = first["session_id"].as_str().unwrap();

    let second = app
        .oneshot(post_json(
            "/v1/chat/submit",
            json!({ "session_id": session_id, "text": "another question" }),
        ))
        .await
        .unwrap();
    let second = json_body(second).await;
    assert_eq!(second["accepted"], false);
    assert_eq!(second["reason"], "turn_in_flight");
}

#[tokio::test]
async fn budget_analyze_returns_three_ordered_recommendations() {
    let response = app()
        .oneshot(post_json(
            "/v1/budget/analyze",
            json!({
                "profile": "professional",
                "income": "3000",
                "housing": "1000",
                "food": "not-a-number"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let parsed = json_body(response).await;
    assert_eq!(parsed["metrics"]["total_expenses"], 1000.0);
    assert_eq!(parsed["metrics"]["remaining_budget"], 2000.0);

    let recommendations = parsed["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 3);
    assert_eq!(recommendations[0]["title"], "Housing Rule");
    assert_eq!(recommendations[0]["status"], "warning");
    assert_eq!(recommendations[0]["percentage"], 33);
    assert_eq!(recommendations[1]["title"], "Savings Rate");
    assert_eq!(recommendations[2]["title"], "Emergency Fund");
    assert!(recommendations[2].get("percentage").is_none());
}

#[tokio::test]
async fn budget_analyze_rejects_unknown_profile() {
    let response = app()
        .oneshot(post_json(
            "/v1/budget/analyze",
            json!({ "profile": "retiree", "income": "1000" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_upsert_is_set_once() {
    let app = app();

    let first = app
        .clone()
        .oneshot(post_json(
            "/v1/profile/upsert",
            json!({ "profile": "student" }),
        ))
        .await
        .unwrap();
    let first = json_body(first).await;
    assert_eq!(first["profile"], "student");
    let session_id = first["session_id"].as_str().unwrap();

    let second = app
        .oneshot(post_json(
            "/v1/profile/upsert",
            json!({ "session_id": session_id, "profile": "professional" }),
        ))
        .await
        .unwrap();
    let second = json_body(second).await;
    assert_eq!(second["profile"], "student");
}
