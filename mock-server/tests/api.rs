use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, DEFAULT_API_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed_get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_API_KEY}"))
        .body(String::new())
        .unwrap()
}

fn generate_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/documents/generate")
        .header(http::header::AUTHORIZATION, format!("Bearer {DEFAULT_API_KEY}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn ids(templates: &Value) -> Vec<&str> {
    templates
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect()
}

// --- auth ---

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(Request::builder().uri("/ping").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let resp = app("sk_other")
        .oneshot(authed_get("/templates"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- ping ---

#[tokio::test]
async fn ping_with_token_is_ok() {
    let resp = app(DEFAULT_API_KEY).oneshot(authed_get("/ping")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"status": "ok"}));
}

// --- templates ---

#[tokio::test]
async fn list_templates_unfiltered_returns_catalog() {
    let resp = app(DEFAULT_API_KEY).oneshot(authed_get("/templates")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(ids(&body), vec!["tpl_invoice", "tpl_offer_letter", "tpl_nda"]);
}

#[tokio::test]
async fn list_templates_filters_by_search() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(authed_get("/templates?search=offer"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(ids(&body), vec!["tpl_offer_letter"]);
}

#[tokio::test]
async fn list_templates_requires_every_tag() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(authed_get("/templates?tags=hr%2Clegal"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(ids(&body), vec!["tpl_nda"]);
}

#[tokio::test]
async fn get_template_not_found() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(authed_get("/templates/tpl_missing"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body, json!({"message": "template not found", "code": "NOT_FOUND"}));
}

#[tokio::test]
async fn placeholders_are_listed() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(authed_get("/templates/tpl_nda/placeholders"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"placeholders": [
            {"key": "party_a", "required": true},
            {"key": "party_b", "required": true}
        ]})
    );
}

// --- generate ---

#[tokio::test]
async fn generate_returns_document() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(
            r#"{"template_id":"tpl_nda","data":{"party_a":"A","party_b":"B"},"output":"docx"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["format"], "docx");
    assert!(body["id"].as_str().unwrap().starts_with("doc_"));
    assert!(body["url"].as_str().unwrap().ends_with(".docx"));
    assert!(body["expiresAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn generate_defaults_to_pdf() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(
            r#"{"template_id":"tpl_nda","data":{"party_a":"A","party_b":"B"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(body_json(resp).await["format"], "pdf");
}

#[tokio::test]
async fn generate_reports_missing_placeholders_in_meta() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(r#"{"template_id":"tpl_nda","data":{"party_a":"A"}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "PAYLOAD_INVALID");
    assert_eq!(body["meta"], json!({"missing": ["party_b"]}));
}

#[tokio::test]
async fn generate_rejects_unknown_output() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(
            r#"{"template_id":"tpl_nda","data":{"party_a":"A","party_b":"B"},"output":"odt"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["code"], "INVALID_OUTPUT");
    assert_eq!(body["details"], json!({"allowed": ["pdf", "docx"]}));
}

#[tokio::test]
async fn generate_unknown_template_is_not_found() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(r#"{"template_id":"tpl_missing","data":{}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_malformed_body_is_bad_request() {
    let resp = app(DEFAULT_API_KEY)
        .oneshot(generate_request(r#"{"data":{}}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["code"], "BAD_REQUEST");
}
