use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Key accepted when none is configured.
pub const DEFAULT_API_KEY: &str = "sk_test_mock";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Placeholder {
    pub key: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub placeholders: Vec<Placeholder>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub tags: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub template_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub output: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub url: String,
    pub format: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    templates: Arc<Vec<Template>>,
}

/// Non-2xx reply in the API's error body shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    body: Value,
}

impl ApiFailure {
    fn new(status: StatusCode, message: &str, code: &str) -> Self {
        Self {
            status,
            body: json!({"message": message, "code": code}),
        }
    }

    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: json!({"error": "invalid or missing API key", "code": "UNAUTHORIZED"}),
        }
    }

    fn template_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "template not found", "NOT_FOUND")
    }

    fn with(mut self, field: &str, value: Value) -> Self {
        if let Value::Object(body) = &mut self.body {
            body.insert(field.to_string(), value);
        }
        self
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Catalog the server starts with.
pub fn seed_templates() -> Vec<Template> {
    fn p(key: &str, required: bool, description: Option<&str>) -> Placeholder {
        Placeholder {
            key: key.to_string(),
            required,
            description: description.map(str::to_string),
        }
    }

    vec![
        Template {
            id: "tpl_invoice".to_string(),
            name: "Invoice".to_string(),
            tags: vec!["finance".to_string(), "billing".to_string()],
            placeholders: vec![
                p("customer", true, Some("Billed party")),
                p("amount", true, None),
                p("due_date", false, Some("ISO date")),
            ],
        },
        Template {
            id: "tpl_offer_letter".to_string(),
            name: "Offer Letter".to_string(),
            tags: vec!["hr".to_string()],
            placeholders: vec![
                p("name", true, None),
                p("position", true, None),
                p("salary", false, None),
            ],
        },
        Template {
            id: "tpl_nda".to_string(),
            name: "Mutual NDA".to_string(),
            tags: vec!["legal".to_string(), "hr".to_string()],
            placeholders: vec![p("party_a", true, None), p("party_b", true, None)],
        },
    ]
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        templates: Arc::new(seed_templates()),
    };
    Router::new()
        .route("/ping", get(ping))
        .route("/templates", get(list_templates))
        .route("/templates/{id}", get(get_template))
        .route("/templates/{id}/placeholders", get(get_placeholders))
        .route("/documents/generate", post(generate))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let expected = format!("Bearer {}", state.api_key);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(ApiFailure::unauthorized()),
    }
}

fn find_template<'a>(state: &'a AppState, id: &str) -> Result<&'a Template, ApiFailure> {
    state
        .templates
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(ApiFailure::template_not_found)
}

async fn ping(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    Ok(Json(json!({"status": "ok"})))
}

async fn list_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Template>>, ApiFailure> {
    authorize(&state, &headers)?;

    let search = query.search.map(|s| s.to_lowercase());
    let tags: Vec<&str> = query
        .tags
        .as_deref()
        .map(|t| t.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let templates = state
        .templates
        .iter()
        .filter(|t| {
            search
                .as_deref()
                .map_or(true, |s| t.name.to_lowercase().contains(s))
        })
        .filter(|t| tags.iter().all(|tag| t.tags.iter().any(|own| own == tag)))
        .cloned()
        .collect();
    Ok(Json(templates))
}

async fn get_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiFailure> {
    authorize(&state, &headers)?;
    find_template(&state, &id).cloned().map(Json)
}

async fn get_placeholders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;
    let template = find_template(&state, &id)?;
    Ok(Json(json!({"placeholders": template.placeholders})))
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    input: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Document>, ApiFailure> {
    authorize(&state, &headers)?;

    let Json(input) = input.map_err(|rejection| {
        ApiFailure::new(StatusCode::BAD_REQUEST, &rejection.body_text(), "BAD_REQUEST")
    })?;
    let template = find_template(&state, &input.template_id)?;

    let format = match input.output.as_deref().unwrap_or("pdf") {
        "pdf" => "pdf",
        "docx" => "docx",
        other => {
            return Err(ApiFailure::new(
                StatusCode::BAD_REQUEST,
                &format!("unsupported output format '{other}'"),
                "INVALID_OUTPUT",
            )
            .with("details", json!({"allowed": ["pdf", "docx"]})))
        }
    };

    let missing: Vec<&str> = template
        .placeholders
        .iter()
        .filter(|p| p.required && !input.data.contains_key(&p.key))
        .map(|p| p.key.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(ApiFailure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "missing required placeholders",
            "PAYLOAD_INVALID",
        )
        .with("meta", json!({"missing": missing})));
    }

    let id = format!("doc_{}", Uuid::new_v4().simple());
    Ok(Json(Document {
        url: format!("https://files.diamiq.test/{id}.{format}"),
        id,
        format: format.to_string(),
        expires_at: (Utc::now() + Duration::hours(1)).to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
