//! HTTP surface: routes, handlers and the error-to-status mapping.
//!
//! Every response uses the `{ok, data}` / `{ok, error}` JSON envelope the
//! page layer consumes. Handlers hold no state beyond [`AppState`]; each
//! request re-reads the notes file and, for ask, re-reads the upstream
//! configuration from the environment.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::ask::{AskClient, AskConfig, AskError};
use crate::models::CreateNoteInput;
use crate::query::group_by_subject;
use crate::store::{NoteStore, StoreError};

/// Shared per-process state: the store and the upstream connection pool.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NoteStore>,
    pub http: reqwest::Client,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/:id", get(get_note))
        .route("/api/ask", post(ask))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API failure with its HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    BadGateway(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { .. } => ApiError::BadRequest(err.to_string()),
            StoreError::Io { .. } | StoreError::Corrupt { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::EmptyQuestion => ApiError::BadRequest(err.to_string()),
            AskError::MissingApiKey | AskError::InvalidBaseUrl(_) => {
                ApiError::Internal(err.to_string())
            }
            AskError::Network(_) | AskError::UpstreamStatus { .. } | AskError::NoContent => {
                ApiError::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        let body = Json(json!({ "ok": false, "error": message }));
        (status, body).into_response()
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "ok": true, "data": data }))
}

/// Serializes a response payload, surfacing the (in practice unreachable)
/// failure as a 500 rather than silently returning `null` data.
fn to_json<T: serde::Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    grouped: bool,
}

/// `GET /api/notes` — all notes, most recently updated first. With
/// `?grouped=true` the notes come back bucketed by subject, with the
/// Chinese display label alongside each group.
async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let notes = state.store.list_all()?;
    if !params.grouped {
        return Ok(ok(to_json(notes)?));
    }

    let groups: Vec<Value> = group_by_subject(notes)
        .into_iter()
        .map(|(subject, notes)| {
            json!({
                "subject": subject,
                "label": subject.label(),
                "notes": notes,
            })
        })
        .collect();
    Ok(ok(Value::Array(groups)))
}

/// `GET /api/notes/:id`
async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.get_by_id(&id)? {
        Some(note) => Ok(ok(to_json(note)?)),
        None => Err(ApiError::NotFound("note not found".to_string())),
    }
}

/// `POST /api/notes` — append a note. The response's `mode` field tells the
/// caller whether the note was written or must be copied in by hand.
async fn create_note(
    State(state): State<AppState>,
    Json(input): Json<CreateNoteInput>,
) -> Result<Json<Value>, ApiError> {
    let result = state.store.append(input)?;
    Ok(ok(to_json(result)?))
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

/// `POST /api/ask` — forward one question to the model provider.
///
/// The question is validated before the upstream configuration is read, so
/// an empty question never depends on (or reveals) configuration state.
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Value>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AskError::EmptyQuestion.into());
    }

    let config = AskConfig::from_env()?;
    let client = AskClient::new(state.http.clone(), config)?;
    let answer = client.ask(question).await?;
    Ok(ok(to_json(answer)?))
}
