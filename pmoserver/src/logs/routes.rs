//! Routes HTTP de consultation et de réglage des logs

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;
use utoipa::{OpenApi, ToSchema};

use super::{LogEntry, LogState};

const LEVELS: [Level; 5] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE];

/// Filtre de `/log-sse` : `?warn=true&error=true&search=display`
///
/// Sans aucun drapeau de niveau, tous les niveaux passent.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LogFilter {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub warn: bool,
    #[serde(default)]
    pub info: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub trace: bool,
    pub search: Option<String>,
}

impl LogFilter {
    fn wants(&self, level: &str) -> bool {
        let selected = [
            (self.error, Level::ERROR),
            (self.warn, Level::WARN),
            (self.info, Level::INFO),
            (self.debug, Level::DEBUG),
            (self.trace, Level::TRACE),
        ];
        if selected.iter().all(|(on, _)| !on) {
            return true;
        }
        selected
            .iter()
            .any(|(on, l)| *on && l.as_str().eq_ignore_ascii_case(level))
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if !self.wants(&entry.level) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                entry.message.contains(needle.as_str())
                    || entry.target.contains(needle.as_str())
                    || entry.fields.values().any(|v| v.contains(needle.as_str()))
            }
            None => true,
        }
    }
}

fn sse_event(entry: &LogEntry) -> Option<Event> {
    serde_json::to_string(entry)
        .ok()
        .map(|json| Event::default().data(json))
}

/// Historique filtré puis flux temps réel
pub async fn log_sse(State(state): State<LogState>, Query(filter): Query<LogFilter>) -> impl IntoResponse {
    let mut live = state.subscribe();
    let backlog = state.history();

    let stream = async_stream::stream! {
        for entry in backlog.iter().filter(|e| state.accepts(e) && filter.matches(e)) {
            if let Some(event) = sse_event(entry) {
                yield Ok::<_, axum::Error>(event);
            }
        }

        loop {
            match live.recv().await {
                Ok(entry) if state.accepts(&entry) && filter.matches(&entry) => {
                    if let Some(event) = sse_event(&entry) {
                        yield Ok(event);
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Contenu du tampon en JSON
pub async fn log_dump(State(state): State<LogState>) -> Json<Vec<LogEntry>> {
    Json(state.history())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogLevelRequest {
    pub level: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogLevelResponse {
    pub current_level: String,
    pub available_levels: Vec<String>,
}

impl From<Level> for LogLevelResponse {
    fn from(level: Level) -> Self {
        Self {
            current_level: level.as_str().to_string(),
            available_levels: LEVELS.iter().map(|l| l.as_str().to_string()).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/log_setup",
    tag = "logs",
    responses((status = 200, description = "Niveau courant", body = LogLevelResponse))
)]
pub async fn get_log_level(State(state): State<LogState>) -> Json<LogLevelResponse> {
    Json(state.level().into())
}

#[utoipa::path(
    post,
    path = "/log_setup",
    tag = "logs",
    request_body = LogLevelRequest,
    responses(
        (status = 200, description = "Niveau appliqué", body = LogLevelResponse),
        (status = 400, description = "Niveau inconnu")
    )
)]
pub async fn set_log_level(State(state): State<LogState>, Json(request): Json<LogLevelRequest>) -> Response {
    match Level::from_str(&request.level) {
        Ok(level) => {
            state.set_level(level);
            tracing::info!(level = %level, "Log level changed");
            Json(LogLevelResponse::from(level)).into_response()
        }
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("Unknown log level {}", request.level) })),
        )
            .into_response(),
    }
}

/// Routes relatives, montées sous `/api/logs`
pub fn create_logs_router(state: LogState) -> Router {
    Router::new()
        .route("/log_setup", get(get_log_level).post(set_log_level))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(get_log_level, set_log_level),
    components(schemas(LogLevelRequest, LogLevelResponse)),
    tags((name = "logs", description = "Niveau de journalisation"))
)]
pub struct LogsApiDoc;
