//! Lecture et modification de la configuration via HTTP
//!
//! Les chemins sont des clés pointées (`stage.websocket.ping_interval`).
//! Les valeurs transitent en JSON et sont stockées en YAML.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;
use utoipa::ToSchema;

use crate::Config;

/// Une entrée de configuration, en lecture comme en écriture
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfigEntry {
    /// Clé pointée, ex: `host.http_port`
    pub path: String,
    pub value: JsonValue,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigError {
    pub error: String,
}

fn failure(status: StatusCode, error: impl std::fmt::Display) -> Response {
    (
        status,
        Json(ConfigError {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('.').filter(|part| !part.is_empty()).collect()
}

#[utoipa::path(
    get,
    path = "/",
    tag = "config",
    responses(
        (status = 200, description = "Arbre de configuration complet", body = serde_json::Value)
    )
)]
pub async fn dump_config(State(config): State<Arc<Config>>) -> Response {
    let tree = config
        .get_value(&[])
        .and_then(|value| Ok(serde_json::to_value(value)?));
    match tree {
        Ok(json) => Json(json).into_response(),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[utoipa::path(
    get,
    path = "/{path}",
    tag = "config",
    params(("path" = String, Path, description = "Clé pointée, ex: stage.default_volume")),
    responses(
        (status = 200, description = "Valeur courante", body = ConfigEntry),
        (status = 404, description = "Clé inconnue", body = ConfigError)
    )
)]
pub async fn read_entry(State(config): State<Arc<Config>>, Path(path): Path<String>) -> Response {
    let value = match config.get_value(&split_path(&path)) {
        Ok(value) => value,
        Err(e) => return failure(StatusCode::NOT_FOUND, e),
    };
    match serde_json::to_value(value) {
        Ok(value) => Json(ConfigEntry { path, value }).into_response(),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

#[utoipa::path(
    post,
    path = "/",
    tag = "config",
    request_body = ConfigEntry,
    responses(
        (status = 200, description = "Valeur enregistrée", body = ConfigEntry),
        (status = 400, description = "Clé ou valeur invalide", body = ConfigError)
    )
)]
pub async fn write_entry(State(config): State<Arc<Config>>, Json(entry): Json<ConfigEntry>) -> Response {
    let parts = split_path(&entry.path);
    if parts.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Empty configuration path");
    }

    let stored = serde_yaml::to_value(&entry.value)
        .map_err(anyhow::Error::from)
        .and_then(|value| config.set_value(&parts, value));
    match stored {
        Ok(()) => {
            info!(key = %entry.path, "Configuration updated");
            Json(entry).into_response()
        }
        Err(e) => failure(StatusCode::BAD_REQUEST, e),
    }
}

/// Routes relatives, montées sous `/api/config`
pub fn create_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", get(dump_config).post(write_entry))
        .route("/{path}", get(read_entry))
        .with_state(config)
}
