//! API REST de la scène, montée sous `/api/stage`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use pmocatalog::{CatalogError, Slide, Track};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::error::StageError;
use crate::model::{NewSlide, NewTrack};
use crate::protocol::StageSnapshot;
use crate::stage::Stage;

/// Réponse d'erreur REST générique
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Paroles décodées en UTF-8
#[derive(Debug, Serialize, ToSchema)]
pub struct LyricsResponse {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub admins: usize,
    pub displays: usize,
}

pub fn create_router(stage: Arc<Stage>) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/tracks", get(list_tracks).post(add_track))
        .route("/tracks/{id}", delete(remove_track))
        .route("/slides", get(list_slides).post(add_slide))
        .route("/slides/{id}", delete(remove_slide))
        .route("/lyrics/{filename}", get(get_lyrics))
        .route("/health", get(health))
        .with_state(stage)
}

#[utoipa::path(
    get,
    path = "/state",
    tag = "stage",
    responses(
        (status = 200, description = "État complet de la scène", body = StageSnapshot)
    )
)]
pub async fn get_state(State(stage): State<Arc<Stage>>) -> Json<StageSnapshot> {
    Json(stage.snapshot())
}

#[utoipa::path(
    get,
    path = "/tracks",
    tag = "stage",
    responses(
        (status = 200, description = "Playlist dans l'ordre d'affichage", body = [Track])
    )
)]
pub async fn list_tracks(State(stage): State<Arc<Stage>>) -> Json<Vec<Track>> {
    Json(stage.tracks())
}

#[utoipa::path(
    post,
    path = "/tracks",
    tag = "stage",
    request_body = NewTrack,
    responses(
        (status = 201, description = "Piste ajoutée", body = Track),
        (status = 400, description = "Requête invalide", body = ErrorResponse),
        (status = 500, description = "Catalogue indisponible", body = ErrorResponse)
    )
)]
pub async fn add_track(State(stage): State<Arc<Stage>>, Json(request): Json<NewTrack>) -> Response {
    match stage.add_track(request).await {
        Ok(track) => (StatusCode::CREATED, Json(track)).into_response(),
        Err(e) => map_error(e),
    }
}

#[utoipa::path(
    delete,
    path = "/tracks/{id}",
    tag = "stage",
    params(("id" = String, Path, description = "Identifiant de la piste")),
    responses(
        (status = 204, description = "Piste supprimée"),
        (status = 404, description = "Piste inconnue", body = ErrorResponse)
    )
)]
pub async fn remove_track(State(stage): State<Arc<Stage>>, Path(id): Path<String>) -> Response {
    match stage.remove_track(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("track", &id),
        Err(e) => map_error(e),
    }
}

#[utoipa::path(
    get,
    path = "/slides",
    tag = "stage",
    responses(
        (status = 200, description = "Slides dans l'ordre d'affichage", body = [Slide])
    )
)]
pub async fn list_slides(State(stage): State<Arc<Stage>>) -> Json<Vec<Slide>> {
    Json(stage.slides())
}

#[utoipa::path(
    post,
    path = "/slides",
    tag = "stage",
    request_body = NewSlide,
    responses(
        (status = 201, description = "Slide ajoutée", body = Slide),
        (status = 400, description = "Requête invalide", body = ErrorResponse),
        (status = 500, description = "Catalogue indisponible", body = ErrorResponse)
    )
)]
pub async fn add_slide(State(stage): State<Arc<Stage>>, Json(request): Json<NewSlide>) -> Response {
    match stage.add_slide(request).await {
        Ok(slide) => (StatusCode::CREATED, Json(slide)).into_response(),
        Err(e) => map_error(e),
    }
}

#[utoipa::path(
    delete,
    path = "/slides/{id}",
    tag = "stage",
    params(("id" = String, Path, description = "Identifiant de la slide")),
    responses(
        (status = 204, description = "Slide supprimée"),
        (status = 404, description = "Slide inconnue", body = ErrorResponse)
    )
)]
pub async fn remove_slide(State(stage): State<Arc<Stage>>, Path(id): Path<String>) -> Response {
    match stage.remove_slide(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("slide", &id),
        Err(e) => map_error(e),
    }
}

#[utoipa::path(
    get,
    path = "/lyrics/{filename}",
    tag = "stage",
    params(("filename" = String, Path, description = "Nom du fichier sous uploads/lyrics")),
    responses(
        (status = 200, description = "Contenu du fichier", body = LyricsResponse),
        (status = 400, description = "Nom de fichier invalide", body = ErrorResponse),
        (status = 404, description = "Fichier absent", body = ErrorResponse),
        (status = 500, description = "Encodage non supporté", body = ErrorResponse)
    )
)]
pub async fn get_lyrics(State(stage): State<Arc<Stage>>, Path(filename): Path<String>) -> Response {
    match stage.lyrics(&filename).await {
        Ok(content) => Json(LyricsResponse { content }).into_response(),
        Err(e) => map_error(e),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "stage",
    responses(
        (status = 200, description = "Serveur opérationnel", body = HealthResponse)
    )
)]
pub async fn health(State(stage): State<Arc<Stage>>) -> Json<HealthResponse> {
    use crate::registry::Role;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        admins: stage.connection_count(Role::Admin),
        displays: stage.connection_count(Role::Display),
    })
}

fn not_found(kind: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "NOT_FOUND".to_string(),
            message: format!("No {} with id {}", kind, id),
        }),
    )
        .into_response()
}

fn map_error(error: StageError) -> Response {
    let (status, code) = match &error {
        StageError::InvalidEntity { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        StageError::Catalog(CatalogError::DuplicateId { .. }) => (StatusCode::CONFLICT, "DUPLICATE_ID"),
        StageError::Catalog(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CATALOG_ERROR"),
        StageError::LyricsNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StageError::LyricsEncoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UNSUPPORTED_ENCODING"),
        StageError::LyricsIo { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
    };

    if status.is_server_error() {
        error!("Stage API error: {}", error);
    }

    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: error.to_string(),
        }),
    )
        .into_response()
}
