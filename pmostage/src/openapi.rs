//! Documentation OpenAPI de l'API de la scène

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::get_state,
        crate::api::list_tracks,
        crate::api::add_track,
        crate::api::remove_track,
        crate::api::list_slides,
        crate::api::add_slide,
        crate::api::remove_slide,
        crate::api::get_lyrics,
        crate::api::health,
    ),
    components(
        schemas(
            crate::protocol::StageSnapshot,
            crate::model::Mode,
            crate::model::NewTrack,
            crate::model::NewSlide,
            crate::api::ErrorResponse,
            crate::api::HealthResponse,
            crate::api::LyricsResponse,
            pmocatalog::Track,
            pmocatalog::Slide,
        )
    ),
    tags(
        (name = "stage", description = "État de la scène, playlist et slides")
    ),
    info(
        title = "PMOStage API",
        version = "0.1.0",
        description = r#"
# Pilotage de la scène

Le pilotage temps réel passe par les WebSockets :
- `/ws/admin` : commandes (`play_music`, `next_track`, `switch_mode`...) et `state_update`
- `/ws/display` : messages de rendu et rapports `time_update`

Cette API expose l'état courant et la gestion du catalogue. Chaque ajout ou
suppression est répercuté aux admins connectés (`playlist_update` /
`slides_update` puis `state_update`).
        "#,
        license(
            name = "MIT",
        ),
    )
)]
pub struct ApiDoc;
