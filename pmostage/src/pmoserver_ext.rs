//! Extension pmoserver pour la scène
//!
//! Enregistre sur un `pmoserver::Server` les WebSockets et l'API REST.

use std::sync::Arc;

use tracing::info;
use utoipa::OpenApi;

use crate::api::create_router;
use crate::openapi::ApiDoc;
use crate::stage::Stage;
use crate::ws::{KeepAlive, create_ws_router};

/// Trait d'extension pour pmoserver::Server
pub trait StageExt {
    /// Initialise les routes de la scène
    ///
    /// # Routes créées
    ///
    /// - WebSocket : `/ws/admin`, `/ws/display`
    /// - API : `/api/stage/*`
    ///   - `/state`
    ///   - `/tracks`, `/tracks/{id}`
    ///   - `/slides`, `/slides/{id}`
    ///   - `/lyrics/{filename}`
    ///   - `/health`
    /// - Swagger : `/swagger-ui/stage`
    async fn init_stage(&mut self, stage: Arc<Stage>) -> anyhow::Result<()>;
}

impl StageExt for pmoserver::Server {
    async fn init_stage(&mut self, stage: Arc<Stage>) -> anyhow::Result<()> {
        let keepalive = KeepAlive::from_config()?;
        info!(
            ping_interval = ?keepalive.ping_interval,
            ping_timeout = ?keepalive.ping_timeout,
            "Registering stage WebSocket endpoints"
        );

        self.add_router("/ws", create_ws_router(stage.clone(), keepalive))
            .await;
        self.add_openapi(create_router(stage), ApiDoc::openapi(), "stage")
            .await;

        Ok(())
    }
}
