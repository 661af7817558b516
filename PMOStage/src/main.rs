use std::path::Path;
use std::sync::Arc;

use axum::Router;
use pmocatalog::{CatalogConfigExt, JsonCatalog};
use pmoconfig::get_config;
use pmoserver::{ConfigExt, Server, logs::LoggingOptions};
use pmostage::{Stage, StageExt, StageOptions};
use tower_http::services::ServeDir;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_config();

    // ========== PHASE 1 : Serveur et logs ==========
    let mut server = Server::new_configured();
    server.init_logging(LoggingOptions::from_config()).await;
    server
        .add_route("/info", || async {
            serde_json::json!({"name": "PMOStage", "version": env!("CARGO_PKG_VERSION")})
        })
        .await;
    server.init_config_api().await;

    // ========== PHASE 2 : Catalogue ==========
    info!("📚 Opening catalog...");
    let catalog = JsonCatalog::open(config.get_catalog_dir()?).await?;

    // `PMOStage --backup` : sauvegarde des bases puis sortie
    if std::env::args().any(|arg| arg == "--backup") {
        let backups = catalog
            .backup(Path::new(&config.get_catalog_backup_dir()?))
            .await?;
        info!("✅ {} database file(s) backed up", backups.len());
        return Ok(());
    }

    let upload_dir = config.get_upload_dir()?;
    let (dropped_tracks, dropped_slides) = catalog.validate_media(Path::new(&upload_dir)).await?;
    if dropped_tracks + dropped_slides > 0 {
        warn!(
            "⚠️ Dropped {} track(s) and {} slide(s) with missing media",
            dropped_tracks, dropped_slides
        );
    }

    // ========== PHASE 3 : Scène ==========
    info!("🎭 Building stage...");
    let stage = Stage::from_catalog(Arc::new(catalog), StageOptions::from_config()?).await?;
    server.init_stage(Arc::new(stage)).await?;

    server
        .add_router(
            "/uploads",
            Router::new().fallback_service(ServeDir::new(&upload_dir)),
        )
        .await;

    // ========== PHASE 4 : Démarrage du serveur ==========
    info!("🌐 Starting HTTP server...");
    server.start().await?;

    info!("✅ PMOStage is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
