//! # pmoserver - Serveur HTTP commun de PMOStage
//!
//! Un seul [`Server`] Axum accueille toutes les routes : les crates métier
//! s'y greffent par des traits d'extension (`StageExt`, [`ConfigExt`]) qui
//! appellent [`Server::add_router`] ou [`Server::add_openapi`].
//!
//! - [`server`] : montage des routes, démarrage et arrêt
//! - [`logs`] : subscriber `tracing`, tampon `/log-dump` et flux `/log-sse`
//!
//! ```rust,no_run
//! use pmoserver::{Server, logs::LoggingOptions};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut server = Server::new("Demo", "localhost", 8080);
//!     server.init_logging(LoggingOptions::default()).await;
//!     server.add_route("/status", || async { serde_json::json!({"up": true}) }).await;
//!
//!     server.start().await?;
//!     server.wait().await;
//!     Ok(())
//! }
//! ```

mod config_ext;
pub mod logs;
pub mod server;

pub use config_ext::ConfigExt;
pub use logs::{LogState, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerBuilder, ServerInfo};
