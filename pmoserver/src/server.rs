//! Serveur HTTP unique de PMOStage
//!
//! Chaque crate monte ses routes sur le [`Server`] avant [`Server::start`] :
//! l'API REST de la scène, les WebSockets, la configuration et les logs
//! partagent le même port.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::logs::{self, LogState, LoggingOptions, LogsApiDoc};

const CONFIGURED_NAME: &str = "PMOStage-Server";

/// Identité du serveur, exposée telle quelle par `/info`
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ServerInfo {
    pub name: String,
    pub base_url: String,
    pub http_port: u16,
}

pub struct Server {
    info: ServerInfo,
    routes: RwLock<Router>,
    task: Option<JoinHandle<()>>,
    log_state: Option<LogState>,
}

impl Server {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                base_url: base_url.into(),
                http_port,
            },
            routes: RwLock::new(Router::new()),
            task: None,
            log_state: None,
        }
    }

    /// Hôte et port lus dans la section `host` de la configuration
    pub fn new_configured() -> Self {
        ServerBuilder::new_configured().build()
    }

    async fn attach(&self, path: &str, router: Router) {
        let mut routes = self.routes.write().await;
        let current = std::mem::take(&mut *routes);
        *routes = match path.trim_matches('/') {
            "" => current.merge(router),
            prefix => current.nest(&format!("/{}", prefix), router),
        };
    }

    /// Route GET renvoyant en JSON le résultat de `f`
    pub async fn add_route<F, Fut, T>(&mut self, path: &str, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let f = Arc::new(f);
        let handler = move || {
            let f = Arc::clone(&f);
            async move { Json(f().await) }
        };
        self.attach(path, Router::new().route("/", get(handler))).await;
    }

    /// Route GET dont le handler reçoit `state`
    pub async fn add_handler_with_state<H, T, S>(&mut self, path: &str, handler: H, state: S)
    where
        H: Handler<T, S> + Clone + 'static,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        let router = Router::new().route("/", get(handler)).with_state(state);
        self.attach(path, router).await;
    }

    /// Monte `router` sous `path`, ou à la racine si `path` vaut `/`
    pub async fn add_router(&mut self, path: &str, router: Router) {
        self.attach(path, router).await;
    }

    /// Monte une API documentée
    ///
    /// Routes sous `/api/{name}`, Swagger UI sous `/swagger-ui/{name}`,
    /// document OpenAPI sous `/api-docs/{name}.json`.
    pub async fn add_openapi(&mut self, api: Router, openapi: utoipa::openapi::OpenApi, name: &str) {
        // SwaggerUi exige des chemins 'static ; une fuite par API montée
        let ui_path: &'static str = Box::leak(format!("/swagger-ui/{}", name).into_boxed_str());
        let doc_path: &'static str = Box::leak(format!("/api-docs/{}.json", name).into_boxed_str());

        self.attach(&format!("/api/{}", name), api).await;
        self.attach("/", SwaggerUi::new(ui_path).url(doc_path, openapi).into())
            .await;
    }

    /// Installe le logging et monte `/log-sse`, `/log-dump` et `/api/logs`
    pub async fn init_logging(&mut self, options: LoggingOptions) {
        let state = logs::init_logging(options);

        self.add_handler_with_state("/log-sse", logs::log_sse, state.clone())
            .await;
        self.add_handler_with_state("/log-dump", logs::log_dump, state.clone())
            .await;
        self.add_openapi(logs::create_logs_router(state.clone()), LogsApiDoc::openapi(), "logs")
            .await;

        self.log_state = Some(state);
    }

    pub fn log_state(&self) -> Option<&LogState> {
        self.log_state.as_ref()
    }

    pub fn info(&self) -> ServerInfo {
        self.info.clone()
    }

    /// Ouvre le port puis sert les routes dans une tâche de fond
    ///
    /// L'erreur de `bind` est remontée ; Ctrl+C déclenche un arrêt gracieux.
    pub async fn start(&mut self) -> std::io::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.info.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let app = self.routes.read().await.clone();

        info!(
            name = %self.info.name,
            "Listening on http://{}:{}",
            self.info.base_url, self.info.http_port
        );

        self.task = Some(tokio::spawn(async move {
            let served = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(ctrl_c())
                .await;
            if let Err(e) = served {
                error!("HTTP server stopped: {}", e);
            }
        }));
        Ok(())
    }

    /// Attend l'arrêt du serveur lancé par [`Server::start`]
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("HTTP server task failed: {}", e);
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn router(&self) -> Router {
        self.routes.read().await.clone()
    }
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C received, shutting down"),
        Err(e) => {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub struct ServerBuilder {
    name: String,
    base_url: String,
    http_port: u16,
}

impl ServerBuilder {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, http_port: u16) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            http_port,
        }
    }

    pub fn new_configured() -> Self {
        let config = pmoconfig::get_config();
        Self::new(CONFIGURED_NAME, config.get_base_url(), config.get_http_port())
    }

    pub fn build(self) -> Server {
        Server::new(self.name, self.base_url, self.http_port)
    }
}
