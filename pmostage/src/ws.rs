//! Endpoints WebSocket `/ws/admin` et `/ws/display`
//!
//! Une tâche par connexion. La boucle multiplexe la file sortante remplie
//! par la [`Stage`], les messages du client et le minuteur de ping. Toute
//! fin de boucle (fermeture, erreur, silence prolongé) retire la connexion
//! de son pool. Chaque écriture est bornée par `ping_timeout` : un pair qui
//! ne lit plus ne peut pas bloquer la boucle.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::registry::{ConnectionId, Role};
use crate::stage::Stage;

/// Paramètres de maintien de connexion
#[derive(Debug, Clone, Copy)]
pub struct KeepAlive {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(crate::config_ext::DEFAULT_PING_INTERVAL_SECS),
            ping_timeout: Duration::from_secs(crate::config_ext::DEFAULT_PING_TIMEOUT_SECS),
        }
    }
}

impl KeepAlive {
    pub fn from_config() -> anyhow::Result<Self> {
        use crate::config_ext::StageConfigExt;

        let config = pmoconfig::get_config();
        Ok(Self {
            ping_interval: config.get_ws_ping_interval()?,
            ping_timeout: config.get_ws_ping_timeout()?,
        })
    }
}

#[derive(Clone)]
struct WsState {
    stage: Arc<Stage>,
    keepalive: KeepAlive,
}

/// Router à monter sous `/ws`
pub fn create_ws_router(stage: Arc<Stage>, keepalive: KeepAlive) -> Router {
    Router::new()
        .route("/admin", get(admin_socket))
        .route("/display", get(display_socket))
        .with_state(WsState { stage, keepalive })
}

async fn admin_socket(ws: WebSocketUpgrade, State(state): State<WsState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Role::Admin))
}

async fn display_socket(ws: WebSocketUpgrade, State(state): State<WsState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Role::Display))
}

async fn handle_socket(mut socket: WebSocket, state: WsState, role: Role) {
    let WsState { stage, keepalive } = state;
    let (id, mut outbound) = stage.join(role);

    let mut ping = tokio::time::interval_at(
        Instant::now() + keepalive.ping_interval,
        keepalive.ping_interval,
    );
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                // File fermée : la connexion a été évincée
                let Some(text) = queued else { break };
                let frame = Message::Text(text.to_string().into());
                if !write_within(keepalive.ping_timeout, id, socket.send(frame)).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        match role {
                            Role::Admin => stage.handle_admin_text(id, text.as_str()),
                            Role::Display => stage.handle_display_text(id, text.as_str()),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        debug!(connection = %id, "Read failed: {}", e);
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if last_seen.elapsed() > keepalive.ping_timeout {
                    info!(connection = %id, role = %role, "Connection timed out");
                    break;
                }
                let frame = Message::Ping(Default::default());
                if !write_within(keepalive.ping_timeout, id, socket.send(frame)).await {
                    break;
                }
            }
        }
    }

    stage.leave(role, id);
}

/// Attend `write` au plus `limit` ; faux si l'écriture échoue ou stagne
async fn write_within<E, F>(limit: Duration, id: ConnectionId, write: F) -> bool
where
    E: fmt::Display,
    F: Future<Output = Result<(), E>>,
{
    match tokio::time::timeout(limit, write).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(connection = %id, "Write failed: {}", e);
            false
        }
        Err(_) => {
            info!(connection = %id, "Write stalled, closing connection");
            false
        }
    }
}
