//! Le hub de la scène
//!
//! [`Stage`] possède l'état canonique et le registre des connexions derrière
//! un unique verrou. Chaque traitement verrouille, mute, puis dépose les
//! messages dérivés dans les files des destinataires sans jamais attendre :
//! tous les displays observent les messages dans l'ordre des commandes.
//! Les appels au catalogue sont faits avant de prendre le verrou. Les
//! mutations structurelles (ajout, suppression) sont sérialisées entre elles
//! pour que la playlist vivante garde l'ordre du catalogue.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use pmocatalog::{CatalogGateway, Slide, Track};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, info, warn};

use crate::broadcast::{broadcast, send_to};
use crate::error::{ProtocolError, StageError};
use crate::model::{NewSlide, NewTrack};
use crate::protocol::{AdminCommand, AdminMessage, DisplayReport, StageSnapshot, StateUpdate};
use crate::registry::{ConnectionId, ConnectionRegistry, Role};
use crate::resync::{admin_snapshot, display_snapshot};
use crate::router::{Dispatch, route};
use crate::state::{StateStore, wire_index};

pub const DEFAULT_VOLUME: u8 = 80;
pub const DEFAULT_ARTIST: &str = "Unknown artist";
pub const DEFAULT_COVER_URL: &str = "/uploads/covers/default-cover.jpg";
pub const DEFAULT_LYRICS_DIR: &str = "uploads/lyrics";

/// Réglages de construction d'une [`Stage`]
#[derive(Debug, Clone)]
pub struct StageOptions {
    pub default_volume: u8,
    pub default_cover_url: String,
    /// Répertoire lu par [`Stage::lyrics`]
    pub lyrics_dir: PathBuf,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            default_volume: DEFAULT_VOLUME,
            default_cover_url: DEFAULT_COVER_URL.to_string(),
            lyrics_dir: PathBuf::from(DEFAULT_LYRICS_DIR),
        }
    }
}

#[cfg(feature = "pmoconfig")]
impl StageOptions {
    /// Lit le volume initial, la pochette par défaut et le répertoire des
    /// paroles dans la configuration
    pub fn from_config() -> anyhow::Result<Self> {
        use crate::config_ext::StageConfigExt;
        use pmocatalog::CatalogConfigExt;

        let config = pmoconfig::get_config();
        Ok(Self {
            default_volume: config.get_default_volume()?,
            default_cover_url: config.get_default_cover_url()?,
            lyrics_dir: PathBuf::from(config.get_upload_dir()?).join("lyrics"),
        })
    }
}

struct Hub {
    store: StateStore,
    registry: ConnectionRegistry,
}

impl Hub {
    /// Retourne faux si la commande n'a produit aucun message
    fn dispatch(&mut self, dispatch: Dispatch) -> bool {
        if dispatch.is_empty() {
            return false;
        }
        for message in &dispatch.display {
            broadcast(&mut self.registry, Role::Display, message);
        }
        for message in &dispatch.admin {
            broadcast(&mut self.registry, Role::Admin, message);
        }
        true
    }

    fn reject(&mut self, to: ConnectionId, command: Option<&str>, reason: String) {
        send_to(
            &mut self.registry,
            Role::Admin,
            to,
            &AdminMessage::CommandRejected {
                command: command.map(str::to_string),
                reason,
            },
        );
    }

    fn publish_playlist(&mut self) {
        let playlist = AdminMessage::PlaylistUpdate {
            playlist: self.store.playlist().to_vec(),
        };
        let update = AdminMessage::StateUpdate(StateUpdate {
            current_track_index: Some(wire_index(self.store.current_track_index())),
            current_track: Some(self.store.current_track().cloned()),
            ..Default::default()
        });
        broadcast(&mut self.registry, Role::Admin, &playlist);
        broadcast(&mut self.registry, Role::Admin, &update);
    }

    fn publish_slides(&mut self) {
        let slides = AdminMessage::SlidesUpdate {
            slides: self.store.slides().to_vec(),
        };
        let update = AdminMessage::StateUpdate(StateUpdate {
            current_slide_index: Some(wire_index(self.store.current_slide_index())),
            current_slide: Some(self.store.current_slide().cloned()),
            ..Default::default()
        });
        broadcast(&mut self.registry, Role::Admin, &slides);
        broadcast(&mut self.registry, Role::Admin, &update);
    }
}

pub struct Stage {
    hub: Mutex<Hub>,
    /// Tenu du commit catalogue jusqu'à la publication
    structural: AsyncMutex<()>,
    catalog: Arc<dyn CatalogGateway>,
    default_cover_url: String,
    lyrics_dir: PathBuf,
}

impl Stage {
    /// Construit la scène à partir du contenu courant du catalogue
    pub async fn from_catalog(
        catalog: Arc<dyn CatalogGateway>,
        options: StageOptions,
    ) -> Result<Self, StageError> {
        let tracks = catalog.list_tracks().await?;
        let slides = catalog.list_slides().await?;

        info!(
            tracks = tracks.len(),
            slides = slides.len(),
            volume = options.default_volume,
            "Stage seeded from catalog"
        );

        Ok(Self {
            hub: Mutex::new(Hub {
                store: StateStore::new(tracks, slides, options.default_volume),
                registry: ConnectionRegistry::new(),
            }),
            structural: AsyncMutex::new(()),
            catalog,
            default_cover_url: options.default_cover_url,
            lyrics_dir: options.lyrics_dir,
        })
    }

    /// Inscrit une nouvelle connexion et lui envoie son instantané
    ///
    /// Retourne l'identifiant attribué et la file des messages sortants.
    pub fn join(&self, role: Role) -> (ConnectionId, mpsc::UnboundedReceiver<Arc<str>>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut hub = self.hub.lock();
        hub.registry.join(role, id, tx);
        let delivered = match role {
            Role::Admin => {
                let snapshot = admin_snapshot(&hub.store);
                send_to(&mut hub.registry, role, id, &snapshot)
            }
            Role::Display => {
                let snapshot = display_snapshot(&hub.store);
                send_to(&mut hub.registry, role, id, &snapshot)
            }
        };

        info!(
            connection = %id,
            role = %role,
            pool = hub.registry.len(role),
            resynced = delivered,
            "Connection joined"
        );
        (id, rx)
    }

    /// Retire une connexion de son pool ; sans effet si elle n'y est plus
    pub fn leave(&self, role: Role, id: ConnectionId) -> bool {
        let mut hub = self.hub.lock();
        let removed = hub.registry.leave(role, id);
        if removed {
            info!(connection = %id, role = %role, pool = hub.registry.len(role), "Connection left");
        }
        removed
    }

    pub fn connection_count(&self, role: Role) -> usize {
        self.hub.lock().registry.len(role)
    }

    /// Traite un message texte reçu d'un admin
    ///
    /// Un message illisible ou une commande refusée ne modifient rien et sont
    /// signalés uniquement à l'émetteur par `command_rejected`.
    pub fn handle_admin_text(&self, from: ConnectionId, text: &str) {
        let command = AdminCommand::parse(text);

        let mut hub = self.hub.lock();
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                warn!(connection = %from, "Malformed admin message: {}", e);
                hub.reject(from, e.command(), e.to_string());
                return;
            }
        };

        debug!(connection = %from, command = command.name(), "Admin command");
        match route(&mut hub.store, &command) {
            Ok(dispatch) => {
                if !hub.dispatch(dispatch) {
                    debug!(connection = %from, command = command.name(), "Command had no effect");
                }
            }
            Err(e) => {
                warn!(connection = %from, command = command.name(), "Command rejected: {}", e);
                hub.reject(from, Some(command.name()), e.to_string());
            }
        }
    }

    /// Traite un message texte reçu d'un display
    ///
    /// Seul `time_update` est reconnu ; il met à jour la position sans
    /// aucune diffusion.
    pub fn handle_display_text(&self, from: ConnectionId, text: &str) {
        match DisplayReport::parse(text) {
            Ok(DisplayReport::TimeUpdate { time }) => {
                self.hub.lock().store.report_display_time(time);
            }
            Err(ProtocolError::UnknownType(kind)) => {
                debug!(connection = %from, kind = %kind, "Ignoring display message");
            }
            Err(e) => {
                warn!(connection = %from, "Malformed display message: {}", e);
            }
        }
    }

    pub fn snapshot(&self) -> StageSnapshot {
        self.hub.lock().store.snapshot()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.hub.lock().store.playlist().to_vec()
    }

    pub fn slides(&self) -> Vec<Slide> {
        self.hub.lock().store.slides().to_vec()
    }

    /// Contenu d'un fichier de paroles, décodé en UTF-8
    pub async fn lyrics(&self, filename: &str) -> Result<String, StageError> {
        crate::lyrics::read_lyrics(&self.lyrics_dir, filename).await
    }

    /// Ajoute une piste : catalogue d'abord, état ensuite
    pub async fn add_track(&self, request: NewTrack) -> Result<Track, StageError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(invalid("track", "title is required"));
        }
        if request.url.trim().is_empty() {
            return Err(invalid("track", "url is required"));
        }

        let mut track = Track::new(
            title,
            request
                .artist
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
            request.url,
            request
                .cover_url
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| self.default_cover_url.clone()),
        )
        .with_duration(request.duration.unwrap_or(0));
        if let Some(lyrics) = request.lyrics_url {
            track = track.with_lyrics(lyrics);
        }

        let _structural = self.structural.lock().await;
        self.catalog.add_track(track.clone()).await?;

        let mut hub = self.hub.lock();
        let position = hub.store.add_track(track.clone());
        hub.publish_playlist();
        info!(track = %track.id, title = %track.title, position, "Track added");
        Ok(track)
    }

    /// Retire une piste si le catalogue confirme la suppression
    pub async fn remove_track(&self, id: &str) -> Result<bool, StageError> {
        let _structural = self.structural.lock().await;
        if !self.catalog.remove_track(id).await? {
            return Ok(false);
        }

        let mut hub = self.hub.lock();
        hub.store.remove_track(id);
        hub.publish_playlist();
        info!(track = id, "Track removed");
        Ok(true)
    }

    pub async fn add_slide(&self, request: NewSlide) -> Result<Slide, StageError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(invalid("slide", "name is required"));
        }
        if request.url.trim().is_empty() {
            return Err(invalid("slide", "url is required"));
        }

        let mut slide = Slide::new(name, request.url);
        if let Some(thumbnail) = request.thumbnail_url {
            slide = slide.with_thumbnail(thumbnail);
        }

        let _structural = self.structural.lock().await;
        self.catalog.add_slide(slide.clone()).await?;

        let mut hub = self.hub.lock();
        let position = hub.store.add_slide(slide.clone());
        hub.publish_slides();
        info!(slide = %slide.id, name = %slide.name, position, "Slide added");
        Ok(slide)
    }

    pub async fn remove_slide(&self, id: &str) -> Result<bool, StageError> {
        let _structural = self.structural.lock().await;
        if !self.catalog.remove_slide(id).await? {
            return Ok(false);
        }

        let mut hub = self.hub.lock();
        hub.store.remove_slide(id);
        hub.publish_slides();
        info!(slide = id, "Slide removed");
        Ok(true)
    }
}

fn invalid(kind: &'static str, reason: &str) -> StageError {
    StageError::InvalidEntity {
        kind,
        reason: reason.to_string(),
    }
}
