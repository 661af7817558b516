//! # pmostage - Synchronisation temps réel d'une scène
//!
//! Un contrôleur (« admin ») pilote en temps réel l'état de lecture et
//! d'affichage d'un nombre quelconque de clients passifs (« display »).
//! Le serveur tient l'unique état canonique ; chaque client qui rejoint est
//! resynchronisé avec un instantané, puis suit les diffusions.
//!
//! ## Architecture
//!
//! - [`StateStore`] : état canonique (mode, playlist, slides, transport, volume)
//! - [`ConnectionRegistry`] : pools disjoints de connexions admin et display
//! - [`router::route`] : commande admin → mutation → messages dérivés
//! - [`broadcast`] : diffusion au mieux, éviction des connexions mortes
//! - [`resync`] : instantané complet (admin) ou limité au mode (display)
//! - [`Stage`] : le hub qui assemble le tout derrière un seul verrou
//!
//! Avec la feature `pmoserver`, [`StageExt`] enregistre sur un
//! `pmoserver::Server` les WebSockets `/ws/admin` et `/ws/display` ainsi que
//! l'API REST `/api/stage`.
//!
//! ## Exemple
//!
//! ```no_run
//! use std::sync::Arc;
//! use pmocatalog::MemoryCatalog;
//! use pmostage::{Role, Stage, StageOptions};
//!
//! # async fn example() -> Result<(), pmostage::StageError> {
//! let stage = Stage::from_catalog(Arc::new(MemoryCatalog::new()), StageOptions::default()).await?;
//! let (admin, mut outbound) = stage.join(Role::Admin);
//!
//! // Le premier message est l'instantané complet
//! let snapshot = outbound.recv().await;
//! stage.handle_admin_text(admin, r#"{"type":"set_volume","data":{"volume":42}}"#);
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod error;
pub mod lyrics;
pub mod model;
pub mod protocol;
pub mod registry;
pub mod resync;
pub mod router;
pub mod stage;
pub mod state;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

#[cfg(feature = "pmoserver")]
pub mod api;
#[cfg(feature = "pmoserver")]
pub mod openapi;
#[cfg(feature = "pmoserver")]
pub mod pmoserver_ext;
#[cfg(feature = "pmoserver")]
pub mod ws;

pub use broadcast::Delivery;
pub use error::{ProtocolError, StageError, StateError};
pub use model::{Mode, NewSlide, NewTrack};
pub use protocol::{AdminCommand, AdminMessage, DisplayMessage, DisplayReport, StageSnapshot, StateUpdate};
pub use registry::{ConnectionId, ConnectionRegistry, Outbound, Role};
pub use stage::{Stage, StageOptions};
pub use state::{Direction, StateStore};

pub use pmocatalog::{Slide, Track};

#[cfg(feature = "pmoconfig")]
pub use config_ext::StageConfigExt;

#[cfg(feature = "pmoserver")]
pub use pmoserver_ext::StageExt;
