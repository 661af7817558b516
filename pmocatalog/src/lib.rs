//! # pmocatalog - Catalogue durable des pistes et des slides
//!
//! Le catalogue est la source de vérité pour l'identité des [`Track`] et des
//! [`Slide`]. L'état de lecture de `pmostage` est reconstruit à partir de lui
//! au démarrage puis tenu à jour via [`CatalogGateway`].
//!
//! ## Implémentations
//!
//! - [`MemoryCatalog`] : vecteurs ordonnés en mémoire (tests, démos)
//! - [`JsonCatalog`] : `music_database.json` et `slides_database.json`
//!   dans un répertoire de données, avec validation des médias et sauvegardes
//!
//! ## Exemple
//!
//! ```no_run
//! use pmocatalog::{CatalogGateway, JsonCatalog, Track};
//!
//! # async fn example() -> Result<(), pmocatalog::CatalogError> {
//! let catalog = JsonCatalog::open("data").await?;
//! catalog
//!     .add_track(Track::new("Auld Lang Syne", "Choir", "/uploads/music/a.mp3", "/uploads/covers/default-cover.jpg"))
//!     .await?;
//! println!("{} track(s)", catalog.list_tracks().await?.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;
mod json;
mod memory;
mod model;

#[cfg(feature = "pmoconfig")]
mod config_ext;

pub use error::CatalogError;
pub use gateway::CatalogGateway;
pub use json::JsonCatalog;
pub use memory::MemoryCatalog;
pub use model::{Slide, Track, new_id};

#[cfg(feature = "pmoconfig")]
pub use config_ext::CatalogConfigExt;
