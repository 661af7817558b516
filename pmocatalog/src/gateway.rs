use async_trait::async_trait;

use crate::{CatalogError, Slide, Track};

/// Accès au catalogue durable
///
/// Les valeurs retournées font foi : un `remove_*` qui retourne `false`
/// signifie qu'aucune entrée n'a été supprimée, et l'appelant ne doit pas
/// répercuter la suppression sur son propre état.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Pistes dans l'ordre d'insertion
    async fn list_tracks(&self) -> Result<Vec<Track>, CatalogError>;

    /// Slides dans l'ordre d'insertion
    async fn list_slides(&self) -> Result<Vec<Slide>, CatalogError>;

    async fn add_track(&self, track: Track) -> Result<(), CatalogError>;

    async fn remove_track(&self, id: &str) -> Result<bool, CatalogError>;

    async fn add_slide(&self, slide: Slide) -> Result<(), CatalogError>;

    async fn remove_slide(&self, id: &str) -> Result<bool, CatalogError>;
}
