use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CatalogError, CatalogGateway, Slide, Track};

/// Catalogue en mémoire, perdu à l'arrêt du processus
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tracks: RwLock<Vec<Track>>,
    slides: RwLock<Vec<Slide>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue pré-rempli, dans l'ordre donné
    pub fn with_entries(tracks: Vec<Track>, slides: Vec<Slide>) -> Self {
        Self {
            tracks: RwLock::new(tracks),
            slides: RwLock::new(slides),
        }
    }
}

#[async_trait]
impl CatalogGateway for MemoryCatalog {
    async fn list_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        Ok(self.tracks.read().await.clone())
    }

    async fn list_slides(&self) -> Result<Vec<Slide>, CatalogError> {
        Ok(self.slides.read().await.clone())
    }

    async fn add_track(&self, track: Track) -> Result<(), CatalogError> {
        let mut tracks = self.tracks.write().await;
        if tracks.iter().any(|t| t.id == track.id) {
            return Err(CatalogError::duplicate_track(&track.id));
        }
        tracks.push(track);
        Ok(())
    }

    async fn remove_track(&self, id: &str) -> Result<bool, CatalogError> {
        let mut tracks = self.tracks.write().await;
        let before = tracks.len();
        tracks.retain(|t| t.id != id);
        Ok(tracks.len() < before)
    }

    async fn add_slide(&self, slide: Slide) -> Result<(), CatalogError> {
        let mut slides = self.slides.write().await;
        if slides.iter().any(|s| s.id == slide.id) {
            return Err(CatalogError::duplicate_slide(&slide.id));
        }
        slides.push(slide);
        Ok(())
    }

    async fn remove_slide(&self, id: &str) -> Result<bool, CatalogError> {
        let mut slides = self.slides.write().await;
        let before = slides.len();
        slides.retain(|s| s.id != id);
        Ok(slides.len() < before)
    }
}
