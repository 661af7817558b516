use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Génère un identifiant court (8 caractères hexadécimaux)
pub fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Piste audio du catalogue
///
/// Immuable une fois créée ; `duration` (secondes) est purement informative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub url: String,
    pub cover_url: String,
    #[serde(default)]
    pub lyrics_url: Option<String>,
    #[serde(default)]
    pub duration: u32,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
        cover_url: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            cover_url: cover_url.into(),
            lyrics_url: None,
            duration: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_lyrics(mut self, lyrics_url: impl Into<String>) -> Self {
        self.lyrics_url = Some(lyrics_url.into());
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    /// URLs de fichiers référencées par cette piste
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        [Some(self.url.as_str()), Some(self.cover_url.as_str()), self.lyrics_url.as_deref()]
            .into_iter()
            .flatten()
    }
}

/// Slide HTML affichée en mode présentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct Slide {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl Slide {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            url: url.into(),
            thumbnail_url: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        [Some(self.url.as_str()), self.thumbnail_url.as_deref()]
            .into_iter()
            .flatten()
    }
}
