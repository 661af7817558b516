//! Types métier propres à la scène

use serde::{Deserialize, Serialize};

/// Ce que les displays affichent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub enum Mode {
    #[default]
    Music,
    Slide,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Music => f.write_str("music"),
            Mode::Slide => f.write_str("slide"),
        }
    }
}

/// Requête d'ajout d'une piste
///
/// Seuls `title` et `url` sont obligatoires ; l'artiste et la pochette
/// prennent des valeurs par défaut.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct NewTrack {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    pub url: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub lyrics_url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Requête d'ajout d'une slide
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct NewSlide {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}
