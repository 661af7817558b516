//! Catalogue persistant au format JSON
//!
//! Deux fichiers dans le répertoire de données :
//! - `music_database.json` : tableau des pistes
//! - `slides_database.json` : tableau des slides
//!
//! Chaque mutation réécrit le fichier concerné. Si l'écriture échoue, la
//! mutation est annulée en mémoire et l'erreur remonte à l'appelant.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, warn};

use crate::{CatalogError, CatalogGateway, Slide, Track};

const MUSIC_DATABASE: &str = "music_database.json";
const SLIDES_DATABASE: &str = "slides_database.json";
const UPLOADS_PREFIX: &str = "/uploads/";

/// Entrée persistée : l'entité et sa date d'ajout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record<T> {
    #[serde(flatten)]
    item: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl<T> Record<T> {
    fn now(item: T) -> Self {
        Self {
            item,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JsonCatalog {
    directory: PathBuf,
    tracks: Mutex<Vec<Record<Track>>>,
    slides: Mutex<Vec<Record<Slide>>>,
}

impl JsonCatalog {
    /// Ouvre (ou crée) le catalogue dans `directory`
    ///
    /// Un fichier absent donne une liste vide. Un fichier illisible ou
    /// corrompu est journalisé et traité comme vide.
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)
            .await
            .map_err(|e| CatalogError::io(&directory, e))?;

        let tracks: Vec<Record<Track>> = load_database(&directory.join(MUSIC_DATABASE)).await;
        let slides: Vec<Record<Slide>> = load_database(&directory.join(SLIDES_DATABASE)).await;

        info!(
            directory = %directory.display(),
            tracks = tracks.len(),
            slides = slides.len(),
            "JSON catalog loaded"
        );

        Ok(Self {
            directory,
            tracks: Mutex::new(tracks),
            slides: Mutex::new(slides),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn music_path(&self) -> PathBuf {
        self.directory.join(MUSIC_DATABASE)
    }

    fn slides_path(&self) -> PathBuf {
        self.directory.join(SLIDES_DATABASE)
    }

    /// Retire les entrées dont un fichier `/uploads/...` a disparu
    ///
    /// Les URLs hors de `/uploads/` ne sont pas vérifiées. Retourne le nombre
    /// de pistes et de slides retirées ; les bases modifiées sont réécrites.
    pub async fn validate_media(&self, upload_root: &Path) -> Result<(usize, usize), CatalogError> {
        let dropped_tracks = {
            let mut tracks = self.tracks.lock().await;
            let before = tracks.len();
            tracks.retain(|record| {
                let missing = record
                    .item
                    .media_urls()
                    .find(|url| !upload_exists(upload_root, url));
                if let Some(url) = missing {
                    warn!(track = %record.item.id, title = %record.item.title, url, "Media file missing, dropping track");
                }
                missing.is_none()
            });
            let dropped = before - tracks.len();
            if dropped > 0 {
                save_database(&self.music_path(), &tracks).await?;
            }
            dropped
        };

        let dropped_slides = {
            let mut slides = self.slides.lock().await;
            let before = slides.len();
            slides.retain(|record| {
                let missing = record
                    .item
                    .media_urls()
                    .find(|url| !upload_exists(upload_root, url));
                if let Some(url) = missing {
                    warn!(slide = %record.item.id, name = %record.item.name, url, "Media file missing, dropping slide");
                }
                missing.is_none()
            });
            let dropped = before - slides.len();
            if dropped > 0 {
                save_database(&self.slides_path(), &slides).await?;
            }
            dropped
        };

        Ok((dropped_tracks, dropped_slides))
    }

    /// Copie les deux bases dans `backup_dir`
    ///
    /// Les fichiers sont nommés `<base>_backup_<YYYYmmdd_HHMMSS>.json`.
    /// Retourne les chemins créés.
    pub async fn backup(&self, backup_dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
        fs::create_dir_all(backup_dir)
            .await
            .map_err(|e| CatalogError::io(backup_dir, e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut created = Vec::new();

        // Verrous tenus pendant la copie pour un instantané cohérent
        let _tracks = self.tracks.lock().await;
        let _slides = self.slides.lock().await;

        for (source, stem) in [
            (self.music_path(), "music_database"),
            (self.slides_path(), "slides_database"),
        ] {
            if !fs::try_exists(&source).await.unwrap_or(false) {
                continue;
            }
            let target = backup_dir.join(format!("{stem}_backup_{timestamp}.json"));
            fs::copy(&source, &target)
                .await
                .map_err(|e| CatalogError::io(&target, e))?;
            info!(backup = %target.display(), "Catalog database backed up");
            created.push(target);
        }

        Ok(created)
    }
}

#[async_trait]
impl CatalogGateway for JsonCatalog {
    async fn list_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let tracks = self.tracks.lock().await;
        Ok(tracks.iter().map(|r| r.item.clone()).collect())
    }

    async fn list_slides(&self) -> Result<Vec<Slide>, CatalogError> {
        let slides = self.slides.lock().await;
        Ok(slides.iter().map(|r| r.item.clone()).collect())
    }

    async fn add_track(&self, track: Track) -> Result<(), CatalogError> {
        let mut tracks = self.tracks.lock().await;
        if tracks.iter().any(|r| r.item.id == track.id) {
            return Err(CatalogError::duplicate_track(&track.id));
        }

        let title = track.title.clone();
        tracks.push(Record::now(track));
        if let Err(e) = save_database(&self.music_path(), &tracks).await {
            tracks.pop();
            return Err(e);
        }

        info!(title = %title, "Track added to catalog");
        Ok(())
    }

    async fn remove_track(&self, id: &str) -> Result<bool, CatalogError> {
        let mut tracks = self.tracks.lock().await;
        let Some(position) = tracks.iter().position(|r| r.item.id == id) else {
            return Ok(false);
        };

        let removed = tracks.remove(position);
        if let Err(e) = save_database(&self.music_path(), &tracks).await {
            tracks.insert(position, removed);
            return Err(e);
        }

        info!(track = id, "Track removed from catalog");
        Ok(true)
    }

    async fn add_slide(&self, slide: Slide) -> Result<(), CatalogError> {
        let mut slides = self.slides.lock().await;
        if slides.iter().any(|r| r.item.id == slide.id) {
            return Err(CatalogError::duplicate_slide(&slide.id));
        }

        let name = slide.name.clone();
        slides.push(Record::now(slide));
        if let Err(e) = save_database(&self.slides_path(), &slides).await {
            slides.pop();
            return Err(e);
        }

        info!(name = %name, "Slide added to catalog");
        Ok(())
    }

    async fn remove_slide(&self, id: &str) -> Result<bool, CatalogError> {
        let mut slides = self.slides.lock().await;
        let Some(position) = slides.iter().position(|r| r.item.id == id) else {
            return Ok(false);
        };

        let removed = slides.remove(position);
        if let Err(e) = save_database(&self.slides_path(), &slides).await {
            slides.insert(position, removed);
            return Err(e);
        }

        info!(slide = id, "Slide removed from catalog");
        Ok(true)
    }
}

async fn load_database<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let data = match fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            error!(path = %path.display(), "Failed to read catalog database: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_slice(&data) {
        Ok(records) => records,
        Err(e) => {
            error!(path = %path.display(), "Failed to parse catalog database: {}", e);
            Vec::new()
        }
    }
}

async fn save_database<T: Serialize>(path: &Path, records: &[T]) -> Result<(), CatalogError> {
    let json = serde_json::to_vec_pretty(records)?;

    // Écriture dans un fichier temporaire puis renommage
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .await
        .map_err(|e| CatalogError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| CatalogError::io(path, e))?;

    debug!(path = %path.display(), "Catalog database saved");
    Ok(())
}

/// `true` si l'URL n'est pas gérée localement ou si le fichier existe
fn upload_exists(upload_root: &Path, url: &str) -> bool {
    match url.strip_prefix(UPLOADS_PREFIX) {
        Some(relative) => upload_root.join(relative).exists(),
        None => true,
    }
}
