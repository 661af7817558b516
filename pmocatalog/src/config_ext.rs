//! Extension pour gérer la configuration du catalogue dans pmoconfig
//!
//! Clés utilisées :
//! - `catalog.directory` : répertoire des bases JSON
//! - `catalog.backup_directory` : répertoire des sauvegardes
//! - `catalog.upload_directory` : racine des fichiers servis sous `/uploads/`
//! - `catalog.default_cover_url` : pochette utilisée quand aucune n'est fournie

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;

pub const DEFAULT_CATALOG_DIR: &str = "data";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_COVER_URL: &str = "/uploads/covers/default-cover.jpg";

/// Trait d'extension pour la configuration du catalogue
///
/// Les répertoires sont résolus relativement au répertoire de configuration
/// et créés s'ils n'existent pas.
pub trait CatalogConfigExt {
    fn get_catalog_dir(&self) -> Result<String>;

    fn get_catalog_backup_dir(&self) -> Result<String>;

    fn get_upload_dir(&self) -> Result<String>;

    fn get_default_cover_url(&self) -> Result<String>;

    fn set_default_cover_url(&self, url: &str) -> Result<()>;
}

impl CatalogConfigExt for Config {
    fn get_catalog_dir(&self) -> Result<String> {
        self.get_managed_dir(&["catalog", "directory"], DEFAULT_CATALOG_DIR)
    }

    fn get_catalog_backup_dir(&self) -> Result<String> {
        self.get_managed_dir(&["catalog", "backup_directory"], DEFAULT_BACKUP_DIR)
    }

    fn get_upload_dir(&self) -> Result<String> {
        self.get_managed_dir(&["catalog", "upload_directory"], DEFAULT_UPLOAD_DIR)
    }

    fn get_default_cover_url(&self) -> Result<String> {
        match self.get_value(&["catalog", "default_cover_url"]) {
            Ok(Value::String(url)) if !url.is_empty() => Ok(url),
            _ => {
                self.set_default_cover_url(DEFAULT_COVER_URL)?;
                Ok(DEFAULT_COVER_URL.to_string())
            }
        }
    }

    fn set_default_cover_url(&self, url: &str) -> Result<()> {
        self.set_value(&["catalog", "default_cover_url"], Value::String(url.to_string()))
    }
}
