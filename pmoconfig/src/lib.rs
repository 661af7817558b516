//! # pmoconfig - Configuration YAML de PMOStage
//!
//! La configuration effective est construite ainsi :
//!
//! 1. YAML par défaut embarqué dans le binaire (`pmostage.yaml`)
//! 2. fusion du `config.yaml` de l'utilisateur, s'il existe
//! 3. surcharges `PMOSTAGE_CONFIG__SECTION__KEY=valeur`
//!
//! puis réécrite dans `config.yaml`, si bien que le fichier contient toujours
//! toutes les clés connues.
//!
//! Le répertoire de configuration est, dans l'ordre : l'argument explicite,
//! `$PMOSTAGE_CONFIG`, `./.pmostage`, `~/.pmostage`.
//!
//! Les crates qui ont leurs propres réglages étendent [`Config`] par un trait
//! `*ConfigExt` construit sur [`Config::get_value`] / [`Config::set_value`].
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let port = config.get_http_port();
//! config.set_http_port(port + 1)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_yaml::Value;
use tracing::{info, warn};

mod tree;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "api")]
pub mod openapi;

#[cfg(feature = "api")]
pub use openapi::ApiDoc;

const DEFAULT_CONFIG: &str = include_str!("pmostage.yaml");
const CONFIG_FILE: &str = "config.yaml";
const CONFIG_DIR_NAME: &str = ".pmostage";

const ENV_CONFIG_DIR: &str = "PMOSTAGE_CONFIG";
const ENV_PREFIX: &str = "PMOSTAGE_CONFIG__";

const DEFAULT_BASE_URL: &str = "localhost";
const DEFAULT_HTTP_PORT: u16 = 2427;
const DEFAULT_LOG_BUFFER_CAPACITY: usize = 1000;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load PMOStage configuration"));
}

/// Configuration partagée, protégée par un verrou et persistée à chaque écriture
#[derive(Debug)]
pub struct Config {
    directory: PathBuf,
    file: PathBuf,
    root: Mutex<Value>,
}

impl Config {
    /// Répertoire de configuration, créé si besoin et vérifié en écriture
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = locate_config_dir(directory);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create config directory {}", dir.display()))?;
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }

        let probe = dir.join(".write_test");
        fs::write(&probe, b"")
            .with_context(|| format!("Config directory {} is not writable", dir.display()))?;
        fs::remove_file(&probe)?;

        Ok(dir.to_string_lossy().into_owned())
    }

    /// Charge la configuration depuis `directory` (vide : recherche par défaut)
    pub fn load_config(directory: &str) -> Result<Self> {
        let directory = PathBuf::from(Self::config_dir(directory)?);
        let file = directory.join(CONFIG_FILE);

        let mut root: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        match fs::read_to_string(&file) {
            Ok(text) => {
                let user: Value = serde_yaml::from_str(&text)
                    .with_context(|| format!("Invalid YAML in {}", file.display()))?;
                tree::merge(&mut root, user);
                info!(config_file = %file.display(), "Loaded config file");
            }
            Err(_) => info!(config_file = %file.display(), "No config file, using embedded defaults"),
        }

        let mut root = tree::lowercase_keys(root);
        let overrides = tree::apply_overrides(&mut root, ENV_PREFIX, env::vars());
        if overrides > 0 {
            info!(count = overrides, "Applied environment overrides");
        }

        let config = Config {
            directory,
            file,
            root: Mutex::new(root),
        };
        config.save()?;
        Ok(config)
    }

    /// Répertoire d'où la configuration a été chargée
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn save(&self) -> Result<()> {
        let text = serde_yaml::to_string(&*self.root.lock())?;
        fs::write(&self.file, text)
            .with_context(|| format!("Cannot write {}", self.file.display()))?;
        Ok(())
    }

    /// Valeur brute au chemin donné (ex: `&["host", "http_port"]`)
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        tree::lookup(&self.root.lock(), path).cloned()
    }

    /// Écrit une valeur brute puis sauvegarde le fichier
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        tree::assign(&mut self.root.lock(), path, value)?;
        self.save()
    }

    /// Lit une valeur typée, ou `default` si elle est absente ou invalide
    pub fn get_or<T: DeserializeOwned>(&self, path: &[&str], default: T) -> T {
        let Ok(value) = self.get_value(path) else {
            return default;
        };
        match serde_yaml::from_value(value) {
            Ok(typed) => typed,
            Err(e) => {
                warn!(key = %path.join("."), "Invalid config value, using default: {}", e);
                default
            }
        }
    }

    /// Écrit une valeur typée puis sauvegarde le fichier
    pub fn set<T: Serialize>(&self, path: &[&str], value: T) -> Result<()> {
        self.set_value(path, serde_yaml::to_value(value)?)
    }

    /// Répertoire géré par la configuration, créé s'il n'existe pas
    ///
    /// Un chemin relatif est résolu par rapport au répertoire de
    /// configuration. Si la clé est absente, `default` y est enregistré.
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<String> {
        let configured = match self.get_value(path) {
            Ok(Value::String(dir)) if !dir.is_empty() => dir,
            _ => {
                self.set_managed_dir(path, default.to_string())?;
                default.to_string()
            }
        };

        let dir = self.directory.join(&configured);
        if !dir.exists() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Cannot create directory {}", dir.display()))?;
            info!(directory = %dir.display(), "Created managed directory");
        }
        Ok(dir.to_string_lossy().into_owned())
    }

    pub fn set_managed_dir(&self, path: &[&str], directory: String) -> Result<()> {
        self.set_value(path, Value::String(directory))
    }

    /// Nom d'hôte annoncé dans les logs de démarrage
    pub fn get_base_url(&self) -> String {
        let host: String = self.get_or(&["host", "base_url"], String::new());
        if host.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            host
        }
    }

    pub fn get_http_port(&self) -> u16 {
        self.get_or(&["host", "http_port"], DEFAULT_HTTP_PORT)
    }

    pub fn set_http_port(&self, port: u16) -> Result<()> {
        self.set(&["host", "http_port"], port)
    }

    /// Taille du tampon de logs exposé par `/log-dump` et `/log-sse`
    pub fn get_log_cache_size(&self) -> usize {
        self.get_or(&["host", "logger", "buffer_capacity"], DEFAULT_LOG_BUFFER_CAPACITY)
    }

    pub fn get_log_enable_console(&self) -> bool {
        self.get_or(&["host", "logger", "enable_console"], DEFAULT_LOG_ENABLE_CONSOLE)
    }

    pub fn get_log_min_level(&self) -> String {
        self.get_or(&["host", "logger", "min_level"], DEFAULT_LOG_MIN_LEVEL.to_string())
    }

    pub fn set_log_min_level(&self, level: &str) -> Result<()> {
        self.set(&["host", "logger", "min_level"], level)
    }
}

fn locate_config_dir(directory: &str) -> PathBuf {
    if !directory.is_empty() {
        return PathBuf::from(directory);
    }
    if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
        info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory from environment");
        return PathBuf::from(from_env);
    }

    let local = PathBuf::from(CONFIG_DIR_NAME);
    if local.exists() {
        return local;
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .filter(|dir| dir.exists())
        .unwrap_or(local)
}

/// Instance globale, chargée au premier accès
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_in(dir: &tempfile::TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_http_port(), 2427);
        assert_eq!(config.get_base_url(), "localhost");
        assert_eq!(config.get_log_min_level(), "INFO");
        assert!(config.get_log_enable_console());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "Host:\n  HTTP_Port: 9100\n").unwrap();

        let config = load_in(&dir);
        assert_eq!(config.get_http_port(), 9100);
        assert_eq!(config.get_log_cache_size(), 1000);
    }

    #[test]
    fn test_set_value_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        load_in(&dir).set_http_port(8181).unwrap();
        assert_eq!(load_in(&dir).get_http_port(), 8181);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config.set(&["host", "http_port"], 70000u32).unwrap();
        assert_eq!(config.get_http_port(), DEFAULT_HTTP_PORT);
    }

    #[test]
    fn test_managed_dir_is_created_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        let managed = config.get_managed_dir(&["catalog", "scratch"], "scratch").unwrap();
        assert!(Path::new(&managed).is_dir());
        assert_eq!(config.get_value(&["catalog", "scratch"]).unwrap(), Value::from("scratch"));
    }
}
