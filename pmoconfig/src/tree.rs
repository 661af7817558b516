//! Opérations sur l'arbre YAML de configuration
//!
//! Les clés sont toujours comparées en minuscules.

use anyhow::{Result, bail};
use serde_yaml::{Mapping, Value};

/// Lit la valeur au chemin `path`
pub(crate) fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut node = root;
    for (depth, key) in path.iter().enumerate() {
        let Value::Mapping(map) = node else {
            bail!("{} is not a section", path[..depth].join("."));
        };
        match map.get(key.to_lowercase().as_str()) {
            Some(child) => node = child,
            None => bail!("Path {} does not exist", path[..=depth].join(".")),
        }
    }
    Ok(node)
}

/// Écrit `value` au chemin `path`, en créant les sections manquantes
pub(crate) fn assign(root: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for key in parents {
        let Value::Mapping(map) = node else {
            bail!("Cannot descend into {}: not a section", key);
        };
        node = map
            .entry(Value::String(key.to_lowercase()))
            .or_insert(Value::Mapping(Mapping::new()));
    }

    match node {
        Value::Mapping(map) => {
            map.insert(Value::String(last.to_lowercase()), value);
            Ok(())
        }
        _ => bail!("Cannot set {}: parent is not a section", path.join(".")),
    }
}

/// Fusionne `overlay` dans `base` ; les feuilles d'`overlay` l'emportent
pub(crate) fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Passe récursivement toutes les clés textuelles en minuscules
pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, child)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_keys(child))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Applique les variables `<prefix>SECTION__KEY=valeur`
///
/// La valeur est interprétée comme un scalaire YAML (`8080`, `true`...),
/// à défaut comme une chaîne. Retourne le nombre de surcharges appliquées.
pub(crate) fn apply_overrides<I>(root: &mut Value, prefix: &str, vars: I) -> usize
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut applied = 0;
    for (name, raw) in vars {
        let Some(stripped) = name.strip_prefix(prefix) else {
            continue;
        };
        let path: Vec<&str> = stripped.split("__").collect();
        let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw));
        match assign(root, &path, value) {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!(variable = %name, "Ignoring config override: {}", e),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_keeps_siblings() {
        let mut base = yaml("a:\n  b: 1\n  c: 2\n");
        merge(&mut base, yaml("a:\n  b: 5\nd: x\n"));

        assert_eq!(lookup(&base, &["a", "b"]).unwrap(), &Value::from(5));
        assert_eq!(lookup(&base, &["a", "c"]).unwrap(), &Value::from(2));
        assert_eq!(lookup(&base, &["d"]).unwrap(), &Value::from("x"));
    }

    #[test]
    fn test_assign_creates_sections() {
        let mut root = Value::Mapping(Mapping::new());
        assign(&mut root, &["Stage", "WebSocket", "ping_interval"], Value::from(10)).unwrap();
        assert_eq!(
            lookup(&root, &["stage", "websocket", "ping_interval"]).unwrap(),
            &Value::from(10)
        );

        assert!(assign(&mut root, &["stage", "websocket", "ping_interval", "x"], Value::Null).is_err());
    }

    #[test]
    fn test_lookup_reports_missing_path() {
        let root = yaml("host:\n  http_port: 2427\n");
        let err = lookup(&root, &["host", "missing"]).unwrap_err();
        assert!(err.to_string().contains("host.missing"));
    }

    #[test]
    fn test_overrides_parse_scalars() {
        let mut root = yaml("host:\n  http_port: 2427\n");
        let vars = vec![
            ("PMO__HOST__HTTP_PORT".to_string(), "9000".to_string()),
            ("PMO__STAGE__NAME".to_string(), "main hall".to_string()),
            ("UNRELATED".to_string(), "1".to_string()),
        ];

        assert_eq!(apply_overrides(&mut root, "PMO__", vars), 2);
        assert_eq!(lookup(&root, &["host", "http_port"]).unwrap(), &Value::from(9000));
        assert_eq!(lookup(&root, &["stage", "name"]).unwrap(), &Value::from("main hall"));
    }

    #[test]
    fn test_lowercase_keys_is_recursive() {
        let value = lowercase_keys(yaml("Host:\n  HTTP_Port: 1\n"));
        assert!(lookup(&value, &["host", "http_port"]).is_ok());
    }
}
