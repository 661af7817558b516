//! Fichiers de paroles (`.lrc`) déposés sous `<uploads>/lyrics`
//!
//! Les fichiers produits par les outils chinois sont souvent en GBK : ils
//! sont décodés côté serveur pour que les displays reçoivent de l'UTF-8.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use crate::error::StageError;

/// Texte UTF-8, à défaut GBK ; `None` si aucun des deux ne convient
pub fn decode(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_string());
    }
    let (text, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
    (!had_errors).then(|| text.into_owned())
}

/// Lit `dir/filename` ; `filename` doit être un simple nom de fichier
pub async fn read_lyrics(dir: &Path, filename: &str) -> Result<String, StageError> {
    let plain = Path::new(filename)
        .file_name()
        .is_some_and(|name| name == filename);
    if !plain {
        return Err(StageError::InvalidEntity {
            kind: "lyrics",
            reason: format!("{filename} is not a file name"),
        });
    }

    let bytes = match fs::read(dir.join(filename)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StageError::LyricsNotFound(filename.to_string()));
        }
        Err(source) => {
            return Err(StageError::LyricsIo {
                name: filename.to_string(),
                source,
            });
        }
    };

    decode(&bytes).ok_or_else(|| StageError::LyricsEncoding(filename.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_prefers_utf8() {
        assert_eq!(decode("[00:01.00]平安夜".as_bytes()).as_deref(), Some("[00:01.00]平安夜"));
    }

    #[test]
    fn test_decode_falls_back_to_gbk() {
        let (gbk, _, _) = encoding_rs::GBK.encode("[00:01.00]平安夜");
        assert!(std::str::from_utf8(&gbk).is_err());
        assert_eq!(decode(&gbk).as_deref(), Some("[00:01.00]平安夜"));
    }

    #[test]
    fn test_decode_rejects_undecodable_bytes() {
        assert_eq!(decode(&[0x81, 0x20, 0xff]), None);
    }

    #[tokio::test]
    async fn test_read_lyrics_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_lyrics(dir.path(), "../config.yaml").await.unwrap_err();
        assert!(matches!(err, StageError::InvalidEntity { kind: "lyrics", .. }));

        let err = read_lyrics(dir.path(), "missing.lrc").await.unwrap_err();
        assert!(matches!(err, StageError::LyricsNotFound(_)));
    }
}
