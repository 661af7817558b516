use pmocatalog::{CatalogGateway, JsonCatalog, Slide, Track};
use tempfile::TempDir;

fn track(id: &str, url: &str) -> Track {
    Track::new(format!("Track {id}"), "Class 3", url, "/uploads/covers/default-cover.jpg")
        .with_id(id)
}

async fn open_catalog() -> (TempDir, JsonCatalog) {
    let temp_dir = tempfile::tempdir().unwrap();
    let catalog = JsonCatalog::open(temp_dir.path().join("data")).await.unwrap();
    (temp_dir, catalog)
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let (temp_dir, catalog) = open_catalog().await;
    catalog.add_track(track("a", "/uploads/music/a.mp3")).await.unwrap();
    catalog.add_track(track("b", "/uploads/music/b.mp3")).await.unwrap();
    catalog
        .add_slide(Slide::new("Opening", "/uploads/slides/open.html").with_id("s1"))
        .await
        .unwrap();
    drop(catalog);

    let reopened = JsonCatalog::open(temp_dir.path().join("data")).await.unwrap();
    let ids: Vec<_> = reopened
        .list_tracks()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(reopened.list_slides().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_is_persisted_and_reported() {
    let (temp_dir, catalog) = open_catalog().await;
    catalog.add_track(track("a", "/uploads/music/a.mp3")).await.unwrap();

    assert!(catalog.remove_track("a").await.unwrap());
    assert!(!catalog.remove_track("a").await.unwrap());

    let reopened = JsonCatalog::open(temp_dir.path().join("data")).await.unwrap();
    assert!(reopened.list_tracks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_database_loads_empty() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("music_database.json"), b"{ not json").unwrap();

    let catalog = JsonCatalog::open(&data_dir).await.unwrap();
    assert!(catalog.list_tracks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_media_drops_missing_uploads() {
    let (temp_dir, catalog) = open_catalog().await;
    let uploads = temp_dir.path().join("uploads");
    std::fs::create_dir_all(uploads.join("music")).unwrap();
    std::fs::create_dir_all(uploads.join("covers")).unwrap();
    std::fs::write(uploads.join("music/kept.mp3"), b"data").unwrap();
    std::fs::write(uploads.join("covers/default-cover.jpg"), b"jpg").unwrap();

    catalog.add_track(track("kept", "/uploads/music/kept.mp3")).await.unwrap();
    catalog.add_track(track("gone", "/uploads/music/gone.mp3")).await.unwrap();
    catalog
        .add_slide(Slide::new("Remote", "https://example.org/deck.html").with_id("r"))
        .await
        .unwrap();

    let (tracks, slides) = catalog.validate_media(&uploads).await.unwrap();
    assert_eq!((tracks, slides), (1, 0));

    let remaining = catalog.list_tracks().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "kept");
}

#[tokio::test]
async fn test_backup_copies_both_databases() {
    let (temp_dir, catalog) = open_catalog().await;
    catalog.add_track(track("a", "/uploads/music/a.mp3")).await.unwrap();
    catalog
        .add_slide(Slide::new("Deck", "/uploads/slides/deck.html"))
        .await
        .unwrap();

    let backups = catalog
        .backup(&temp_dir.path().join("backups"))
        .await
        .unwrap();

    assert_eq!(backups.len(), 2);
    for path in backups {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains("_backup_"));
        assert!(path.exists());
    }
}
