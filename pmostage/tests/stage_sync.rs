use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pmocatalog::{CatalogError, CatalogGateway, MemoryCatalog, Slide, Track};
use pmostage::{ConnectionId, NewSlide, NewTrack, Role, Stage, StageError, StageOptions};
use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedReceiver;

type Rx = UnboundedReceiver<Arc<str>>;

fn track(id: &str) -> Track {
    Track::new(id.to_uppercase(), "Choir", format!("/uploads/music/{id}.mp3"), "/uploads/covers/default-cover.jpg")
        .with_id(id)
}

fn slide(id: &str) -> Slide {
    Slide::new(id.to_uppercase(), format!("/uploads/slides/{id}.html")).with_id(id)
}

async fn stage_with(tracks: &[&str], slides: &[&str]) -> Stage {
    let catalog = MemoryCatalog::with_entries(
        tracks.iter().map(|id| track(id)).collect(),
        slides.iter().map(|id| slide(id)).collect(),
    );
    Stage::from_catalog(Arc::new(catalog), StageOptions::default())
        .await
        .unwrap()
}

/// Rejoint et consomme l'instantané initial
fn join(stage: &Stage, role: Role) -> (ConnectionId, Rx) {
    let (id, mut rx) = stage.join(role);
    rx.try_recv().expect("join snapshot");
    (id, rx)
}

fn next(rx: &mut Rx) -> Value {
    serde_json::from_str(&rx.try_recv().expect("pending message")).unwrap()
}

fn drain(rx: &mut Rx) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(text) = rx.try_recv() {
        messages.push(serde_json::from_str(&text).unwrap());
    }
    messages
}

#[tokio::test]
async fn test_select_track_on_empty_playlist_changes_nothing() {
    let stage = stage_with(&[], &[]).await;
    let (admin, mut admin_rx) = join(&stage, Role::Admin);
    let (_display, mut display_rx) = join(&stage, Role::Display);
    let before = stage.snapshot();

    stage.handle_admin_text(admin, r#"{"type":"select_track","data":{"index":0}}"#);

    assert_eq!(stage.snapshot(), before);
    assert!(drain(&mut display_rx).is_empty());

    // Seul l'émetteur est informé du refus
    let reply = drain(&mut admin_rx);
    assert_eq!(reply.len(), 1);
    assert_eq!(reply[0]["type"], "command_rejected");
    assert_eq!(reply[0]["data"]["command"], "select_track");
}

#[tokio::test]
async fn test_next_track_wraps_to_first_and_plays() {
    let stage = stage_with(&["a", "b", "c"], &[]).await;
    let (admin, mut admin_rx) = join(&stage, Role::Admin);
    let (_display, mut display_rx) = join(&stage, Role::Display);

    stage.handle_admin_text(admin, r#"{"type":"select_track","data":{"index":2}}"#);
    drain(&mut admin_rx);
    drain(&mut display_rx);

    stage.handle_admin_text(admin, r#"{"type":"next_track"}"#);

    let snapshot = stage.snapshot();
    assert_eq!(snapshot.current_track_index, 0);
    assert_eq!(snapshot.current_track.as_ref().map(|t| t.id.as_str()), Some("a"));
    assert!(snapshot.is_playing);

    let message = next(&mut display_rx);
    assert_eq!(message["type"], "track_change");
    assert_eq!(message["data"]["track"]["id"], "a");
    assert_eq!(message["data"]["play"], true);

    let update = next(&mut admin_rx);
    assert_eq!(update["type"], "state_update");
    assert_eq!(update["data"]["current_track_index"], 0);
    assert_eq!(update["data"]["is_playing"], true);
}

#[tokio::test]
async fn test_prev_track_wraps_to_last() {
    let stage = stage_with(&["a", "b", "c"], &[]).await;
    let (admin, _admin_rx) = join(&stage, Role::Admin);

    stage.handle_admin_text(admin, r#"{"type":"prev_track"}"#);
    assert_eq!(stage.snapshot().current_track_index, 2);
}

#[tokio::test]
async fn test_removing_only_track_clears_current() {
    let stage = stage_with(&["solo"], &[]).await;
    let (_admin, mut admin_rx) = join(&stage, Role::Admin);

    assert!(stage.remove_track("solo").await.unwrap());

    let snapshot = stage.snapshot();
    assert_eq!(snapshot.current_track_index, -1);
    assert!(snapshot.current_track.is_none());
    assert!(snapshot.playlist.is_empty());

    let messages = drain(&mut admin_rx);
    assert_eq!(messages[0], json!({"type": "playlist_update", "data": {"playlist": []}}));
    assert_eq!(
        messages[1],
        json!({"type": "state_update", "data": {"current_track_index": -1, "current_track": null}})
    );
}

#[tokio::test]
async fn test_seek_while_playing_sends_seek_then_play() {
    let stage = stage_with(&["a"], &[]).await;
    let (admin, mut admin_rx) = join(&stage, Role::Admin);
    let (_display, mut display_rx) = join(&stage, Role::Display);

    stage.handle_admin_text(admin, r#"{"type":"play_music"}"#);
    drain(&mut admin_rx);
    drain(&mut display_rx);

    stage.handle_admin_text(admin, r#"{"type":"seek_music","data":{"time":42}}"#);

    assert_eq!(
        drain(&mut display_rx),
        vec![
            json!({"type": "seek", "data": {"time": 42.0}}),
            json!({"type": "play", "data": {"time": 42.0}}),
        ]
    );
    assert_eq!(
        drain(&mut admin_rx),
        vec![json!({"type": "state_update", "data": {"current_time": 42.0}})]
    );
}

#[tokio::test]
async fn test_failed_display_is_evicted_during_volume_broadcast() {
    let stage = stage_with(&[], &[]).await;
    let (admin, _admin_rx) = join(&stage, Role::Admin);
    let (_d1, mut rx1) = join(&stage, Role::Display);
    let (dead, dead_rx) = join(&stage, Role::Display);
    let (_d3, mut rx3) = join(&stage, Role::Display);
    drop(dead_rx);

    stage.handle_admin_text(admin, r#"{"type":"set_volume","data":{"volume":50}}"#);

    let expected = json!({"type": "volume", "data": {"volume": 50}});
    assert_eq!(next(&mut rx1), expected);
    assert_eq!(next(&mut rx3), expected);
    assert_eq!(stage.connection_count(Role::Display), 2);
    assert!(!stage.leave(Role::Display, dead));
}

#[tokio::test]
async fn test_joining_admin_receives_full_state() {
    let stage = stage_with(&["a", "b"], &["s1", "s2"]).await;
    let (admin, _rx) = join(&stage, Role::Admin);
    stage.handle_admin_text(admin, r#"{"type":"select_slide","data":{"index":1}}"#);
    stage.handle_admin_text(admin, r#"{"type":"set_volume","data":{"volume":30}}"#);

    let (_late, mut late_rx) = stage.join(Role::Admin);
    let first = next(&mut late_rx);
    let expected = serde_json::to_value(stage.snapshot()).unwrap();

    assert_eq!(first["type"], "state_update");
    assert_eq!(first["data"], expected);
    assert_eq!(first["data"]["current_slide"]["id"], "s2");
    assert_eq!(first["data"]["volume"], 30);
}

#[tokio::test]
async fn test_joining_display_receives_mode_scoped_state() {
    let stage = stage_with(&["a"], &["s1"]).await;
    let (admin, _rx) = join(&stage, Role::Admin);

    let (_music, mut music_rx) = stage.join(Role::Display);
    let first = next(&mut music_rx);
    assert_eq!(first["type"], "music_state");
    assert_eq!(first["data"]["track"]["id"], "a");
    assert!(first["data"].get("slide").is_none());

    stage.handle_admin_text(admin, r#"{"type":"switch_mode","data":{"mode":"slide"}}"#);
    assert_eq!(next(&mut music_rx)["type"], "switch_to_slide");

    let (_slide, mut slide_rx) = stage.join(Role::Display);
    let first = next(&mut slide_rx);
    assert_eq!(first, json!({"type": "slide_state", "data": {"slide": {
        "id": "s1", "name": "S1", "url": "/uploads/slides/s1.html", "thumbnail_url": null
    }}}));
}

#[tokio::test]
async fn test_leave_twice_is_same_as_once() {
    let stage = stage_with(&[], &[]).await;
    let (id, _rx) = join(&stage, Role::Display);

    assert!(stage.leave(Role::Display, id));
    assert!(!stage.leave(Role::Display, id));
    assert_eq!(stage.connection_count(Role::Display), 0);
}

#[tokio::test]
async fn test_displays_see_commands_in_admin_order() {
    let stage = stage_with(&["a", "b"], &[]).await;
    let (admin, _admin_rx) = join(&stage, Role::Admin);
    let mut displays: Vec<_> = (0..3).map(|_| join(&stage, Role::Display).1).collect();

    stage.handle_admin_text(admin, r#"{"type":"play_music","data":{"time":3}}"#);
    stage.handle_admin_text(admin, r#"{"type":"set_volume","data":{"volume":10}}"#);
    stage.handle_admin_text(admin, r#"{"type":"pause_music"}"#);

    for rx in displays.iter_mut() {
        let kinds: Vec<_> = drain(rx).into_iter().map(|m| m["type"].clone()).collect();
        assert_eq!(kinds, vec![json!("play"), json!("volume"), json!("pause")]);
    }
}

#[tokio::test]
async fn test_removing_track_before_current_keeps_same_track() {
    let stage = stage_with(&["a", "b", "c"], &[]).await;
    let (admin, _rx) = join(&stage, Role::Admin);
    stage.handle_admin_text(admin, r#"{"type":"select_track","data":{"index":2}}"#);

    assert!(stage.remove_track("a").await.unwrap());

    let snapshot = stage.snapshot();
    assert_eq!(snapshot.current_track_index, 1);
    assert_eq!(snapshot.current_track.map(|t| t.id), Some("c".to_string()));
}

#[tokio::test]
async fn test_adding_first_slide_makes_it_current() {
    let stage = stage_with(&[], &[]).await;
    let (_admin, mut admin_rx) = join(&stage, Role::Admin);

    let slide = stage
        .add_slide(NewSlide {
            name: "Welcome".into(),
            url: "/uploads/slides/welcome.html".into(),
            thumbnail_url: None,
        })
        .await
        .unwrap();

    assert_eq!(stage.snapshot().current_slide_index, 0);
    let messages = drain(&mut admin_rx);
    assert_eq!(messages[0]["type"], "slides_update");
    assert_eq!(messages[1]["data"]["current_slide"]["id"], slide.id.as_str());
}

#[tokio::test]
async fn test_removing_unknown_track_reports_false() {
    let stage = stage_with(&["a"], &[]).await;
    let (_admin, mut admin_rx) = join(&stage, Role::Admin);

    assert!(!stage.remove_track("zzz").await.unwrap());
    assert!(drain(&mut admin_rx).is_empty());
}

struct OfflineCatalog;

#[async_trait]
impl CatalogGateway for OfflineCatalog {
    async fn list_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        Ok(vec![track("a")])
    }

    async fn list_slides(&self) -> Result<Vec<Slide>, CatalogError> {
        Ok(Vec::new())
    }

    async fn add_track(&self, _track: Track) -> Result<(), CatalogError> {
        Err(CatalogError::Unavailable("disk offline".into()))
    }

    async fn remove_track(&self, _id: &str) -> Result<bool, CatalogError> {
        Err(CatalogError::Unavailable("disk offline".into()))
    }

    async fn add_slide(&self, _slide: Slide) -> Result<(), CatalogError> {
        Err(CatalogError::Unavailable("disk offline".into()))
    }

    async fn remove_slide(&self, _id: &str) -> Result<bool, CatalogError> {
        Err(CatalogError::Unavailable("disk offline".into()))
    }
}

#[tokio::test]
async fn test_catalog_failure_leaves_state_untouched() {
    let stage = Stage::from_catalog(Arc::new(OfflineCatalog), StageOptions::default())
        .await
        .unwrap();
    let (_admin, mut admin_rx) = join(&stage, Role::Admin);

    let err = stage
        .add_track(NewTrack {
            title: "New".into(),
            url: "/uploads/music/new.mp3".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::Catalog(CatalogError::Unavailable(_))));

    assert!(stage.remove_track("a").await.is_err());
    assert_eq!(stage.tracks().len(), 1);
    assert!(drain(&mut admin_rx).is_empty());
}

/// Catalogue qui suspend l'ajout de la piste "slow" après l'avoir enregistrée
#[derive(Default)]
struct GatedCatalog {
    inner: MemoryCatalog,
    committed: Notify,
    release: Notify,
}

#[async_trait]
impl CatalogGateway for GatedCatalog {
    async fn list_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        self.inner.list_tracks().await
    }

    async fn list_slides(&self) -> Result<Vec<Slide>, CatalogError> {
        self.inner.list_slides().await
    }

    async fn add_track(&self, track: Track) -> Result<(), CatalogError> {
        let gated = track.title == "slow";
        self.inner.add_track(track).await?;
        if gated {
            self.committed.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }

    async fn remove_track(&self, id: &str) -> Result<bool, CatalogError> {
        self.inner.remove_track(id).await
    }

    async fn add_slide(&self, slide: Slide) -> Result<(), CatalogError> {
        self.inner.add_slide(slide).await
    }

    async fn remove_slide(&self, id: &str) -> Result<bool, CatalogError> {
        self.inner.remove_slide(id).await
    }
}

fn new_track(title: &str) -> NewTrack {
    NewTrack {
        title: title.into(),
        url: format!("/uploads/music/{title}.mp3"),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_concurrent_adds_keep_catalog_order() {
    let catalog = Arc::new(GatedCatalog::default());
    let stage = Arc::new(
        Stage::from_catalog(catalog.clone(), StageOptions::default())
            .await
            .unwrap(),
    );

    let slow = tokio::spawn({
        let stage = stage.clone();
        async move { stage.add_track(new_track("slow")).await }
    });
    catalog.committed.notified().await;

    let fast = tokio::spawn({
        let stage = stage.clone();
        async move { stage.add_track(new_track("fast")).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    catalog.release.notify_one();

    slow.await.unwrap().unwrap();
    fast.await.unwrap().unwrap();

    let live: Vec<String> = stage.tracks().into_iter().map(|t| t.title).collect();
    let durable: Vec<String> = catalog
        .list_tracks()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(live, vec!["slow", "fast"]);
    assert_eq!(live, durable);
    assert_eq!(stage.snapshot().current_track.map(|t| t.title).as_deref(), Some("slow"));
}
