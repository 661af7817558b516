//! Instantanés envoyés aux connexions qui rejoignent
//!
//! Un admin reçoit l'état complet. Un display ne reçoit que ce qu'il affiche
//! dans le mode courant : transport et piste en mode musique, slide en mode
//! présentation.

use crate::model::Mode;
use crate::protocol::{AdminMessage, DisplayMessage};
use crate::state::StateStore;

pub fn admin_snapshot(store: &StateStore) -> AdminMessage {
    AdminMessage::StateUpdate(store.snapshot().into())
}

pub fn display_snapshot(store: &StateStore) -> DisplayMessage {
    match store.mode() {
        Mode::Music => DisplayMessage::MusicState {
            track: store.current_track().cloned(),
            is_playing: store.is_playing(),
            current_time: store.current_time(),
            volume: store.volume(),
        },
        Mode::Slide => DisplayMessage::SlideState {
            slide: store.current_slide().cloned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocatalog::{Slide, Track};
    use serde_json::json;

    fn store() -> StateStore {
        StateStore::new(
            vec![Track::new("A", "Band", "/a.mp3", "/c.jpg").with_id("a")],
            vec![Slide::new("Intro", "/s.html").with_id("s")],
            70,
        )
    }

    #[test]
    fn test_admin_snapshot_carries_everything() {
        let value = serde_json::to_value(admin_snapshot(&store())).unwrap();
        let data = &value["data"];

        assert_eq!(value["type"], "state_update");
        assert_eq!(data["mode"], "music");
        assert_eq!(data["volume"], 70);
        assert_eq!(data["is_playing"], false);
        assert_eq!(data["current_track_index"], 0);
        assert_eq!(data["current_slide_index"], 0);
        assert_eq!(data["current_track"]["id"], "a");
        assert_eq!(data["playlist"].as_array().unwrap().len(), 1);
        assert_eq!(data["slides"][0]["id"], "s");
    }

    #[test]
    fn test_admin_snapshot_of_empty_state() {
        let value = serde_json::to_value(admin_snapshot(&StateStore::default())).unwrap();
        assert_eq!(value["data"]["current_track_index"], -1);
        assert_eq!(value["data"]["current_track"], serde_json::Value::Null);
        assert!(value["data"].get("current_slide").is_some());
    }

    #[test]
    fn test_display_snapshot_is_mode_scoped() {
        let mut store = store();
        let value = serde_json::to_value(display_snapshot(&store)).unwrap();
        assert_eq!(value["type"], "music_state");
        assert_eq!(value["data"]["track"]["id"], "a");
        assert_eq!(value["data"]["volume"], 70);

        store.switch_mode(Mode::Slide);
        let value = serde_json::to_value(display_snapshot(&store)).unwrap();
        assert_eq!(
            value,
            json!({"type": "slide_state", "data": {"slide": {
                "id": "s", "name": "Intro", "url": "/s.html", "thumbnail_url": null
            }}})
        );
    }
}
