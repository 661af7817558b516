//! Protocole WebSocket
//!
//! Enveloppe commune aux deux sens : `{"type": <tag>, "data": <objet optionnel>}`.
//!
//! - admin → serveur : [`AdminCommand`]
//! - display → serveur : [`DisplayReport`]
//! - serveur → display : [`DisplayMessage`]
//! - serveur → admin : [`AdminMessage`]

use pmocatalog::{Slide, Track};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::model::Mode;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::InvalidJson)
    }
}

/// Décode `data` ; absent ou `null` vaut un objet vide
fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> Result<T, ProtocolError> {
    let data = match data {
        Value::Null => Value::Object(Default::default()),
        data => data,
    };
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}

#[derive(Deserialize)]
struct PlayArgs {
    #[serde(default)]
    time: Option<f64>,
}

#[derive(Deserialize)]
struct TimeArgs {
    time: f64,
}

#[derive(Deserialize)]
struct IndexArgs {
    index: i64,
}

#[derive(Deserialize)]
struct VolumeArgs {
    volume: f64,
}

#[derive(Deserialize)]
struct ModeArgs {
    mode: Mode,
}

/// Commande émise par un admin
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Play { time: Option<f64> },
    Pause,
    Next,
    Prev,
    SelectTrack { index: i64 },
    Seek { time: f64 },
    SetVolume { volume: f64 },
    SwitchMode { mode: Mode },
    SelectSlide { index: i64 },
}

impl AdminCommand {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, data } = Envelope::parse(text)?;
        let command = match kind.as_str() {
            "play_music" => {
                let args: PlayArgs = payload(&kind, data)?;
                AdminCommand::Play { time: args.time }
            }
            "pause_music" => AdminCommand::Pause,
            "next_track" => AdminCommand::Next,
            "prev_track" => AdminCommand::Prev,
            "select_track" => {
                let args: IndexArgs = payload(&kind, data)?;
                AdminCommand::SelectTrack { index: args.index }
            }
            "seek_music" => {
                let args: TimeArgs = payload(&kind, data)?;
                AdminCommand::Seek { time: args.time }
            }
            "set_volume" => {
                let args: VolumeArgs = payload(&kind, data)?;
                AdminCommand::SetVolume {
                    volume: args.volume,
                }
            }
            "switch_mode" => {
                let args: ModeArgs = payload(&kind, data)?;
                AdminCommand::SwitchMode { mode: args.mode }
            }
            "select_slide" => {
                let args: IndexArgs = payload(&kind, data)?;
                AdminCommand::SelectSlide { index: args.index }
            }
            _ => return Err(ProtocolError::UnknownType(kind.clone())),
        };
        Ok(command)
    }

    /// Tag de la commande sur le fil
    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::Play { .. } => "play_music",
            AdminCommand::Pause => "pause_music",
            AdminCommand::Next => "next_track",
            AdminCommand::Prev => "prev_track",
            AdminCommand::SelectTrack { .. } => "select_track",
            AdminCommand::Seek { .. } => "seek_music",
            AdminCommand::SetVolume { .. } => "set_volume",
            AdminCommand::SwitchMode { .. } => "switch_mode",
            AdminCommand::SelectSlide { .. } => "select_slide",
        }
    }
}

/// Rapport émis par un display
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayReport {
    TimeUpdate { time: f64 },
}

impl DisplayReport {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { kind, data } = Envelope::parse(text)?;
        match kind.as_str() {
            "time_update" => {
                let args: TimeArgs = payload(&kind, data)?;
                Ok(DisplayReport::TimeUpdate { time: args.time })
            }
            _ => Err(ProtocolError::UnknownType(kind.clone())),
        }
    }
}

/// Message envoyé aux displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DisplayMessage {
    Play {
        time: f64,
    },
    Pause {},
    TrackChange {
        track: Track,
        play: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        time: Option<f64>,
    },
    Seek {
        time: f64,
    },
    Volume {
        volume: u8,
    },
    SwitchToMusic {
        track: Option<Track>,
        is_playing: bool,
        current_time: f64,
    },
    SwitchToSlide {
        slide: Option<Slide>,
    },
    SlideChange {
        slide: Slide,
    },
    MusicState {
        track: Option<Track>,
        is_playing: bool,
        current_time: f64,
        volume: u8,
    },
    SlideState {
        slide: Option<Slide>,
    },
}

/// Message envoyé aux admins
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AdminMessage {
    StateUpdate(StateUpdate),
    PlaylistUpdate {
        playlist: Vec<Track>,
    },
    SlidesUpdate {
        slides: Vec<Slide>,
    },
    CommandRejected {
        command: Option<String>,
        reason: String,
    },
}

/// Mise à jour partielle ou complète de l'état côté admin
///
/// Seuls les champs renseignés sont émis. `current_track` et `current_slide`
/// distinguent « non transmis » (`None`) de « aucun » (`Some(None)`, émis `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Vec<Track>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<Slide>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_track_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_slide_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_track: Option<Option<Track>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_slide: Option<Option<Slide>>,
}

/// État complet, tel qu'envoyé à un admin qui rejoint et exposé par l'API REST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pmoserver", derive(utoipa::ToSchema))]
pub struct StageSnapshot {
    pub mode: Mode,
    pub is_playing: bool,
    pub current_time: f64,
    pub volume: u8,
    pub playlist: Vec<Track>,
    pub slides: Vec<Slide>,
    pub current_track_index: i64,
    pub current_slide_index: i64,
    pub current_track: Option<Track>,
    pub current_slide: Option<Slide>,
}

impl From<StageSnapshot> for StateUpdate {
    fn from(snapshot: StageSnapshot) -> Self {
        StateUpdate {
            mode: Some(snapshot.mode),
            is_playing: Some(snapshot.is_playing),
            current_time: Some(snapshot.current_time),
            volume: Some(snapshot.volume),
            playlist: Some(snapshot.playlist),
            slides: Some(snapshot.slides),
            current_track_index: Some(snapshot.current_track_index),
            current_slide_index: Some(snapshot.current_slide_index),
            current_track: Some(snapshot.current_track),
            current_slide: Some(snapshot.current_slide),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_admin_commands() {
        assert_eq!(
            AdminCommand::parse(r#"{"type":"play_music"}"#).unwrap(),
            AdminCommand::Play { time: None }
        );
        assert_eq!(
            AdminCommand::parse(r#"{"type":"play_music","data":{"time":12.5}}"#).unwrap(),
            AdminCommand::Play { time: Some(12.5) }
        );
        assert_eq!(
            AdminCommand::parse(r#"{"type":"pause_music","data":{}}"#).unwrap(),
            AdminCommand::Pause
        );
        assert_eq!(
            AdminCommand::parse(r#"{"type":"select_track","data":{"index":3}}"#).unwrap(),
            AdminCommand::SelectTrack { index: 3 }
        );
        assert_eq!(
            AdminCommand::parse(r#"{"type":"switch_mode","data":{"mode":"slide"}}"#).unwrap(),
            AdminCommand::SwitchMode { mode: Mode::Slide }
        );
        assert_eq!(
            AdminCommand::parse(r#"{"type":"set_volume","data":{"volume":55}}"#).unwrap(),
            AdminCommand::SetVolume { volume: 55.0 }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = AdminCommand::parse(r#"{"type":"explode"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref k) if k == "explode"));
        assert_eq!(err.command(), Some("explode"));

        let err = AdminCommand::parse(r#"{"type":"seek_music","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));
        assert_eq!(err.command(), Some("seek_music"));

        let err = AdminCommand::parse(r#"{"type":"switch_mode","data":{"mode":"video"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { .. }));

        let err = AdminCommand::parse("not json").unwrap_err();
        assert!(err.command().is_none());
    }

    #[test]
    fn test_parse_display_report() {
        assert_eq!(
            DisplayReport::parse(r#"{"type":"time_update","data":{"time":8}}"#).unwrap(),
            DisplayReport::TimeUpdate { time: 8.0 }
        );
        assert!(DisplayReport::parse(r#"{"type":"play_music"}"#).is_err());
    }

    #[test]
    fn test_display_message_shapes() {
        assert_eq!(
            serde_json::to_value(DisplayMessage::Pause {}).unwrap(),
            json!({"type": "pause", "data": {}})
        );

        let track = Track::new("Song", "Band", "/a.mp3", "/c.jpg").with_id("t1");
        let value = serde_json::to_value(DisplayMessage::TrackChange {
            track,
            play: true,
            time: None,
        })
        .unwrap();
        assert_eq!(value["type"], "track_change");
        assert_eq!(value["data"]["track"]["id"], "t1");
        assert!(value["data"].get("time").is_none());

        assert_eq!(
            serde_json::to_value(DisplayMessage::SwitchToSlide { slide: None }).unwrap(),
            json!({"type": "switch_to_slide", "data": {"slide": null}})
        );
    }

    #[test]
    fn test_state_update_emits_only_set_fields() {
        let update = StateUpdate {
            volume: Some(50),
            current_track: Some(None),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(AdminMessage::StateUpdate(update)).unwrap(),
            json!({"type": "state_update", "data": {"volume": 50, "current_track": null}})
        );
    }
}
