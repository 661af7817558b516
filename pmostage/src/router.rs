//! Routage des commandes admin
//!
//! Chaque commande effectue exactement une mutation du [`StateStore`] puis
//! produit les messages dérivés pour les displays et les admins. Le routage
//! est synchrone : la mutation et la construction des messages se font
//! d'un seul tenant.

use crate::error::StateError;
use crate::model::Mode;
use crate::protocol::{AdminCommand, AdminMessage, DisplayMessage, StateUpdate};
use crate::state::{Direction, StateStore, wire_index};

/// Messages à diffuser après une commande, dans l'ordre d'émission
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dispatch {
    pub display: Vec<DisplayMessage>,
    pub admin: Vec<AdminMessage>,
}

impl Dispatch {
    fn new(display: Vec<DisplayMessage>, update: StateUpdate) -> Self {
        Self {
            display,
            admin: vec![AdminMessage::StateUpdate(update)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty() && self.admin.is_empty()
    }
}

/// Applique `command` à `store`
///
/// Un index hors bornes est refusé sans mutation. `next`/`prev` sur une
/// playlist vide ne produisent aucun message.
pub fn route(store: &mut StateStore, command: &AdminCommand) -> Result<Dispatch, StateError> {
    let dispatch = match *command {
        AdminCommand::Play { time } => {
            if let Some(time) = time {
                store.seek(time);
            }
            store.set_transport(true);
            let time = store.current_time();
            Dispatch::new(
                vec![DisplayMessage::Play { time }],
                StateUpdate {
                    is_playing: Some(true),
                    current_time: Some(time),
                    ..Default::default()
                },
            )
        }

        AdminCommand::Pause => {
            store.set_transport(false);
            Dispatch::new(
                vec![DisplayMessage::Pause {}],
                StateUpdate {
                    is_playing: Some(false),
                    ..Default::default()
                },
            )
        }

        AdminCommand::Next | AdminCommand::Prev => {
            let direction = if *command == AdminCommand::Next {
                Direction::Next
            } else {
                Direction::Prev
            };
            let Some(track) = store.advance_track(direction).cloned() else {
                return Ok(Dispatch::default());
            };
            Dispatch::new(
                vec![DisplayMessage::TrackChange {
                    track: track.clone(),
                    play: true,
                    time: None,
                }],
                StateUpdate {
                    current_track_index: Some(wire_index(store.current_track_index())),
                    current_track: Some(Some(track)),
                    is_playing: Some(true),
                    ..Default::default()
                },
            )
        }

        AdminCommand::SelectTrack { index } => {
            let track = store.select_track(index)?.clone();
            Dispatch::new(
                vec![DisplayMessage::TrackChange {
                    track: track.clone(),
                    play: true,
                    time: Some(0.0),
                }],
                StateUpdate {
                    current_track_index: Some(wire_index(store.current_track_index())),
                    current_track: Some(Some(track)),
                    is_playing: Some(true),
                    current_time: Some(0.0),
                    ..Default::default()
                },
            )
        }

        AdminCommand::Seek { time } => {
            let time = store.seek(time);
            let mut display = vec![DisplayMessage::Seek { time }];
            if store.is_playing() {
                display.push(DisplayMessage::Play { time });
            }
            Dispatch::new(
                display,
                StateUpdate {
                    current_time: Some(time),
                    ..Default::default()
                },
            )
        }

        AdminCommand::SetVolume { volume } => {
            let volume = store.set_volume(volume);
            Dispatch::new(
                vec![DisplayMessage::Volume { volume }],
                StateUpdate {
                    volume: Some(volume),
                    ..Default::default()
                },
            )
        }

        AdminCommand::SwitchMode { mode } => {
            store.switch_mode(mode);
            let display = match mode {
                Mode::Music => DisplayMessage::SwitchToMusic {
                    track: store.current_track().cloned(),
                    is_playing: store.is_playing(),
                    current_time: store.current_time(),
                },
                Mode::Slide => DisplayMessage::SwitchToSlide {
                    slide: store.current_slide().cloned(),
                },
            };
            Dispatch::new(
                vec![display],
                StateUpdate {
                    mode: Some(mode),
                    ..Default::default()
                },
            )
        }

        AdminCommand::SelectSlide { index } => {
            let slide = store.select_slide(index)?.clone();
            Dispatch::new(
                vec![DisplayMessage::SlideChange {
                    slide: slide.clone(),
                }],
                StateUpdate {
                    current_slide_index: Some(wire_index(store.current_slide_index())),
                    current_slide: Some(Some(slide)),
                    ..Default::default()
                },
            )
        }
    };

    Ok(dispatch)
}
