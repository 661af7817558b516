//! État canonique de la scène
//!
//! [`StateStore`] est l'unique enregistrement mutable de l'état de lecture.
//! Les éléments courants ne sont jamais stockés : ils sont relus dans la
//! liste à partir de l'index, si bien que `current == list[index]` tient par
//! construction. Un index absent (`None`) correspond à une liste vide et
//! s'écrit `-1` sur le fil.

use pmocatalog::{Slide, Track};

use crate::error::StateError;
use crate::model::Mode;
use crate::protocol::StageSnapshot;

pub const MAX_VOLUME: u8 = 100;

/// Sens de déplacement dans la playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    mode: Mode,
    playlist: Vec<Track>,
    slides: Vec<Slide>,
    track_index: Option<usize>,
    slide_index: Option<usize>,
    is_playing: bool,
    current_time: f64,
    volume: u8,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), 80)
    }
}

impl StateStore {
    /// Construit l'état initial à partir du contenu du catalogue
    ///
    /// Le premier élément de chaque liste non vide devient courant.
    pub fn new(playlist: Vec<Track>, slides: Vec<Slide>, volume: u8) -> Self {
        Self {
            mode: Mode::Music,
            track_index: first_index(&playlist),
            slide_index: first_index(&slides),
            playlist,
            slides,
            is_playing: false,
            current_time: 0.0,
            volume: volume.min(MAX_VOLUME),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn playlist(&self) -> &[Track] {
        &self.playlist
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn current_track_index(&self) -> Option<usize> {
        self.track_index
    }

    pub fn current_slide_index(&self) -> Option<usize> {
        self.slide_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.track_index.and_then(|i| self.playlist.get(i))
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.slide_index.and_then(|i| self.slides.get(i))
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Instantané complet de l'état
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            mode: self.mode,
            is_playing: self.is_playing,
            current_time: self.current_time,
            volume: self.volume,
            playlist: self.playlist.clone(),
            slides: self.slides.clone(),
            current_track_index: wire_index(self.track_index),
            current_slide_index: wire_index(self.slide_index),
            current_track: self.current_track().cloned(),
            current_slide: self.current_slide().cloned(),
        }
    }

    pub fn set_transport(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Positionne la lecture, les valeurs négatives sont ramenées à 0
    ///
    /// La durée de la piste n'est pas vérifiée. Retourne la position retenue.
    pub fn seek(&mut self, time: f64) -> f64 {
        self.current_time = clamp_time(time);
        self.current_time
    }

    /// Arrondit et borne le volume dans `0..=100`, retourne la valeur retenue
    pub fn set_volume(&mut self, volume: f64) -> u8 {
        self.volume = if volume.is_nan() {
            0
        } else {
            volume.round().clamp(0.0, f64::from(MAX_VOLUME)) as u8
        };
        self.volume
    }

    /// Sélectionne une piste, repart de 0 et passe en lecture
    pub fn select_track(&mut self, index: i64) -> Result<&Track, StateError> {
        let position = checked_index("track", index, self.playlist.len())?;
        self.track_index = Some(position);
        self.current_time = 0.0;
        self.is_playing = true;
        Ok(&self.playlist[position])
    }

    /// Avance ou recule d'une piste en bouclant aux deux extrémités
    ///
    /// Sans effet sur une playlist vide (retourne `None`). La position de
    /// lecture n'est pas modifiée.
    pub fn advance_track(&mut self, direction: Direction) -> Option<&Track> {
        let len = self.playlist.len();
        if len == 0 {
            return None;
        }

        let current = self.track_index.unwrap_or(0);
        let next = match direction {
            Direction::Next => (current + 1) % len,
            Direction::Prev => (current + len - 1) % len,
        };

        self.track_index = Some(next);
        self.is_playing = true;
        self.playlist.get(next)
    }

    /// Sélectionne une slide, sans effet sur le transport
    pub fn select_slide(&mut self, index: i64) -> Result<&Slide, StateError> {
        let position = checked_index("slide", index, self.slides.len())?;
        self.slide_index = Some(position);
        Ok(&self.slides[position])
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Ajoute une piste en fin de playlist et retourne sa position
    ///
    /// Ajoutée à une playlist vide, elle devient la piste courante.
    pub fn add_track(&mut self, track: Track) -> usize {
        self.playlist.push(track);
        if self.track_index.is_none() {
            self.track_index = Some(0);
        }
        self.playlist.len() - 1
    }

    /// Retire une piste et recale l'index sur le même élément logique
    pub fn remove_track(&mut self, id: &str) -> Option<Track> {
        let position = self.playlist.iter().position(|t| t.id == id)?;
        let removed = self.playlist.remove(position);
        self.track_index = repair_index(self.track_index, position, self.playlist.len());
        Some(removed)
    }

    pub fn add_slide(&mut self, slide: Slide) -> usize {
        self.slides.push(slide);
        if self.slide_index.is_none() {
            self.slide_index = Some(0);
        }
        self.slides.len() - 1
    }

    pub fn remove_slide(&mut self, id: &str) -> Option<Slide> {
        let position = self.slides.iter().position(|s| s.id == id)?;
        let removed = self.slides.remove(position);
        self.slide_index = repair_index(self.slide_index, position, self.slides.len());
        Some(removed)
    }

    /// Position rapportée par un display, dernier écrit gagne
    pub fn report_display_time(&mut self, time: f64) {
        self.current_time = clamp_time(time);
    }
}

/// Index sur le fil : `-1` quand la liste est vide
pub fn wire_index(index: Option<usize>) -> i64 {
    index.map_or(-1, |i| i as i64)
}

fn first_index<T>(list: &[T]) -> Option<usize> {
    if list.is_empty() { None } else { Some(0) }
}

fn clamp_time(time: f64) -> f64 {
    if time.is_finite() { time.max(0.0) } else { 0.0 }
}

fn checked_index(kind: &'static str, index: i64, len: usize) -> Result<usize, StateError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(StateError::IndexOutOfRange { kind, index, len })
}

/// Recalcule l'index courant après suppression de l'élément `removed`
///
/// - liste vide : plus d'index
/// - élément avant le courant : l'index recule pour suivre le même élément
/// - élément courant : on se replace sur le précédent (ou le premier)
/// - élément après le courant : inchangé
fn repair_index(current: Option<usize>, removed: usize, len_after: usize) -> Option<usize> {
    if len_after == 0 {
        return None;
    }
    match current {
        Some(index) if removed < index => Some(index - 1),
        Some(index) if removed == index => Some(index.saturating_sub(1)),
        Some(index) => Some(index.min(len_after - 1)),
        None => Some(0),
    }
}
