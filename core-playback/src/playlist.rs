//! # Playlist State Machine
//!
//! Headless transport state for a UI: the ordered track list, the current
//! track, play/pause, shuffle, repeat, volume and mute.
//!
//! The playlist only decides *what* should play. Actually rendering audio is
//! left to the playback surface that consumes the playable URLs.

use crate::error::{PlaybackError, Result};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Playback position after which "previous" restarts the current track.
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// Repeat behaviour at the end of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last track.
    #[default]
    None,
    /// Wrap around to the first track.
    All,
    /// Replay the current track.
    One,
}

impl RepeatMode {
    /// `None -> All -> One -> None`
    pub fn next(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::None => "none",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        }
    }
}

/// What the playback surface should do after a transport command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Switch to this track.
    Play(String),
    /// Seek the current track back to the start.
    Restart,
    /// End of playlist reached with repeat off; playback stopped.
    Stopped,
    /// Nothing to do (empty playlist or no current track).
    Idle,
}

/// Playlist and transport state.
pub struct Playlist {
    tracks: Vec<String>,
    current: Option<usize>,
    playing: bool,
    volume: f32,
    muted: bool,
    shuffle: bool,
    repeat: RepeatMode,
    rng: Box<dyn RngCore + Send>,
    event_bus: Option<Arc<EventBus>>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a playlist with a specific random source for shuffle.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            playing: false,
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat: RepeatMode::None,
            rng: Box::new(rng),
            event_bus: None,
        }
    }

    /// Set event bus for playback events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.map(|i| self.tracks[i].as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Volume to apply to the output: zero while muted.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    // ------------------------------------------------------------------
    // Track list
    // ------------------------------------------------------------------

    /// Replace the track list. The current track is kept if still present.
    pub fn set_tracks(&mut self, tracks: Vec<String>) {
        let current = self.current().map(str::to_string);
        self.tracks = tracks;
        self.current = current.and_then(|id| self.position(&id));
        if self.current.is_none() {
            self.playing = false;
        }
    }

    /// Append tracks. The first appended track becomes current when nothing
    /// is selected yet.
    pub fn append<I>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = String>,
    {
        let first_new = self.tracks.len();
        self.tracks.extend(tracks);

        if self.current.is_none() && first_new < self.tracks.len() {
            self.set_current(Some(first_new));
        }
    }

    /// Remove a track. When it was current, the track that takes its slot
    /// becomes current, then the first track, then nothing.
    pub fn remove(&mut self, id: &str) {
        let Some(index) = self.position(id) else {
            return;
        };
        self.tracks.remove(index);

        match self.current {
            Some(current) if current == index => {
                self.current = None;
                let replacement = if index < self.tracks.len() {
                    Some(index)
                } else if !self.tracks.is_empty() {
                    Some(0)
                } else {
                    None
                };
                if replacement.is_none() {
                    self.playing = false;
                }
                self.set_current(replacement);
            }
            Some(current) if current > index => self.current = Some(current - 1),
            _ => {}
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.playing = false;
    }

    /// Make `id` the current track.
    ///
    /// # Errors
    ///
    /// Returns `TrackNotFound` if `id` is not in the playlist.
    pub fn select(&mut self, id: &str) -> Result<()> {
        let index = self
            .position(id)
            .ok_or_else(|| PlaybackError::TrackNotFound(id.to_string()))?;
        self.set_current(Some(index));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle_play(&mut self) -> bool {
        let Some(id) = self.current().map(str::to_string) else {
            return false;
        };

        self.playing = !self.playing;
        if self.playing {
            self.emit(PlaybackEvent::Started { track_id: id });
        } else {
            self.emit(PlaybackEvent::Paused { track_id: id });
        }
        self.playing
    }

    /// Skip forward.
    pub fn skip_next(&mut self) -> Transition {
        let Some(current) = self.current else {
            return Transition::Idle;
        };

        if self.repeat == RepeatMode::One {
            return Transition::Restart;
        }

        if self.repeat == RepeatMode::None && current + 1 == self.tracks.len() {
            self.playing = false;
            self.emit(PlaybackEvent::Stopped);
            return Transition::Stopped;
        }

        let next = if self.shuffle {
            self.random_other(current)
        } else {
            (current + 1) % self.tracks.len()
        };
        self.move_to(next)
    }

    /// The current track finished playing. Same rules as [`skip_next`](Self::skip_next).
    pub fn track_ended(&mut self) -> Transition {
        self.skip_next()
    }

    /// Skip backward. Past [`RESTART_THRESHOLD`] into the track this restarts
    /// it instead.
    pub fn skip_previous(&mut self, position: Duration) -> Transition {
        let Some(current) = self.current else {
            return Transition::Idle;
        };

        if position > RESTART_THRESHOLD {
            return Transition::Restart;
        }

        let previous = if self.shuffle {
            self.random_other(current)
        } else if current == 0 {
            self.tracks.len() - 1
        } else {
            current - 1
        };
        self.move_to(previous)
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Set the output volume in `[0.0, 1.0]`. Zero also mutes.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlaybackError::InvalidVolume(volume));
        }
        self.volume = volume;
        self.muted = volume == 0.0;
        self.emit_volume();
        Ok(())
    }

    /// Mute or unmute, keeping the configured volume.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.emit_volume();
        self.muted
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.emit_mode();
        self.shuffle
    }

    /// Advance the repeat mode `None -> All -> One -> None`.
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.next();
        self.emit_mode();
        self.repeat
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn position(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t == id)
    }

    /// Uniform pick among every track except `current`; `current` itself
    /// when it is the only track.
    fn random_other(&mut self, current: usize) -> usize {
        let len = self.tracks.len();
        if len <= 1 {
            return current;
        }
        let pick = self.rng.gen_range(0..len - 1);
        if pick >= current {
            pick + 1
        } else {
            pick
        }
    }

    fn move_to(&mut self, index: usize) -> Transition {
        self.set_current(Some(index));
        Transition::Play(self.tracks[index].clone())
    }

    fn set_current(&mut self, index: Option<usize>) {
        if self.current == index {
            return;
        }
        self.current = index;
        if let Some(id) = self.current().map(str::to_string) {
            debug!(track_id = %id, "Current track changed");
            self.emit(PlaybackEvent::TrackChanged { track_id: id });
        }
    }

    fn emit_volume(&self) {
        self.emit(PlaybackEvent::VolumeChanged {
            volume_percent: (self.volume * 100.0).round() as u8,
            muted: self.muted,
        });
    }

    fn emit_mode(&self) {
        self.emit(PlaybackEvent::ModeChanged {
            shuffle: self.shuffle,
            repeat: self.repeat.as_str().to_string(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn playlist(names: &[&str]) -> Playlist {
        let mut playlist = Playlist::with_rng(StdRng::seed_from_u64(7));
        playlist.append(ids(names));
        playlist
    }

    #[test]
    fn test_first_appended_track_becomes_current() {
        let mut p = Playlist::with_rng(StdRng::seed_from_u64(1));
        assert_eq!(p.current(), None);

        p.append(ids(&["a", "b"]));
        assert_eq!(p.current(), Some("a"));

        p.append(ids(&["c"]));
        assert_eq!(p.current(), Some("a"));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_repeat_cycle() {
        let mut p = playlist(&[]);
        assert_eq!(p.repeat(), RepeatMode::None);
        assert_eq!(p.cycle_repeat(), RepeatMode::All);
        assert_eq!(p.cycle_repeat(), RepeatMode::One);
        assert_eq!(p.cycle_repeat(), RepeatMode::None);
    }

    #[test]
    fn test_next_stops_at_end_without_repeat() {
        let mut p = playlist(&["a", "b"]);
        p.toggle_play();

        assert_eq!(p.skip_next(), Transition::Play("b".to_string()));
        assert_eq!(p.skip_next(), Transition::Stopped);
        assert!(!p.is_playing());
        assert_eq!(p.current(), Some("b"));
    }

    #[test]
    fn test_next_wraps_with_repeat_all() {
        let mut p = playlist(&["a", "b"]);
        p.cycle_repeat();

        p.skip_next();
        assert_eq!(p.track_ended(), Transition::Play("a".to_string()));
    }

    #[test]
    fn test_repeat_one_restarts() {
        let mut p = playlist(&["a", "b"]);
        p.cycle_repeat();
        p.cycle_repeat();

        assert_eq!(p.skip_next(), Transition::Restart);
        assert_eq!(p.current(), Some("a"));
    }

    #[test]
    fn test_previous_restarts_after_threshold() {
        let mut p = playlist(&["a", "b", "c"]);
        p.select("b").unwrap();

        assert_eq!(p.skip_previous(Duration::from_secs(4)), Transition::Restart);
        assert_eq!(p.current(), Some("b"));

        assert_eq!(
            p.skip_previous(Duration::from_secs(3)),
            Transition::Play("a".to_string())
        );
        assert_eq!(
            p.skip_previous(Duration::ZERO),
            Transition::Play("c".to_string())
        );
    }

    #[test]
    fn test_shuffle_never_repeats_current() {
        let mut p = playlist(&["a", "b", "c", "d"]);
        p.cycle_repeat();
        p.toggle_shuffle();

        for _ in 0..50 {
            let before = p.current().unwrap().to_string();
            match p.skip_next() {
                Transition::Play(next) => assert_ne!(next, before),
                other => panic!("unexpected transition: {:?}", other),
            }
        }
    }

    #[test]
    fn test_shuffle_single_track_stays() {
        let mut p = playlist(&["only"]);
        p.cycle_repeat();
        p.toggle_shuffle();

        assert_eq!(p.skip_next(), Transition::Play("only".to_string()));
    }

    #[test]
    fn test_remove_current_selects_following_track() {
        let mut p = playlist(&["a", "b", "c"]);
        p.select("b").unwrap();

        p.remove("b");
        assert_eq!(p.current(), Some("c"));

        p.remove("c");
        assert_eq!(p.current(), Some("a"));

        p.remove("a");
        assert_eq!(p.current(), None);
        assert!(p.is_empty());
    }

    #[test]
    fn test_remove_before_current_keeps_selection() {
        let mut p = playlist(&["a", "b", "c"]);
        p.select("c").unwrap();

        p.remove("a");
        assert_eq!(p.current(), Some("c"));

        p.remove("missing");
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_set_tracks_keeps_current_if_present() {
        let mut p = playlist(&["a", "b"]);
        p.select("b").unwrap();

        p.set_tracks(ids(&["b", "c"]));
        assert_eq!(p.current(), Some("b"));

        p.set_tracks(ids(&["x"]));
        assert_eq!(p.current(), None);
    }

    #[test]
    fn test_select_unknown_track() {
        let mut p = playlist(&["a"]);
        assert!(matches!(
            p.select("zzz"),
            Err(PlaybackError::TrackNotFound(_))
        ));
    }

    #[test]
    fn test_toggle_play_requires_track() {
        let mut empty = playlist(&[]);
        assert!(!empty.toggle_play());
        assert_eq!(empty.skip_next(), Transition::Idle);

        let mut p = playlist(&["a"]);
        assert!(p.toggle_play());
        assert!(!p.toggle_play());
    }

    #[test]
    fn test_volume_and_mute() {
        let mut p = playlist(&[]);

        p.set_volume(0.4).unwrap();
        assert!(!p.is_muted());
        assert_eq!(p.effective_volume(), 0.4);

        assert!(p.toggle_mute());
        assert_eq!(p.effective_volume(), 0.0);
        assert_eq!(p.volume(), 0.4);
        assert!(!p.toggle_mute());

        p.set_volume(0.0).unwrap();
        assert!(p.is_muted());

        assert!(matches!(p.set_volume(1.5), Err(PlaybackError::InvalidVolume(_))));
        assert!(p.set_volume(f32::NAN).is_err());
    }

    #[test]
    fn test_clear() {
        let mut p = playlist(&["a", "b"]);
        p.toggle_play();
        p.clear();

        assert!(p.is_empty());
        assert_eq!(p.current(), None);
        assert!(!p.is_playing());
    }

    #[tokio::test]
    async fn test_playback_events() {
        let bus = Arc::new(EventBus::new(16));
        let mut events = bus.subscribe();
        let mut p = Playlist::with_rng(StdRng::seed_from_u64(3)).with_event_bus(bus.clone());

        p.append(ids(&["a"]));
        p.toggle_play();
        p.toggle_shuffle();

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::TrackChanged {
                track_id: "a".to_string()
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::Started {
                track_id: "a".to_string()
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::ModeChanged {
                shuffle: true,
                repeat: "none".to_string()
            })
        );
    }
}
