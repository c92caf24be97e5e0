//! # Core Events
//!
//! Notifications published by the library, the offline cache and the
//! playlist over a `tokio::sync::broadcast` channel.
//!
//! Events never carry an operation's outcome; every publisher drops the
//! `SendError` returned when nobody is subscribed. A slow subscriber sees
//! `RecvError::Lagged(n)` and keeps receiving newer events.
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
//!
//! let bus = EventBus::default();
//! let _library = bus.stream().library_only();
//!
//! let _ = bus.emit(CoreEvent::Library(LibraryEvent::LibraryCleared));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Capacity used by `CoreService`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// --- Core Event Types ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Track library changes
    Library(LibraryEvent),
    /// Offline cache lifecycle and writes
    Cache(CacheEvent),
    /// Playlist navigation and transport state
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Whether this event reports a failure that was swallowed.
    pub fn is_failure(&self) -> bool {
        match self {
            CoreEvent::Cache(CacheEvent::WriteFailed { .. }) => true,
            CoreEvent::Library(LibraryEvent::TrackRejected { .. }) => true,
            CoreEvent::Library(LibraryEvent::BatchCompleted { added, failed }) => {
                *added == 0 && *failed > 0
            }
            _ => false,
        }
    }

    pub fn as_library(&self) -> Option<&LibraryEvent> {
        match self {
            CoreEvent::Library(event) => Some(event),
            _ => None,
        }
    }
}

// --- Library Events ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A track and its audio were stored.
    TrackAdded {
        track_id: String,
        name: String,
        size: u64,
    },
    /// An upload in a batch could not be stored.
    TrackRejected { file_name: String, message: String },
    /// A track was removed. Also emitted for ids that did not exist.
    TrackRemoved { track_id: String },
    /// Every track was removed.
    LibraryCleared,
    /// A batch upload finished.
    BatchCompleted { added: u32, failed: u32 },
}

// --- Cache Events ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// The general cache generation was created and pre-cached.
    Installed { cache_name: String, precached: u32 },
    /// Old generations were deleted and interception started.
    Activated {
        general_cache: String,
        audio_cache: String,
        deleted: Vec<String>,
    },
    /// Audio bytes were stored from a cache-audio message.
    AudioCached { url: String, size: u64 },
    /// A cache write failed and was dropped.
    WriteFailed { url: String, message: String },
}

// --- Playback Events ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A different track became current.
    TrackChanged { track_id: String },
    Started { track_id: String },
    Paused { track_id: String },
    /// Playback reached the end of the playlist with repeat off.
    Stopped,
    /// Volume or mute changed. Volume is reported in percent.
    VolumeChanged { volume_percent: u8, muted: bool },
    /// Shuffle or repeat mode changed.
    ModeChanged { shuffle: bool, repeat: String },
}

// --- Bus ---

/// Broadcast hub shared by every publisher. Clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Number of subscribers reached, or `SendError` when there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through a filterable [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

type Predicate = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A subscription that silently skips events its predicate rejects.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    predicate: Option<Predicate>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            predicate: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Only [`CoreEvent::Library`] events.
    pub fn library_only(self) -> Self {
        self.filter(|event| matches!(event, CoreEvent::Library(_)))
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.predicate.as_ref().map_or(true, |keep| keep(event))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Next buffered match, or `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        use broadcast::error::TryRecvError;

        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}
