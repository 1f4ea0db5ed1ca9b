use std::cell::Cell;
use std::rc::Rc;

use crate::config::Track;
use crate::events::{Event, EventError, EventKind};
use crate::source::{MediaElement, SampleSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Next,
    Last,
}

/// Playlist index after a skip. The playlist wraps around in both
/// directions; from an unset index `Next` starts at the first track and
/// `Last` at the final one.
pub fn step_index(current: Option<usize>, len: usize, step: Step) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, step) {
        (None, Step::Next) => 0,
        (None, Step::Last) => len - 1,
        (Some(index), Step::Next) => (index + 1) % len,
        (Some(index), Step::Last) => (index + len - 1) % len,
    })
}

/// Snapshot of what the transport is doing right now.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<usize>,
    pub paused: bool,
    pub seeking: bool,
    pub ready_to_play: bool,
    pub current_time: f64,
    pub duration: f64,
    /// Buffered spans as fractions of the duration.
    pub buffered: Vec<(f64, f64)>,
}

/// Owns the playlist and drives the sample source through it.
pub struct TransportController<M> {
    source: Rc<SampleSource<M>>,
    playlist: Vec<Track>,
    index: Cell<Option<usize>>,
}

impl<M: MediaElement + 'static> TransportController<M> {
    pub fn new(source: Rc<SampleSource<M>>, playlist: Vec<Track>) -> Rc<Self> {
        Rc::new(Self {
            source,
            playlist,
            index: Cell::new(None),
        })
    }

    /// Wire the two-phase seek protocol and auto-advance, then load the first
    /// track.
    ///
    /// Seeking pauses output before the play head moves; `Seeked` resumes
    /// only if the seek's initiator says playback was running when it began.
    pub fn initialize(self: &Rc<Self>) -> Result<(), EventError> {
        let events = self.source.events();

        let weak = Rc::downgrade(self);
        events.subscribe(EventKind::Seeking, move |event| {
            if let (Some(this), Event::Seeking { time }) = (weak.upgrade(), event) {
                this.source.begin_seek(*time);
            }
        })?;

        let weak = Rc::downgrade(self);
        events.subscribe(EventKind::Seeked, move |event| {
            if let (Some(this), Event::Seeked { resume }) = (weak.upgrade(), event) {
                this.source.finish_seek(*resume);
            }
        })?;

        let weak = Rc::downgrade(self);
        events.subscribe(EventKind::Ended, move |_| {
            if let Some(this) = weak.upgrade() {
                this.next();
            }
        })?;

        self.next();
        Ok(())
    }

    pub fn next(&self) {
        self.step(Step::Next);
    }

    pub fn last(&self) {
        self.step(Step::Last);
    }

    fn step(&self, step: Step) {
        let Some(index) = step_index(self.index.get(), self.playlist.len(), step) else {
            log::warn!("nothing to play: playlist is empty");
            return;
        };
        self.index.set(Some(index));
        let track = &self.playlist[index];
        log::info!(
            "loading track {} of {}{}",
            index + 1,
            self.playlist.len(),
            track.title.as_deref().map(|t| format!(" ({t})")).unwrap_or_default()
        );
        self.source.load(track);
    }

    /// Play/pause button.
    pub fn toggle(&self) {
        if self.source.is_paused() {
            self.source.play();
        } else {
            self.source.pause();
        }
    }

    pub fn source(&self) -> &Rc<SampleSource<M>> {
        &self.source
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index.get()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.index.get().and_then(|index| self.playlist.get(index))
    }

    pub fn state(&self) -> PlaybackState {
        let media = self.source.media();
        let duration = media.duration();
        let buffered = if duration > 0.0 {
            media
                .buffered()
                .into_iter()
                .map(|(start, end)| (start / duration, end / duration))
                .collect()
        } else {
            Vec::new()
        };
        PlaybackState {
            current_track: self.index.get(),
            paused: media.paused(),
            seeking: self.source.is_seeking(),
            ready_to_play: self.source.is_ready(),
            current_time: media.current_time(),
            duration: if duration.is_finite() { duration } else { 0.0 },
            buffered,
        }
    }
}
