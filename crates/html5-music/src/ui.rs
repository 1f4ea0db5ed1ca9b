//! Transport controls: play/pause/skip buttons, the seek and volume bars,
//! the elapsed-time readout and the track title.
//!
//! Nothing here polls. Every visual change is the reaction to a sample
//! source event or to a pointer/button event routed in from the page.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::drag::{BarView, CaptureToken, DragBar, DragCoordinator, DragTarget, Overlay};
use crate::events::{Event, EventError, EventKind};
use crate::source::{MediaElement, SampleSource};
use crate::transport::TransportController;

/// `m:ss`, whole seconds. Negative or unknown times read as `0:00`.
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

impl PlayIcon {
    pub const ALL: [PlayIcon; 2] = [PlayIcon::Play, PlayIcon::Pause];

    pub fn class_name(self) -> &'static str {
        match self {
            PlayIcon::Play => "icon-play",
            PlayIcon::Pause => "icon-pause",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeakerIcon {
    Off,
    Down,
    Up,
}

impl SpeakerIcon {
    pub const ALL: [SpeakerIcon; 3] = [SpeakerIcon::Off, SpeakerIcon::Down, SpeakerIcon::Up];

    pub fn for_level(level: f64) -> Self {
        if level > 0.5 {
            SpeakerIcon::Up
        } else if level > 0.0 {
            SpeakerIcon::Down
        } else {
            SpeakerIcon::Off
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            SpeakerIcon::Off => "icon-volume-off",
            SpeakerIcon::Down => "icon-volume-down",
            SpeakerIcon::Up => "icon-volume-up",
        }
    }
}

/// Mute bookkeeping behind the speaker button.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeState {
    muted: bool,
    last_level: f64,
}

impl VolumeState {
    pub fn new(level: f64) -> Self {
        let mut state = Self {
            muted: false,
            last_level: 1.0,
        };
        state.observe(level);
        state
    }

    /// Record a level set from the volume bar.
    pub fn observe(&mut self, level: f64) -> SpeakerIcon {
        self.muted = level <= 0.0;
        // dragging to zero must not make unmute restore silence
        self.last_level = if level > 0.0 { level } else { 1.0 };
        SpeakerIcon::for_level(level)
    }

    /// Flip mute and return the level to apply.
    pub fn toggle_mute(&mut self) -> f64 {
        let level = if self.muted { self.last_level } else { 0.0 };
        self.muted = !self.muted;
        level
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn last_level(&self) -> f64 {
        self.last_level
    }
}

/// The page side of the non-bar controls.
pub trait TransportView {
    fn set_play_icon(&self, icon: PlayIcon);
    fn set_speaker_icon(&self, icon: SpeakerIcon);
    fn set_elapsed(&self, text: &str);
    fn set_title(&self, title: &str);
}

pub struct SeekBar<M> {
    bar: DragBar,
    source: Weak<SampleSource<M>>,
}

impl<M: MediaElement> SeekBar<M> {
    pub fn bar(&self) -> &DragBar {
        &self.bar
    }
}

impl<M: MediaElement> DragTarget for SeekBar<M> {
    fn capture(&self) -> CaptureToken {
        let playing = self
            .source
            .upgrade()
            .is_some_and(|source| !source.is_paused());
        CaptureToken::new(playing)
    }

    fn drag_to(&self, client_x: f64, client_y: f64) {
        let fraction = self.bar.drag_to(client_x, client_y);
        self.bar.fill_to_handle(Overlay::Played);

        let Some(source) = self.source.upgrade() else {
            return;
        };
        let duration = source.media().duration();
        if duration.is_finite() && duration > 0.0 {
            source.events().emit(&Event::Seeking {
                time: (fraction * duration).floor(),
            });
        }
    }

    fn release(&self, token: CaptureToken) {
        if let Some(source) = self.source.upgrade() {
            source.events().emit(&Event::Seeked {
                resume: token.resume(),
            });
        }
    }
}

pub struct VolumeBar<M> {
    bar: DragBar,
    source: Weak<SampleSource<M>>,
    view: Rc<dyn TransportView>,
    state: RefCell<VolumeState>,
}

impl<M: MediaElement> VolumeBar<M> {
    pub fn bar(&self) -> &DragBar {
        &self.bar
    }

    pub fn state(&self) -> VolumeState {
        *self.state.borrow()
    }

    /// Apply a level coming from the bar itself.
    fn apply(&self, level: f64) {
        self.bar.fill_to_handle(Overlay::Level);
        if let Some(source) = self.source.upgrade() {
            source.set_gain(level);
        }
        let icon = self.state.borrow_mut().observe(level);
        self.view.set_speaker_icon(icon);
    }

    /// Put the handle at `level` and run the whole volume pipeline once.
    pub fn set_level(&self, level: f64) {
        self.bar.set_fraction(level);
        self.apply(level);
    }

    pub fn toggle_mute(&self) {
        let level = self.state.borrow_mut().toggle_mute();
        self.bar.set_fraction(level);
        self.bar.fill_to_handle(Overlay::Level);
        if let Some(source) = self.source.upgrade() {
            source.set_gain(level);
        }
        self.view.set_speaker_icon(SpeakerIcon::for_level(level));
    }
}

impl<M: MediaElement> DragTarget for VolumeBar<M> {
    fn capture(&self) -> CaptureToken {
        CaptureToken::new(false)
    }

    // gain follows the handle live, not only on release
    fn drag_to(&self, client_x: f64, client_y: f64) {
        let level = self.bar.drag_to(client_x, client_y);
        self.apply(level);
    }

    fn release(&self, _token: CaptureToken) {}
}

pub struct TransportUi<M> {
    controller: Rc<TransportController<M>>,
    view: Rc<dyn TransportView>,
    seek: Rc<SeekBar<M>>,
    volume: Rc<VolumeBar<M>>,
    drag: Rc<DragCoordinator>,
}

impl<M: MediaElement + 'static> TransportUi<M> {
    /// `drag` is the capture slot shared with every other player on the page.
    pub fn new(
        controller: Rc<TransportController<M>>,
        view: Rc<dyn TransportView>,
        seek_view: Rc<dyn BarView>,
        volume_view: Rc<dyn BarView>,
        drag: Rc<DragCoordinator>,
    ) -> Rc<Self> {
        let source = Rc::downgrade(controller.source());
        let initial = controller.source().gain();
        Rc::new(Self {
            seek: Rc::new(SeekBar {
                bar: DragBar::new(seek_view),
                source: source.clone(),
            }),
            volume: Rc::new(VolumeBar {
                bar: DragBar::new(volume_view),
                source,
                view: Rc::clone(&view),
                state: RefCell::new(VolumeState::new(initial)),
            }),
            controller,
            view,
            drag,
        })
    }

    /// Subscribe to the source and bring every control to its initial state.
    pub fn bind(self: &Rc<Self>) -> Result<(), EventError> {
        let events = self.controller.source().events();

        let view = Rc::clone(&self.view);
        events.subscribe(EventKind::Playing, move |_| view.set_play_icon(PlayIcon::Pause))?;

        let view = Rc::clone(&self.view);
        events.subscribe(EventKind::Pause, move |_| view.set_play_icon(PlayIcon::Play))?;

        let view = Rc::clone(&self.view);
        events.subscribe(EventKind::Title, move |event| {
            if let Event::Title(title) = event {
                view.set_title(title);
            }
        })?;

        let weak = Rc::downgrade(self);
        events.subscribe(EventKind::TimeUpdate, move |_| {
            if let Some(this) = weak.upgrade() {
                this.on_time_update();
            }
        })?;

        let weak = Rc::downgrade(self);
        events.subscribe(EventKind::Progress, move |_| {
            if let Some(this) = weak.upgrade() {
                this.on_progress();
            }
        })?;

        self.view.set_play_icon(PlayIcon::Play);
        self.view.set_elapsed(&format_elapsed(0.0));
        self.volume.set_level(self.controller.source().gain());
        Ok(())
    }

    fn on_time_update(&self) {
        let media = self.controller.source().media();
        let current = media.current_time();
        let duration = media.duration();

        if !media.paused() && duration.is_finite() && duration > 0.0 {
            let bar = self.seek.bar();
            bar.set_handle(bar.metrics().handle_for_fraction(current / duration).round());
            bar.fill_to_handle(Overlay::Played);
        }
        self.view.set_elapsed(&format_elapsed(current));
    }

    // Only the first buffered span is drawn.
    fn on_progress(&self) {
        let media = self.controller.source().media();
        let duration = media.duration();
        if !(duration.is_finite() && duration > 0.0) {
            return;
        }
        if let Some(&(start, end)) = media.buffered().first() {
            self.seek
                .bar()
                .fill(Overlay::Buffered, start / duration, end / duration);
        }
    }

    pub fn on_toggle(&self) {
        self.controller.toggle();
    }

    pub fn on_back(&self) {
        self.controller.last();
    }

    pub fn on_skip(&self) {
        self.controller.next();
    }

    pub fn on_speaker(&self) {
        self.volume.toggle_mute();
    }

    pub fn seek_pointer_down(&self, client_x: f64, client_y: f64) {
        let target: Rc<dyn DragTarget> = self.seek.clone();
        self.drag.pointer_down(&target, client_x, client_y);
    }

    pub fn volume_pointer_down(&self, client_x: f64, client_y: f64) {
        let target: Rc<dyn DragTarget> = self.volume.clone();
        self.drag.pointer_down(&target, client_x, client_y);
    }

    pub fn pointer_move(&self, client_x: f64, client_y: f64) {
        self.drag.pointer_move(client_x, client_y);
    }

    pub fn pointer_up(&self) {
        self.drag.pointer_up();
    }

    pub fn controller(&self) -> &Rc<TransportController<M>> {
        &self.controller
    }

    pub fn seek_bar(&self) -> &SeekBar<M> {
        &self.seek
    }

    pub fn volume_bar(&self) -> &VolumeBar<M> {
        &self.volume
    }
}
