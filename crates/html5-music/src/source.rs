//! The sample source: one media element, its lifecycle events, and the
//! analysis graph hanging off it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{mime_type, Settings, Track};
use crate::error::PlayerError;
use crate::events::{Event, EventBus, EventKind};

/// The platform's media-playback primitive.
pub trait MediaElement {
    fn paused(&self) -> bool;
    fn play(&self);
    fn pause(&self);
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);
    /// Seconds, NaN while unknown.
    fn duration(&self) -> f64;
    /// Buffered spans in seconds, in platform order.
    fn buffered(&self) -> Vec<(f64, f64)>;
    fn clear_sources(&self);
    fn append_source(&self, mime: Option<&str>, url: &str);
    fn set_controls(&self, enabled: bool);
    fn set_autoplay(&self, enabled: bool);
    fn load(&self);
}

/// A built source -> analyser -> gain -> output chain.
pub trait AnalysisGraph {
    fn fft_size(&self) -> usize;
    fn frequency_bin_count(&self) -> usize;
    fn read_time_domain(&self, out: &mut [u8]);
    fn read_frequency(&self, out: &mut [u8]);
    fn set_gain(&self, gain: f64);
}

/// Builds the analysis graph for a media element. A media element can feed
/// exactly one source node for its whole lifetime, so this runs at most once.
pub trait AnalysisFactory<M> {
    fn build(&self, media: &M) -> Result<Rc<dyn AnalysisGraph>, PlayerError>;
}

enum Graph {
    Uninitialized,
    Ready(Rc<dyn AnalysisGraph>),
    Unavailable,
}

pub const SOURCE_EVENTS: &[EventKind] = &[
    EventKind::CanPlay,
    EventKind::Progress,
    EventKind::TimeUpdate,
    EventKind::Playing,
    EventKind::Pause,
    EventKind::Ended,
    EventKind::Seeking,
    EventKind::Seeked,
    EventKind::Title,
];

pub struct SampleSource<M> {
    media: M,
    autoplay: bool,
    ready: Cell<bool>,
    seeking: Cell<bool>,
    gain: Cell<f64>,
    graph: RefCell<Graph>,
    factory: Option<Box<dyn AnalysisFactory<M>>>,
    bus: EventBus,
}

impl<M: MediaElement> SampleSource<M> {
    /// `factory` is `None` when the platform has no analysis primitive;
    /// playback still works, nothing can be visualized.
    pub fn new(media: M, settings: &Settings, factory: Option<Box<dyn AnalysisFactory<M>>>) -> Self {
        let graph = if factory.is_some() {
            Graph::Uninitialized
        } else {
            Graph::Unavailable
        };
        Self {
            media,
            autoplay: settings.autoplay,
            ready: Cell::new(false),
            seeking: Cell::new(false),
            gain: Cell::new(settings.volume),
            graph: RefCell::new(graph),
            factory,
            bus: EventBus::new("sample source", SOURCE_EVENTS),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn is_paused(&self) -> bool {
        self.media.paused()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking.get()
    }

    /// Replace the current track. Safe to call mid-playback: the element is
    /// paused and stripped of its previous sources before the new ones go in.
    pub fn load(&self, track: &Track) {
        self.media.pause();
        self.media.clear_sources();
        self.ready.set(false);

        for (format, url) in track.sources() {
            self.media.append_source(mime_type(format), url);
        }
        if let Some(title) = &track.title {
            self.bus.emit(&Event::Title(title.clone()));
        }

        self.media.set_controls(true);
        if self.autoplay {
            self.media.set_autoplay(true);
        }
        self.media.load();
    }

    /// No-op unless the track is ready, no seek is in flight, and the element
    /// is paused.
    pub fn play(&self) {
        if self.ready.get() && !self.seeking.get() && self.media.paused() {
            self.media.play();
        }
    }

    pub fn pause(&self) {
        if !self.media.paused() {
            self.media.pause();
        }
    }

    /// First half of a seek: silence output, then move the play head.
    pub fn begin_seek(&self, time: f64) {
        self.pause();
        self.seeking.set(true);
        self.media.set_current_time(time);
    }

    pub fn finish_seek(&self, resume: bool) {
        self.seeking.set(false);
        if resume {
            self.play();
        }
    }

    /// Entry point for the platform's native media events. Subscribers see
    /// the event before the source reacts to it.
    pub fn dispatch(&self, event: &Event) {
        self.bus.emit(event);
        if *event == Event::CanPlay {
            self.on_can_play();
        }
    }

    fn on_can_play(&self) {
        let first = !self.ready.replace(true);
        if first && self.autoplay {
            self.play();
        }
        self.ensure_graph();
    }

    fn ensure_graph(&self) {
        let mut graph = self.graph.borrow_mut();
        if !matches!(*graph, Graph::Uninitialized) {
            return;
        }
        let Some(factory) = &self.factory else {
            *graph = Graph::Unavailable;
            return;
        };
        *graph = match factory.build(&self.media) {
            Ok(built) => {
                built.set_gain(self.gain.get());
                log::info!(
                    "analysis graph ready ({} frequency bins)",
                    built.frequency_bin_count()
                );
                Graph::Ready(built)
            }
            Err(err) => {
                log::warn!("visualizer disabled: {err}");
                Graph::Unavailable
            }
        };
    }

    pub fn analysis(&self) -> Option<Rc<dyn AnalysisGraph>> {
        match &*self.graph.borrow() {
            Graph::Ready(graph) => Some(Rc::clone(graph)),
            Graph::Uninitialized | Graph::Unavailable => None,
        }
    }

    /// False once it is known that no analysis graph will ever exist.
    pub fn analysis_supported(&self) -> bool {
        !matches!(*self.graph.borrow(), Graph::Unavailable)
    }

    pub fn gain(&self) -> f64 {
        self.gain.get()
    }

    /// Takes effect immediately when the graph exists, otherwise once it is
    /// built.
    pub fn set_gain(&self, gain: f64) {
        self.gain.set(gain);
        if let Graph::Ready(graph) = &*self.graph.borrow() {
            graph.set_gain(gain);
        }
    }
}
