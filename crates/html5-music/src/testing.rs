//! In-memory stand-ins for the page, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::{Settings, Track};
use crate::drag::{BarMetrics, BarView, DragCoordinator, OffsetBox, Overlay, Span};
use crate::error::PlayerError;
use crate::events::Event;
use crate::render::layout::FillRect;
use crate::render::{FrameTicker, Surface};
use crate::source::{AnalysisFactory, AnalysisGraph, MediaElement, SampleSource};
use crate::transport::TransportController;
use crate::ui::{PlayIcon, SpeakerIcon, TransportUi, TransportView};

pub fn settings(tracks: usize) -> Settings {
    Settings {
        audio: (1..=tracks)
            .map(|n| {
                let title = format!("Track {n}");
                Track::new(Some(&title), [("mp3", format!("{n}.mp3"))])
            })
            .collect(),
        volume: 1.0,
        ..Settings::default()
    }
}

pub struct FakeMedia {
    pub paused: Cell<bool>,
    pub current_time: Cell<f64>,
    pub duration: Cell<f64>,
    pub buffered: RefCell<Vec<(f64, f64)>>,
    pub sources: RefCell<Vec<(Option<String>, String)>>,
    pub controls: Cell<bool>,
    pub autoplay: Cell<bool>,
    pub loads: Cell<u32>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self {
            paused: Cell::new(true),
            current_time: Cell::new(0.0),
            duration: Cell::new(f64::NAN),
            buffered: RefCell::new(Vec::new()),
            sources: RefCell::new(Vec::new()),
            controls: Cell::new(false),
            autoplay: Cell::new(false),
            loads: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }
}

impl MediaElement for FakeMedia {
    fn paused(&self) -> bool {
        self.paused.get()
    }

    fn play(&self) {
        self.calls.borrow_mut().push("play");
        self.paused.set(false);
    }

    fn pause(&self) {
        self.calls.borrow_mut().push("pause");
        self.paused.set(true);
    }

    fn current_time(&self) -> f64 {
        self.current_time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.current_time.set(seconds);
    }

    fn duration(&self) -> f64 {
        self.duration.get()
    }

    fn buffered(&self) -> Vec<(f64, f64)> {
        self.buffered.borrow().clone()
    }

    fn clear_sources(&self) {
        self.sources.borrow_mut().clear();
    }

    fn append_source(&self, mime: Option<&str>, url: &str) {
        self.sources
            .borrow_mut()
            .push((mime.map(str::to_string), url.to_string()));
    }

    fn set_controls(&self, enabled: bool) {
        self.controls.set(enabled);
    }

    fn set_autoplay(&self, enabled: bool) {
        self.autoplay.set(enabled);
    }

    fn load(&self) {
        self.loads.set(self.loads.get() + 1);
    }
}

/// Reads are recorded as `("time" | "frequency", length)`; every sample is
/// `level`.
pub struct FakeGraph {
    fft_size: usize,
    bins: usize,
    level: u8,
    gains: Rc<RefCell<Vec<f64>>>,
    reads: Rc<RefCell<Vec<(&'static str, usize)>>>,
}

impl AnalysisGraph for FakeGraph {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn frequency_bin_count(&self) -> usize {
        self.bins
    }

    fn read_time_domain(&self, out: &mut [u8]) {
        self.reads.borrow_mut().push(("time", out.len()));
        out.fill(self.level);
    }

    fn read_frequency(&self, out: &mut [u8]) {
        self.reads.borrow_mut().push(("frequency", out.len()));
        out.fill(self.level);
    }

    fn set_gain(&self, gain: f64) {
        self.gains.borrow_mut().push(gain);
    }
}

pub struct FakeFactory {
    fft_size: usize,
    bins: usize,
    fail: bool,
    pub builds: Rc<Cell<u32>>,
    pub gains: Rc<RefCell<Vec<f64>>>,
    pub reads: Rc<RefCell<Vec<(&'static str, usize)>>>,
}

impl FakeFactory {
    pub fn new(fft_size: usize, bins: usize) -> Self {
        Self {
            fft_size,
            bins,
            fail: false,
            builds: Rc::default(),
            gains: Rc::default(),
            reads: Rc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0, 0)
        }
    }
}

impl AnalysisFactory<FakeMedia> for FakeFactory {
    fn build(&self, _media: &FakeMedia) -> Result<Rc<dyn AnalysisGraph>, PlayerError> {
        self.builds.set(self.builds.get() + 1);
        if self.fail {
            return Err(PlayerError::AnalysisUnavailable("no audio context".into()));
        }
        Ok(Rc::new(FakeGraph {
            fft_size: self.fft_size,
            bins: self.bins,
            level: 200,
            gains: self.gains.clone(),
            reads: self.reads.clone(),
        }))
    }
}

pub struct FakeBar {
    metrics: BarMetrics,
    pub handle: Cell<f64>,
    ranges: RefCell<HashMap<&'static str, Span>>,
}

fn overlay_key(overlay: Overlay) -> &'static str {
    match overlay {
        Overlay::Buffered => "buffered",
        Overlay::Played => "played",
        Overlay::Level => "level",
    }
}

impl FakeBar {
    pub fn new(metrics: BarMetrics) -> Self {
        Self {
            metrics,
            handle: Cell::new(-1.0),
            ranges: RefCell::new(HashMap::new()),
        }
    }

    pub fn range(&self, overlay: Overlay) -> Option<Span> {
        self.ranges.borrow().get(overlay_key(overlay)).copied()
    }
}

impl BarView for FakeBar {
    fn metrics(&self) -> BarMetrics {
        self.metrics
    }

    fn offset_chain(&self) -> Vec<OffsetBox> {
        Vec::new()
    }

    fn place_handle(&self, left_px: f64) {
        self.handle.set(left_px);
    }

    fn place_range(&self, overlay: Overlay, span: Span) {
        self.ranges.borrow_mut().insert(overlay_key(overlay), span);
    }
}

#[derive(Default)]
pub struct FakeTransportView {
    pub play: Cell<Option<PlayIcon>>,
    pub speaker: Cell<Option<SpeakerIcon>>,
    pub elapsed: RefCell<String>,
    pub title: RefCell<String>,
}

impl TransportView for FakeTransportView {
    fn set_play_icon(&self, icon: PlayIcon) {
        self.play.set(Some(icon));
    }

    fn set_speaker_icon(&self, icon: SpeakerIcon) {
        self.speaker.set(Some(icon));
    }

    fn set_elapsed(&self, text: &str) {
        *self.elapsed.borrow_mut() = text.to_string();
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear,
    FillStyle(String),
    Fill(FillRect),
    StrokeStyle(String, f64),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    Stroke,
}

impl SurfaceOp {
    pub fn fill(&self) -> Option<FillRect> {
        match self {
            SurfaceOp::Fill(rect) => Some(*rect),
            _ => None,
        }
    }
}

pub struct FakeSurface {
    layout: Rc<Cell<(f64, f64)>>,
    size: (f64, f64),
    log: Rc<RefCell<Vec<SurfaceOp>>>,
}

impl FakeSurface {
    pub fn new(width: f64, height: f64) -> (Self, Rc<RefCell<Vec<SurfaceOp>>>) {
        let (surface, log, _) = Self::resizable(width, height);
        (surface, log)
    }

    /// Also hands back the layout size, which [`Surface::sync_size`] picks up.
    #[allow(clippy::type_complexity)]
    pub fn resizable(
        width: f64,
        height: f64,
    ) -> (Self, Rc<RefCell<Vec<SurfaceOp>>>, Rc<Cell<(f64, f64)>>) {
        let layout = Rc::new(Cell::new((width, height)));
        let log = Rc::new(RefCell::new(Vec::new()));
        let surface = Self {
            layout: layout.clone(),
            size: (width, height),
            log: log.clone(),
        };
        (surface, log, layout)
    }

    fn record(&self, op: SurfaceOp) {
        self.log.borrow_mut().push(op);
    }
}

impl Surface for FakeSurface {
    fn sync_size(&mut self) -> (f64, f64) {
        self.size = self.layout.get();
        self.size
    }

    fn size(&self) -> (f64, f64) {
        self.size
    }

    fn clear(&mut self) {
        self.record(SurfaceOp::Clear);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.record(SurfaceOp::FillStyle(color.to_string()));
    }

    fn fill_rect(&mut self, rect: FillRect) {
        self.record(SurfaceOp::Fill(rect));
    }

    fn set_stroke_style(&mut self, color: &str, line_width: f64) {
        self.record(SurfaceOp::StrokeStyle(color.to_string(), line_width));
    }

    fn begin_path(&mut self) {
        self.record(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.record(SurfaceOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.record(SurfaceOp::LineTo(x, y));
    }

    fn stroke(&mut self) {
        self.record(SurfaceOp::Stroke);
    }
}

#[derive(Clone, Default)]
pub struct FakeTicker {
    pub starts: Rc<Cell<u32>>,
    pub stops: Rc<Cell<u32>>,
    pub period: Rc<Cell<Option<u32>>>,
}

impl FrameTicker for FakeTicker {
    fn start(&self, period_ms: u32) {
        self.starts.set(self.starts.get() + 1);
        self.period.set(Some(period_ms));
    }

    fn stop(&self) {
        self.stops.set(self.stops.get() + 1);
    }
}

fn boxed(factory: FakeFactory) -> Option<Box<dyn AnalysisFactory<FakeMedia>>> {
    Some(Box::new(factory))
}

/// A controller over `tracks` tracks with the first one loaded and playing.
pub fn playing_controller(
    tracks: usize,
) -> (Rc<TransportController<FakeMedia>>, Rc<SampleSource<FakeMedia>>) {
    let s = settings(tracks);
    let source = Rc::new(SampleSource::new(FakeMedia::new(), &s, None));
    let controller = TransportController::new(source.clone(), s.audio);
    controller.initialize().unwrap();
    source.dispatch(&Event::CanPlay);
    source.play();
    (controller, source)
}

pub const BAR_METRICS: BarMetrics = BarMetrics {
    track_width: 110.0,
    client_width: 110.0,
    inner_width: 100.0,
    handle_width: 10.0,
};

pub struct MountedUi {
    pub ui: Rc<TransportUi<FakeMedia>>,
    pub view: Rc<FakeTransportView>,
    pub seek_bar: Rc<FakeBar>,
    pub volume_bar: Rc<FakeBar>,
    pub gains: Rc<RefCell<Vec<f64>>>,
}

/// A bound transport UI with the first track playing.
pub fn mounted_ui(tracks: usize) -> MountedUi {
    mounted_ui_with(tracks, Rc::new(DragCoordinator::new()))
}

/// Like [`mounted_ui`], capturing drags through `drag`.
pub fn mounted_ui_with(tracks: usize, drag: Rc<DragCoordinator>) -> MountedUi {
    let s = settings(tracks);
    let factory = FakeFactory::new(2048, 1024);
    let gains = factory.gains.clone();
    let source = Rc::new(SampleSource::new(FakeMedia::new(), &s, boxed(factory)));
    let controller = TransportController::new(source.clone(), s.audio);

    let view = Rc::new(FakeTransportView::default());
    let seek_bar = Rc::new(FakeBar::new(BAR_METRICS));
    let volume_bar = Rc::new(FakeBar::new(BAR_METRICS));
    let ui = TransportUi::new(
        controller.clone(),
        view.clone(),
        seek_bar.clone(),
        volume_bar.clone(),
        drag,
    );
    ui.bind().unwrap();

    controller.initialize().unwrap();
    source.dispatch(&Event::CanPlay);
    source.play();

    MountedUi {
        ui,
        view,
        seek_bar,
        volume_bar,
        gains,
    }
}
