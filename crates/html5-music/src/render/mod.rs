//! Visualization: a fixed-period render loop drawing every configured effect
//! from the shared analysis graph.

pub mod draw;
pub mod layout;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::config::{EffectKind, EffectSpec};
use crate::events::{EventError, EventKind};
use crate::source::{AnalysisGraph, MediaElement, SampleSource};

use self::layout::FillRect;

/// A 2D drawing surface sized by page layout.
pub trait Surface {
    /// Copy the layout size into the backing store and return it.
    fn sync_size(&mut self) -> (f64, f64);
    /// Backing store size as of the last sync.
    fn size(&self) -> (f64, f64);
    fn clear(&mut self);
    fn set_fill_style(&mut self, color: &str);
    fn fill_rect(&mut self, rect: FillRect);
    fn set_stroke_style(&mut self, color: &str, line_width: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self);
}

/// Periodic callback driving [`RenderEngine::tick`].
pub trait FrameTicker {
    fn start(&self, period_ms: u32);
    fn stop(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Drawn,
    /// Playing, but no analysis data yet.
    Skipped,
    /// Playback is paused; the loop has stopped itself.
    Halted,
}

struct Effect {
    spec: EffectSpec,
    surface: Box<dyn Surface>,
    max_samples: usize,
}

impl Effect {
    fn resize(&mut self) {
        let (width, height) = self.surface.sync_size();
        let needed = self
            .spec
            .position
            .max_samples_needed(width, height, self.spec.size)
            .ceil();
        self.max_samples = if needed.is_finite() && needed > 0.0 {
            needed as usize
        } else {
            0
        };
    }
}

#[derive(Default)]
struct Buffers {
    time_domain: Vec<u8>,
    frequency: Vec<u8>,
}

pub struct RenderEngine<M> {
    source: Rc<SampleSource<M>>,
    effects: RefCell<Vec<Effect>>,
    buffers: RefCell<Buffers>,
    frame_ms: u32,
    state: Cell<EngineState>,
    ticker: Box<dyn FrameTicker>,
}

impl<M: MediaElement + 'static> RenderEngine<M> {
    /// `make_ticker` receives a weak handle to the engine so the ticker's
    /// callback can reach [`RenderEngine::tick`] without keeping it alive.
    pub fn new<F>(
        source: Rc<SampleSource<M>>,
        effects: Vec<(EffectSpec, Box<dyn Surface>)>,
        frame_ms: u32,
        make_ticker: F,
    ) -> Rc<Self>
    where
        F: FnOnce(Weak<Self>) -> Box<dyn FrameTicker>,
    {
        let effects = effects
            .into_iter()
            .map(|(spec, surface)| Effect {
                spec,
                surface,
                max_samples: 0,
            })
            .collect();
        let engine = Rc::new_cyclic(|weak| Self {
            source,
            effects: RefCell::new(effects),
            buffers: RefCell::new(Buffers::default()),
            frame_ms,
            state: Cell::new(EngineState::Idle),
            ticker: make_ticker(weak.clone()),
        });
        engine.resize();
        engine
    }

    /// Start the loop whenever playback starts.
    pub fn bind(self: &Rc<Self>) -> Result<(), EventError> {
        let weak = Rc::downgrade(self);
        self.source.events().subscribe(EventKind::Playing, move |_| {
            if let Some(this) = weak.upgrade() {
                this.on_playing();
            }
        })?;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        self.state.get()
    }

    pub fn on_playing(&self) {
        if self.state.get() == EngineState::Running
            || self.effects.borrow().is_empty()
            || !self.source.analysis_supported()
        {
            return;
        }
        self.state.set(EngineState::Running);
        self.ticker.start(self.frame_ms);
        log::debug!("render loop started ({} ms frames)", self.frame_ms);
    }

    /// Re-read every surface's layout size.
    pub fn resize(&self) {
        for effect in self.effects.borrow_mut().iter_mut() {
            effect.resize();
        }
    }

    /// Most samples any effect can show right now.
    pub fn max_samples(&self) -> usize {
        self.effects
            .borrow()
            .iter()
            .map(|effect| effect.max_samples)
            .max()
            .unwrap_or(0)
    }

    /// One frame. Surfaces are cleared first, so a halted loop leaves them
    /// blank.
    pub fn tick(&self) -> Tick {
        let mut effects = self.effects.borrow_mut();
        for effect in effects.iter_mut() {
            effect.surface.clear();
        }

        if self.source.is_paused() {
            self.halt();
            return Tick::Halted;
        }
        let Some(graph) = self.source.analysis() else {
            // a graph that failed to build will never draw anything
            if !self.source.analysis_supported() {
                self.halt();
                return Tick::Halted;
            }
            return Tick::Skipped;
        };

        let wanted = effects.iter().map(|e| e.max_samples).max().unwrap_or(0);
        let mut buffers = self.buffers.borrow_mut();
        read_samples(graph.as_ref(), wanted, &mut buffers);

        for effect in effects.iter_mut() {
            match effect.spec.kind {
                EffectKind::Spectrum => draw::draw_spectrum(
                    &effect.spec,
                    effect.surface.as_mut(),
                    &buffers.frequency,
                ),
                EffectKind::Waveform => draw::draw_waveform(
                    &effect.spec,
                    effect.surface.as_mut(),
                    &buffers.time_domain,
                ),
            }
        }
        Tick::Drawn
    }

    fn halt(&self) {
        self.ticker.stop();
        self.state.set(EngineState::Idle);
        log::debug!("render loop halted");
    }
}

/// Fill both buffers, each capped by what the graph can produce.
fn read_samples(graph: &dyn AnalysisGraph, wanted: usize, buffers: &mut Buffers) {
    buffers.time_domain.resize(graph.fft_size().min(wanted), 0);
    buffers
        .frequency
        .resize(graph.frequency_bin_count().min(wanted), 0);
    graph.read_time_domain(&mut buffers.time_domain);
    graph.read_frequency(&mut buffers.frequency);
}
