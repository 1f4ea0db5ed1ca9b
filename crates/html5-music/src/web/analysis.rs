use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AnalyserNode, AudioContext, GainNode, MediaElementAudioSourceNode};

use crate::config::Settings;
use crate::error::PlayerError;
use crate::source::{AnalysisFactory, AnalysisGraph};

use super::describe;
use super::media::DomMedia;

fn unavailable(err: JsValue) -> PlayerError {
    PlayerError::AnalysisUnavailable(describe(&err))
}

// Older WebKit only ships the prefixed constructor.
const CONTEXT_CONSTRUCTORS: [&str; 2] = ["AudioContext", "webkitAudioContext"];

fn context_constructor() -> Option<js_sys::Function> {
    let window = web_sys::window()?;
    CONTEXT_CONSTRUCTORS.iter().find_map(|name| {
        js_sys::Reflect::get(&window, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
    })
}

/// Whether the page can build an analysis graph at all.
pub fn web_audio_available() -> bool {
    context_constructor().is_some()
}

fn audio_context() -> Result<AudioContext, PlayerError> {
    let constructor = context_constructor()
        .ok_or_else(|| PlayerError::AnalysisUnavailable("no AudioContext constructor".into()))?;
    let context = js_sys::Reflect::construct(&constructor, &js_sys::Array::new()).map_err(unavailable)?;
    Ok(context.unchecked_into::<AudioContext>())
}

pub struct WebAudioFactory {
    fft_size: u32,
    smoothing: f64,
    min_decibels: f64,
    max_decibels: f64,
}

impl WebAudioFactory {
    pub fn new(settings: &Settings) -> Self {
        Self {
            fft_size: settings.fft_size(),
            smoothing: settings.smoothing,
            min_decibels: settings.mindecibels,
            max_decibels: settings.maxdecibels,
        }
    }

    fn configure(&self, analyser: &AnalyserNode) {
        analyser.set_fft_size(self.fft_size);
        analyser.set_smoothing_time_constant(self.smoothing);
        // min must stay below max at every step
        if self.min_decibels >= analyser.max_decibels() {
            analyser.set_max_decibels(self.max_decibels);
            analyser.set_min_decibels(self.min_decibels);
        } else {
            analyser.set_min_decibels(self.min_decibels);
            analyser.set_max_decibels(self.max_decibels);
        }
    }
}

impl AnalysisFactory<DomMedia> for WebAudioFactory {
    fn build(&self, media: &DomMedia) -> Result<Rc<dyn AnalysisGraph>, PlayerError> {
        let context = audio_context()?;
        let analyser = context.create_analyser().map_err(unavailable)?;
        self.configure(&analyser);

        let source = context
            .create_media_element_source(media.element())
            .map_err(unavailable)?;
        let gain = context.create_gain().map_err(unavailable)?;

        source.connect_with_audio_node(&analyser).map_err(unavailable)?;
        analyser.connect_with_audio_node(&gain).map_err(unavailable)?;
        gain.connect_with_audio_node(&context.destination())
            .map_err(unavailable)?;

        Ok(Rc::new(WebAudioGraph {
            _context: context,
            _source: source,
            analyser,
            gain,
        }))
    }
}

struct WebAudioGraph {
    _context: AudioContext,
    _source: MediaElementAudioSourceNode,
    analyser: AnalyserNode,
    gain: GainNode,
}

impl AnalysisGraph for WebAudioGraph {
    fn fft_size(&self) -> usize {
        self.analyser.fft_size() as usize
    }

    fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn read_time_domain(&self, out: &mut [u8]) {
        self.analyser.get_byte_time_domain_data(out);
    }

    fn read_frequency(&self, out: &mut [u8]) {
        self.analyser.get_byte_frequency_data(out);
    }

    fn set_gain(&self, gain: f64) {
        self.gain.gain().set_value(gain as f32);
    }
}
