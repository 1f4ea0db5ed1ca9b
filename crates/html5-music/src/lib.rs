//! Embeddable audio player with a live spectrum and waveform visualizer.
//!
//! The player core is platform independent: it talks to the page through the
//! [`MediaElement`], [`AnalysisGraph`], [`Surface`], [`BarView`] and
//! [`TransportView`] traits. On `wasm32` the `web` module implements them on
//! top of the DOM, canvas 2D and Web Audio, and mounts one widget per
//! `<script type="application/json" data-html5-music>` tag at startup.

pub mod config;
pub mod drag;
pub mod error;
pub mod events;
pub mod render;
pub mod source;
pub mod transport;
pub mod ui;
pub mod widget;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, EffectKind, EffectSpec, Position, Settings, Track};
pub use drag::BarView;
pub use error::PlayerError;
pub use events::{Event, EventBus, EventError, EventKind};
pub use render::{FrameTicker, RenderEngine, Surface};
pub use source::{AnalysisFactory, AnalysisGraph, MediaElement, SampleSource};
pub use transport::{PlaybackState, TransportController};
pub use ui::{TransportUi, TransportView};
pub use widget::{Widget, WidgetParts};
