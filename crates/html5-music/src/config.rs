//! Widget configuration, read once from the JSON blob embedded in the page.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("playlist is empty")]
    EmptyPlaylist,

    #[error("track {index} has no playable source")]
    TrackWithoutSource { index: usize },

    #[error("volume {0} is outside 0.0..=1.0")]
    Volume(f64),

    #[error("smoothing {0} is outside 0.0..=1.0")]
    Smoothing(f64),

    #[error("analysis size {0} must be a power of two between 16 and 16384")]
    AnalysisSize(u32),

    #[error("mindecibels ({min}) must be below maxdecibels ({max})")]
    Decibels { min: f64, max: f64 },

    #[error("frame interval must be at least 1 ms")]
    ZeroFrame,

    #[error("effect {index} has non-positive size {size}")]
    EffectSize { index: usize, size: f64 },

    #[error("spectrum effect {index} needs at least one color")]
    EffectColors { index: usize },

    #[error("effect {index}: position {position} cannot be used by a {kind} effect")]
    PositionMismatch {
        index: usize,
        kind: EffectKind,
        position: Position,
    },
}

/// One playlist entry: an optional display title plus one URL per format.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    sources: BTreeMap<String, String>,
}

impl Track {
    pub fn new<I, K, V>(title: Option<&str>, sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            title: title.map(str::to_owned),
            sources: sources
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sources in attachment order. Keys are walked in reverse lexicographic
    /// order so the platform sees the same preference list on every load.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .rev()
            .map(|(format, url)| (format.as_str(), url.as_str()))
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// MIME type announced for a source format. Unknown formats are attached
/// untyped and left to the platform's sniffing.
pub fn mime_type(format: &str) -> Option<&'static str> {
    match format {
        "mp3" => Some("audio/mpeg"),
        "ogg" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        "wav" => Some("audio/wav"),
        "flac" => Some("audio/flac"),
        "aac" | "m4a" => Some("audio/mp4"),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum EffectKind {
    #[serde(rename = "spectrum", alias = "fft")]
    Spectrum,
    #[serde(rename = "waveform")]
    Waveform,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectKind::Spectrum => "spectrum",
            EffectKind::Waveform => "waveform",
        })
    }
}

/// Layout variant of an effect on its surface.
///
/// Spectrum variants name the edge the bars grow from and the direction the
/// bins run in (`topright`: bars hang from the top edge, bins run left to
/// right). `*mirror` variants run outwards from the middle of the edge. The
/// `horizontal*`/`vertical*` spectrum variants grow symmetrically from the
/// surface's center line. `horizontal`/`vertical` alone are waveform lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    TopRight,
    TopLeft,
    TopMirror,
    BottomRight,
    BottomLeft,
    BottomMirror,
    LeftDown,
    LeftUp,
    LeftMirror,
    RightDown,
    RightUp,
    RightMirror,
    HorizontalRight,
    HorizontalLeft,
    HorizontalMirror,
    VerticalDown,
    VerticalUp,
    VerticalMirror,
    Horizontal,
    Vertical,
}

impl Position {
    pub fn kind(self) -> EffectKind {
        match self {
            Position::Horizontal | Position::Vertical => EffectKind::Waveform,
            _ => EffectKind::Spectrum,
        }
    }

    /// Number of samples an effect in this position can show on a surface of
    /// the given layout size.
    pub fn max_samples_needed(self, width: f64, height: f64, size: f64) -> f64 {
        use Position as P;
        match self {
            P::TopRight
            | P::TopLeft
            | P::BottomRight
            | P::BottomLeft
            | P::HorizontalRight
            | P::HorizontalLeft => width / size,
            P::TopMirror | P::BottomMirror | P::HorizontalMirror => width / size / 2.0,
            P::LeftDown
            | P::LeftUp
            | P::RightDown
            | P::RightUp
            | P::VerticalDown
            | P::VerticalUp => height / size,
            P::LeftMirror | P::RightMirror | P::VerticalMirror => height / size / 2.0,
            P::Horizontal => width,
            P::Vertical => height,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug names are the config spellings, modulo case.
        f.write_str(&format!("{self:?}").to_lowercase())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(color) => vec![color],
        OneOrMany::Many(colors) => colors,
    })
}

fn default_effect_size() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub position: Position,
    /// Bar width for spectra, line width for waveforms.
    #[serde(default = "default_effect_size")]
    pub size: f64,
    /// Spectrum: one color per stacked band. Waveform: the line color.
    #[serde(default, alias = "color", deserialize_with = "one_or_many")]
    pub colors: Vec<String>,
    /// Inline CSS for the surface, passed through untouched.
    #[serde(default)]
    pub style: String,
}

impl EffectSpec {
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        if self.position.kind() != self.kind {
            return Err(ConfigError::PositionMismatch {
                index,
                kind: self.kind,
                position: self.position,
            });
        }
        if !(self.size > 0.0) {
            return Err(ConfigError::EffectSize {
                index,
                size: self.size,
            });
        }
        if self.kind == EffectKind::Spectrum && self.colors.is_empty() {
            return Err(ConfigError::EffectColors { index });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: Vec<Track>,
    pub autoplay: bool,
    pub volume: f64,
    /// Frequency bins exposed by the analyser; the FFT is twice this size.
    pub size: u32,
    pub smoothing: f64,
    pub mindecibels: f64,
    pub maxdecibels: f64,
    /// Render interval in milliseconds.
    pub frame: u32,
    pub effects: Vec<EffectSpec>,
    pub container: String,
    pub controls: String,
    pub title: String,
    pub stylesheet: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio: Vec::new(),
            autoplay: false,
            volume: 1.0,
            size: 1024,
            smoothing: 0.8,
            mindecibels: -100.0,
            maxdecibels: -30.0,
            frame: 33,
            effects: Vec::new(),
            container: String::new(),
            controls: String::new(),
            title: String::new(),
            stylesheet: None,
        }
    }
}

impl Settings {
    /// Parse and validate a configuration blob. Surrounding whitespace is
    /// ignored and an empty blob reads as `{}`.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let text = text.trim();
        let settings: Settings = serde_json::from_str(if text.is_empty() { "{}" } else { text })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn fft_size(&self) -> u32 {
        self.size * 2
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.is_empty() {
            return Err(ConfigError::EmptyPlaylist);
        }
        if let Some(index) = self.audio.iter().position(|track| !track.has_sources()) {
            return Err(ConfigError::TrackWithoutSource { index });
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::Volume(self.volume));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        if !self.size.is_power_of_two() || !(16..=16384).contains(&self.size) {
            return Err(ConfigError::AnalysisSize(self.size));
        }
        if self.mindecibels >= self.maxdecibels {
            return Err(ConfigError::Decibels {
                min: self.mindecibels,
                max: self.maxdecibels,
            });
        }
        if self.frame == 0 {
            return Err(ConfigError::ZeroFrame);
        }
        for (index, effect) in self.effects.iter().enumerate() {
            effect.validate(index)?;
        }
        Ok(())
    }
}
