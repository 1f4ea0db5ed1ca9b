use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, HtmlAudioElement, HtmlSourceElement};

use crate::error::PlayerError;
use crate::source::MediaElement;

use super::{describe, js_error};

/// A detached `<audio>` element; it plays without being in the document.
pub struct DomMedia {
    element: HtmlAudioElement,
    document: Document,
}

impl DomMedia {
    pub fn new(document: &Document) -> Result<Self, PlayerError> {
        Ok(Self {
            element: HtmlAudioElement::new().map_err(js_error)?,
            document: document.clone(),
        })
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

impl MediaElement for DomMedia {
    fn paused(&self) -> bool {
        self.element.paused()
    }

    fn play(&self) {
        match self.element.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(err) = JsFuture::from(promise).await {
                    log::warn!("playback refused: {}", describe(&err));
                }
            }),
            Err(err) => log::warn!("play failed: {}", describe(&err)),
        }
    }

    fn pause(&self) {
        if let Err(err) = self.element.pause() {
            log::warn!("pause failed: {}", describe(&err));
        }
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn buffered(&self) -> Vec<(f64, f64)> {
        let ranges = self.element.buffered();
        (0..ranges.length())
            .filter_map(|i| Some((ranges.start(i).ok()?, ranges.end(i).ok()?)))
            .collect()
    }

    fn clear_sources(&self) {
        while let Some(child) = self.element.first_child() {
            if self.element.remove_child(&child).is_err() {
                break;
            }
        }
    }

    fn append_source(&self, mime: Option<&str>, url: &str) {
        let source = match self.document.create_element("source") {
            Ok(element) => element.unchecked_into::<HtmlSourceElement>(),
            Err(err) => {
                log::warn!("cannot attach {url}: {}", describe(&err));
                return;
            }
        };
        source.set_src(url);
        if let Some(mime) = mime {
            source.set_type(mime);
        }
        if let Err(err) = self.element.append_child(&source) {
            log::warn!("cannot attach {url}: {}", describe(&err));
        }
    }

    fn set_controls(&self, enabled: bool) {
        self.element.set_controls(enabled);
    }

    fn set_autoplay(&self, enabled: bool) {
        self.element.set_autoplay(enabled);
    }

    fn load(&self) {
        self.element.load();
    }
}
