//! DOM scaffolding of the transport controls and the views the core drives.

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Node};

use crate::drag::{BarMetrics, BarView, OffsetBox, Overlay, Span};
use crate::error::PlayerError;
use crate::ui::{PlayIcon, SpeakerIcon, TransportView};

use super::js_error;

pub fn div(document: &Document, classes: &[&str]) -> Result<HtmlElement, PlayerError> {
    let element = document
        .create_element("div")
        .map_err(js_error)?
        .unchecked_into::<HtmlElement>();
    let list = element.class_list();
    for class in classes {
        list.add_1(class).map_err(js_error)?;
    }
    Ok(element)
}

pub fn append(parent: &Node, child: &Node) -> Result<(), PlayerError> {
    parent.append_child(child).map(drop).map_err(js_error)
}

fn set_px(element: &HtmlElement, property: &str, px: f64) {
    if let Err(err) = element.style().set_property(property, &format!("{px}px")) {
        log::debug!("cannot set {property}: {}", super::describe(&err));
    }
}

/// Replace whichever class of `all` is present with `current`.
fn swap_class<'a>(element: &Element, all: impl IntoIterator<Item = &'a str>, current: &str) {
    let list = element.class_list();
    for class in all {
        // removing an absent class is a no-op
        if let Err(err) = list.remove_1(class) {
            log::debug!("cannot remove class {class}: {}", super::describe(&err));
        }
    }
    if let Err(err) = list.add_1(current) {
        log::debug!("cannot add class {current}: {}", super::describe(&err));
    }
}

pub struct DomBarView {
    track: HtmlElement,
    inner: HtmlElement,
    handle: HtmlElement,
    overlays: Vec<(Overlay, HtmlElement)>,
}

impl DomBarView {
    pub fn track(&self) -> &HtmlElement {
        &self.track
    }
}

impl BarView for DomBarView {
    fn metrics(&self) -> BarMetrics {
        BarMetrics {
            track_width: f64::from(self.track.offset_width()),
            client_width: f64::from(self.track.client_width()),
            inner_width: f64::from(self.inner.client_width()),
            handle_width: f64::from(self.handle.offset_width()),
        }
    }

    fn offset_chain(&self) -> Vec<OffsetBox> {
        let mut chain = Vec::new();
        let mut current: Option<Element> = Some(self.track.clone().into());
        while let Some(element) = current {
            let (offset_left, offset_top) = element
                .dyn_ref::<HtmlElement>()
                .map_or((0, 0), |html| (html.offset_left(), html.offset_top()));
            chain.push(OffsetBox {
                offset_left: f64::from(offset_left),
                offset_top: f64::from(offset_top),
                scroll_left: f64::from(element.scroll_left()),
                scroll_top: f64::from(element.scroll_top()),
            });
            current = element.parent_element();
        }
        chain
    }

    fn place_handle(&self, left_px: f64) {
        set_px(&self.handle, "left", left_px);
    }

    fn place_range(&self, overlay: Overlay, span: Span) {
        if let Some((_, element)) = self.overlays.iter().find(|(o, _)| *o == overlay) {
            set_px(element, "left", span.left);
            set_px(element, "width", span.width);
        }
    }
}

pub struct DomTransportView {
    toggle: HtmlElement,
    speaker: HtmlElement,
    time: HtmlElement,
    title: HtmlElement,
}

impl TransportView for DomTransportView {
    fn set_play_icon(&self, icon: PlayIcon) {
        swap_class(
            &self.toggle,
            PlayIcon::ALL.map(PlayIcon::class_name),
            icon.class_name(),
        );
    }

    fn set_speaker_icon(&self, icon: SpeakerIcon) {
        swap_class(
            &self.speaker,
            SpeakerIcon::ALL.map(SpeakerIcon::class_name),
            icon.class_name(),
        );
    }

    fn set_elapsed(&self, text: &str) {
        self.time.set_text_content(Some(text));
    }

    fn set_title(&self, title: &str) {
        self.title.set_text_content(Some(title));
    }
}

/// The control strip, not yet attached to anything.
pub struct Controls {
    pub root: HtmlElement,
    pub back: HtmlElement,
    pub toggle: HtmlElement,
    pub skip: HtmlElement,
    pub speaker: HtmlElement,
    pub seek: DomBarView,
    pub volume: DomBarView,
    time: HtmlElement,
}

impl Controls {
    pub fn build(document: &Document, style: &str) -> Result<Self, PlayerError> {
        let root = div(document, &["audio"])?;
        root.set_attribute("style", style).map_err(js_error)?;

        let back = div(document, &["back", "icon-step-backward"])?;
        let toggle = div(document, &["toggle", PlayIcon::Play.class_name()])?;
        let skip = div(document, &["skip", "icon-step-forward"])?;
        let time = div(document, &["time"])?;
        let speaker = div(document, &["speaker", SpeakerIcon::Up.class_name()])?;

        let seekbar = div(document, &["seekbar"])?;
        let seekinner = div(document, &["innerbar"])?;
        let buffered = div(document, &["buffered"])?;
        let played = div(document, &["played"])?;
        let seekbtn = div(document, &["seekbtn"])?;
        append(&seekinner, &buffered)?;
        append(&seekinner, &played)?;
        append(&seekbar, &seekinner)?;
        append(&seekbar, &seekbtn)?;

        let volbar = div(document, &["volbar"])?;
        let volinner = div(document, &["innerbar"])?;
        let level = div(document, &["volume"])?;
        let volbtn = div(document, &["volbtn"])?;
        append(&volinner, &level)?;
        append(&volbar, &volinner)?;
        append(&volbar, &volbtn)?;

        for child in [&back, &toggle, &skip, &seekbar, &time, &speaker, &volbar] {
            append(&root, child)?;
        }

        Ok(Self {
            root,
            back,
            toggle,
            skip,
            speaker,
            seek: DomBarView {
                track: seekbar,
                inner: seekinner,
                handle: seekbtn,
                overlays: vec![(Overlay::Buffered, buffered), (Overlay::Played, played)],
            },
            volume: DomBarView {
                track: volbar,
                inner: volinner,
                handle: volbtn,
                overlays: vec![(Overlay::Level, level)],
            },
            time,
        })
    }

    pub fn transport_view(&self, title: HtmlElement) -> DomTransportView {
        DomTransportView {
            toggle: self.toggle.clone(),
            speaker: self.speaker.clone(),
            time: self.time.clone(),
            title,
        }
    }
}
