//! Browser bindings: DOM, canvas 2D and Web Audio implementations of the
//! player's platform traits, plus the wasm entry points.

mod analysis;
mod controls;
mod media;
mod surface;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use crate::config::Settings;
use crate::drag::DragCoordinator;
use crate::error::PlayerError;
use crate::events::Event;
use crate::render::{FrameTicker, RenderEngine, Surface};
use crate::source::AnalysisFactory;
use crate::widget::{Widget, WidgetParts};

use self::analysis::{web_audio_available, WebAudioFactory};
use self::controls::{append, div, Controls};
use self::media::DomMedia;
use self::surface::CanvasSurface;

type DomWidget = Widget<DomMedia>;

const CONFIG_SELECTOR: &str = r#"script[type="application/json"][data-html5-music]"#;
const RESIZE_POLL_MS: i32 = 10;

thread_local! {
    static PAGE_DRAG: RefCell<Option<Rc<DragCoordinator>>> = const { RefCell::new(None) };
}

pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

pub(crate) fn js_error(err: JsValue) -> PlayerError {
    PlayerError::Dom(describe(&err))
}

fn page() -> Result<(Window, Document), PlayerError> {
    let window = web_sys::window().ok_or_else(|| PlayerError::Dom("no global window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| PlayerError::Dom("window has no document".into()))?;
    Ok((window, document))
}

/// Mounts one player before every configuration tag on the page.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    // fails only if a logger is already installed
    console_log::init_with_level(level).ok();

    let (_, document) = page().map_err(|err| JsValue::from_str(&err.to_string()))?;
    let tags = document.query_selector_all(CONFIG_SELECTOR)?;
    for i in 0..tags.length() {
        let Some(tag) = tags.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
            continue;
        };
        let config = tag.text_content().unwrap_or_default();
        if let Err(err) = mount_before(&tag, &config) {
            log::error!("html5-music: {err}");
        }
    }
    Ok(())
}

/// Mounts one player before `anchor` from a JSON configuration string.
#[wasm_bindgen]
pub fn mount(anchor: &Element, config: &str) -> Result<(), JsValue> {
    mount_before(anchor, config).map_err(|err| {
        log::error!("html5-music: {err}");
        JsValue::from_str(&err.to_string())
    })
}

fn mount_before(anchor: &Element, config: &str) -> Result<(), PlayerError> {
    let settings = Settings::from_json(config)?;
    let (window, document) = page()?;
    let parent = anchor
        .parent_node()
        .ok_or_else(|| PlayerError::Dom("mount point is not attached".into()))?;

    let container = div(&document, &["music"])?;
    container
        .set_attribute("style", &settings.container)
        .map_err(js_error)?;

    let mut surfaces: Vec<Box<dyn Surface>> = Vec::with_capacity(settings.effects.len());
    for effect in &settings.effects {
        let canvas = document
            .create_element("canvas")
            .map_err(js_error)?
            .unchecked_into::<HtmlCanvasElement>();
        canvas.set_attribute("style", &effect.style).map_err(js_error)?;
        append(&container, &canvas)?;
        surfaces.push(Box::new(CanvasSurface::new(canvas)?));
    }

    let controls = Controls::build(&document, &settings.controls)?;
    append(&container, &controls.root)?;
    let title = div(&document, &["title"])?;
    title.set_attribute("style", &settings.title).map_err(js_error)?;
    append(&container, &title)?;

    let media = DomMedia::new(&document)?;
    let audio = media.element().clone();
    let factory: Option<Box<dyn AnalysisFactory<DomMedia>>> = if web_audio_available() {
        Some(Box::new(WebAudioFactory::new(&settings)))
    } else {
        log::warn!("Web Audio is not available; visualizer disabled");
        None
    };

    let seek_track = controls.seek.track().clone();
    let volume_track = controls.volume.track().clone();
    let view = Rc::new(controls.transport_view(title));
    let (tracks, effects) = (settings.audio.len(), settings.effects.len());
    let stylesheet = settings.stylesheet.clone();

    let drag = page_drag(&document)?;
    let ticker_window = window.clone();
    let widget = Rc::new(Widget::assemble(
        settings,
        WidgetParts {
            media,
            factory,
            view,
            seek_view: Rc::new(controls.seek),
            volume_view: Rc::new(controls.volume),
            drag,
            surfaces,
        },
        move |engine| Box::new(IntervalTicker::new(ticker_window, engine)) as Box<dyn FrameTicker>,
    )?);

    parent
        .insert_before(&container, Some(anchor))
        .map_err(js_error)?;

    let wired = (|| -> Result<(), PlayerError> {
        listen_media(&audio, &widget)?;
        listen(&controls.back, "click", {
            let widget = Rc::clone(&widget);
            move |_| widget.ui().on_back()
        })?;
        listen(&controls.toggle, "click", {
            let widget = Rc::clone(&widget);
            move |_| widget.ui().on_toggle()
        })?;
        listen(&controls.skip, "click", {
            let widget = Rc::clone(&widget);
            move |_| widget.ui().on_skip()
        })?;
        listen(&controls.speaker, "click", {
            let widget = Rc::clone(&widget);
            move |_| widget.ui().on_speaker()
        })?;
        listen(&seek_track, "mousedown", {
            let widget = Rc::clone(&widget);
            move |event| {
                event.prevent_default();
                let (x, y) = client_position(&event);
                widget.ui().seek_pointer_down(x, y);
            }
        })?;
        listen(&volume_track, "mousedown", {
            let widget = Rc::clone(&widget);
            move |event| {
                event.prevent_default();
                let (x, y) = client_position(&event);
                widget.ui().volume_pointer_down(x, y);
            }
        })?;
        watch_resize(&window, &widget)
    })();
    if let Err(err) = wired {
        container.remove();
        return Err(err);
    }

    widget.engine().resize();
    let started = match stylesheet {
        Some(href) => start_after_stylesheet(&document, &href, widget, container.clone()),
        None => widget.start(),
    };
    if let Err(err) = started {
        container.remove();
        return Err(err);
    }
    log::info!("player mounted: {tracks} tracks, {effects} effects");
    Ok(())
}

/// The drag capture every player on the page shares. The first call installs
/// the document listeners that route pointer moves and releases to it.
fn page_drag(document: &Document) -> Result<Rc<DragCoordinator>, PlayerError> {
    if let Some(drag) = PAGE_DRAG.with(|slot| slot.borrow().clone()) {
        return Ok(drag);
    }
    let drag = Rc::new(DragCoordinator::new());
    listen(document, "mousemove", {
        let drag = Rc::clone(&drag);
        move |event| {
            let (x, y) = client_position(&event);
            drag.pointer_move(x, y);
        }
    })?;
    listen(document, "mouseup", {
        let drag = Rc::clone(&drag);
        move |_| drag.pointer_up()
    })?;
    PAGE_DRAG.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&drag)));
    Ok(drag)
}

fn client_position(event: &MouseEvent) -> (f64, f64) {
    (f64::from(event.client_x()), f64::from(event.client_y()))
}

/// Attach a listener for the page's lifetime.
fn listen<F>(target: &web_sys::EventTarget, name: &str, handler: F) -> Result<(), PlayerError>
where
    F: FnMut(MouseEvent) + 'static,
{
    let closure = Closure::<dyn FnMut(MouseEvent)>::new(handler);
    target
        .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        .map_err(js_error)?;
    closure.forget();
    Ok(())
}

fn listen_media(audio: &web_sys::HtmlAudioElement, widget: &Rc<DomWidget>) -> Result<(), PlayerError> {
    let events = [
        ("canplay", Event::CanPlay),
        ("progress", Event::Progress),
        ("timeupdate", Event::TimeUpdate),
        ("playing", Event::Playing),
        ("pause", Event::Pause),
        ("ended", Event::Ended),
    ];
    for (name, event) in events {
        let widget = Rc::clone(widget);
        let closure = Closure::<dyn FnMut()>::new(move || widget.source().dispatch(&event));
        audio
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        closure.forget();
    }
    Ok(())
}

/// A window resize only marks the layout dirty; a short poll does the work,
/// so bursts of resize events cost one recomputation.
fn watch_resize(window: &Window, widget: &Rc<DomWidget>) -> Result<(), PlayerError> {
    let dirty = Rc::new(Cell::new(false));

    let mark = Rc::clone(&dirty);
    let on_resize = Closure::<dyn FnMut()>::new(move || mark.set(true));
    window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        .map_err(js_error)?;
    on_resize.forget();

    let widget = Rc::clone(widget);
    let poll = Closure::<dyn FnMut()>::new(move || {
        if dirty.replace(false) {
            widget.engine().resize();
        }
    });
    window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            poll.as_ref().unchecked_ref(),
            RESIZE_POLL_MS,
        )
        .map_err(js_error)?;
    poll.forget();
    Ok(())
}

/// Controls are measured during initialization, so it waits for their
/// stylesheet. A stylesheet that fails to load still starts the player; a
/// player that fails to start takes its `container` off the page.
fn start_after_stylesheet(
    document: &Document,
    href: &str,
    widget: Rc<DomWidget>,
    container: HtmlElement,
) -> Result<(), PlayerError> {
    let head = document
        .head()
        .ok_or_else(|| PlayerError::Dom("document has no head".into()))?;
    let link = document.create_element("link").map_err(js_error)?;
    link.set_attribute("type", "text/css").map_err(js_error)?;
    link.set_attribute("rel", "stylesheet").map_err(js_error)?;
    link.set_attribute("href", href).map_err(js_error)?;

    let started = Cell::new(false);
    let on_settled = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        if started.replace(true) {
            return;
        }
        if event.type_() == "error" {
            log::warn!("stylesheet failed to load; starting unstyled");
        }
        widget.engine().resize();
        if let Err(err) = widget.start() {
            log::error!("html5-music: {err}");
            container.remove();
        }
    });
    for name in ["load", "error"] {
        link.add_event_listener_with_callback(name, on_settled.as_ref().unchecked_ref())
            .map_err(js_error)?;
    }
    on_settled.forget();
    append(&head, &link)
}

/// `setInterval` driven frame clock.
struct IntervalTicker {
    window: Window,
    callback: Closure<dyn FnMut()>,
    handle: Cell<Option<i32>>,
}

impl IntervalTicker {
    fn new(window: Window, engine: Weak<RenderEngine<DomMedia>>) -> Self {
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(engine) = engine.upgrade() {
                engine.tick();
            }
        });
        Self {
            window,
            callback,
            handle: Cell::new(None),
        }
    }
}

impl FrameTicker for IntervalTicker {
    fn start(&self, period_ms: u32) {
        self.stop();
        let period = i32::try_from(period_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                self.callback.as_ref().unchecked_ref(),
                period,
            ) {
            Ok(handle) => self.handle.set(Some(handle)),
            Err(err) => log::error!("cannot start render loop: {}", describe(&err)),
        }
    }

    fn stop(&self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_interval_with_handle(handle);
        }
    }
}
