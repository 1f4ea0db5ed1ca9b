//! Typed publish/subscribe used between the sample source, the transport
//! controller, the transport UI and the render engine.
//!
//! Every bus declares up front which events its publisher emits. Subscribing
//! to anything else is an error at subscribe time instead of a handler that
//! silently never fires.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    CanPlay,
    Progress,
    TimeUpdate,
    Playing,
    Pause,
    Ended,
    Seeking,
    Seeked,
    Title,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The media pipeline has enough data to start.
    CanPlay,
    /// More of the stream was buffered.
    Progress,
    /// Playback position moved.
    TimeUpdate,
    Playing,
    Pause,
    Ended,
    /// Request to jump to `time` seconds. Output is paused until `Seeked`.
    Seeking { time: f64 },
    /// The jump is over; playback resumes if `resume` is set.
    Seeked { resume: bool },
    /// A track with a display title was loaded.
    Title(String),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::CanPlay => EventKind::CanPlay,
            Event::Progress => EventKind::Progress,
            Event::TimeUpdate => EventKind::TimeUpdate,
            Event::Playing => EventKind::Playing,
            Event::Pause => EventKind::Pause,
            Event::Ended => EventKind::Ended,
            Event::Seeking { .. } => EventKind::Seeking,
            Event::Seeked { .. } => EventKind::Seeked,
            Event::Title(_) => EventKind::Title,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("{publisher} does not publish {kind:?} events")]
    NotPublished {
        publisher: &'static str,
        kind: EventKind,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Event)>;

pub struct EventBus {
    publisher: &'static str,
    allowed: &'static [EventKind],
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(SubscriptionId, EventKind, Handler)>>,
}

impl EventBus {
    pub fn new(publisher: &'static str, allowed: &'static [EventKind]) -> Self {
        Self {
            publisher,
            allowed,
            next_id: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn publishes(&self, kind: EventKind) -> bool {
        self.allowed.contains(&kind)
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Result<SubscriptionId, EventError>
    where
        F: Fn(&Event) + 'static,
    {
        if !self.publishes(kind) {
            return Err(EventError::NotPublished {
                publisher: self.publisher,
                kind,
            });
        }
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, kind, Rc::new(handler)));
        Ok(id)
    }

    /// Returns false when `id` was not subscribed (or already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _, _)| *sub != id);
        handlers.len() != before
    }

    /// Deliver `event` to its subscribers in subscription order.
    ///
    /// The subscriber list is snapshotted first, so handlers may subscribe,
    /// unsubscribe or emit on this bus without tripping over the borrow.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        if !self.publishes(kind) {
            log::warn!("{} tried to emit unpublished {kind:?}", self.publisher);
            return;
        }
        let targets: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        for handler in targets {
            handler(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("publisher", &self.publisher)
            .field("allowed", &self.allowed)
            .field("subscribers", &self.handlers.borrow().len())
            .finish()
    }
}
