//! Draggable bars (seek and volume) and the single drag-capture slot they
//! share.
//!
//! A bar is a track element with a handle inside it. The handle's left edge
//! lives in `[-1, track_width - handle_width - 1]` pixels, and that range maps
//! linearly onto `[0, 1]`. Both ends map exactly: fraction 0 is the handle
//! flush left, fraction 1 is the handle flush right.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Layout measurements of one bar, read from the page when needed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarMetrics {
    /// Outer width of the track element.
    pub track_width: f64,
    /// Inner width of the track element; reference for fill fractions.
    pub client_width: f64,
    /// Inner width of the element holding the range overlays.
    pub inner_width: f64,
    pub handle_width: f64,
}

impl BarMetrics {
    fn travel(&self) -> f64 {
        self.track_width - self.handle_width
    }

    pub fn min_handle(&self) -> f64 {
        -1.0
    }

    pub fn max_handle(&self) -> f64 {
        self.travel() - 1.0
    }

    pub fn clamp_handle(&self, px: f64) -> f64 {
        px.min(self.max_handle()).max(self.min_handle())
    }

    /// Handle position for a pointer at `pointer_x` pixels into the track.
    /// The handle is centered under the pointer.
    pub fn handle_for_pointer(&self, pointer_x: f64) -> f64 {
        self.clamp_handle((pointer_x - self.handle_width / 2.0 - 2.0).round())
    }

    pub fn fraction(&self, handle_px: f64) -> f64 {
        let travel = self.travel();
        if travel <= 0.0 {
            return 0.0;
        }
        ((handle_px + 1.0) / travel).clamp(0.0, 1.0)
    }

    pub fn handle_for_fraction(&self, fraction: f64) -> f64 {
        self.clamp_handle(fraction * self.travel() - 1.0)
    }

    /// How far a fill reaching the handle's center extends, as a fraction of
    /// the track's inner width.
    pub fn fill_fraction(&self, handle_px: f64) -> f64 {
        if self.client_width <= 0.0 {
            return 0.0;
        }
        (handle_px + self.handle_width / 2.0) / self.client_width
    }
}

/// A horizontal pixel span: left edge and width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub left: f64,
    pub width: f64,
}

/// Pixel span covering `start..end` (fractions) of `reference_width`.
pub fn range_span(start: f64, end: f64, reference_width: f64) -> Span {
    let left = (reference_width * start).round();
    let right = (reference_width * end).round();
    Span {
        left,
        width: right - left,
    }
}

/// Offset and scroll of one element in an offset chain.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OffsetBox {
    pub offset_left: f64,
    pub offset_top: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

/// Pointer position relative to an element, given the element and all of
/// its ancestors (innermost first). Every level contributes, so bars nested
/// inside scrolled or positioned containers still track the pointer.
pub fn pointer_offset<I>(client_x: f64, client_y: f64, chain: I) -> (f64, f64)
where
    I: IntoIterator<Item = OffsetBox>,
{
    chain.into_iter().fold((client_x, client_y), |(x, y), node| {
        (
            x - (node.offset_left - node.scroll_left),
            y - (node.offset_top - node.scroll_top),
        )
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    Buffered,
    Played,
    Level,
}

/// The page side of a bar.
pub trait BarView {
    fn metrics(&self) -> BarMetrics;
    /// The track element followed by its ancestors.
    fn offset_chain(&self) -> Vec<OffsetBox>;
    fn place_handle(&self, left_px: f64);
    fn place_range(&self, overlay: Overlay, span: Span);
}

/// Geometry of one bar plus the handle position it last rendered.
pub struct DragBar {
    view: Rc<dyn BarView>,
    handle: Cell<f64>,
}

impl DragBar {
    pub fn new(view: Rc<dyn BarView>) -> Self {
        Self {
            view,
            handle: Cell::new(-1.0),
        }
    }

    pub fn metrics(&self) -> BarMetrics {
        self.view.metrics()
    }

    pub fn handle(&self) -> f64 {
        self.handle.get()
    }

    pub fn fraction(&self) -> f64 {
        self.metrics().fraction(self.handle.get())
    }

    pub fn set_handle(&self, px: f64) {
        let px = self.metrics().clamp_handle(px);
        self.handle.set(px);
        self.view.place_handle(px);
    }

    pub fn set_fraction(&self, fraction: f64) {
        self.set_handle(self.metrics().handle_for_fraction(fraction));
    }

    /// Move the handle under the pointer and return the resulting fraction.
    pub fn drag_to(&self, client_x: f64, client_y: f64) -> f64 {
        let (x, _) = pointer_offset(client_x, client_y, self.view.offset_chain());
        let metrics = self.metrics();
        self.set_handle(metrics.handle_for_pointer(x));
        metrics.fraction(self.handle.get())
    }

    /// Stretch `overlay` from the track start to the handle's center.
    pub fn fill_to_handle(&self, overlay: Overlay) {
        let metrics = self.metrics();
        self.fill(overlay, 0.0, metrics.fill_fraction(self.handle.get()));
    }

    pub fn fill(&self, overlay: Overlay, start: f64, end: f64) {
        let span = range_span(start, end, self.metrics().inner_width);
        self.view.place_range(overlay, span);
    }
}

/// Proof of holding the drag capture. Handed out by the captured bar and
/// handed back to it on release.
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureToken {
    resume: bool,
}

impl CaptureToken {
    pub fn new(resume: bool) -> Self {
        Self { resume }
    }

    /// Whether playback should resume once the drag ends.
    pub fn resume(&self) -> bool {
        self.resume
    }
}

pub trait DragTarget {
    fn capture(&self) -> CaptureToken;
    fn drag_to(&self, client_x: f64, client_y: f64);
    fn release(&self, token: CaptureToken);
}

struct Capture {
    owner: Weak<dyn DragTarget>,
    token: CaptureToken,
}

/// The one drag-capture slot shared by every bar on the page. Pointer moves
/// and releases arrive page-wide and go only to the captured bar.
#[derive(Default)]
pub struct DragCoordinator {
    slot: RefCell<Option<Capture>>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&self, target: &Rc<dyn DragTarget>, client_x: f64, client_y: f64) {
        // A release lost outside the window must not leave the old owner
        // captured.
        self.pointer_up();
        let token = target.capture();
        *self.slot.borrow_mut() = Some(Capture {
            owner: Rc::downgrade(target),
            token,
        });
        target.drag_to(client_x, client_y);
    }

    pub fn pointer_move(&self, client_x: f64, client_y: f64) {
        let owner = self
            .slot
            .borrow()
            .as_ref()
            .and_then(|capture| capture.owner.upgrade());
        if let Some(owner) = owner {
            owner.drag_to(client_x, client_y);
        }
    }

    pub fn pointer_up(&self) {
        let capture = self.slot.borrow_mut().take();
        if let Some(Capture { owner, token }) = capture {
            if let Some(owner) = owner.upgrade() {
                owner.release(token);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn is_captured_by(&self, target: &Rc<dyn DragTarget>) -> bool {
        self.slot.borrow().as_ref().is_some_and(|capture| {
            capture.owner.as_ptr().cast::<()>() == Rc::as_ptr(target).cast::<()>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBar;

    const METRICS: BarMetrics = BarMetrics {
        track_width: 110.0,
        client_width: 108.0,
        inner_width: 100.0,
        handle_width: 10.0,
    };

    #[test]
    fn endpoints_map_exactly() {
        assert_eq!(METRICS.fraction(-1.0), 0.0);
        assert_eq!(METRICS.fraction(99.0), 1.0);
        assert_eq!(METRICS.handle_for_fraction(0.0), -1.0);
        assert_eq!(METRICS.handle_for_fraction(1.0), 99.0);
        assert_eq!(METRICS.max_handle(), 99.0);
    }

    #[test]
    fn pointer_mapping_is_clamped_and_monotonic() {
        let mut last = -1.0;
        for x in -50..200 {
            let handle = METRICS.handle_for_pointer(f64::from(x));
            assert!((-1.0..=99.0).contains(&handle));
            let fraction = METRICS.fraction(handle);
            assert!(fraction >= last, "fraction fell at x = {x}");
            last = fraction;
        }
        assert_eq!(METRICS.fraction(METRICS.handle_for_pointer(-50.0)), 0.0);
        assert_eq!(METRICS.fraction(METRICS.handle_for_pointer(500.0)), 1.0);
    }

    #[test]
    fn pointer_centers_handle() {
        // 57 - 5 - 2
        assert_eq!(METRICS.handle_for_pointer(57.0), 50.0);
    }

    #[test]
    fn offset_walks_the_whole_chain() {
        let chain = [
            OffsetBox { offset_left: 10.0, offset_top: 5.0, ..Default::default() },
            OffsetBox { offset_left: 100.0, offset_top: 50.0, scroll_left: 30.0, scroll_top: 0.0 },
            OffsetBox { offset_left: 0.0, offset_top: 0.0, scroll_left: 0.0, scroll_top: 20.0 },
        ];
        assert_eq!(pointer_offset(200.0, 100.0, chain), (120.0, 65.0));
    }

    #[test]
    fn range_span_rounds_edges() {
        assert_eq!(range_span(0.0, 0.5, 101.0), Span { left: 0.0, width: 51.0 });
        assert_eq!(range_span(0.25, 0.75, 100.0), Span { left: 25.0, width: 50.0 });
    }

    #[test]
    fn drag_bar_renders_handle_and_fill() {
        let view = Rc::new(FakeBar::new(METRICS));
        let bar = DragBar::new(view.clone());
        let fraction = bar.drag_to(57.0, 0.0);
        assert_eq!(bar.handle(), 50.0);
        assert_eq!(fraction, 51.0 / 100.0);
        assert_eq!(view.handle.get(), 50.0);

        bar.fill_to_handle(Overlay::Played);
        // (50 + 5) / 108 of 100px
        assert_eq!(
            view.range(Overlay::Played),
            Some(Span { left: 0.0, width: (100.0_f64 * 55.0 / 108.0).round() })
        );
    }

    struct Recorder {
        log: RefCell<Vec<String>>,
        resume: bool,
    }

    impl DragTarget for Recorder {
        fn capture(&self) -> CaptureToken {
            self.log.borrow_mut().push("capture".into());
            CaptureToken::new(self.resume)
        }
        fn drag_to(&self, x: f64, _y: f64) {
            self.log.borrow_mut().push(format!("drag {x}"));
        }
        fn release(&self, token: CaptureToken) {
            self.log.borrow_mut().push(format!("release {}", token.resume()));
        }
    }

    fn recorder(resume: bool) -> Rc<Recorder> {
        Rc::new(Recorder {
            log: RefCell::new(Vec::new()),
            resume,
        })
    }

    #[test]
    fn only_the_captured_bar_sees_moves() {
        let coordinator = DragCoordinator::new();
        let a = recorder(true);
        let b = recorder(false);
        let a_dyn: Rc<dyn DragTarget> = a.clone();
        let b_dyn: Rc<dyn DragTarget> = b.clone();

        coordinator.pointer_move(1.0, 0.0);
        coordinator.pointer_up();
        assert!(a.log.borrow().is_empty());

        coordinator.pointer_down(&a_dyn, 3.0, 0.0);
        assert!(coordinator.is_captured_by(&a_dyn));
        assert!(!coordinator.is_captured_by(&b_dyn));
        coordinator.pointer_move(4.0, 0.0);
        coordinator.pointer_up();
        coordinator.pointer_move(5.0, 0.0);

        assert_eq!(*a.log.borrow(), ["capture", "drag 3", "drag 4", "release true"]);
        assert!(b.log.borrow().is_empty());
        assert!(!coordinator.is_active());
    }

    #[test]
    fn new_capture_releases_a_stale_one() {
        let coordinator = DragCoordinator::new();
        let a = recorder(true);
        let b = recorder(false);
        let a_dyn: Rc<dyn DragTarget> = a.clone();
        let b_dyn: Rc<dyn DragTarget> = b.clone();

        coordinator.pointer_down(&a_dyn, 1.0, 0.0);
        coordinator.pointer_down(&b_dyn, 2.0, 0.0);
        coordinator.pointer_move(6.0, 0.0);

        assert_eq!(*a.log.borrow(), ["capture", "drag 1", "release true"]);
        assert_eq!(*b.log.borrow(), ["capture", "drag 2", "drag 6"]);
    }
}
