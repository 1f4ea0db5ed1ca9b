//! Spectrum layout table.
//!
//! Every spectrum position is the same drawing with a different coordinate
//! system: bins run along a primary axis (forwards, backwards, or outwards
//! from the middle) and bars grow across it from the near edge, the far edge,
//! or both ways from the center line.

use crate::config::Position;

/// A fill rectangle as the canvas takes it. Width and height may be
/// negative; the rectangle then extends left/up from `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FillRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// The axis bins are laid out along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Run {
    Forward,
    Backward,
    Mirror,
}

/// Where bars start on the perpendicular axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Base {
    Near,
    Far,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpectrumLayout {
    pub axis: Axis,
    pub run: Run,
    pub base: Base,
}

const fn layout(axis: Axis, run: Run, base: Base) -> Option<SpectrumLayout> {
    Some(SpectrumLayout { axis, run, base })
}

/// Up to four rectangles for one bin of one band.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fills {
    rects: [FillRect; 4],
    len: usize,
}

impl Fills {
    fn push(&mut self, rect: FillRect) {
        self.rects[self.len] = rect;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[FillRect] {
        &self.rects[..self.len]
    }
}

impl SpectrumLayout {
    pub fn for_position(position: Position) -> Option<Self> {
        use Axis::{X, Y};
        use Base::{Center, Far, Near};
        use Run::{Backward, Forward, Mirror};
        match position {
            Position::TopRight => layout(X, Forward, Near),
            Position::TopLeft => layout(X, Backward, Near),
            Position::TopMirror => layout(X, Mirror, Near),
            Position::BottomRight => layout(X, Forward, Far),
            Position::BottomLeft => layout(X, Backward, Far),
            Position::BottomMirror => layout(X, Mirror, Far),
            Position::LeftDown => layout(Y, Forward, Near),
            Position::LeftUp => layout(Y, Backward, Near),
            Position::LeftMirror => layout(Y, Mirror, Near),
            Position::RightDown => layout(Y, Forward, Far),
            Position::RightUp => layout(Y, Backward, Far),
            Position::RightMirror => layout(Y, Mirror, Far),
            Position::HorizontalRight => layout(X, Forward, Center),
            Position::HorizontalLeft => layout(X, Backward, Center),
            Position::HorizontalMirror => layout(X, Mirror, Center),
            Position::VerticalDown => layout(Y, Forward, Center),
            Position::VerticalUp => layout(Y, Backward, Center),
            Position::VerticalMirror => layout(Y, Mirror, Center),
            Position::Horizontal | Position::Vertical => None,
        }
    }

    /// Surface size as (primary, perpendicular) extents.
    pub fn extents(&self, width: f64, height: f64) -> (f64, f64) {
        match self.axis {
            Axis::X => (width, height),
            Axis::Y => (height, width),
        }
    }

    /// Bar length for one sample. Center-based bars grow both ways, so they
    /// get half the scale. A one-pixel bar collapses to nothing.
    pub fn magnitude(&self, sample: u8, perpendicular: f64, bands: usize) -> f64 {
        let divisor = if self.base == Base::Center { 512.0 } else { 256.0 };
        let v = (f64::from(sample) / divisor * perpendicular / bands as f64).trunc() + 1.0;
        if v == 1.0 {
            0.0
        } else {
            v
        }
    }

    /// Primary-axis position of `bin`, plus the mirrored position for
    /// `Run::Mirror`.
    pub fn axis_positions(&self, bin: usize, size: f64, primary: f64) -> (f64, Option<f64>) {
        let offset = bin as f64 * size;
        match self.run {
            Run::Forward => (offset.trunc(), None),
            Run::Backward => ((primary - offset).trunc(), None),
            Run::Mirror => (
                (primary / 2.0 - offset).trunc(),
                Some((primary / 2.0 + offset + 1.0).trunc()),
            ),
        }
    }

    /// Whether a bin at `position` still lands on the surface.
    pub fn on_surface(&self, position: f64, primary: f64) -> bool {
        match self.run {
            Run::Forward => position < primary,
            Run::Backward | Run::Mirror => position >= 0.0,
        }
    }

    /// Rectangles for one bin of band `band` with bar length `magnitude`.
    pub fn fills(
        &self,
        positions: (f64, Option<f64>),
        magnitude: f64,
        band: usize,
        size: f64,
        perpendicular: f64,
    ) -> Fills {
        let mut fills = Fills::default();
        if magnitude == 0.0 {
            return fills;
        }
        let v = magnitude;
        let stacked = v * band as f64;

        // (start, length) across the primary axis
        let mut across = [(0.0, 0.0); 2];
        let across = match self.base {
            Base::Near => {
                across[0] = (stacked, v - 1.0);
                &across[..1]
            }
            Base::Far => {
                across[0] = (perpendicular - stacked, 1.0 - v);
                &across[..1]
            }
            Base::Center => {
                let mid = (perpendicular / 2.0).trunc();
                across = [(mid + stacked, v - 1.0), (mid - stacked, 1.0 - v)];
                &across[..]
            }
        };

        let (p, q) = positions;
        for &(start, length) in across {
            for (along, thickness) in [(Some(p), 1.0 - size), (q, size - 1.0)] {
                let Some(along) = along else { continue };
                fills.push(match self.axis {
                    Axis::X => FillRect {
                        x: along,
                        y: start,
                        w: thickness,
                        h: length,
                    },
                    Axis::Y => FillRect {
                        x: start,
                        y: along,
                        w: length,
                        h: thickness,
                    },
                });
            }
        }
        fills
    }
}
