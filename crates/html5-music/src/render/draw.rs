use crate::config::{EffectSpec, Position};

use super::layout::SpectrumLayout;
use super::Surface;

const DEFAULT_STROKE: &str = "#000";

/// Stacked bar spectrum, one band per configured color. Bins past the
/// surface edge are not drawn beyond the first one that leaves it.
pub fn draw_spectrum(effect: &EffectSpec, surface: &mut dyn Surface, data: &[u8]) {
    let Some(layout) = SpectrumLayout::for_position(effect.position) else {
        return;
    };
    let (width, height) = surface.size();
    let (primary, perpendicular) = layout.extents(width, height);
    let bands = effect.colors.len();

    for (band, color) in effect.colors.iter().enumerate() {
        surface.set_fill_style(color);
        for (bin, &sample) in data.iter().enumerate() {
            let positions = layout.axis_positions(bin, effect.size, primary);
            let magnitude = layout.magnitude(sample, perpendicular, bands);
            for rect in layout
                .fills(positions, magnitude, band, effect.size, perpendicular)
                .as_slice()
            {
                surface.fill_rect(*rect);
            }
            if !layout.on_surface(positions.0, primary) {
                break;
            }
        }
    }
}

/// Oscilloscope line across the surface: samples run along the width for
/// `horizontal` and down the height for `vertical`.
pub fn draw_waveform(effect: &EffectSpec, surface: &mut dyn Surface, data: &[u8]) {
    if data.is_empty() {
        return;
    }
    let (width, height) = surface.size();
    let count = data.len() as f64;
    let color = effect.colors.first().map_or(DEFAULT_STROKE, String::as_str);

    surface.set_stroke_style(color, effect.size);
    surface.begin_path();
    for (i, &sample) in data.iter().enumerate() {
        let step = i as f64 / count;
        let level = f64::from(sample) / 256.0;
        let (x, y) = match effect.position {
            Position::Vertical => (level * width, (height + 1.0) * step),
            _ => ((width + 1.0) * step, level * height),
        };
        if i == 0 {
            surface.move_to(x, y);
        } else {
            surface.line_to(x, y);
        }
    }
    surface.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectKind;
    use crate::render::layout::FillRect;
    use crate::testing::{FakeSurface, SurfaceOp};

    fn effect(kind: EffectKind, position: Position, size: f64, colors: &[&str]) -> EffectSpec {
        EffectSpec {
            kind,
            position,
            size,
            colors: colors.iter().map(ToString::to_string).collect(),
            style: String::new(),
        }
    }

    #[test]
    fn spectrum_stops_after_the_first_bin_off_the_edge() {
        let (mut surface, log) = FakeSurface::new(10.0, 40.0);
        let spec = effect(EffectKind::Spectrum, Position::TopRight, 4.0, &["red"]);
        draw_spectrum(&spec, &mut surface, &[255; 10]);

        let fills: Vec<FillRect> = log.borrow().iter().filter_map(SurfaceOp::fill).collect();
        // bins at 0, 4, 8 fit; 12 is drawn and ends the run
        assert_eq!(
            fills.iter().map(|r| r.x).collect::<Vec<_>>(),
            [0.0, 4.0, 8.0, 12.0]
        );
        assert!(fills.iter().all(|r| r.w == -3.0));
    }

    #[test]
    fn spectrum_sets_one_fill_style_per_band() {
        let (mut surface, log) = FakeSurface::new(10.0, 40.0);
        let spec = effect(EffectKind::Spectrum, Position::BottomRight, 5.0, &["red", "blue"]);
        draw_spectrum(&spec, &mut surface, &[128, 128]);

        let styles: Vec<String> = log
            .borrow()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::FillStyle(color) => Some(color.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(styles, ["red", "blue"]);
        // v = trunc(128 / 256 * 40 / 2) + 1 = 11, second band sits 11 px higher
        let fills: Vec<FillRect> = log.borrow().iter().filter_map(SurfaceOp::fill).collect();
        assert_eq!(fills[0].y, 40.0);
        assert_eq!(fills[2].y, 29.0);
    }

    #[test]
    fn silent_spectrum_draws_nothing() {
        let (mut surface, log) = FakeSurface::new(10.0, 40.0);
        let spec = effect(EffectKind::Spectrum, Position::TopRight, 1.0, &["red"]);
        draw_spectrum(&spec, &mut surface, &[0; 8]);
        assert!(log.borrow().iter().all(|op| op.fill().is_none()));
    }

    #[test]
    fn horizontal_waveform_spans_the_width() {
        let (mut surface, log) = FakeSurface::new(99.0, 64.0);
        let spec = effect(EffectKind::Waveform, Position::Horizontal, 2.0, &["lime"]);
        draw_waveform(&spec, &mut surface, &[0, 128, 255, 64]);

        assert_eq!(
            *log.borrow(),
            [
                SurfaceOp::StrokeStyle("lime".into(), 2.0),
                SurfaceOp::BeginPath,
                SurfaceOp::MoveTo(0.0, 0.0),
                SurfaceOp::LineTo(25.0, 32.0),
                SurfaceOp::LineTo(50.0, 63.75),
                SurfaceOp::LineTo(75.0, 16.0),
                SurfaceOp::Stroke,
            ]
        );
    }

    #[test]
    fn vertical_waveform_swaps_axes() {
        let (mut surface, log) = FakeSurface::new(64.0, 99.0);
        let spec = effect(EffectKind::Waveform, Position::Vertical, 1.0, &[]);
        draw_waveform(&spec, &mut surface, &[128, 64]);

        let log = log.borrow();
        assert_eq!(log[0], SurfaceOp::StrokeStyle("#000".into(), 1.0));
        assert_eq!(log[2], SurfaceOp::MoveTo(32.0, 0.0));
        assert_eq!(log[3], SurfaceOp::LineTo(16.0, 50.0));
    }
}
