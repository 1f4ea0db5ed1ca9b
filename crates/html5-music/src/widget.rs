//! Assembly of one embedded player from its settings and the platform pieces
//! the page provides.

use std::rc::{Rc, Weak};

use crate::config::Settings;
use crate::drag::{BarView, DragCoordinator};
use crate::error::PlayerError;
use crate::render::{FrameTicker, RenderEngine, Surface};
use crate::source::{AnalysisFactory, MediaElement, SampleSource};
use crate::transport::TransportController;
use crate::ui::{TransportUi, TransportView};

/// Everything a page has to supply for one player.
pub struct WidgetParts<M> {
    pub media: M,
    /// `None` when the platform has no audio analysis.
    pub factory: Option<Box<dyn AnalysisFactory<M>>>,
    pub view: Rc<dyn TransportView>,
    pub seek_view: Rc<dyn BarView>,
    pub volume_view: Rc<dyn BarView>,
    /// The page's drag-capture slot; one pointer drags one bar across all
    /// players.
    pub drag: Rc<DragCoordinator>,
    /// One surface per configured effect, in configuration order.
    pub surfaces: Vec<Box<dyn Surface>>,
}

pub struct Widget<M> {
    controller: Rc<TransportController<M>>,
    ui: Rc<TransportUi<M>>,
    engine: Rc<RenderEngine<M>>,
}

impl<M: MediaElement + 'static> Widget<M> {
    pub fn assemble<F>(settings: Settings, parts: WidgetParts<M>, make_ticker: F) -> Result<Self, PlayerError>
    where
        F: FnOnce(Weak<RenderEngine<M>>) -> Box<dyn FrameTicker>,
    {
        if parts.surfaces.len() != settings.effects.len() {
            return Err(PlayerError::Dom(format!(
                "{} effects configured but {} surfaces created",
                settings.effects.len(),
                parts.surfaces.len()
            )));
        }

        let source = Rc::new(SampleSource::new(parts.media, &settings, parts.factory));
        let effects = settings.effects.into_iter().zip(parts.surfaces).collect();
        let engine = RenderEngine::new(Rc::clone(&source), effects, settings.frame, make_ticker);
        let controller = TransportController::new(source, settings.audio);
        let ui = TransportUi::new(
            Rc::clone(&controller),
            parts.view,
            parts.seek_view,
            parts.volume_view,
            parts.drag,
        );
        Ok(Self {
            controller,
            ui,
            engine,
        })
    }

    /// Bring the controls to their initial state, arm the render loop, then
    /// load the first track.
    pub fn start(&self) -> Result<(), PlayerError> {
        self.ui.bind()?;
        self.engine.bind()?;
        self.controller.initialize()?;
        Ok(())
    }

    pub fn source(&self) -> &Rc<SampleSource<M>> {
        self.controller.source()
    }

    pub fn controller(&self) -> &Rc<TransportController<M>> {
        &self.controller
    }

    pub fn ui(&self) -> &Rc<TransportUi<M>> {
        &self.ui
    }

    pub fn engine(&self) -> &Rc<RenderEngine<M>> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EffectKind, EffectSpec, Position};
    use crate::events::Event;
    use crate::render::EngineState;
    use crate::testing::{
        settings, FakeBar, FakeFactory, FakeMedia, FakeSurface, FakeTicker, FakeTransportView,
        BAR_METRICS,
    };
    use crate::ui::{PlayIcon, SpeakerIcon};

    fn parts(surfaces: usize, view: Rc<FakeTransportView>) -> WidgetParts<FakeMedia> {
        WidgetParts {
            media: FakeMedia::new(),
            factory: Some(Box::new(FakeFactory::new(2048, 1024))),
            view,
            seek_view: Rc::new(FakeBar::new(BAR_METRICS)),
            volume_view: Rc::new(FakeBar::new(BAR_METRICS)),
            drag: Rc::new(DragCoordinator::new()),
            surfaces: (0..surfaces)
                .map(|_| Box::new(FakeSurface::new(300.0, 100.0).0) as Box<dyn Surface>)
                .collect(),
        }
    }

    fn with_effect() -> Settings {
        let mut s = settings(2);
        s.volume = 0.3;
        s.effects.push(EffectSpec {
            kind: EffectKind::Spectrum,
            position: Position::BottomMirror,
            size: 2.0,
            colors: vec!["red".into()],
            style: String::new(),
        });
        s
    }

    #[test]
    fn start_initializes_controls_then_loads() {
        let view = Rc::new(FakeTransportView::default());
        let ticker = FakeTicker::default();
        let handle = ticker.clone();
        let widget = Widget::assemble(with_effect(), parts(1, view.clone()), move |_| {
            Box::new(handle) as Box<dyn FrameTicker>
        })
        .unwrap();
        widget.start().unwrap();

        assert_eq!(view.play.get(), Some(PlayIcon::Play));
        assert_eq!(view.elapsed.borrow().as_str(), "0:00");
        assert_eq!(view.speaker.get(), Some(SpeakerIcon::Down));
        assert_eq!(view.title.borrow().as_str(), "Track 1");
        assert_eq!(widget.controller().current_index(), Some(0));
        assert_eq!(widget.source().gain(), 0.3);

        widget.source().dispatch(&Event::CanPlay);
        widget.controller().toggle();
        widget.source().dispatch(&Event::Playing);
        assert_eq!(widget.engine().state(), EngineState::Running);
        assert_eq!(ticker.starts.get(), 1);
    }

    #[test]
    fn surface_count_must_match_effects() {
        let view = Rc::new(FakeTransportView::default());
        let result = Widget::assemble(with_effect(), parts(0, view), |_| {
            Box::new(FakeTicker::default()) as Box<dyn FrameTicker>
        });
        assert!(matches!(result, Err(PlayerError::Dom(_))));
    }
}
