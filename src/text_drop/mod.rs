//! Physics-driven text drops
//!
//! A string (or each of its letters) falls onto an invisible ground and is
//! redrawn every frame at its body's pose. Geometry depends on the canvas
//! width, so a width change tears the whole simulation down and rebuilds it.

pub mod layout;
pub mod surface;

pub use layout::{DropVariant, Glyph, Scene};
pub use surface::{DROP_FAMILY, DROP_WEIGHT, FontSpec, Surface};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::clock::{Debouncer, FrameHandle, Ticker};
use crate::physics::Runner;
use crate::settings::PhysicsSettings;

struct DropState {
    rng: Pcg32,
    scene: Option<Scene>,
    runner: Option<Runner>,
    step: Option<FrameHandle>,
    render: Option<FrameHandle>,
    mount: Option<FrameHandle>,
    debounce: Debouncer,
    running: bool,
    generation: u64,
    prev_width: f32,
}

struct DropCore<S: Surface> {
    ticker: Rc<Ticker>,
    surface: Rc<S>,
    variant: DropVariant,
    state: RefCell<DropState>,
}

impl<S: Surface + 'static> DropCore<S> {
    fn init(self: &Rc<Self>) {
        if self.state.borrow().running {
            debug!("Text drop already running");
            return;
        }
        if !self.surface.has_context() {
            warn!("Text drop disabled: no 2D context");
            return;
        }

        let size = self.surface.size();
        let mut state = self.state.borrow_mut();
        let Some(scene) = layout::build(&self.variant, &*self.surface, size, &mut state.rng)
        else {
            warn!("Text drop skipped: nothing to measure at {size}");
            return;
        };
        info!(
            "Text drop #{} built: {} glyphs at {}px on {size}",
            state.generation + 1,
            scene.glyphs.len(),
            scene.font.size
        );
        state.running = true;
        state.generation += 1;
        state.scene = Some(scene);
        state.runner = Some(Runner::default());

        let weak: Weak<Self> = Rc::downgrade(self);
        state.step = Some(self.ticker.add(move |ft| {
            if let Some(core) = weak.upgrade() {
                core.step(ft.delta as f32);
            }
        }));
        let weak: Weak<Self> = Rc::downgrade(self);
        state.render = Some(self.ticker.add(move |_| {
            if let Some(core) = weak.upgrade() {
                core.draw();
            }
        }));
    }

    fn step(&self, dt: f32) {
        let mut state = self.state.borrow_mut();
        let DropState { scene, runner, .. } = &mut *state;
        if let (Some(scene), Some(runner)) = (scene.as_mut(), runner.as_mut()) {
            let steps = runner.advance(&mut scene.world, dt);
            trace!("Text drop stepped {steps}x");
        }
    }

    fn draw(&self) {
        let state = self.state.borrow();
        let Some(scene) = &state.scene else {
            return;
        };
        self.surface.clear();
        self.surface.begin_text(&scene.font, scene.fill);
        for glyph in &scene.glyphs {
            if let Some(body) = scene.world.body(glyph.body) {
                self.surface.draw_glyph(&glyph.text, body.position, body.angle);
            }
        }
    }

    fn destroy(&self) {
        let mut state = self.state.borrow_mut();
        for handle in [state.render.take(), state.step.take()].into_iter().flatten() {
            handle.cancel();
        }
        if let Some(mut runner) = state.runner.take() {
            runner.stop();
        }
        if let Some(mut scene) = state.scene.take() {
            scene.world.clear();
        }
        if state.running {
            debug!("Text drop #{} destroyed", state.generation);
        }
        state.running = false;
    }

    fn mount(self: &Rc<Self>) {
        let width = self.surface.sync_size().x;
        let mut state = self.state.borrow_mut();
        state.prev_width = width;

        // Two frames so CSS layout has settled before measuring
        let weak: Weak<Self> = Rc::downgrade(self);
        state.mount = Some(self.ticker.next_frame(move |_| {
            let Some(core) = weak.upgrade() else {
                return;
            };
            let weak = Rc::downgrade(&core);
            let handle = core.ticker.next_frame(move |_| {
                if let Some(core) = weak.upgrade() {
                    core.state.borrow_mut().mount = None;
                    let width = core.surface.sync_size().x;
                    core.state.borrow_mut().prev_width = width;
                    core.init();
                }
            });
            core.state.borrow_mut().mount = Some(handle);
        }));
    }

    fn on_resize(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.state.borrow_mut().debounce.call(&self.ticker, move || {
            if let Some(core) = weak.upgrade() {
                core.settle_resize();
            }
        });
    }

    fn settle_resize(self: &Rc<Self>) {
        let width = self.surface.container_width();
        {
            let mut state = self.state.borrow_mut();
            if width == state.prev_width {
                trace!("Resize settled at unchanged width {width}");
                return;
            }
            info!("Text drop rebuild: {} -> {width}px", state.prev_width);
            state.prev_width = width;
        }
        self.destroy();
        self.surface.sync_size();
        self.init();
    }

    fn unmount(&self) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(handle) = state.mount.take() {
                handle.cancel();
            }
            state.debounce.cancel();
        }
        self.destroy();
    }
}

/// One text drop bound to a canvas surface
pub struct TextDrop<S: Surface + 'static> {
    core: Rc<DropCore<S>>,
}

impl<S: Surface + 'static> TextDrop<S> {
    pub fn new(
        ticker: Rc<Ticker>,
        surface: Rc<S>,
        variant: DropVariant,
        settings: &PhysicsSettings,
        seed: u64,
    ) -> Self {
        Self {
            core: Rc::new(DropCore {
                ticker,
                surface,
                variant,
                state: RefCell::new(DropState {
                    rng: Pcg32::seed_from_u64(seed),
                    scene: None,
                    runner: None,
                    step: None,
                    render: None,
                    mount: None,
                    debounce: Debouncer::new(settings.resize_debounce),
                    running: false,
                    generation: 0,
                    prev_width: 0.0,
                }),
            }),
        }
    }

    pub fn variant(&self) -> &DropVariant {
        &self.core.variant
    }

    /// Sync the canvas and build after two frames
    pub fn mount(&self) {
        self.core.mount();
    }

    /// Build the world and start stepping and drawing (no-op while running)
    pub fn init(&self) {
        self.core.init();
    }

    /// Stop both loops and discard every body
    pub fn destroy(&self) {
        self.core.destroy();
    }

    /// Schedule a debounced width check
    pub fn on_resize(&self) {
        self.core.on_resize();
    }

    pub fn unmount(&self) {
        self.core.unmount();
    }

    pub fn is_running(&self) -> bool {
        self.core.state.borrow().running
    }

    /// Number of builds so far
    pub fn generation(&self) -> u64 {
        self.core.state.borrow().generation
    }

    pub fn font_size(&self) -> Option<f32> {
        self.core.state.borrow().scene.as_ref().map(|s| s.font.size)
    }

    /// Dynamic bodies in the live world
    pub fn body_count(&self) -> usize {
        self.core
            .state
            .borrow()
            .scene
            .as_ref()
            .map_or(0, |s| s.world.dynamic_count())
    }

    /// Text, position and angle of every glyph
    pub fn glyphs(&self) -> Vec<(String, Vec2, f32)> {
        let state = self.core.state.borrow();
        let Some(scene) = &state.scene else {
            return Vec::new();
        };
        scene
            .glyphs
            .iter()
            .filter_map(|g| {
                let body = scene.world.body(g.body)?;
                Some((g.text.clone(), body.position, body.angle))
            })
            .collect()
    }

    /// Body sizes in glyph order
    pub fn body_sizes(&self) -> Vec<Vec2> {
        let state = self.core.state.borrow();
        let Some(scene) = &state.scene else {
            return Vec::new();
        };
        scene
            .glyphs
            .iter()
            .filter_map(|g| scene.world.body(g.body).map(|b| b.size()))
            .collect()
    }

    /// Whether every body has (nearly) stopped moving
    pub fn is_settled(&self, threshold: f32) -> bool {
        self.core
            .state
            .borrow()
            .scene
            .as_ref()
            .is_some_and(|s| s.world.max_motion() < threshold * threshold)
    }
}

impl<S: Surface + 'static> Drop for TextDrop<S> {
    fn drop(&mut self) {
        self.core.unmount();
    }
}
