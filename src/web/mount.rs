//! Page mounting by `data-motion` attributes
//!
//! | `data-motion`     | Effect                                                    |
//! |-------------------|-----------------------------------------------------------|
//! | `cursor-label`    | Cursor follower; the label is the `[data-motion-label]` child |
//! | `magnetic`        | Magnetic hover                                            |
//! | `parallax`        | Scroll parallax, `data-speed` overrides the travel        |
//! | `pinned`          | Phased section; phases are `[data-motion-phase]` children with `data-phase-start`/`data-phase-end` |
//! | `drag-scroll`     | Click-and-drag horizontal scrolling                       |
//! | `error-physics`   | Block text drop on the child canvas (`data-text`, default `404`) |
//! | `contact-physics` | Letter text drop on the child canvas (`data-text`)        |
//!
//! One page session lives in a thread local from `mount_page` until
//! `unmount_page` (called on `pagehide`).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;
use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::canvas::CanvasSurface;
use super::element::DomElement;
use super::frame::FrameLoop;
use super::listener::EventListener;
use super::scroll::ScrollBinding;
use super::{document, window};
use crate::clock::{FrameClockAdapter, Ticker};
use crate::effects::{
    CursorFollower, DragScroll, MagneticHover, ParallaxBinding, PinContext, PinStrategy,
    PinnedScroll, PlayOn, ScrollPhase,
};
use crate::error::{MotionError, Result};
use crate::scroll::{InputState, ScrollEngine, SmoothScroll, TriggerSet, Viewport};
use crate::settings::Settings;
use crate::text_drop::{DropVariant, TextDrop};
use crate::tween::{Ease, Timeline};

/// Seconds each phase timeline spans before scaling
const PHASE_DURATION: f64 = 1.0;
/// Phase content rises this far (px) while fading in
const PHASE_RISE: f32 = 40.0;
/// Class toggled on a drag-scroll container while grabbed
const GRABBING_CLASS: &str = "active:cursor-grabbing";

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

fn viewport(window: &Window) -> Viewport {
    let px = |v: Option<f64>| v.unwrap_or(0.0) as f32;
    Viewport::new(
        px(window.inner_width().ok().and_then(|v| v.as_f64())),
        px(window.inner_height().ok().and_then(|v| v.as_f64())),
    )
}

fn is_touch_device(window: &Window) -> bool {
    js_sys::Reflect::has(window, &"ontouchstart".into()).unwrap_or(false)
        || window.navigator().max_touch_points() > 0
}

fn client(e: &MouseEvent) -> Vec2 {
    Vec2::new(e.client_x() as f32, e.client_y() as f32)
}

fn attr_f64(element: &web_sys::Element, name: &str) -> Option<f64> {
    element.get_attribute(name)?.trim().parse().ok()
}

/// Every effect mounted on the page
///
/// Listeners are declared first so they drop before the effects they feed.
pub struct Page {
    listeners: Vec<EventListener>,
    drops: Vec<Rc<TextDrop<CanvasSurface>>>,
    pinned: Vec<Rc<PinnedScroll>>,
    parallax: Vec<ParallaxBinding>,
    magnets: Vec<Rc<MagneticHover>>,
    cursors: Vec<Rc<CursorFollower>>,
    triggers: Rc<TriggerSet>,
    scroll: ScrollBinding,
    adapter: FrameClockAdapter,
    input: Rc<InputState>,
    frame: FrameLoop,
    ticker: Rc<Ticker>,
    settings: Settings,
    seed: u64,
}

impl Page {
    /// Start the frame loop and scroll engine, then bind every `[data-motion]` element
    pub fn mount(settings: Settings) -> Result<Self> {
        let window = window()?;
        let ticker = Rc::new(Ticker::new());
        let frame = FrameLoop::start(ticker.clone())?;

        let engine = Rc::new(SmoothScroll::new(settings.scroll.clone(), 0.0));
        let adapter = FrameClockAdapter::install(&ticker, engine.clone());
        let input = Rc::new(InputState::new(is_touch_device(&window)));
        let smooth = settings.effective_smooth_scroll();
        let scroll = ScrollBinding::attach(engine.clone(), input.clone(), smooth)?;
        let triggers = TriggerSet::new(engine.clone(), viewport(&window));

        let mut page = Self {
            listeners: Vec::new(),
            drops: Vec::new(),
            pinned: Vec::new(),
            parallax: Vec::new(),
            magnets: Vec::new(),
            cursors: Vec::new(),
            triggers,
            scroll,
            adapter,
            input,
            frame,
            ticker,
            settings,
            seed: js_sys::Date::now() as u64,
        };

        let nodes = document()?.query_selector_all("[data-motion]")?;
        for i in 0..nodes.length() {
            let Some(element) = nodes
                .get(i)
                .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let kind = element.get_attribute("data-motion").unwrap_or_default();
            if let Err(e) = page.bind(&kind, element) {
                warn!("Skipping data-motion=\"{kind}\": {e}");
            }
        }
        // Bound elements may have shifted each other (pin spacing); measure again
        page.triggers.refresh();
        page.listen_resize(&window)?;
        info!(
            "Page mounted: {} cursors, {} magnets, {} parallax, {} pinned, {} drops",
            page.cursors.len(),
            page.magnets.len(),
            page.parallax.len(),
            page.pinned.len(),
            page.drops.len()
        );
        Ok(page)
    }

    fn bind(&mut self, kind: &str, element: web_sys::Element) -> Result<()> {
        let html = element
            .clone()
            .dyn_into::<HtmlElement>()
            .map_err(|_| MotionError::MissingElement(format!("{kind} is not an HTML element")))?;
        match kind {
            "cursor-label" => self.bind_cursor(html),
            "magnetic" => self.bind_magnetic(html),
            "parallax" => self.bind_parallax(html),
            "pinned" => self.bind_pinned(html),
            "drag-scroll" => self.bind_drag(html),
            "error-physics" => {
                let text = element.get_attribute("data-text");
                self.bind_drop(html, DropVariant::block(text.as_deref().unwrap_or("404")))
            }
            "contact-physics" => {
                let text = element.get_attribute("data-text").unwrap_or_default();
                self.bind_drop(html, DropVariant::letters(text))
            }
            other => {
                warn!("Unknown data-motion value {other:?}");
                Ok(())
            }
        }
    }

    fn bind_cursor(&mut self, container: HtmlElement) -> Result<()> {
        let label = container
            .query_selector("[data-motion-label]")?
            .and_then(DomElement::from_element)
            .ok_or_else(|| MotionError::MissingElement("[data-motion-label]".to_string()))?;
        let follower = Rc::new(CursorFollower::new(
            self.ticker.clone(),
            self.settings.cursor.clone(),
        ));
        follower.attach(DomElement::new(container.clone()), label);

        let target: &web_sys::EventTarget = &container;
        let weak = Rc::downgrade(&follower);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            target,
            "mouseenter",
            move |e| {
                if let Some(f) = weak.upgrade() {
                    f.on_pointer_enter(client(e));
                }
            },
        )?);
        let weak = Rc::downgrade(&follower);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            target,
            "mousemove",
            move |e| {
                if let Some(f) = weak.upgrade() {
                    f.on_pointer_move(client(e));
                }
            },
        )?);
        let weak = Rc::downgrade(&follower);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            target,
            "mouseleave",
            move |_| {
                if let Some(f) = weak.upgrade() {
                    f.on_pointer_leave();
                }
            },
        )?);
        self.cursors.push(follower);
        Ok(())
    }

    fn bind_magnetic(&mut self, html: HtmlElement) -> Result<()> {
        let magnet = Rc::new(MagneticHover::new(
            self.ticker.clone(),
            self.settings.magnetic.clone(),
        ));
        magnet.attach(DomElement::new(html.clone()));

        let weak = Rc::downgrade(&magnet);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            &html,
            "mousemove",
            move |e| {
                if let Some(m) = weak.upgrade() {
                    m.on_move(client(e));
                }
            },
        )?);
        let weak = Rc::downgrade(&magnet);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            &html,
            "mouseleave",
            move |_| {
                if let Some(m) = weak.upgrade() {
                    m.on_leave();
                }
            },
        )?);
        self.magnets.push(magnet);
        Ok(())
    }

    fn bind_parallax(&mut self, html: HtmlElement) -> Result<()> {
        let mut settings = self.settings.clone();
        if let Some(speed) = attr_f64(&html, "data-speed") {
            settings.parallax.speed = speed as f32;
        }
        if let Some(binding) =
            ParallaxBinding::attach(&self.triggers, DomElement::new(html), &settings)?
        {
            self.parallax.push(binding);
        }
        Ok(())
    }

    /// One fade-and-rise timeline per `[data-motion-phase]` child
    fn phases(section: &HtmlElement) -> Result<Vec<ScrollPhase>> {
        let nodes = section.query_selector_all("[data-motion-phase]")?;
        let count = nodes.length();
        let mut phases = Vec::with_capacity(count as usize);
        for i in 0..count {
            let Some(element) = nodes
                .get(i)
                .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let even = f64::from(i) / f64::from(count);
            let start = attr_f64(&element, "data-phase-start").unwrap_or(even);
            let end = attr_f64(&element, "data-phase-end")
                .unwrap_or(even + 1.0 / f64::from(count));
            let Some(dom) = DomElement::from_element(element) else {
                continue;
            };
            let apply = move |t: f32| {
                dom.set_style("opacity", &t.to_string());
                dom.set_style(
                    "transform",
                    &format!("translateY({}px)", PHASE_RISE * (1.0 - t)),
                );
            };
            apply(0.0);
            let timeline = Timeline::new().then(PHASE_DURATION, Ease::POWER2_OUT, apply);
            phases.push(ScrollPhase::new(timeline, start, end));
        }
        Ok(phases)
    }

    fn bind_pinned(&mut self, html: HtmlElement) -> Result<()> {
        let phases = Self::phases(&html)?;
        let ctx = PinContext {
            ticker: self.ticker.clone(),
            triggers: self.triggers.clone(),
            // Native scrolling has nothing to compensate through
            engine: self
                .scroll
                .is_smooth()
                .then(|| self.scroll.engine().clone() as Rc<dyn ScrollEngine>),
            input: self.input.clone(),
        };
        let primary = self.pinned.is_empty();
        let pinned = Rc::new(PinnedScroll::create(
            &ctx,
            DomElement::new(html),
            phases,
            &self.settings.pinned,
            primary,
        )?);

        if let PinStrategy::Sequential(sequential) = pinned.strategy() {
            if sequential.play_on() == PlayOn::FirstInteraction {
                let gate = sequential.gate();
                let window = window()?;
                for event in ["scroll", "touchstart", "wheel"] {
                    let weak: Weak<PinnedScroll> = Rc::downgrade(&pinned);
                    gate.hold(EventListener::new(&window, event, true, move |_| {
                        if let Some(pinned) = weak.upgrade() {
                            pinned.notify_interaction();
                        }
                    })?);
                }
            }
        }
        self.pinned.push(pinned);
        Ok(())
    }

    fn bind_drag(&mut self, container: HtmlElement) -> Result<()> {
        let drag = Rc::new(RefCell::new(DragScroll::new()));
        let window = window()?;

        let (state, el) = (drag.clone(), container.clone());
        self.listeners.push(EventListener::active::<MouseEvent>(
            &container,
            "mousedown",
            move |e| {
                state.borrow_mut().pointer_down(
                    e.page_x() as f32,
                    el.offset_left() as f32,
                    el.scroll_left() as f32,
                );
                let _ = el.class_list().add_1(GRABBING_CLASS);
            },
        )?);
        let (state, el) = (drag.clone(), container.clone());
        self.listeners.push(EventListener::active::<MouseEvent>(
            &window,
            "mousemove",
            move |e| {
                let Some(left) = state
                    .borrow()
                    .pointer_move(e.page_x() as f32, el.offset_left() as f32)
                else {
                    return;
                };
                e.prevent_default();
                el.set_scroll_left(left.round() as i32);
            },
        )?);
        let (state, el) = (drag, container);
        self.listeners.push(EventListener::passive::<MouseEvent>(
            &window,
            "mouseup",
            move |_| {
                if state.borrow().is_dragging() {
                    state.borrow_mut().pointer_up();
                    let _ = el.class_list().remove_1(GRABBING_CLASS);
                }
            },
        )?);
        Ok(())
    }

    fn bind_drop(&mut self, container: HtmlElement, variant: DropVariant) -> Result<()> {
        let canvas = container
            .query_selector("canvas")?
            .and_then(|c| c.dyn_into::<HtmlCanvasElement>().ok())
            .ok_or_else(|| MotionError::MissingElement("canvas".to_string()))?;
        let surface = CanvasSurface::new(canvas, container);
        let seed = self.seed.wrapping_add(self.drops.len() as u64);
        let drop = Rc::new(TextDrop::new(
            self.ticker.clone(),
            surface,
            variant,
            &self.settings.physics,
            seed,
        ));
        drop.mount();
        self.drops.push(drop);
        Ok(())
    }

    /// Window resize: new viewport for triggers, debounced rebuild for drops
    fn listen_resize(&mut self, window: &Window) -> Result<()> {
        let triggers = Rc::downgrade(&self.triggers);
        let drops: Vec<Weak<TextDrop<CanvasSurface>>> =
            self.drops.iter().map(Rc::downgrade).collect();
        let page = window.clone();
        self.listeners.push(EventListener::passive::<web_sys::Event>(
            window,
            "resize",
            move |_| {
                if let Some(triggers) = triggers.upgrade() {
                    triggers.set_viewport(viewport(&page));
                    triggers.refresh();
                }
                for drop in drops.iter().filter_map(Weak::upgrade) {
                    drop.on_resize();
                }
            },
        )?);
        Ok(())
    }

    /// Tear down every effect, then the scroll binding and frame loop
    pub fn unmount(mut self) {
        self.listeners.clear();
        for drop in self.drops.drain(..) {
            drop.unmount();
        }
        for pinned in self.pinned.drain(..) {
            pinned.kill();
        }
        for binding in self.parallax.drain(..) {
            binding.revert();
        }
        for magnet in self.magnets.drain(..) {
            magnet.unmount();
        }
        for cursor in self.cursors.drain(..) {
            cursor.unmount();
        }
        self.triggers.kill_all();
        self.adapter.uninstall();
        self.frame.stop();
        info!("Page unmounted");
    }
}

/// Mount the page once; later calls are ignored
pub fn mount_page(settings: Settings) -> Result<()> {
    if PAGE.with(|p| p.borrow().is_some()) {
        warn!("Page already mounted");
        return Ok(());
    }
    let page = Page::mount(settings)?;
    PAGE.with(|p| *p.borrow_mut() = Some(page));

    // Lives as long as the document
    let on_hide = Closure::<dyn FnMut()>::new(unmount_page);
    window()?.add_event_listener_with_callback("pagehide", on_hide.as_ref().unchecked_ref())?;
    on_hide.forget();
    Ok(())
}

/// Unmount the current page session, if any
pub fn unmount_page() {
    if let Some(page) = PAGE.with(|p| p.borrow_mut().take()) {
        page.unmount();
    }
}
