//! Pinned scroll sections driving phased timelines
//!
//! On wide viewports the section is pinned for a fixed scroll distance and
//! each phase's paused timeline follows its slice of the pin progress. Phases
//! only ever move forward. When the pin is left, its reserved scroll space is
//! removed and the scroll offset is compensated so the page does not jump.
//!
//! On narrow viewports pinning is skipped: the phases are chained into one
//! timeline that plays once, faster, on first interaction or when the section
//! scrolls into view.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use crate::clock::{FrameHandle, Settle, Ticker};
use crate::error::Result;
use crate::host::Element;
use crate::scroll::{
    InputState, OnceGate, ScrollEngine, ScrollToOptions, TriggerCallbacks, TriggerConfig,
    TriggerHandle, TriggerSet, TriggerSnapshot,
};
use crate::settings::PinnedSettings;
use crate::tween::{Ease, Timeline, Tween};

/// A paused timeline mapped onto a slice `[start, end]` of pin progress
pub struct ScrollPhase {
    pub timeline: Timeline,
    pub start: f64,
    pub end: f64,
}

impl ScrollPhase {
    pub fn new(timeline: Timeline, start: f64, end: f64) -> Self {
        Self {
            timeline,
            start,
            end,
        }
    }
}

impl fmt::Debug for ScrollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollPhase")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// Local progress of a phase, clamped to [0, 1]
pub fn phase_progress(progress: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    let raw = if span > 0.0 {
        (progress - start) / span
    } else if progress >= start {
        1.0
    } else {
        0.0
    };
    raw.clamp(0.0, 1.0)
}

/// Lifecycle of a pinned section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Idle,
    PinnedActive,
    Completing,
    Released,
}

/// Page-level services a pinned section needs
#[derive(Clone)]
pub struct PinContext {
    pub ticker: Rc<Ticker>,
    pub triggers: Rc<TriggerSet>,
    /// Without an engine the exit is not compensated
    pub engine: Option<Rc<dyn ScrollEngine>>,
    pub input: Rc<InputState>,
}

struct PhaseSlot {
    timeline: Timeline,
    start: f64,
    end: f64,
    completed: bool,
    tween: Tween<f64>,
    applied: f64,
}

struct PinnedInner {
    slots: Vec<PhaseSlot>,
    state: PinState,
    trigger: Option<TriggerHandle>,
    smoothing: Option<FrameHandle>,
    settle: Option<FrameHandle>,
    release: Option<FrameHandle>,
    engine_stopped: bool,
}

struct PinShared {
    ticker: Rc<Ticker>,
    triggers: Weak<TriggerSet>,
    engine: Option<Rc<dyn ScrollEngine>>,
    input: Rc<InputState>,
    settings: PinnedSettings,
    inner: RefCell<PinnedInner>,
}

impl PinShared {
    fn on_update(self: &Rc<Self>, snap: &TriggerSnapshot) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == PinState::Idle && snap.is_active {
            inner.state = PinState::PinnedActive;
        }
        let (duration, ease) = (self.settings.tween_duration, self.settings.tween_ease);
        for slot in inner.slots.iter_mut().filter(|s| !s.completed) {
            let local = phase_progress(snap.progress, slot.start, slot.end);
            slot.tween.retarget(local, duration, ease);
            if local >= 1.0 {
                slot.completed = true;
            }
        }
        self.ensure_smoothing(&mut inner);
    }

    fn ensure_smoothing(self: &Rc<Self>, inner: &mut PinnedInner) {
        if inner.smoothing.as_ref().is_some_and(FrameHandle::is_active) {
            return;
        }
        let weak = Rc::downgrade(self);
        inner.smoothing = Some(self.ticker.add(move |ft| {
            if let Some(shared) = weak.upgrade() {
                shared.smooth(ft.delta);
            }
        }));
    }

    /// Advance every phase tween and push changed values into the timelines
    fn smooth(&self, dt: f64) {
        let mut inner = self.inner.borrow_mut();
        let mut settled = true;
        for slot in inner.slots.iter_mut() {
            let value = slot.tween.advance(dt);
            if value != slot.applied {
                slot.applied = value;
                slot.timeline.set_progress(value);
            }
            settled &= slot.tween.is_complete();
        }
        if settled {
            if let Some(handle) = inner.smoothing.take() {
                handle.cancel();
            }
        }
    }

    fn on_enter(&self) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.state, PinState::Idle | PinState::Completing) {
            inner.state = PinState::PinnedActive;
            debug!("Pinned section active");
        }
    }

    fn on_leave(self: &Rc<Self>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == PinState::Released
                || inner.settle.as_ref().is_some_and(FrameHandle::is_active)
            {
                return;
            }
            inner.state = PinState::Completing;
        }

        if !self.input.is_touch_device() {
            self.compensate(false);
            return;
        }

        // Let touch momentum die out before touching the scroll offset
        let Some(trigger) = self.inner.borrow().trigger.clone() else {
            return;
        };
        let engine = self.engine.clone();
        let input = self.input.clone();
        let settle_velocity = self.settings.settle_velocity;
        let predicate = move || {
            let snap = trigger.snapshot();
            let velocity = engine.as_ref().map_or(snap.velocity, |e| e.velocity());
            !snap.is_active
                && snap.progress >= 1.0
                && (velocity.abs() < settle_velocity || !input.is_touching())
        };
        let weak = Rc::downgrade(self);
        let handle = self.ticker.wait_until(
            predicate,
            self.settings.settle_timeout_frames,
            move |outcome| {
                if outcome == Settle::TimedOut {
                    warn!("Touch momentum did not settle; releasing pin anyway");
                }
                if let Some(shared) = weak.upgrade() {
                    shared.compensate(true);
                }
            },
        );
        self.inner.borrow_mut().settle = Some(handle);
        debug!("Pinned section waiting for touch momentum to settle");
    }

    /// Kill the pin and jump back by the space it reserved
    fn compensate(self: &Rc<Self>, touch: bool) {
        let Some(trigger) = self.inner.borrow().trigger.clone() else {
            return;
        };
        if touch {
            if let Some(engine) = &self.engine {
                engine.stop();
                self.inner.borrow_mut().engine_stopped = true;
            }
        }

        let snap = trigger.snapshot();
        let reserved = snap.pin_spacing();
        let scroll = self.engine.as_ref().map_or(snap.scroll, |e| e.scroll());
        trigger.kill();
        match &self.engine {
            Some(engine) => engine.scroll_to(scroll - reserved, ScrollToOptions::IMMEDIATE),
            None => warn!("No scroll engine; pin released without compensation"),
        }

        let weak = Rc::downgrade(self);
        let handle = self.ticker.next_frame(move |_| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Some(triggers) = shared.triggers.upgrade() {
                triggers.refresh();
            }
            let restart = std::mem::take(&mut shared.inner.borrow_mut().engine_stopped);
            if restart {
                if let Some(engine) = &shared.engine {
                    engine.start();
                }
            }
            shared.inner.borrow_mut().state = PinState::Released;
            info!("Pinned section released");
        });
        self.inner.borrow_mut().release = Some(handle);
    }

    fn kill(&self) {
        let mut inner = self.inner.borrow_mut();
        for handle in [
            inner.smoothing.take(),
            inner.settle.take(),
            inner.release.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.cancel();
        }
        if let Some(trigger) = inner.trigger.take() {
            trigger.kill();
        }
        if std::mem::take(&mut inner.engine_stopped) {
            if let Some(engine) = &self.engine {
                engine.start();
            }
        }
    }
}

/// Desktop strategy: pin and scrub phases
pub struct PinnedStrategy {
    shared: Rc<PinShared>,
}

impl PinnedStrategy {
    pub fn new(
        ctx: &PinContext,
        element: Rc<dyn Element>,
        phases: Vec<ScrollPhase>,
        settings: &PinnedSettings,
    ) -> Result<Self> {
        let config = TriggerConfig::parse(&settings.start, &settings.end)?.with_pin(true);
        let slots = phases
            .into_iter()
            .map(|phase| PhaseSlot {
                timeline: phase.timeline,
                start: phase.start,
                end: phase.end,
                completed: false,
                tween: Tween::new(0.0, 0.0, 0.0, Ease::None),
                applied: 0.0,
            })
            .collect();
        let shared = Rc::new(PinShared {
            ticker: ctx.ticker.clone(),
            triggers: Rc::downgrade(&ctx.triggers),
            engine: ctx.engine.clone(),
            input: ctx.input.clone(),
            settings: settings.clone(),
            inner: RefCell::new(PinnedInner {
                slots,
                state: PinState::Idle,
                trigger: None,
                smoothing: None,
                settle: None,
                release: None,
                engine_stopped: false,
            }),
        });

        let (on_update, on_enter, on_enter_back, on_leave) = (
            Rc::downgrade(&shared),
            Rc::downgrade(&shared),
            Rc::downgrade(&shared),
            Rc::downgrade(&shared),
        );
        let callbacks = TriggerCallbacks::new()
            .on_update(move |snap| {
                if let Some(shared) = on_update.upgrade() {
                    shared.on_update(snap);
                }
            })
            .on_enter(move |_| {
                if let Some(shared) = on_enter.upgrade() {
                    shared.on_enter();
                }
            })
            .on_enter_back(move |_| {
                if let Some(shared) = on_enter_back.upgrade() {
                    shared.on_enter();
                }
            })
            .on_leave(move |_| {
                if let Some(shared) = on_leave.upgrade() {
                    shared.on_leave();
                }
            });
        let trigger = ctx.triggers.create(element, config, callbacks);
        shared.inner.borrow_mut().trigger = Some(trigger);
        // Pin straight away when the page loads inside the range
        ctx.triggers.update();
        Ok(Self { shared })
    }

    pub fn state(&self) -> PinState {
        self.shared.inner.borrow().state
    }

    /// Progress last written to phase `index`'s timeline
    pub fn phase_value(&self, index: usize) -> Option<f64> {
        self.shared.inner.borrow().slots.get(index).map(|s| s.applied)
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.shared
            .inner
            .borrow()
            .slots
            .get(index)
            .is_some_and(|s| s.completed)
    }

    pub fn trigger(&self) -> Option<TriggerHandle> {
        self.shared.inner.borrow().trigger.clone()
    }

    pub fn kill(&self) {
        self.shared.kill();
    }
}

/// What starts a sequential section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOn {
    /// First scroll, touch or wheel anywhere on the page
    FirstInteraction,
    /// The section's top crossing the configured viewport line
    ViewportEntry,
}

struct SeqInner {
    master: Timeline,
    played: bool,
    playing: Option<FrameHandle>,
    trigger: Option<TriggerHandle>,
    release: Option<FrameHandle>,
}

struct SeqShared {
    ticker: Rc<Ticker>,
    gate: Rc<OnceGate>,
    inner: RefCell<SeqInner>,
}

impl SeqShared {
    fn play(self: &Rc<Self>) {
        let mut inner = self.inner.borrow_mut();
        if inner.played {
            return;
        }
        inner.played = true;
        inner.master.play();
        let weak = Rc::downgrade(self);
        inner.playing = Some(self.ticker.add(move |ft| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let mut inner = shared.inner.borrow_mut();
            if !inner.master.advance(ft.delta) {
                if let Some(handle) = inner.playing.take() {
                    handle.cancel();
                }
                debug!("Sequential section finished");
            }
        }));
        info!(
            "Sequential section playing ({:.2}s at {}x)",
            inner.master.duration(),
            inner.master.time_scale()
        );
    }
}

/// Mobile strategy: one chained timeline, played once
pub struct SequentialStrategy {
    shared: Rc<SeqShared>,
    play_on: PlayOn,
}

impl SequentialStrategy {
    pub fn new(
        ctx: &PinContext,
        element: Rc<dyn Element>,
        phases: Vec<ScrollPhase>,
        settings: &PinnedSettings,
        play_on: PlayOn,
    ) -> Result<Self> {
        let mut master = Timeline::sequence(phases.into_iter().map(|p| p.timeline));
        master.set_time_scale(settings.mobile_time_scale);
        let shared = Rc::new(SeqShared {
            ticker: ctx.ticker.clone(),
            gate: Rc::new(OnceGate::new()),
            inner: RefCell::new(SeqInner {
                master,
                played: false,
                playing: None,
                trigger: None,
                release: None,
            }),
        });

        if play_on == PlayOn::ViewportEntry {
            let config = TriggerConfig::parse(&settings.mobile_start, "bottom top")?.once();
            let weak = Rc::downgrade(&shared);
            let trigger = ctx.triggers.create(
                element,
                config,
                TriggerCallbacks::new().on_enter(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.play();
                    }
                }),
            );
            shared.inner.borrow_mut().trigger = Some(trigger);
            ctx.triggers.update();
        }
        Ok(Self { shared, play_on })
    }

    pub fn play_on(&self) -> PlayOn {
        self.play_on
    }

    /// Holds the page's first-interaction listeners until they fire
    pub fn gate(&self) -> Rc<OnceGate> {
        self.shared.gate.clone()
    }

    /// First scroll/touch/wheel seen; plays at most once
    pub fn notify_interaction(&self) {
        if self.play_on != PlayOn::FirstInteraction || !self.shared.gate.fire() {
            return;
        }
        self.shared.play();
        // Listeners may be mid-dispatch; drop them on the next frame
        let gate = self.shared.gate.clone();
        let handle = self.shared.ticker.next_frame(move |_| gate.release());
        self.shared.inner.borrow_mut().release = Some(handle);
    }

    pub fn has_played(&self) -> bool {
        self.shared.inner.borrow().played
    }

    pub fn is_playing(&self) -> bool {
        self.shared
            .inner
            .borrow()
            .playing
            .as_ref()
            .is_some_and(FrameHandle::is_active)
    }

    /// Child `(offset, duration)` spans of the chained timeline
    pub fn spans(&self) -> Vec<(f64, f64)> {
        self.shared.inner.borrow().master.spans()
    }

    pub fn time_scale(&self) -> f64 {
        self.shared.inner.borrow().master.time_scale()
    }

    pub fn progress(&self) -> f64 {
        self.shared.inner.borrow().master.progress()
    }

    pub fn kill(&self) {
        let mut inner = self.shared.inner.borrow_mut();
        if let Some(handle) = inner.playing.take() {
            handle.cancel();
        }
        if let Some(handle) = inner.release.take() {
            handle.cancel();
        }
        if let Some(trigger) = inner.trigger.take() {
            trigger.kill();
        }
        inner.master.pause();
        self.shared.gate.fire();
        self.shared.gate.release();
    }
}

/// The two ways a phased section can run, fixed at construction
pub enum PinStrategy {
    Pinned(PinnedStrategy),
    Sequential(SequentialStrategy),
}

/// A phased scroll section
pub struct PinnedScroll {
    strategy: PinStrategy,
}

impl PinnedScroll {
    /// Pick the strategy from the viewport width and build it
    ///
    /// `primary` marks the first section on the page; on mobile it starts on
    /// the first interaction instead of on viewport entry.
    pub fn create(
        ctx: &PinContext,
        element: Rc<dyn Element>,
        phases: Vec<ScrollPhase>,
        settings: &PinnedSettings,
        primary: bool,
    ) -> Result<Self> {
        let viewport = ctx.triggers.viewport();
        let strategy = if viewport.is_mobile(settings.mobile_breakpoint) {
            let play_on = if primary {
                PlayOn::FirstInteraction
            } else {
                PlayOn::ViewportEntry
            };
            info!(
                "Phased section ({} phases): sequential, {:?}",
                phases.len(),
                play_on
            );
            PinStrategy::Sequential(SequentialStrategy::new(
                ctx, element, phases, settings, play_on,
            )?)
        } else {
            info!("Phased section ({} phases): pinned", phases.len());
            PinStrategy::Pinned(PinnedStrategy::new(ctx, element, phases, settings)?)
        };
        Ok(Self { strategy })
    }

    pub fn strategy(&self) -> &PinStrategy {
        &self.strategy
    }

    /// Desktop lifecycle state; `None` on the sequential path
    pub fn state(&self) -> Option<PinState> {
        match &self.strategy {
            PinStrategy::Pinned(pinned) => Some(pinned.state()),
            PinStrategy::Sequential(_) => None,
        }
    }

    /// Forward a page interaction (scroll, touchstart, wheel)
    pub fn notify_interaction(&self) {
        if let PinStrategy::Sequential(sequential) = &self.strategy {
            sequential.notify_interaction();
        }
    }

    /// Tear down triggers, frame tasks and pending waits
    pub fn kill(&self) {
        match &self.strategy {
            PinStrategy::Pinned(pinned) => pinned.kill(),
            PinStrategy::Sequential(sequential) => sequential.kill(),
        }
    }
}

impl Drop for PinnedScroll {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;
    use crate::scroll::Viewport;
    use crate::testing::{FakeElement, FakeScroll};
    use proptest::prelude::*;

    type Log = Rc<RefCell<Vec<(&'static str, f32)>>>;

    struct Page {
        ticker: Rc<Ticker>,
        scroll: Rc<FakeScroll>,
        ctx: PinContext,
        element: Rc<FakeElement>,
        log: Log,
        frame: RefCell<u32>,
    }

    impl Page {
        fn new(width: f32, touch: bool) -> Self {
            let ticker = Rc::new(Ticker::new());
            let scroll = FakeScroll::new(20_000.0);
            let triggers = TriggerSet::new(scroll.clone(), Viewport::new(width, 800.0));
            let element = FakeElement::in_document(Rect::new(0.0, 0.0, width, 800.0), &scroll);
            let engine: Rc<dyn ScrollEngine> = scroll.clone();
            let ctx = PinContext {
                ticker: ticker.clone(),
                triggers,
                engine: Some(engine),
                input: Rc::new(InputState::new(touch)),
            };
            Self {
                ticker,
                scroll,
                ctx,
                element,
                log: Log::default(),
                frame: RefCell::new(0),
            }
        }

        fn phase(&self, name: &'static str, start: f64, end: f64) -> ScrollPhase {
            let log = self.log.clone();
            ScrollPhase::new(
                Timeline::new().then(1.0, Ease::None, move |v| log.borrow_mut().push((name, v))),
                start,
                end,
            )
        }

        fn three_phases(&self) -> Vec<ScrollPhase> {
            vec![
                self.phase("a", 0.0, 0.3),
                self.phase("b", 0.3, 0.6),
                self.phase("c", 0.6, 1.0),
            ]
        }

        fn create(&self, phases: Vec<ScrollPhase>, primary: bool) -> PinnedScroll {
            PinnedScroll::create(
                &self.ctx,
                self.element.clone(),
                phases,
                &PinnedSettings::default(),
                primary,
            )
            .unwrap()
        }

        fn tick(&self, frames: u32) {
            for _ in 0..frames {
                let mut frame = self.frame.borrow_mut();
                *frame += 1;
                self.ticker.tick(f64::from(*frame) / 60.0);
            }
        }
    }

    fn pinned(section: &PinnedScroll) -> &PinnedStrategy {
        match section.strategy() {
            PinStrategy::Pinned(p) => p,
            PinStrategy::Sequential(_) => panic!("expected pinned strategy"),
        }
    }

    fn sequential(section: &PinnedScroll) -> &SequentialStrategy {
        match section.strategy() {
            PinStrategy::Sequential(s) => s,
            PinStrategy::Pinned(_) => panic!("expected sequential strategy"),
        }
    }

    #[test]
    fn test_phase_progress_clamps() {
        assert_eq!(phase_progress(0.0, 0.3, 0.6), 0.0);
        assert_eq!(phase_progress(0.45, 0.3, 0.6), 0.5);
        assert_eq!(phase_progress(0.9, 0.3, 0.6), 1.0);
        assert_eq!(phase_progress(0.5, 0.5, 0.5), 1.0);
        assert_eq!(phase_progress(0.4, 0.5, 0.5), 0.0);
    }

    #[test]
    fn test_phases_are_eased_not_jump_set() {
        let page = Page::new(1280.0, false);
        let section = page.create(page.three_phases(), false);
        let strategy = pinned(&section);

        // Pin range is 0..2000; 300px is half of phase "a"
        page.scroll.set(300.0, 5.0);
        assert_eq!(strategy.state(), PinState::PinnedActive);
        assert_eq!(strategy.phase_value(0), Some(0.0));
        page.tick(3);
        let early = strategy.phase_value(0).unwrap();
        assert!(early > 0.0 && early < 0.5);
        page.tick(60);
        assert!((strategy.phase_value(0).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(strategy.phase_value(1), Some(0.0));
    }

    #[test]
    fn test_completed_phase_never_regresses() {
        let page = Page::new(1280.0, false);
        let section = page.create(page.three_phases(), false);
        let strategy = pinned(&section);

        page.scroll.set(700.0, 5.0);
        assert!(strategy.is_completed(0));
        assert!(!strategy.is_completed(1));
        page.tick(60);
        assert_eq!(strategy.phase_value(0), Some(1.0));

        page.scroll.set(100.0, -5.0);
        page.tick(60);
        assert_eq!(strategy.phase_value(0), Some(1.0));
        // Phase "b" is still live and follows the scroll back down
        assert_eq!(strategy.phase_value(1), Some(0.0));
        assert_eq!(page.log.borrow().iter().rev().find(|(n, _)| *n == "a").map(|e| e.1), Some(1.0));
    }

    #[test]
    fn test_desktop_exit_compensates_reserved_space() {
        let page = Page::new(1280.0, false);
        let section = page.create(page.three_phases(), false);
        let trigger = pinned(&section).trigger().unwrap();
        assert_eq!(page.element.pin_spacing(), 2000.0);

        page.scroll.set(1000.0, 10.0);
        page.scroll.set(2150.0, 10.0);
        assert_eq!(section.state(), Some(PinState::Completing));
        assert!(!trigger.is_alive());
        assert_eq!(page.element.pin_spacing(), 0.0);
        assert_eq!(page.scroll.jumps(), vec![(150.0, true)]);
        assert_eq!(page.scroll.calls(), vec!["scroll_to"]);

        page.tick(1);
        assert_eq!(section.state(), Some(PinState::Released));
        page.tick(60);
        for i in 0..3 {
            assert_eq!(pinned(&section).phase_value(i), Some(1.0));
        }
    }

    #[test]
    fn test_touch_exit_waits_for_momentum() {
        let page = Page::new(1280.0, true);
        let section = page.create(page.three_phases(), false);
        page.ctx.input.touch_start();

        page.scroll.set(1000.0, 10.0);
        page.scroll.set(2150.0, 40.0);
        assert_eq!(section.state(), Some(PinState::Completing));
        page.tick(10);
        assert!(page.scroll.jumps().is_empty());

        page.scroll.set_velocity(0.2);
        page.tick(1);
        assert_eq!(page.scroll.calls(), vec!["stop", "scroll_to"]);
        assert_eq!(page.scroll.jumps(), vec![(150.0, true)]);
        assert!(page.scroll.is_stopped());
        assert_eq!(section.state(), Some(PinState::Completing));

        page.tick(1);
        assert_eq!(page.scroll.calls(), vec!["stop", "scroll_to", "start"]);
        assert!(!page.scroll.is_stopped());
        assert_eq!(section.state(), Some(PinState::Released));
    }

    #[test]
    fn test_touch_exit_proceeds_once_finger_lifts() {
        let page = Page::new(1280.0, true);
        let section = page.create(page.three_phases(), false);
        page.ctx.input.touch_start();
        page.scroll.set(2150.0, 40.0);
        page.tick(5);
        assert!(page.scroll.jumps().is_empty());

        page.ctx.input.touch_end();
        page.tick(2);
        assert_eq!(page.scroll.jumps(), vec![(150.0, true)]);
        assert_eq!(section.state(), Some(PinState::Released));
    }

    #[test]
    fn test_settle_timeout_bounds_the_wait() {
        let page = Page::new(1280.0, true);
        let settings = PinnedSettings {
            settle_timeout_frames: Some(3),
            ..Default::default()
        };
        let section = PinnedScroll::create(
            &page.ctx,
            page.element.clone(),
            page.three_phases(),
            &settings,
            false,
        )
        .unwrap();
        page.ctx.input.touch_start();
        page.scroll.set(2150.0, 40.0);
        page.tick(2);
        assert!(page.scroll.jumps().is_empty());
        page.tick(2);
        assert_eq!(page.scroll.jumps().len(), 1);
        assert_eq!(section.state(), Some(PinState::Released));
    }

    #[test]
    fn test_kill_tears_down_pending_work() {
        let page = Page::new(1280.0, true);
        let section = page.create(page.three_phases(), false);
        page.ctx.input.touch_start();
        page.scroll.set(1000.0, 10.0);
        page.scroll.set(2150.0, 40.0);
        section.kill();
        page.tick(20);
        assert!(page.scroll.jumps().is_empty());
        assert_eq!(page.ticker.task_count(), 0);
        assert!(page.ctx.triggers.is_empty());
    }

    #[test]
    fn test_mobile_chains_phases_at_accelerated_rate() {
        let page = Page::new(375.0, true);
        let section = page.create(page.three_phases(), true);
        assert_eq!(section.state(), None);
        let strategy = sequential(&section);
        assert_eq!(strategy.spans(), vec![(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]);
        assert_eq!(strategy.time_scale(), 1.8);
        assert!(page.ctx.triggers.is_empty(), "no pin on mobile");

        page.tick(30);
        assert!(!strategy.has_played());

        strategy.gate().hold("listeners");
        section.notify_interaction();
        section.notify_interaction();
        assert!(strategy.is_playing());
        page.tick(1);
        assert_eq!(strategy.gate().held(), 0);

        // 3s of phases at 1.8x finish in about 100 frames
        page.tick(95);
        assert!(strategy.is_playing());
        page.tick(10);
        assert!(!strategy.is_playing());
        assert_eq!(strategy.progress(), 1.0);

        let log = page.log.borrow();
        let order: Vec<&str> = log
            .iter()
            .filter(|(_, v)| *v > 0.0 && *v < 1.0)
            .map(|(n, _)| *n)
            .collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted, "phases never interleave");
        assert!(order.contains(&"a") && order.contains(&"c"));
    }

    #[test]
    fn test_mobile_secondary_plays_on_viewport_entry() {
        let page = Page::new(375.0, true);
        page.element.set_doc_rect(Rect::new(0.0, 1000.0, 375.0, 400.0));
        let section = page.create(page.three_phases(), false);
        let strategy = sequential(&section);
        assert_eq!(strategy.play_on(), PlayOn::ViewportEntry);

        section.notify_interaction();
        assert!(!strategy.has_played());

        // "top 60%" of an 800px viewport: 1000 - 480
        page.scroll.set(500.0, 5.0);
        assert!(!strategy.has_played());
        page.scroll.set(530.0, 5.0);
        assert!(strategy.is_playing());
        assert!(page.ctx.triggers.is_empty());
    }

    #[test]
    fn test_desktop_section_loaded_mid_range_is_pinned() {
        let page = Page::new(1280.0, false);
        page.scroll.set(500.0, 0.0);
        let section = page.create(page.three_phases(), false);
        assert_eq!(section.state(), Some(PinState::PinnedActive));
        assert_eq!(page.element.transform().translate.y, 500.0);
        assert_eq!(page.element.rect().top, 0.0);
        page.tick(60);
        // 500px of a 2000px pin is 0.25, most of the way through phase "a"
        let a = pinned(&section).phase_value(0).unwrap();
        assert!((a - 0.25 / 0.3).abs() < 1e-9);
        assert_eq!(pinned(&section).phase_value(1), Some(0.0));
    }

    #[test]
    fn test_mobile_secondary_already_in_view_plays_at_once() {
        let page = Page::new(375.0, true);
        page.element.set_doc_rect(Rect::new(0.0, 1000.0, 375.0, 400.0));
        page.scroll.set(700.0, 0.0);
        let section = page.create(page.three_phases(), false);
        let strategy = sequential(&section);
        assert!(strategy.is_playing());
        assert!(page.ctx.triggers.is_empty());
    }

    proptest! {
        #[test]
        fn prop_phase_progress_in_unit_range(
            p in -2.0f64..3.0,
            start in 0.0f64..1.0,
            len in 0.0f64..1.0,
        ) {
            let value = phase_progress(p, start, start + len);
            prop_assert!((0.0..=1.0).contains(&value));
        }

        #[test]
        fn prop_out_of_range_raw_clamps(over in 1.0f64..5.0, under in 0.0f64..5.0) {
            // raw = p for the phase [0, 1]
            prop_assert_eq!(phase_progress(over, 0.0, 1.0), 1.0);
            prop_assert_eq!(phase_progress(-under, 0.0, 1.0), 0.0);
        }
    }
}
