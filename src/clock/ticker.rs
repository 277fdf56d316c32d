//! Shared animation ticker
//!
//! One ticker per page session. The host calls [`Ticker::tick`] once per
//! display frame; everything that needs per-frame work registers a task and
//! keeps the returned [`FrameHandle`]. Cancelling the handle is the only way to
//! stop a task.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::consts::{LAG_ADJUSTED, LAG_THRESHOLD};

/// Timing information handed to every task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds of (lag-adjusted) time since the first tick
    pub time: f64,
    /// Seconds since the previous tick
    pub delta: f64,
    /// Tick counter, starting at 1
    pub frame: u64,
}

/// Replace long frame gaps (tab switches, GC pauses) with a small fixed delta
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagSmoothing {
    /// Deltas above this (seconds) count as lag
    pub threshold: f64,
    /// Delta used instead when lag is detected
    pub adjusted: f64,
}

impl Default for LagSmoothing {
    fn default() -> Self {
        Self {
            threshold: LAG_THRESHOLD,
            adjusted: LAG_ADJUSTED,
        }
    }
}

/// Outcome reported to a [`Ticker::wait_until`] continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// The predicate held
    Ready,
    /// The frame budget ran out first
    TimedOut,
}

/// Owned handle to a scheduled task
///
/// Dropping the handle does not stop the task; call [`FrameHandle::cancel`].
#[derive(Debug)]
pub struct FrameHandle {
    live: Rc<Cell<bool>>,
}

impl FrameHandle {
    /// Stop the task. Idempotent.
    pub fn cancel(&self) {
        self.live.set(false);
    }

    /// Whether the task will still run (one-shot tasks go inactive after firing)
    pub fn is_active(&self) -> bool {
        self.live.get()
    }
}

enum TaskKind {
    Repeat(Box<dyn FnMut(&FrameTime)>),
    Once(Option<Box<dyn FnOnce(&FrameTime)>>),
    Timer {
        due: f64,
        callback: Option<Box<dyn FnOnce()>>,
    },
    Until {
        predicate: Box<dyn FnMut() -> bool>,
        then: Option<Box<dyn FnOnce(Settle)>>,
        max_frames: Option<u32>,
        polled: u32,
    },
}

struct Task {
    live: Rc<Cell<bool>>,
    kind: TaskKind,
}

impl Task {
    /// Run for one frame. Returns whether the task stays scheduled.
    fn run(&mut self, now: &FrameTime) -> bool {
        if !self.live.get() {
            return false;
        }
        match &mut self.kind {
            TaskKind::Repeat(callback) => {
                callback(now);
                self.live.get()
            }
            TaskKind::Once(callback) => {
                self.live.set(false);
                if let Some(callback) = callback.take() {
                    callback(now);
                }
                false
            }
            TaskKind::Timer { due, callback } => {
                if now.time < *due {
                    return true;
                }
                self.live.set(false);
                if let Some(callback) = callback.take() {
                    callback();
                }
                false
            }
            TaskKind::Until {
                predicate,
                then,
                max_frames,
                polled,
            } => {
                *polled += 1;
                let outcome = if predicate() {
                    Settle::Ready
                } else if max_frames.is_some_and(|max| *polled >= max) {
                    Settle::TimedOut
                } else {
                    return true;
                };
                self.live.set(false);
                if let Some(then) = then.take() {
                    then(outcome);
                }
                false
            }
        }
    }
}

#[derive(Default)]
struct TickerInner {
    tasks: Vec<Task>,
    last_now: Option<f64>,
    elapsed: f64,
    frame: u64,
    lag: Option<LagSmoothing>,
}

/// Shared per-frame clock
pub struct Ticker {
    inner: RefCell<TickerInner>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Ticker")
            .field("tasks", &inner.tasks.len())
            .field("elapsed", &inner.elapsed)
            .field("frame", &inner.frame)
            .field("lag", &inner.lag)
            .finish()
    }
}

impl Ticker {
    /// Create a ticker with default lag smoothing
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(TickerInner {
                lag: Some(LagSmoothing::default()),
                ..Default::default()
            }),
        }
    }

    /// Enable, retune or (with `None`) disable lag smoothing
    pub fn set_lag_smoothing(&self, lag: Option<LagSmoothing>) {
        self.inner.borrow_mut().lag = lag;
    }

    pub fn lag_smoothing(&self) -> Option<LagSmoothing> {
        self.inner.borrow().lag
    }

    /// Lag-adjusted seconds since the first tick
    pub fn time(&self) -> f64 {
        self.inner.borrow().elapsed
    }

    /// Number of ticks so far
    pub fn frame(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Number of tasks still scheduled
    pub fn task_count(&self) -> usize {
        self.inner
            .borrow()
            .tasks
            .iter()
            .filter(|t| t.live.get())
            .count()
    }

    fn schedule(&self, kind: TaskKind) -> FrameHandle {
        let live = Rc::new(Cell::new(true));
        self.inner.borrow_mut().tasks.push(Task {
            live: live.clone(),
            kind,
        });
        FrameHandle { live }
    }

    /// Run `callback` every frame until the handle is cancelled
    pub fn add(&self, callback: impl FnMut(&FrameTime) + 'static) -> FrameHandle {
        self.schedule(TaskKind::Repeat(Box::new(callback)))
    }

    /// Run `callback` once on the next frame
    pub fn next_frame(&self, callback: impl FnOnce(&FrameTime) + 'static) -> FrameHandle {
        self.schedule(TaskKind::Once(Some(Box::new(callback))))
    }

    /// Run `callback` on the first frame at least `seconds` from now
    pub fn after(&self, seconds: f64, callback: impl FnOnce() + 'static) -> FrameHandle {
        let due = self.time() + seconds;
        self.schedule(TaskKind::Timer {
            due,
            callback: Some(Box::new(callback)),
        })
    }

    /// Re-evaluate `predicate` once per frame and call `then` when it holds
    ///
    /// With `max_frames` set, `then` receives [`Settle::TimedOut`] after that
    /// many failed polls; with `None` the wait is unbounded.
    pub fn wait_until(
        &self,
        predicate: impl FnMut() -> bool + 'static,
        max_frames: Option<u32>,
        then: impl FnOnce(Settle) + 'static,
    ) -> FrameHandle {
        self.schedule(TaskKind::Until {
            predicate: Box::new(predicate),
            then: Some(Box::new(then)),
            max_frames,
            polled: 0,
        })
    }

    /// Advance the clock to host time `now` (seconds) and run due tasks
    ///
    /// Tasks scheduled from inside a callback first run on the following tick.
    pub fn tick(&self, now: f64) {
        let (mut tasks, frame_time) = {
            let mut inner = self.inner.borrow_mut();
            let raw = inner.last_now.map_or(0.0, |last| (now - last).max(0.0));
            let delta = match inner.lag {
                Some(lag) if raw > lag.threshold => lag.adjusted,
                _ => raw,
            };
            inner.last_now = Some(now);
            inner.elapsed += delta;
            inner.frame += 1;
            let frame_time = FrameTime {
                time: inner.elapsed,
                delta,
                frame: inner.frame,
            };
            (std::mem::take(&mut inner.tasks), frame_time)
        };

        tasks.retain_mut(|task| task.run(&frame_time));

        let mut inner = self.inner.borrow_mut();
        let added = std::mem::replace(&mut inner.tasks, tasks);
        inner.tasks.extend(added);
        inner.tasks.retain(|t| t.live.get());
    }
}
