//! Pausable timelines
//!
//! A timeline is a list of eased steps (and nested timelines) placed on a
//! shared clock. It can be scrubbed by setting its progress, or played forward
//! by advancing it from a ticker task.

use std::fmt;

use super::ease::Ease;

/// Receives a step's eased progress whenever it changes
pub type Apply = Box<dyn FnMut(f32)>;

enum Child {
    Step { ease: Ease, apply: Apply },
    Nested(Timeline),
}

struct Entry {
    offset: f64,
    duration: f64,
    child: Child,
    last: Option<f32>,
}

impl Entry {
    fn local_progress(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return if time >= self.offset { 1.0 } else { 0.0 };
        }
        ((time - self.offset) / self.duration).clamp(0.0, 1.0) as f32
    }

    fn render(&mut self, time: f64) {
        let local = self.local_progress(time);
        match &mut self.child {
            Child::Step { ease, apply } => {
                if self.last != Some(local) {
                    self.last = Some(local);
                    apply(ease.apply(local));
                }
            }
            Child::Nested(timeline) => {
                timeline.seek(f64::from(local) * timeline.duration());
            }
        }
    }
}

/// Ordered, pausable collection of eased steps
pub struct Timeline {
    entries: Vec<Entry>,
    time: f64,
    duration: f64,
    paused: bool,
    time_scale: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("children", &self.entries.len())
            .field("time", &self.time)
            .field("duration", &self.duration)
            .field("paused", &self.paused)
            .field("time_scale", &self.time_scale)
            .finish()
    }
}

impl Timeline {
    /// Empty timeline, created paused
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            time: 0.0,
            duration: 0.0,
            paused: true,
            time_scale: 1.0,
        }
    }

    /// Concatenate timelines so each plays to completion before the next starts
    pub fn sequence(timelines: impl IntoIterator<Item = Timeline>) -> Self {
        let mut master = Self::new();
        for timeline in timelines {
            master.append(timeline);
        }
        master
    }

    fn push(&mut self, offset: f64, duration: f64, child: Child) {
        let duration = duration.max(0.0);
        self.duration = self.duration.max(offset + duration);
        self.entries.push(Entry {
            offset,
            duration,
            child,
            last: None,
        });
    }

    /// Append a step after everything already on the timeline
    pub fn then(mut self, duration: f64, ease: Ease, apply: impl FnMut(f32) + 'static) -> Self {
        let offset = self.duration;
        self.push(
            offset,
            duration,
            Child::Step {
                ease,
                apply: Box::new(apply),
            },
        );
        self
    }

    /// Place a step at an absolute offset (seconds), possibly overlapping others
    pub fn at(
        mut self,
        offset: f64,
        duration: f64,
        ease: Ease,
        apply: impl FnMut(f32) + 'static,
    ) -> Self {
        self.push(
            offset.max(0.0),
            duration,
            Child::Step {
                ease,
                apply: Box::new(apply),
            },
        );
        self
    }

    /// Nest `timeline` after everything already on this one
    pub fn append(&mut self, timeline: Timeline) {
        let offset = self.duration;
        let duration = timeline.duration();
        self.push(offset, duration, Child::Nested(timeline));
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Normalized playhead position in [0, 1]
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.time > 0.0 { 1.0 } else { 0.0 };
        }
        self.time / self.duration
    }

    /// Move the playhead to `progress` (clamped) and render
    pub fn set_progress(&mut self, progress: f64) {
        let progress = progress.clamp(0.0, 1.0);
        if self.duration <= 0.0 {
            // Zero-length timelines still render their end state at 1.0
            self.time = progress;
            let time = if progress >= 1.0 { 0.0 } else { -1.0 };
            self.render_at(time);
            return;
        }
        self.seek(progress * self.duration);
    }

    /// Move the playhead to `time` seconds and render
    pub fn seek(&mut self, time: f64) {
        self.time = time.clamp(0.0, self.duration);
        self.render_at(self.time);
    }

    fn render_at(&mut self, time: f64) {
        for entry in &mut self.entries {
            entry.render(time);
        }
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_complete(&self) -> bool {
        self.time >= self.duration
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Playback rate multiplier applied by [`Timeline::advance`]
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    /// Advance a playing timeline by `dt` real seconds
    ///
    /// Returns whether the timeline is still playing. Reaching the end pauses it.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.paused {
            return false;
        }
        self.seek(self.time + dt * self.time_scale);
        if self.is_complete() {
            self.paused = true;
        }
        !self.paused
    }

    /// `(offset, duration)` of each direct child, in insertion order
    pub fn spans(&self) -> Vec<(f64, f64)> {
        self.entries.iter().map(|e| (e.offset, e.duration)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(&'static str, f32)>>>;

    fn recorder(log: &Log, name: &'static str) -> impl FnMut(f32) + 'static {
        let log = log.clone();
        move |v| log.borrow_mut().push((name, v))
    }

    #[test]
    fn test_then_places_steps_sequentially() {
        let log: Log = Rc::default();
        let mut tl = Timeline::new()
            .then(1.0, Ease::None, recorder(&log, "a"))
            .then(0.5, Ease::None, recorder(&log, "b"));
        assert_eq!(tl.duration(), 1.5);
        assert_eq!(tl.spans(), vec![(0.0, 1.0), (1.0, 0.5)]);

        tl.set_progress(0.5);
        let last_a = log.borrow().iter().rev().find(|(n, _)| *n == "a").copied();
        let last_b = log.borrow().iter().rev().find(|(n, _)| *n == "b").copied();
        assert_eq!(last_a, Some(("a", 0.75)));
        assert_eq!(last_b, Some(("b", 0.0)));
    }

    #[test]
    fn test_set_progress_clamps() {
        let log: Log = Rc::default();
        let mut tl = Timeline::new().then(1.0, Ease::None, recorder(&log, "a"));
        tl.set_progress(-0.3);
        assert_eq!(tl.progress(), 0.0);
        tl.set_progress(1.7);
        assert_eq!(tl.progress(), 1.0);
        assert_eq!(log.borrow().last().copied(), Some(("a", 1.0)));
    }

    #[test]
    fn test_unchanged_progress_does_not_reapply() {
        let log: Log = Rc::default();
        let mut tl = Timeline::new().then(1.0, Ease::None, recorder(&log, "a"));
        tl.set_progress(0.5);
        tl.set_progress(0.5);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_advance_plays_with_time_scale_and_pauses_at_end() {
        let log: Log = Rc::default();
        let mut tl = Timeline::new().then(1.0, Ease::None, recorder(&log, "a"));
        assert!(!tl.advance(0.1), "new timelines start paused");

        tl.set_time_scale(2.0);
        tl.play();
        assert!(tl.advance(0.25));
        assert!((tl.time() - 0.5).abs() < 1e-9);
        assert!(!tl.advance(0.5));
        assert!(tl.is_complete());
        assert!(tl.is_paused());
    }

    #[test]
    fn test_sequence_nests_without_interleaving() {
        let log: Log = Rc::default();
        let first = Timeline::new().then(1.0, Ease::None, recorder(&log, "first"));
        let second = Timeline::new().then(2.0, Ease::None, recorder(&log, "second"));
        let mut master = Timeline::sequence([first, second]);
        assert_eq!(master.spans(), vec![(0.0, 1.0), (1.0, 2.0)]);

        master.play();
        while master.advance(0.1) {}
        // Every "second" value arrives after "first" reached 1.0
        let entries = log.borrow();
        let first_done = entries
            .iter()
            .position(|&(n, v)| n == "first" && v == 1.0)
            .unwrap();
        assert!(entries
            .iter()
            .enumerate()
            .filter(|(_, (n, v))| *n == "second" && *v > 0.0)
            .all(|(i, _)| i > first_done));
    }
}
