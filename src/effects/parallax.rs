//! Scroll parallax
//!
//! The element's vertical offset is a pure function of scroll progress
//! through its trigger range: `+speed` at the start, `-speed` at the end.

use std::rc::Rc;

use log::{debug, info};

use crate::error::Result;
use crate::host::{Element, Transform2d};
use crate::scroll::{TriggerCallbacks, TriggerConfig, TriggerHandle, TriggerSet};
use crate::settings::Settings;
use crate::tween::Ease;

/// Vertical offset at `progress`, with linear ease
pub fn parallax_offset(speed: f32, progress: f64) -> f32 {
    let t = Ease::LINEAR.apply(progress as f32);
    speed + (-2.0 * speed) * t
}

/// Scrubbed parallax on one element
#[derive(Debug)]
pub struct ParallaxBinding {
    element: Rc<dyn Element>,
    trigger: TriggerHandle,
}

impl ParallaxBinding {
    /// Bind `element` to scroll
    ///
    /// Returns `Ok(None)` when reduced motion is on.
    pub fn attach(
        triggers: &TriggerSet,
        element: Rc<dyn Element>,
        settings: &Settings,
    ) -> Result<Option<Self>> {
        if !settings.effective_parallax() {
            info!("Parallax skipped (reduced motion)");
            return Ok(None);
        }
        let parallax = &settings.parallax;
        let config = TriggerConfig::parse(&parallax.start, &parallax.end)?;
        let speed = parallax.speed;

        let target = element.clone();
        let trigger = triggers.create(
            element.clone(),
            config,
            TriggerCallbacks::new().on_update(move |snap| {
                target.set_transform(&Transform2d::translate(
                    0.0,
                    parallax_offset(speed, snap.progress),
                ));
            }),
        );
        // Loaded mid-range: start from the current progress, not the range start
        triggers.update();
        debug!("Parallax bound (speed {speed})");
        Ok(Some(Self { element, trigger }))
    }

    pub fn is_active(&self) -> bool {
        self.trigger.is_alive()
    }

    /// Kill the trigger and clear the transform
    pub fn revert(&self) {
        self.trigger.kill();
        self.element.set_transform(&Transform2d::IDENTITY);
    }
}

impl Drop for ParallaxBinding {
    fn drop(&mut self) {
        if self.trigger.is_alive() {
            self.revert();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;
    use crate::scroll::Viewport;
    use crate::testing::{FakeElement, FakeScroll};

    #[test]
    fn test_offset_maps_progress_to_speed_range() {
        assert_eq!(parallax_offset(50.0, 0.0), 50.0);
        assert_eq!(parallax_offset(50.0, 0.5), 0.0);
        assert_eq!(parallax_offset(50.0, 1.0), -50.0);
        assert_eq!(parallax_offset(-30.0, 1.0), 30.0);
    }

    #[test]
    fn test_scrub_follows_scroll_both_ways() {
        let scroll = FakeScroll::new(10_000.0);
        let triggers = TriggerSet::new(scroll.clone(), Viewport::new(1280.0, 800.0));
        // Range 200..1400
        let element = FakeElement::in_document(Rect::new(0.0, 1000.0, 600.0, 400.0), &scroll);
        let binding = ParallaxBinding::attach(&triggers, element.clone(), &Settings::default())
            .unwrap()
            .unwrap();
        assert_eq!(element.transform().translate.y, 50.0);

        scroll.set(800.0, 5.0);
        assert_eq!(element.transform().translate.y, 0.0);
        scroll.set(1400.0, 5.0);
        assert_eq!(element.transform().translate.y, -50.0);
        scroll.set(500.0, -5.0);
        assert_eq!(element.transform().translate.y, 25.0);

        binding.revert();
        assert_eq!(element.transform(), Transform2d::IDENTITY);
        scroll.set(800.0, 5.0);
        assert_eq!(element.transform(), Transform2d::IDENTITY);
    }

    #[test]
    fn test_attach_mid_range_uses_current_progress() {
        let scroll = FakeScroll::new(10_000.0);
        let triggers = TriggerSet::new(scroll.clone(), Viewport::new(1280.0, 800.0));
        let element = FakeElement::in_document(Rect::new(0.0, 1000.0, 600.0, 400.0), &scroll);
        // Halfway through 200..1400 before anything is bound
        scroll.set(800.0, 0.0);
        let _binding = ParallaxBinding::attach(&triggers, element.clone(), &Settings::default())
            .unwrap()
            .unwrap();
        assert_eq!(element.transform().translate.y, 0.0);

        scroll.set(1100.0, 5.0);
        assert_eq!(element.transform().translate.y, -25.0);
    }

    #[test]
    fn test_resize_refresh_keeps_mapping() {
        let scroll = FakeScroll::new(10_000.0);
        let triggers = TriggerSet::new(scroll.clone(), Viewport::new(1280.0, 800.0));
        let element = FakeElement::in_document(Rect::new(0.0, 1000.0, 600.0, 400.0), &scroll);
        let _binding = ParallaxBinding::attach(&triggers, element.clone(), &Settings::default())
            .unwrap()
            .unwrap();
        scroll.set(1300.0, 5.0);
        let before = element.transform().translate.y;
        triggers.refresh();
        assert_eq!(element.transform().translate.y, before);
    }

    #[test]
    fn test_reduced_motion_skips_binding() {
        let scroll = FakeScroll::new(10_000.0);
        let triggers = TriggerSet::new(scroll.clone(), Viewport::new(1280.0, 800.0));
        let element = FakeElement::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        let binding = ParallaxBinding::attach(&triggers, element.clone(), &settings).unwrap();
        assert!(binding.is_none());
        assert!(triggers.is_empty());
        assert_eq!(element.writes(), 0);
    }
}
