//! Motion settings
//!
//! Every field has a default, so a page can override just the values it cares
//! about. On the web the JSON lives in
//! `<script type="application/json" id="motion-config">`.

use serde::{Deserialize, Serialize};

use crate::consts::{MOBILE_BREAKPOINT, RESIZE_DEBOUNCE};
use crate::error::Result;
use crate::tween::{Ease, EaseMode};

/// Cursor label follower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    /// Fraction of the remaining distance covered per frame
    pub lerp: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            lerp: 0.12,
            offset_x: 16.0,
            offset_y: 12.0,
        }
    }
}

/// Magnetic hover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticSettings {
    /// Fraction of the pointer's distance from centre the element moves
    pub strength: f32,
    pub follow_duration: f64,
    pub follow_ease: Ease,
    pub return_duration: f64,
    pub return_ease: Ease,
}

impl Default for MagneticSettings {
    fn default() -> Self {
        Self {
            strength: 0.15,
            follow_duration: 0.4,
            follow_ease: Ease::POWER2_OUT,
            return_duration: 0.6,
            return_ease: Ease::elastic(EaseMode::Out, 1.0, 0.4),
        }
    }
}

/// Scroll parallax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxSettings {
    /// Pixels of travel either side of rest
    pub speed: f32,
    pub start: String,
    pub end: String,
}

impl Default for ParallaxSettings {
    fn default() -> Self {
        Self {
            speed: 50.0,
            start: "top bottom".to_string(),
            end: "bottom top".to_string(),
        }
    }
}

/// Pinned phase sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinnedSettings {
    pub start: String,
    pub end: String,
    /// Smoothing applied to each phase's progress
    pub tween_duration: f64,
    pub tween_ease: Ease,
    pub mobile_breakpoint: f32,
    /// Playback rate of the sequential mobile timeline
    pub mobile_time_scale: f64,
    /// Where a non-primary mobile section starts playing
    pub mobile_start: String,
    /// Scroll velocity (px/frame) below which momentum counts as settled
    pub settle_velocity: f64,
    /// Give up waiting for momentum after this many frames
    pub settle_timeout_frames: Option<u32>,
}

impl Default for PinnedSettings {
    fn default() -> Self {
        Self {
            start: "top top".to_string(),
            end: "+=2000".to_string(),
            tween_duration: 0.5,
            tween_ease: Ease::POWER3_OUT,
            mobile_breakpoint: MOBILE_BREAKPOINT,
            mobile_time_scale: 1.8,
            mobile_start: "top 60%".to_string(),
            settle_velocity: 0.5,
            settle_timeout_frames: None,
        }
    }
}

/// Smooth scroll engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Use the smooth scroll engine instead of native scrolling
    pub enabled: bool,
    pub lerp: f64,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
    /// Smooth touch scrolling like wheel input
    pub sync_touch: bool,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            lerp: 0.1,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
            sync_touch: true,
        }
    }
}

/// Physics text drops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Quiet period after the last resize before rebuilding (seconds)
    pub resize_debounce: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            resize_debounce: RESIZE_DEBOUNCE,
        }
    }
}

/// All motion settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cursor: CursorSettings,
    pub magnetic: MagneticSettings,
    pub parallax: ParallaxSettings,
    pub pinned: PinnedSettings,
    pub scroll: ScrollSettings,
    pub physics: PhysicsSettings,

    // === Accessibility ===
    /// Reduced motion (skip parallax and smooth scrolling)
    pub reduced_motion: bool,
}

impl Settings {
    /// Config element id
    pub const CONFIG_ID: &'static str = "motion-config";

    /// Parse settings JSON, filling gaps with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective parallax (respects reduced_motion)
    pub fn effective_parallax(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective smooth scrolling (respects reduced_motion)
    pub fn effective_smooth_scroll(&self) -> bool {
        self.scroll.enabled && !self.reduced_motion
    }

    /// Load settings from the page's config element (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ID))
            .and_then(|el| el.text_content());

        let mut settings = match json {
            Some(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from #{}", Self::CONFIG_ID);
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring #{}: {}", Self::CONFIG_ID, e);
                    Self::default()
                }
            },
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        };

        let prefers_reduced = web_sys::window()
            .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok())
            .flatten()
            .is_some_and(|mq| mq.matches());
        if prefers_reduced {
            log::info!("Reduced motion requested by the user agent");
            settings.reduced_motion = true;
        }
        settings
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings = Settings::from_json(r#"{"cursor": {"lerp": 0.2}, "reduced_motion": true}"#)
            .unwrap();
        assert_eq!(settings.cursor.lerp, 0.2);
        assert_eq!(settings.cursor.offset_x, 16.0);
        assert_eq!(settings.magnetic, MagneticSettings::default());
        assert_eq!(settings.pinned.end, "+=2000");
        assert!(settings.reduced_motion);
        assert!(!settings.effective_parallax());
        assert!(!settings.effective_smooth_scroll());
    }

    #[test]
    fn test_eases_parse_from_strings() {
        let settings =
            Settings::from_json(r#"{"magnetic": {"return_ease": "elastic.out(1.2, 0.5)"}}"#)
                .unwrap();
        assert_eq!(
            settings.magnetic.return_ease,
            Ease::elastic(EaseMode::Out, 1.2, 0.5)
        );
        assert!(Settings::from_json(r#"{"pinned": {"tween_ease": "wobble"}}"#).is_err());
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), Settings::default());
    }
}
