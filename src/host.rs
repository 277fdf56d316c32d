//! Host element boundary
//!
//! Effects never touch the DOM directly; they read layout and write transforms
//! through [`Element`]. The web layer implements it for `HtmlElement`, tests
//! implement it with plain cells.

use std::fmt;

use glam::Vec2;

/// Viewport-relative bounding box, as returned by `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// 2D transform written to an element's `transform` style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2d {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2d {
    pub const IDENTITY: Transform2d = Transform2d {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            translate: Vec2::new(x, y),
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// CSS `transform` value; the scale term is omitted when it is 1
    pub fn to_css(&self) -> String {
        let translate = format!(
            "translate({}px, {}px)",
            round_px(self.translate.x),
            round_px(self.translate.y)
        );
        if (self.scale - 1.0).abs() < f32::EPSILON {
            translate
        } else {
            format!("{} scale({})", translate, self.scale)
        }
    }
}

/// Round to hundredths of a pixel so style strings stay short
fn round_px(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// A DOM-like element effects can measure and move
pub trait Element {
    /// Current bounding box relative to the viewport
    fn rect(&self) -> Rect;

    /// Replace the element's transform
    fn set_transform(&self, transform: &Transform2d);

    /// Reserve `spacing` pixels of scroll space after the element (0 releases it)
    fn set_pin_spacing(&self, _spacing: f32) {}
}

impl fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({:?})", self.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_output() {
        assert_eq!(
            Transform2d::translate(12.0, -4.5).to_css(),
            "translate(12px, -4.5px)"
        );
        assert_eq!(
            Transform2d::translate(1.0 / 3.0, 0.0)
                .with_scale(0.8)
                .to_css(),
            "translate(0.33px, 0px) scale(0.8)"
        );
        assert_eq!(Transform2d::IDENTITY.to_css(), "translate(0px, 0px)");
    }

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(10.0, 20.0, 100.0, 40.0);
        assert_eq!(rect.center(), Vec2::new(60.0, 40.0));
        assert_eq!(rect.bottom(), 60.0);
    }
}
