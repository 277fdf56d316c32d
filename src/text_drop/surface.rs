//! 2D drawing boundary for text drops

use glam::Vec2;

/// Heavy display face used by every drop
pub const DROP_FAMILY: &str = "\"Arial Black\", \"Impact\", sans-serif";
pub const DROP_WEIGHT: u16 = 900;

/// Canvas font description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub weight: u16,
    /// Pixels
    pub size: f32,
    pub family: &'static str,
}

impl FontSpec {
    /// The drop face at `size` pixels
    pub fn heavy(size: f32) -> Self {
        Self {
            weight: DROP_WEIGHT,
            size,
            family: DROP_FAMILY,
        }
    }

    /// CSS `font` shorthand, e.g. `900 100px "Arial Black", "Impact", sans-serif`
    pub fn css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size, self.family)
    }
}

/// A canvas sized to its container
///
/// Glyphs are drawn centred (middle baseline, centre alignment) at a body's
/// position and rotated by its angle.
pub trait Surface {
    /// Current drawing buffer size in pixels
    fn size(&self) -> Vec2;

    /// Match the drawing buffer to the container and return the new size
    fn sync_size(&self) -> Vec2;

    /// Container width as laid out right now
    fn container_width(&self) -> f32;

    /// Whether a 2D context is available
    fn has_context(&self) -> bool;

    /// Advance width of `text` in `font`
    fn measure_text(&self, font: &FontSpec, text: &str) -> f32;

    fn clear(&self);

    /// Set font, alignment and fill before a batch of glyphs
    ///
    /// The fill is the canvas's computed text colour, or `fallback_fill`
    /// when that is empty.
    fn begin_text(&self, font: &FontSpec, fallback_fill: &str);

    fn draw_glyph(&self, text: &str, position: Vec2, angle: f32);
}
