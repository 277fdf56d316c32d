//! Scene construction for the two drop variants
//!
//! Per-step quantities are given at 60 Hz and converted to per-second here.
//! Gravity follows the Matter convention of `g × 1000` px/s².

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::surface::{FontSpec, Surface};
use crate::consts::{MOBILE_BREAKPOINT, WALL_THICKNESS};
use crate::physics::{Material, World};

const STEP_RATE: f32 = 60.0;
const GRAVITY_SCALE: f32 = 1000.0;

/// Glyph box height as a fraction of font size
const CAP_HEIGHT: f32 = 0.8;

// === Block (single line) ===
const BLOCK_GRAVITY: f32 = 2.5;
const BLOCK_MEASURE_SIZE: f32 = 100.0;
const BLOCK_FIT_MOBILE: f32 = 0.9;
const BLOCK_FIT_DESKTOP: f32 = 0.6;
const BLOCK_BODY_WIDTH: f32 = 0.92;
const BLOCK_MIN_START_Y: f32 = 50.0;
const BLOCK_TILT: f32 = 0.15;
const BLOCK_SPIN: f32 = 0.02;
const BLOCK_INERTIA_BOOST: f32 = 3.0;
const BLOCK_FILL: &str = "#faf3f0";
const BLOCK_MATERIAL: Material = Material {
    restitution: 0.02,
    friction: 0.9,
    friction_static: 0.95,
    friction_air: 0.002,
    density: 0.3,
};

// === Letters (one body per character) ===
const LETTER_GRAVITY: f32 = 4.5;
const LETTER_SIZE_MOBILE: f32 = 0.38;
const LETTER_SIZE_DESKTOP: f32 = 0.21;
const LETTER_BODY_WIDTH: f32 = 0.88;
const LETTER_GROUND_BUFFER: f32 = 20.0;
const LETTER_STAGGER: f32 = 70.0;
const LETTER_ROW_GAP: f32 = 2.5;
const LETTER_DRIFT: f32 = 4.0;
const LETTER_SPIN: f32 = 0.15;
const LETTER_FILL: &str = "#f5f0e8";
const LETTER_MATERIAL: Material = Material {
    restitution: 0.25,
    friction: 0.9,
    friction_static: 0.9,
    friction_air: 0.015,
    density: 0.005,
};

/// What to drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropVariant {
    /// One rigid body for the whole string (the "404" page)
    Block { text: String },
    /// One body per upper-cased character, split in two rows on mobile
    Letters {
        text: String,
        /// Force the row layout; `None` decides by canvas width
        mobile: Option<bool>,
    },
}

impl DropVariant {
    pub fn block(text: impl Into<String>) -> Self {
        Self::Block { text: text.into() }
    }

    pub fn letters(text: impl Into<String>) -> Self {
        Self::Letters {
            text: text.into(),
            mobile: None,
        }
    }
}

/// Text drawn at one body's pose
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub body: u32,
    pub text: String,
}

/// A built world plus what to draw for it
#[derive(Debug, Clone)]
pub struct Scene {
    pub world: World,
    pub glyphs: Vec<Glyph>,
    pub font: FontSpec,
    pub fill: &'static str,
}

/// Build the scene for `variant` on a canvas of `size`
///
/// Returns `None` when nothing measurable can be laid out.
pub fn build<S: Surface + ?Sized>(
    variant: &DropVariant,
    surface: &S,
    size: Vec2,
    rng: &mut Pcg32,
) -> Option<Scene> {
    match variant {
        DropVariant::Block { text } => build_block(surface, size, text, rng),
        DropVariant::Letters { text, mobile } => build_letters(surface, size, text, *mobile, rng),
    }
}

/// Uniform in `(-span / 2, span / 2)`
fn jitter(rng: &mut Pcg32, span: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * span
}

/// Ground, side walls and optionally a ceiling
fn add_bounds(world: &mut World, size: Vec2, ground_y: f32, ceiling: bool) {
    let t = WALL_THICKNESS;
    let Vec2 { x: w, y: h } = size;
    world.add_static(Vec2::new(w / 2.0, ground_y + t / 2.0), Vec2::new(w * 2.0, t));
    world.add_static(Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t, h * 4.0));
    world.add_static(Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t, h * 4.0));
    if ceiling {
        world.add_static(Vec2::new(w / 2.0, -t / 2.0), Vec2::new(w * 2.0, t));
    }
}

pub fn build_block<S: Surface + ?Sized>(
    surface: &S,
    size: Vec2,
    text: &str,
    rng: &mut Pcg32,
) -> Option<Scene> {
    let Vec2 { x: w, y: h } = size;
    let base = surface.measure_text(&FontSpec::heavy(BLOCK_MEASURE_SIZE), text);
    if base <= 0.0 || w <= 0.0 {
        return None;
    }
    let fit = if w < MOBILE_BREAKPOINT {
        BLOCK_FIT_MOBILE
    } else {
        BLOCK_FIT_DESKTOP
    };
    let font_size = (w * fit / base * BLOCK_MEASURE_SIZE).floor();
    if font_size <= 0.0 {
        return None;
    }
    let font = FontSpec::heavy(font_size);
    let text_width = surface.measure_text(&font, text);
    let text_height = font_size * CAP_HEIGHT;

    let mut world = World::new(Vec2::new(0.0, BLOCK_GRAVITY * GRAVITY_SCALE));
    add_bounds(&mut world, size, h / 2.0 + text_height / 2.0, true);

    // Start inside the canvas so frame zero does not hit the ceiling
    let start_y = (text_height / 2.0).max(BLOCK_MIN_START_Y);
    let id = world.add_rectangle(
        Vec2::new(w / 2.0, start_y),
        Vec2::new(text_width * BLOCK_BODY_WIDTH, text_height),
        BLOCK_MATERIAL,
    );
    if let Some(body) = world.body_mut(id) {
        body.angle = jitter(rng, BLOCK_TILT);
        body.angular_velocity = jitter(rng, BLOCK_SPIN) * STEP_RATE;
        let inertia = body.inertia() * BLOCK_INERTIA_BOOST;
        body.set_inertia(inertia);
    }

    Some(Scene {
        world,
        glyphs: vec![Glyph {
            body: id,
            text: text.to_string(),
        }],
        font,
        fill: BLOCK_FILL,
    })
}

pub fn build_letters<S: Surface + ?Sized>(
    surface: &S,
    size: Vec2,
    text: &str,
    mobile: Option<bool>,
    rng: &mut Pcg32,
) -> Option<Scene> {
    let Vec2 { x: w, y: h } = size;
    let chars: Vec<String> = text.to_uppercase().chars().map(String::from).collect();
    if chars.is_empty() || w <= 0.0 {
        return None;
    }
    let mobile = mobile.unwrap_or(w < MOBILE_BREAKPOINT);
    let font_size = if mobile {
        (w * LETTER_SIZE_MOBILE).round()
    } else {
        (w * LETTER_SIZE_DESKTOP).round()
    };
    let font = FontSpec::heavy(font_size);
    let glyph_height = font_size * CAP_HEIGHT;

    let mut world = World::new(Vec2::new(0.0, LETTER_GRAVITY * GRAVITY_SCALE));
    add_bounds(&mut world, size, h - LETTER_GROUND_BUFFER, false);

    let mut row = |chars: &[String], base_y: f32, world: &mut World| {
        let widths: Vec<f32> = chars
            .iter()
            .map(|c| surface.measure_text(&font, c))
            .collect();
        spawn_row(world, chars, &widths, w, base_y, glyph_height, rng)
    };

    let glyphs = if mobile {
        // Second row lands first; the first row follows once it has settled
        let split = chars.len() / 2;
        let (top, bottom) = chars.split_at(split);
        let mut glyphs = row(bottom, -(glyph_height / 2.0), &mut world);
        let top_y = -(glyph_height / 2.0
            + bottom.len() as f32 * LETTER_STAGGER
            + font_size * LETTER_ROW_GAP);
        glyphs.extend(row(top, top_y, &mut world));
        glyphs
    } else {
        row(&chars, -(glyph_height / 2.0), &mut world)
    };

    Some(Scene {
        world,
        glyphs,
        font,
        fill: LETTER_FILL,
    })
}

/// Centre a row horizontally and stagger each letter upward
fn spawn_row(
    world: &mut World,
    chars: &[String],
    widths: &[f32],
    canvas_width: f32,
    base_y: f32,
    glyph_height: f32,
    rng: &mut Pcg32,
) -> Vec<Glyph> {
    let total: f32 = widths.iter().sum();
    let mut cursor = (canvas_width - total) / 2.0;

    chars
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (c, &width))| {
            let x = cursor + width / 2.0;
            cursor += width;
            let y = base_y - i as f32 * LETTER_STAGGER;
            let id = world.add_rectangle(
                Vec2::new(x, y),
                Vec2::new((width * LETTER_BODY_WIDTH).max(1.0), glyph_height),
                LETTER_MATERIAL,
            );
            if let Some(body) = world.body_mut(id) {
                body.velocity = Vec2::new(jitter(rng, LETTER_DRIFT) * STEP_RATE, 0.0);
                body.angular_velocity = jitter(rng, LETTER_SPIN) * STEP_RATE;
            }
            Glyph {
                body: id,
                text: c.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSurface;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn pose(scene: &Scene, index: usize) -> (Vec2, Vec2) {
        let body = scene.world.body(scene.glyphs[index].body).unwrap();
        (body.position, body.size())
    }

    #[test]
    fn test_block_fits_width_and_rests_at_mid_height() {
        let surface = FakeSurface::new(1024.0, 768.0);
        let mut scene = build_block(&*surface, Vec2::new(1024.0, 768.0), "404", &mut rng()).unwrap();
        // 3 glyphs × 60px at 100px, 60% of 1024
        assert_eq!(scene.font.size, 341.0);
        // Ground + two walls + ceiling + block
        assert_eq!(scene.world.len(), 5);
        assert_eq!(scene.fill, "#faf3f0");

        let (start, size) = pose(&scene, 0);
        assert!((size.x - 3.0 * 0.6 * 341.0 * 0.92).abs() < 0.01);
        assert!((start.y - 341.0 * 0.8 / 2.0).abs() < 0.01);
        let body = scene.world.body(scene.glyphs[0].body).unwrap();
        assert!(body.angle.abs() <= 0.075);

        let ground = 384.0 + 341.0 * 0.4;
        for _ in 0..600 {
            scene.world.step(1.0 / 60.0);
            let (position, _) = pose(&scene, 0);
            assert!(position.y < ground);
        }
        let (rest, _) = pose(&scene, 0);
        // Resting on the mid-screen ground: centre at H / 2
        assert!((rest.y - 384.0).abs() < 4.0, "rested at {}", rest.y);
    }

    #[test]
    fn test_block_uses_wider_fit_on_mobile() {
        let surface = FakeSurface::new(375.0, 700.0);
        let scene = build_block(&*surface, Vec2::new(375.0, 700.0), "404", &mut rng()).unwrap();
        // floor(337.5 / 180 × 100)
        assert_eq!(scene.font.size, 187.0);
    }

    #[test]
    fn test_block_without_measurable_text() {
        let surface = FakeSurface::new(1024.0, 768.0);
        assert!(build_block(&*surface, Vec2::new(1024.0, 768.0), "", &mut rng()).is_none());
    }

    #[test]
    fn test_letters_desktop_single_staggered_row() {
        let surface = FakeSurface::new(1024.0, 600.0);
        let scene = build_letters(&*surface, Vec2::new(1024.0, 600.0), "Contacto", None, &mut rng()).unwrap();
        assert_eq!(scene.font.size, 215.0);
        // No ceiling
        assert_eq!(scene.world.len(), 3 + 8);
        let text: String = scene.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "CONTACTO");

        let h = 215.0 * 0.8;
        for i in 0..8 {
            let (position, size) = pose(&scene, i);
            assert!((position.y + h / 2.0 + i as f32 * 70.0).abs() < 1e-3);
            assert!((size.x - 0.6 * 215.0 * 0.88).abs() < 1e-3);
        }
        // Centred row
        let (first, _) = pose(&scene, 0);
        let (last, _) = pose(&scene, 7);
        assert!(((first.x + last.x) / 2.0 - 512.0).abs() < 1e-2);

        for glyph in &scene.glyphs {
            let body = scene.world.body(glyph.body).unwrap();
            assert!(body.velocity.x.abs() <= 120.0);
            assert_eq!(body.velocity.y, 0.0);
            assert!(body.angular_velocity.abs() <= 4.5);
        }
    }

    #[test]
    fn test_letters_mobile_second_row_spawns_first() {
        let surface = FakeSurface::new(375.0, 700.0);
        let scene = build_letters(&*surface, Vec2::new(375.0, 700.0), "Contacto", None, &mut rng()).unwrap();
        let font_size = (375.0f32 * 0.38).round();
        assert_eq!(scene.font.size, font_size);

        let text: Vec<&str> = scene.glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, ["A", "C", "T", "O", "C", "O", "N", "T"]);

        let h = font_size * 0.8;
        let (bottom_first, _) = pose(&scene, 0);
        assert!((bottom_first.y + h / 2.0).abs() < 1e-3);
        let (top_first, _) = pose(&scene, 4);
        let top_y = -(h / 2.0 + 4.0 * 70.0 + font_size * 2.5);
        assert!((top_first.y - top_y).abs() < 1e-3);
        let (top_last, _) = pose(&scene, 7);
        assert!((top_last.y - (top_y - 3.0 * 70.0)).abs() < 1e-3);
    }

    #[test]
    fn test_letters_never_fall_through_ground() {
        let surface = FakeSurface::new(1024.0, 600.0);
        let mut scene = build_letters(&*surface, Vec2::new(1024.0, 600.0), "Contacto", None, &mut rng()).unwrap();
        for _ in 0..600 {
            scene.world.step(1.0 / 60.0);
            for glyph in &scene.glyphs {
                let body = scene.world.body(glyph.body).unwrap();
                assert!(body.position.y < 580.0, "{} at {}", glyph.text, body.position);
                assert!(body.position.x > 0.0 && body.position.x < 1024.0);
            }
        }
    }
}
