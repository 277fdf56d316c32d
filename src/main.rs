//! Folio Motion entry point
//!
//! On the web this mounts every `data-motion` element on the page. Natively it
//! runs a headless text drop until the glyphs come to rest and logs the poses.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
    log::info!("Folio Motion starting...");

    let settings = folio_motion::Settings::load();
    if let Err(e) = folio_motion::web::mount_page(settings) {
        log::error!("Mount failed: {e}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec2;
    use log::{debug, info, warn};

    use folio_motion::Settings;
    use folio_motion::clock::Ticker;
    use folio_motion::consts::PHYSICS_DT;
    use folio_motion::text_drop::{DropVariant, FontSpec, Surface, TextDrop};

    /// Average advance of a heavy face, as a fraction of the font size
    const ADVANCE: f32 = 0.6;
    const MAX_FRAMES: u32 = 600;
    /// Speed (px/s) below which every glyph counts as resting
    const REST_SPEED: f32 = 5.0;

    /// Fixed-size surface with monospace metrics that draws nothing
    pub struct HeadlessSurface {
        size: Cell<Vec2>,
        glyphs_drawn: Cell<u64>,
    }

    impl HeadlessSurface {
        pub fn new(width: f32, height: f32) -> Rc<Self> {
            Rc::new(Self {
                size: Cell::new(Vec2::new(width, height)),
                glyphs_drawn: Cell::new(0),
            })
        }
    }

    impl Surface for HeadlessSurface {
        fn size(&self) -> Vec2 {
            self.size.get()
        }

        fn sync_size(&self) -> Vec2 {
            self.size.get()
        }

        fn container_width(&self) -> f32 {
            self.size.get().x
        }

        fn has_context(&self) -> bool {
            true
        }

        fn measure_text(&self, font: &FontSpec, text: &str) -> f32 {
            text.chars().count() as f32 * font.size * ADVANCE
        }

        fn clear(&self) {}

        fn begin_text(&self, _font: &FontSpec, _fallback_fill: &str) {}

        fn draw_glyph(&self, _text: &str, _position: Vec2, _angle: f32) {
            self.glyphs_drawn.set(self.glyphs_drawn.get() + 1);
        }
    }

    /// `folio-motion [TEXT] [--letters] [--mobile]`
    pub fn run() {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let letters = args.iter().any(|a| a == "--letters");
        let mobile = args.iter().any(|a| a == "--mobile");
        let text = args
            .iter()
            .find(|a| !a.starts_with("--"))
            .cloned()
            .unwrap_or_else(|| if letters { "CONTACT".into() } else { "404".into() });

        let (width, height) = if mobile { (375.0, 667.0) } else { (1024.0, 600.0) };
        let variant = if letters {
            DropVariant::letters(text)
        } else {
            DropVariant::block(text)
        };

        let settings = Settings::load();
        let ticker = Rc::new(Ticker::new());
        let surface = HeadlessSurface::new(width, height);
        let effect = TextDrop::new(
            ticker.clone(),
            surface.clone(),
            variant,
            &settings.physics,
            0x5eed,
        );
        effect.mount();

        let dt = f64::from(PHYSICS_DT);
        let mut frame = 0;
        while frame < MAX_FRAMES {
            ticker.tick(f64::from(frame) * dt);
            frame += 1;
            if effect.is_running() && frame > 30 && effect.is_settled(REST_SPEED) {
                break;
            }
        }

        if !effect.is_running() {
            warn!("Text drop never started");
            return;
        }
        info!(
            "{} glyphs at {}px, {} after {frame} frames ({} draws)",
            effect.body_count(),
            effect.font_size().unwrap_or_default(),
            if effect.is_settled(REST_SPEED) {
                "settled"
            } else {
                "still moving"
            },
            surface.glyphs_drawn.get()
        );
        for (text, position, angle) in effect.glyphs() {
            info!("  {text:>8} at ({:7.1}, {:7.1}) angle {angle:+.3}", position.x, position.y);
        }
        effect.unmount();
        debug!("Ticker left with {} tasks", ticker.task_count());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Folio Motion (native) starting...");
    log::info!("Native mode runs a headless text drop - build for wasm32 to mount a page");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
