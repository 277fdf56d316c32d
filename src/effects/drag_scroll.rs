//! Click-and-drag horizontal scrolling

/// Pointer travel is amplified by this factor
pub const DRAG_MULTIPLIER: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    start_x: f32,
    scroll_left: f32,
}

/// Drag state for one horizontally scrollable container
#[derive(Debug, Default)]
pub struct DragScroll {
    grab: Option<Grab>,
}

impl DragScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Button pressed on the container
    pub fn pointer_down(&mut self, page_x: f32, offset_left: f32, scroll_left: f32) {
        self.grab = Some(Grab {
            start_x: page_x - offset_left,
            scroll_left,
        });
    }

    /// New `scrollLeft` for the container, or `None` when not dragging
    pub fn pointer_move(&self, page_x: f32, offset_left: f32) -> Option<f32> {
        let grab = self.grab?;
        let x = page_x - offset_left;
        let walk = (x - grab.start_x) * DRAG_MULTIPLIER;
        Some(grab.scroll_left - walk)
    }

    pub fn pointer_up(&mut self) {
        self.grab = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_amplified() {
        let mut drag = DragScroll::new();
        assert_eq!(drag.pointer_move(300.0, 20.0), None);

        drag.pointer_down(300.0, 20.0, 400.0);
        assert!(drag.is_dragging());
        // 100px left becomes 150px of scroll to the right
        assert_eq!(drag.pointer_move(200.0, 20.0), Some(550.0));
        assert_eq!(drag.pointer_move(340.0, 20.0), Some(340.0));

        drag.pointer_up();
        assert_eq!(drag.pointer_move(100.0, 20.0), None);
    }
}
