//! `Element` over a DOM node

use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::host::{Element, Rect, Transform2d};

/// A styled DOM element
#[derive(Debug, Clone)]
pub struct DomElement {
    element: HtmlElement,
}

impl DomElement {
    pub fn new(element: HtmlElement) -> Rc<Self> {
        Rc::new(Self { element })
    }

    /// `None` for non-HTML nodes (SVG and friends)
    pub fn from_element(element: web_sys::Element) -> Option<Rc<Self>> {
        element.dyn_into::<HtmlElement>().ok().map(Self::new)
    }

    pub fn html(&self) -> &HtmlElement {
        &self.element
    }

    /// Write an inline style property, ignoring failures on detached nodes
    pub fn set_style(&self, property: &str, value: &str) {
        let _ = self.element.style().set_property(property, value);
    }
}

impl Element for DomElement {
    fn rect(&self) -> Rect {
        let r = self.element.get_bounding_client_rect();
        Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
    }

    fn set_transform(&self, transform: &Transform2d) {
        if *transform == Transform2d::IDENTITY {
            let _ = self.element.style().remove_property("transform");
        } else {
            self.set_style("transform", &transform.to_css());
        }
    }

    /// Pinning reserves its scroll distance as bottom margin
    fn set_pin_spacing(&self, spacing: f32) {
        if spacing > 0.0 {
            self.set_style("margin-bottom", &format!("{spacing}px"));
        } else {
            let _ = self.element.style().remove_property("margin-bottom");
        }
    }
}
