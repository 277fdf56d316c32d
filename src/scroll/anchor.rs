//! Trigger positions
//!
//! A position pairs an edge of the element with an edge of the viewport:
//! `"top bottom"` means "when the element's top meets the viewport's bottom".
//! Ends may also be relative to the start (`"+=2000"`).

use std::fmt;
use std::str::FromStr;

use crate::error::MotionError;

/// A point along an element or the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Percentage of the height
    Percent(f64),
    /// Fixed pixel offset from the top
    Pixels(f64),
}

impl Edge {
    /// Distance from the top for a box of `size` pixels
    pub fn offset(&self, size: f64) -> f64 {
        match *self {
            Edge::Top => 0.0,
            Edge::Center => size / 2.0,
            Edge::Bottom => size,
            Edge::Percent(p) => size * p / 100.0,
            Edge::Pixels(px) => px,
        }
    }
}

impl FromStr for Edge {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidAnchor(s.to_string());
        match s {
            "top" => Ok(Edge::Top),
            "center" => Ok(Edge::Center),
            "bottom" => Ok(Edge::Bottom),
            _ => {
                if let Some(p) = s.strip_suffix('%') {
                    p.parse().map(Edge::Percent).map_err(|_| invalid())
                } else {
                    s.strip_suffix("px")
                        .unwrap_or(s)
                        .parse()
                        .map(Edge::Pixels)
                        .map_err(|_| invalid())
                }
            }
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => write!(f, "top"),
            Edge::Center => write!(f, "center"),
            Edge::Bottom => write!(f, "bottom"),
            Edge::Percent(p) => write!(f, "{p}%"),
            Edge::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// `"<element edge> <viewport edge>"`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub element: Edge,
    pub viewport: Edge,
}

impl Anchor {
    pub const fn new(element: Edge, viewport: Edge) -> Self {
        Self { element, viewport }
    }

    /// Scroll offset at which the anchor is reached
    ///
    /// `element_top` is the element's top in document coordinates.
    pub fn resolve(&self, element_top: f64, element_height: f64, viewport_height: f64) -> f64 {
        element_top + self.element.offset(element_height) - self.viewport.offset(viewport_height)
    }
}

impl FromStr for Anchor {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(element), Some(viewport), None) => Ok(Anchor {
                element: element.parse()?,
                viewport: viewport.parse()?,
            }),
            _ => Err(MotionError::InvalidAnchor(s.to_string())),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element, self.viewport)
    }
}

/// Where a trigger's range ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerEnd {
    Anchor(Anchor),
    /// Pixels of scroll after the start
    Relative(f64),
}

impl TriggerEnd {
    pub fn resolve(
        &self,
        start: f64,
        element_top: f64,
        element_height: f64,
        viewport_height: f64,
    ) -> f64 {
        match self {
            TriggerEnd::Anchor(anchor) => {
                anchor.resolve(element_top, element_height, viewport_height)
            }
            TriggerEnd::Relative(distance) => start + distance,
        }
    }
}

impl FromStr for TriggerEnd {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.strip_prefix("+=") {
            Some(rest) => rest
                .trim()
                .strip_suffix("px")
                .unwrap_or(rest.trim())
                .parse()
                .map(TriggerEnd::Relative)
                .map_err(|_| MotionError::InvalidAnchor(s.to_string())),
            None => trimmed.parse().map(TriggerEnd::Anchor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_site_anchors() {
        assert_eq!(
            "top top".parse::<Anchor>().unwrap(),
            Anchor::new(Edge::Top, Edge::Top)
        );
        assert_eq!(
            "top 60%".parse::<Anchor>().unwrap(),
            Anchor::new(Edge::Top, Edge::Percent(60.0))
        );
        assert_eq!(
            "bottom top".parse::<Anchor>().unwrap(),
            Anchor::new(Edge::Bottom, Edge::Top)
        );
        assert_eq!(
            "+=2000".parse::<TriggerEnd>().unwrap(),
            TriggerEnd::Relative(2000.0)
        );
        assert_eq!(
            "+=1500px".parse::<TriggerEnd>().unwrap(),
            TriggerEnd::Relative(1500.0)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("top".parse::<Anchor>().is_err());
        assert!("top middle".parse::<Anchor>().is_err());
        assert!("top top top".parse::<Anchor>().is_err());
        assert!("+=lots".parse::<TriggerEnd>().is_err());
        assert!("50%% top".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_resolve() {
        // Element at 1000px, 400px tall, viewport 800px
        let start: Anchor = "top bottom".parse().unwrap();
        assert_eq!(start.resolve(1000.0, 400.0, 800.0), 200.0);
        let end: Anchor = "bottom top".parse().unwrap();
        assert_eq!(end.resolve(1000.0, 400.0, 800.0), 1400.0);
        let entry: Anchor = "top 60%".parse().unwrap();
        assert_eq!(entry.resolve(1000.0, 400.0, 800.0), 520.0);
        assert_eq!(
            TriggerEnd::Relative(2000.0).resolve(1000.0, 1000.0, 400.0, 800.0),
            3000.0
        );
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["top top", "top 60%", "center 120px"] {
            let anchor: Anchor = text.parse().unwrap();
            assert_eq!(anchor.to_string().parse::<Anchor>().unwrap(), anchor);
        }
    }
}
