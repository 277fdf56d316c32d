//! Box-box collision via the separating axis test
//!
//! The reference face is the face of least penetration. The incident face of
//! the other box is clipped against the reference face's side planes, which
//! yields up to two contact points.

use glam::Vec2;

use super::body::Body;

/// Reference face switches to the second box only when clearly better
const RELATIVE_TOL: f32 = 0.95;
const ABSOLUTE_TOL: f32 = 0.01;

/// One contact point on the incident face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub point: Vec2,
    pub depth: f32,
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub hit: bool,
    /// Unit normal pointing from the first box toward the second
    pub normal: Vec2,
    /// Deepest penetration (for position correction)
    pub penetration: f32,
    pub contacts: Vec<ContactPoint>,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
            contacts: Vec::new(),
        }
    }
}

/// Corners plus outward face normals, face `i` runs from corner `i` to `i + 1`
struct BoxShape {
    corners: [Vec2; 4],
    normals: [Vec2; 4],
}

impl BoxShape {
    fn of(body: &Body) -> Self {
        let [ax, ay] = body.axes();
        Self {
            corners: body.corners(),
            normals: [-ay, ax, ay, -ax],
        }
    }

    fn face(&self, index: usize) -> (Vec2, Vec2) {
        (self.corners[index], self.corners[(index + 1) % 4])
    }
}

/// Face of `a` with the greatest separation from `b`
fn max_separation(a: &BoxShape, b: &BoxShape) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, normal) in a.normals.iter().enumerate() {
        let origin = a.corners[i];
        let separation = b
            .corners
            .iter()
            .map(|&corner| normal.dot(corner - origin))
            .fold(f32::INFINITY, f32::min);
        if separation > best.1 {
            best = (i, separation);
        }
    }
    best
}

/// Keep the part of `segment` where `dir · p <= offset`
fn clip(segment: [Vec2; 2], dir: Vec2, offset: f32) -> Option<[Vec2; 2]> {
    let d0 = dir.dot(segment[0]) - offset;
    let d1 = dir.dot(segment[1]) - offset;
    let mut out = Vec::with_capacity(2);
    if d0 <= 0.0 {
        out.push(segment[0]);
    }
    if d1 <= 0.0 {
        out.push(segment[1]);
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        out.push(segment[0] + (segment[1] - segment[0]) * t);
    }
    match out.as_slice() {
        [p, q, ..] => Some([*p, *q]),
        _ => None,
    }
}

/// Check collision between two oriented boxes
pub fn box_box_collision(a: &Body, b: &Body) -> CollisionResult {
    let shape_a = BoxShape::of(a);
    let shape_b = BoxShape::of(b);

    let (face_a, separation_a) = max_separation(&shape_a, &shape_b);
    if separation_a > 0.0 {
        return CollisionResult::miss();
    }
    let (face_b, separation_b) = max_separation(&shape_b, &shape_a);
    if separation_b > 0.0 {
        return CollisionResult::miss();
    }

    let flip = separation_b > RELATIVE_TOL * separation_a + ABSOLUTE_TOL;
    let (reference, incident, face) = if flip {
        (&shape_b, &shape_a, face_b)
    } else {
        (&shape_a, &shape_b, face_a)
    };

    let normal = reference.normals[face];
    let (v1, v2) = reference.face(face);

    // Incident face is the one most anti-parallel to the reference normal
    let incident_face = (0..4)
        .min_by(|&i, &j| {
            normal
                .dot(incident.normals[i])
                .total_cmp(&normal.dot(incident.normals[j]))
        })
        .unwrap_or(0);
    let (i1, i2) = incident.face(incident_face);

    let tangent = (v2 - v1).normalize_or_zero();
    let Some(segment) = clip([i1, i2], -tangent, -tangent.dot(v1)) else {
        return CollisionResult::miss();
    };
    let Some(segment) = clip(segment, tangent, tangent.dot(v2)) else {
        return CollisionResult::miss();
    };

    let contacts: Vec<ContactPoint> = segment
        .iter()
        .filter_map(|&point| {
            let separation = normal.dot(point - v1);
            (separation <= 0.0).then_some(ContactPoint {
                point,
                depth: -separation,
            })
        })
        .collect();
    if contacts.is_empty() {
        return CollisionResult::miss();
    }

    let penetration = contacts.iter().map(|c| c.depth).fold(0.0, f32::max);
    CollisionResult {
        hit: true,
        normal: if flip { -normal } else { normal },
        penetration,
        contacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::Material;
    use std::f32::consts::FRAC_PI_4;

    fn block(x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::rectangle(1, Vec2::new(x, y), Vec2::new(w, h), Material::default())
    }

    #[test]
    fn test_box_resting_on_ground() {
        let ground = Body::fixed(0, Vec2::new(0.0, 100.0), Vec2::new(400.0, 200.0));
        // Bottom edge at y = 2, ground top at y = 0
        let boxed = block(0.0, -8.0, 40.0, 20.0);

        let result = box_box_collision(&boxed, &ground);
        assert!(result.hit);
        assert!((result.normal - Vec2::new(0.0, 1.0)).length() < 1e-5);
        assert!((result.penetration - 2.0).abs() < 1e-4);
        assert_eq!(result.contacts.len(), 2);

        // Swapping the pair flips the normal
        let swapped = box_box_collision(&ground, &boxed);
        assert!((swapped.normal - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_separated_boxes_miss() {
        let a = block(0.0, 0.0, 10.0, 10.0);
        let b = block(10.5, 0.0, 10.0, 10.0);
        let result = box_box_collision(&a, &b);
        assert!(!result.hit);
        assert!(result.contacts.is_empty());
    }

    #[test]
    fn test_tilted_corner_contact() {
        let ground = Body::fixed(0, Vec2::new(0.0, 100.0), Vec2::new(400.0, 200.0));
        let mut diamond = block(0.0, 0.0, 20.0, 20.0);
        diamond.angle = FRAC_PI_4;
        // Lowest corner sits 1px into the ground
        diamond.position.y = -(10.0 * 2f32.sqrt()) + 1.0;

        let result = box_box_collision(&diamond, &ground);
        assert!(result.hit);
        assert_eq!(result.contacts.len(), 1);
        assert!((result.penetration - 1.0).abs() < 1e-3);
        assert!(result.contacts[0].point.x.abs() < 1e-3);
    }
}
