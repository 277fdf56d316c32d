//! Gravity-driven world with a sequential impulse solver

use glam::Vec2;
use log::trace;

use super::body::{Body, Material};
use super::collision::{CollisionResult, box_box_collision};

/// Velocity iterations per step
const ITERATIONS: usize = 10;
/// Closing speed below which contacts do not bounce (4 px per 60 Hz step)
const RESTING_SPEED: f32 = 240.0;
/// Sliding speed below which static friction applies
const STATIC_SPEED: f32 = 12.0;
/// Penetration allowed before position correction kicks in
const SLOP: f32 = 0.5;
/// Fraction of the remaining penetration removed per step
const CORRECTION: f32 = 0.4;

/// Contact point with cached solver terms
struct Constraint {
    ra: Vec2,
    rb: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    bounce: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// Colliding pair for one step
struct Manifold {
    a: usize,
    b: usize,
    normal: Vec2,
    penetration: f32,
    restitution: f32,
    friction: f32,
    friction_static: f32,
    points: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct World {
    gravity: Vec2,
    bodies: Vec<Body>,
    next_id: u32,
}

impl World {
    /// `gravity` in px/s²
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            next_id: 1,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Allocate a new body ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_rectangle(&mut self, position: Vec2, size: Vec2, material: Material) -> u32 {
        let id = self.next_entity_id();
        self.bodies.push(Body::rectangle(id, position, size, material));
        id
    }

    pub fn add_static(&mut self, position: Vec2, size: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.bodies.push(Body::fixed(id, position, size));
        id
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_mut(&mut self, id: u32) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id == id)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn dynamic_count(&self) -> usize {
        self.bodies.iter().filter(|b| !b.is_static).count()
    }

    /// Remove every body
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Largest per-mass kinetic energy among dynamic bodies
    pub fn max_motion(&self) -> f32 {
        self.bodies.iter().map(Body::motion).fold(0.0, f32::max)
    }

    /// Advance the world by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.apply_forces(dt);

        let mut manifolds = self.collect_manifolds();
        for manifold in &mut manifolds {
            self.prepare(manifold);
        }
        for _ in 0..ITERATIONS {
            for manifold in &mut manifolds {
                self.solve(manifold);
            }
        }

        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
        }

        for manifold in &manifolds {
            self.correct(manifold);
        }
        trace!("Physics step: {} contacts", manifolds.len());
    }

    /// Gravity and air friction
    fn apply_forces(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static) {
            body.velocity += gravity * dt;
            let keep = (1.0 - body.material.friction_air).max(0.0).powf(dt * 60.0);
            body.velocity *= keep;
            body.angular_velocity *= keep;
        }
    }

    fn collect_manifolds(&self) -> Vec<Manifold> {
        let mut manifolds = Vec::new();
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if a.is_static && b.is_static {
                    continue;
                }
                if a.position.distance(b.position) > a.radius() + b.radius() {
                    continue;
                }
                let CollisionResult {
                    hit,
                    normal,
                    penetration,
                    contacts,
                } = box_box_collision(a, b);
                if !hit {
                    continue;
                }
                manifolds.push(Manifold {
                    a: i,
                    b: j,
                    normal,
                    penetration,
                    restitution: a.material.restitution.max(b.material.restitution),
                    friction: a.material.friction.min(b.material.friction),
                    friction_static: a.material.friction_static.max(b.material.friction_static),
                    points: contacts
                        .iter()
                        .map(|c| Constraint {
                            ra: c.point - a.position,
                            rb: c.point - b.position,
                            normal_mass: 0.0,
                            tangent_mass: 0.0,
                            bounce: 0.0,
                            normal_impulse: 0.0,
                            tangent_impulse: 0.0,
                        })
                        .collect(),
                });
            }
        }
        manifolds
    }

    fn prepare(&self, manifold: &mut Manifold) {
        let a = &self.bodies[manifold.a];
        let b = &self.bodies[manifold.b];
        let normal = manifold.normal;
        let tangent = normal.perp();
        for point in &mut manifold.points {
            point.normal_mass = effective_mass(a, b, point.ra, point.rb, normal);
            point.tangent_mass = effective_mass(a, b, point.ra, point.rb, tangent);
            let closing = (b.velocity_at(point.rb) - a.velocity_at(point.ra)).dot(normal);
            point.bounce = if closing < -RESTING_SPEED {
                -manifold.restitution * closing
            } else {
                0.0
            };
        }
    }

    fn solve(&mut self, manifold: &mut Manifold) {
        let (a, b) = pair_mut(&mut self.bodies, manifold.a, manifold.b);
        let normal = manifold.normal;
        let tangent = normal.perp();

        for point in &mut manifold.points {
            let relative = b.velocity_at(point.rb) - a.velocity_at(point.ra);
            let vn = relative.dot(normal);
            let delta = point.normal_mass * (point.bounce - vn);
            let accumulated = (point.normal_impulse + delta).max(0.0);
            let delta = accumulated - point.normal_impulse;
            point.normal_impulse = accumulated;
            let impulse = normal * delta;
            a.apply_impulse(-impulse, point.ra);
            b.apply_impulse(impulse, point.rb);

            let relative = b.velocity_at(point.rb) - a.velocity_at(point.ra);
            let vt = relative.dot(tangent);
            let mu = if vt.abs() < STATIC_SPEED {
                manifold.friction_static
            } else {
                manifold.friction
            };
            let limit = mu * point.normal_impulse;
            let delta = -point.tangent_mass * vt;
            let accumulated = (point.tangent_impulse + delta).clamp(-limit, limit);
            let delta = accumulated - point.tangent_impulse;
            point.tangent_impulse = accumulated;
            let impulse = tangent * delta;
            a.apply_impulse(-impulse, point.ra);
            b.apply_impulse(impulse, point.rb);
        }
    }

    /// Push the pair apart along the normal
    fn correct(&mut self, manifold: &Manifold) {
        let (a, b) = pair_mut(&mut self.bodies, manifold.a, manifold.b);
        let total = a.inv_mass() + b.inv_mass();
        if total <= 0.0 {
            return;
        }
        let depth = (manifold.penetration - SLOP).max(0.0) * CORRECTION;
        let shift = manifold.normal * (depth / total);
        a.position -= shift * a.inv_mass();
        b.position += shift * b.inv_mass();
    }
}

fn effective_mass(a: &Body, b: &Body, ra: Vec2, rb: Vec2, axis: Vec2) -> f32 {
    let rna = ra.perp_dot(axis);
    let rnb = rb.perp_dot(axis);
    let k = a.inv_mass() + b.inv_mass() + a.inv_inertia() * rna * rna + b.inv_inertia() * rnb * rnb;
    if k > 0.0 { 1.0 / k } else { 0.0 }
}

/// Two distinct mutable bodies, `i < j`
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heavy() -> Material {
        Material {
            restitution: 0.02,
            friction: 0.9,
            friction_static: 0.95,
            friction_air: 0.002,
            density: 0.3,
        }
    }

    /// Ground top at y = 500
    fn world_with_ground(gravity: f32) -> World {
        let mut world = World::new(Vec2::new(0.0, gravity));
        world.add_static(Vec2::new(400.0, 600.0), Vec2::new(1600.0, 200.0));
        world
    }

    #[test]
    fn test_dropped_box_comes_to_rest_on_ground() {
        let mut world = world_with_ground(2500.0);
        let id = world.add_rectangle(Vec2::new(400.0, 100.0), Vec2::new(200.0, 80.0), heavy());

        for _ in 0..600 {
            world.step(1.0 / 60.0);
            let body = world.body(id).unwrap();
            // Bottom edge never sinks more than one step of travel into the ground
            assert!(body.position.y + 40.0 < 530.0, "tunnelled to {}", body.position.y);
        }
        let body = world.body(id).unwrap();
        assert!((body.position.y - 460.0).abs() < 2.0);
        assert!(body.velocity.length() < 5.0);
        assert!(body.angle.abs() < 0.01);
    }

    #[test]
    fn test_tilted_box_settles_flat() {
        let mut world = world_with_ground(2500.0);
        let id = world.add_rectangle(Vec2::new(400.0, 200.0), Vec2::new(200.0, 80.0), heavy());
        {
            let body = world.body_mut(id).unwrap();
            body.angle = 0.07;
            let inertia = body.inertia() * 3.0;
            body.set_inertia(inertia);
        }
        for _ in 0..900 {
            world.step(1.0 / 60.0);
        }
        let body = world.body(id).unwrap();
        assert!(body.angle.abs() < 0.02, "angle {}", body.angle);
        assert!((body.position.y - 460.0).abs() < 3.0);
    }

    #[test]
    fn test_clear_drops_every_body() {
        let mut world = world_with_ground(100.0);
        world.add_rectangle(Vec2::new(100.0, 100.0), Vec2::new(10.0, 10.0), heavy());
        assert_eq!(world.dynamic_count(), 1);
        assert_eq!(world.len(), 2);
        world.clear();
        assert!(world.is_empty());
        world.step(1.0 / 60.0);
        assert!(world.is_empty());
    }

    #[test]
    fn test_air_friction_slows_free_fall() {
        let mut drag = World::new(Vec2::new(0.0, 1000.0));
        let mut free = World::new(Vec2::new(0.0, 1000.0));
        let slow = Material {
            friction_air: 0.05,
            ..Default::default()
        };
        let fast = Material {
            friction_air: 0.0,
            ..Default::default()
        };
        let a = drag.add_rectangle(Vec2::ZERO, Vec2::splat(10.0), slow);
        let b = free.add_rectangle(Vec2::ZERO, Vec2::splat(10.0), fast);
        for _ in 0..60 {
            drag.step(1.0 / 60.0);
            free.step(1.0 / 60.0);
        }
        let free_speed = free.body(b).unwrap().velocity.y;
        assert!((free_speed - 1000.0).abs() < 0.5);
        assert!(drag.body(a).unwrap().velocity.y < free_speed * 0.7);
    }
}
