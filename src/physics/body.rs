//! Rigid rectangular bodies
//!
//! Units are canvas pixels and seconds. Positions are body centres, angles
//! are radians, clockwise positive in the y-down canvas frame.

use glam::Vec2;

/// Matter-style rotational inertia multiplier for polygons
pub const INERTIA_SCALE: f32 = 4.0;

/// Surface and mass properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Bounciness, combined by max
    pub restitution: f32,
    /// Sliding friction, combined by min
    pub friction: f32,
    /// Friction while the contact is not sliding, combined by max
    pub friction_static: f32,
    /// Fraction of velocity lost per 60 Hz step
    pub friction_air: f32,
    /// Mass per square pixel
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.1,
            friction_static: 0.5,
            friction_air: 0.01,
            density: 0.001,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: u32,
    pub position: Vec2,
    pub angle: f32,
    /// Pixels per second
    pub velocity: Vec2,
    /// Radians per second
    pub angular_velocity: f32,
    pub half_extents: Vec2,
    pub material: Material,
    pub is_static: bool,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
}

impl Body {
    /// Dynamic rectangle centred on `position`, mass from density × area
    pub fn rectangle(id: u32, position: Vec2, size: Vec2, material: Material) -> Self {
        let mass = material.density * size.x * size.y;
        let inertia = INERTIA_SCALE * mass * (size.x * size.x + size.y * size.y) / 12.0;
        Self {
            id,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            half_extents: size * 0.5,
            material,
            is_static: false,
            mass,
            inv_mass: recip(mass),
            inertia,
            inv_inertia: recip(inertia),
        }
    }

    /// Immovable rectangle (ground, walls, ceiling)
    pub fn fixed(id: u32, position: Vec2, size: Vec2) -> Self {
        Self {
            is_static: true,
            mass: f32::INFINITY,
            inv_mass: 0.0,
            inertia: f32::INFINITY,
            inv_inertia: 0.0,
            ..Self::rectangle(id, position, size, Material::default())
        }
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Override rotational inertia (ignored for static bodies)
    pub fn set_inertia(&mut self, inertia: f32) {
        if self.is_static {
            return;
        }
        self.inertia = inertia;
        self.inv_inertia = recip(inertia);
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Unit vector of the body's local x axis
    pub fn rotation(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// World-space local x and y axes
    pub fn axes(&self) -> [Vec2; 2] {
        let x = self.rotation();
        [x, x.perp()]
    }

    /// Corners in winding order, starting at local (-hx, -hy)
    pub fn corners(&self) -> [Vec2; 4] {
        let [ax, ay] = self.axes();
        let hx = ax * self.half_extents.x;
        let hy = ay * self.half_extents.y;
        let p = self.position;
        [p - hx - hy, p + hx - hy, p + hx + hy, p - hx + hy]
    }

    /// Radius of the bounding circle
    pub fn radius(&self) -> f32 {
        self.half_extents.length()
    }

    /// Velocity of the material point at offset `r` from the centre
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.velocity + r.perp() * self.angular_velocity
    }

    /// Apply `impulse` at offset `r` from the centre
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += r.perp_dot(impulse) * self.inv_inertia;
    }

    /// Kinetic energy per unit mass, zero for static bodies
    pub fn motion(&self) -> f32 {
        if self.is_static {
            return 0.0;
        }
        self.velocity.length_squared() + (self.angular_velocity * self.radius()).powi(2)
    }
}

fn recip(value: f32) -> f32 {
    if value > 0.0 && value.is_finite() {
        1.0 / value
    } else {
        0.0
    }
}
