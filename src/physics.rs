use bevy::prelude::*;

/// Velocity/acceleration integrator driving an enemy's displacement.
///
/// Units are world units per second; `gravity` passed to
/// [`Physic::get_movement`] is a downward acceleration (y grows downward).
#[derive(Clone, Copy, Debug)]
pub struct Physic {
    velocity: Vec2,
    acceleration: Vec2,
    gravity_enabled: bool,
    gravity_modifier: f32,
}

impl Default for Physic {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            gravity_enabled: true,
            gravity_modifier: 1.0,
        }
    }
}

impl Physic {
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, x: f32, y: f32) {
        self.velocity = Vec2::new(x, y);
    }

    pub fn set_velocity_x(&mut self, x: f32) {
        self.velocity.x = x;
    }

    pub fn set_velocity_y(&mut self, y: f32) {
        self.velocity.y = y;
    }

    pub fn set_acceleration_y(&mut self, y: f32) {
        self.acceleration.y = y;
    }

    pub fn enable_gravity(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    pub fn set_gravity_modifier(&mut self, modifier: f32) {
        self.gravity_modifier = modifier;
    }

    /// Integrates one step and returns the displacement for it.
    pub fn get_movement(&mut self, dt: f32, gravity: f32) -> Vec2 {
        let grav = if self.gravity_enabled {
            gravity * self.gravity_modifier
        } else {
            0.0
        };
        let accel = Vec2::new(self.acceleration.x, self.acceleration.y + grav);
        let movement = self.velocity * dt + accel * dt * dt;
        self.velocity += accel * dt;
        movement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_without_gravity_is_linear() {
        let mut physic = Physic::default();
        physic.enable_gravity(false);
        physic.set_velocity(80.0, -20.0);
        let step = physic.get_movement(0.5, 1000.0);
        assert_eq!(step, Vec2::new(40.0, -10.0));
        assert_eq!(physic.velocity(), Vec2::new(80.0, -20.0));
    }

    #[test]
    fn gravity_accelerates_downward() {
        let mut physic = Physic::default();
        let first = physic.get_movement(0.5, 1000.0);
        assert_eq!(first, Vec2::new(0.0, 250.0));
        assert_eq!(physic.velocity().y, 500.0);
        let second = physic.get_movement(0.5, 1000.0);
        assert!(second.y > first.y);
    }

    #[test]
    fn acceleration_combines_with_gravity() {
        let mut physic = Physic::default();
        physic.set_acceleration_y(-1000.0);
        let step = physic.get_movement(1.0, 1000.0);
        assert_eq!(step, Vec2::ZERO);
        physic.set_gravity_modifier(2.0);
        physic.get_movement(1.0, 1000.0);
        assert_eq!(physic.velocity().y, 1000.0);
    }
}
