/// Camera state: a position plus an orthonormal direction/up pair.
/// The renderer snapshots the camera by value at the start of a frame,
/// so animation code may mutate it freely between frames.
use crate::math;
use glam::{Mat4, Quat, Vec3};

#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    /// Unit vector the camera looks along.
    pub direction: Vec3,
    /// Unit up vector, perpendicular to `direction`.
    pub up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, direction: Vec3, up: Vec3) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            up: up.normalize(),
        }
    }

    /// The camera's right vector, derived as direction x up.
    pub fn right(&self) -> Vec3 {
        self.direction.cross(self.up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        math::view_matrix(self.position, self.direction, self.up)
    }

    /// Point the camera at `target`, rebuilding the up vector so the
    /// basis stays orthonormal.
    pub fn look_at(&mut self, target: Vec3, up_hint: Vec3) {
        self.direction = (target - self.position).normalize();
        let right = self.direction.cross(up_hint.normalize());
        self.up = right.cross(self.direction).normalize();
    }

    /// Rotate the view orientation around `axis` by `angle` radians.
    pub fn rotate(&mut self, axis: Vec3, angle: f32) {
        let q = Quat::from_axis_angle(axis.normalize(), angle);
        self.direction = (q * self.direction).normalize();
        self.up = (q * self.up).normalize();
    }

    /// Swing the camera around the world origin: position and
    /// orientation rotate together, so whatever sat at the origin stays
    /// centered in view.
    pub fn orbit(&mut self, axis: Vec3, angle: f32) {
        let q = Quat::from_axis_angle(axis.normalize(), angle);
        self.position = q * self.position;
        self.direction = (q * self.direction).normalize();
        self.up = (q * self.up).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, -1.0), Vec3::Z, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_vector_is_direction_cross_up() {
        let camera = Camera::default();
        assert!((camera.right() - Vec3::Z.cross(Vec3::Y)).length() < 1e-6);
    }

    #[test]
    fn rotate_keeps_basis_orthonormal() {
        let mut camera = Camera::default();
        camera.rotate(Vec3::Y, 1.1);
        camera.rotate(Vec3::X, -0.4);

        assert!((camera.direction.length() - 1.0).abs() < 1e-5);
        assert!((camera.up.length() - 1.0).abs() < 1e-5);
        assert!(camera.direction.dot(camera.up).abs() < 1e-5);
    }

    #[test]
    fn look_at_points_the_direction_at_the_target() {
        let mut camera = Camera::new(Vec3::new(2.0, 1.0, -3.0), Vec3::Z, Vec3::Y);
        let target = Vec3::new(-1.0, 4.0, 2.0);
        camera.look_at(target, Vec3::Y);

        let expected = (target - camera.position).normalize();
        assert!((camera.direction - expected).length() < 1e-5);
        assert!(camera.direction.dot(camera.up).abs() < 1e-5);
        assert!((camera.up.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orbit_preserves_distance_to_origin() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, Vec3::Y);
        let before = camera.position.length();
        camera.orbit(Vec3::Y, 0.7);
        assert!((camera.position.length() - before).abs() < 1e-4);
        // Still looking at the origin.
        let to_origin = (-camera.position).normalize();
        assert!(camera.direction.dot(to_origin) > 0.999);
    }
}
