/// Matrix constructors for the transform stages of the pipeline.
/// Vectors, matrices and quaternions themselves are glam types; this
/// module only builds the specific matrices the renderer composes into
/// MVP and the final screen mapping.
use glam::{vec4, Mat4, Vec3};

/// Build the object-to-world matrix: Translate * Rz * Ry * Rx * Scale.
/// Rotation angles are radians and are applied X first, then Y, then Z.
pub fn world_matrix(scale: Vec3, rotation: Vec3, translation: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_scale(scale)
}

/// Build the world-to-view matrix from the camera basis.
/// The right vector is derived as direction x up and the translation is
/// -basis . eye, so a point straight ahead of the camera lands on the
/// positive view-space z axis at its view distance.
pub fn view_matrix(eye: Vec3, direction: Vec3, up: Vec3) -> Mat4 {
    let dir = direction.normalize();
    let right = dir.cross(up).normalize();

    Mat4::from_cols(
        vec4(right.x, up.x, dir.x, 0.0),
        vec4(right.y, up.y, dir.y, 0.0),
        vec4(right.z, up.z, dir.z, 0.0),
        vec4(-right.dot(eye), -up.dot(eye), -dir.dot(eye), 1.0),
    )
}

/// Build the view-to-clip matrix from the vertical field of view and the
/// aspect ratio (width / height).
///
/// Visible points come out with negative w (the negated view distance)
/// and clip-space z equal to that same value, so the frustum's near and
/// far planes bound z directly and the rasterizer's depth, the negated
/// reciprocal of w, grows towards the camera. x and y are negated along
/// with w so the perspective divide leaves them upright.
pub fn perspective_matrix(fov_y: f32, aspect: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();

    Mat4::from_cols(
        vec4(-f / aspect, 0.0, 0.0, 0.0),
        vec4(0.0, -f, 0.0, 0.0),
        vec4(0.0, 0.0, -1.0, -1.0),
        vec4(0.0, 0.0, 0.0, 0.0),
    )
}

/// Build the NDC-to-screen matrix: x' = x*hw + hw, y' = -y*hh + hh.
/// The y axis is inverted because screen space puts the origin in the
/// top-left corner.
pub fn screen_matrix(width: f32, height: f32) -> Mat4 {
    let hw = width / 2.0;
    let hh = height / 2.0;

    Mat4::from_cols(
        vec4(hw, 0.0, 0.0, 0.0),
        vec4(0.0, -hh, 0.0, 0.0),
        vec4(0.0, 0.0, 1.0, 0.0),
        vec4(hw, hh, 0.0, 1.0),
    )
}
