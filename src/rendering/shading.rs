/// Fixed-function lighting: one directional light plus an ambient
/// floor. Kept separate from the pipeline so the light model can be
/// tuned without touching projection code.
use glam::Vec3;

#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    /// World-space direction the light shines from.
    pub direction: Vec3,
    /// Constant term every surface receives.
    pub ambient: f32,
    /// Strength of the Lambert term.
    pub diffuse: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, 0.5, -1.0).normalize(),
            ambient: 0.5,
            diffuse: 0.5,
        }
    }
}

impl LightConfig {
    /// Diffuse intensity for a unit surface normal, in
    /// [ambient, ambient + diffuse] and clamped to 1.0.
    #[inline]
    pub fn intensity(&self, normal: Vec3) -> f32 {
        let lambert = normal.dot(self.direction).max(0.0);
        (self.ambient + lambert * self.diffuse).min(1.0)
    }
}
