/// View-frustum construction, Sutherland-Hodgman triangle clipping and
/// bounding-box classification, all in clip space before the
/// perspective divide.
///
/// Visible geometry has negative w (see `math::perspective_matrix`),
/// and the x/y plane normals carry a w component, which makes the
/// plane tests equivalent to |x| <= |w|, |y| <= |w|. The near and far
/// planes bound clip-space z, which equals w, to [-z_far, -z_near].
use glam::{Vec2, Vec4};

/// Worst case vertex count for a triangle clipped by all six planes.
pub const MAX_CLIP_POINTS: usize = 9;

/// A clipped polygon fans into at most MAX_CLIP_POINTS - 2 triangles.
pub const MAX_CLIP_TRIANGLES: usize = MAX_CLIP_POINTS - 2;

pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_TOP: usize = 2;
pub const PLANE_BOTTOM: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

#[derive(Copy, Clone, Debug)]
pub struct Plane {
    pub point: Vec4,
    pub normal: Vec4,
}

impl Plane {
    /// Signed distance-like value: positive means outside.
    #[inline]
    pub fn distance_to_vertex(&self, v: Vec4) -> f32 {
        self.normal.dot(v) - self.normal.dot(self.point)
    }

    #[inline]
    pub fn is_vertex_inside(&self, v: Vec4) -> bool {
        (v - self.point).dot(self.normal) <= 0.0
    }

    /// Intersection of the segment (a, b) with the plane, and the
    /// interpolation factor t along it.
    #[inline]
    pub fn intersect(&self, a: Vec4, b: Vec4) -> (Vec4, f32) {
        let u = b - a;
        let w = a - self.point;
        let t = -self.normal.dot(w) / self.normal.dot(u);
        (a + u * t, t)
    }
}

/// One output triangle of a clip, carrying the interpolated
/// per-vertex attributes.
#[derive(Copy, Clone, Debug)]
pub struct ClippedTriangle {
    pub points: [Vec4; 3],
    pub uvs: [Vec2; 3],
    pub light: [f32; 3],
}

impl ClippedTriangle {
    pub const ZERO: ClippedTriangle = ClippedTriangle {
        points: [Vec4::ZERO; 3],
        uvs: [Vec2::ZERO; 3],
        light: [0.0; 3],
    };
}

/// Fixed-capacity polygon buffer used during clipping. Vertices carry
/// UV and light intensity so both interpolate along clipped edges.
#[derive(Copy, Clone)]
struct Polygon {
    points: [Vec4; MAX_CLIP_POINTS],
    uvs: [Vec2; MAX_CLIP_POINTS],
    light: [f32; MAX_CLIP_POINTS],
    count: usize,
}

impl Polygon {
    const EMPTY: Polygon = Polygon {
        points: [Vec4::ZERO; MAX_CLIP_POINTS],
        uvs: [Vec2::ZERO; MAX_CLIP_POINTS],
        light: [0.0; MAX_CLIP_POINTS],
        count: 0,
    };

    #[inline]
    fn add_vertex(&mut self, point: Vec4, uv: Vec2, light: f32) {
        self.points[self.count] = point;
        self.uvs[self.count] = uv;
        self.light[self.count] = light;
        self.count += 1;
    }

    /// Fan triangulation from vertex 0: (0, i+1, i+2). The polygon is
    /// convex, so this is always valid and yields count - 2 triangles.
    fn triangulate(&self, out: &mut [ClippedTriangle; MAX_CLIP_TRIANGLES]) -> usize {
        if self.count < 3 {
            return 0;
        }

        let n = self.count - 2;
        for i in 0..n {
            out[i] = ClippedTriangle {
                points: [self.points[0], self.points[i + 1], self.points[i + 2]],
                uvs: [self.uvs[0], self.uvs[i + 1], self.uvs[i + 2]],
                light: [self.light[0], self.light[i + 1], self.light[i + 2]],
            };
        }
        n
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoxVisibility {
    Outside,
    Intersect,
    Inside,
}

#[derive(Debug, Clone)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Frustum for the standard clip space. `z_near` and `z_far` are the
    /// z extent of the visible volume: inside means -z_far <= z <= -z_near.
    pub fn new(z_near: f32, z_far: f32) -> Self {
        Self {
            planes: [
                // PLANE_LEFT
                Plane {
                    point: Vec4::new(-1.0, 0.0, 0.0, 1.0),
                    normal: Vec4::new(1.0, 0.0, 0.0, 1.0),
                },
                // PLANE_RIGHT
                Plane {
                    point: Vec4::new(1.0, 0.0, 0.0, 1.0),
                    normal: Vec4::new(-1.0, 0.0, 0.0, 1.0),
                },
                // PLANE_TOP
                Plane {
                    point: Vec4::new(0.0, -1.0, 0.0, 1.0),
                    normal: Vec4::new(0.0, 1.0, 0.0, 1.0),
                },
                // PLANE_BOTTOM
                Plane {
                    point: Vec4::new(0.0, 1.0, 0.0, 1.0),
                    normal: Vec4::new(0.0, -1.0, 0.0, 1.0),
                },
                // PLANE_NEAR
                Plane {
                    point: Vec4::new(0.0, 0.0, -z_near, 1.0),
                    normal: Vec4::new(0.0, 0.0, 1.0, 0.0),
                },
                // PLANE_FAR
                Plane {
                    point: Vec4::new(0.0, 0.0, -z_far, 1.0),
                    normal: Vec4::new(0.0, 0.0, -1.0, 0.0),
                },
            ],
        }
    }

    /// Clip a triangle against all six planes. Returns the number of
    /// triangles written to `out`: 0 when fully outside, 1 when fully
    /// inside, up to MAX_CLIP_TRIANGLES when the clip polygon grew.
    pub fn clip_triangle(
        &self,
        points: &[Vec4; 3],
        uvs: &[Vec2; 3],
        light: &[f32; 3],
        out: &mut [ClippedTriangle; MAX_CLIP_TRIANGLES],
    ) -> usize {
        let mut polygon = Polygon::EMPTY;
        for i in 0..3 {
            polygon.add_vertex(points[i], uvs[i], light[i]);
        }

        for plane in &self.planes {
            let mut clipped = Polygon::EMPTY;

            for b in 0..polygon.count {
                let a = (b + 1) % polygon.count;
                let (vert_a, vert_b) = (polygon.points[a], polygon.points[b]);
                let (uv_a, uv_b) = (polygon.uvs[a], polygon.uvs[b]);
                let (light_a, light_b) = (polygon.light[a], polygon.light[b]);

                if plane.is_vertex_inside(vert_a) {
                    if !plane.is_vertex_inside(vert_b) {
                        let (point, t) = plane.intersect(vert_a, vert_b);
                        clipped.add_vertex(
                            point,
                            uv_a.lerp(uv_b, t),
                            light_a + (light_b - light_a) * t,
                        );
                    }
                    clipped.add_vertex(vert_a, uv_a, light_a);
                } else if plane.is_vertex_inside(vert_b) {
                    let (point, t) = plane.intersect(vert_a, vert_b);
                    clipped.add_vertex(
                        point,
                        uv_a.lerp(uv_b, t),
                        light_a + (light_b - light_a) * t,
                    );
                }
            }

            if clipped.count == 0 {
                return 0;
            }

            polygon = clipped;
        }

        polygon.triangulate(out)
    }

    /// Classify the eight transformed corners of a bounding box:
    /// Outside when some single plane rejects all corners, Inside when
    /// every plane accepts all corners, Intersect otherwise.
    pub fn box_visibility(&self, corners: &[Vec4; 8]) -> BoxVisibility {
        let mut fully_inside = true;

        for plane in &self.planes {
            let mut outside = 0;
            for &corner in corners {
                if plane.distance_to_vertex(corner) > 0.0 {
                    outside += 1;
                }
            }

            if outside == corners.len() {
                return BoxVisibility::Outside;
            }
            if outside > 0 {
                fully_inside = false;
            }
        }

        if fully_inside {
            BoxVisibility::Inside
        } else {
            BoxVisibility::Intersect
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Clip-space triangle in front of the camera: w is the negated view
    // distance, so w = -1 here, and z = w for this projection.
    fn interior_triangle() -> ([Vec4; 3], [Vec2; 3], [f32; 3]) {
        (
            [
                Vec4::new(0.0, 0.0, -0.5, -1.0),
                Vec4::new(0.5, 0.0, -0.5, -1.0),
                Vec4::new(0.0, 0.5, -0.5, -1.0),
            ],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            [0.5, 0.75, 1.0],
        )
    }

    #[test]
    fn fully_inside_triangle_passes_through_unchanged() {
        let frustum = Frustum::new(0.1, 50.0);
        let (points, uvs, light) = interior_triangle();
        let mut out = [ClippedTriangle::ZERO; MAX_CLIP_TRIANGLES];

        let n = frustum.clip_triangle(&points, &uvs, &light, &mut out);
        assert_eq!(n, 1);
        // Sutherland-Hodgman rotates the vertex order; compare as sets.
        for i in 0..3 {
            let found = out[0]
                .points
                .iter()
                .position(|p| (*p - points[i]).length() < 1e-6)
                .expect("input vertex missing from output");
            assert_eq!(out[0].uvs[found], uvs[i]);
            assert_eq!(out[0].light[found], light[i]);
        }
    }

    #[test]
    fn plane_test_keeps_the_visible_halfspace() {
        let frustum = Frustum::new(0.1, 50.0);
        let (points, _, _) = interior_triangle();
        for p in &points {
            for plane in &frustum.planes {
                assert!(plane.is_vertex_inside(*p));
            }
        }

        // x beyond |w| is outside the horizontal planes.
        let off_right = Vec4::new(1.5, 0.0, -0.5, -1.0);
        assert!(!frustum.planes[PLANE_LEFT].is_vertex_inside(off_right));
    }

    #[test]
    fn empty_polygon_returns_zero_triangles() {
        let frustum = Frustum::new(0.1, 50.0);
        // Entirely behind the camera: positive w.
        let points = [
            Vec4::new(0.0, 0.0, 0.5, 1.0),
            Vec4::new(0.5, 0.0, 0.5, 1.0),
            Vec4::new(0.0, 0.5, 0.5, 1.0),
        ];
        let uvs = [Vec2::ZERO; 3];
        let light = [1.0; 3];
        let mut out = [ClippedTriangle::ZERO; MAX_CLIP_TRIANGLES];
        assert_eq!(frustum.clip_triangle(&points, &uvs, &light, &mut out), 0);
    }
}
