/// Triangle scan conversion: incremental integer edge functions over
/// the tile-clipped bounding box, top-left fill rule, z-buffer test and
/// perspective-correct attribute interpolation.
use super::framebuffer::{FrameTile, Rgba};
use super::texture::Texture;
use crate::perf::FUNCTION_COUNTERS;
use crate::{count_add, count_call};
use glam::{Vec2, Vec4};
use std::sync::Arc;

/// Flat color for triangles without a texture.
pub const FACE_COLOR: Rgba = Rgba::new(200, 200, 200);

/// A screen-space triangle produced by the projection stage and
/// consumed by the rasterizer. The points hold screen x/y; the w
/// component keeps the original clip-space w (negative for visible
/// geometry) for depth and perspective-correct interpolation.
#[derive(Clone, Debug)]
pub struct ProjectedTriangle {
    pub points: [Vec4; 3],
    pub uvs: [Vec2; 3],
    pub intensity: [f32; 3],
    pub texture: Option<Arc<Texture>>,
}

/// Top-left fill rule: an edge owns its pixels iff it is a top or a
/// left edge; all others are nudged by -1 so shared edges between
/// adjacent triangles are covered exactly once.
#[inline]
fn edge_adjust(f: i64, dx: i64, dy: i64) -> i64 {
    if dy > 0 || (dy == 0 && dx > 0) {
        f
    } else {
        f - 1
    }
}

/// Rasterize one triangle into a tile. `textured` disables texture
/// lookup (debug flat-color mode) without touching the triangle.
pub fn draw_triangle(tile: &mut FrameTile, tri: &ProjectedTriangle, textured: bool) {
    count_call!(FUNCTION_COUNTERS.triangles_rasterized);

    let x0 = tri.points[0].x as i64;
    let y0 = tri.points[0].y as i64;
    let x1 = tri.points[1].x as i64;
    let y1 = tri.points[1].y as i64;
    let x2 = tri.points[2].x as i64;
    let y2 = tri.points[2].y as i64;

    // Bounding box, intersected with the tile rectangle and the
    // framebuffer bounds.
    let rect = tile.rect();
    let min_x = x0.min(x1).min(x2).max(rect.x0 as i64).max(0);
    let max_x = x0
        .max(x1)
        .max(x2)
        .min(rect.x1 as i64 - 1)
        .min(tile.fb_width() as i64 - 1);
    let min_y = y0.min(y1).min(y2).max(rect.y0 as i64).max(0);
    let max_y = y0
        .max(y1)
        .max(y2)
        .min(rect.y1 as i64 - 1)
        .min(tile.fb_height() as i64 - 1);

    if min_x > max_x || min_y > max_y {
        return;
    }

    // Edge functions at the top-left corner of the bounding box.
    let mut f01 = (y0 - y1) * min_x + (x1 - x0) * min_y + (x0 * y1 - x1 * y0);
    let mut f12 = (y1 - y2) * min_x + (x2 - x1) * min_y + (x1 * y2 - x2 * y1);
    let mut f20 = (y2 - y0) * min_x + (x0 - x2) * min_y + (x2 * y0 - x0 * y2);

    // The sum of the three edge functions is twice the signed area;
    // degenerate triangles would divide by zero below.
    if f01 + f12 + f20 == 0 {
        return;
    }

    // Per-pixel and per-row steps.
    let f01dx = y0 - y1;
    let f01dy = x1 - x0;
    let f12dx = y1 - y2;
    let f12dy = x2 - x1;
    let f20dx = y2 - y0;
    let f20dy = x0 - x2;

    f01 = edge_adjust(f01, f01dx, f01dy);
    f12 = edge_adjust(f12, f12dx, f12dy);
    f20 = edge_adjust(f20, f20dx, f20dy);

    let w0 = tri.points[0].w;
    let w1 = tri.points[1].w;
    let w2 = tri.points[2].w;

    // u/w and v/w are linear in screen space; dividing by the
    // interpolated 1/w at each pixel recovers the true attribute.
    let u0w0 = tri.uvs[0].x / w0;
    let v0w0 = tri.uvs[0].y / w0;
    let u1w1 = tri.uvs[1].x / w1;
    let v1w1 = tri.uvs[1].y / w1;
    let u2w2 = tri.uvs[2].x / w2;
    let v2w2 = tri.uvs[2].y / w2;

    let [light0, light1, light2] = tri.intensity;
    let texture = if textured { tri.texture.as_deref() } else { None };

    count_add!(
        FUNCTION_COUNTERS.pixels_tested,
        ((max_x - min_x + 1) * (max_y - min_y + 1)) as u64
    );
    let mut filled = 0u64;

    for y in min_y..=max_y {
        let mut fx01 = f01;
        let mut fx12 = f12;
        let mut fx20 = f20;

        for x in min_x..=max_x {
            if fx01 < 0 && fx12 < 0 && fx20 < 0 {
                let sum = (fx12 + fx20 + fx01) as f32;
                let alpha = fx12 as f32 / sum;
                let beta = fx20 as f32 / sum;
                let gamma = 1.0 - alpha - beta;

                // Negated reciprocal of the interpolated w: positive
                // for visible samples, larger when closer.
                let zrec = -(alpha / w0 + beta / w1 + gamma / w2);

                if let Some(index) = tile.test_depth(x as usize, y as usize, zrec) {
                    let color = match texture {
                        Some(t) => {
                            let u = -(alpha * u0w0 + beta * u1w1 + gamma * u2w2) / zrec;
                            let v = -(alpha * v0w0 + beta * v1w1 + gamma * v2w2) / zrec;
                            t.sample(u, v)
                        }
                        None => FACE_COLOR,
                    };

                    // Light interpolates linearly in screen space.
                    let intensity = alpha * light0 + beta * light1 + gamma * light2;
                    tile.write_color(index, color.shade(intensity));
                    filled += 1;
                }
            }

            fx01 += f01dx;
            fx12 += f12dx;
            fx20 += f20dx;
        }

        f01 += f01dy;
        f12 += f12dy;
        f20 += f20dy;
    }

    count_add!(FUNCTION_COUNTERS.pixels_filled, filled);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::framebuffer::Framebuffer;

    fn flat_triangle(verts: [(f32, f32); 3]) -> ProjectedTriangle {
        ProjectedTriangle {
            points: [
                Vec4::new(verts[0].0, verts[0].1, 0.0, -1.0),
                Vec4::new(verts[1].0, verts[1].1, 0.0, -1.0),
                Vec4::new(verts[2].0, verts[2].1, 0.0, -1.0),
            ],
            uvs: [Vec2::ZERO; 3],
            intensity: [1.0; 3],
            texture: None,
        }
    }

    fn covered(fb: &Framebuffer, background: Rgba) -> usize {
        fb.back().iter().filter(|&&p| p != background).count()
    }

    #[test]
    fn degenerate_triangle_is_skipped() {
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Rgba::BLACK);
        let tri = flat_triangle([(1.0, 1.0), (5.0, 5.0), (3.0, 3.0)]);
        draw_triangle(&mut fb.full_tile(), &tri, true);
        assert_eq!(covered(&fb, Rgba::BLACK), 0);
    }

    #[test]
    fn triangle_is_clipped_to_the_tile_rect() {
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Rgba::BLACK);

        let bounds = [crate::rendering::framebuffer::TileRect {
            x0: 0,
            y0: 0,
            x1: 4,
            y1: 8,
        }];
        let tri = flat_triangle([(0.0, 0.0), (0.0, 8.0), (8.0, 0.0)]);
        let mut tiles = fb.split_into_tiles(&bounds);
        draw_triangle(&mut tiles[0], &tri, true);
        drop(tiles);

        for y in 0..8usize {
            for x in 4..8usize {
                assert_eq!(fb.back()[y * 8 + x], Rgba::BLACK, "pixel ({x}, {y})");
            }
        }
        assert!(covered(&fb, Rgba::BLACK) > 0);
    }

    #[test]
    fn offscreen_bounding_box_draws_nothing() {
        let mut fb = Framebuffer::new(8, 8);
        fb.clear(Rgba::BLACK);
        let tri = flat_triangle([(20.0, 20.0), (20.0, 30.0), (30.0, 20.0)]);
        draw_triangle(&mut fb.full_tile(), &tri, true);
        assert_eq!(covered(&fb, Rgba::BLACK), 0);
    }
}
