/// Triangle kernel tests: exact coverage, the top-left fill rule on
/// shared edges, depth behavior and perspective-correct interpolation.
use glam::{Vec2, Vec4};
use softrast::rendering::framebuffer::{Framebuffer, Rgba};
use softrast::rendering::rasterizer::{draw_triangle, ProjectedTriangle};
use softrast::rendering::texture::Texture;
use std::collections::HashSet;
use std::sync::Arc;

/// Screen-space triangle with uniform w (flat depth) and a solid color.
fn solid_triangle(verts: [(f32, f32); 3], w: f32, color: Rgba) -> ProjectedTriangle {
    ProjectedTriangle {
        points: [
            Vec4::new(verts[0].0, verts[0].1, 0.0, w),
            Vec4::new(verts[1].0, verts[1].1, 0.0, w),
            Vec4::new(verts[2].0, verts[2].1, 0.0, w),
        ],
        uvs: [Vec2::ZERO; 3],
        intensity: [1.0; 3],
        texture: Some(Arc::new(Texture::solid(color))),
    }
}

fn pixels_of(fb: &Framebuffer, color: Rgba) -> HashSet<(usize, usize)> {
    let mut set = HashSet::new();
    for y in 0..fb.height {
        for x in 0..fb.width {
            if fb.back()[y * fb.width + x] == color {
                set.insert((x, y));
            }
        }
    }
    set
}

#[test]
fn lower_left_triangle_covers_the_expected_pixels() {
    // Right triangle with legs on the axes in a 4x4 buffer. The
    // hypotenuse is a right edge under the fill rule, so the diagonal
    // pixels stay uncovered.
    let mut fb = Framebuffer::new(4, 4);
    fb.clear(Rgba::BLACK);

    let tri = solid_triangle([(0.0, 0.0), (0.0, 3.0), (3.0, 0.0)], -1.0, Rgba::WHITE);
    draw_triangle(&mut fb.full_tile(), &tri, true);

    let white = pixels_of(&fb, Rgba::WHITE);
    let expected: HashSet<(usize, usize)> =
        [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (0, 2)].into_iter().collect();
    assert_eq!(white, expected);
}

#[test]
fn abutting_triangles_share_their_edge_exactly_once() {
    // Two triangles sharing the vertical edge (2,0)-(2,3) in a 4x4
    // buffer. Every pixel along the shared edge must belong to exactly
    // one of them: no double coverage, no gap.
    let mut fb = Framebuffer::new(4, 4);
    fb.clear(Rgba::BLACK);

    let red = Rgba::new(255, 0, 0);
    let green = Rgba::new(0, 255, 0);
    let left = solid_triangle([(2.0, 0.0), (0.0, 0.0), (2.0, 3.0)], -1.0, red);
    let right = solid_triangle([(2.0, 0.0), (2.0, 3.0), (4.0, 3.0)], -1.0, green);

    let mut tile = fb.full_tile();
    draw_triangle(&mut tile, &left, true);
    draw_triangle(&mut tile, &right, true);
    drop(tile);

    let red_set = pixels_of(&fb, red);
    let green_set = pixels_of(&fb, green);

    let expected_red: HashSet<(usize, usize)> = [(1, 0), (1, 1)].into_iter().collect();
    let expected_green: HashSet<(usize, usize)> =
        [(2, 0), (2, 1), (2, 2), (3, 2)].into_iter().collect();
    assert_eq!(red_set, expected_red);
    assert_eq!(green_set, expected_green);

    // The edge column belongs entirely to the right triangle; with
    // equal depth, double-covered pixels would have flipped color when
    // the second triangle drew over them, and a gap would show as
    // background. Drawing in the opposite order changes nothing.
    let mut fb2 = Framebuffer::new(4, 4);
    fb2.clear(Rgba::BLACK);
    let mut tile2 = fb2.full_tile();
    draw_triangle(&mut tile2, &right, true);
    draw_triangle(&mut tile2, &left, true);
    drop(tile2);
    assert_eq!(pixels_of(&fb2, red), expected_red);
    assert_eq!(pixels_of(&fb2, green), expected_green);
}

#[test]
fn depth_only_moves_towards_the_camera() {
    let mut fb = Framebuffer::new(16, 16);
    fb.clear(Rgba::BLACK);

    let verts = [(0.0, 0.0), (0.0, 15.0), (15.0, 0.0)];
    let mid = solid_triangle(verts, -2.0, Rgba::new(1, 1, 1));
    draw_triangle(&mut fb.full_tile(), &mid, true);
    let after_mid: Vec<f32> = fb.depth().to_vec();
    assert!(after_mid.iter().any(|&d| (d - 0.5).abs() < 1e-5));

    // A farther triangle over the same pixels changes nothing.
    let far = solid_triangle(verts, -4.0, Rgba::new(2, 2, 2));
    draw_triangle(&mut fb.full_tile(), &far, true);
    assert_eq!(fb.depth(), after_mid.as_slice());
    assert!(pixels_of(&fb, Rgba::new(2, 2, 2)).is_empty());

    // A closer one overwrites every covered pixel, strictly increasing
    // the stored depth.
    let near = solid_triangle(verts, -1.0, Rgba::new(3, 3, 3));
    draw_triangle(&mut fb.full_tile(), &near, true);
    for (i, (&before, &after)) in after_mid.iter().zip(fb.depth().iter()).enumerate() {
        assert!(after >= before, "depth regressed at {}", i);
        if (before - 0.5).abs() < 1e-5 {
            assert!((after - 1.0).abs() < 1e-5);
        }
    }
}

#[test]
fn equal_depth_resolves_to_the_later_triangle() {
    let mut fb = Framebuffer::new(8, 8);
    fb.clear(Rgba::BLACK);

    let verts = [(0.0, 0.0), (0.0, 7.0), (7.0, 0.0)];
    let first = solid_triangle(verts, -2.0, Rgba::new(10, 10, 10));
    let second = solid_triangle(verts, -2.0, Rgba::new(20, 20, 20));

    let mut tile = fb.full_tile();
    draw_triangle(&mut tile, &first, true);
    draw_triangle(&mut tile, &second, true);
    drop(tile);

    assert!(pixels_of(&fb, Rgba::new(10, 10, 10)).is_empty());
    assert!(!pixels_of(&fb, Rgba::new(20, 20, 20)).is_empty());
}

/// Unnudged edge-function barycentrics at a pixel, for computing
/// reference values the same way the kernel does.
fn barycentric(verts: [(i64, i64); 3], px: i64, py: i64) -> (f32, f32, f32) {
    let [(x0, y0), (x1, y1), (x2, y2)] = verts;
    let f01 = (y0 - y1) * px + (x1 - x0) * py + (x0 * y1 - x1 * y0);
    let f12 = (y1 - y2) * px + (x2 - x1) * py + (x1 * y2 - x2 * y1);
    let f20 = (y2 - y0) * px + (x0 - x2) * py + (x2 * y0 - x0 * y2);
    let sum = (f01 + f12 + f20) as f32;
    (f12 as f32 / sum, f20 as f32 / sum, 1.0 - f12 as f32 / sum - f20 as f32 / sum)
}

#[test]
fn texture_interpolation_is_perspective_correct() {
    // A 256x1 ramp texture encodes u in the red channel. The triangle
    // has one vertex four times as deep as the others, so affine
    // interpolation would visibly "swim" away from the true values.
    let ramp = image::RgbaImage::from_fn(256, 1, |x, _| image::Rgba([x as u8, 0, 0, 255]));
    let texture = Arc::new(Texture::from_image(&image::DynamicImage::ImageRgba8(ramp)));

    let verts = [(4i64, 4i64), (4, 60), (60, 4)];
    let (w0, w1, w2) = (-1.0f32, -1.0, -4.0);
    let tri = ProjectedTriangle {
        points: [
            Vec4::new(4.0, 4.0, 0.0, w0),
            Vec4::new(4.0, 60.0, 0.0, w1),
            Vec4::new(60.0, 4.0, 0.0, w2),
        ],
        uvs: [Vec2::new(0.0, 0.0), Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
        intensity: [1.0; 3],
        texture: Some(texture),
    };

    let mut fb = Framebuffer::new(64, 64);
    fb.clear(Rgba::BLACK);
    draw_triangle(&mut fb.full_tile(), &tri, true);

    // At the u = 0 vertex the sampled ramp must reproduce the exact
    // vertex UV.
    assert!(fb.back()[4 * 64 + 4].r <= 1);

    for &(px, py) in &[(22i64, 22i64), (10, 40), (40, 10)] {
        let (alpha, beta, gamma) = barycentric(verts, px, py);
        let expected_u = (alpha * 0.0 / w0 + beta * 0.0 / w1 + gamma * 1.0 / w2)
            / (alpha / w0 + beta / w1 + gamma / w2);
        let affine_u = gamma;

        let sampled = fb.back()[py as usize * 64 + px as usize].r as f32;
        assert!(
            (sampled - expected_u * 256.0).abs() <= 2.5,
            "({px}, {py}): sampled {} vs expected {}",
            sampled,
            expected_u * 256.0
        );
        // And the affine value is far away, proving the correction
        // actually happened.
        assert!((sampled - affine_u * 256.0).abs() > 20.0);
    }
}

#[test]
fn light_intensity_interpolates_across_the_face() {
    let mut tri = solid_triangle([(0.0, 0.0), (0.0, 31.0), (31.0, 0.0)], -1.0, Rgba::WHITE);
    tri.intensity = [1.0, 0.5, 0.5];

    let mut fb = Framebuffer::new(32, 32);
    fb.clear(Rgba::BLACK);
    draw_triangle(&mut fb.full_tile(), &tri, true);

    let bright = fb.back()[0].r; // at the fully lit vertex
    let dim = fb.back()[28 * 32 + 1].r; // near a half-lit vertex
    assert!(bright >= 250);
    assert!(dim < 160 && dim > 100);
}

#[test]
fn untextured_triangles_use_the_face_color() {
    let mut fb = Framebuffer::new(8, 8);
    fb.clear(Rgba::BLACK);

    let mut tri = solid_triangle([(0.0, 0.0), (0.0, 7.0), (7.0, 0.0)], -1.0, Rgba::WHITE);
    tri.texture = None;
    draw_triangle(&mut fb.full_tile(), &tri, true);

    assert!(!pixels_of(&fb, Rgba::new(200, 200, 200)).is_empty());
}

#[test]
fn texture_lookup_can_be_disabled() {
    let mut fb = Framebuffer::new(8, 8);
    fb.clear(Rgba::BLACK);

    let tri = solid_triangle([(0.0, 0.0), (0.0, 7.0), (7.0, 0.0)], -1.0, Rgba::new(255, 0, 0));
    draw_triangle(&mut fb.full_tile(), &tri, false);

    assert!(pixels_of(&fb, Rgba::new(255, 0, 0)).is_empty());
    assert!(!pixels_of(&fb, Rgba::new(200, 200, 200)).is_empty());
}
