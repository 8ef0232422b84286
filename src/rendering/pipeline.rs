/// The render pipeline: per-object transform and lighting, backface
/// culling, frustum clipping, perspective divide and screen mapping,
/// tile binning, and the two-phase parallel frame.
///
/// Each frame runs as a dataflow with a barrier in the middle: first
/// every object is projected (in parallel, one object per worker) and
/// its triangles are scattered into per-tile bins, then every tile is
/// rasterized (in parallel, one tile per worker) into its disjoint
/// pixel rectangle. Projection workers buffer bin pushes locally and
/// take a tile's mutex only to append a full batch, which keeps lock
/// acquisitions per frame at the order of the tile count rather than
/// the triangle count.
use super::clipping::{BoxVisibility, ClippedTriangle, Frustum, MAX_CLIP_TRIANGLES};
use super::framebuffer::{Framebuffer, FrameTile, Rgba, TileRect};
use super::rasterizer::{self, ProjectedTriangle};
use super::shading::LightConfig;
use super::simd_vertex;
use crate::camera::Camera;
use crate::count_call;
use crate::math;
use crate::perf::FUNCTION_COUNTERS;
use crate::scene::{Object, Scene};
use glam::{Mat3, Mat4};
use rayon::prelude::*;
use std::sync::Mutex;

/// Upper bound on the tile count; the actual count is chosen from the
/// machine's available parallelism at construction.
pub const MAX_TILES: usize = 16;

/// Triangles buffered per tile in a worker before it takes the tile
/// lock to flush them.
const LOCAL_BATCH_CAPACITY: usize = 128;

const DEFAULT_FOV_Y: f32 = 45.0 * (std::f32::consts::PI / 180.0);
const DEFAULT_Z_NEAR: f32 = 0.1;
const DEFAULT_Z_FAR: f32 = 50.0;

const BACKGROUND_COLOR: Rgba = Rgba::new(50, 50, 50);
const GRID_COLOR: Rgba = Rgba::new(100, 100, 100);
const CROSSHAIR_COLOR: Rgba = Rgba::new(255, 255, 0);
const EDGE_COLOR: Rgba = Rgba::new(0, 0, 0);
const VERTEX_COLOR: Rgba = Rgba::new(255, 161, 0);

/// Depth fog overlay settings, in the framebuffer's depth convention
/// (greater is closer, so `near > far`).
#[derive(Copy, Clone, Debug)]
pub struct Fog {
    pub near: f32,
    pub far: f32,
    pub color: Rgba,
}

pub struct Renderer {
    fb: Framebuffer,
    frustum: Frustum,
    perspective: Mat4,
    screen: Mat4,

    pub light: LightConfig,
    pub frustum_clipping: bool,
    pub backface_culling: bool,
    pub lighting: bool,
    pub show_faces: bool,
    pub show_textures: bool,
    pub show_edges: bool,
    pub show_vertices: bool,
    pub show_grid: bool,
    pub show_crosshair: bool,
    pub fog: Option<Fog>,

    num_tiles: usize,
    tile_bounds: Vec<TileRect>,
    bins: Vec<Mutex<Vec<ProjectedTriangle>>>,
}

impl Renderer {
    /// Renderer with the tile count picked from the machine's logical
    /// CPU count, capped at `MAX_TILES`.
    pub fn new(width: usize, height: usize) -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_tiles(width, height, cpus)
    }

    /// Renderer with an explicit tile count, clamped to [1, MAX_TILES].
    /// The count is rounded down to a full cols x rows grid so the
    /// tiles partition the framebuffer exactly.
    pub fn with_tiles(width: usize, height: usize, tiles: usize) -> Self {
        let tiles = tiles.clamp(1, MAX_TILES);
        let cols = (tiles as f32).sqrt() as usize;
        let rows = tiles / cols;
        let num_tiles = cols * rows;

        let aspect = width as f32 / height as f32;
        let tile_bounds = tile_boundaries(cols, rows, width, height);
        let bins = (0..num_tiles).map(|_| Mutex::new(Vec::new())).collect();

        Self {
            fb: Framebuffer::new(width, height),
            frustum: Frustum::new(DEFAULT_Z_NEAR, DEFAULT_Z_FAR),
            perspective: math::perspective_matrix(DEFAULT_FOV_Y, aspect),
            screen: math::screen_matrix(width as f32, height as f32),
            light: LightConfig::default(),
            frustum_clipping: true,
            backface_culling: true,
            lighting: true,
            show_faces: true,
            show_textures: true,
            show_edges: false,
            show_vertices: false,
            show_grid: true,
            show_crosshair: true,
            fog: None,
            num_tiles,
            tile_bounds,
            bins,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.fb
    }

    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    /// Render one frame into the back buffer. The camera is copied up
    /// front so concurrent animation of the caller's camera between
    /// frames never races a projection worker. The caller presents by
    /// swapping buffers afterwards.
    pub fn draw(&mut self, scene: &mut Scene, camera: &Camera) {
        count_call!(FUNCTION_COUNTERS.frames_rendered);
        let camera = *camera;

        for bin in &self.bins {
            bin.lock().unwrap().clear();
        }
        self.fb.clear(BACKGROUND_COLOR);
        if self.show_grid {
            self.fb.dot_grid(GRID_COLOR, 10);
        }

        let view = math::view_matrix(camera.position, camera.direction, camera.up);
        let ctx = ProjectContext {
            frustum: &self.frustum,
            bins: &self.bins,
            tile_bounds: &self.tile_bounds,
            view_projection: self.perspective * view,
            screen: self.screen,
            light: self.light,
            frustum_clipping: self.frustum_clipping,
            backface_culling: self.backface_culling,
            lighting: self.lighting,
        };

        // Phase 1: projection. One task per object; the parallel
        // iterator joins before rasterization starts, which is the
        // barrier the per-tile bins rely on.
        let num_tiles = self.num_tiles;
        scene.objects.par_iter_mut().for_each_init(
            || LocalBatch::new(num_tiles),
            |batch, object| {
                project_object(&ctx, object, batch);
                batch.flush(ctx.bins);
            },
        );

        // Phase 2: rasterization. One task per tile; tiles cover
        // disjoint pixel rectangles, so no locks are held while
        // drawing.
        let show_faces = self.show_faces;
        let show_textures = self.show_textures;
        let show_edges = self.show_edges;
        let show_vertices = self.show_vertices;
        let bins = &self.bins;
        let tiles = self.fb.split_into_tiles(&self.tile_bounds);
        tiles
            .into_par_iter()
            .enumerate()
            .for_each(|(tile_index, mut tile)| {
                let bin = bins[tile_index].lock().unwrap();
                for tri in bin.iter() {
                    draw_projection(
                        &mut tile,
                        tri,
                        show_faces,
                        show_textures,
                        show_edges,
                        show_vertices,
                    );
                }
            });

        if self.show_crosshair {
            self.fb.crosshair(CROSSHAIR_COLOR);
        }
        if let Some(fog) = self.fog {
            self.fb.fog(fog.near, fog.far, fog.color);
        }
    }
}

/// Immutable per-frame state shared by all projection workers.
struct ProjectContext<'a> {
    frustum: &'a Frustum,
    bins: &'a [Mutex<Vec<ProjectedTriangle>>],
    tile_bounds: &'a [TileRect],
    view_projection: Mat4,
    screen: Mat4,
    light: LightConfig,
    frustum_clipping: bool,
    backface_culling: bool,
    lighting: bool,
}

/// Per-worker buffered bin pushes. A tile's mutex is taken only when
/// that tile's buffer fills up, or once at the end of an object.
struct LocalBatch {
    pending: Vec<Vec<ProjectedTriangle>>,
}

impl LocalBatch {
    fn new(num_tiles: usize) -> Self {
        Self {
            pending: (0..num_tiles)
                .map(|_| Vec::with_capacity(LOCAL_BATCH_CAPACITY))
                .collect(),
        }
    }

    /// Append the triangle to every tile whose rectangle its bounding
    /// box overlaps.
    fn bin(&mut self, ctx: &ProjectContext<'_>, tri: ProjectedTriangle) {
        let min_x = tri.points[0].x.min(tri.points[1].x).min(tri.points[2].x);
        let max_x = tri.points[0].x.max(tri.points[1].x).max(tri.points[2].x);
        let min_y = tri.points[0].y.min(tri.points[1].y).min(tri.points[2].y);
        let max_y = tri.points[0].y.max(tri.points[1].y).max(tri.points[2].y);

        for (tile_index, rect) in ctx.tile_bounds.iter().enumerate() {
            if max_x < rect.x0 as f32
                || min_x > rect.x1 as f32
                || max_y < rect.y0 as f32
                || min_y > rect.y1 as f32
            {
                continue;
            }

            count_call!(FUNCTION_COUNTERS.triangles_binned);
            let pending = &mut self.pending[tile_index];
            pending.push(tri.clone());
            if pending.len() == LOCAL_BATCH_CAPACITY {
                ctx.bins[tile_index].lock().unwrap().append(pending);
            }
        }
    }

    /// Push any buffered tails into the shared bins.
    fn flush(&mut self, bins: &[Mutex<Vec<ProjectedTriangle>>]) {
        for (tile_index, pending) in self.pending.iter_mut().enumerate() {
            if !pending.is_empty() {
                bins[tile_index].lock().unwrap().append(pending);
            }
        }
    }
}

/// Project one object: world/view/projection transform, bounding-box
/// visibility, per-face culling, lighting and clipping, perspective
/// divide and screen mapping, then tile binning.
fn project_object(ctx: &ProjectContext<'_>, object: &mut Object, batch: &mut LocalBatch) {
    count_call!(FUNCTION_COUNTERS.objects_projected);

    let world = math::world_matrix(object.scale, object.rotation, object.translation);
    let mvp = ctx.view_projection * world;
    let mesh = object.mesh.clone();

    let mut bbox = mesh.bounding_box;
    for corner in bbox.iter_mut() {
        *corner = mvp * *corner;
    }
    let visibility = ctx.frustum.box_visibility(&bbox);
    if visibility == BoxVisibility::Outside {
        count_call!(FUNCTION_COUNTERS.objects_culled);
        return;
    }

    // Every vertex is transformed exactly once per frame, in batches.
    object.clip_positions.resize(mesh.vertices.len(), glam::Vec4::ZERO);
    simd_vertex::transform_points(&mvp, &mesh.vertices, &mut object.clip_positions);

    // Directions use only the linear part of the world matrix.
    let normal_matrix = Mat3::from_mat4(world);
    let shade_vertices = ctx.lighting && !mesh.normals.is_empty();
    if shade_vertices {
        object.world_normals.resize(mesh.normals.len(), glam::Vec3::ZERO);
        for (out, normal) in object.world_normals.iter_mut().zip(mesh.normals.iter()) {
            *out = (normal_matrix * *normal).normalize();
        }
    }

    let mut clipped = [ClippedTriangle::ZERO; MAX_CLIP_TRIANGLES];

    for (face_index, face) in mesh.faces.iter().enumerate() {
        count_call!(FUNCTION_COUNTERS.triangles_processed);

        let p0 = object.clip_positions[face.a];
        let p1 = object.clip_positions[face.b];
        let p2 = object.clip_positions[face.c];

        // Geometric normal in clip space; the face is invisible when it
        // points away from the origin (the camera after the view
        // transform).
        let v0 = p0.truncate();
        let face_normal = (p1.truncate() - v0).cross(p2.truncate() - v0);
        if ctx.backface_culling && face_normal.dot(-v0) < 0.0 {
            count_call!(FUNCTION_COUNTERS.triangles_backface_culled);
            continue;
        }

        let light = if !ctx.lighting {
            [0.5; 3]
        } else if shade_vertices {
            if let Some([na, nb, nc]) = face.normals {
                [
                    ctx.light.intensity(object.world_normals[na]),
                    ctx.light.intensity(object.world_normals[nb]),
                    ctx.light.intensity(object.world_normals[nc]),
                ]
            } else {
                flat_light(ctx, &normal_matrix, &mesh.face_normals[face_index])
            }
        } else {
            flat_light(ctx, &normal_matrix, &mesh.face_normals[face_index])
        };

        let tri_count = if ctx.frustum_clipping && visibility != BoxVisibility::Inside {
            ctx.frustum
                .clip_triangle(&[p0, p1, p2], &face.uvs, &light, &mut clipped)
        } else {
            clipped[0] = ClippedTriangle {
                points: [p0, p1, p2],
                uvs: face.uvs,
                light,
            };
            1
        };
        if tri_count == 0 {
            count_call!(FUNCTION_COUNTERS.triangles_clipped_out);
            continue;
        }

        for ct in &clipped[..tri_count] {
            let mut points = ct.points;
            for p in points.iter_mut() {
                let orig_w = p.w;
                *p /= orig_w; // perspective divide
                *p = ctx.screen * *p;
                p.w = orig_w; // kept for depth and texture mapping
            }

            batch.bin(
                ctx,
                ProjectedTriangle {
                    points,
                    uvs: ct.uvs,
                    intensity: ct.light,
                    texture: face.texture.clone(),
                },
            );
        }
    }
}

#[inline]
fn flat_light(
    ctx: &ProjectContext<'_>,
    normal_matrix: &Mat3,
    face_normal: &glam::Vec3,
) -> [f32; 3] {
    let n = (*normal_matrix * *face_normal).normalize_or_zero();
    [ctx.light.intensity(n); 3]
}

/// Draw one binned triangle into a tile: the filled face, then the
/// optional edge and vertex debug overlays, all clipped to the tile.
fn draw_projection(
    tile: &mut FrameTile,
    tri: &ProjectedTriangle,
    show_faces: bool,
    show_textures: bool,
    show_edges: bool,
    show_vertices: bool,
) {
    let [a, b, c] = tri.points;

    if show_faces {
        rasterizer::draw_triangle(tile, tri, show_textures);
    }

    if show_edges {
        // Black edges are invisible when the faces are not drawn.
        let color = if show_faces { EDGE_COLOR } else { Rgba::WHITE };

        tile.line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, color);
        tile.line(b.x as i32, b.y as i32, c.x as i32, c.y as i32, color);
        tile.line(c.x as i32, c.y as i32, a.x as i32, a.y as i32, color);

        if show_faces {
            let cx = ((a.x + b.x + c.x) / 3.0) as i32;
            let cy = ((a.y + b.y + c.y) / 3.0) as i32;
            tile.rect_fill(cx - 1, cy - 1, 3, 3, color);
        }
    }

    if show_vertices {
        tile.rect_fill(a.x as i32 - 1, a.y as i32 - 1, 3, 3, VERTEX_COLOR);
        tile.rect_fill(b.x as i32 - 1, b.y as i32 - 1, 3, 3, VERTEX_COLOR);
        tile.rect_fill(c.x as i32 - 1, c.y as i32 - 1, 3, 3, VERTEX_COLOR);
    }
}

/// Partition the framebuffer into a cols x rows grid of rectangles,
/// the rightmost column and bottom row clamped to the framebuffer.
fn tile_boundaries(cols: usize, rows: usize, width: usize, height: usize) -> Vec<TileRect> {
    let tile_w = (width + cols - 1) / cols;
    let tile_h = (height + rows - 1) / rows;

    (0..cols * rows)
        .map(|i| {
            let x0 = (i % cols) * tile_w;
            let y0 = (i / cols) * tile_h;
            TileRect {
                x0: x0.min(width),
                y0: y0.min(height),
                x1: (x0 + tile_w).min(width),
                y1: (y0 + tile_h).min(height),
            }
        })
        .collect()
}
