pub mod clipping;
pub mod framebuffer;
pub mod pipeline;
/// Software rasterization pipeline: framebuffer, textures, frustum
/// clipping, the triangle kernel and the tile-parallel renderer.
pub mod rasterizer;
pub mod shading;
pub mod simd_vertex;
pub mod texture;

pub use clipping::{BoxVisibility, ClippedTriangle, Frustum, Plane, MAX_CLIP_TRIANGLES};
pub use framebuffer::{Framebuffer, FrameTile, Rgba, TileRect, DEPTH_FAR};
pub use pipeline::{Fog, Renderer, MAX_TILES};
pub use rasterizer::{ProjectedTriangle, FACE_COLOR};
pub use shading::LightConfig;
pub use texture::Texture;
