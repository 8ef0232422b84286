/// CPU software renderer for textured triangle meshes: vertex
/// transform, lighting, frustum clipping, perspective projection and
/// tile-parallel z-buffered rasterization, producing RGBA frames a
/// consumer can present or encode.
pub mod camera;
pub mod error;
pub mod math;
pub mod perf;
pub mod rendering;
pub mod scene;

pub use camera::Camera;
pub use error::LoadError;
pub use perf::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};
pub use rendering::{
    BoxVisibility, Fog, Framebuffer, Frustum, LightConfig, ProjectedTriangle, Renderer, Rgba,
    Texture, MAX_TILES,
};
pub use scene::manifest::load_scene_file;
pub use scene::obj::{load_mesh_file, load_meshes_file};
pub use scene::{Face, Mesh, Object, Scene};
