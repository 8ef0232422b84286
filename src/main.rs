/// Headless host for the renderer: loads a mesh or scene, renders a
/// number of frames while orbiting the camera, and writes the final
/// frame as a PNG.
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use glam::Vec3;
use softrast::{
    load_mesh_file, load_scene_file, Camera, LoadError, Object, Renderer, Scene,
    FUNCTION_COUNTERS,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

struct Options {
    width: usize,
    height: usize,
    frames: usize,
    tiles: Option<usize>,
    output: PathBuf,
    stats: bool,
    show_edges: bool,
    show_vertices: bool,
    no_faces: bool,
    no_lighting: bool,
    no_culling: bool,
    input: PathBuf,
}

fn usage() -> ! {
    eprintln!(
        "usage: softrast [--size WxH] [--frames N] [--tiles N] [--output FILE] [--stats] \
         [--edges] [--vertices] [--no-faces] [--no-lighting] [--no-culling] \
         file.obj|file.json"
    );
    std::process::exit(2);
}

fn parse_options() -> Options {
    let mut opts = Options {
        width: 800,
        height: 600,
        frames: 60,
        tiles: None,
        output: PathBuf::from("frame.png"),
        stats: false,
        show_edges: false,
        show_vertices: false,
        no_faces: false,
        no_lighting: false,
        no_culling: false,
        input: PathBuf::new(),
    };

    let mut args = std::env::args().skip(1);
    let mut input = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--size" => {
                let value = args.next().unwrap_or_else(|| usage());
                let (w, h) = value.split_once('x').unwrap_or_else(|| usage());
                opts.width = w.parse().unwrap_or_else(|_| usage());
                opts.height = h.parse().unwrap_or_else(|_| usage());
            }
            "--frames" => {
                opts.frames = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| usage());
            }
            "--tiles" => {
                opts.tiles = Some(
                    args.next()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or_else(|| usage()),
                );
            }
            "--output" => opts.output = PathBuf::from(args.next().unwrap_or_else(|| usage())),
            "--stats" => opts.stats = true,
            "--edges" => opts.show_edges = true,
            "--vertices" => opts.show_vertices = true,
            "--no-faces" => opts.no_faces = true,
            "--no-lighting" => opts.no_lighting = true,
            "--no-culling" => opts.no_culling = true,
            _ if arg.starts_with("--") => usage(),
            _ => input = Some(PathBuf::from(arg)),
        }
    }

    opts.input = input.unwrap_or_else(|| usage());
    opts
}

fn load_scene(input: &PathBuf) -> Result<Scene, LoadError> {
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => load_scene_file(input),
        "obj" => {
            let mesh = load_mesh_file(input)?;
            let mut object = Object::new(Arc::new(mesh));
            // Away from the camera, turned to face it.
            object.translation.z = 5.0;
            object.rotation.y = std::f32::consts::PI;
            Ok(Scene::new(vec![object]))
        }
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

fn run(opts: &Options) -> Result<(), LoadError> {
    let mut scene = load_scene(&opts.input)?;
    println!(
        "{}: {} objects, {} vertices, {} triangles",
        opts.input.display(),
        scene.num_objects(),
        scene.num_vertices(),
        scene.num_triangles()
    );

    let mut renderer = match opts.tiles {
        Some(tiles) => Renderer::with_tiles(opts.width, opts.height, tiles),
        None => Renderer::new(opts.width, opts.height),
    };
    renderer.show_edges = opts.show_edges;
    renderer.show_vertices = opts.show_vertices;
    renderer.show_faces = !opts.no_faces;
    renderer.lighting = !opts.no_lighting;
    renderer.backface_culling = !opts.no_culling;
    println!(
        "rendering {} frames at {}x{} with {} tiles",
        opts.frames,
        opts.width,
        opts.height,
        renderer.num_tiles()
    );

    let mut camera = Camera::default();
    let start = Instant::now();

    for _ in 0..opts.frames {
        renderer.draw(&mut scene, &camera);
        renderer.framebuffer_mut().swap_buffers();

        // Slow orbit plus a spin on every object.
        camera.rotate(Vec3::Y, 0.002);
        for object in scene.objects.iter_mut() {
            object.rotation.y += 0.01;
        }
    }

    let elapsed = start.elapsed();
    println!(
        "{} frames in {:.2?} ({:.2} ms/frame)",
        opts.frames,
        elapsed,
        elapsed.as_secs_f64() * 1000.0 / opts.frames.max(1) as f64
    );

    let fb = renderer.framebuffer();
    let pixels: Vec<u8> = fb
        .front()
        .iter()
        .flat_map(|p| [p.r, p.g, p.b, p.a])
        .collect();
    let image = image::RgbaImage::from_raw(fb.width as u32, fb.height as u32, pixels)
        .expect("framebuffer dimensions match the pixel data");
    if let Err(err) = image.save(&opts.output) {
        eprintln!("[WARN] failed to write {}: {}", opts.output.display(), err);
    } else {
        println!("wrote {}", opts.output.display());
    }

    if opts.stats {
        FUNCTION_COUNTERS.snapshot().print_report();
    }

    Ok(())
}

fn main() -> ExitCode {
    let opts = parse_options();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("failed to load {}: {}", opts.input.display(), err);
            ExitCode::FAILURE
        }
    }
}
