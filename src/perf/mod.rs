/// Pipeline instrumentation: thread-safe call counters for the stages
/// of a frame. Counting is compiled in only with the `profiling`
/// feature; without it the macros reduce to nothing.
use std::sync::atomic::{AtomicU64, Ordering};

pub struct FunctionCounters {
    // Projection stage
    pub frames_rendered: AtomicU64,
    pub objects_projected: AtomicU64,
    pub objects_culled: AtomicU64,
    pub triangles_processed: AtomicU64,
    pub triangles_backface_culled: AtomicU64,
    pub triangles_clipped_out: AtomicU64,
    pub triangles_binned: AtomicU64,

    // Rasterization stage
    pub triangles_rasterized: AtomicU64,
    pub pixels_tested: AtomicU64,
    pub pixels_filled: AtomicU64,

    // Framebuffer
    pub framebuffer_clears: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            frames_rendered: AtomicU64::new(0),
            objects_projected: AtomicU64::new(0),
            objects_culled: AtomicU64::new(0),
            triangles_processed: AtomicU64::new(0),
            triangles_backface_culled: AtomicU64::new(0),
            triangles_clipped_out: AtomicU64::new(0),
            triangles_binned: AtomicU64::new(0),
            triangles_rasterized: AtomicU64::new(0),
            pixels_tested: AtomicU64::new(0),
            pixels_filled: AtomicU64::new(0),
            framebuffer_clears: AtomicU64::new(0),
        }
    }

    pub fn reset(&self) {
        self.frames_rendered.store(0, Ordering::Relaxed);
        self.objects_projected.store(0, Ordering::Relaxed);
        self.objects_culled.store(0, Ordering::Relaxed);
        self.triangles_processed.store(0, Ordering::Relaxed);
        self.triangles_backface_culled.store(0, Ordering::Relaxed);
        self.triangles_clipped_out.store(0, Ordering::Relaxed);
        self.triangles_binned.store(0, Ordering::Relaxed);
        self.triangles_rasterized.store(0, Ordering::Relaxed);
        self.pixels_tested.store(0, Ordering::Relaxed);
        self.pixels_filled.store(0, Ordering::Relaxed);
        self.framebuffer_clears.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            objects_projected: self.objects_projected.load(Ordering::Relaxed),
            objects_culled: self.objects_culled.load(Ordering::Relaxed),
            triangles_processed: self.triangles_processed.load(Ordering::Relaxed),
            triangles_backface_culled: self.triangles_backface_culled.load(Ordering::Relaxed),
            triangles_clipped_out: self.triangles_clipped_out.load(Ordering::Relaxed),
            triangles_binned: self.triangles_binned.load(Ordering::Relaxed),
            triangles_rasterized: self.triangles_rasterized.load(Ordering::Relaxed),
            pixels_tested: self.pixels_tested.load(Ordering::Relaxed),
            pixels_filled: self.pixels_filled.load(Ordering::Relaxed),
            framebuffer_clears: self.framebuffer_clears.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy)]
pub struct CounterSnapshot {
    pub frames_rendered: u64,
    pub objects_projected: u64,
    pub objects_culled: u64,
    pub triangles_processed: u64,
    pub triangles_backface_culled: u64,
    pub triangles_clipped_out: u64,
    pub triangles_binned: u64,
    pub triangles_rasterized: u64,
    pub pixels_tested: u64,
    pub pixels_filled: u64,
    pub framebuffer_clears: u64,
}

impl CounterSnapshot {
    pub fn print_report(&self) {
        println!("\n=== Render Counters ===");
        println!("\nFrames:");
        println!("  frames rendered:       {:12}", self.frames_rendered);
        println!("  framebuffer clears:    {:12}", self.framebuffer_clears);

        println!("\nProjection:");
        println!("  objects projected:     {:12}", self.objects_projected);
        println!("  objects culled:        {:12}", self.objects_culled);
        println!("  faces processed:       {:12}", self.triangles_processed);
        println!("  backface culled:       {:12}", self.triangles_backface_culled);
        println!("  clipped away:          {:12}", self.triangles_clipped_out);
        println!("  triangles binned:      {:12}", self.triangles_binned);

        println!("\nRasterization:");
        println!("  triangles rasterized:  {:12}", self.triangles_rasterized);
        println!("  pixels tested:         {:12}", self.pixels_tested);
        println!("  pixels filled:         {:12}", self.pixels_filled);
        if self.pixels_tested > 0 {
            let fill_rate = self.pixels_filled as f64 / self.pixels_tested as f64 * 100.0;
            println!("  fill rate:             {:11.2}%", fill_rate);
        }
        println!();
    }
}

/// Global counters instance.
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Increment a counter by one (no-op without the `profiling` feature).
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        #[cfg(not(feature = "profiling"))]
        {
            let _ = &$counter;
        }
    };
}

/// Add a value to a counter (no-op without the `profiling` feature).
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
        #[cfg(not(feature = "profiling"))]
        {
            let _ = (&$counter, $value);
        }
    };
}
