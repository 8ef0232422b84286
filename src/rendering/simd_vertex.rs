/// Batched vertex transformation: every mesh vertex is promoted to a
/// point (w = 1) and multiplied by the MVP matrix, eight at a time with
/// AVX2 when the CPU has it, scalar otherwise.
use glam::{Mat4, Vec3, Vec4};

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

/// Batch size matching the AVX2 register width (8 x f32).
const SIMD_BATCH_SIZE: usize = 8;

/// Transform `points` by `matrix` into `output`. The two slices must
/// have the same length.
#[inline]
pub fn transform_points(matrix: &Mat4, points: &[Vec3], output: &mut [Vec4]) {
    debug_assert_eq!(points.len(), output.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe {
                transform_points_avx2(matrix, points, output);
            }
            return;
        }
    }

    transform_points_scalar(matrix, points, output);
}

#[inline]
fn transform_points_scalar(matrix: &Mat4, points: &[Vec3], output: &mut [Vec4]) {
    for (out, p) in output.iter_mut().zip(points.iter()) {
        *out = *matrix * p.extend(1.0);
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn transform_points_avx2(matrix: &Mat4, points: &[Vec3], output: &mut [Vec4]) {
    let len = points.len();
    let batch_count = len / SIMD_BATCH_SIZE;
    let remainder = len % SIMD_BATCH_SIZE;

    let c0 = matrix.x_axis;
    let c1 = matrix.y_axis;
    let c2 = matrix.z_axis;
    let c3 = matrix.w_axis;

    // Broadcast the matrix once; it is reused for every batch.
    let m0_x = _mm256_set1_ps(c0.x);
    let m0_y = _mm256_set1_ps(c0.y);
    let m0_z = _mm256_set1_ps(c0.z);
    let m0_w = _mm256_set1_ps(c0.w);

    let m1_x = _mm256_set1_ps(c1.x);
    let m1_y = _mm256_set1_ps(c1.y);
    let m1_z = _mm256_set1_ps(c1.z);
    let m1_w = _mm256_set1_ps(c1.w);

    let m2_x = _mm256_set1_ps(c2.x);
    let m2_y = _mm256_set1_ps(c2.y);
    let m2_z = _mm256_set1_ps(c2.z);
    let m2_w = _mm256_set1_ps(c2.w);

    let m3_x = _mm256_set1_ps(c3.x);
    let m3_y = _mm256_set1_ps(c3.y);
    let m3_z = _mm256_set1_ps(c3.z);
    let m3_w = _mm256_set1_ps(c3.w);

    for batch_idx in 0..batch_count {
        let base = batch_idx * SIMD_BATCH_SIZE;

        let mut xs = [0.0f32; SIMD_BATCH_SIZE];
        let mut ys = [0.0f32; SIMD_BATCH_SIZE];
        let mut zs = [0.0f32; SIMD_BATCH_SIZE];
        for i in 0..SIMD_BATCH_SIZE {
            let p = points[base + i];
            xs[i] = p.x;
            ys[i] = p.y;
            zs[i] = p.z;
        }

        let px = _mm256_loadu_ps(xs.as_ptr());
        let py = _mm256_loadu_ps(ys.as_ptr());
        let pz = _mm256_loadu_ps(zs.as_ptr());

        // out = c0*x + c1*y + c2*z + c3 (w = 1).
        let out_x = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(m0_x, px), _mm256_mul_ps(m1_x, py)),
            _mm256_add_ps(_mm256_mul_ps(m2_x, pz), m3_x),
        );
        let out_y = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(m0_y, px), _mm256_mul_ps(m1_y, py)),
            _mm256_add_ps(_mm256_mul_ps(m2_y, pz), m3_y),
        );
        let out_z = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(m0_z, px), _mm256_mul_ps(m1_z, py)),
            _mm256_add_ps(_mm256_mul_ps(m2_z, pz), m3_z),
        );
        let out_w = _mm256_add_ps(
            _mm256_add_ps(_mm256_mul_ps(m0_w, px), _mm256_mul_ps(m1_w, py)),
            _mm256_add_ps(_mm256_mul_ps(m2_w, pz), m3_w),
        );

        let mut rx = [0.0f32; SIMD_BATCH_SIZE];
        let mut ry = [0.0f32; SIMD_BATCH_SIZE];
        let mut rz = [0.0f32; SIMD_BATCH_SIZE];
        let mut rw = [0.0f32; SIMD_BATCH_SIZE];
        _mm256_storeu_ps(rx.as_mut_ptr(), out_x);
        _mm256_storeu_ps(ry.as_mut_ptr(), out_y);
        _mm256_storeu_ps(rz.as_mut_ptr(), out_z);
        _mm256_storeu_ps(rw.as_mut_ptr(), out_w);

        for i in 0..SIMD_BATCH_SIZE {
            output[base + i] = Vec4::new(rx[i], ry[i], rz[i], rw[i]);
        }
    }

    if remainder > 0 {
        let base = batch_count * SIMD_BATCH_SIZE;
        transform_points_scalar(
            matrix,
            &points[base..],
            &mut output[base..],
        );
    }
}
