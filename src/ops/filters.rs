// ============================================================================
// IMAGE FILTERS — Gaussian kernel + localized circular blur
// ============================================================================

use rayon::prelude::*;

use crate::canvas::{BYTES_PER_PIXEL, PixelRect, Surface};

/// Kernel side length used by the blur tool.
pub const DEFAULT_KERNEL_SIZE: usize = 15;
/// Gaussian standard deviation used by the blur tool.
pub const DEFAULT_KERNEL_SIGMA: f32 = 3.0;
/// Maximum deviation of a kernel's weight sum from 1.0.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
//  Kernel
// ---------------------------------------------------------------------------

/// A square, odd-sided matrix of non-negative weights summing to 1.0.
/// Row-major: `weights[y * size + x]`.  Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

/// Build a normalized 2-D isotropic Gaussian kernel.
pub fn build_gaussian_kernel(size: usize, sigma: f32) -> Kernel {
    Kernel::gaussian(size, sigma)
}

impl Default for Kernel {
    fn default() -> Self {
        Self::gaussian(DEFAULT_KERNEL_SIZE, DEFAULT_KERNEL_SIGMA)
    }
}

impl Kernel {
    /// Sample the 2-D Gaussian density at every cell (distances measured
    /// from the kernel centre) and normalize the result.
    ///
    /// `size` must be odd and at least 3, `sigma` finite and positive.
    /// Anything else is a construction bug: debug builds panic, release
    /// builds fall back to the nearest valid parameters.
    pub fn gaussian(size: usize, sigma: f32) -> Self {
        debug_assert!(size >= 3 && size % 2 == 1, "kernel size must be odd and >= 3, got {}", size);
        debug_assert!(sigma.is_finite() && sigma > 0.0, "kernel sigma must be positive, got {}", sigma);

        let (size, sigma) = sanitize_params(size, sigma);
        let two_sigma_sq = 2.0 * sigma as f64 * sigma as f64;
        let center = (size - 1) as f64 / 2.0;

        // Cells are stored as f32 before normalizing; the sum keeps the
        // unrounded f64 densities.
        let mut raw = vec![0.0f32; size * size];
        let mut sum = 0.0f64;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 - center;
                let dy = y as f64 - center;
                let v = (-(dx * dx + dy * dy) / two_sigma_sq).exp()
                    / (std::f64::consts::PI * two_sigma_sq);
                raw[y * size + x] = v as f32;
                sum += v;
            }
        }

        let weights = raw.iter().map(|&v| (v as f64 / sum) as f32).collect();
        let kernel = Self { size, weights };
        debug_assert!(kernel.is_normalized(), "gaussian kernel sum {} is not 1", kernel.sum());
        kernel
    }

    /// Wrap caller-supplied weights.  Returns `None` unless `size` is odd,
    /// `weights` has `size * size` finite non-negative entries, and they sum
    /// to 1.0 within [`NORMALIZATION_TOLERANCE`].
    pub fn from_weights(size: usize, weights: Vec<f32>) -> Option<Self> {
        if size == 0 || size % 2 == 0 || weights.len() != size * size {
            return None;
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return None;
        }
        let kernel = Self { size, weights };
        kernel.is_normalized().then_some(kernel)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from the centre cell to an edge cell.
    pub fn half(&self) -> usize {
        self.size / 2
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn weight(&self, x: usize, y: usize) -> f32 {
        self.weights[y * self.size + x]
    }

    /// Sum of all weights, accumulated in f64.
    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|&w| w as f64).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= NORMALIZATION_TOLERANCE
    }
}

fn sanitize_params(size: usize, sigma: f32) -> (usize, f32) {
    let mut fixed_size = size.max(3);
    if fixed_size % 2 == 0 {
        fixed_size += 1;
    }
    let fixed_sigma = if sigma.is_finite() && sigma > 0.0 { sigma } else { 1.0 };
    if fixed_size != size || fixed_sigma != sigma {
        log_warn!(
            "Gaussian kernel ({}, {}) is invalid, using ({}, {})",
            size, sigma, fixed_size, fixed_sigma
        );
    }
    (fixed_size, fixed_sigma)
}

// ---------------------------------------------------------------------------
//  Circular blur
// ---------------------------------------------------------------------------

/// Geometry of one blur call, in window-local terms.
#[derive(Clone, Copy)]
struct DiskWindow {
    width: usize,
    height: usize,
    /// Blur centre relative to the window's top-left pixel.
    center_x: i64,
    center_y: i64,
    radius_sq: i64,
}

impl DiskWindow {
    #[inline]
    fn contains(&self, lx: usize, ly: usize) -> bool {
        let dx = lx as i64 - self.center_x;
        let dy = ly as i64 - self.center_y;
        dx * dx + dy * dy <= self.radius_sq
    }
}

/// Applies the blur tool: Gaussian smoothing restricted to a disk.
///
/// The engine owns two scratch buffers (the frozen window copy and the
/// output window).  They grow to the largest window seen and are reused, so
/// a stroke of many blur calls does not allocate per call.
pub struct ConvolutionEngine {
    kernel: Kernel,
    parallel: bool,
    window: Vec<u8>,
    output: Vec<u8>,
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new(Kernel::default())
    }
}

impl ConvolutionEngine {
    pub fn new(kernel: Kernel) -> Self {
        debug_assert!(kernel.is_normalized());
        Self {
            kernel,
            parallel: false,
            window: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Compute window rows with rayon.  The call still returns only once the
    /// whole window has been written back.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Bytes currently reserved by the scratch buffers.
    pub fn scratch_capacity(&self) -> usize {
        self.window.capacity() + self.output.capacity()
    }

    /// Blur the disk of `radius` around `(center_x, center_y)`.
    ///
    /// The processed window is the `2 * radius` square starting at
    /// `(center_x - radius, center_y - radius)`, clipped to the surface.
    /// Kernel taps that fall outside the clipped window reuse its edge
    /// pixels.  Every tap reads the pre-blur copy of the window, never a
    /// pixel already rewritten by this call.  Window pixels outside the disk
    /// are written back unchanged.
    ///
    /// Returns the rectangle written, or `None` (surface untouched) when
    /// `radius < 1` or the window misses the surface.
    pub fn apply_circular_blur<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        center_x: i32,
        center_y: i32,
        radius: i32,
    ) -> Option<PixelRect> {
        if radius < 1 {
            return None;
        }
        let r = radius as i64;
        let rect = surface.clip_rect(center_x as i64 - r, center_y as i64 - r, 2 * r, 2 * r)?;

        surface.get_region_into(rect.x as i32, rect.y as i32, rect.width, rect.height, &mut self.window);
        self.output.clear();
        self.output.extend_from_slice(&self.window);

        let geom = DiskWindow {
            width: rect.width as usize,
            height: rect.height as usize,
            center_x: center_x as i64 - rect.x as i64,
            center_y: center_y as i64 - rect.y as i64,
            radius_sq: r * r,
        };
        let stride = geom.width * BYTES_PER_PIXEL;
        let window = &self.window;
        let kernel = &self.kernel;

        if self.parallel {
            self.output
                .par_chunks_mut(stride)
                .enumerate()
                .for_each(|(ly, row_out)| blur_row(window, kernel, geom, ly, row_out));
        } else {
            for (ly, row_out) in self.output.chunks_mut(stride).enumerate() {
                blur_row(window, kernel, geom, ly, row_out);
            }
        }

        surface.put_region(rect.x as i32, rect.y as i32, rect.width, rect.height, &self.output);
        Some(rect)
    }
}

/// Convolve the disk pixels of one window row.  `row_out` starts as a copy
/// of the source row, so pixels outside the disk are already correct.
fn blur_row(src: &[u8], kernel: &Kernel, geom: DiskWindow, ly: usize, row_out: &mut [u8]) {
    let size = kernel.size();
    let half = kernel.half() as isize;
    let weights = kernel.weights();
    let max_x = geom.width as isize - 1;
    let max_y = geom.height as isize - 1;
    let stride = geom.width * BYTES_PER_PIXEL;

    for lx in 0..geom.width {
        if !geom.contains(lx, ly) {
            continue;
        }

        let mut r = 0.0f64;
        let mut g = 0.0f64;
        let mut b = 0.0f64;
        let mut a = 0.0f64;
        for ky in 0..size {
            let sy = (ly as isize + ky as isize - half).clamp(0, max_y) as usize;
            let row_off = sy * stride;
            let krow = &weights[ky * size..(ky + 1) * size];
            for (kx, &kv) in krow.iter().enumerate() {
                let sx = (lx as isize + kx as isize - half).clamp(0, max_x) as usize;
                let idx = row_off + sx * BYTES_PER_PIXEL;
                let kv = kv as f64;
                r += src[idx] as f64 * kv;
                g += src[idx + 1] as f64 * kv;
                b += src[idx + 2] as f64 * kv;
                a += src[idx + 3] as f64 * kv;
            }
        }

        let out = lx * BYTES_PER_PIXEL;
        row_out[out] = to_channel(r);
        row_out[out + 1] = to_channel(g);
        row_out[out + 2] = to_channel(b);
        row_out[out + 3] = to_channel(a);
    }
}

/// Round half to even and saturate, like a clamped 8-bit store.
#[inline]
fn to_channel(v: f64) -> u8 {
    v.round_ties_even().clamp(0.0, 255.0) as u8
}
