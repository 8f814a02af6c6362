//! Template correlation over every placement of a template inside a
//! destination image.
//!
//! The cross term `sum(D * T)` for all placements comes from one FFT product
//! per template. Window sums of the destination come from integral images.
//! Both destination-side pieces are computed once in [`Correlator::new`] and
//! reused for every template, so scanning many rotations of a source only
//! pays one forward and one inverse transform per template.
//!
//! Each [`MatchMethod`] is then a cheap per-placement formula over the shared
//! terms:
//!
//! | method         | score                                                    |
//! |----------------|----------------------------------------------------------|
//! | `SqDiff`       | `Σ(D - T)²`                                              |
//! | `SqDiffNormed` | `Σ(D - T)² / sqrt(ΣD² ΣT²)`                              |
//! | `CCorr`        | `Σ D T`                                                  |
//! | `CCorrNormed`  | `Σ D T / sqrt(ΣD² ΣT²)`                                  |
//! | `CCoeff`       | `Σ (D - mean D)(T - mean T)`                             |
//! | `CCoeffNormed` | `CCoeff / sqrt(Σ(D - mean D)² Σ(T - mean T)²)`           |
//!
//! Normalized scores with a zero denominator are 0, or 1 for `SqDiffNormed`.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use common::Buffer2;
use glam::IVec2;
use rustfft::{Fft, FftPlanner, num_complex::Complex};

use crate::matcher::MatchMethod;
use crate::raster::GrayImage;

/// Score map with one value per template placement.
pub type SimilarityMap = Buffer2<f32>;

/// Smallest `m >= n` whose only prime factors are 2, 3 and 5.
pub fn fft_friendly_size(n: usize) -> usize {
    let mut candidate = n.max(1);
    loop {
        let mut rest = candidate;
        for factor in [2, 3, 5] {
            while rest % factor == 0 {
                rest /= factor;
            }
        }
        if rest == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

// ============================================================================
// 2-D FFT
// ============================================================================

/// Row-column 2-D transform over a `width x height` grid.
///
/// Spectra are kept column-major (transposed) between `forward` and
/// `inverse`; only element-wise products happen in between.
struct Fft2 {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2 {
    fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            col_forward: planner.plan_fft_forward(height),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.width * self.height
    }

    /// Zero-pads `image` to the transform size and returns its spectrum.
    fn forward(&self, image: &GrayImage) -> Vec<Complex<f64>> {
        let mut data = vec![Complex::new(0.0, 0.0); self.len()];
        for y in 0..image.height() {
            let dst = &mut data[y * self.width..y * self.width + image.width()];
            for (d, &v) in dst.iter_mut().zip(image.row(y)) {
                d.re = v as f64;
            }
        }

        // rustfft processes every `len`-sized chunk of the buffer.
        self.row_forward.process(&mut data);
        let mut data = transpose(&data, self.height, self.width);
        self.col_forward.process(&mut data);
        data
    }

    /// Real part of the inverse transform, row-major.
    fn inverse(&self, mut spectrum: Vec<Complex<f64>>) -> Vec<f64> {
        self.col_inverse.process(&mut spectrum);
        let mut data = transpose(&spectrum, self.width, self.height);
        self.row_inverse.process(&mut data);

        let norm = 1.0 / self.len() as f64;
        data.iter().map(|c| c.re * norm).collect()
    }
}

/// Transposes a row-major `rows x cols` grid.
fn transpose<T: Copy>(data: &[T], rows: usize, cols: usize) -> Vec<T> {
    debug_assert_eq!(data.len(), rows * cols);
    let mut out = Vec::with_capacity(data.len());
    for c in 0..cols {
        for r in 0..rows {
            out.push(data[r * cols + c]);
        }
    }
    out
}

// ============================================================================
// Integral images
// ============================================================================

/// Summed-area tables of values and squared values, with a zero first row
/// and column.
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let stride = image.width() + 1;
        let rows = image.height() + 1;
        let mut sum = vec![0u64; stride * rows];
        let mut sum_sq = vec![0u64; stride * rows];

        for y in 0..image.height() {
            let mut row_sum = 0u64;
            let mut row_sum_sq = 0u64;
            for (x, &v) in image.row(y).iter().enumerate() {
                let v = v as u64;
                row_sum += v;
                row_sum_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row_sum;
                sum_sq[i] = sum_sq[i - stride] + row_sum_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// `(Σv, Σv²)` over the `width x height` window with top-left `(x, y)`.
    #[inline]
    fn window(&self, x: usize, y: usize, width: usize, height: usize) -> (u64, u64) {
        let a = y * self.stride + x;
        let b = a + width;
        let c = a + height * self.stride;
        let d = c + width;
        (
            self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c],
        )
    }
}

// ============================================================================
// Correlator
// ============================================================================

/// Destination-side state shared by every template matched against one
/// destination image.
pub struct Correlator {
    width: usize,
    height: usize,
    fft: Fft2,
    spectrum: Vec<Complex<f64>>,
    integral: Integral,
}

impl Correlator {
    pub fn new(destination: &GrayImage) -> Self {
        let width = destination.width();
        let height = destination.height();
        // Placements never wrap as long as the transform covers the destination.
        let fft = Fft2::new(fft_friendly_size(width), fft_friendly_size(height));
        let spectrum = fft.forward(destination);

        Self {
            width,
            height,
            fft,
            spectrum,
            integral: Integral::new(destination),
        }
    }

    /// Whether `template` has at least one placement inside the destination.
    #[inline]
    pub fn fits(&self, template: &GrayImage) -> bool {
        !template.is_empty() && template.width() <= self.width && template.height() <= self.height
    }

    /// Computes the per-placement terms every method is derived from.
    ///
    /// # Panics
    ///
    /// Panics if the template is empty or larger than the destination.
    pub fn terms(&self, template: &GrayImage) -> CorrelationTerms {
        assert!(
            self.fits(template),
            "template {}x{} does not fit destination {}x{}",
            template.width(),
            template.height(),
            self.width,
            self.height
        );

        let tw = template.width();
        let th = template.height();
        let map_width = self.width - tw + 1;
        let map_height = self.height - th + 1;

        let template_spectrum = self.fft.forward(template);
        let product: Vec<Complex<f64>> = self
            .spectrum
            .iter()
            .zip(&template_spectrum)
            .map(|(&d, &t)| d * t.conj())
            .collect();
        let full = self.fft.inverse(product);

        let mut cross = Vec::with_capacity(map_width * map_height);
        let mut window_sum = Vec::with_capacity(map_width * map_height);
        let mut window_sum_sq = Vec::with_capacity(map_width * map_height);
        for y in 0..map_height {
            let row = &full[y * self.fft.width..y * self.fft.width + map_width];
            cross.extend_from_slice(row);
            for x in 0..map_width {
                let (s, s2) = self.integral.window(x, y, tw, th);
                window_sum.push(s);
                window_sum_sq.push(s2);
            }
        }

        let (template_sum, template_sum_sq) = template.iter().fold((0u64, 0u64), |(s, s2), &v| {
            let v = v as u64;
            (s + v, s2 + v * v)
        });

        CorrelationTerms {
            width: map_width,
            height: map_height,
            area: (tw * th) as u64,
            cross,
            window_sum,
            window_sum_sq,
            template_sum,
            template_sum_sq,
        }
    }
}

/// Sums shared by all methods for one template against one destination.
pub struct CorrelationTerms {
    width: usize,
    height: usize,
    area: u64,
    cross: Vec<f64>,
    window_sum: Vec<u64>,
    window_sum_sq: Vec<u64>,
    template_sum: u64,
    template_sum_sq: u64,
}

impl CorrelationTerms {
    pub fn similarity_map(&self, method: MatchMethod) -> SimilarityMap {
        let n = self.area as f64;
        let n_wide = self.area as i128;
        let t_sum = self.template_sum as f64;
        let t_sum_sq = self.template_sum_sq as f64;
        // n * Σ(T - mean T)², exact.
        let t_var_n =
            n_wide * self.template_sum_sq as i128 - (self.template_sum as i128).pow(2);

        let pixels = (0..self.cross.len())
            .map(|i| {
                let cross = self.cross[i];
                let d_sum = self.window_sum[i];
                let d_sum_sq = self.window_sum_sq[i];

                let score = match method {
                    MatchMethod::SqDiff => (d_sum_sq as f64 - 2.0 * cross + t_sum_sq).max(0.0),
                    MatchMethod::SqDiffNormed => {
                        if d_sum_sq == 0 || self.template_sum_sq == 0 {
                            1.0
                        } else {
                            let denom = (d_sum_sq as f64 * t_sum_sq).sqrt();
                            ((d_sum_sq as f64 - 2.0 * cross + t_sum_sq) / denom).clamp(0.0, 1.0)
                        }
                    }
                    MatchMethod::CCorr => cross,
                    MatchMethod::CCorrNormed => {
                        if d_sum_sq == 0 || self.template_sum_sq == 0 {
                            0.0
                        } else {
                            let denom = (d_sum_sq as f64 * t_sum_sq).sqrt();
                            (cross / denom).clamp(-1.0, 1.0)
                        }
                    }
                    MatchMethod::CCoeff => cross - d_sum as f64 * t_sum / n,
                    MatchMethod::CCoeffNormed => {
                        let d_var_n = n_wide * d_sum_sq as i128 - (d_sum as i128).pow(2);
                        if d_var_n <= 0 || t_var_n <= 0 {
                            0.0
                        } else {
                            let numerator = n * cross - d_sum as f64 * t_sum;
                            let denom = (d_var_n as f64).sqrt() * (t_var_n as f64).sqrt();
                            (numerator / denom).clamp(-1.0, 1.0)
                        }
                    }
                };
                score as f32
            })
            .collect();

        Buffer2::new(self.width, self.height, pixels)
    }
}

// ============================================================================
// Extrema
// ============================================================================

/// Smallest and largest map values with their first row-major positions.
/// Locations are `(x = column, y = row)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    pub min_value: f32,
    pub max_value: f32,
    pub min_loc: IVec2,
    pub max_loc: IVec2,
}

/// Scans `map` for its extrema. NaN cells are ignored. `None` for an empty map.
pub fn min_max_loc(map: &SimilarityMap) -> Option<Extrema> {
    let width = map.width();
    let mut extrema: Option<Extrema> = None;

    for (i, &v) in map.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let loc = IVec2::new((i % width) as i32, (i / width) as i32);
        match extrema.as_mut() {
            None => {
                extrema = Some(Extrema {
                    min_value: v,
                    max_value: v,
                    min_loc: loc,
                    max_loc: loc,
                })
            }
            Some(e) => {
                if v < e.min_value {
                    e.min_value = v;
                    e.min_loc = loc;
                }
                if v > e.max_value {
                    e.max_value = v;
                    e.max_loc = loc;
                }
            }
        }
    }

    extrema
}
