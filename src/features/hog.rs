//! Histogram of oriented gradients
//!
//! Operates on a row-major grid of intensities in [0, 1]:
//!
//! 1. centred gradients, zero on the outermost rows and columns
//! 2. unsigned orientation in [0, 180) degrees
//! 3. per-cell orientation histograms of the mean gradient magnitude
//! 4. overlapping blocks of cells (stride one cell), L2-Hys normalised
//!
//! The output is flattened block-row, block-column, cell-row, cell-column,
//! orientation.

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Regulariser added to block norms
const L2_HYS_EPS: f64 = 1e-5;

/// Clip threshold applied between the two L2 normalisations
const L2_HYS_CLIP: f64 = 0.2;

/// Descriptor geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HogParams {
    /// Images are resized to `image_size × image_size` before description
    pub image_size: u32,
    /// Number of orientation bins over 180 degrees
    pub orientations: usize,
    /// Cell side in pixels
    pub pixels_per_cell: usize,
    /// Block side in cells
    pub cells_per_block: usize,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            image_size: 64,
            orientations: 9,
            pixels_per_cell: 8,
            cells_per_block: 2,
        }
    }
}

impl HogParams {
    /// Check that the geometry produces at least one block
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0
            || self.orientations == 0
            || self.pixels_per_cell == 0
            || self.cells_per_block == 0
        {
            return Err(SVMError::InvalidParameter(format!(
                "HOG parameters must be positive: {self:?}"
            )));
        }
        if self.cells_per_side() < self.cells_per_block {
            return Err(SVMError::InvalidParameter(format!(
                "{}x{} image holds {} cells of {} px per side, fewer than the {} cells of a block",
                self.image_size,
                self.image_size,
                self.cells_per_side(),
                self.pixels_per_cell,
                self.cells_per_block
            )));
        }
        Ok(())
    }

    /// Whole cells along one side of the resized image
    pub fn cells_per_side(&self) -> usize {
        if self.pixels_per_cell == 0 {
            return 0;
        }
        self.image_size as usize / self.pixels_per_cell
    }

    /// Block positions along one side
    pub fn blocks_per_side(&self) -> usize {
        (self.cells_per_side() + 1).saturating_sub(self.cells_per_block)
    }

    /// Length of the descriptor of one resized image
    pub fn descriptor_len(&self) -> usize {
        let blocks = self.blocks_per_side();
        blocks * blocks * self.cells_per_block * self.cells_per_block * self.orientations
    }
}

/// Compute the HOG descriptor of a `width × height` intensity grid
///
/// Only `orientations`, `pixels_per_cell` and `cells_per_block` are taken from
/// `params`; the grid is used at its own size.
pub fn compute_hog(
    pixels: &[f64],
    width: usize,
    height: usize,
    params: &HogParams,
) -> Result<Vec<f64>> {
    if pixels.len() != width * height {
        return Err(SVMError::DimensionMismatch {
            expected: width * height,
            actual: pixels.len(),
        });
    }
    if params.orientations == 0 || params.pixels_per_cell == 0 || params.cells_per_block == 0 {
        return Err(SVMError::InvalidParameter(format!(
            "HOG parameters must be positive: {params:?}"
        )));
    }

    let cells_x = width / params.pixels_per_cell;
    let cells_y = height / params.pixels_per_cell;
    if cells_x < params.cells_per_block || cells_y < params.cells_per_block {
        return Err(SVMError::InvalidParameter(format!(
            "{width}x{height} grid is too small for {}-cell blocks of {} px cells",
            params.cells_per_block, params.pixels_per_cell
        )));
    }

    let (magnitude, orientation) = gradients(pixels, width, height);
    let histograms = cell_histograms(&magnitude, &orientation, width, cells_x, cells_y, params);
    Ok(normalize_blocks(&histograms, cells_x, cells_y, params))
}

/// Gradient magnitude and unsigned orientation (degrees) per pixel
fn gradients(pixels: &[f64], width: usize, height: usize) -> (Vec<f64>, Vec<f64>) {
    let n = width * height;
    let mut magnitude = vec![0.0; n];
    let mut orientation = vec![0.0; n];

    for y in 0..height {
        for x in 0..width {
            let g_row = if y > 0 && y + 1 < height {
                pixels[(y + 1) * width + x] - pixels[(y - 1) * width + x]
            } else {
                0.0
            };
            let g_col = if x > 0 && x + 1 < width {
                pixels[y * width + x + 1] - pixels[y * width + x - 1]
            } else {
                0.0
            };

            let idx = y * width + x;
            magnitude[idx] = g_row.hypot(g_col);
            orientation[idx] = g_row.atan2(g_col).to_degrees().rem_euclid(180.0);
        }
    }

    (magnitude, orientation)
}

/// Mean magnitude per (cell, orientation bin), laid out `[cell_y][cell_x][bin]`
fn cell_histograms(
    magnitude: &[f64],
    orientation: &[f64],
    width: usize,
    cells_x: usize,
    cells_y: usize,
    params: &HogParams,
) -> Vec<f64> {
    let bins = params.orientations;
    let ppc = params.pixels_per_cell;
    let bin_width = 180.0 / bins as f64;
    let cell_area = (ppc * ppc) as f64;
    let mut histograms = vec![0.0; cells_y * cells_x * bins];

    for cy in 0..cells_y {
        for cx in 0..cells_x {
            let base = (cy * cells_x + cx) * bins;
            for y in cy * ppc..(cy + 1) * ppc {
                for x in cx * ppc..(cx + 1) * ppc {
                    let idx = y * width + x;
                    let bin = ((orientation[idx] / bin_width) as usize).min(bins - 1);
                    histograms[base + bin] += magnitude[idx];
                }
            }
            for value in &mut histograms[base..base + bins] {
                *value /= cell_area;
            }
        }
    }

    histograms
}

/// L2-Hys normalise every block and concatenate
fn normalize_blocks(
    histograms: &[f64],
    cells_x: usize,
    cells_y: usize,
    params: &HogParams,
) -> Vec<f64> {
    let bins = params.orientations;
    let cpb = params.cells_per_block;
    let blocks_x = cells_x - cpb + 1;
    let blocks_y = cells_y - cpb + 1;
    let block_len = cpb * cpb * bins;

    let mut descriptor = Vec::with_capacity(blocks_y * blocks_x * block_len);
    let mut block = Vec::with_capacity(block_len);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            block.clear();
            for cy in by..by + cpb {
                let start = (cy * cells_x + bx) * bins;
                block.extend_from_slice(&histograms[start..start + cpb * bins]);
            }
            l2_hys(&mut block);
            descriptor.extend_from_slice(&block);
        }
    }

    descriptor
}

fn l2_hys(block: &mut [f64]) {
    let eps_sq = L2_HYS_EPS * L2_HYS_EPS;

    let norm = (block.iter().map(|v| v * v).sum::<f64>() + eps_sq).sqrt();
    for v in block.iter_mut() {
        *v = (*v / norm).min(L2_HYS_CLIP);
    }

    let norm = (block.iter().map(|v| v * v).sum::<f64>() + eps_sq).sqrt();
    for v in block.iter_mut() {
        *v /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(size: usize, f: impl Fn(usize, usize) -> f64) -> Vec<f64> {
        let mut pixels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                pixels.push(f(x, y));
            }
        }
        pixels
    }

    #[test]
    fn test_default_descriptor_len() {
        let params = HogParams::default();
        assert_eq!(params.cells_per_side(), 8);
        assert_eq!(params.blocks_per_side(), 7);
        assert_eq!(params.descriptor_len(), 1764);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_constant_image_is_all_zero() {
        let params = HogParams::default();
        let pixels = vec![0.5; 64 * 64];
        let descriptor = compute_hog(&pixels, 64, 64, &params).unwrap();

        assert_eq!(descriptor.len(), 1764);
        assert!(descriptor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_horizontal_ramp_fills_first_bin() {
        let params = HogParams::default();
        let pixels = grid(64, |x, _| x as f64 / 63.0);
        let descriptor = compute_hog(&pixels, 64, 64, &params).unwrap();

        for (i, &v) in descriptor.iter().enumerate() {
            if i % 9 == 0 {
                assert_relative_eq!(v, 0.5, epsilon = 1e-6);
            } else {
                assert_eq!(v, 0.0);
            }
        }
    }

    #[test]
    fn test_vertical_ramp_fills_ninety_degree_bin() {
        let params = HogParams::default();
        let pixels = grid(64, |_, y| y as f64 / 63.0);
        let descriptor = compute_hog(&pixels, 64, 64, &params).unwrap();

        for (i, &v) in descriptor.iter().enumerate() {
            if i % 9 == 4 {
                assert_relative_eq!(v, 0.5, epsilon = 1e-6);
            } else {
                assert_eq!(v, 0.0);
            }
        }
    }

    #[test]
    fn test_block_values_bounded() {
        let params = HogParams::default();
        let pixels = grid(64, |x, y| ((x * 7 + y * 13) % 17) as f64 / 16.0);
        let descriptor = compute_hog(&pixels, 64, 64, &params).unwrap();

        for block in descriptor.chunks(2 * 2 * 9) {
            let norm: f64 = block.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!(norm <= 1.0 + 1e-9);
            assert!(block.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_rectangular_grid() {
        let params = HogParams::default();
        let pixels = vec![0.0; 16 * 32];
        let descriptor = compute_hog(&pixels, 16, 32, &params).unwrap();

        // 2 x 4 cells -> 1 x 3 blocks
        assert_eq!(descriptor.len(), 3 * 2 * 2 * 9);
    }

    #[test]
    fn test_invalid_geometry() {
        let too_big = HogParams {
            cells_per_block: 9,
            ..HogParams::default()
        };
        assert!(matches!(
            too_big.validate(),
            Err(SVMError::InvalidParameter(_))
        ));

        let zero_cell = HogParams {
            pixels_per_cell: 0,
            ..HogParams::default()
        };
        assert!(matches!(
            zero_cell.validate(),
            Err(SVMError::InvalidParameter(_))
        ));

        let pixels = vec![0.0; 8 * 8];
        assert!(matches!(
            compute_hog(&pixels, 8, 8, &HogParams::default()),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let result = compute_hog(&[0.0; 10], 64, 64, &HogParams::default());
        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }
}
