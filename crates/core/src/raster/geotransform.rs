//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images, `row_rotation` and `col_rotation` are 0 and
/// `pixel_height` is negative. Sentinel-2 10 m bands are north-up with
/// `pixel_width = 10` and `pixel_height = -10`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Create from GDAL-style array [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to GDAL-style array
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Build from GeoTIFF `ModelPixelScale` and `ModelTiepoint` values.
    ///
    /// Returns `None` when either array is too short.
    pub fn from_tiepoint_and_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        Some(Self::new(origin_x, origin_y, scale[0], -scale[1]))
    }

    /// Build from a row-major 4x4 GeoTIFF `ModelTransformation` matrix.
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }
        Some(Self {
            origin_x: matrix[3],
            origin_y: matrix[7],
            pixel_width: matrix[0],
            pixel_height: matrix[5],
            row_rotation: matrix[1],
            col_rotation: matrix[4],
        })
    }

    /// GeoTIFF `(ModelTiepoint, ModelPixelScale)` for north-up transforms.
    ///
    /// Rotated or south-up transforms cannot be expressed this way and
    /// return `None`; use [`GeoTransform::model_transformation`] instead.
    pub fn tiepoint_and_scale(&self) -> Option<([f64; 6], [f64; 3])> {
        let north_up = self.row_rotation.abs() < 1e-10
            && self.col_rotation.abs() < 1e-10
            && self.pixel_height < 0.0;
        if !north_up {
            return None;
        }
        Some((
            [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0],
            [self.pixel_width, -self.pixel_height, 0.0],
        ))
    }

    /// GeoTIFF row-major 4x4 `ModelTransformation` matrix.
    #[rustfmt::skip]
    pub fn model_transformation(&self) -> [f64; 16] {
        [
            self.pixel_width, self.row_rotation, 0.0, self.origin_x,
            self.col_rotation, self.pixel_height, 0.0, self.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gdal_order() {
        let gt = GeoTransform::from_gdal([600000.0, 10.0, 0.0, 5000040.0, 0.0, -10.0]);
        assert_eq!(gt.origin_x, 600000.0);
        assert_eq!(gt.pixel_height, -10.0);
        assert_eq!(gt.to_gdal(), [600000.0, 10.0, 0.0, 5000040.0, 0.0, -10.0]);
    }

    #[test]
    fn test_tiepoint_scale_inverse() {
        let gt = GeoTransform::new(600000.0, 5000040.0, 10.0, -10.0);
        let (tiepoint, scale) = gt.tiepoint_and_scale().unwrap();
        let back = GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale).unwrap();
        assert_eq!(back, gt);
    }

    #[test]
    fn test_tiepoint_with_pixel_offset() {
        // Tiepoint anchored at pixel (2, 3) instead of the corner
        let tiepoint = [2.0, 3.0, 0.0, 120.0, 470.0, 0.0];
        let scale = [10.0, 10.0, 0.0];
        let gt = GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale).unwrap();
        assert_relative_eq!(gt.origin_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(gt.origin_y, 500.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rotated_needs_matrix() {
        let mut gt = GeoTransform::new(0.0, 0.0, 1.0, -1.0);
        gt.row_rotation = 0.5;
        assert!(gt.tiepoint_and_scale().is_none());

        let back = GeoTransform::from_model_transformation(&gt.model_transformation()).unwrap();
        assert_eq!(back, gt);
    }
}
