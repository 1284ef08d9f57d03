//! Image geometry and intensity mapping
//!
//! This module defines:
//! - ImageGeometry: spacing, origin, direction, and per-axis display transforms
//! - DisplayTransform: how one image axis maps onto a display axis
//! - IntensityMapping: the linear internal-to-native intensity transform
//!
//! Geometry values are copied onto layers verbatim; nothing in this crate
//! computes or resamples geometry.

use crate::types::Vec3d;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Mapping from image axes to one display slice axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTransform {
    /// Permutation of image axes onto display axes
    pub axes: [u8; 3],

    /// Per-display-axis flip
    pub flip: [bool; 3],
}

impl DisplayTransform {
    /// The identity transform (no permutation, no flips)
    pub fn identity() -> Self {
        Self {
            axes: [0, 1, 2],
            flip: [false, false, false],
        }
    }
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Complete geometry shared by all layers once a main image is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageGeometry {
    /// Voxel spacing along each image axis
    pub spacing: Vec3d,

    /// Physical position of the first voxel
    pub origin: Vec3d,

    /// Direction (orientation) matrix, columns are image axis directions
    pub direction: Matrix3<f64>,

    /// One display transform per slicing direction
    pub display_transforms: [DisplayTransform; 3],
}

impl ImageGeometry {
    /// Unit spacing, zero origin, identity direction and transforms
    pub fn identity() -> Self {
        Self {
            spacing: Vec3d::splat(1.0),
            origin: Vec3d::default(),
            direction: Matrix3::identity(),
            display_transforms: [DisplayTransform::identity(); 3],
        }
    }
}

impl Default for ImageGeometry {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linear transform between internal and native intensity units
///
/// Stored on each layer and passed through unchanged; the registry never
/// interprets intensities itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityMapping {
    /// Multiplicative factor applied to internal values
    pub scale: f64,

    /// Additive offset applied after scaling
    pub shift: f64,
}

impl IntensityMapping {
    pub fn new(scale: f64, shift: f64) -> Self {
        Self { scale, shift }
    }

    /// The identity mapping (internal units are native units)
    pub fn identity() -> Self {
        Self { scale: 1.0, shift: 0.0 }
    }

    /// Map an internal value to its native intensity
    pub fn apply(&self, internal: f64) -> f64 {
        internal * self.scale + self.shift
    }

    /// Map a native intensity back to the internal value
    pub fn invert(&self, native: f64) -> f64 {
        (native - self.shift) / self.scale
    }
}

impl Default for IntensityMapping {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_geometry() {
        let g = ImageGeometry::identity();
        assert_eq!(g.spacing, Vec3d::splat(1.0));
        assert_eq!(g.origin, Vec3d::default());
        assert_eq!(g.direction, Matrix3::identity());
        assert_eq!(g.display_transforms[2], DisplayTransform::identity());
    }

    #[test]
    fn test_intensity_mapping_round_trip() {
        let m = IntensityMapping::new(2.0, -100.0);
        let native = m.apply(50.0);
        assert!((native - 0.0).abs() < 1e-12);
        assert!((m.invert(native) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity_mapping_is_default() {
        let m = IntensityMapping::default();
        assert!((m.apply(42.0) - 42.0).abs() < 1e-12);
    }
}
