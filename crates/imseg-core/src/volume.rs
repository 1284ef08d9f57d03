//! Dense voxel grids
//!
//! Opaque image payloads handed to the registry by loaders and filters:
//! - ImageVolume: scalar anatomical data
//! - VectorImageVolume: multi-component data (component-major)
//! - LabelVolume: segmentation labels
//!
//! The registry copies geometry onto these and compares extents; it never
//! looks at voxel content beyond the label accessors below.

use crate::types::Vec3ui;
use ndarray::{Array3, Array4};
use std::fmt;

/// Voxel-grid extent along the three image axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent(pub [usize; 3]);

impl Extent {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self([nx, ny, nz])
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.0[0] * self.0[1] * self.0[2]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a voxel index falls inside the grid
    pub fn contains(&self, index: Vec3ui) -> bool {
        let idx = index.to_index();
        idx[0] < self.0[0] && idx[1] < self.0[1] && idx[2] < self.0[2]
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.0[0], self.0[1], self.0[2])
    }
}

/// A scalar-valued anatomical image
#[derive(Debug, Clone)]
pub struct ImageVolume {
    data: Array3<f32>,
}

impl ImageVolume {
    /// An all-zero volume of the given extent
    pub fn zeros(extent: Extent) -> Self {
        let [nx, ny, nz] = extent.0;
        Self {
            data: Array3::zeros((nx, ny, nz)),
        }
    }

    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    pub fn extent(&self) -> Extent {
        let s = self.data.shape();
        Extent([s[0], s[1], s[2]])
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

/// A multi-component image, component-major storage
#[derive(Debug, Clone)]
pub struct VectorImageVolume {
    data: Array4<f32>,
}

impl VectorImageVolume {
    /// An all-zero volume with `components` values per voxel
    pub fn zeros(components: usize, extent: Extent) -> Self {
        let [nx, ny, nz] = extent.0;
        Self {
            data: Array4::zeros((components, nx, ny, nz)),
        }
    }

    pub fn from_array(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// Number of components per voxel
    pub fn components(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn extent(&self) -> Extent {
        let s = self.data.shape();
        Extent([s[1], s[2], s[3]])
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }
}

/// A segmentation label image
#[derive(Debug, Clone)]
pub struct LabelVolume {
    data: Array3<u16>,
}

impl LabelVolume {
    /// An all-clear (label 0) volume of the given extent
    pub fn zeros(extent: Extent) -> Self {
        let [nx, ny, nz] = extent.0;
        Self {
            data: Array3::zeros((nx, ny, nz)),
        }
    }

    pub fn from_array(data: Array3<u16>) -> Self {
        Self { data }
    }

    pub fn extent(&self) -> Extent {
        let s = self.data.shape();
        Extent([s[0], s[1], s[2]])
    }

    /// Label at a voxel index; the index must be inside the extent
    pub fn voxel(&self, index: Vec3ui) -> u16 {
        self.data[index.to_index()]
    }

    /// Overwrite the label at a voxel index; the index must be inside the extent
    pub fn set_voxel(&mut self, index: Vec3ui, label: u16) {
        self.data[index.to_index()] = label;
    }

    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_contains() {
        let e = Extent::new(4, 5, 6);
        assert!(e.contains(Vec3ui::new(3, 4, 5)));
        assert!(!e.contains(Vec3ui::new(4, 0, 0)));
        assert_eq!(e.len(), 120);
        assert_eq!(e.to_string(), "4x5x6");
    }

    #[test]
    fn test_image_volume_extent() {
        let v = ImageVolume::zeros(Extent::new(2, 3, 4));
        assert_eq!(v.extent(), Extent::new(2, 3, 4));
        assert_eq!(v.data().len(), 24);
    }

    #[test]
    fn test_vector_volume_components() {
        let v = VectorImageVolume::zeros(3, Extent::new(2, 2, 2));
        assert_eq!(v.components(), 3);
        assert_eq!(v.extent(), Extent::new(2, 2, 2));
    }

    #[test]
    fn test_label_voxel_access() {
        let mut v = LabelVolume::zeros(Extent::new(3, 3, 3));
        assert_eq!(v.voxel(Vec3ui::new(1, 1, 1)), 0);
        v.set_voxel(Vec3ui::new(1, 1, 1), 7);
        assert_eq!(v.voxel(Vec3ui::new(1, 1, 1)), 7);
        assert_eq!(v.voxel(Vec3ui::new(0, 0, 0)), 0);
    }
}
