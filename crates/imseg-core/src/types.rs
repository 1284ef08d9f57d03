//! Common value types for imseg-core
//!
//! Small vector types shared across the crate: double-precision triples for
//! spacing and origin, and unsigned triples for voxel indices and the
//! crosshair position.

use serde::{Deserialize, Serialize};

/// A 3D vector of f64 values (spacing, origin, physical coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// A vector with all components set to the same value
    pub fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }
}

impl From<[f64; 3]> for Vec3d {
    fn from(arr: [f64; 3]) -> Self {
        Self { x: arr[0], y: arr[1], z: arr[2] }
    }
}

impl From<Vec3d> for [f64; 3] {
    fn from(v: Vec3d) -> Self {
        [v.x, v.y, v.z]
    }
}

/// A 3D vector of u32 values (voxel index, crosshair position)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3ui {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Vec3ui {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    /// The index as an ndarray-compatible usize triple
    pub fn to_index(&self) -> [usize; 3] {
        [self.x as usize, self.y as usize, self.z as usize]
    }
}

impl From<[u32; 3]> for Vec3ui {
    fn from(arr: [u32; 3]) -> Self {
        Self { x: arr[0], y: arr[1], z: arr[2] }
    }
}

impl From<Vec3ui> for [u32; 3] {
    fn from(v: Vec3ui) -> Self {
        [v.x, v.y, v.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3d_conversions() {
        let v = Vec3d::from([1.0, 2.0, 3.0]);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(Vec3d::splat(0.5), Vec3d::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_vec3ui_to_index() {
        let v = Vec3ui::new(4, 5, 6);
        assert_eq!(v.to_index(), [4, 5, 6]);
        let arr: [u32; 3] = v.into();
        assert_eq!(arr, [4, 5, 6]);
    }
}
