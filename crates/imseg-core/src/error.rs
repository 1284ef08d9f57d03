//! Error types for imseg-core
//!
//! Every error here signals a caller-side precondition violation (mismatched
//! image dimensions, no main image loaded, an out-of-range move). They are
//! raised before any bucket is touched, so a failed operation never leaves
//! the registry partially mutated.

use crate::volume::Extent;
use thiserror::Error;

/// Errors raised by layer-registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayerStoreError {
    /// A new image's voxel-grid extent disagrees with the main image's
    #[error("image extent {actual} does not match main image extent {expected}")]
    SizeMismatch { expected: Extent, actual: Extent },

    /// The operation requires a loaded, initialized layer that is absent
    #[error("no {what} is loaded")]
    NotLoaded { what: &'static str },

    /// A layer move was requested past its bucket's bounds
    #[error("cannot move layer at position {position} by {shift} in a bucket of {len}")]
    Boundary {
        position: usize,
        shift: i32,
        len: usize,
    },
}

/// Result type alias for registry operations
pub type StoreResult<T> = Result<T, LayerStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mismatch_display() {
        let err = LayerStoreError::SizeMismatch {
            expected: Extent::new(100, 100, 100),
            actual: Extent::new(100, 100, 80),
        };
        assert!(err.to_string().contains("100x100x80"));
        assert!(err.to_string().contains("100x100x100"));
    }

    #[test]
    fn test_not_loaded_display() {
        let err = LayerStoreError::NotLoaded { what: "main image" };
        assert!(err.to_string().contains("main image"));
    }

    #[test]
    fn test_boundary_display() {
        let err = LayerStoreError::Boundary {
            position: 0,
            shift: -1,
            len: 2,
        };
        assert!(err.to_string().contains("-1"));
    }
}
