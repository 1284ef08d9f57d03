//! imseg-core - Layer registry for the imseg segmentation workbench
//!
//! This crate holds the layered image state of one interactive segmentation
//! session: one main anatomical image, any number of overlays, one
//! segmentation label image, and derived (snap) images, all sharing the main
//! image's voxel grid and geometry.
//!
//! # Key Components
//!
//! - **LayerStore**: role-keyed registry of layers; enforces per-role
//!   cardinality and geometry consistency, and emits one notification per
//!   structural change
//! - **LayerCursor**: restartable, role-filtered traversal across the
//!   registry's buckets; callers only ever observe real layers or the end
//! - **Layer**: one loaded image plus opacity, intensity mapping, geometry,
//!   and a stable unique identity
//! - **ImageGeometry**: spacing, origin, direction, and per-axis display
//!   transforms, copied uniformly onto every layer
//! - **DefaultBehaviorSettings**: serde-backed defaults for new sessions
//!
//! # Concurrency
//!
//! Everything here is single-threaded and synchronous. Cursors hold a shared
//! borrow of the store, so structural mutation while a cursor is live is
//! rejected at compile time.

pub mod cursor;
pub mod error;
pub mod event;
pub mod geometry;
pub mod layer;
pub mod settings;
pub mod store;
pub mod types;
pub mod volume;

pub use cursor::{LayerCursor, Layers};
pub use error::{LayerStoreError, StoreResult};
pub use event::{EventQueue, LayerChange, LayerEvent, LayerEventSink};
pub use geometry::{DisplayTransform, ImageGeometry, IntensityMapping};
pub use layer::{Layer, LayerId, LayerRole, RoleFilter, ScalarRepKind, ScalarView, VectorImage};
pub use settings::{DefaultBehaviorSettings, OverlayLayout};
pub use store::{FoundLayer, LayerStore};
pub use types::{Vec3d, Vec3ui};
pub use volume::{Extent, ImageVolume, LabelVolume, VectorImageVolume};
