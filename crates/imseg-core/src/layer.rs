//! Layers, roles, and role filters
//!
//! This module defines:
//! - LayerRole: the functional category a layer occupies in the registry
//! - RoleFilter: a bitmask of roles for filtered traversal
//! - LayerId: the process-wide-unique identity of a layer or sub-view
//! - Layer: one loaded image plus its display and geometry metadata
//! - ScalarView: a scalar representation derived from a vector layer
//!
//! A layer's payload is a closed set of variants; scalar- or vector-specific
//! access goes through `as_scalar` / `as_vector` rather than downcasting.

use crate::geometry::{DisplayTransform, ImageGeometry, IntensityMapping};
use crate::types::Vec3ui;
use crate::volume::{Extent, ImageVolume, LabelVolume, VectorImageVolume};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use uuid::Uuid;

/// Functional category of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerRole {
    /// The main anatomical image
    Main,

    /// An additional anatomical image shown on top of the main image
    Overlay,

    /// The segmentation label image
    Label,

    /// A derived image produced by the active segmentation pipeline
    Snap,
}

impl LayerRole {
    /// Stable enumeration order used by the cursor
    pub const ORDER: [LayerRole; 4] = [
        LayerRole::Main,
        LayerRole::Overlay,
        LayerRole::Label,
        LayerRole::Snap,
    ];

    /// Index of this role in the enumeration order
    pub fn index(&self) -> usize {
        match self {
            LayerRole::Main => 0,
            LayerRole::Overlay => 1,
            LayerRole::Label => 2,
            LayerRole::Snap => 3,
        }
    }

    /// Bitmask with only this role set
    pub fn mask(&self) -> u8 {
        1 << self.index()
    }

    /// Whether this role holds exactly one slot
    pub fn is_single_slot(&self) -> bool {
        matches!(self, LayerRole::Main | LayerRole::Label)
    }

    /// Human-readable name used in diagnostics
    pub fn display_name(&self) -> &'static str {
        ROLE_DISPLAY_NAMES[self]
    }
}

lazy_static! {
    static ref ROLE_DISPLAY_NAMES: HashMap<LayerRole, &'static str> = {
        let mut m = HashMap::new();
        m.insert(LayerRole::Main, "Main Image");
        m.insert(LayerRole::Overlay, "Overlay");
        m.insert(LayerRole::Label, "Segmentation");
        m.insert(LayerRole::Snap, "Snap Image");
        m
    };
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A combinable set of roles used to filter traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFilter(u8);

impl RoleFilter {
    /// Every role
    pub const ALL: RoleFilter = RoleFilter(0b1111);

    /// No roles; a cursor with this filter is immediately at end
    pub fn empty() -> Self {
        RoleFilter(0)
    }

    /// A filter matching a single role
    pub fn only(role: LayerRole) -> Self {
        RoleFilter(role.mask())
    }

    /// This filter widened by one more role
    pub fn with(self, role: LayerRole) -> Self {
        RoleFilter(self.0 | role.mask())
    }

    /// Whether the filter admits the given role
    pub fn includes(&self, role: LayerRole) -> bool {
        self.0 & role.mask() != 0
    }
}

impl From<LayerRole> for RoleFilter {
    fn from(role: LayerRole) -> Self {
        RoleFilter::only(role)
    }
}

impl BitOr for RoleFilter {
    type Output = RoleFilter;

    fn bitor(self, rhs: RoleFilter) -> RoleFilter {
        RoleFilter(self.0 | rhs.0)
    }
}

impl Default for RoleFilter {
    fn default() -> Self {
        RoleFilter::ALL
    }
}

/// Process-wide-unique identity of a layer or scalar sub-view
///
/// Assigned once at construction and compared, never reassigned; identity is
/// stable for the lifetime of the layer even when its position moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// A fresh unique identifier
    pub fn new() -> Self {
        LayerId(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kinds of scalar representation a vector layer exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarRepKind {
    /// One component of the vector
    Component,

    /// Per-voxel vector magnitude
    Magnitude,

    /// Per-voxel component maximum
    Max,

    /// Per-voxel component average
    Average,
}

impl ScalarRepKind {
    pub const ALL: [ScalarRepKind; 4] = [
        ScalarRepKind::Component,
        ScalarRepKind::Magnitude,
        ScalarRepKind::Max,
        ScalarRepKind::Average,
    ];
}

/// A scalar representation derived from a vector layer
///
/// Reachable only through the owning layer; never stored in a role bucket.
#[derive(Debug, Clone)]
pub struct ScalarView {
    id: LayerId,
    kind: ScalarRepKind,
    component: usize,
}

impl ScalarView {
    fn new(kind: ScalarRepKind, component: usize) -> Self {
        Self {
            id: LayerId::new(),
            kind,
            component,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn kind(&self) -> ScalarRepKind {
        self.kind
    }

    /// Component index; zero for the derived (non-component) kinds
    pub fn component(&self) -> usize {
        self.component
    }
}

/// A vector-valued payload plus its scalar representations
#[derive(Debug, Clone)]
pub struct VectorImage {
    volume: VectorImageVolume,
    components: Vec<ScalarView>,
    magnitude: ScalarView,
    max: ScalarView,
    average: ScalarView,
}

impl VectorImage {
    pub fn new(volume: VectorImageVolume) -> Self {
        let components = (0..volume.components())
            .map(|k| ScalarView::new(ScalarRepKind::Component, k))
            .collect();
        Self {
            volume,
            components,
            magnitude: ScalarView::new(ScalarRepKind::Magnitude, 0),
            max: ScalarView::new(ScalarRepKind::Max, 0),
            average: ScalarView::new(ScalarRepKind::Average, 0),
        }
    }

    pub fn volume(&self) -> &VectorImageVolume {
        &self.volume
    }

    pub fn components(&self) -> usize {
        self.volume.components()
    }

    /// Look up one scalar representation; `index` is only meaningful for
    /// `Component` and must be zero for the derived kinds
    pub fn scalar_representation(&self, kind: ScalarRepKind, index: usize) -> Option<&ScalarView> {
        match kind {
            ScalarRepKind::Component => self.components.get(index),
            ScalarRepKind::Magnitude if index == 0 => Some(&self.magnitude),
            ScalarRepKind::Max if index == 0 => Some(&self.max),
            ScalarRepKind::Average if index == 0 => Some(&self.average),
            _ => None,
        }
    }

    /// Iterate every scalar representation, components first
    pub fn scalar_representations(&self) -> impl Iterator<Item = &ScalarView> {
        self.components
            .iter()
            .chain([&self.magnitude, &self.max, &self.average])
    }
}

/// The image payload carried by a layer
#[derive(Debug, Clone)]
pub enum LayerKind {
    /// Scalar anatomical data
    Scalar(ImageVolume),

    /// Multi-component data with derived scalar views
    Vector(VectorImage),

    /// Segmentation labels
    Label(LabelVolume),
}

/// One loaded image layer plus its display and geometry metadata
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    nickname: String,
    alpha: f32,
    mapping: IntensityMapping,
    geometry: Option<ImageGeometry>,
    crosshair: Vec3ui,
    initialized: bool,
    kind: LayerKind,
}

impl Layer {
    /// A scalar layer wrapping an anatomical volume
    pub fn scalar(volume: ImageVolume, mapping: IntensityMapping) -> Self {
        Self::with_kind(LayerKind::Scalar(volume), mapping)
    }

    /// A vector layer; scalar representations are created alongside it
    pub fn vector(volume: VectorImageVolume, mapping: IntensityMapping) -> Self {
        Self::with_kind(LayerKind::Vector(VectorImage::new(volume)), mapping)
    }

    /// A label layer; label images carry no intensity mapping
    pub fn label(volume: LabelVolume) -> Self {
        Self::with_kind(LayerKind::Label(volume), IntensityMapping::identity())
    }

    fn with_kind(kind: LayerKind, mapping: IntensityMapping) -> Self {
        Self {
            id: LayerId::new(),
            nickname: String::new(),
            alpha: 1.0,
            mapping,
            geometry: None,
            crosshair: Vec3ui::default(),
            initialized: true,
            kind,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    pub fn mapping(&self) -> &IntensityMapping {
        &self.mapping
    }

    pub fn geometry(&self) -> Option<&ImageGeometry> {
        self.geometry.as_ref()
    }

    /// Current crosshair (slice) position in voxel coordinates
    pub fn crosshair(&self) -> Vec3ui {
        self.crosshair
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Voxel-grid extent of the payload
    pub fn extent(&self) -> Extent {
        match &self.kind {
            LayerKind::Scalar(v) => v.extent(),
            LayerKind::Vector(v) => v.volume().extent(),
            LayerKind::Label(v) => v.extent(),
        }
    }

    /// Scalar payload, if this layer holds one
    pub fn as_scalar(&self) -> Option<&ImageVolume> {
        match &self.kind {
            LayerKind::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Vector payload, if this layer holds one
    pub fn as_vector(&self) -> Option<&VectorImage> {
        match &self.kind {
            LayerKind::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Label payload, if this layer holds one
    pub fn as_label(&self) -> Option<&LabelVolume> {
        match &self.kind {
            LayerKind::Label(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_label_mut(&mut self) -> Option<&mut LabelVolume> {
        match &mut self.kind {
            LayerKind::Label(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn set_crosshair(&mut self, position: Vec3ui) {
        self.crosshair = position;
    }

    pub(crate) fn set_geometry(&mut self, geometry: ImageGeometry) {
        self.geometry = Some(geometry);
    }

    /// Copy spacing, origin, and direction from another geometry, leaving
    /// this layer's display transforms alone
    pub(crate) fn copy_grid_geometry(&mut self, source: &ImageGeometry) {
        let g = self.geometry.get_or_insert_with(ImageGeometry::identity);
        g.spacing = source.spacing;
        g.origin = source.origin;
        g.direction = source.direction;
    }

    /// Copy spacing and origin only, as segmentation replacement does
    pub(crate) fn copy_spacing_origin(&mut self, source: &ImageGeometry) {
        let g = self.geometry.get_or_insert_with(ImageGeometry::identity);
        g.spacing = source.spacing;
        g.origin = source.origin;
    }

    pub(crate) fn set_display_transforms(&mut self, transforms: [DisplayTransform; 3]) {
        let g = self.geometry.get_or_insert_with(ImageGeometry::identity);
        g.display_transforms = transforms;
    }

    /// Swap the label payload in place, keeping identity and metadata
    pub(crate) fn replace_label_volume(&mut self, volume: LabelVolume) {
        self.kind = LayerKind::Label(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Extent;

    #[test]
    fn test_role_order_and_masks() {
        for (i, role) in LayerRole::ORDER.iter().enumerate() {
            assert_eq!(role.index(), i);
            assert_eq!(role.mask(), 1 << i);
        }
        assert!(LayerRole::Main.is_single_slot());
        assert!(LayerRole::Label.is_single_slot());
        assert!(!LayerRole::Overlay.is_single_slot());
    }

    #[test]
    fn test_role_filter_composition() {
        let f = RoleFilter::only(LayerRole::Main) | RoleFilter::only(LayerRole::Overlay);
        assert!(f.includes(LayerRole::Main));
        assert!(f.includes(LayerRole::Overlay));
        assert!(!f.includes(LayerRole::Label));
        assert!(RoleFilter::ALL.includes(LayerRole::Snap));
        assert!(!RoleFilter::empty().includes(LayerRole::Main));
    }

    #[test]
    fn test_role_display_names() {
        assert_eq!(LayerRole::Main.to_string(), "Main Image");
        assert_eq!(LayerRole::Label.to_string(), "Segmentation");
    }

    #[test]
    fn test_layer_ids_are_unique() {
        let a = Layer::scalar(ImageVolume::zeros(Extent::new(2, 2, 2)), IntensityMapping::identity());
        let b = Layer::scalar(ImageVolume::zeros(Extent::new(2, 2, 2)), IntensityMapping::identity());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_capability_narrowing() {
        let scalar = Layer::scalar(ImageVolume::zeros(Extent::new(2, 2, 2)), IntensityMapping::identity());
        assert!(scalar.as_scalar().is_some());
        assert!(scalar.as_vector().is_none());
        assert!(scalar.as_label().is_none());

        let label = Layer::label(LabelVolume::zeros(Extent::new(2, 2, 2)));
        assert!(label.as_label().is_some());
        assert!(label.as_scalar().is_none());
    }

    #[test]
    fn test_vector_scalar_representations() {
        let layer = Layer::vector(
            VectorImageVolume::zeros(3, Extent::new(2, 2, 2)),
            IntensityMapping::identity(),
        );
        let vec = layer.as_vector().unwrap();
        assert_eq!(vec.components(), 3);

        // Three components plus magnitude, max, and average
        assert_eq!(vec.scalar_representations().count(), 6);
        assert!(vec.scalar_representation(ScalarRepKind::Component, 2).is_some());
        assert!(vec.scalar_representation(ScalarRepKind::Component, 3).is_none());
        assert!(vec.scalar_representation(ScalarRepKind::Magnitude, 0).is_some());
        assert!(vec.scalar_representation(ScalarRepKind::Magnitude, 1).is_none());

        // Every representation carries its own identity
        let mut ids: Vec<_> = vec.scalar_representations().map(|v| v.id()).collect();
        ids.push(layer.id());
        ids.sort_by_key(|id| id.to_string());
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }
}
