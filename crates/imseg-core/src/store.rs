//! The layer registry
//!
//! `LayerStore` owns one ordered bucket of layer slots per role and is the
//! sole mutator of their contents. The main and segmentation roles hold
//! exactly one slot each (vacant when no image session is open); overlays and
//! snap layers grow in insertion order. All structural mutation funnels
//! through here so that cardinality and geometry invariants hold and exactly
//! one notification per mutation reaches the attached sink.

use crate::cursor::{LayerCursor, Layers};
use crate::error::{LayerStoreError, StoreResult};
use crate::event::{LayerChange, LayerEvent, LayerEventSink};
use crate::geometry::{ImageGeometry, IntensityMapping};
use crate::layer::{Layer, LayerId, LayerRole, RoleFilter, ScalarView};
use crate::settings::DefaultBehaviorSettings;
use crate::types::{Vec3d, Vec3ui};
use crate::volume::{Extent, ImageVolume, LabelVolume, VectorImageVolume};
use tracing::debug;

/// Result of an identity search across the registry
#[derive(Debug)]
pub enum FoundLayer<'a> {
    /// A top-level layer matched
    Layer(&'a Layer),

    /// A scalar sub-view of a vector layer matched
    View {
        owner: &'a Layer,
        view: &'a ScalarView,
    },
}

impl FoundLayer<'_> {
    /// The identity that matched the search
    pub fn id(&self) -> LayerId {
        match self {
            FoundLayer::Layer(layer) => layer.id(),
            FoundLayer::View { view, .. } => view.id(),
        }
    }
}

/// Role-keyed registry of image layers for one workbench session
pub struct LayerStore {
    buckets: [Vec<Option<Layer>>; 4],
    geometry: ImageGeometry,
    overlay_alpha: f32,
    sink: Option<Box<dyn LayerEventSink>>,
}

impl LayerStore {
    /// An empty registry with default behavior settings
    pub fn new() -> Self {
        Self::with_settings(&DefaultBehaviorSettings::default())
    }

    /// An empty registry; overlay defaults come from `settings`
    pub fn with_settings(settings: &DefaultBehaviorSettings) -> Self {
        Self {
            // Main and Label always hold exactly one slot
            buckets: [vec![None], Vec::new(), vec![None], Vec::new()],
            geometry: ImageGeometry::identity(),
            overlay_alpha: settings.default_overlay_alpha,
            sink: None,
        }
    }

    /// Attach the sink that receives one event per structural mutation
    pub fn set_event_sink(&mut self, sink: Box<dyn LayerEventSink>) {
        self.sink = Some(sink);
    }

    /// The geometry most recently applied to the registry
    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    // ----- session lifecycle -------------------------------------------------

    /// Install a new main image and a blank segmentation of matching extent
    ///
    /// Replaces any previous main and segmentation content and pushes the new
    /// geometry onto every initialized layer. Overlays from a prior image are
    /// deliberately left attached; callers wanting a full reset unload the
    /// main image first.
    pub fn set_main_image(
        &mut self,
        volume: ImageVolume,
        geometry: ImageGeometry,
        mapping: IntensityMapping,
    ) -> LayerId {
        let extent = volume.extent();
        let mut main = Layer::scalar(volume, mapping);
        main.set_nickname(LayerRole::Main.display_name());
        main.set_alpha(1.0);
        let main_id = main.id();

        debug!(layer = %main_id, %extent, "installing main image");
        let previous = self.set_single_slot(LayerRole::Main, Some(main));
        self.emit(main_id, replace_or_add(previous.is_some()));

        // The segmentation starts out all-clear at the main image's extent
        let mut label = Layer::label(LabelVolume::zeros(extent));
        label.set_nickname(LayerRole::Label.display_name());
        let label_id = label.id();

        let previous = self.set_single_slot(LayerRole::Label, Some(label));
        self.emit(label_id, replace_or_add(previous.is_some()));

        self.apply_geometry(geometry);
        main_id
    }

    /// Tear down the session: overlays last-to-first, then main, then label
    pub fn unload_main_image(&mut self) {
        self.unload_overlays();

        if let Some(main) = self.set_single_slot(LayerRole::Main, None) {
            debug!(layer = %main.id(), "unloaded main image");
            self.emit(main.id(), LayerChange::Removed);
        }
        if let Some(label) = self.set_single_slot(LayerRole::Label, None) {
            self.emit(label.id(), LayerChange::Removed);
        }
    }

    // ----- overlays ----------------------------------------------------------

    /// Append a scalar overlay
    pub fn add_overlay(
        &mut self,
        volume: ImageVolume,
        mapping: IntensityMapping,
    ) -> StoreResult<LayerId> {
        let overlay = Layer::scalar(volume, mapping);
        self.install_listed(LayerRole::Overlay, overlay)
    }

    /// Append a vector-valued overlay; its scalar representations become
    /// findable via `find_layer` with `search_derived`
    pub fn add_vector_overlay(
        &mut self,
        volume: VectorImageVolume,
        mapping: IntensityMapping,
    ) -> StoreResult<LayerId> {
        let overlay = Layer::vector(volume, mapping);
        self.install_listed(LayerRole::Overlay, overlay)
    }

    /// Detach the most recently added overlay; a no-op when none are loaded
    pub fn unload_overlay_last(&mut self) {
        if let Some(Some(overlay)) = self.buckets[LayerRole::Overlay.index()].pop() {
            debug!(layer = %overlay.id(), "unloaded overlay");
            self.emit(overlay.id(), LayerChange::Removed);
        }
    }

    /// Detach the first overlay with the given identity; a no-op when absent
    pub fn unload_overlay(&mut self, id: LayerId) {
        let bucket = &mut self.buckets[LayerRole::Overlay.index()];
        if let Some(position) = bucket
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|l| l.id() == id))
        {
            bucket.remove(position);
            debug!(layer = %id, "unloaded overlay");
            self.emit(id, LayerChange::Removed);
        }
    }

    /// Detach every overlay, last-to-first
    pub fn unload_overlays(&mut self) {
        while !self.buckets[LayerRole::Overlay.index()].is_empty() {
            self.unload_overlay_last();
        }
    }

    // ----- snap (derived) layers --------------------------------------------

    /// Append a derived image produced by the segmentation pipeline
    pub fn add_snap_layer(
        &mut self,
        volume: ImageVolume,
        mapping: IntensityMapping,
    ) -> StoreResult<LayerId> {
        let layer = Layer::scalar(volume, mapping);
        self.install_listed(LayerRole::Snap, layer)
    }

    /// Detach every snap layer, last-to-first
    pub fn clear_snap_layers(&mut self) {
        while let Some(Some(layer)) = self.buckets[LayerRole::Snap.index()].pop() {
            self.emit(layer.id(), LayerChange::Removed);
        }
    }

    // ----- segmentation ------------------------------------------------------

    /// Swap the segmentation layer's image in place
    ///
    /// The layer keeps its identity and metadata; spacing and origin are
    /// copied from the main image.
    pub fn set_segmentation_image(&mut self, volume: LabelVolume) -> StoreResult<()> {
        let main = self
            .main_layer()
            .filter(|l| l.is_initialized())
            .ok_or(LayerStoreError::NotLoaded { what: "main image" })?;
        let expected = main.extent();
        let actual = volume.extent();
        if actual != expected {
            return Err(LayerStoreError::SizeMismatch { expected, actual });
        }
        let main_geometry = main
            .geometry()
            .cloned()
            .unwrap_or_else(|| self.geometry.clone());

        let label = self
            .label_layer_mut()
            .ok_or(LayerStoreError::NotLoaded { what: "segmentation" })?;
        let id = label.id();
        label.replace_label_volume(volume);
        label.copy_spacing_origin(&main_geometry);

        debug!(layer = %id, "replaced segmentation image");
        self.emit(id, LayerChange::Replaced);
        Ok(())
    }

    /// Overwrite one segmentation voxel; the index must be inside the extent
    pub fn set_segmentation_voxel(&mut self, index: Vec3ui, label: u16) -> StoreResult<()> {
        let layer = self
            .label_layer_mut()
            .filter(|l| l.is_initialized())
            .ok_or(LayerStoreError::NotLoaded { what: "segmentation" })?;
        let volume = layer
            .as_label_mut()
            .ok_or(LayerStoreError::NotLoaded { what: "segmentation" })?;
        volume.set_voxel(index, label);
        Ok(())
    }

    // ----- broadcasts --------------------------------------------------------

    /// Push a crosshair position onto every initialized layer
    pub fn set_crosshairs(&mut self, position: Vec3ui) -> StoreResult<()> {
        if !self.is_main_loaded() {
            return Err(LayerStoreError::NotLoaded { what: "main image" });
        }
        self.for_each_initialized_mut(|layer| layer.set_crosshair(position));
        Ok(())
    }

    /// Store a new geometry and push it onto every initialized layer
    pub fn set_image_geometry(&mut self, geometry: ImageGeometry) -> StoreResult<()> {
        if !self.is_main_loaded() {
            return Err(LayerStoreError::NotLoaded { what: "main image" });
        }
        self.apply_geometry(geometry);
        Ok(())
    }

    // ----- reordering and lookup --------------------------------------------

    /// Swap a layer with its neighbor `shift` positions away in its bucket
    ///
    /// A no-op when the identity is not present; `Boundary` when the target
    /// position falls outside the bucket.
    pub fn move_layer(&mut self, id: LayerId, shift: i32) -> StoreResult<()> {
        let (role, position) = {
            let mut cursor = self.layers(RoleFilter::ALL);
            cursor.find(id);
            if cursor.is_at_end() {
                return Ok(());
            }
            (cursor.role(), cursor.position_in_role())
        };

        let bucket = &mut self.buckets[role.index()];
        let target = position as i64 + shift as i64;
        if target < 0 || target >= bucket.len() as i64 {
            return Err(LayerStoreError::Boundary {
                position,
                shift,
                len: bucket.len(),
            });
        }
        bucket.swap(position, target as usize);

        debug!(layer = %id, shift, "reordered layer");
        self.emit(id, LayerChange::Reordered);
        Ok(())
    }

    /// Linear search for an identity across the filtered roles
    ///
    /// With `search_derived` set, vector layers' scalar representations are
    /// searched as well; without it, only top-level identities can match.
    pub fn find_layer(
        &self,
        id: LayerId,
        search_derived: bool,
        filter: RoleFilter,
    ) -> Option<FoundLayer<'_>> {
        for layer in self.iter(filter) {
            if layer.id() == id {
                return Some(FoundLayer::Layer(layer));
            }
            if search_derived {
                if let Some(vector) = layer.as_vector() {
                    if let Some(view) = vector.scalar_representations().find(|v| v.id() == id) {
                        return Some(FoundLayer::View { owner: layer, view });
                    }
                }
            }
        }
        None
    }

    /// Number of layers reachable under the filter (full traversal)
    pub fn layer_count(&self, filter: RoleFilter) -> usize {
        self.iter(filter).count()
    }

    // ----- queries -----------------------------------------------------------

    pub fn is_main_loaded(&self) -> bool {
        self.main_layer().is_some_and(|l| l.is_initialized())
    }

    pub fn is_overlay_loaded(&self) -> bool {
        !self.buckets[LayerRole::Overlay.index()].is_empty()
    }

    pub fn is_segmentation_loaded(&self) -> bool {
        self.label_layer().is_some_and(|l| l.is_initialized())
    }

    pub fn main_layer(&self) -> Option<&Layer> {
        self.buckets[LayerRole::Main.index()]
            .first()
            .and_then(|slot| slot.as_ref())
    }

    pub fn label_layer(&self) -> Option<&Layer> {
        self.buckets[LayerRole::Label.index()]
            .first()
            .and_then(|slot| slot.as_ref())
    }

    pub fn last_overlay(&self) -> Option<&Layer> {
        self.buckets[LayerRole::Overlay.index()]
            .last()
            .and_then(|slot| slot.as_ref())
    }

    /// Voxel-grid extent of the main image
    pub fn image_extent(&self) -> StoreResult<Extent> {
        self.main_layer()
            .filter(|l| l.is_initialized())
            .map(|l| l.extent())
            .ok_or(LayerStoreError::NotLoaded { what: "main image" })
    }

    /// Voxel spacing of the main image
    pub fn image_spacing(&self) -> StoreResult<Vec3d> {
        if !self.is_main_loaded() {
            return Err(LayerStoreError::NotLoaded { what: "main image" });
        }
        Ok(self.geometry.spacing)
    }

    /// Physical origin of the main image
    pub fn image_origin(&self) -> StoreResult<Vec3d> {
        if !self.is_main_loaded() {
            return Err(LayerStoreError::NotLoaded { what: "main image" });
        }
        Ok(self.geometry.origin)
    }

    // ----- traversal ---------------------------------------------------------

    /// A cursor over the roles admitted by `filter`
    pub fn layers(&self, filter: RoleFilter) -> LayerCursor<'_> {
        LayerCursor::new(self, filter)
    }

    /// An iterator over the layers admitted by `filter`, in traversal order
    pub fn iter(&self, filter: RoleFilter) -> Layers<'_> {
        Layers::new(self.layers(filter))
    }

    pub(crate) fn bucket_at(&self, role_index: usize) -> &[Option<Layer>] {
        &self.buckets[role_index]
    }

    // ----- internals ---------------------------------------------------------

    /// Size-check a layer against the main image, copy geometry onto it, and
    /// append it to the given bucket
    fn install_listed(&mut self, role: LayerRole, mut layer: Layer) -> StoreResult<LayerId> {
        let main = self
            .main_layer()
            .filter(|l| l.is_initialized())
            .ok_or(LayerStoreError::NotLoaded { what: "main image" })?;
        let expected = main.extent();
        let actual = layer.extent();
        if actual != expected {
            return Err(LayerStoreError::SizeMismatch { expected, actual });
        }
        let main_geometry = main
            .geometry()
            .cloned()
            .unwrap_or_else(|| self.geometry.clone());

        if role == LayerRole::Overlay {
            layer.set_alpha(self.overlay_alpha);
        }
        layer.set_nickname(role.display_name());
        layer.copy_grid_geometry(&main_geometry);
        layer.set_display_transforms(self.geometry.display_transforms);

        let id = layer.id();
        self.buckets[role.index()].push(Some(layer));
        debug!(layer = %id, role = %role, "added layer");
        self.emit(id, LayerChange::Added);
        Ok(id)
    }

    /// Replace the contents of a cardinality-one slot, returning the previous
    /// occupant
    fn set_single_slot(&mut self, role: LayerRole, layer: Option<Layer>) -> Option<Layer> {
        debug_assert!(role.is_single_slot());
        let bucket = &mut self.buckets[role.index()];
        debug_assert_eq!(bucket.len(), 1);
        std::mem::replace(&mut bucket[0], layer)
    }

    fn label_layer_mut(&mut self) -> Option<&mut Layer> {
        self.buckets[LayerRole::Label.index()]
            .first_mut()
            .and_then(|slot| slot.as_mut())
    }

    fn apply_geometry(&mut self, geometry: ImageGeometry) {
        self.geometry = geometry;
        let geometry = self.geometry.clone();
        self.for_each_initialized_mut(|layer| layer.set_geometry(geometry.clone()));
    }

    /// Visit every initialized layer across all roles, in traversal order
    fn for_each_initialized_mut<F: FnMut(&mut Layer)>(&mut self, mut f: F) {
        for role in LayerRole::ORDER {
            for slot in &mut self.buckets[role.index()] {
                if let Some(layer) = slot {
                    if layer.is_initialized() {
                        f(layer);
                    }
                }
            }
        }
    }

    fn emit(&mut self, layer: LayerId, change: LayerChange) {
        if let Some(sink) = self.sink.as_mut() {
            sink.layer_changed(LayerEvent { layer, change });
        }
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}

fn replace_or_add(had_previous: bool) -> LayerChange {
    if had_previous {
        LayerChange::Replaced
    } else {
        LayerChange::Added
    }
}
