//! Role-filtered traversal over the layer registry
//!
//! `LayerCursor` walks the registry bucket by bucket in the stable role
//! enumeration order, skipping empty slots and roles excluded by its filter.
//! Every externally observed position is either listable (a real layer whose
//! role the filter admits) or the end position; callers never see a vacant
//! slot or a filtered-out role.
//!
//! A cursor is a read-only observer. It holds a shared borrow of the store,
//! so the borrow checker already rules out structural mutation while any
//! cursor is live.

use crate::layer::{Layer, LayerId, LayerRole, RoleFilter, VectorImage};
use crate::store::LayerStore;
use crate::volume::ImageVolume;

/// Restartable, forward-only traversal over a role-filtered layer registry
#[derive(Clone)]
pub struct LayerCursor<'a> {
    store: &'a LayerStore,
    filter: RoleFilter,
    role_index: usize,
    slot_index: usize,
}

impl<'a> LayerCursor<'a> {
    /// A cursor positioned at the first listable layer (or at end)
    pub(crate) fn new(store: &'a LayerStore, filter: RoleFilter) -> Self {
        let mut cursor = Self {
            store,
            filter,
            role_index: 0,
            slot_index: 0,
        };
        cursor.move_to_begin();
        cursor
    }

    /// The filter this cursor was constructed with
    pub fn filter(&self) -> RoleFilter {
        self.filter
    }

    /// Restart at the first listable position
    pub fn move_to_begin(&mut self) -> &mut Self {
        self.role_index = 0;
        self.slot_index = 0;
        while !self.is_at_end() && !self.is_listable_position() {
            self.move_to_next_trial_position();
        }
        self
    }

    /// Jump straight to the end position
    pub fn move_to_end(&mut self) -> &mut Self {
        self.role_index = LayerRole::ORDER.len();
        self
    }

    /// Whether the cursor has passed the last bucket
    pub fn is_at_end(&self) -> bool {
        self.role_index >= LayerRole::ORDER.len()
    }

    /// Advance by exactly one trial position, without re-validating
    ///
    /// At the end of a bucket, or in a bucket whose role the filter excludes,
    /// this moves to the start of the next bucket; otherwise it moves one
    /// slot forward. A no-op at the end position.
    fn move_to_next_trial_position(&mut self) {
        if self.is_at_end() {
            return;
        }
        let role = LayerRole::ORDER[self.role_index];
        let bucket = self.store.bucket_at(self.role_index);
        if self.slot_index >= bucket.len() || !self.filter.includes(role) {
            self.role_index += 1;
            self.slot_index = 0;
        } else {
            self.slot_index += 1;
        }
    }

    /// Whether the current position holds a layer the filter admits
    fn is_listable_position(&self) -> bool {
        if self.is_at_end() {
            return false;
        }
        let role = LayerRole::ORDER[self.role_index];
        if !self.filter.includes(role) {
            return false;
        }
        let bucket = self.store.bucket_at(self.role_index);
        if self.slot_index >= bucket.len() {
            return false;
        }
        bucket[self.slot_index].is_some()
    }

    /// Step to the next listable position (or the end)
    ///
    /// The skip loop advances one trial position at a time; each trial either
    /// moves a slot forward or a bucket forward, so it terminates after at
    /// most the total slot count plus the role count.
    pub fn step(&mut self) -> &mut Self {
        loop {
            self.move_to_next_trial_position();
            if self.is_at_end() || self.is_listable_position() {
                break;
            }
        }
        self
    }

    /// Step `k` times
    pub fn advance_by(&mut self, k: usize) -> &mut Self {
        for _ in 0..k {
            self.step();
        }
        self
    }

    /// Restart and step until the cursor points at `id`, or reach the end
    pub fn find(&mut self, id: LayerId) -> &mut Self {
        // Linear search; registries hold a handful of layers
        self.move_to_begin();
        while !self.is_at_end() && self.layer().id() != id {
            self.step();
        }
        self
    }

    /// The layer at the current position
    ///
    /// Panics if the cursor is not at a listable position.
    pub fn layer(&self) -> &'a Layer {
        assert!(
            self.is_listable_position(),
            "cursor accessor used while not at a listable position"
        );
        self.store.bucket_at(self.role_index)[self.slot_index]
            .as_ref()
            .expect("listable position holds a layer")
    }

    /// The current layer's scalar payload, if it has one
    pub fn layer_as_scalar(&self) -> Option<&'a ImageVolume> {
        self.layer().as_scalar()
    }

    /// The current layer's vector payload, if it has one
    pub fn layer_as_vector(&self) -> Option<&'a VectorImage> {
        self.layer().as_vector()
    }

    /// The role of the current position
    ///
    /// Panics if the cursor is not at a listable position.
    pub fn role(&self) -> LayerRole {
        assert!(
            self.is_listable_position(),
            "cursor accessor used while not at a listable position"
        );
        LayerRole::ORDER[self.role_index]
    }

    /// Zero-based position within the current role's bucket
    pub fn position_in_role(&self) -> usize {
        assert!(
            self.is_listable_position(),
            "cursor accessor used while not at a listable position"
        );
        self.slot_index
    }

    /// Number of slots in the current role's bucket
    pub fn layers_in_role(&self) -> usize {
        assert!(
            self.is_listable_position(),
            "cursor accessor used while not at a listable position"
        );
        self.store.bucket_at(self.role_index).len()
    }

    /// Whether the current position is the first slot of its bucket
    pub fn is_first_in_role(&self) -> bool {
        self.position_in_role() == 0
    }

    /// Whether the current position is the last slot of its bucket
    pub fn is_last_in_role(&self) -> bool {
        self.position_in_role() + 1 == self.layers_in_role()
    }

    /// One-line description of the current position, for diagnostics
    pub fn describe(&self) -> String {
        if self.is_at_end() {
            "at end".to_string()
        } else {
            format!(
                "{} ({} of {})",
                self.role().display_name(),
                self.position_in_role() + 1,
                self.layers_in_role()
            )
        }
    }
}

impl PartialEq for LayerCursor<'_> {
    /// Two cursors are equal when both are at the end, or both point at the
    /// same layer identity
    fn eq(&self, other: &Self) -> bool {
        if self.is_at_end() {
            other.is_at_end()
        } else if other.is_at_end() {
            false
        } else {
            self.layer().id() == other.layer().id()
        }
    }
}

/// Iterator adapter over a cursor, yielding layers in traversal order
pub struct Layers<'a> {
    cursor: LayerCursor<'a>,
}

impl<'a> Layers<'a> {
    pub(crate) fn new(cursor: LayerCursor<'a>) -> Self {
        Self { cursor }
    }
}

impl<'a> Iterator for Layers<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<&'a Layer> {
        if self.cursor.is_at_end() {
            None
        } else {
            let layer = self.cursor.layer();
            self.cursor.step();
            Some(layer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageGeometry, IntensityMapping};
    use crate::volume::{Extent, ImageVolume};

    fn store_with_main() -> LayerStore {
        let mut store = LayerStore::new();
        store.set_main_image(
            ImageVolume::zeros(Extent::new(4, 4, 4)),
            ImageGeometry::identity(),
            IntensityMapping::identity(),
        );
        store
    }

    fn add_overlay(store: &mut LayerStore) -> LayerId {
        store
            .add_overlay(
                ImageVolume::zeros(Extent::new(4, 4, 4)),
                IntensityMapping::identity(),
            )
            .unwrap()
    }

    #[test]
    fn test_empty_store_is_at_end() {
        let store = LayerStore::new();
        let cursor = store.layers(RoleFilter::ALL);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_traversal_order_is_role_order() {
        let mut store = store_with_main();
        add_overlay(&mut store);

        let roles: Vec<_> = {
            let mut cursor = store.layers(RoleFilter::ALL);
            let mut roles = Vec::new();
            while !cursor.is_at_end() {
                roles.push(cursor.role());
                cursor.step();
            }
            roles
        };
        assert_eq!(
            roles,
            vec![LayerRole::Main, LayerRole::Overlay, LayerRole::Label]
        );
    }

    #[test]
    fn test_filter_excludes_roles() {
        let mut store = store_with_main();
        add_overlay(&mut store);
        add_overlay(&mut store);

        let mut cursor = store.layers(RoleFilter::only(LayerRole::Overlay));
        let mut seen = 0;
        while !cursor.is_at_end() {
            assert_eq!(cursor.role(), LayerRole::Overlay);
            seen += 1;
            cursor.step();
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_empty_filter_is_at_end() {
        let store = store_with_main();
        assert!(store.layers(RoleFilter::empty()).is_at_end());
    }

    #[test]
    fn test_find_positions_on_layer() {
        let mut store = store_with_main();
        let first = add_overlay(&mut store);
        let second = add_overlay(&mut store);

        let mut cursor = store.layers(RoleFilter::ALL);
        cursor.find(second);
        assert!(!cursor.is_at_end());
        assert_eq!(cursor.layer().id(), second);
        assert_eq!(cursor.role(), LayerRole::Overlay);
        assert_eq!(cursor.position_in_role(), 1);
        assert!(!cursor.is_first_in_role());
        assert!(cursor.is_last_in_role());

        cursor.find(first);
        assert_eq!(cursor.position_in_role(), 0);
        assert!(cursor.is_first_in_role());
    }

    #[test]
    fn test_find_missing_reaches_end() {
        let store = store_with_main();
        let mut cursor = store.layers(RoleFilter::ALL);
        cursor.find(LayerId::new());
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_step_past_end_is_noop() {
        let store = store_with_main();
        let mut cursor = store.layers(RoleFilter::ALL);
        cursor.move_to_end();
        cursor.step();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_cursor_equality_after_equal_stepping() {
        let mut store = store_with_main();
        add_overlay(&mut store);

        let mut a = store.layers(RoleFilter::ALL);
        let mut b = store.layers(RoleFilter::ALL);
        assert!(a == b);

        a.step();
        b.step();
        assert!(a == b);

        a.move_to_end();
        assert!(a != b);
        b.move_to_end();
        assert!(a == b);
    }

    #[test]
    fn test_advance_by() {
        let mut store = store_with_main();
        add_overlay(&mut store);

        let mut stepped = store.layers(RoleFilter::ALL);
        stepped.step();
        stepped.step();

        let mut advanced = store.layers(RoleFilter::ALL);
        advanced.advance_by(2);
        assert!(stepped == advanced);
    }

    #[test]
    fn test_iterator_adapter_matches_cursor() {
        let mut store = store_with_main();
        let overlay = add_overlay(&mut store);

        let ids: Vec<_> = store
            .iter(RoleFilter::only(LayerRole::Overlay))
            .map(|l| l.id())
            .collect();
        assert_eq!(ids, vec![overlay]);

        assert_eq!(store.iter(RoleFilter::ALL).count(), 3);
    }

    #[test]
    fn test_describe() {
        let mut store = store_with_main();
        add_overlay(&mut store);

        let mut cursor = store.layers(RoleFilter::only(LayerRole::Overlay));
        assert_eq!(cursor.describe(), "Overlay (1 of 1)");
        cursor.move_to_end();
        assert_eq!(cursor.describe(), "at end");
    }

    #[test]
    #[should_panic(expected = "listable position")]
    fn test_accessor_off_listable_position_panics() {
        let store = LayerStore::new();
        let cursor = store.layers(RoleFilter::ALL);
        let _ = cursor.layer();
    }
}
