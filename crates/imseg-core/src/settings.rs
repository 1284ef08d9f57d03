//! Default workbench behavior settings
//!
//! User-tunable defaults consulted when layers are created: view linking and
//! synchronization toggles, the preset applied to new overlays, and how
//! overlays are laid out. Serialized as part of the application settings.

use serde::{Deserialize, Serialize};

/// How multiple overlays are arranged in the view panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayLayout {
    /// Overlays are blended on top of the main image
    Stacked,

    /// Each overlay gets its own tile
    Tiled,
}

/// Default behaviors applied to new sessions and layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultBehaviorSettings {
    /// Keep zoom factors linked across the orthogonal views
    pub linked_zoom: bool,

    /// Recompute the mesh whenever the segmentation changes
    pub continuous_mesh_update: bool,

    /// Master switch for cross-session synchronization
    pub synchronization: bool,

    /// Synchronize the crosshair position across sessions
    pub sync_cursor: bool,

    /// Synchronize zoom across sessions
    pub sync_zoom: bool,

    /// Synchronize pan across sessions
    pub sync_pan: bool,

    /// Check for software updates at startup
    pub check_for_updates: bool,

    /// Color-map preset applied to newly added overlays
    pub overlay_color_map_preset: String,

    /// Arrangement of overlays in the view panels
    pub overlay_layout: OverlayLayout,

    /// Opacity assigned to newly added overlays
    pub default_overlay_alpha: f32,
}

impl Default for DefaultBehaviorSettings {
    fn default() -> Self {
        Self {
            linked_zoom: true,
            continuous_mesh_update: false,
            synchronization: true,
            sync_cursor: true,
            sync_zoom: true,
            sync_pan: true,
            check_for_updates: true,
            overlay_color_map_preset: "Grayscale".to_string(),
            overlay_layout: OverlayLayout::Stacked,
            default_overlay_alpha: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let s = DefaultBehaviorSettings::default();
        assert!(s.linked_zoom);
        assert!(!s.continuous_mesh_update);
        assert_eq!(s.overlay_layout, OverlayLayout::Stacked);
        assert!((s.default_overlay_alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_json_round_trip() {
        let mut s = DefaultBehaviorSettings::default();
        s.sync_pan = false;
        s.overlay_color_map_preset = "Jet".to_string();

        let json = serde_json::to_string(&s).unwrap();
        let back: DefaultBehaviorSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
