use serde::{Deserialize, Serialize};

use crate::constants::{CLUSTER_CLICK_ZOOM_STEP, DISABLE_CLUSTERING_AT_ZOOM, MAX_CLUSTER_RADIUS_PX};

/// Per-category cluster group settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterOptions {
    pub max_cluster_radius: u32,
    /// At and above this zoom every marker is shown on its own.
    pub disable_clustering_at_zoom: u8,
    /// Zoom levels gained when a cluster is clicked.
    pub click_zoom_step: u8,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        ClusterOptions {
            max_cluster_radius: MAX_CLUSTER_RADIUS_PX,
            disable_clustering_at_zoom: DISABLE_CLUSTERING_AT_ZOOM,
            click_zoom_step: CLUSTER_CLICK_ZOOM_STEP,
        }
    }
}

impl ClusterOptions {
    pub fn clusters_at(&self, zoom: f64) -> bool {
        zoom < f64::from(self.disable_clustering_at_zoom)
    }

    /// Target zoom after clicking a cluster at `current`: a fixed step closer,
    /// never past `max_zoom`. Clusters zoom in rather than spiderfy.
    pub fn click_zoom(&self, current: f64, max_zoom: f64) -> f64 {
        (current + f64::from(self.click_zoom_step)).min(max_zoom)
    }
}
