use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterOptions;
use crate::constants::*;
use crate::entity::EntityKind;

/// Initial view of the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// [latitude, longitude]
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Background tile layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TileLayerConfig {
    /// Leaflet URL template with `{s}`, `{z}`, `{x}`, `{y}` placeholders.
    pub url_template: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        TileLayerConfig {
            url_template: TILE_URL_TEMPLATE.to_string(),
            attribution: TILE_ATTRIBUTION.to_string(),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

/// CSV path per category, relative to the site base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourcePaths {
    pub enterprise: String,
    pub public_establishment: String,
    pub association: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        SourcePaths {
            enterprise: ENTERPRISES_CSV.to_string(),
            public_establishment: PUBLIC_ESTABLISHMENTS_CSV.to_string(),
            association: ASSOCIATIONS_CSV.to_string(),
        }
    }
}

impl SourcePaths {
    pub fn path(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Enterprise => &self.enterprise,
            EntityKind::PublicEstablishment => &self.public_establishment,
            EntityKind::Association => &self.association,
        }
    }
}

/// Everything the map needs to start. Every field has a default, so a host
/// page only overrides what differs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub view: ViewConfig,
    pub tiles: TileLayerConfig,
    pub cluster: ClusterOptions,
    pub sources: SourcePaths,
    pub municipality: String,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            view: ViewConfig::default(),
            tiles: TileLayerConfig::default(),
            cluster: ClusterOptions::default(),
            sources: SourcePaths::default(),
            municipality: DEFAULT_MUNICIPALITY.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl MapConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Maximum zoom of the map, bounded by what the tiles provide.
    pub fn max_zoom(&self) -> f64 {
        f64::from(self.tiles.max_zoom.max(self.tiles.min_zoom))
    }

    pub fn min_zoom(&self) -> f64 {
        f64::from(self.tiles.min_zoom)
    }

    /// Start zoom clamped into the tile bounds.
    pub fn start_zoom(&self) -> f64 {
        f64::from(self.view.zoom).clamp(self.min_zoom(), self.max_zoom())
    }
}
