/// Application-wide defaults.
/// Coordinates are WGS84 degrees, zoom levels are Leaflet zoom levels.
pub const DEFAULT_CENTER: [f64; 2] = [16.205, -61.485];
pub const DEFAULT_ZOOM: u8 = 13;
pub const MIN_ZOOM: u8 = 3;
pub const MAX_ZOOM: u8 = 19;
/// Largest pixel radius a cluster may cover.
pub const MAX_CLUSTER_RADIUS_PX: u32 = 60;
/// From this zoom on every entity is drawn as its own marker.
pub const DISABLE_CLUSTERING_AT_ZOOM: u8 = 16;
/// Zoom levels gained when a cluster is clicked.
pub const CLUSTER_CLICK_ZOOM_STEP: u8 = 2;

pub const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str = "&copy; OpenStreetMap contributors";

/// Used as address when a source row carries none.
pub const DEFAULT_MUNICIPALITY: &str = "Le Gosier";
/// Administrative status code of a closed establishment.
pub const CLOSED_STATUS_CODE: &str = "F";
pub const BUSINESS_NAME_FALLBACK: &str = "Sans enseigne";
pub const ASSOCIATION_NAME_FALLBACK: &str = "Association";

pub const ENTERPRISES_CSV: &str = "data/entreprise_private.csv";
pub const PUBLIC_ESTABLISHMENTS_CSV: &str = "data/etablissement_public.csv";
pub const ASSOCIATIONS_CSV: &str = "data/association.csv";
