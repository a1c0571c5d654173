//! Entity ingestion and map-layer lifecycle for the Le Gosier entity map.
//!
//! Everything in here is independent of the browser: the wasm crate plugs a
//! Leaflet-backed [`engine::MapBackend`] and an HTTP [`ingest::SourceFetcher`]
//! into these types.

pub mod cluster;
pub mod config;
pub mod constants;
pub mod engine;
pub mod entity;
pub mod error;
pub mod fields;
pub mod ingest;
pub mod normalize;
pub mod registry;
pub mod render;
pub mod source;
pub mod style;

pub use config::MapConfig;
pub use engine::{InitOutcome, InitTicket, MapBackend, MapEngine};
pub use entity::{CategoryMap, EntityAttributes, EntityKind, EntityRecord};
pub use error::{IngestError, MapError};
pub use ingest::{SourceFetcher, load_catalog};
pub use registry::{CatalogCache, EntityCatalog, EntityCounts};
