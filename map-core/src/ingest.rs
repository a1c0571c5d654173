use std::collections::HashSet;
use std::future::Future;

use geo_types::Point;
use log::{debug, info};

use crate::config::MapConfig;
use crate::constants::{ASSOCIATION_NAME_FALLBACK, BUSINESS_NAME_FALLBACK, CLOSED_STATUS_CODE};
use crate::entity::{CategoryMap, EntityAttributes, EntityKind, EntityRecord};
use crate::error::IngestError;
use crate::fields::{FieldChain, Row, association, business};
use crate::normalize::{coordinates, join_present};
use crate::registry::EntityCatalog;
use crate::source::Table;

/// Provides the raw bytes of a source file.
pub trait SourceFetcher {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, IngestError>>;
}

/// Row layout of a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schema {
    /// SIRENE establishment extract.
    Business,
    /// RNA association extract.
    Association,
}

impl EntityKind {
    pub fn schema(self) -> Schema {
        match self {
            EntityKind::Enterprise | EntityKind::PublicEstablishment => Schema::Business,
            EntityKind::Association => Schema::Association,
        }
    }
}

#[derive(Debug, Default)]
struct SkipTally {
    inactive: usize,
    duplicate: usize,
    no_coordinates: usize,
}

/// Single pass shared by both schemas: drop inactive rows, deduplicate on the
/// identifier (first occurrence wins), drop rows without coordinates, then map
/// the survivor. The seen-set lives for this call only.
fn collect_entities<R, I>(
    kind: EntityKind,
    rows: I,
    id_field: FieldChain,
    is_inactive: impl Fn(&R) -> bool,
    build: impl Fn(&R, String, Point<f64>) -> EntityRecord,
) -> Vec<EntityRecord>
where
    R: Row,
    I: IntoIterator<Item = R>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut tally = SkipTally::default();
    let mut out = Vec::new();

    for (idx, row) in rows.into_iter().enumerate() {
        if is_inactive(&row) {
            tally.inactive += 1;
            continue;
        }
        let id = id_field
            .first_owned(&row)
            .unwrap_or_else(|| format!("{}_{idx}", kind.as_str()));
        if !seen.insert(id.clone()) {
            tally.duplicate += 1;
            continue;
        }
        let Some(position) = coordinates(&row) else {
            tally.no_coordinates += 1;
            continue;
        };
        out.push(build(&row, id, position));
    }

    info!("{kind}: {} valid rows", out.len());
    debug!(
        "{kind}: skipped {} inactive, {} duplicate, {} without coordinates",
        tally.inactive, tally.duplicate, tally.no_coordinates
    );
    out
}

/// Enterprises and public establishments.
pub fn ingest_businesses<R, I>(kind: EntityKind, rows: I, municipality: &str) -> Vec<EntityRecord>
where
    R: Row,
    I: IntoIterator<Item = R>,
{
    let is_closed = |row: &R| {
        business::STATUS
            .first(row)
            .is_some_and(|s| s.to_uppercase() == CLOSED_STATUS_CODE)
    };
    collect_entities(kind, rows, business::SIRET, is_closed, |row, id, position| {
        let mut address = business::ADDRESS
            .first_owned(row)
            .unwrap_or_else(|| municipality.to_string());
        if let Some(complement) = business::ADDRESS_COMPLEMENT.first(row) {
            address.push_str(", ");
            address.push_str(complement);
        }
        EntityRecord {
            id,
            name: business::NAME
                .first_owned(row)
                .unwrap_or_else(|| BUSINESS_NAME_FALLBACK.to_string()),
            address,
            kind,
            position,
            attributes: EntityAttributes {
                activity: business::ACTIVITY.first_owned(row),
                section: join_present(row, &business::SECTION_LEVELS, " - "),
                purpose: None,
                siren: business::SIREN.first_owned(row),
                siret: business::SIRET.first_owned(row),
                creation_date: business::CREATION_DATE.first_owned(row),
            },
        }
    })
}

pub fn ingest_associations<R, I>(rows: I, municipality: &str) -> Vec<EntityRecord>
where
    R: Row,
    I: IntoIterator<Item = R>,
{
    let is_dissolved = |row: &R| association::DISSOLUTION_DATE.first(row).is_some();
    collect_entities(
        EntityKind::Association,
        rows,
        association::ID,
        is_dissolved,
        |row, id, position| EntityRecord {
            id,
            name: association::NAME
                .first_owned(row)
                .unwrap_or_else(|| ASSOCIATION_NAME_FALLBACK.to_string()),
            address: join_present(row, &association::STREET_PARTS, " ")
                .unwrap_or_else(|| municipality.to_string()),
            kind: EntityKind::Association,
            position,
            attributes: EntityAttributes {
                purpose: association::PURPOSE.first_owned(row),
                creation_date: association::CREATION_DATE.first_owned(row),
                ..EntityAttributes::default()
            },
        },
    )
}

/// Dispatch on the category's schema.
pub fn ingest_rows<R, I>(kind: EntityKind, rows: I, municipality: &str) -> Vec<EntityRecord>
where
    R: Row,
    I: IntoIterator<Item = R>,
{
    match kind.schema() {
        Schema::Business => ingest_businesses(kind, rows, municipality),
        Schema::Association => ingest_associations(rows, municipality),
    }
}

/// Fetch, decode and ingest one source.
pub async fn ingest_source<F: SourceFetcher>(
    fetcher: &F,
    kind: EntityKind,
    path: &str,
    municipality: &str,
) -> Result<Vec<EntityRecord>, IngestError> {
    let bytes = fetcher.fetch(path).await?;
    let table = Table::parse(&bytes).map_err(|e| IngestError::Header {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(ingest_rows(kind, table.rows(), municipality))
}

/// Load the three sources concurrently. The first failure fails the whole
/// load; nothing is returned until every source has been ingested.
pub async fn load_catalog<F: SourceFetcher>(
    fetcher: &F,
    config: &MapConfig,
) -> Result<EntityCatalog, IngestError> {
    let sources = &config.sources;
    let town = config.municipality.as_str();
    let load = |kind: EntityKind| ingest_source(fetcher, kind, sources.path(kind), town);
    let (enterprise, public_establishment, association) = futures::try_join!(
        load(EntityKind::Enterprise),
        load(EntityKind::PublicEstablishment),
        load(EntityKind::Association),
    )?;
    Ok(EntityCatalog::new(CategoryMap {
        enterprise,
        public_establishment,
        association,
    }))
}
