use std::fmt;

use geo_types::Point;
use serde::{Deserialize, Serialize};

/// The three categories of entities plotted on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Enterprise,
    PublicEstablishment,
    Association,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Enterprise,
        EntityKind::PublicEstablishment,
        EntityKind::Association,
    ];

    /// Name used on the JS side and in synthetic identifiers.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Enterprise => "enterprise",
            EntityKind::PublicEstablishment => "publicEstablishment",
            EntityKind::Association => "association",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name.trim())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per [`EntityKind`].
///
/// Lookups are exhaustive matches, so a new category cannot be added without
/// giving every table built on this type an entry for it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMap<T> {
    pub enterprise: T,
    pub public_establishment: T,
    pub association: T,
}

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(EntityKind) -> T) -> Self {
        CategoryMap {
            enterprise: f(EntityKind::Enterprise),
            public_establishment: f(EntityKind::PublicEstablishment),
            association: f(EntityKind::Association),
        }
    }

    pub fn get(&self, kind: EntityKind) -> &T {
        match kind {
            EntityKind::Enterprise => &self.enterprise,
            EntityKind::PublicEstablishment => &self.public_establishment,
            EntityKind::Association => &self.association,
        }
    }

    pub fn get_mut(&mut self, kind: EntityKind) -> &mut T {
        match kind {
            EntityKind::Enterprise => &mut self.enterprise,
            EntityKind::PublicEstablishment => &mut self.public_establishment,
            EntityKind::Association => &mut self.association,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(EntityKind, T) -> U) -> CategoryMap<U> {
        CategoryMap {
            enterprise: f(EntityKind::Enterprise, self.enterprise),
            public_establishment: f(EntityKind::PublicEstablishment, self.public_establishment),
            association: f(EntityKind::Association, self.association),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &T)> {
        EntityKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn into_values(self) -> [T; 3] {
        [self.enterprise, self.public_establishment, self.association]
    }
}

/// Optional descriptive fields carried from the source row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityAttributes {
    pub activity: Option<String>,
    /// Classification path, e.g. "G - 47 - 47.1".
    pub section: Option<String>,
    /// Statement of purpose ("objet") of an association.
    pub purpose: Option<String>,
    pub siren: Option<String>,
    pub siret: Option<String>,
    pub creation_date: Option<String>,
}

/// Uniform record produced by ingestion, read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub kind: EntityKind,
    /// x = longitude, y = latitude.
    pub position: Point<f64>,
    pub attributes: EntityAttributes,
}

impl EntityRecord {
    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    pub fn lat_lon(&self) -> (f64, f64) {
        (self.latitude(), self.longitude())
    }
}
