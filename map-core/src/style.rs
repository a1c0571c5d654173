use serde::Serialize;

use crate::entity::EntityKind;

/// Visual identity of a category, shared by markers, clusters and the legend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryStyle {
    pub color: &'static str,
    /// Legend / filter-panel label.
    pub label: &'static str,
    pub marker_px: u32,
    pub cluster_px: u32,
}

const ENTERPRISE: CategoryStyle = CategoryStyle {
    color: "#2563eb", // blue-600
    label: "Entreprises",
    marker_px: 12,
    cluster_px: 32,
};

const PUBLIC_ESTABLISHMENT: CategoryStyle = CategoryStyle {
    color: "#16a34a", // green-600
    label: "Établissements publics",
    marker_px: 12,
    cluster_px: 32,
};

const ASSOCIATION: CategoryStyle = CategoryStyle {
    color: "#eab308", // yellow-500
    label: "Associations",
    marker_px: 12,
    cluster_px: 32,
};

impl EntityKind {
    pub fn style(self) -> &'static CategoryStyle {
        match self {
            EntityKind::Enterprise => &ENTERPRISE,
            EntityKind::PublicEstablishment => &PUBLIC_ESTABLISHMENT,
            EntityKind::Association => &ASSOCIATION,
        }
    }
}

/// One legend line, in the shape the filter panel reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub category: EntityKind,
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend lines in display order.
pub fn legend() -> Vec<LegendEntry> {
    EntityKind::ALL
        .into_iter()
        .map(|category| {
            let style = category.style();
            LegendEntry {
                category,
                label: style.label,
                color: style.color,
            }
        })
        .collect()
}
