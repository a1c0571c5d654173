use std::fmt::Write;

use crate::entity::{EntityKind, EntityRecord};

/// What the backend needs to place one marker.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lon: f64,
    pub popup_html: String,
}

impl MarkerSpec {
    pub fn for_entity(entity: &EntityRecord) -> Self {
        let (lat, lon) = entity.lat_lon();
        MarkerSpec {
            lat,
            lon,
            popup_html: popup_html(entity),
        }
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const LINE_FIRST: &str = "margin:4px 0 0 0;font-size:12px";
const LINE_NEXT: &str = "margin:0;font-size:12px";

/// Popup body for a marker. Attributes the entity lacks get no line at all.
pub fn popup_html(entity: &EntityRecord) -> String {
    let attrs = &entity.attributes;
    let mut html = String::from("<div style=\"font-size:14px;max-width:260px\">");
    let _ = write!(
        html,
        "<h3 style=\"font-weight:600;margin:0 0 4px 0\">{}</h3>",
        escape_html(&entity.name)
    );
    let _ = write!(html, "<p style=\"{LINE_NEXT}\">{}</p>", escape_html(&entity.address));

    let mut line = |style: &str, label: &str, value: &Option<String>| {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let _ = write!(html, "<p style=\"{style}\">{label}{}</p>", escape_html(v));
        }
    };
    line(LINE_FIRST, "", &attrs.activity);
    line(LINE_NEXT, "Section : ", &attrs.section);
    line(LINE_FIRST, "", &attrs.purpose);
    line(LINE_FIRST, "SIREN : ", &attrs.siren);
    line(LINE_NEXT, "SIRET : ", &attrs.siret);
    line(LINE_FIRST, "Création : ", &attrs.creation_date);

    html.push_str("</div>");
    html
}

/// Single-entity dot.
pub fn marker_icon_html(kind: EntityKind) -> String {
    let style = kind.style();
    format!(
        "<div style=\"background:{};width:{px}px;height:{px}px;border-radius:50%;border:1px solid #fff\"></div>",
        style.color,
        px = style.marker_px
    )
}

/// Round badge showing how many entities a cluster holds.
pub fn cluster_icon_html(kind: EntityKind, count: u32) -> String {
    let style = kind.style();
    format!(
        "<div style=\"background:{};width:{px}px;height:{px}px;border-radius:50%;display:flex;align-items:center;justify-content:center;color:#fff;font-size:12px\">{count}</div>",
        style.color,
        px = style.cluster_px
    )
}
