//! Browser shell for the Le Gosier entity map.
//!
//! The host page loads Leaflet and Leaflet.markercluster, optionally sets
//! `window.__BASE_URL` and `window.__MAP_CONFIG`, then calls the exported
//! functions below.

use std::rc::Rc;

use log::{debug, info, warn};
use map_core::engine::{self, InitOutcome};
use map_core::style::legend;
use map_core::{EntityCatalog, EntityKind, IngestError, MapConfig, load_catalog};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, Window};

mod backend;
mod leaflet;
mod logger;
mod options;
mod state;
mod utils;

use crate::state::{STATE, State};
use crate::utils::{HttpFetcher, window_global};

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Configuration from `window.__MAP_CONFIG`, given either as a JSON string or
/// as a plain object. Returns the problem alongside the defaults when the
/// override cannot be read.
fn read_config(window: &Window) -> (MapConfig, Option<String>) {
    let Some(raw) = window_global(window, "__MAP_CONFIG") else {
        return (MapConfig::default(), None);
    };
    let text = raw.as_string().or_else(|| {
        js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|s| s.as_string())
    });
    match text.map(|t| MapConfig::from_json(&t)) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (MapConfig::default(), Some(e.to_string())),
        None => (
            MapConfig::default(),
            Some("__MAP_CONFIG is not serializable".to_string()),
        ),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let (config, problem) = read_config(&window);
    logger::init(config.log_filter());
    if let Some(problem) = problem {
        warn!("ignoring __MAP_CONFIG: {problem}");
    }
    debug!("map config: {config:?}");

    let state = Rc::new(State::new(window, config));
    STATE.with(|st| st.replace(Some(state)));
    Ok(())
}

/// The catalog of this page session, fetched and parsed on first use.
async fn cached_catalog(state: &State) -> Result<Rc<EntityCatalog>, IngestError> {
    let fetcher = HttpFetcher::new(state.window.clone());
    let config = state.engine.borrow().config().clone();
    state
        .catalog
        .get_or_load(|| async move { load_catalog(&fetcher, &config).await })
        .await
}

/// Build the map inside `container` and show every category. Calling it again
/// replaces the previous map; if calls overlap, the most recent one wins and
/// the older ones resolve without touching the page.
#[wasm_bindgen(js_name = initializeMap)]
pub async fn initialize_map(container: HtmlElement) -> Result<(), JsValue> {
    let state = state::current()?;
    let outcome = engine::initialize(&state.engine, &container, cached_catalog(&state))
        .await
        .map_err(to_js)?;
    match outcome {
        InitOutcome::Ready(counts) => info!("map ready with {} entities", counts.total()),
        InitOutcome::Superseded => debug!("initializeMap superseded by a newer call"),
    }
    Ok(())
}

/// Show or hide one category. Unknown names are ignored.
#[wasm_bindgen(js_name = setLayerVisibility)]
pub fn set_layer_visibility(category: &str, visible: bool) {
    let Some(kind) = EntityKind::from_name(category) else {
        warn!("setLayerVisibility: unknown category {category:?}");
        return;
    };
    if let Ok(state) = state::current() {
        state.engine.borrow_mut().set_visibility(kind, visible);
    }
}

#[wasm_bindgen(js_name = isLayerVisible)]
pub fn is_layer_visible(category: &str) -> bool {
    let Some(kind) = EntityKind::from_name(category) else {
        return false;
    };
    state::current().is_ok_and(|state| state.engine.borrow().is_attached(kind))
}

/// `{ enterprises, publics, associations }`
#[wasm_bindgen(js_name = getEntityCounts)]
pub async fn get_entity_counts() -> Result<JsValue, JsValue> {
    let state = state::current()?;
    let catalog = cached_catalog(&state).await.map_err(to_js)?;
    let json = serde_json::to_string(&catalog.counts()).map_err(to_js)?;
    js_sys::JSON::parse(&json)
}

/// `[{ category, label, color }]` for the legend and the filter panel.
#[wasm_bindgen(js_name = getLegend)]
pub fn get_legend() -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(&legend()).map_err(to_js)?;
    js_sys::JSON::parse(&json)
}

/// Number of entities in the categories currently switched on.
#[wasm_bindgen(js_name = getVisibleTotal)]
pub async fn get_visible_total() -> Result<u32, JsValue> {
    let state = state::current()?;
    let catalog = cached_catalog(&state).await.map_err(to_js)?;
    let visibility = state.engine.borrow().visibility();
    let total = catalog.counts().visible_total(&visibility);
    Ok(u32::try_from(total).unwrap_or(u32::MAX))
}

/// Remove the map from the page. Pending `initializeMap` calls resolve
/// without building anything.
#[wasm_bindgen(js_name = teardownMap)]
pub fn teardown_map() {
    if let Ok(state) = state::current() {
        state.engine.borrow_mut().teardown();
    }
}
