//! Bindings for the parts of Leaflet and Leaflet.markercluster the map uses.
//! Both libraries are loaded by the host page and reached through the global `L`.

use js_sys::{Array, Function, Object};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    /// `L.Layer`
    pub type Layer;

    /// `L.Map`
    #[wasm_bindgen(js_name = Map)]
    #[derive(Clone)]
    pub type LeafletMap;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    pub fn map(container: &HtmlElement, options: &Object) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    pub fn set_view(this: &LeafletMap, center: &JsValue, zoom: f64);

    #[wasm_bindgen(method, js_name = getZoom)]
    pub fn get_zoom(this: &LeafletMap) -> f64;

    #[wasm_bindgen(method, js_name = getMaxZoom)]
    pub fn get_max_zoom(this: &LeafletMap) -> f64;

    #[wasm_bindgen(method, js_name = addLayer)]
    pub fn add_layer(this: &LeafletMap, layer: &Layer);

    #[wasm_bindgen(method, js_name = removeLayer)]
    pub fn remove_layer(this: &LeafletMap, layer: &Layer);

    #[wasm_bindgen(method, js_name = hasLayer)]
    pub fn has_layer(this: &LeafletMap, layer: &Layer) -> bool;

    /// Destroys the map and clears every event listener bound to it.
    #[wasm_bindgen(method)]
    pub fn remove(this: &LeafletMap);

    #[wasm_bindgen(extends = Layer)]
    pub type TileLayer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    pub fn tile_layer(url_template: &str, options: &Object) -> Result<TileLayer, JsValue>;

    #[wasm_bindgen(extends = Layer)]
    pub type MarkerClusterGroup;

    #[wasm_bindgen(catch, js_namespace = L, js_name = markerClusterGroup)]
    pub fn marker_cluster_group(options: &Object) -> Result<MarkerClusterGroup, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addLayers)]
    pub fn add_layers(this: &MarkerClusterGroup, layers: &Array) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = clearLayers)]
    pub fn clear_layers(this: &MarkerClusterGroup);

    #[wasm_bindgen(method)]
    pub fn on(this: &MarkerClusterGroup, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &MarkerClusterGroup, event: &str, handler: &Function);

    /// Cluster handed to `iconCreateFunction` and to cluster click events.
    pub type MarkerCluster;

    #[wasm_bindgen(method, js_name = getChildCount)]
    pub fn get_child_count(this: &MarkerCluster) -> u32;

    #[wasm_bindgen(method, js_name = getLatLng)]
    pub fn get_lat_lng(this: &MarkerCluster) -> JsValue;

    /// Payload of a `clusterclick` event.
    pub type ClusterEvent;

    #[wasm_bindgen(method, getter)]
    pub fn layer(this: &ClusterEvent) -> MarkerCluster;

    #[wasm_bindgen(extends = Layer)]
    pub type Marker;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    pub fn marker(lat_lng: &Array, options: &Object) -> Marker;

    #[wasm_bindgen(method, js_name = bindPopup)]
    pub fn bind_popup(this: &Marker, html: &str);

    pub type DivIcon;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    pub fn div_icon(options: &Object) -> DivIcon;
}

/// `[lat, lon]` as Leaflet accepts it wherever a `LatLng` is expected.
pub fn lat_lng(lat: f64, lon: f64) -> Array {
    Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lon))
}
