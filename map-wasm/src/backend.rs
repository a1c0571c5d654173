use js_sys::Array;
use log::debug;
use map_core::engine::MapBackend;
use map_core::render::{MarkerSpec, cluster_icon_html, marker_icon_html};
use map_core::{EntityKind, MapConfig, MapError};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::leaflet::{self, ClusterEvent, LeafletMap, MarkerCluster, MarkerClusterGroup};
use crate::options::Options;
use crate::utils::js_message;

/// Cluster group of one category plus the Rust callbacks Leaflet holds on to.
/// Dropping it frees the callbacks, so it must outlive its use by the map.
pub struct LeafletGroup {
    kind: EntityKind,
    layer: MarkerClusterGroup,
    _icon: Closure<dyn FnMut(MarkerCluster) -> leaflet::DivIcon>,
    on_click: Closure<dyn FnMut(ClusterEvent)>,
}

/// Draws sessions with Leaflet and Leaflet.markercluster.
pub struct LeafletBackend;

fn backend_error(what: &str, err: JsValue) -> MapError {
    MapError::Backend(format!("{what}: {}", js_message(&err)))
}

fn square(px: u32) -> Array {
    Array::of2(&JsValue::from(px), &JsValue::from(px))
}

impl MapBackend for LeafletBackend {
    type Surface = HtmlElement;
    type Map = LeafletMap;
    type Group = LeafletGroup;

    fn create_map(&mut self, surface: &HtmlElement, config: &MapConfig) -> Result<LeafletMap, MapError> {
        let options = Options::new()
            .set("minZoom", config.min_zoom())
            .set("maxZoom", config.max_zoom())
            .build();
        let map = leaflet::map(surface, &options).map_err(|e| backend_error("L.map", e))?;
        let [lat, lon] = config.view.center;
        map.set_view(&leaflet::lat_lng(lat, lon), config.start_zoom());

        let tile_options = Options::new()
            .set("attribution", config.tiles.attribution.as_str())
            .set("minZoom", config.min_zoom())
            .set("maxZoom", config.max_zoom())
            .build();
        match leaflet::tile_layer(&config.tiles.url_template, &tile_options) {
            Ok(tiles) => map.add_layer(&tiles),
            Err(e) => {
                map.remove();
                return Err(backend_error("L.tileLayer", e));
            }
        }
        Ok(map)
    }

    fn create_group(
        &mut self,
        map: &LeafletMap,
        kind: EntityKind,
        config: &MapConfig,
    ) -> Result<LeafletGroup, MapError> {
        let cluster_px = kind.style().cluster_px;
        let icon = Closure::<dyn FnMut(MarkerCluster) -> leaflet::DivIcon>::wrap(Box::new(
            move |cluster: MarkerCluster| {
                leaflet::div_icon(
                    &Options::new()
                        .set("html", cluster_icon_html(kind, cluster.get_child_count()))
                        .set("className", "")
                        .set("iconSize", square(cluster_px))
                        .build(),
                )
            },
        ));

        let cluster = &config.cluster;
        let options = Options::new()
            .set("maxClusterRadius", cluster.max_cluster_radius)
            .set("disableClusteringAtZoom", u32::from(cluster.disable_clustering_at_zoom))
            .set("spiderfyOnMaxZoom", false)
            .set("showCoverageOnHover", false)
            .set("zoomToBoundsOnClick", false)
            .set("iconCreateFunction", icon.as_ref().clone())
            .build();
        let layer =
            leaflet::marker_cluster_group(&options).map_err(|e| backend_error("L.markerClusterGroup", e))?;

        let target = map.clone();
        let zoom_rule = cluster.clone();
        let on_click = Closure::<dyn FnMut(ClusterEvent)>::wrap(Box::new(move |e: ClusterEvent| {
            let zoom = zoom_rule.click_zoom(target.get_zoom(), target.get_max_zoom());
            target.set_view(&e.layer().get_lat_lng(), zoom);
        }));
        layer.on("clusterclick", on_click.as_ref().unchecked_ref());

        Ok(LeafletGroup {
            kind,
            layer,
            _icon: icon,
            on_click,
        })
    }

    fn add_markers(&mut self, group: &LeafletGroup, markers: Vec<MarkerSpec>) -> Result<(), MapError> {
        let marker_px = group.kind.style().marker_px;
        let layers = Array::new();
        for spec in markers {
            let icon = leaflet::div_icon(
                &Options::new()
                    .set("html", marker_icon_html(group.kind))
                    .set("className", "")
                    .set("iconSize", square(marker_px))
                    .build(),
            );
            let marker = leaflet::marker(
                &leaflet::lat_lng(spec.lat, spec.lon),
                &Options::new().set("icon", icon).build(),
            );
            marker.bind_popup(&spec.popup_html);
            layers.push(&marker);
        }
        debug!("{}: adding {} markers", group.kind, layers.length());
        group
            .layer
            .add_layers(&layers)
            .map_err(|e| backend_error("addLayers", e))
    }

    fn attach(&mut self, map: &LeafletMap, group: &LeafletGroup) {
        if !map.has_layer(&group.layer) {
            map.add_layer(&group.layer);
        }
    }

    fn detach(&mut self, map: &LeafletMap, group: &LeafletGroup) {
        if map.has_layer(&group.layer) {
            map.remove_layer(&group.layer);
        }
    }

    fn release(&mut self, map: LeafletMap, groups: Vec<LeafletGroup>) {
        for group in &groups {
            group.layer.off("clusterclick", group.on_click.as_ref().unchecked_ref());
            group.layer.clear_layers();
        }
        map.remove();
        // Closures are freed only now that nothing on the JS side can call them.
        drop(groups);
    }
}
