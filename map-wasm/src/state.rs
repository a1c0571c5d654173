use std::cell::RefCell;
use std::rc::Rc;

use map_core::{CatalogCache, MapConfig, MapEngine};
use wasm_bindgen::JsValue;
use web_sys::Window;

use crate::backend::LeafletBackend;

/// Runtime state shared by the exported functions. The engine is only ever
/// borrowed between awaits, never across one.
pub struct State {
    pub window: Window,
    pub engine: RefCell<MapEngine<LeafletBackend>>,
    pub catalog: CatalogCache,
}

impl State {
    pub fn new(window: Window, config: MapConfig) -> Self {
        State {
            window,
            engine: RefCell::new(MapEngine::new(LeafletBackend, config)),
            catalog: CatalogCache::new(),
        }
    }
}

thread_local! {
    pub static STATE: RefCell<Option<Rc<State>>> = const { RefCell::new(None) };
}

pub fn current() -> Result<Rc<State>, JsValue> {
    STATE
        .with(|st| st.borrow().clone())
        .ok_or_else(|| JsValue::from_str("map module not started"))
}
