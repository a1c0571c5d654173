use js_sys::{Object, Reflect};
use wasm_bindgen::JsValue;

/// Plain JS options object filled by property assignment.
pub struct Options(Object);

impl Options {
    pub fn new() -> Self {
        Options(Object::new())
    }

    pub fn set(self, key: &str, value: impl Into<JsValue>) -> Self {
        let _ = Reflect::set(self.0.as_ref(), &JsValue::from_str(key), &value.into());
        self
    }

    pub fn build(self) -> Object {
        self.0
    }
}
