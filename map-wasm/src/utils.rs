use js_sys::{Reflect, Uint8Array};
use map_core::{IngestError, SourceFetcher};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

/// Read a property the host page set on `window`, ignoring `undefined`/`null`.
pub fn window_global(window: &Window, key: &str) -> Option<JsValue> {
    let v = Reflect::get(window, &JsValue::from_str(key)).ok()?;
    (!v.is_undefined() && !v.is_null()).then_some(v)
}

/// Resolve a site-relative path against `window.__BASE_URL` (default `/`).
/// Absolute and data URLs pass through.
pub fn asset_url(window: &Window, path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let mut base = window_global(window, "__BASE_URL")
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| "/".to_string());
    if !base.ends_with('/') {
        base.push('/');
    }
    format!("{base}{}", p.trim_start_matches('/'))
}

/// Readable text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Fetches CSV sources over HTTP relative to the site base.
pub struct HttpFetcher {
    window: Window,
}

impl HttpFetcher {
    pub fn new(window: Window) -> Self {
        HttpFetcher { window }
    }
}

impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, IngestError> {
        let failed = |reason: String| IngestError::Fetch {
            path: path.to_string(),
            reason,
        };
        let url = asset_url(&self.window, path);
        let resp_value = JsFuture::from(self.window.fetch_with_str(&url))
            .await
            .map_err(|e| failed(js_message(&e)))?;
        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| failed("not a Response".to_string()))?;
        if !resp.ok() {
            return Err(failed(format!("HTTP {}", resp.status())));
        }
        let body = resp.array_buffer().map_err(|e| failed(js_message(&e)))?;
        let buf = JsFuture::from(body)
            .await
            .map_err(|e| failed(js_message(&e)))?;
        Ok(Uint8Array::new(&buf).to_vec())
    }
}
