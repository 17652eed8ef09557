//! Requests to the stem-separation service.

use anyhow::anyhow;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// What the user asked to separate.
pub enum LoadRequest {
    File(web::File),
    Link(String),
}

/// Raw reply: HTTP status and body text. Parsing is left to the session.
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST the request to its endpoint and read the reply body.
pub async fn send(endpoint: &str, request: LoadRequest) -> anyhow::Result<Reply> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let init = web::RequestInit::new();
    init.set_method("POST");
    init.set_mode(web::RequestMode::Cors);

    match request {
        LoadRequest::File(file) => {
            let form = web::FormData::new().map_err(|e| anyhow!("FormData: {:?}", e))?;
            form.append_with_blob_and_filename("audio", &file, &file.name())
                .map_err(|e| anyhow!("FormData append: {:?}", e))?;
            init.set_body(&form);
        }
        LoadRequest::Link(url) => {
            let headers = web::Headers::new().map_err(|e| anyhow!("Headers: {:?}", e))?;
            headers
                .set("Content-Type", "application/json")
                .map_err(|e| anyhow!("Headers set: {:?}", e))?;
            init.set_headers(&headers);
            let body = serde_json::json!({ "url": url }).to_string();
            init.set_body(&JsValue::from_str(&body));
        }
    }

    let req = web::Request::new_with_str_and_init(endpoint, &init)
        .map_err(|e| anyhow!("request {endpoint}: {:?}", e))?;
    let resp: web::Response = JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(|e| anyhow!("could not reach {endpoint}: {:?}", e))?
        .dyn_into()
        .map_err(|_| anyhow!("{endpoint}: not a Response"))?;
    let status = resp.status();
    let text = JsFuture::from(resp.text().map_err(|e| anyhow!("{:?}", e))?)
        .await
        .map_err(|e| anyhow!("read {endpoint}: {:?}", e))?;
    Ok(Reply {
        status,
        body: text.as_string().unwrap_or_default(),
    })
}

/// Resolve an asset url the backend handed out. Relative paths are served by
/// the backend, not by the page.
pub fn resolve_asset_url(base: &str, url: &str) -> String {
    match web::Url::new_with_base(url, &format!("{base}/")) {
        Ok(u) => u.href(),
        Err(_) => url.to_string(),
    }
}
