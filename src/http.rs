//! HTTP tile store backed by `reqwest`'s blocking client.
//!
//! Every non-success response is expected to carry a JSON `{error}` body; its
//! message is surfaced unchanged as [`Error::NetworkError`]. Nothing is retried.

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::assets;
use crate::preset::{LayoutParams, LayoutPreset};
use crate::store::{
    ColorPreset, IconQuery, IconRecord, IconUpload, RenderReceipt, RenderRecord, RenderRequest,
    TileStore,
};
use crate::{EditorConfig, Error, Result};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

pub struct HttpStore {
    client: Client,
    base: Url,
    user_agent: String,
}

impl HttpStore {
    pub fn new(config: &EditorConfig) -> Result<Self> {
        let base = Url::parse(&config.api_base_url).map_err(|e| {
            Error::ConfigError(format!("Invalid API base URL {}: {}", config.api_base_url, e))
        })?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                Error::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve a server path (or absolute URL) against the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::NetworkError(format!("Invalid URL {}: {}", path, e)))
    }

    fn send(&self, req: RequestBuilder) -> Result<Response> {
        let res = req
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(|e| Error::NetworkError(format!("Request failed: {}", e)))?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        log::debug!("{} -> {}", status, message);
        Err(Error::NetworkError(message))
    }

    fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let res = self.send(req)?;
        let body = res
            .text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.resolve(path)?;
        log::debug!("GET {}", url);
        self.json(self.client.get(url))
    }
}

impl TileStore for HttpStore {
    fn list_colors(&self) -> Result<Vec<ColorPreset>> {
        self.get("/api/colors")
    }

    fn list_icons(&self, query: &IconQuery) -> Result<Vec<IconRecord>> {
        let mut url = self.resolve("/api/icons")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = query.query.as_deref().filter(|q| !q.is_empty()) {
                pairs.append_pair("query", q);
            }
            if let Some(t) = query.tag.as_deref().filter(|t| !t.is_empty()) {
                pairs.append_pair("tag", t);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        log::debug!("GET {}", url);
        self.json(self.client.get(url))
    }

    fn upload_icon(&self, upload: &IconUpload) -> Result<String> {
        let part = multipart::Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let mut form = multipart::Form::new()
            .text("name", upload.name.clone())
            .part("file", part);
        if let Some(tags) = &upload.tags {
            form = form.text("tags", tags.clone());
        }
        let url = self.resolve("/api/icons")?;
        log::info!("uploading icon '{}' ({} bytes)", upload.name, upload.bytes.len());
        let created: Created = self.json(self.client.post(url).multipart(form))?;
        Ok(created.id)
    }

    fn delete_icon(&self, id: &str) -> Result<()> {
        let url = self.resolve(&format!("/api/icons/{}", id))?;
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn list_presets(&self) -> Result<Vec<LayoutPreset>> {
        self.get("/api/layout-presets")
    }

    fn create_preset(&self, name: &str, params: &LayoutParams) -> Result<String> {
        let url = self.resolve("/api/layout-presets")?;
        let body = json!({ "name": name, "params": params });
        let created: Created = self.json(self.client.post(url).json(&body))?;
        Ok(created.id)
    }

    fn update_preset(&self, id: &str, name: &str, params: &LayoutParams) -> Result<()> {
        let url = self.resolve(&format!("/api/layout-presets/{}", id))?;
        let body = json!({ "name": name, "params": params });
        self.send(self.client.put(url).json(&body))?;
        Ok(())
    }

    fn delete_preset(&self, id: &str) -> Result<()> {
        let url = self.resolve(&format!("/api/layout-presets/{}", id))?;
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn render(&self, request: &RenderRequest) -> Result<RenderReceipt> {
        let url = self.resolve("/api/render")?;
        log::info!("requesting render '{}'", request.name);
        self.json(self.client.post(url).json(request))
    }

    fn list_renders(&self) -> Result<Vec<RenderRecord>> {
        self.get("/api/renders")
    }

    fn fetch_asset(&self, locator: &str) -> Result<Vec<u8>> {
        if let Some(decoded) = assets::decode_data_url(locator) {
            return decoded;
        }
        let url = self.resolve(locator)?;
        log::debug!("GET {}", url);
        let res = self.send(self.client.get(url))?;
        let bytes = res
            .bytes()
            .map_err(|e| Error::NetworkError(format!("Failed to read asset: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
