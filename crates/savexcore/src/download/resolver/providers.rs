//! Third-party conversion services, described as data.
//!
//! Each [`ProviderSpec`] says where to send the link, how to shape the request and
//! which JSON pointers may hold the media URL. One [`ProviderStrategy`] executes any
//! of them. The built-in table can be replaced with a JSON file (`PROVIDERS_FILE`):
//!
//! ```json
//! [
//!   {
//!     "name": "tikwm",
//!     "platforms": ["tiktok"],
//!     "endpoint": "https://www.tikwm.com/api/",
//!     "request": "post_form",
//!     "fields": ["/data/play", "/data/hdplay"],
//!     "timeout_secs": 30
//!   }
//! ]
//! ```
//!
//! These services come and go; the built-in entries are a starting point, not a contract.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{Strategy, StrategyOutcome};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::download::link::{Platform, VideoLink};

/// How the link is sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    /// `GET endpoint?{url_param}={link}`
    GetQuery,
    /// `POST` urlencoded form `{url_param}={link}`
    PostForm,
    /// `POST` JSON object `{"{url_param}": link}`
    PostJson,
}

/// One row of the provider table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub platforms: Vec<Platform>,
    pub endpoint: String,
    pub request: RequestShape,
    /// Parameter carrying the link
    #[serde(default = "default_url_param")]
    pub url_param: String,
    /// Extra static headers (e.g. `Accept: application/json`)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON pointers tried in order for the media URL
    pub fields: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url_param() -> String {
    "url".to_string()
}

fn default_timeout_secs() -> u64 {
    config::resolver::SLOW_STRATEGY_TIMEOUT_SECS
}

impl ProviderSpec {
    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// First non-empty string found under one of `fields`.
    pub fn extract(&self, body: &serde_json::Value) -> Option<String> {
        self.fields
            .iter()
            .filter_map(|pointer| body.pointer(pointer).and_then(|v| v.as_str()))
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Built-in provider table.
pub fn builtin_providers() -> Vec<ProviderSpec> {
    let json_accept = BTreeMap::from([("Accept".to_string(), "application/json".to_string())]);
    vec![
        ProviderSpec {
            name: "tikwm".to_string(),
            platforms: vec![Platform::TikTok],
            endpoint: "https://www.tikwm.com/api/".to_string(),
            request: RequestShape::PostForm,
            url_param: default_url_param(),
            headers: BTreeMap::new(),
            fields: vec!["/data/play".to_string(), "/data/hdplay".to_string(), "/data/wmplay".to_string()],
            timeout_secs: config::resolver::SLOW_STRATEGY_TIMEOUT_SECS,
        },
        ProviderSpec {
            name: "cobalt".to_string(),
            platforms: vec![Platform::Instagram, Platform::TikTok],
            endpoint: "https://api.cobalt.tools/".to_string(),
            request: RequestShape::PostJson,
            url_param: default_url_param(),
            headers: json_accept,
            fields: vec!["/url".to_string(), "/picker/0/url".to_string()],
            timeout_secs: config::resolver::SLOW_STRATEGY_TIMEOUT_SECS,
        },
    ]
}

/// Reads a provider table from a JSON file.
pub fn load_providers(path: impl AsRef<Path>) -> AppResult<Vec<ProviderSpec>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let specs: Vec<ProviderSpec> = serde_json::from_str(&raw)?;
    if let Some(bad) = specs.iter().find(|s| s.fields.is_empty()) {
        return Err(AppError::Validation(format!("provider '{}' has no fields", bad.name)));
    }
    Ok(specs)
}

/// Provider table from `PROVIDERS_FILE`, or the built-in one if unset or unreadable.
pub fn load_configured_providers() -> Vec<ProviderSpec> {
    match config::PROVIDERS_FILE.as_deref() {
        Some(path) => match load_providers(path) {
            Ok(specs) => {
                log::info!("Loaded {} providers from {}", specs.len(), path);
                specs
            }
            Err(e) => {
                log::error!("Failed to load providers from {}: {}, using built-in table", path, e);
                builtin_providers()
            }
        },
        None => builtin_providers(),
    }
}

/// Strategies for every provider that supports `platform`, in table order.
pub fn strategies_for(platform: Platform, specs: &[ProviderSpec], client: &reqwest::Client) -> Vec<Arc<dyn Strategy>> {
    specs
        .iter()
        .filter(|spec| spec.supports(platform))
        .map(|spec| Arc::new(ProviderStrategy::new(spec.clone(), client.clone())) as Arc<dyn Strategy>)
        .collect()
}

/// Executes one [`ProviderSpec`].
pub struct ProviderStrategy {
    spec: ProviderSpec,
    client: reqwest::Client,
}

impl ProviderStrategy {
    pub fn new(spec: ProviderSpec, client: reqwest::Client) -> Self {
        Self { spec, client }
    }

    fn build_request(&self, link: &str) -> reqwest::RequestBuilder {
        let param = self.spec.url_param.as_str();
        let mut request = match self.spec.request {
            RequestShape::GetQuery => self.client.get(&self.spec.endpoint).query(&[(param, link)]),
            RequestShape::PostForm => self.client.post(&self.spec.endpoint).form(&[(param, link)]),
            RequestShape::PostJson => self
                .client
                .post(&self.spec.endpoint)
                .json(&serde_json::json!({ param: link })),
        };
        for (name, value) in &self.spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }
}

#[async_trait]
impl Strategy for ProviderStrategy {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.spec.timeout_secs)
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let response = match self.build_request(link.url.as_str()).send().await {
            Ok(r) => r,
            Err(e) => return StrategyOutcome::Failed(e.to_string()),
        };
        if !response.status().is_success() {
            return StrategyOutcome::Failed(format!("HTTP {}", response.status()));
        }
        match response.json::<serde_json::Value>().await {
            Ok(body) => StrategyOutcome::found_or_not(self.spec.extract(&body)),
            Err(e) => StrategyOutcome::Failed(format!("non-JSON response: {}", e)),
        }
    }
}
