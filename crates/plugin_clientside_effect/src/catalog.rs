//! # Effect Catalog
//!
//! The catalog maps effect ids to display labels. It is fetched once from
//! the effect map the game publishes:
//!
//! ```xml
//! <map>
//!   <effect id="1" lib="Twinkle" type="fx" revision="41580"/>
//!   <effect id="33" lib="Dance1" type="dance" revision="41580"/>
//! </map>
//! ```
//!
//! Only `type="fx"` entries are selectable. A synthesized `None` entry with
//! id 0 always sits first, so a failed fetch still leaves a usable list.
//!
//! The list is swapped in atomically: a reader sees either the sentinel-only
//! list or the complete catalog, never something in between.

use crate::config::CatalogSettings;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Effect id meaning "no effect".
pub const NO_EFFECT: i32 = 0;

/// A selectable effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub effect_id: i32,
    pub label: String,
}

impl EffectDescriptor {
    pub fn new(effect_id: i32, label: impl Into<String>) -> Self {
        Self {
            effect_id,
            label: label.into(),
        }
    }

    /// The "no effect" sentinel.
    pub fn none() -> Self {
        Self::new(NO_EFFECT, "None")
    }

    pub fn is_none(&self) -> bool {
        self.effect_id == NO_EFFECT
    }
}

/// Why the catalog could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Network failure or unexpected HTTP status
    #[error("Effect catalog unavailable: {0}")]
    Unavailable(String),

    /// The document was fetched but is not a usable effect map
    #[error("Effect catalog could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct EffectMap {
    #[serde(rename = "effect", default)]
    effects: Vec<EffectEntry>,
}

#[derive(Debug, Deserialize)]
struct EffectEntry {
    #[serde(rename = "@id")]
    id: i32,
    #[serde(rename = "@lib")]
    lib: String,
    #[serde(rename = "@type")]
    kind: String,
}

/// Turns an effect map document into the selectable list: `fx` entries only,
/// sorted case-insensitively by label, with `None` prepended.
pub fn parse_effect_map(xml: &str) -> Result<Vec<EffectDescriptor>, CatalogError> {
    let map: EffectMap =
        quick_xml::de::from_str(xml).map_err(|e| CatalogError::Parse(e.to_string()))?;

    let mut effects: Vec<EffectDescriptor> = map
        .effects
        .into_iter()
        .filter(|entry| entry.kind == "fx")
        .map(|entry| EffectDescriptor::new(entry.id, entry.lib))
        .collect();
    effects.sort_by_cached_key(|effect| effect.label.to_lowercase());

    effects.insert(0, EffectDescriptor::none());
    Ok(effects)
}

/// Where the effect map document comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<String, CatalogError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Fetches the effect map with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogSource {
    pub fn new(settings: &CatalogSettings) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Read-mostly list of selectable effects.
#[derive(Debug)]
pub struct EffectCatalog {
    effects: ArcSwap<Vec<EffectDescriptor>>,
    loaded: AtomicBool,
}

impl Default for EffectCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectCatalog {
    /// A catalog holding only the `None` sentinel.
    pub fn new() -> Self {
        Self {
            effects: ArcSwap::from_pointee(vec![EffectDescriptor::none()]),
            loaded: AtomicBool::new(false),
        }
    }

    /// Fetches and installs the catalog.
    ///
    /// On failure the current list (the sentinel alone, before any successful
    /// load) stays in place and the error is logged. Returns the number of
    /// real effects installed.
    pub async fn load(&self, source: &dyn CatalogSource) -> Result<usize, CatalogError> {
        debug!("✨ Fetching effect catalog from {}", source.describe());

        let result = match source.fetch().await {
            Ok(xml) => parse_effect_map(&xml),
            Err(e) => Err(e),
        };

        match result {
            Ok(effects) => {
                let count = effects.len() - 1;
                self.effects.store(Arc::new(effects));
                self.loaded.store(true, Ordering::Release);
                info!("✨ Effect catalog loaded with {} effects", count);
                Ok(count)
            }
            Err(e) => {
                warn!("✨ {}; only 'None' will be selectable", e);
                Err(e)
            }
        }
    }

    /// Snapshot of the selectable effects, `None` first.
    pub fn effects(&self) -> Arc<Vec<EffectDescriptor>> {
        self.effects.load_full()
    }

    pub fn find(&self, effect_id: i32) -> Option<EffectDescriptor> {
        self.effects
            .load()
            .iter()
            .find(|effect| effect.effect_id == effect_id)
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Number of selectable entries, sentinel included.
    pub fn len(&self) -> usize {
        self.effects.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
