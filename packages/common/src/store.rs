//! External collaborators the renderer reads from.
//!
//! The engine treats every store as a pure, idempotent read function. The in-memory
//! implementations below back the CLI and the test suites; hosts plug in their own.

use crate::error::{CommonError, CommonResult};
use etch_blocks::{parse_component, ComponentDefinition};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Component definitions by id
pub trait ComponentStore {
    /// Load a component definition; `None` when missing or not a component
    fn load(&self, id: &str) -> Option<Arc<ComponentDefinition>>;
}

/// Global loop presets (named, reusable data sources)
pub trait LoopPresetStore {
    /// Materialize a preset's items; `None` when `preset` is not a preset
    fn resolve(&self, preset: &str, params: &IndexMap<String, Json>) -> Option<Vec<Json>>;

    fn is_valid_id(&self, token: &str) -> bool;

    /// Map a legacy preset key to its id
    fn find_by_key(&self, token: &str) -> Option<String>;
}

/// Remote SVG markup
pub trait SvgStore {
    /// Fetch sanitized SVG markup
    fn fetch(&self, url: &str) -> CommonResult<String>;

    /// Mark every cached document stale. Called whenever the host persists an edit.
    fn bump_cache(&self);
}

/// In-memory component store
#[derive(Default)]
pub struct MemoryComponentStore {
    components: HashMap<String, Arc<ComponentDefinition>>,
}

impl MemoryComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: ComponentDefinition) {
        self.components
            .insert(component.id.clone(), Arc::new(component));
    }

    pub fn with(mut self, component: ComponentDefinition) -> Self {
        self.insert(component);
        self
    }

    /// Load every `*.json` component definition in a directory
    pub fn load_dir(dir: &Path) -> CommonResult<Self> {
        let mut store = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let component = parse_component(&content)?;
            debug!(component = %component.id, path = %path.display(), "Loaded component");
            store.insert(component);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentStore for MemoryComponentStore {
    fn load(&self, id: &str) -> Option<Arc<ComponentDefinition>> {
        self.components.get(id).cloned()
    }
}

/// A preset with static items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopPreset {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub items: Vec<Json>,
}

/// In-memory preset store. Honors `limit` and `offset` parameters.
#[derive(Default)]
pub struct MemoryLoopPresetStore {
    presets: IndexMap<String, LoopPreset>,
}

impl MemoryLoopPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, preset: LoopPreset) {
        self.presets.insert(preset.id.clone(), preset);
    }

    pub fn with(mut self, preset: LoopPreset) -> Self {
        self.insert(preset);
        self
    }

    /// Load presets from a JSON file holding an array of presets
    pub fn load_file(path: &Path) -> CommonResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let presets: Vec<LoopPreset> = serde_json::from_str(&content)?;
        let mut store = Self::new();
        for preset in presets {
            store.insert(preset);
        }
        Ok(store)
    }
}

fn numeric_param(params: &IndexMap<String, Json>, name: &str) -> Option<usize> {
    let value = params
        .get(name)
        .or_else(|| params.get(&format!("${}", name)))?;
    match value {
        Json::Number(n) => n.as_f64().filter(|n| *n >= 0.0).map(|n| n as usize),
        Json::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

impl LoopPresetStore for MemoryLoopPresetStore {
    fn resolve(&self, preset: &str, params: &IndexMap<String, Json>) -> Option<Vec<Json>> {
        let preset = self.presets.get(preset)?;
        let offset = numeric_param(params, "offset").unwrap_or(0);
        let limit = numeric_param(params, "limit").unwrap_or(usize::MAX);

        Some(
            preset
                .items
                .iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        )
    }

    fn is_valid_id(&self, token: &str) -> bool {
        self.presets.contains_key(token)
    }

    fn find_by_key(&self, token: &str) -> Option<String> {
        self.presets
            .values()
            .find(|p| p.key.as_deref() == Some(token))
            .map(|p| p.id.clone())
    }
}

static XML_PROLOG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<\?xml.*?\?>|<!DOCTYPE[^>]*>|<!--.*?-->").unwrap());
static SCRIPT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<script\b[^>]*/>").unwrap());
static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

/// Strip prolog, comments, scripts and event handlers from SVG markup
pub fn sanitize_svg(markup: &str) -> String {
    let out = XML_PROLOG.replace_all(markup, "");
    let out = SCRIPT_ELEMENT.replace_all(&out, "");
    let out = EVENT_HANDLER.replace_all(&out, "");
    out.trim().to_string()
}

/// In-memory SVG documents keyed by URL (falls back to the URL's file name)
#[derive(Default)]
pub struct MemorySvgStore {
    documents: HashMap<String, String>,
}

impl MemorySvgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, markup: impl Into<String>) {
        self.documents.insert(url.into(), markup.into());
    }

    pub fn with(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(url, markup);
        self
    }

    /// Load every `*.svg` file in a directory, keyed by file name
    pub fn load_dir(dir: &Path) -> CommonResult<Self> {
        let mut store = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("svg") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let markup = std::fs::read_to_string(&path)?;
                store.insert(name.to_string(), markup);
            }
        }
        Ok(store)
    }
}

impl SvgStore for MemorySvgStore {
    fn fetch(&self, url: &str) -> CommonResult<String> {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        let markup = self
            .documents
            .get(url)
            .or_else(|| self.documents.get(file_name))
            .ok_or_else(|| CommonError::SvgFetch {
                url: url.to_string(),
                reason: "not found".to_string(),
            })?;

        if !markup.contains("<svg") {
            return Err(CommonError::SvgFetch {
                url: url.to_string(),
                reason: "response is not SVG markup".to_string(),
            });
        }
        Ok(sanitize_svg(markup))
    }

    /// Documents are read from memory on every fetch, there is nothing to invalidate.
    fn bump_cache(&self) {}
}

/// Caches successful fetches until the next [`SvgStore::bump_cache`]
pub struct CachedSvgStore<S> {
    inner: S,
    generation: AtomicU64,
    cache: Mutex<HashMap<String, (u64, String)>>,
}

impl<S: SvgStore> CachedSvgStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            generation: AtomicU64::new(0),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: SvgStore> SvgStore for CachedSvgStore<S> {
    fn fetch(&self, url: &str) -> CommonResult<String> {
        let generation = self.generation.load(Ordering::SeqCst);
        if let Ok(cache) = self.cache.lock() {
            if let Some((cached_at, markup)) = cache.get(url) {
                if *cached_at == generation {
                    return Ok(markup.clone());
                }
            }
        }

        let markup = self.inner.fetch(url)?;
        match self.cache.lock() {
            Ok(mut cache) => {
                cache.insert(url.to_string(), (generation, markup.clone()));
            }
            Err(_) => warn!(url, "SVG cache lock poisoned, skipping cache write"),
        }
        Ok(markup)
    }

    fn bump_cache(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.bump_cache();
    }
}

/// Stores with nothing in them
pub struct EmptyStores;

impl ComponentStore for EmptyStores {
    fn load(&self, _id: &str) -> Option<Arc<ComponentDefinition>> {
        None
    }
}

impl LoopPresetStore for EmptyStores {
    fn resolve(&self, _preset: &str, _params: &IndexMap<String, Json>) -> Option<Vec<Json>> {
        None
    }

    fn is_valid_id(&self, _token: &str) -> bool {
        false
    }

    fn find_by_key(&self, _token: &str) -> Option<String> {
        None
    }
}

impl SvgStore for EmptyStores {
    fn fetch(&self, url: &str) -> CommonResult<String> {
        Err(CommonError::SvgFetch {
            url: url.to_string(),
            reason: "no SVG store configured".to_string(),
        })
    }

    fn bump_cache(&self) {}
}
