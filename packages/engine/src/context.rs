//! Lexically scoped, copy-on-extend context.
//!
//! A [`Context`] is a chain of immutable frames. Extending it pushes a new frame that
//! shares every ancestor, so a child scope never mutates what its parent sees and
//! dropping the child discards its bindings.

use crate::error::EngineResult;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

/// Root keys the host supplies. Paths under these resolve to null when missing instead of
/// being read as literal text.
pub const ROOT_KEYS: &[&str] = &[
    "this", "user", "site", "url", "options", "term", "taxonomy", "archive", "props",
];

struct Frame {
    bindings: IndexMap<String, Value>,
    parent: Option<Arc<Frame>>,
}

#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Frame>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new context with one extra binding. `self` is unchanged.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Context {
        let mut bindings = IndexMap::with_capacity(1);
        bindings.insert(key.into(), value.into());
        self.push(bindings)
    }

    /// A new context with several extra bindings.
    pub fn extend<K, I>(&self, bindings: I) -> Context
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let bindings: IndexMap<String, Value> =
            bindings.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if bindings.is_empty() {
            return self.clone();
        }
        self.push(bindings)
    }

    fn push(&self, bindings: IndexMap<String, Value>) -> Context {
        Context {
            head: Some(Arc::new(Frame {
                bindings,
                parent: self.head.clone(),
            })),
        }
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.head.as_deref(), |frame| frame.parent.as_deref())
    }

    /// Innermost binding for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.frames().find_map(|frame| frame.bindings.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether a path rooted at `key` should be read from the context.
    pub fn is_root(&self, key: &str) -> bool {
        ROOT_KEYS.contains(&key) || self.contains(key)
    }

    /// Follow `root.a.b` through nested values.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root, rest),
            None => (path, ""),
        };
        self.get(root)?.get_path(rest)
    }

    /// Visible keys, innermost first.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for frame in self.frames() {
            for key in frame.bindings.keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    /// Flatten visible bindings into one object.
    pub fn to_value(&self) -> Value {
        let map = self
            .keys()
            .into_iter()
            .filter_map(|k| self.get(k).map(|v| (k.to_string(), v.clone())))
            .collect::<IndexMap<_, _>>();
        Value::Object(map)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("keys", &self.keys())
            .finish()
    }
}

/// Ancestor data supplied by the host for one render.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AmbientData {
    #[serde(rename = "this")]
    pub document: Json,
    pub user: Json,
    pub site: Json,
    pub url: Json,
    pub options: Json,
    pub term: Json,
    pub taxonomy: Json,
    pub archive: Json,
    /// Any further host-defined roots.
    #[serde(flatten)]
    pub extra: IndexMap<String, Json>,
}

impl AmbientData {
    /// Read ambient data from a JSON object. Roots left out stay unbound.
    pub fn parse(source: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn into_context(self) -> Context {
        let roots = [
            ("this", self.document),
            ("user", self.user),
            ("site", self.site),
            ("url", self.url),
            ("options", self.options),
            ("term", self.term),
            ("taxonomy", self.taxonomy),
            ("archive", self.archive),
        ];

        let bindings = roots
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .chain(self.extra)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k, Value::from(v)));

        Context::new().extend(bindings)
    }
}
