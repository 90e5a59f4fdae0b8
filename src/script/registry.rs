//! Script id → entry point lookup.

use std::collections::HashMap;

use futures::future::BoxFuture;
use tracing::warn;

use super::{ScriptManager, ScriptResult};

/// Entry point of a content script.
pub type ScriptFn = for<'a> fn(&'a mut ScriptManager) -> BoxFuture<'a, ScriptResult<()>>;

/// Registered scripts by id.
#[derive(Default, Clone)]
pub struct ScriptRegistry {
    scripts: HashMap<String, ScriptFn>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every bundled content script.
    pub fn with_content() -> Self {
        let mut registry = Self::new();
        super::content::register_all(&mut registry);
        registry
    }

    /// Register `script` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, script: ScriptFn) {
        let id = id.into();
        if self.scripts.insert(id.clone(), script).is_some() {
            warn!(script_id = %id, "Script registered twice; keeping the later one");
        }
    }

    pub fn get(&self, id: &str) -> Option<ScriptFn> {
        self.scripts.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scripts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scripts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("scripts", &self.ids())
            .finish()
    }
}
