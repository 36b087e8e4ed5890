use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::TemplateMap;

/// Process-wide snapshot of the template map.
///
/// Cloning the cache clones the handle, not the map: every clone observes
/// the same snapshot. `apply_snapshot` is the only writer and always
/// replaces the whole map; readers take the current `Arc` and drop the
/// lock immediately.
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    snapshot: Arc<RwLock<Arc<TemplateMap>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(templates: TemplateMap) -> Self {
        let cache = Self::new();
        cache.apply_snapshot(templates);
        cache
    }

    /// Replace the cached map with `templates`.
    pub fn apply_snapshot(&self, templates: TemplateMap) {
        let count = templates.len();
        *self.snapshot.write() = Arc::new(templates);
        debug!(count, "Template snapshot applied");
    }

    pub fn snapshot(&self) -> Arc<TemplateMap> {
        Arc::clone(&self.snapshot.read())
    }

    /// Body for `token`, if present in the current snapshot.
    pub fn lookup(&self, token: &str) -> Option<String> {
        self.snapshot.read().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
