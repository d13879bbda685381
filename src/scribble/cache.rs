use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use crate::geometry::Rect;
use crate::render::SizeMode;

use super::ScribblePattern;

pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    text: String,
    size: SizeMode,
    scribble: bool,
    bounds: [u32; 4],
    intensity: u32,
}

impl PatternKey {
    pub fn new(text: &str, size: SizeMode, scribble: bool, bounds: &Rect, intensity: f32) -> Self {
        Self {
            text: text.to_string(),
            size,
            scribble,
            bounds: bounds.bits(),
            intensity: intensity.to_bits(),
        }
    }
}

/// Bounded least-recently-used store of generated patterns, owned by the
/// renderer that fills it.
pub struct PatternCache {
    entries: LruCache<PatternKey, Arc<ScribblePattern>>,
}

impl PatternCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn get_or_generate<F>(&mut self, key: PatternKey, generate: F) -> Arc<ScribblePattern>
    where
        F: FnOnce() -> ScribblePattern,
    {
        if let Some(pattern) = self.entries.get(&key) {
            debug!("scribble cache hit");
            return Arc::clone(pattern);
        }
        debug!("scribble cache miss");
        let pattern = Arc::new(generate());
        self.entries.put(key, Arc::clone(&pattern));
        pattern
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
