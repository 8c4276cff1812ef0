use std::collections::HashMap;
use std::sync::Arc;

/// Number of executing tasks per restriction key.
///
/// Lives inside the manager state, so every access already happens under the
/// manager lock; plain integers are enough.
#[derive(Debug, Default)]
pub(crate) struct RestrictionCounters {
    counts: HashMap<Arc<str>, usize>,
}

impl RestrictionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for `key`; creates a zero entry on first use.
    pub fn current(&mut self, key: &Arc<str>) -> usize {
        *self.counts.entry(Arc::clone(key)).or_insert(0)
    }

    /// Current count without creating an entry.
    pub fn get(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, key: &Arc<str>) -> usize {
        let count = self.counts.entry(Arc::clone(key)).or_insert(0);
        *count += 1;
        *count
    }

    /// Decrements, flooring at zero.
    pub fn decrement(&mut self, key: &str) -> usize {
        match self.counts.get_mut(key) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        }
    }

    /// Zeroes every known key.
    pub fn reset(&mut self) {
        self.counts.values_mut().for_each(|c| *c = 0);
    }

    /// Sorted `(key, count)` pairs with a non-zero count.
    pub fn snapshot(&self) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = self
            .counts
            .iter()
            .filter(|(_, c)| **c > 0)
            .map(|(k, c)| (k.to_string(), *c))
            .collect();
        out.sort_unstable();
        out
    }
}
