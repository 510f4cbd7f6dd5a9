//! Per-process archive URL cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// URL → resolved archive URL (possibly empty), filled at most once per key.
///
/// The map lock is held only to fetch the per-URL cell, so concurrent
/// resolutions of different URLs do not wait on each other, while concurrent
/// resolutions of the same URL wait for the first one to finish.
#[derive(Debug, Default)]
pub struct ArchiveCache {
    entries: Mutex<Entries>,
}

type Entries = HashMap<String, Arc<OnceLock<String>>>;

impl ArchiveCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `url`, computing it with `resolve` on first use.
    pub fn get_or_resolve(&self, url: &str, resolve: impl FnOnce() -> String) -> String {
        let cell = {
            let mut entries = self.entries();
            Arc::clone(entries.entry(url.to_owned()).or_default())
        };
        cell.get_or_init(resolve).clone()
    }

    /// Cached value for `url`, if resolved.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries();
        entries.get(url).and_then(|cell| cell.get().cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The map stays consistent even if a holder panicked: every insert is a
    /// single `entry().or_default()`.
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_resolves_once() {
        let cache = ArchiveCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache.get_or_resolve("https://x.com", || {
                calls.fetch_add(1, Ordering::SeqCst);
                "archived".to_owned()
            });
            assert_eq!(value, "archived");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("https://x.com").as_deref(), Some("archived"));
    }

    #[test]
    fn test_empty_result_is_cached() {
        let cache = ArchiveCache::new();
        let calls = AtomicUsize::new(0);

        cache.get_or_resolve("u", || {
            calls.fetch_add(1, Ordering::SeqCst);
            String::new()
        });
        cache.get_or_resolve("u", || {
            calls.fetch_add(1, Ordering::SeqCst);
            "late".to_owned()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("u").as_deref(), Some(""));
    }

    #[test]
    fn test_concurrent_same_url() {
        let cache = ArchiveCache::new();
        let calls = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    cache.get_or_resolve("same", || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(10));
                        "v".to_owned()
                    })
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_usable_after_panic_while_locked() {
        let cache = ArchiveCache::new();
        cache.get_or_resolve("before", || "a".to_owned());

        thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let _guard = cache.entries.lock().unwrap();
                panic!("holder panicked");
            });
            assert!(handle.join().is_err());
        });
        assert!(cache.entries.is_poisoned());

        assert_eq!(cache.get("before").as_deref(), Some("a"));
        assert_eq!(cache.get_or_resolve("after", || "b".to_owned()), "b");
        assert_eq!(cache.len(), 2);
    }
}
