//! Archive URL resolution with caching and silent fallback.

use crate::cache::ArchiveCache;
use crate::settings::ArchiveSettings;
use crate::wayback::{ArchiveService, WaybackClient};

/// Resolves archive URLs for link cards.
///
/// Never fails: any service error is logged at debug level and resolves to an
/// empty string, which callers treat as "no archive link".
pub struct ArchiveResolver {
    settings: ArchiveSettings,
    service: Box<dyn ArchiveService>,
    cache: ArchiveCache,
}

impl ArchiveResolver {
    /// Resolver using the Wayback Machine.
    #[must_use]
    pub fn new(settings: ArchiveSettings) -> Self {
        let service = Box::new(WaybackClient::new(settings.user_agent.clone()));
        Self {
            settings,
            service,
            cache: ArchiveCache::new(),
        }
    }

    /// Resolver that never makes requests.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(ArchiveSettings::default())
    }

    /// Use a different archive service.
    #[must_use]
    pub fn with_service(mut self, service: Box<dyn ArchiveService>) -> Self {
        self.service = service;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    /// Archive URL for `url`.
    ///
    /// An explicit archive URL is returned as-is without any request. Otherwise,
    /// when archiving is active, the latest capture is looked up and, with
    /// `save`, a fresh capture is requested; a submitted capture wins over the
    /// lookup result. Results are cached per URL for the life of the resolver.
    pub fn resolve(&self, url: &str, explicit: Option<&str>) -> String {
        if let Some(explicit) = explicit.filter(|explicit| !explicit.trim().is_empty()) {
            return explicit.to_owned();
        }
        if !self.settings.is_active() {
            return String::new();
        }

        self.cache.get_or_resolve(url, || self.fetch(url))
    }

    fn fetch(&self, url: &str) -> String {
        tracing::info!(url, "Looking up archive");
        let mut archive_url = match self.service.lookup(url) {
            Ok(found) => found.unwrap_or_default(),
            Err(e) => {
                tracing::debug!(url, error = %e, "Archive lookup failed");
                String::new()
            }
        };

        if self.settings.save {
            tracing::info!(url, "Submitting to SavePageNow");
            match self.service.submit(url) {
                Ok(Some(submitted)) => {
                    tracing::info!(url, archive = %submitted, "SavePageNow archived");
                    archive_url = submitted;
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(url, error = %e, "Archive submission failed"),
            }
        }

        tracing::info!(url, archive = %archive_url, "Archive resolved");
        archive_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        lookups: AtomicUsize,
        submits: AtomicUsize,
    }

    struct MockService {
        calls: Arc<Calls>,
        lookup: Option<&'static str>,
        submit: Option<&'static str>,
        fail: bool,
    }

    impl ArchiveService for MockService {
        fn lookup(&self, _url: &str) -> Result<Option<String>, ArchiveError> {
            self.calls.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ArchiveError::Status(503));
            }
            Ok(self.lookup.map(str::to_owned))
        }

        fn submit(&self, _url: &str) -> Result<Option<String>, ArchiveError> {
            self.calls.submits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ArchiveError::Status(503));
            }
            Ok(self.submit.map(str::to_owned))
        }
    }

    fn resolver(
        enabled: bool,
        save: bool,
        lookup: Option<&'static str>,
        submit: Option<&'static str>,
        fail: bool,
    ) -> (ArchiveResolver, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let settings = ArchiveSettings {
            enabled,
            save,
            ..ArchiveSettings::default()
        };
        let service = MockService {
            calls: Arc::clone(&calls),
            lookup,
            submit,
            fail,
        };
        (
            ArchiveResolver::new(settings).with_service(Box::new(service)),
            calls,
        )
    }

    #[test]
    fn test_explicit_wins_without_requests() {
        let (resolver, calls) = resolver(true, true, Some("L"), Some("S"), false);
        assert_eq!(resolver.resolve("https://x.com", Some("https://a.org/x")), "https://a.org/x");
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(calls.submits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_makes_no_requests() {
        let (resolver, calls) = resolver(false, false, Some("L"), None, false);
        assert_eq!(resolver.resolve("https://x.com", None), "");
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_lookup_cached() {
        let (resolver, calls) = resolver(true, false, Some("L"), Some("S"), false);
        assert_eq!(resolver.resolve("https://x.com", None), "L");
        assert_eq!(resolver.resolve("https://x.com", None), "L");
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(calls.submits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_submission_overrides_lookup() {
        let (resolver, calls) = resolver(false, true, Some("L"), Some("S"), false);
        assert_eq!(resolver.resolve("https://x.com", None), "S");
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(calls.submits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_submission_without_location_keeps_lookup() {
        let (resolver, _) = resolver(true, true, Some("L"), None, false);
        assert_eq!(resolver.resolve("https://x.com", None), "L");
    }

    #[test]
    fn test_failures_degrade_to_empty_and_cache() {
        let (resolver, calls) = resolver(true, true, None, None, true);
        assert_eq!(resolver.resolve("https://x.com", None), "");
        assert_eq!(resolver.resolve("https://x.com", None), "");
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cache().get("https://x.com").as_deref(), Some(""));
    }
}
