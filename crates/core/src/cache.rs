//! Location-keyed cache of service responses.
//!
//! Entries are valid for the owning service's `max-age` window, as learned
//! from its `Cache-Control` response header. A service whose window is still
//! unknown never hits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mosaic_tiles::Record;
use mosaic_types::{Coordinates, ServiceAddr};

use crate::registry::Microservice;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Record,
    stored_at: DateTime<Utc>,
}

/// Cached service responses keyed by query point and service address.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: HashMap<Coordinates, HashMap<ServiceAddr, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a response for `(coords, addr)`, replacing any previous entry.
    pub fn insert(
        &mut self,
        coords: Coordinates,
        addr: ServiceAddr,
        body: Record,
        now: DateTime<Utc>,
    ) {
        self.entries
            .entry(coords)
            .or_default()
            .insert(addr, CacheEntry { body, stored_at: now });
    }

    /// Returns the cached body for a service at a query point, if it is still
    /// inside the service's freshness window.
    pub fn lookup(
        &self,
        coords: &Coordinates,
        service: &Microservice,
        now: DateTime<Utc>,
    ) -> Option<&Record> {
        if service.max_age() == 0.0 {
            tracing::debug!("cache miss: no known max-age for {}", service.addr());
            return None;
        }

        let entry = match self
            .entries
            .get(coords)
            .and_then(|per_service| per_service.get(service.addr()))
        {
            Some(entry) => entry,
            None => {
                tracing::debug!("cache miss: no entry for {} at {}", service.addr(), coords);
                return None;
            }
        };

        let age = (now - entry.stored_at).num_milliseconds() as f64 / 1000.0;
        if age < service.max_age() {
            tracing::debug!("cache hit for {} at {}", service.addr(), coords);
            Some(&entry.body)
        } else {
            tracing::debug!(
                "cache miss: entry for {} exceeded max-age {}",
                service.addr(),
                service.max_age()
            );
            None
        }
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Total number of cached responses across all query points.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracts the `max-age` value, in seconds, from a `Cache-Control` header.
///
/// Other directives around it are ignored; a missing or unparsable directive
/// yields `None`.
pub fn parse_max_age(header: &str) -> Option<f64> {
    header.split(',').find_map(|directive| {
        let directive = directive.trim();
        let rest = directive.strip_prefix("max-age")?;
        let value = rest.trim_start().strip_prefix('=')?;
        value.trim().parse::<f64>().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mosaic_tiles::Value;

    fn coords() -> Coordinates {
        Coordinates::new(43.9, -78.8).expect("valid coords")
    }

    fn addr() -> ServiceAddr {
        ServiceAddr::new("10.0.0.1", 5000).expect("valid addr")
    }

    fn body(text: &str) -> Record {
        let mut record = Record::new();
        record.insert("payload", Value::text(text));
        record
    }

    fn service_with_max_age(max_age: f64) -> Microservice {
        let mut registry = crate::registry::Registry::new();
        registry.register(Microservice::new(addr()));
        registry.record_max_age(&addr(), max_age);
        registry.get(&addr()).expect("registered").clone()
    }

    #[test]
    fn unknown_max_age_never_hits() {
        let mut cache = ResponseCache::new();
        let now = Utc::now();
        cache.insert(coords(), addr(), body("fresh"), now);
        let service = Microservice::new(addr());
        assert!(cache.lookup(&coords(), &service, now).is_none());
    }

    #[test]
    fn entry_hits_inside_the_window() {
        let mut cache = ResponseCache::new();
        let stored = Utc::now();
        cache.insert(coords(), addr(), body("fresh"), stored);
        let service = service_with_max_age(60.0);
        let later = stored + Duration::seconds(30);
        assert_eq!(cache.lookup(&coords(), &service, later), Some(&body("fresh")));
    }

    #[test]
    fn entry_expires_at_the_window_edge() {
        let mut cache = ResponseCache::new();
        let stored = Utc::now();
        cache.insert(coords(), addr(), body("stale"), stored);
        let service = service_with_max_age(60.0);
        let later = stored + Duration::seconds(60);
        assert!(cache.lookup(&coords(), &service, later).is_none());
    }

    #[test]
    fn other_locations_do_not_hit() {
        let mut cache = ResponseCache::new();
        let now = Utc::now();
        cache.insert(coords(), addr(), body("here"), now);
        let service = service_with_max_age(60.0);
        let elsewhere = Coordinates::new(0.0, 0.0).expect("valid coords");
        assert!(cache.lookup(&elsewhere, &service, now).is_none());
    }

    #[test]
    fn clear_empties_every_location() {
        let mut cache = ResponseCache::new();
        let now = Utc::now();
        cache.insert(coords(), addr(), body("a"), now);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn max_age_directive_parses_from_header() {
        assert_eq!(parse_max_age("max-age=300"), Some(300.0));
        assert_eq!(parse_max_age("public, max-age=86400"), Some(86400.0));
        assert_eq!(parse_max_age("max-age = 12.5"), Some(12.5));
        assert_eq!(parse_max_age("no-store"), None);
        assert_eq!(parse_max_age("max-age=soon"), None);
    }
}
