//! Registry of connected services.

use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use mosaic_tiles::{Record, Value, METADATA_KEY};
use mosaic_types::ServiceAddr;

/// A connected information service.
///
/// Identity is the address alone: two registrations with the same address
/// describe the same service, and the later one wins. Dependencies form a
/// tree of further services queried before this one; dependency nodes carry
/// no presentation fields of their own.
#[derive(Debug, Clone)]
pub struct Microservice {
    addr: ServiceAddr,
    name: Option<String>,
    creator: Option<String>,
    tile: Option<String>,
    dependencies: Vec<Microservice>,
    max_age: f64,
}

impl Microservice {
    /// Creates a service with no dependencies and no presentation fields.
    pub fn new(addr: ServiceAddr) -> Self {
        Self {
            addr,
            name: None,
            creator: None,
            tile: None,
            dependencies: Vec::new(),
            max_age: 0.0,
        }
    }

    /// Attaches the dependency tree.
    pub fn with_dependencies(mut self, dependencies: Vec<Microservice>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Attaches the presentation fields shown on the service's tile.
    pub fn with_presentation(
        mut self,
        name: impl Into<String>,
        creator: impl Into<String>,
        tile: impl Into<String>,
    ) -> Self {
        self.name = Some(name.into());
        self.creator = Some(creator.into());
        self.tile = Some(tile.into());
        self
    }

    pub fn addr(&self) -> &ServiceAddr {
        &self.addr
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dependencies(&self) -> &[Microservice] {
        &self.dependencies
    }

    /// Freshness window of the service's responses, in seconds. Zero until
    /// the first response reveals it.
    pub fn max_age(&self) -> f64 {
        self.max_age
    }

    /// Starts the service's aggregate record: the `_metadata` block carrying
    /// its presentation fields, with absent fields as `null`.
    pub fn metadata_record(&self) -> Record {
        let mut meta = Record::new();
        meta.insert("name", optional_text(&self.name));
        meta.insert("creator", optional_text(&self.creator));
        meta.insert("tile", optional_text(&self.tile));
        let mut record = Record::new();
        record.insert(METADATA_KEY, Value::Nested(meta));
        record
    }
}

fn optional_text(field: &Option<String>) -> Value {
    match field {
        Some(text) => Value::text(text.clone()),
        None => Value::null(),
    }
}

impl PartialEq for Microservice {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for Microservice {}

impl Hash for Microservice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

/// The set of currently connected services, keyed by address.
///
/// Iteration order is registration order, which fixes the order tiles appear
/// in aggregate responses.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    services: IndexMap<ServiceAddr, Microservice>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, replacing any previous registration at the same
    /// address (the slot keeps its position).
    pub fn register(&mut self, service: Microservice) {
        tracing::info!("connection received from: {}", service.addr());
        self.services.insert(service.addr().clone(), service);
    }

    /// Removes the service at `addr`. Removing an unknown address is a no-op.
    pub fn deregister(&mut self, addr: &ServiceAddr) -> bool {
        self.services.shift_remove(addr).is_some()
    }

    pub fn get(&self, addr: &ServiceAddr) -> Option<&Microservice> {
        self.services.get(addr)
    }

    /// Iterates registered services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &Microservice> {
        self.services.values()
    }

    /// Records a service's freshness window once it is first learned from a
    /// response; an already-known window is kept.
    pub fn record_max_age(&mut self, addr: &ServiceAddr, max_age: f64) {
        if let Some(service) = self.services.get_mut(addr) {
            if service.max_age == 0.0 {
                service.max_age = max_age;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> ServiceAddr {
        ServiceAddr::new("10.0.0.1", port).expect("valid addr")
    }

    #[test]
    fn identity_is_the_address_alone() {
        let a = Microservice::new(addr(5000)).with_presentation("a", "x", "t1");
        let b = Microservice::new(addr(5000)).with_presentation("b", "y", "t2");
        assert_eq!(a, b);

        let c = Microservice::new(addr(5001));
        assert_ne!(a, c);
    }

    #[test]
    fn reregistration_replaces_the_entry() {
        let mut registry = Registry::new();
        registry.register(Microservice::new(addr(5000)).with_presentation("old", "c", "t"));
        registry.register(Microservice::new(addr(5000)).with_presentation("new", "c", "t"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&addr(5000)).and_then(|s| s.name()), Some("new"));
    }

    #[test]
    fn deregistering_an_unknown_address_is_a_noop() {
        let mut registry = Registry::new();
        registry.register(Microservice::new(addr(5000)));
        assert!(!registry.deregister(&addr(9999)));
        assert!(registry.deregister(&addr(5000)));
        assert!(registry.is_empty());
    }

    #[test]
    fn max_age_is_only_learned_once() {
        let mut registry = Registry::new();
        registry.register(Microservice::new(addr(5000)));
        registry.record_max_age(&addr(5000), 120.0);
        registry.record_max_age(&addr(5000), 999.0);
        assert_eq!(registry.get(&addr(5000)).map(|s| s.max_age()), Some(120.0));
    }

    #[test]
    fn metadata_record_carries_presentation_fields() {
        let service = Microservice::new(addr(5000)).with_presentation("svc", "team", "Weather");
        let record = service.metadata_record();
        let meta = record.metadata().expect("metadata block");
        assert_eq!(meta.get("name"), Some(&Value::text("svc")));
        assert_eq!(meta.get("creator"), Some(&Value::text("team")));
        assert_eq!(meta.get("tile"), Some(&Value::text("Weather")));
    }

    #[test]
    fn absent_presentation_fields_are_null() {
        let record = Microservice::new(addr(5000)).metadata_record();
        let meta = record.metadata().expect("metadata block");
        assert_eq!(meta.get("name"), Some(&Value::null()));
    }
}
