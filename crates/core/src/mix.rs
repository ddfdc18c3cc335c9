//! Aggregation of registered services into tile records.
//!
//! One mix call fans a query point out to every registered service, resolves
//! declared dependencies first, and returns one record per service: its
//! `_metadata` block merged with the service's response body. Responses come
//! from the cache when still fresh; fetches within one call are deduplicated
//! by address.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use mosaic_tiles::{Record, Value};
use mosaic_types::{Coordinates, ServiceAddr};

use crate::cache::ResponseCache;
use crate::client::{ClientError, ServiceClient};
use crate::registry::{Microservice, Registry};

/// Runs aggregate queries against the current registry.
#[derive(Debug, Clone, Default)]
pub struct MixService;

impl MixService {
    pub fn new() -> Self {
        Self
    }

    /// Aggregates every registered service's response for `coords`.
    ///
    /// Records come back in registration order. A service that fails (error
    /// status, transport failure, undecodable body) contributes its metadata
    /// over an empty body; the query as a whole never fails. Freshness
    /// windows learned from responses are recorded on the registry.
    pub async fn mix<C>(
        &self,
        registry: &mut Registry,
        cache: &mut ResponseCache,
        client: &C,
        coords: Coordinates,
    ) -> Vec<Record>
    where
        C: ServiceClient + ?Sized,
    {
        let services: Vec<Microservice> = registry.services().cloned().collect();
        let mut pass = MixPass {
            cache,
            client,
            coords,
            now: Utc::now(),
            processed: HashMap::new(),
            learned: Vec::new(),
        };

        let mut records = Vec::with_capacity(services.len());
        for service in &services {
            let mut record = service.metadata_record();
            let body = match pass.cache.lookup(&coords, service, pass.now) {
                Some(hit) => hit.clone(),
                None => pass.query(service).await,
            };
            record.merge(body);
            records.push(record);
        }

        for (addr, max_age) in pass.learned {
            registry.record_max_age(&addr, max_age);
        }
        records
    }
}

/// State for one aggregation pass: the per-call fetch dedup map and the
/// freshness windows learned along the way.
struct MixPass<'a, C: ?Sized> {
    cache: &'a mut ResponseCache,
    client: &'a C,
    coords: Coordinates,
    now: DateTime<Utc>,
    processed: HashMap<ServiceAddr, Record>,
    learned: Vec<(ServiceAddr, f64)>,
}

impl<'a, C> MixPass<'a, C>
where
    C: ServiceClient + ?Sized,
{
    /// Queries one service, degrading failures to an empty body.
    async fn query(&mut self, service: &Microservice) -> Record {
        if let Some(seen) = self.processed.get(service.addr()) {
            return seen.clone();
        }

        let payload = if service.dependencies().is_empty() {
            self.location_payload()
        } else {
            self.dependency_data(service).await
        };

        match self.fetch(service, &payload).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("{err}");
                Record::new()
            }
        }
    }

    /// Resolves a service's dependency tree into one merged record.
    ///
    /// Each direct dependency is queried with its own resolved dependency
    /// data (leaves get the bare location payload); replies merge in
    /// dependency order. A failing dependency is skipped with a warning.
    fn dependency_data<'b>(
        &'b mut self,
        service: &'b Microservice,
    ) -> Pin<Box<dyn Future<Output = Record> + Send + 'b>> {
        Box::pin(async move {
            let mut merged = Record::new();
            for dependency in service.dependencies() {
                if let Some(seen) = self.processed.get(dependency.addr()) {
                    merged.merge(seen.clone());
                    continue;
                }

                let payload = if dependency.dependencies().is_empty() {
                    self.location_payload()
                } else {
                    self.dependency_data(dependency).await
                };

                match self.fetch(dependency, &payload).await {
                    Ok(body) => merged.merge(body),
                    Err(err) => {
                        tracing::warn!("{err}");
                        continue;
                    }
                }
            }
            merged
        })
    }

    /// One raw fetch: records the reply in the cache and the dedup map, and
    /// notes a newly learned freshness window.
    async fn fetch(
        &mut self,
        service: &Microservice,
        payload: &Record,
    ) -> Result<Record, ClientError> {
        let reply = self.client.fetch(service.addr(), payload).await?;

        if let Some(max_age) = reply.max_age {
            if service.max_age() == 0.0 {
                self.learned.push((service.addr().clone(), max_age));
            }
        }

        self.cache
            .insert(self.coords, service.addr().clone(), reply.body.clone(), self.now);
        self.processed
            .insert(service.addr().clone(), reply.body.clone());
        Ok(reply.body)
    }

    fn location_payload(&self) -> Record {
        let mut payload = Record::new();
        payload.insert("latitude", Value::number(self.coords.latitude()));
        payload.insert("longitude", Value::number(self.coords.longitude()));
        payload
    }
}
