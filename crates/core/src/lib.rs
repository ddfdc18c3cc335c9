//! # Mosaic Core
//!
//! Core logic for the mosaic aggregation middleware:
//! - a registry of connected information services and their dependency trees
//! - a location-keyed response cache honouring `Cache-Control` max-age
//! - an outbound service client abstraction
//! - the mix pipeline that fans a query out and merges the results into
//!   tile-ready records
//!
//! **No API concerns**: HTTP routing, request validation and page assembly
//! belong to the `mosaic-run` binary.

pub mod cache;
pub mod client;
pub mod mix;
pub mod registry;

pub use cache::{parse_max_age, ResponseCache};
pub use client::{ClientError, HttpServiceClient, ServiceClient, ServiceReply};
pub use mix::MixService;
pub use registry::{Microservice, Registry};
