//! # Mosaic Types
//!
//! Small validated value types shared across the mosaic crates.
//!
//! Validation happens at construction time, so the rest of the system can
//! treat a `ServiceAddr` or `Coordinates` as already well-formed.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Errors that can occur when creating a validated service address.
#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    /// The host part was empty or contained only whitespace
    #[error("host cannot be empty")]
    EmptyHost,
    /// The host part contained whitespace or a path separator
    #[error("host contains invalid characters")]
    InvalidHost,
    /// The address string had no `host:port` shape or a non-numeric port
    #[error("expected address in host:port form")]
    Malformed,
}

/// A network address of a connected service, in `host:port` form.
///
/// The host is trimmed and must be non-empty; the port is a plain TCP port.
/// The textual form is the canonical identity of a service: two services with
/// the same address are the same service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceAddr {
    host: String,
    port: u16,
}

impl ServiceAddr {
    /// Creates a new `ServiceAddr` from a host and a port.
    ///
    /// The host is trimmed of surrounding whitespace. An empty host, or a host
    /// containing whitespace or `/`, is rejected.
    pub fn new(host: impl AsRef<str>, port: u16) -> Result<Self, AddrError> {
        let host = host.as_ref().trim();
        if host.is_empty() {
            return Err(AddrError::EmptyHost);
        }
        if host.contains(char::is_whitespace) || host.contains('/') {
            return Err(AddrError::InvalidHost);
        }
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }

    /// Parses an address from its `host:port` textual form.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, AddrError> {
        let input = input.as_ref().trim();
        let (host, port) = input.rsplit_once(':').ok_or(AddrError::Malformed)?;
        let port: u16 = port.trim().parse().map_err(|_| AddrError::Malformed)?;
        Self::new(host, port)
    }

    /// Returns the host part.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port part.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServiceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl serde::Serialize for ServiceAddr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ServiceAddr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ServiceAddr::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating a validated query point.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatesError {
    /// A coordinate was NaN or infinite
    #[error("coordinates must be finite numbers")]
    NotFinite,
    /// A coordinate was outside the accepted range
    #[error("coordinate magnitude cannot exceed 90")]
    OutOfRange,
    /// The textual form was not `lat,lon`
    #[error("expected coordinates in lat,lon form")]
    Malformed,
}

/// A validated geographic query point.
///
/// Both components are bounded at magnitude 90, matching the upstream
/// acceptance rule for query locations. Values are guaranteed finite, which
/// makes the bitwise `Eq`/`Hash` impls below sound for use as cache keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a new query point, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinatesError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinatesError::NotFinite);
        }
        if latitude.abs() > 90.0 || longitude.abs() > 90.0 {
            return Err(CoordinatesError::OutOfRange);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parses a query point from its `lat,lon` textual form.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, CoordinatesError> {
        let input = input.as_ref();
        let (lat, lon) = input.split_once(',').ok_or(CoordinatesError::Malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| CoordinatesError::Malformed)?;
        let longitude: f64 = lon.trim().parse().map_err(|_| CoordinatesError::Malformed)?;
        Self::new(latitude, longitude)
    }

    /// Returns the latitude component.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude component.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// Finite-only invariant upheld by the constructor; bit equality is exact here.
impl Eq for Coordinates {}

impl Hash for Coordinates {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_round_trips_through_text() {
        let addr = ServiceAddr::new("127.0.0.1", 5000).expect("valid addr");
        assert_eq!(addr.to_string(), "127.0.0.1:5000");
        let parsed = ServiceAddr::parse("127.0.0.1:5000").expect("parse");
        assert_eq!(addr, parsed);
    }

    #[test]
    fn addr_rejects_empty_host() {
        assert!(matches!(
            ServiceAddr::new("  ", 80),
            Err(AddrError::EmptyHost)
        ));
    }

    #[test]
    fn addr_rejects_missing_port() {
        assert!(matches!(
            ServiceAddr::parse("localhost"),
            Err(AddrError::Malformed)
        ));
        assert!(matches!(
            ServiceAddr::parse("localhost:http"),
            Err(AddrError::Malformed)
        ));
    }

    #[test]
    fn addr_serde_uses_textual_form() {
        let addr = ServiceAddr::new("example.org", 8080).expect("valid addr");
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, "\"example.org:8080\"");
        let back: ServiceAddr = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }

    #[test]
    fn coordinates_accept_the_boundary() {
        assert!(Coordinates::new(90.0, -90.0).is_ok());
        assert!(matches!(
            Coordinates::new(90.1, 0.0),
            Err(CoordinatesError::OutOfRange)
        ));
        assert!(matches!(
            Coordinates::new(0.0, f64::NAN),
            Err(CoordinatesError::NotFinite)
        ));
    }

    #[test]
    fn coordinates_parse_tolerates_spaces() {
        let c = Coordinates::parse(" 43.9, -78.8 ").expect("parse");
        assert_eq!(c.latitude(), 43.9);
        assert_eq!(c.longitude(), -78.8);
    }

    #[test]
    fn coordinates_reject_garbage() {
        assert!(Coordinates::parse("43.9").is_err());
        assert!(Coordinates::parse("north,south").is_err());
    }

    #[test]
    fn equal_coordinates_hash_alike() {
        use std::collections::HashMap;
        let a = Coordinates::new(1.5, 2.5).expect("valid");
        let b = Coordinates::new(1.5, 2.5).expect("valid");
        let mut map = HashMap::new();
        map.insert(a, "entry");
        assert_eq!(map.get(&b), Some(&"entry"));
    }
}
