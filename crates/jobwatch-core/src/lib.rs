//! Core domain model for JobWatch: listing records, snapshots, and the pure
//! helpers (field extraction, diffing, scoring, distance) built on them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub mod diff;
pub mod extract;
pub mod geo;
pub mod relevance;

pub const CRATE_NAME: &str = "jobwatch-core";

/// Public job-search service root. Relative detail links are resolved against it.
pub const DEFAULT_API_BASE: &str = "https://rest.arbeitsagentur.de/jobboerse/jobsuche-service";

/// Synthetic key recording which search produced a listing.
pub const BUCKET_KEY: &str = "_bucket";

/// Timestamp layout used in snapshot files (local time, second precision).
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One job posting as returned by the search endpoint.
///
/// The upstream payload is kept verbatim; every logical field is derived on
/// demand through [`extract`], so records written to a snapshot round-trip
/// to exactly the shape the API produced (plus `_bucket`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingRecord(pub Map<String, JsonValue>);

/// Richer per-listing payload fetched from a listing's detail link.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailRecord(pub Map<String, JsonValue>);

impl ListingRecord {
    pub fn new(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    /// Stable identifier, or `None` when no candidate key resolves.
    pub fn id(&self) -> Option<String> {
        extract::listing_id(&self.0)
    }

    pub fn title(&self) -> String {
        extract::title(&self.0)
    }

    pub fn employer(&self) -> String {
        extract::employer(&self.0)
    }

    pub fn location(&self) -> String {
        extract::location(&self.0)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        extract::coordinates(&self.0)
    }

    pub fn bucket(&self) -> String {
        extract::short_field(&self.0, &[BUCKET_KEY])
    }

    pub fn detail_link(&self, api_base: &str) -> Option<String> {
        extract::detail_link(&self.0, api_base)
    }

    pub fn web_link(&self) -> Option<String> {
        extract::web_link(&self.0)
    }

    pub fn set_bucket(&mut self, label: impl Into<String>) {
        self.0
            .insert(BUCKET_KEY.to_string(), JsonValue::String(label.into()));
    }
}

impl DetailRecord {
    pub fn new(fields: Map<String, JsonValue>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn id(&self) -> Option<String> {
        extract::listing_id(&self.0)
    }

    pub fn employer(&self) -> String {
        extract::employer(&self.0)
    }

    pub fn location(&self) -> String {
        extract::location(&self.0)
    }

    pub fn description(&self) -> Option<String> {
        extract::description(&self.0)
    }
}

/// Which of the two searches produced a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    OnSite { radius_km: u32 },
    HomeOffice { radius_km: u32 },
}

impl Bucket {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::OnSite { radius_km } => write!(f, "On-site ({radius_km} km)"),
            Bucket::HomeOffice { radius_km } => write!(f, "Home office ({radius_km} km)"),
        }
    }
}

/// Baseline of previously seen listings, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub items: Vec<ListingRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_none() && self.items.is_empty()
    }
}
