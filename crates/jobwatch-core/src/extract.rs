//! Tolerant field accessors over raw API mappings.
//!
//! The job-search API has shipped several field-naming schemes across
//! endpoint versions. Each accessor tries a fixed list of candidate keys in
//! priority order and falls back to a documented default, so every accessor
//! is total over any input mapping.

use serde_json::{Map, Value as JsonValue};

use crate::ListingRecord;

pub const NO_TITLE: &str = "no title";
pub const NO_LOCATION: &str = "—";
pub const NO_DESCRIPTION: &str = "no description";

/// Public job page; the listing id is appended.
pub const WEB_DETAIL_BASE: &str = "https://www.arbeitsagentur.de/jobsuche/jobdetail/";

const ID_KEYS: &[&str] = &["refnr", "refNr", "hashId", "hashID"];
const TITLE_KEYS: &[&str] = &["titel", "beruf", "title"];
const EMPLOYER_KEYS: &[&str] = &["arbeitgeber", "arbeitgeberName", "unternehmen"];
const LOCATION_KEYS: &[&str] = &["arbeitsort", "ort", "wo"];
const DESCRIPTION_KEYS: &[&str] = &[
    "stellenbeschreibung",
    "beschreibung",
    "jobbeschreibung",
    "aufgaben",
    "anforderungen",
];
const DETAIL_RELATIONS: &[&str] = &["details", "jobdetails"];
const LISTING_KEY: &str = "stellenangebote";
const LISTING_FALLBACK_KEY: &str = "jobs";
const EMBEDDED_KEY: &str = "_embedded";

pub type JsonMap = Map<String, JsonValue>;

fn json_path<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    Some(cur)
}

/// Truthy scalar as text: non-empty strings verbatim, numbers stringified.
fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

/// First candidate key holding a non-empty scalar.
pub fn first_text(record: &JsonMap, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(scalar_text))
}

/// Like [`first_text`] but only accepts strings, trimmed, and defaults to `""`.
pub fn short_field(record: &JsonMap, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| {
            record
                .get(*key)
                .and_then(JsonValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_default()
        .to_string()
}

pub fn listing_id(record: &JsonMap) -> Option<String> {
    first_text(record, ID_KEYS)
}

pub fn title(record: &JsonMap) -> String {
    first_text(record, TITLE_KEYS).unwrap_or_else(|| NO_TITLE.to_string())
}

pub fn employer(record: &JsonMap) -> String {
    first_text(record, EMPLOYER_KEYS).unwrap_or_default()
}

/// Human-readable work location.
///
/// A plain string is returned as-is; an address object is rendered from its
/// non-empty `ort`, `region` and `land` parts.
pub fn location(record: &JsonMap) -> String {
    let Some(loc) = LOCATION_KEYS
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|v| is_truthy(v))
    else {
        return NO_LOCATION.to_string();
    };

    match loc {
        JsonValue::String(s) => s.clone(),
        JsonValue::Object(address) => {
            let parts = ["ort", "region", "land"]
                .iter()
                .filter_map(|key| address.get(*key).and_then(JsonValue::as_str))
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>();
            if parts.is_empty() {
                NO_LOCATION.to_string()
            } else {
                parts.join(", ")
            }
        }
        other => other.to_string(),
    }
}

fn coordinate(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lat_lon(coords: &JsonValue) -> Option<(f64, f64)> {
    let lat = coordinate(coords.get("lat")?)?;
    let lon = coordinate(coords.get("lon")?)?;
    Some((lat, lon))
}

/// Latitude/longitude from `arbeitsort.koordinaten`, else top-level `koordinaten`.
pub fn coordinates(record: &JsonMap) -> Option<(f64, f64)> {
    record
        .get("arbeitsort")
        .and_then(|loc| loc.get("koordinaten"))
        .and_then(lat_lon)
        .or_else(|| record.get("koordinaten").and_then(lat_lon))
}

pub fn description(record: &JsonMap) -> Option<String> {
    DESCRIPTION_KEYS.iter().find_map(|key| {
        record
            .get(*key)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(ToString::to_string)
    })
}

/// API URL of a listing's detail record.
///
/// Looks for a `details` or `jobdetails` relation under `_links`; relative
/// hrefs are resolved against `api_base`. `None` means no detail link is
/// available for this listing.
pub fn detail_link(record: &JsonMap, api_base: &str) -> Option<String> {
    let links = record.get("_links")?;
    DETAIL_RELATIONS.iter().find_map(|relation| {
        let href = links.get(*relation)?.get("href")?.as_str()?;
        if href.starts_with("http") {
            Some(href.to_string())
        } else {
            Some(format!("{}{}", api_base.trim_end_matches('/'), href))
        }
    })
}

pub fn web_link(record: &JsonMap) -> Option<String> {
    listing_id(record).map(|id| format!("{WEB_DETAIL_BASE}{id}"))
}

/// Pull the listing array out of a search response.
///
/// Accepts a top-level `stellenangebote` list, the HAL-embedded
/// `_embedded.stellenangebote` / `_embedded.jobs` lists, or a top-level
/// `jobs` list. Anything else yields an empty sequence.
pub fn extract_listings(response: &JsonValue) -> Vec<ListingRecord> {
    let candidates: [&[&str]; 4] = [
        &[LISTING_KEY],
        &[EMBEDDED_KEY, LISTING_KEY],
        &[EMBEDDED_KEY, LISTING_FALLBACK_KEY],
        &[LISTING_FALLBACK_KEY],
    ];
    let Some(items) = candidates
        .iter()
        .find_map(|path| json_path(response, path).and_then(JsonValue::as_array))
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.as_object().cloned().map(ListingRecord::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://rest.example.test/jobsuche-service";

    fn map(value: JsonValue) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn accessors_fall_back_to_defaults_on_empty_mapping() {
        let empty = JsonMap::new();
        assert_eq!(listing_id(&empty), None);
        assert_eq!(title(&empty), NO_TITLE);
        assert_eq!(employer(&empty), "");
        assert_eq!(location(&empty), NO_LOCATION);
        assert_eq!(coordinates(&empty), None);
        assert_eq!(description(&empty), None);
        assert_eq!(detail_link(&empty, BASE), None);
        assert_eq!(web_link(&empty), None);
        assert_eq!(short_field(&empty, &["kurzbeschreibung"]), "");
    }

    #[test]
    fn id_prefers_refnr_and_skips_empty_and_null_values() {
        let rec = map(json!({"refNr": "", "refnr": null, "hashId": "h-1", "hashID": "h-2"}));
        assert_eq!(listing_id(&rec).as_deref(), Some("h-1"));

        let rec = map(json!({"refnr": "10001-123", "hashId": "h-1"}));
        assert_eq!(listing_id(&rec).as_deref(), Some("10001-123"));

        let rec = map(json!({"refnr": 4711}));
        assert_eq!(listing_id(&rec).as_deref(), Some("4711"));
    }

    #[test]
    fn title_and_employer_follow_key_priority() {
        let rec = map(json!({"beruf": "Physiker/in", "title": "Physicist", "unternehmen": "ACME"}));
        assert_eq!(title(&rec), "Physiker/in");
        assert_eq!(employer(&rec), "ACME");

        let rec = map(json!({"titel": {"nested": true}}));
        assert_eq!(title(&rec), NO_TITLE);
    }

    #[test]
    fn location_renders_address_objects_and_strings() {
        let rec = map(json!({"arbeitsort": {"ort": "Leipzig", "region": " Sachsen ", "land": "Deutschland"}}));
        assert_eq!(location(&rec), "Leipzig, Sachsen, Deutschland");

        let rec = map(json!({"arbeitsort": {}, "ort": "Halle (Saale)"}));
        assert_eq!(location(&rec), "Halle (Saale)");

        let rec = map(json!({"arbeitsort": {"plz": "04109"}}));
        assert_eq!(location(&rec), NO_LOCATION);
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let rec = map(json!({"arbeitsort": {"koordinaten": {"lat": 51.34, "lon": "12.37"}}}));
        assert_eq!(coordinates(&rec), Some((51.34, 12.37)));

        let rec = map(json!({"koordinaten": {"lat": "51.0", "lon": 11.5}}));
        assert_eq!(coordinates(&rec), Some((51.0, 11.5)));

        let rec = map(json!({"koordinaten": {"lat": "north", "lon": 11.5}}));
        assert_eq!(coordinates(&rec), None);
    }

    #[test]
    fn relative_detail_href_is_prefixed_with_base() {
        let rec = map(json!({"_links": {"details": {"href": "/pc/v4/jobdetails/abc"}}}));
        assert_eq!(
            detail_link(&rec, BASE).as_deref(),
            Some("https://rest.example.test/jobsuche-service/pc/v4/jobdetails/abc")
        );

        let rec = map(json!({"_links": {"jobdetails": {"href": "/pc/v2/jobdetails/xyz"}}}));
        assert_eq!(
            detail_link(&rec, BASE).as_deref(),
            Some("https://rest.example.test/jobsuche-service/pc/v2/jobdetails/xyz")
        );
    }

    #[test]
    fn absolute_detail_href_is_returned_unchanged() {
        let rec = map(json!({"_links": {"details": {"href": "https://other.test/d/1"}}}));
        assert_eq!(detail_link(&rec, BASE).as_deref(), Some("https://other.test/d/1"));
    }

    #[test]
    fn unrecognized_or_malformed_links_yield_no_link() {
        let rec = map(json!({"_links": {"self": {"href": "/pc/v4/jobs"}}}));
        assert_eq!(detail_link(&rec, BASE), None);

        let rec = map(json!({"_links": {"details": "/pc/v4/jobdetails/abc"}}));
        assert_eq!(detail_link(&rec, BASE), None);
    }

    #[test]
    fn description_uses_first_non_blank_candidate() {
        let rec = map(json!({"stellenbeschreibung": "  ", "aufgaben": "Messungen durchführen"}));
        assert_eq!(description(&rec).as_deref(), Some("Messungen durchführen"));
    }

    #[test]
    fn extract_listings_handles_each_response_shape() {
        let top = json!({"stellenangebote": [{"refnr": "A"}, {"refnr": "B"}]});
        assert_eq!(extract_listings(&top).len(), 2);

        let embedded = json!({"_embedded": {"stellenangebote": [{"refnr": "A"}]}});
        assert_eq!(extract_listings(&embedded)[0].id().as_deref(), Some("A"));

        let embedded_jobs = json!({"_embedded": {"jobs": [{"hashId": "H"}]}});
        assert_eq!(extract_listings(&embedded_jobs)[0].id().as_deref(), Some("H"));

        let jobs = json!({"jobs": [{"refnr": "J"}, "not-an-object"]});
        assert_eq!(extract_listings(&jobs).len(), 1);

        assert!(extract_listings(&json!({"maxErgebnisse": 0})).is_empty());
        assert!(extract_listings(&json!([1, 2, 3])).is_empty());
    }
}
