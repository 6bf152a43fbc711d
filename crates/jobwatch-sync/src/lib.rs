//! Dashboard orchestration: run the search buckets, merge and enrich the
//! results, diff them against the saved snapshot and order them for display.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use jobwatch_adapters::{
    ArbeitsagenturBoard, CachedJobBoard, JobBoard, SearchRequest, WorkArrangement, DETAIL_CACHE_TTL,
};
use jobwatch_core::diff::{dedup_by_id, display_order, is_new, new_ids};
use jobwatch_core::extract::{short_field, NO_LOCATION};
use jobwatch_core::geo::{haversine_km, travel_time_minutes, DistanceBand, GeoPoint};
use jobwatch_core::relevance::{is_probably_irrelevant, KeywordProfile};
use jobwatch_core::{Bucket, DetailRecord, ListingRecord, Snapshot, DEFAULT_API_BASE};
use jobwatch_storage::{
    HttpClientConfig, SnapshotStore, TtlCache, DEFAULT_STATE_DIR, DEFAULT_USER_AGENT,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CRATE_NAME: &str = "jobwatch-sync";

pub const DEFAULT_API_KEY: &str = "jobboerse-jobsuche";
pub const DEFAULT_LOCATION: &str = "Leipzig";
pub const DEFAULT_QUERY: &str = "Forschung Entwicklung R&D Thermoanalyse Thermophysik Analytik";
pub const DEFAULT_RULES_PATH: &str = "rules/keywords.yaml";

pub const ONSITE_RADII_KM: [u32; 2] = [25, 50];
pub const PAGE_SIZES: [u32; 3] = [25, 50, 100];
pub const HOME_OFFICE_RADIUS_MIN_KM: u32 = 50;
pub const HOME_OFFICE_RADIUS_MAX_KM: u32 = 800;
pub const HOME_OFFICE_RADIUS_STEP_KM: u32 = 50;
pub const MAX_AGE_DAYS_LIMIT: u32 = 100;

/// Default home point (06242 Braunsbedra).
pub const DEFAULT_HOME: GeoPoint = GeoPoint {
    lat: 51.2861,
    lon: 11.8900,
};

const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub api_base: String,
    pub state_dir: PathBuf,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub rules_path: PathBuf,
    pub web_port: u16,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: 25,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            web_port: 8000,
        }
    }
}

impl WatchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("JOBWATCH_API_BASE").unwrap_or(defaults.api_base),
            state_dir: std::env::var("JOBWATCH_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_dir),
            user_agent: std::env::var("JOBWATCH_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout_secs: std::env::var("JOBWATCH_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            rules_path: std::env::var("JOBWATCH_RULES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.rules_path),
            web_port: std::env::var("JOBWATCH_WEB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.web_port),
        }
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
            user_agent: Some(self.user_agent.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// New listings first, then alphabetical.
    #[default]
    NewFirst,
    /// Nearest first; ties broken by newness, score, title.
    Distance,
}

/// Search parameters as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchForm {
    pub location: String,
    pub onsite_radius_km: u32,
    pub include_home_office: bool,
    pub home_office_radius_km: u32,
    pub query: String,
    pub max_age_days: u32,
    pub page_size: u32,
    pub api_key: String,
    pub hide_irrelevant: bool,
    pub min_score: Option<i32>,
    pub sort: SortMode,
    pub home: GeoPoint,
    pub speed_kmh: f64,
    pub near_km: u32,
    pub mid_km: u32,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            onsite_radius_km: 50,
            include_home_office: true,
            home_office_radius_km: 200,
            query: DEFAULT_QUERY.to_string(),
            max_age_days: 60,
            page_size: 50,
            api_key: DEFAULT_API_KEY.to_string(),
            hide_irrelevant: false,
            min_score: None,
            sort: SortMode::NewFirst,
            home: DEFAULT_HOME,
            speed_kmh: 75.0,
            near_km: 25,
            mid_km: 60,
        }
    }
}

fn nearest_allowed(allowed: &[u32], value: u32) -> u32 {
    allowed
        .iter()
        .copied()
        .min_by_key(|candidate| candidate.abs_diff(value))
        .unwrap_or(value)
}

fn snap_to_step(value: u32, min: u32, max: u32, step: u32) -> u32 {
    let clamped = value.clamp(min, max);
    let steps = (clamped - min + step / 2) / step;
    (min + steps * step).min(max)
}

fn is_valid_point(point: GeoPoint) -> bool {
    point.lat.is_finite()
        && point.lon.is_finite()
        && (-90.0..=90.0).contains(&point.lat)
        && (-180.0..=180.0).contains(&point.lon)
}

impl SearchForm {
    /// Snap every field onto the values the controls allow.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.location = self.location.trim().to_string();
        self.onsite_radius_km = nearest_allowed(&ONSITE_RADII_KM, self.onsite_radius_km);
        self.home_office_radius_km = snap_to_step(
            self.home_office_radius_km,
            HOME_OFFICE_RADIUS_MIN_KM,
            HOME_OFFICE_RADIUS_MAX_KM,
            HOME_OFFICE_RADIUS_STEP_KM,
        );
        self.max_age_days = self.max_age_days.min(MAX_AGE_DAYS_LIMIT);
        self.page_size = nearest_allowed(&PAGE_SIZES, self.page_size);
        if self.api_key.trim().is_empty() {
            self.api_key = defaults.api_key;
        }
        if !self.speed_kmh.is_finite() || self.speed_kmh <= 0.0 {
            self.speed_kmh = defaults.speed_kmh;
        }
        if !is_valid_point(self.home) {
            self.home = defaults.home;
        }
        if self.mid_km < self.near_km {
            self.mid_km = self.near_km;
        }
        self
    }

    fn request(&self, radius_km: u32, work_arrangement: Option<WorkArrangement>) -> SearchRequest {
        SearchRequest {
            api_key: self.api_key.clone(),
            location: self.location.clone(),
            radius_km,
            query: self.query.clone(),
            max_age_days: self.max_age_days,
            page_size: self.page_size,
            page: 1,
            work_arrangement,
        }
    }

    /// The on-site search, then the home-office search when enabled.
    pub fn search_requests(&self) -> Vec<(Bucket, SearchRequest)> {
        let mut out = vec![(
            Bucket::OnSite {
                radius_km: self.onsite_radius_km,
            },
            self.request(self.onsite_radius_km, None),
        )];
        if self.include_home_office {
            out.push((
                Bucket::HomeOffice {
                    radius_km: self.home_office_radius_km,
                },
                self.request(self.home_office_radius_km, Some(WorkArrangement::HomeOffice)),
            ));
        }
        out
    }
}

/// Merged output of all bucket searches plus any per-bucket failures.
#[derive(Debug, Clone, Default)]
pub struct CombinedResults {
    pub items: Vec<ListingRecord>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    pub id: Option<String>,
    pub title: String,
    pub employer: String,
    pub location: String,
    pub bucket: String,
    pub is_new: bool,
    pub score: i32,
    pub leadership: bool,
    pub distance_km: Option<f64>,
    pub travel_minutes: Option<u32>,
    pub distance_band: DistanceBand,
    pub detail_url: Option<String>,
    pub web_url: Option<String>,
    pub summary: String,
    pub published: String,
    pub updated: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub form: SearchForm,
    pub snapshot_timestamp: Option<String>,
    pub total: usize,
    pub new_count: usize,
    pub errors: Vec<String>,
    pub rows: Vec<ListingRow>,
    /// Displayed listings in display order; this is what a save captures.
    #[serde(skip)]
    pub items: Vec<ListingRecord>,
}

/// Listing-side values shown when the detail record lacks them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFallback {
    #[serde(default)]
    pub refnr: String,
    #[serde(default)]
    pub employer: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailSummary {
    pub employer: String,
    pub location: String,
    pub refnr: String,
    pub description: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl DetailSummary {
    pub fn from_detail(detail: &DetailRecord, fallback: &DetailFallback) -> Self {
        let location = Some(detail.location()).filter(|loc| loc != NO_LOCATION);
        Self {
            employer: non_empty(detail.employer())
                .or_else(|| non_empty(fallback.employer.clone()))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            location: location
                .or_else(|| non_empty(fallback.location.clone()))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            refnr: detail
                .id()
                .or_else(|| non_empty(fallback.refnr.clone()))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            description: detail.description(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailPanel {
    Loaded(DetailSummary),
    Failed { error: String },
}

/// Load keyword lists from a YAML rules file; an absent file means the
/// built-in defaults.
pub fn load_keyword_profile(path: &Path) -> Result<KeywordProfile> {
    #[derive(Debug, Deserialize)]
    struct KeywordRulesFile {
        #[allow(dead_code)]
        version: u32,
        keywords: KeywordProfile,
    }

    if !path.exists() {
        info!(path = %path.display(), "no keyword rules file; using built-in defaults");
        return Ok(KeywordProfile::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let rules: KeywordRulesFile =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(rules.keywords)
}

pub const UNKNOWN_DETAIL_LINK: &str =
    "Details: link does not belong to a listed job; not fetched";

pub struct Dashboard {
    board: Box<dyn JobBoard>,
    store: SnapshotStore,
    profile: KeywordProfile,
    /// Detail links handed out by recent builds; absolute upstream links may
    /// point outside the API base.
    issued_links: TtlCache<String, ()>,
}

impl Dashboard {
    pub fn new(board: Box<dyn JobBoard>, store: SnapshotStore, profile: KeywordProfile) -> Self {
        Self {
            board,
            store,
            profile,
            issued_links: TtlCache::new(DETAIL_CACHE_TTL),
        }
    }

    /// Production wiring: cached Arbeitsagentur board, snapshot under the
    /// state dir, keyword rules from disk.
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        let board = ArbeitsagenturBoard::new(&config.api_base, config.http_client_config())?;
        let profile = load_keyword_profile(&config.rules_path)?;
        Ok(Self::new(
            Box::new(CachedJobBoard::new(Box::new(board))),
            SnapshotStore::new(&config.state_dir),
            profile,
        ))
    }

    pub fn with_profile(mut self, profile: KeywordProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn profile(&self) -> &KeywordProfile {
        &self.profile
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn api_base(&self) -> &str {
        self.board.api_base()
    }

    /// Run each bucket search in turn. A failing bucket is recorded and the
    /// remaining buckets still run.
    pub async fn collect(&self, form: &SearchForm) -> CombinedResults {
        let mut combined = CombinedResults::default();
        for (bucket, request) in form.search_requests() {
            match self.board.search(&request).await {
                Ok(items) => {
                    info!(
                        board = self.board.board_id(),
                        bucket = %bucket,
                        count = items.len(),
                        "search finished"
                    );
                    combined.items.extend(items.into_iter().map(|mut item| {
                        item.set_bucket(bucket.label());
                        item
                    }));
                }
                Err(err) => {
                    warn!(
                        board = self.board.board_id(),
                        bucket = %bucket,
                        error = %err,
                        "search failed"
                    );
                    combined.errors.push(format!("{bucket}: {err}"));
                }
            }
        }
        combined.items = dedup_by_id(combined.items);
        combined
    }

    pub async fn build(&self, form: &SearchForm) -> Result<DashboardView> {
        let snapshot = self.store.load().await?;
        let combined = self.collect(form).await;
        let view = self.assemble(form, &snapshot, combined);
        for url in view.rows.iter().filter_map(|row| row.detail_url.as_ref()) {
            self.issued_links.insert(url.clone(), ()).await;
        }
        Ok(view)
    }

    /// A detail link may be fetched when it lies under the API base or was
    /// produced for a listing by a recent build.
    pub async fn is_known_detail_link(&self, url: &str) -> bool {
        let base = format!("{}/", self.board.api_base().trim_end_matches('/'));
        url.starts_with(&base) || self.issued_links.get(&url.to_string()).await.is_some()
    }

    /// Filter, diff against `snapshot`, enrich and order `combined`.
    pub fn assemble(
        &self,
        form: &SearchForm,
        snapshot: &Snapshot,
        combined: CombinedResults,
    ) -> DashboardView {
        let items = combined
            .items
            .into_iter()
            .filter(|item| !(form.hide_irrelevant && is_probably_irrelevant(item)))
            .filter(|item| form.min_score.map_or(true, |min| self.profile.score(item) >= min))
            .collect::<Vec<_>>();

        let fresh = new_ids(&snapshot.items, &items);
        let mut pairs = items
            .into_iter()
            .map(|item| {
                let row = self.row_for(form, &item, &fresh);
                (item, row)
            })
            .collect::<Vec<_>>();

        match form.sort {
            SortMode::NewFirst => pairs.sort_by(|(a, _), (b, _)| display_order(a, b, &fresh)),
            SortMode::Distance => pairs.sort_by(|(_, a), (_, b)| distance_order(a, b)),
        }

        let (items, rows): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        DashboardView {
            form: form.clone(),
            snapshot_timestamp: snapshot.timestamp.clone(),
            total: rows.len(),
            new_count: fresh.len(),
            errors: combined.errors,
            rows,
            items,
        }
    }

    fn row_for(&self, form: &SearchForm, item: &ListingRecord, fresh: &HashSet<String>) -> ListingRow {
        let distance_km = item
            .coordinates()
            .map(|(lat, lon)| haversine_km(form.home, GeoPoint::new(lat, lon)));
        ListingRow {
            id: item.id(),
            title: item.title(),
            employer: item.employer(),
            location: item.location(),
            bucket: item.bucket(),
            is_new: is_new(item, fresh),
            score: self.profile.score(item),
            leadership: self.profile.looks_leadership(item),
            distance_km,
            travel_minutes: travel_time_minutes(distance_km, form.speed_kmh),
            distance_band: DistanceBand::classify(distance_km, form.near_km, form.mid_km),
            detail_url: item.detail_link(self.board.api_base()),
            web_url: item.web_link(),
            summary: short_field(
                item.fields(),
                &["kurzbeschreibung", "beschreibungKurz", "kurztext"],
            ),
            published: short_field(
                item.fields(),
                &["veroeffentlichungsdatum", "aktuelleVeroeffentlichungsdatum", "veroeffentlichtAm", "date"],
            ),
            updated: short_field(item.fields(), &["aktualisiertAm", "aktualisiert", "updated"]),
        }
    }

    /// Build the dashboard, then persist its listings as the new baseline.
    ///
    /// The returned view keeps the new-markers computed against the previous
    /// baseline and carries the fresh timestamp.
    pub async fn save_snapshot(&self, form: &SearchForm) -> Result<DashboardView> {
        let mut view = self.build(form).await?;
        let saved = self.store.save(&view.items).await?;
        view.snapshot_timestamp = saved.timestamp;
        Ok(view)
    }

    pub async fn delete_snapshot(&self) -> Result<bool> {
        self.store.delete().await
    }

    pub async fn detail_panel(&self, api_key: &str, url: &str, fallback: &DetailFallback) -> DetailPanel {
        if !self.is_known_detail_link(url).await {
            warn!(url, "rejected detail link outside the job-search API");
            return DetailPanel::Failed {
                error: UNKNOWN_DETAIL_LINK.to_string(),
            };
        }
        match self.board.fetch_detail(api_key, url).await {
            Ok(detail) => DetailPanel::Loaded(DetailSummary::from_detail(&detail, fallback)),
            Err(err) => {
                warn!(url, error = %err, "detail fetch failed");
                DetailPanel::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

fn distance_order(a: &ListingRow, b: &ListingRow) -> Ordering {
    let dist = |row: &ListingRow| row.distance_km.unwrap_or(f64::MAX);
    dist(a)
        .total_cmp(&dist(b))
        .then_with(|| b.is_new.cmp(&a.is_new))
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

/// Plain-text listing for terminal output.
pub fn report_text(view: &DashboardView) -> String {
    let mut lines = vec![
        format!("Listings: {}", view.total),
        format!("New since snapshot: {}", view.new_count),
        format!(
            "Snapshot: {}",
            view.snapshot_timestamp
                .as_deref()
                .unwrap_or("no snapshot saved yet")
        ),
    ];
    for error in &view.errors {
        lines.push(format!("error: {error}"));
    }
    lines.push(String::new());
    for row in &view.rows {
        let marker = if row.is_new { "NEW " } else { "    " };
        let lead = if row.leadership { "★ " } else { "" };
        let distance = row
            .distance_km
            .map(|d| format!("{d:.1} km"))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        lines.push(format!("{marker}{lead}{}", row.title));
        lines.push(format!(
            "      {} | {} | {} | score {} | {}",
            row.bucket,
            if row.employer.is_empty() { PLACEHOLDER } else { row.employer.as_str() },
            row.location,
            row.score,
            distance
        ));
    }
    lines.join("\n")
}
