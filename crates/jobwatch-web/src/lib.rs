//! Axum + Askama web UI for JobWatch.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jobwatch_core::geo::{DistanceBand, GeoPoint};
use jobwatch_sync::{
    Dashboard, DashboardView, DetailFallback, DetailPanel, ListingRow, SearchForm, SortMode,
    WatchConfig, HOME_OFFICE_RADIUS_MAX_KM, HOME_OFFICE_RADIUS_MIN_KM, HOME_OFFICE_RADIUS_STEP_KM,
    ONSITE_RADII_KM, PAGE_SIZES,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;

pub const CRATE_NAME: &str = "jobwatch-web";

#[derive(Clone)]
pub struct AppState {
    pub workspace_root: PathBuf,
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(workspace_root: impl Into<PathBuf>, dashboard: Dashboard) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            dashboard: Arc::new(dashboard),
        }
    }
}

/// Raw dashboard parameters from the query string or a posted form.
///
/// Everything arrives as text so a blank input falls back to its default
/// instead of failing extraction. Checkboxes are only absent-means-off once
/// the sidebar form has been submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    submitted: Option<String>,
    location: Option<String>,
    onsite_radius_km: Option<String>,
    include_home_office: Option<String>,
    home_office_radius_km: Option<String>,
    query: Option<String>,
    max_age_days: Option<String>,
    page_size: Option<String>,
    api_key: Option<String>,
    hide_irrelevant: Option<String>,
    min_score: Option<String>,
    sort: Option<String>,
    home_lat: Option<String>,
    home_lon: Option<String>,
    speed_kmh: Option<String>,
    near_km: Option<String>,
    mid_km: Option<String>,
}

fn parsed<T: FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

impl DashboardQuery {
    pub fn into_form(self) -> SearchForm {
        let defaults = SearchForm::default();
        let submitted = self.submitted.is_some();
        let checkbox = |raw: &Option<String>, default: bool| match raw.as_deref() {
            Some(value) => !matches!(value, "false" | "0" | "off"),
            None if submitted => false,
            None => default,
        };

        SearchForm {
            location: self.location.clone().unwrap_or(defaults.location),
            onsite_radius_km: parsed(&self.onsite_radius_km).unwrap_or(defaults.onsite_radius_km),
            include_home_office: checkbox(&self.include_home_office, defaults.include_home_office),
            home_office_radius_km: parsed(&self.home_office_radius_km)
                .unwrap_or(defaults.home_office_radius_km),
            query: self.query.clone().unwrap_or(defaults.query),
            max_age_days: parsed(&self.max_age_days).unwrap_or(defaults.max_age_days),
            page_size: parsed(&self.page_size).unwrap_or(defaults.page_size),
            api_key: self.api_key.clone().unwrap_or(defaults.api_key),
            hide_irrelevant: checkbox(&self.hide_irrelevant, defaults.hide_irrelevant),
            min_score: parsed(&self.min_score),
            sort: match self.sort.as_deref() {
                Some("distance") => SortMode::Distance,
                _ => SortMode::NewFirst,
            },
            home: GeoPoint::new(
                parsed(&self.home_lat).unwrap_or(defaults.home.lat),
                parsed(&self.home_lon).unwrap_or(defaults.home.lon),
            ),
            speed_kmh: parsed(&self.speed_kmh).unwrap_or(defaults.speed_kmh),
            near_km: parsed(&self.near_km).unwrap_or(defaults.near_km),
            mid_km: parsed(&self.mid_km).unwrap_or(defaults.mid_km),
        }
        .normalized()
    }
}

/// Name/value pairs that reproduce `form` when posted back.
fn form_fields(form: &SearchForm) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("submitted", "1".to_string()),
        ("location", form.location.clone()),
        ("onsite_radius_km", form.onsite_radius_km.to_string()),
        ("home_office_radius_km", form.home_office_radius_km.to_string()),
        ("query", form.query.clone()),
        ("max_age_days", form.max_age_days.to_string()),
        ("page_size", form.page_size.to_string()),
        ("api_key", form.api_key.clone()),
        ("sort", sort_value(form.sort).to_string()),
        ("home_lat", form.home.lat.to_string()),
        ("home_lon", form.home.lon.to_string()),
        ("speed_kmh", form.speed_kmh.to_string()),
        ("near_km", form.near_km.to_string()),
        ("mid_km", form.mid_km.to_string()),
    ];
    if form.include_home_office {
        fields.push(("include_home_office", "on".to_string()));
    }
    if form.hide_irrelevant {
        fields.push(("hide_irrelevant", "on".to_string()));
    }
    if let Some(min) = form.min_score {
        fields.push(("min_score", min.to_string()));
    }
    fields
}

fn sort_value(sort: SortMode) -> &'static str {
    match sort {
        SortMode::NewFirst => "new_first",
        SortMode::Distance => "distance",
    }
}

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

fn number_options(values: impl IntoIterator<Item = u32>, current: u32, unit: &str) -> Vec<SelectOption> {
    values
        .into_iter()
        .map(|v| SelectOption {
            value: v.to_string(),
            label: format!("{v}{unit}"),
            selected: v == current,
        })
        .collect()
}

struct RowView {
    title: String,
    employer: String,
    location: String,
    bucket: String,
    is_new: bool,
    score: i32,
    leadership: bool,
    distance_text: String,
    band_class: &'static str,
    has_detail: bool,
    detail_url: String,
    has_web: bool,
    web_url: String,
    refnr: String,
    summary: String,
    published: String,
}

fn band_label(band: DistanceBand) -> &'static str {
    match band {
        DistanceBand::Near => "near",
        DistanceBand::Mid => "mid",
        DistanceBand::Far => "far",
        DistanceBand::Unknown => "?",
    }
}

impl From<ListingRow> for RowView {
    fn from(row: ListingRow) -> Self {
        let distance_text = match (row.distance_km, row.travel_minutes) {
            (Some(km), Some(min)) => format!("{km:.1} km · ~{min} min · {}", band_label(row.distance_band)),
            (Some(km), None) => format!("{km:.1} km · {}", band_label(row.distance_band)),
            _ => "distance unknown".to_string(),
        };
        Self {
            title: row.title,
            employer: row.employer,
            location: row.location,
            bucket: row.bucket,
            is_new: row.is_new,
            score: row.score,
            leadership: row.leadership,
            distance_text,
            band_class: row.distance_band.css_class(),
            has_detail: row.detail_url.is_some(),
            detail_url: row.detail_url.unwrap_or_default(),
            has_web: row.web_url.is_some(),
            web_url: row.web_url.unwrap_or_default(),
            refnr: row.id.unwrap_or_default(),
            summary: row.summary,
            published: row.published,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    form: SearchForm,
    hidden_fields: Vec<(&'static str, String)>,
    onsite_radii: Vec<SelectOption>,
    home_office_radii: Vec<SelectOption>,
    page_sizes: Vec<SelectOption>,
    sort_by_distance: bool,
    min_score_text: String,
    snapshot_label: String,
    total: usize,
    new_count: usize,
    errors: Vec<String>,
    notice: String,
    rows: Vec<RowView>,
}

impl IndexTemplate {
    fn from_view(view: DashboardView, notice: Option<String>) -> Self {
        let form = view.form;
        Self {
            hidden_fields: form_fields(&form),
            onsite_radii: number_options(ONSITE_RADII_KM, form.onsite_radius_km, " km"),
            home_office_radii: number_options(
                (HOME_OFFICE_RADIUS_MIN_KM..=HOME_OFFICE_RADIUS_MAX_KM)
                    .step_by(HOME_OFFICE_RADIUS_STEP_KM as usize),
                form.home_office_radius_km,
                " km",
            ),
            page_sizes: number_options(PAGE_SIZES, form.page_size, ""),
            sort_by_distance: form.sort == SortMode::Distance,
            min_score_text: form.min_score.map(|m| m.to_string()).unwrap_or_default(),
            snapshot_label: view
                .snapshot_timestamp
                .unwrap_or_else(|| "no snapshot saved yet".to_string()),
            total: view.total,
            new_count: view.new_count,
            errors: view.errors,
            notice: notice.unwrap_or_default(),
            rows: view.rows.into_iter().map(RowView::from).collect(),
            form,
        }
    }
}

#[derive(Template)]
#[template(path = "detail_partial.html")]
struct DetailPartialTemplate {
    loaded: bool,
    employer: String,
    location: String,
    refnr: String,
    has_description: bool,
    description: String,
    error: String,
}

impl From<DetailPanel> for DetailPartialTemplate {
    fn from(panel: DetailPanel) -> Self {
        match panel {
            DetailPanel::Loaded(summary) => Self {
                loaded: true,
                employer: summary.employer,
                location: summary.location,
                refnr: summary.refnr,
                has_description: summary.description.is_some(),
                description: summary.description.unwrap_or_default(),
                error: String::new(),
            },
            DetailPanel::Failed { error } => Self {
                loaded: false,
                employer: String::new(),
                location: String::new(),
                refnr: String::new(),
                has_description: false,
                description: String::new(),
                error,
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct DetailQuery {
    url: Option<String>,
    api_key: Option<String>,
    #[serde(default)]
    refnr: String,
    #[serde(default)]
    employer: String,
    #[serde(default)]
    location: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/listings/detail", get(listing_detail_handler))
        .route("/snapshot/save", post(snapshot_save_handler))
        .route("/snapshot/delete", post(snapshot_delete_handler))
        .route("/api/dashboard", get(api_dashboard_handler))
        .route("/assets/static/app.css", get(app_css_handler))
        .with_state(Arc::new(state))
}

pub async fn serve(config: &WatchConfig) -> anyhow::Result<()> {
    let dashboard = Dashboard::from_config(config)?;
    let state = AppState::new(".", dashboard);
    let listener = TcpListener::bind(("0.0.0.0", config.web_port)).await?;
    info!(port = config.web_port, "web dashboard listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let form = query.into_form();
    match state.dashboard.build(&form).await {
        Ok(view) => render_html(IndexTemplate::from_view(view, None)),
        Err(err) => server_error(err),
    }
}

async fn snapshot_save_handler(
    State(state): State<Arc<AppState>>,
    Form(query): Form<DashboardQuery>,
) -> Response {
    let form = query.into_form();
    match state.dashboard.save_snapshot(&form).await {
        Ok(view) => {
            let notice = format!("Snapshot saved ({} listings).", view.items.len());
            render_html(IndexTemplate::from_view(view, Some(notice)))
        }
        Err(err) => server_error(err),
    }
}

async fn snapshot_delete_handler(
    State(state): State<Arc<AppState>>,
    Form(query): Form<DashboardQuery>,
) -> Response {
    let form = query.into_form();
    let removed = match state.dashboard.delete_snapshot().await {
        Ok(removed) => removed,
        Err(err) => return server_error(err),
    };
    let notice = if removed {
        "Snapshot deleted."
    } else {
        "No snapshot to delete."
    };
    match state.dashboard.build(&form).await {
        Ok(view) => render_html(IndexTemplate::from_view(view, Some(notice.to_string()))),
        Err(err) => server_error(err),
    }
}

async fn listing_detail_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return render_html(DetailPartialTemplate::from(DetailPanel::Failed {
            error: "No detail link available for this listing.".to_string(),
        }));
    };
    let api_key = query
        .api_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| SearchForm::default().api_key);
    let fallback = DetailFallback {
        refnr: query.refnr,
        employer: query.employer,
        location: query.location,
    };
    let panel = state.dashboard.detail_panel(&api_key, &url, &fallback).await;
    render_html(DetailPartialTemplate::from(panel))
}

async fn api_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let form = query.into_form();
    match state.dashboard.build(&form).await {
        Ok(view) => Json(view).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": format!("{err:#}") })),
        )
            .into_response(),
    }
}

async fn app_css_handler(State(state): State<Arc<AppState>>) -> Response {
    let css_path = state.workspace_root.join("assets/static/app.css");
    match tokio::fs::read_to_string(&css_path).await {
        Ok(css) => ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], css).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Html("/* missing app.css */".to_string())).into_response(),
    }
}

fn render_html<T: Template>(tpl: T) -> Response {
    match tpl.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(anyhow::anyhow!(err.to_string())),
    }
}

fn server_error(err: anyhow::Error) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("Server error: {err:#}")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use jobwatch_adapters::{ApiError, Endpoint, JobBoard, SearchRequest};
    use jobwatch_core::relevance::KeywordProfile;
    use jobwatch_core::{DetailRecord, ListingRecord};
    use jobwatch_storage::SnapshotStore;
    use serde_json::{json, Value as JsonValue};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct FakeBoard {
        home_office_fails: bool,
        detail_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobBoard for FakeBoard {
        fn board_id(&self) -> &'static str {
            "fake"
        }

        fn api_base(&self) -> &str {
            "https://api.test"
        }

        async fn search(&self, request: &SearchRequest) -> Result<Vec<ListingRecord>, ApiError> {
            if request.work_arrangement.is_some() {
                if self.home_office_fails {
                    return Err(ApiError::Status {
                        endpoint: Endpoint::Search,
                        status: 500,
                        excerpt: "server error".into(),
                    });
                }
                return Ok(vec![]);
            }
            let items = vec![
                json!({"refnr": "A-1", "titel": "Laborleiter Thermoanalyse", "arbeitgeber": "Musterwerk",
                       "_links": {"details": {"href": "/pc/v4/jobdetails/A-1"}}}),
                json!({"refnr": "B-2", "titel": "Physiker", "arbeitsort": {"ort": "Halle"}}),
            ];
            Ok(items
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap())
                .collect())
        }

        async fn fetch_detail(&self, _api_key: &str, url: &str) -> Result<DetailRecord, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("/missing") {
                return Err(ApiError::Status {
                    endpoint: Endpoint::Details,
                    status: 404,
                    excerpt: "not found".into(),
                });
            }
            Ok(serde_json::from_value(json!({"stellenbeschreibung": "DSC und TGA Messungen"})).unwrap())
        }
    }

    fn workspace_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .canonicalize()
            .unwrap()
    }

    fn test_app(home_office_fails: bool) -> (Router, TempDir) {
        let (router, dir, _) = counting_app(home_office_fails);
        (router, dir)
    }

    fn counting_app(home_office_fails: bool) -> (Router, TempDir, Arc<AtomicUsize>) {
        let dir = tempfile::tempdir().unwrap();
        let detail_calls = Arc::new(AtomicUsize::new(0));
        let dashboard = Dashboard::new(
            Box::new(FakeBoard {
                home_office_fails,
                detail_calls: detail_calls.clone(),
            }),
            SnapshotStore::new(dir.path()),
            KeywordProfile::default(),
        );
        (app(AppState::new(workspace_root(), dashboard)), dir, detail_calls)
    }

    async fn body_text(resp: Response) -> String {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_lists_results_with_new_markers() {
        let (app, _dir) = test_app(false);
        let resp = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let text = body_text(resp).await;
        assert!(text.contains("JobWatch"));
        assert!(text.contains("Laborleiter Thermoanalyse"));
        assert!(text.contains("New since snapshot: <strong>2</strong>"));
        assert!(text.contains("badge-new"));
        assert!(text.contains("no snapshot saved yet"));
        assert!(text.contains("/listings/detail?url="));
        // B-2 has no _links
        assert!(text.contains("No detail link for this listing."));
    }

    #[tokio::test]
    async fn index_shows_bucket_errors_next_to_results() {
        let (app, _dir) = test_app(true);
        let text = body_text(app.oneshot(get_request("/")).await.unwrap()).await;
        assert!(text.contains("Home office (200 km): Search HTTP 500: server error"));
        assert!(text.contains("Physiker"));
    }

    #[tokio::test]
    async fn save_then_reload_clears_new_markers() {
        let (app, _dir) = test_app(false);
        let saved = app
            .clone()
            .oneshot(post_form("/snapshot/save", "submitted=1&location=Leipzig"))
            .await
            .unwrap();
        assert_eq!(saved.status(), StatusCode::OK);
        let text = body_text(saved).await;
        assert!(text.contains("Snapshot saved (2 listings)."));

        let text = body_text(app.oneshot(get_request("/?submitted=1&location=Leipzig")).await.unwrap()).await;
        assert!(text.contains("New since snapshot: <strong>0</strong>"));
        assert!(!text.contains("no snapshot saved yet"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_snapshot_existed() {
        let (app, _dir) = test_app(false);
        let text = body_text(
            app.clone()
                .oneshot(post_form("/snapshot/delete", "submitted=1"))
                .await
                .unwrap(),
        )
        .await;
        assert!(text.contains("No snapshot to delete."));

        app.clone()
            .oneshot(post_form("/snapshot/save", "submitted=1"))
            .await
            .unwrap();
        let text = body_text(
            app.oneshot(post_form("/snapshot/delete", "submitted=1"))
                .await
                .unwrap(),
        )
        .await;
        assert!(text.contains("Snapshot deleted."));
    }

    #[tokio::test]
    async fn detail_partial_renders_description_and_fallbacks() {
        let (app, _dir) = test_app(false);
        let text = body_text(
            app.clone()
                .oneshot(get_request(
                    "/listings/detail?url=https%3A%2F%2Fapi.test%2Fd&api_key=k&refnr=A-1&employer=Musterwerk&location=Leipzig",
                ))
                .await
                .unwrap(),
        )
        .await;
        assert!(text.contains("DSC und TGA Messungen"));
        assert!(text.contains("Musterwerk"));
        assert!(text.contains("A-1"));

        let text = body_text(
            app.clone()
                .oneshot(get_request("/listings/detail?url=https%3A%2F%2Fapi.test%2Fmissing"))
                .await
                .unwrap(),
        )
        .await;
        assert!(text.contains("Details HTTP 404: not found"));

        let text = body_text(app.oneshot(get_request("/listings/detail")).await.unwrap()).await;
        assert!(text.contains("No detail link available"));
    }

    #[tokio::test]
    async fn detail_partial_refuses_foreign_links_without_fetching() {
        let (app, _dir, detail_calls) = counting_app(false);
        for uri in [
            "/listings/detail?url=http%3A%2F%2F127.0.0.1%3A9%2Finternal%2Fadmin&api_key=k",
            "/listings/detail?url=https%3A%2F%2Fapi.test.attacker.example%2Fd",
        ] {
            let resp = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let text = body_text(resp).await;
            assert!(text.contains("does not belong to a listed job"), "{uri}: {text}");
            assert!(!text.contains("DSC und TGA Messungen"));
        }
        assert_eq!(detail_calls.load(Ordering::SeqCst), 0);

        // A link the dashboard rendered is still served.
        app.clone().oneshot(get_request("/")).await.unwrap();
        let text = body_text(
            app.oneshot(get_request(
                "/listings/detail?url=https%3A%2F%2Fapi.test%2Fpc%2Fv4%2Fjobdetails%2FA-1",
            ))
            .await
            .unwrap(),
        )
        .await;
        assert!(text.contains("DSC und TGA Messungen"));
        assert_eq!(detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn api_dashboard_returns_json_view() {
        let (app, _dir) = test_app(false);
        let resp = app
            .oneshot(get_request("/api/dashboard?include_home_office=false"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "application/json"
        );
        let value: JsonValue = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["new_count"], 2);
        assert_eq!(value["form"]["include_home_office"], false);
        assert_eq!(value["rows"][0]["detail_url"], "https://api.test/pc/v4/jobdetails/A-1");
    }

    #[tokio::test]
    async fn stylesheet_is_served_from_workspace_assets() {
        let (app, _dir) = test_app(false);
        let resp = app.oneshot(get_request("/assets/static/app.css")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
            "text/css; charset=utf-8"
        );
    }

    #[test]
    fn query_defaults_and_checkbox_semantics() {
        let form = DashboardQuery::default().into_form();
        assert_eq!(form, SearchForm::default());

        let form = DashboardQuery {
            submitted: Some("1".into()),
            onsite_radius_km: Some("25".into()),
            max_age_days: Some("".into()),
            min_score: Some("5".into()),
            sort: Some("distance".into()),
            ..DashboardQuery::default()
        }
        .into_form();
        assert!(!form.include_home_office);
        assert!(!form.hide_irrelevant);
        assert_eq!(form.onsite_radius_km, 25);
        assert_eq!(form.max_age_days, 60);
        assert_eq!(form.min_score, Some(5));
        assert_eq!(form.sort, SortMode::Distance);
    }

    #[test]
    fn hidden_fields_round_trip_the_form() {
        let form = SearchForm {
            include_home_office: false,
            hide_irrelevant: true,
            min_score: Some(3),
            ..SearchForm::default()
        };
        let fields = form_fields(&form);
        let field = |name: &str| fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v.clone());
        let query = DashboardQuery {
            submitted: field("submitted"),
            location: field("location"),
            onsite_radius_km: field("onsite_radius_km"),
            include_home_office: field("include_home_office"),
            home_office_radius_km: field("home_office_radius_km"),
            query: field("query"),
            max_age_days: field("max_age_days"),
            page_size: field("page_size"),
            api_key: field("api_key"),
            hide_irrelevant: field("hide_irrelevant"),
            min_score: field("min_score"),
            sort: field("sort"),
            home_lat: field("home_lat"),
            home_lon: field("home_lon"),
            speed_kmh: field("speed_kmh"),
            near_km: field("near_km"),
            mid_km: field("mid_km"),
        };
        assert_eq!(query.into_form(), form);
    }
}
