use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::transport::{
    Endpoint, FetchError, HttpTransport, SteamRequest, SteamTransport, APPDETAILS_URL,
    APPLIST_URL, APPREVIEWS_URL, STEAMSPY_URL,
};
use crate::error::{PipelineError, Result};
use crate::models::RawItemRecord;
use crate::util::env::{env_opt, env_parse, env_req};

const PROGRESS_EVERY: usize = 50;

/// Collector settings, resolved once at process start.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub api_key: String,
    pub max_games: usize,
    /// Pause between successive items (upstream rate limits).
    pub item_pause: Duration,
    pub item_timeout: Duration,
    pub list_timeout: Duration,
    pub region: String,
    pub language: String,
}

impl CollectorConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Config("Steam API key is empty".into()));
        }
        Ok(Self {
            api_key,
            max_games: 300,
            item_pause: Duration::from_millis(300),
            item_timeout: Duration::from_secs(20),
            list_timeout: Duration::from_secs(30),
            region: "us".into(),
            language: "en".into(),
        })
    }

    /// Env: STEAM_API_KEY (required), COLLECT_MAX_GAMES, COLLECT_ITEM_PAUSE_MS,
    /// STEAM_HTTP_TIMEOUT_SECS, STEAM_LIST_TIMEOUT_SECS, STEAM_REGION, STEAM_LANGUAGE.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::new(env_req("STEAM_API_KEY")?)?;
        cfg.max_games = env_parse("COLLECT_MAX_GAMES", cfg.max_games)?;
        cfg.item_pause = Duration::from_millis(env_parse("COLLECT_ITEM_PAUSE_MS", 300u64)?);
        cfg.item_timeout = Duration::from_secs(env_parse("STEAM_HTTP_TIMEOUT_SECS", 20u64)?);
        cfg.list_timeout = Duration::from_secs(env_parse("STEAM_LIST_TIMEOUT_SECS", 30u64)?);
        if let Some(region) = env_opt("STEAM_REGION") {
            cfg.region = region.trim().to_ascii_lowercase();
        }
        if let Some(language) = env_opt("STEAM_LANGUAGE") {
            cfg.language = language.trim().to_string();
        }
        Ok(cfg)
    }
}

/// A single-item fetch that went wrong. Logged and absorbed, never propagated.
#[derive(Debug, Error)]
#[error("{endpoint:?} fetch failed for app {item_id}: {reason}")]
pub struct ItemFetchFailure {
    pub item_id: i64,
    pub endpoint: Endpoint,
    pub reason: FetchError,
}

#[derive(Debug, Deserialize)]
struct AppListBody {
    response: AppListResponse,
}

#[derive(Debug, Deserialize)]
struct AppListResponse {
    #[serde(default)]
    apps: Vec<AppEntry>,
}

#[derive(Debug, Deserialize)]
struct AppEntry {
    #[serde(default)]
    appid: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AppDetailsEntry {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppData {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<ReleaseDateBlock>,
    #[serde(default)]
    pub price_overview: Option<PriceOverview>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub genres: Option<Vec<GenreEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDateBlock {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceOverview {
    #[serde(rename = "initial", default)]
    pub initial_price: Option<i64>,
    #[serde(rename = "final", default)]
    pub final_price: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenreEntry {
    #[serde(default)]
    pub description: Option<String>,
}

/// Metadata of an item confirmed to be a game, plus the untouched payload.
#[derive(Debug, Clone)]
pub struct ItemDetails {
    pub data: AppData,
    pub raw: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct QuerySummary {
    #[serde(default)]
    total_reviews: Option<i64>,
    #[serde(default)]
    total_positive: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub total_reviews: Option<i64>,
    pub positive_reviews: Option<i64>,
    pub raw: Value,
}

/// Midpoint of a SteamSpy owners range such as `"20,000 .. 50,000"`.
///
/// Commas and spaces are stripped; anything but exactly two integers yields None,
/// as does a range whose sum overflows `i64`.
pub fn parse_owners_midpoint(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != ' ').collect();
    let parts: Vec<&str> = cleaned.split("..").collect();
    if parts.len() != 2 {
        return None;
    }
    let low = parts[0].parse::<i64>().ok()?;
    let high = parts[1].parse::<i64>().ok()?;
    low.checked_add(high).map(|sum| sum / 2)
}

/// Pulls a sample of Steam apps and their detail, review and ownership data.
pub struct SteamCollector<T> {
    config: CollectorConfig,
    transport: T,
}

impl SteamCollector<HttpTransport> {
    pub fn with_http(config: CollectorConfig) -> Result<Self> {
        let transport = HttpTransport::new()
            .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self::new(config, transport))
    }
}

impl<T: SteamTransport> SteamCollector<T> {
    pub fn new(config: CollectorConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// One listing call; any failure here is fatal for the run.
    pub async fn list_candidate_ids(&self, max_results: usize) -> Result<Vec<i64>> {
        let req = SteamRequest::new(Endpoint::AppList, APPLIST_URL, self.config.list_timeout)
            .param("key", &self.config.api_key)
            .param("include_games", true)
            .param("include_dlc", false)
            .param("include_software", false)
            .param("include_videos", false)
            .param("include_hardware", false)
            .param("max_results", max_results);
        let body = self
            .transport
            .get_json(&req)
            .await
            .map_err(|e| PipelineError::UpstreamUnavailable(e.to_string()))?;
        let parsed: AppListBody = serde_json::from_value(body).map_err(|e| {
            PipelineError::UpstreamUnavailable(format!("malformed app list body: {e}"))
        })?;
        let ids: Vec<i64> = parsed
            .response
            .apps
            .into_iter()
            .filter_map(|a| a.appid)
            .filter(|id| *id > 0)
            .take(max_results)
            .collect();
        info!(count = ids.len(), max_results, "steam: candidate app ids listed");
        Ok(ids)
    }

    /// Metadata for a game; None for non-games, failed lookups and transport errors.
    pub async fn fetch_item_details(&self, item_id: i64) -> Option<ItemDetails> {
        absorb(self.try_item_details(item_id).await)
    }

    pub async fn fetch_review_summary(&self, item_id: i64) -> Option<ReviewSummary> {
        absorb(self.try_review_summary(item_id).await)
    }

    pub async fn fetch_owner_estimate(&self, item_id: i64) -> Option<i64> {
        absorb(self.try_owner_estimate(item_id).await)
    }

    async fn call(
        &self,
        item_id: i64,
        req: SteamRequest,
    ) -> std::result::Result<Value, ItemFetchFailure> {
        self.transport
            .get_json(&req)
            .await
            .map_err(|reason| ItemFetchFailure {
                item_id,
                endpoint: req.endpoint,
                reason,
            })
    }

    async fn try_item_details(
        &self,
        item_id: i64,
    ) -> std::result::Result<Option<ItemDetails>, ItemFetchFailure> {
        let req = SteamRequest::new(Endpoint::AppDetails, APPDETAILS_URL, self.config.item_timeout)
            .param("appids", item_id)
            .param("cc", &self.config.region)
            .param("l", &self.config.language);
        let mut body = self.call(item_id, req).await?;
        let Some(entry) = body.get_mut(item_id.to_string()).map(Value::take) else {
            debug!(app_id = item_id, "steam: appdetails has no entry for app");
            return Ok(None);
        };
        let malformed = |e: serde_json::Error| ItemFetchFailure {
            item_id,
            endpoint: Endpoint::AppDetails,
            reason: FetchError::Malformed(e.to_string()),
        };
        let entry: AppDetailsEntry = serde_json::from_value(entry).map_err(malformed)?;
        let Some(raw) = entry.data.filter(|_| entry.success) else {
            debug!(app_id = item_id, "steam: appdetails reported failure");
            return Ok(None);
        };
        let data: AppData = serde_json::from_value(raw.clone()).map_err(malformed)?;
        if data.kind.as_deref() != Some("game") {
            debug!(app_id = item_id, kind = ?data.kind, "steam: not a game; skipping");
            return Ok(None);
        }
        Ok(Some(ItemDetails { data, raw }))
    }

    async fn try_review_summary(
        &self,
        item_id: i64,
    ) -> std::result::Result<Option<ReviewSummary>, ItemFetchFailure> {
        let url = format!("{APPREVIEWS_URL}{item_id}");
        let req = SteamRequest::new(Endpoint::AppReviews, url, self.config.item_timeout)
            .param("json", 1)
            .param("language", "all")
            .param("purchase_type", "all")
            .param("num_per_page", 0);
        let body = self.call(item_id, req).await?;
        let Some(raw) = body.get("query_summary").filter(|v| v.is_object()).cloned() else {
            return Ok(None);
        };
        let summary: QuerySummary =
            serde_json::from_value(raw.clone()).map_err(|e| ItemFetchFailure {
                item_id,
                endpoint: Endpoint::AppReviews,
                reason: FetchError::Malformed(e.to_string()),
            })?;
        Ok(Some(ReviewSummary {
            total_reviews: summary.total_reviews,
            positive_reviews: summary.total_positive,
            raw,
        }))
    }

    async fn try_owner_estimate(
        &self,
        item_id: i64,
    ) -> std::result::Result<Option<i64>, ItemFetchFailure> {
        let req = SteamRequest::new(Endpoint::OwnerStats, STEAMSPY_URL, self.config.item_timeout)
            .param("request", "appdetails")
            .param("appid", item_id);
        let body = self.call(item_id, req).await?;
        let Some(owners) = body.get("owners").and_then(Value::as_str) else {
            return Ok(None);
        };
        if owners.trim().is_empty() {
            return Ok(None);
        }
        match parse_owners_midpoint(owners) {
            Some(mid) => Ok(Some(mid)),
            None => Err(ItemFetchFailure {
                item_id,
                endpoint: Endpoint::OwnerStats,
                reason: FetchError::Malformed(format!("owners range {owners:?}")),
            }),
        }
    }

    /// Details, reviews and owners for one app merged into a record.
    /// None when the app has no usable metadata; no further calls are made then.
    pub async fn collect_item(
        &self,
        item_id: i64,
        snapshot_time: DateTime<Utc>,
    ) -> Option<RawItemRecord> {
        let details = self.fetch_item_details(item_id).await?;
        let reviews = self.fetch_review_summary(item_id).await;
        let owners = self.fetch_owner_estimate(item_id).await;
        Some(merge_record(item_id, snapshot_time, details, reviews, owners))
    }

    /// Collect with a snapshot time taken now.
    pub async fn collect(&self, max_games: usize) -> Result<Vec<RawItemRecord>> {
        self.collect_at(max_games, Utc::now()).await
    }

    /// Walk the listed ids in order, pausing between items; a bad id only drops itself.
    pub async fn collect_at(
        &self,
        max_games: usize,
        snapshot_time: DateTime<Utc>,
    ) -> Result<Vec<RawItemRecord>> {
        let app_ids = self.list_candidate_ids(max_games).await?;
        let mut records: Vec<RawItemRecord> = Vec::with_capacity(app_ids.len());

        for (idx, &app_id) in app_ids.iter().enumerate() {
            if idx > 0 && !self.config.item_pause.is_zero() {
                tokio::time::sleep(self.config.item_pause).await;
            }
            if let Some(record) = self.collect_item(app_id, snapshot_time).await {
                records.push(record);
            }
            if (idx + 1) % PROGRESS_EVERY == 0 {
                info!(processed = idx + 1, collected = records.len(), "steam: collection progress");
            }
        }

        info!(
            listed = app_ids.len(),
            collected = records.len(),
            skipped = app_ids.len() - records.len(),
            snapshot = %snapshot_time.to_rfc3339(),
            "steam: collection finished"
        );
        Ok(records)
    }
}

fn absorb<V>(res: std::result::Result<Option<V>, ItemFetchFailure>) -> Option<V> {
    match res {
        Ok(v) => v,
        Err(failure) => {
            warn!(
                app_id = failure.item_id,
                endpoint = ?failure.endpoint,
                error = %failure.reason,
                "steam: item fetch failed; treating as absent"
            );
            None
        }
    }
}

fn merge_record(
    item_id: i64,
    snapshot_time: DateTime<Utc>,
    details: ItemDetails,
    reviews: Option<ReviewSummary>,
    owners: Option<i64>,
) -> RawItemRecord {
    let ItemDetails { data, raw } = details;
    let price = data.price_overview.unwrap_or_default();
    let genres = data
        .genres
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| g.description)
        .filter(|d| !d.is_empty())
        .collect();
    let (total_reviews, positive_reviews, raw_review_summary) = match reviews {
        Some(r) => (r.total_reviews, r.positive_reviews, Some(r.raw)),
        None => (None, None, None),
    };
    RawItemRecord {
        item_id,
        name: data.name,
        release_date: data.release_date.and_then(|r| r.date),
        price_original_cents: price.initial_price,
        price_current_cents: price.final_price,
        is_free: data.is_free,
        genres,
        total_reviews,
        positive_reviews,
        owners_estimate: owners,
        snapshot_time,
        raw_details: Some(raw),
        raw_review_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted transport: responses keyed by endpoint and app id ("" for the listing).
    #[derive(Default)]
    struct FakeTransport {
        responses: HashMap<(Endpoint, String), std::result::Result<Value, FetchError>>,
        calls: Mutex<Vec<(Endpoint, String)>>,
    }

    impl FakeTransport {
        fn respond(mut self, endpoint: Endpoint, id: &str, body: Value) -> Self {
            self.responses.insert((endpoint, id.to_string()), Ok(body));
            self
        }

        fn fail(mut self, endpoint: Endpoint, id: &str, err: FetchError) -> Self {
            self.responses.insert((endpoint, id.to_string()), Err(err));
            self
        }

        fn calls_for(&self, id: &str) -> Vec<Endpoint> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, i)| i == id)
                .map(|(e, _)| *e)
                .collect()
        }
    }

    #[async_trait]
    impl SteamTransport for FakeTransport {
        async fn get_json(&self, request: &SteamRequest) -> std::result::Result<Value, FetchError> {
            let id = match request.endpoint {
                Endpoint::AppList => String::new(),
                Endpoint::AppDetails => request.get("appids").unwrap_or_default().to_string(),
                Endpoint::OwnerStats => request.get("appid").unwrap_or_default().to_string(),
                Endpoint::AppReviews => request.url.trim_start_matches(APPREVIEWS_URL).to_string(),
            };
            self.calls.lock().unwrap().push((request.endpoint, id.clone()));
            self.responses
                .get(&(request.endpoint, id))
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    fn config() -> CollectorConfig {
        let mut cfg = CollectorConfig::new("test-key").unwrap();
        cfg.item_pause = Duration::ZERO;
        cfg
    }

    fn snapshot() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
    }

    fn app_list(ids: &[i64]) -> Value {
        let apps: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "appid": id, "name": format!("App {id}") }))
            .collect();
        json!({ "response": { "apps": apps } })
    }

    fn game_details(id: i64) -> Value {
        json!({
            id.to_string(): {
                "success": true,
                "data": {
                    "type": "game",
                    "name": "Half-Life 2",
                    "is_free": false,
                    "release_date": { "coming_soon": false, "date": "Nov 16, 2004" },
                    "price_overview": { "currency": "USD", "initial": 999, "final": 199 },
                    "genres": [
                        { "id": "1", "description": "Action" },
                        { "id": "3", "description": "RPG" }
                    ]
                }
            }
        })
    }

    #[test]
    fn owners_midpoint_parses_ranges() {
        assert_eq!(parse_owners_midpoint("20,000..50,000"), Some(35_000));
        assert_eq!(parse_owners_midpoint("20,000 .. 50,000"), Some(35_000));
        assert_eq!(parse_owners_midpoint("0 .. 20,000"), Some(10_000));
        assert_eq!(parse_owners_midpoint("1..2"), Some(1));
        assert_eq!(parse_owners_midpoint("50,000"), None);
        assert_eq!(parse_owners_midpoint("1..2..3"), None);
        assert_eq!(parse_owners_midpoint("lots..more"), None);
        assert_eq!(parse_owners_midpoint(""), None);
    }

    #[test]
    fn owners_midpoint_rejects_overflowing_ranges() {
        assert_eq!(
            parse_owners_midpoint("9223372036854775807..9223372036854775807"),
            None
        );
        assert_eq!(
            parse_owners_midpoint("9223372036854775806..0"),
            Some(4_611_686_018_427_387_903)
        );
    }

    #[tokio::test]
    async fn overflowing_owners_range_only_drops_the_field() {
        let fake = FakeTransport::default()
            .respond(Endpoint::AppList, "", app_list(&[220, 221]))
            .respond(Endpoint::AppDetails, "220", game_details(220))
            .respond(Endpoint::AppDetails, "221", game_details(221))
            .respond(
                Endpoint::OwnerStats,
                "220",
                json!({ "owners": "9,223,372,036,854,775,807 .. 9,223,372,036,854,775,807" }),
            )
            .respond(Endpoint::OwnerStats, "221", json!({ "owners": "0 .. 20,000" }));
        let collector = SteamCollector::new(config(), fake);

        let records = collector.collect_at(5, snapshot()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].owners_estimate, None);
        assert_eq!(records[0].name.as_deref(), Some("Half-Life 2"));
        assert_eq!(records[1].owners_estimate, Some(10_000));
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let fake = FakeTransport::default().fail(
            Endpoint::AppList,
            "",
            FetchError::Transport("connection refused".into()),
        );
        let collector = SteamCollector::new(config(), fake);
        let err = collector.collect_at(10, snapshot()).await.unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_listing_is_fatal() {
        let fake =
            FakeTransport::default().respond(Endpoint::AppList, "", json!({ "apps": "nope" }));
        let collector = SteamCollector::new(config(), fake);
        let err = collector.list_candidate_ids(10).await.unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn listing_is_capped_and_skips_missing_ids() {
        let body = json!({ "response": { "apps": [
            { "appid": 10 }, { "name": "no id" }, { "appid": 20 }, { "appid": 30 }
        ] } });
        let fake = FakeTransport::default().respond(Endpoint::AppList, "", body);
        let collector = SteamCollector::new(config(), fake);
        assert_eq!(collector.list_candidate_ids(2).await.unwrap(), vec![10, 20]);
    }

    #[tokio::test]
    async fn merges_all_sources_into_one_record() {
        let fake = FakeTransport::default()
            .respond(Endpoint::AppList, "", app_list(&[220]))
            .respond(Endpoint::AppDetails, "220", game_details(220))
            .respond(
                Endpoint::AppReviews,
                "220",
                json!({ "success": 1, "query_summary": { "total_reviews": 1000, "total_positive": 900 } }),
            )
            .respond(Endpoint::OwnerStats, "220", json!({ "owners": "20,000 .. 50,000" }));
        let collector = SteamCollector::new(config(), fake);

        let records = collector.collect_at(5, snapshot()).await.unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.item_id, 220);
        assert_eq!(r.name.as_deref(), Some("Half-Life 2"));
        assert_eq!(r.release_date.as_deref(), Some("Nov 16, 2004"));
        assert_eq!(r.price_original_cents, Some(999));
        assert_eq!(r.price_current_cents, Some(199));
        assert_eq!(r.is_free, Some(false));
        assert_eq!(r.genres, vec!["Action".to_string(), "RPG".to_string()]);
        assert_eq!(r.total_reviews, Some(1000));
        assert_eq!(r.positive_reviews, Some(900));
        assert_eq!(r.owners_estimate, Some(35_000));
        assert_eq!(r.snapshot_time, snapshot());
        assert!(r.raw_details.is_some());
        assert!(r.raw_review_summary.is_some());
    }

    #[tokio::test]
    async fn secondary_failures_degrade_fields_only() {
        let fake = FakeTransport::default()
            .respond(Endpoint::AppList, "", app_list(&[220]))
            .respond(Endpoint::AppDetails, "220", game_details(220))
            .fail(Endpoint::AppReviews, "220", FetchError::Transport("timed out".into()))
            .respond(Endpoint::OwnerStats, "220", json!({ "owners": "unknown" }));
        let collector = SteamCollector::new(config(), fake);

        let records = collector.collect_at(5, snapshot()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_reviews, None);
        assert_eq!(records[0].positive_reviews, None);
        assert_eq!(records[0].owners_estimate, None);
        assert_eq!(records[0].price_original_cents, Some(999));
    }

    #[tokio::test]
    async fn skips_non_games_and_failed_lookups_without_further_calls() {
        let fake = FakeTransport::default()
            .respond(Endpoint::AppList, "", app_list(&[1, 2, 3, 4]))
            .respond(
                Endpoint::AppDetails,
                "1",
                json!({ "1": { "success": true, "data": { "type": "dlc", "name": "Soundtrack" } } }),
            )
            .respond(Endpoint::AppDetails, "2", json!({ "2": { "success": false } }))
            .fail(Endpoint::AppDetails, "3", FetchError::Status(500))
            .respond(Endpoint::AppDetails, "4", game_details(4))
            .respond(Endpoint::OwnerStats, "4", json!({ "owners": "0 .. 20,000" }));
        let collector = SteamCollector::new(config(), fake);

        let records = collector.collect_at(10, snapshot()).await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![4]);
        assert_eq!(records[0].owners_estimate, Some(10_000));
        // Reviews for app 4 were never scripted, so they 404 and degrade to absent.
        assert_eq!(records[0].total_reviews, None);

        for skipped in ["1", "2", "3"] {
            assert_eq!(collector.transport.calls_for(skipped), vec![Endpoint::AppDetails]);
        }
        assert_eq!(
            collector.transport.calls_for("4"),
            vec![Endpoint::AppDetails, Endpoint::AppReviews, Endpoint::OwnerStats]
        );
    }

    #[tokio::test]
    async fn keeps_listing_order_and_shared_snapshot() {
        let fake = FakeTransport::default()
            .respond(Endpoint::AppList, "", app_list(&[30, 10, 20]))
            .respond(Endpoint::AppDetails, "30", game_details(30))
            .respond(Endpoint::AppDetails, "10", game_details(10))
            .respond(Endpoint::AppDetails, "20", game_details(20));
        let collector = SteamCollector::new(config(), fake);

        let records = collector.collect_at(10, snapshot()).await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert!(records.iter().all(|r| r.snapshot_time == snapshot()));
    }

    #[tokio::test]
    async fn missing_price_block_leaves_prices_absent() {
        let details = json!({ "7": { "success": true, "data": {
            "type": "game", "name": "Free Thing", "is_free": true, "genres": []
        } } });
        let fake = FakeTransport::default().respond(Endpoint::AppDetails, "7", details);
        let collector = SteamCollector::new(config(), fake);

        let record = collector.collect_item(7, snapshot()).await.unwrap();
        assert_eq!(record.price_original_cents, None);
        assert_eq!(record.price_current_cents, None);
        assert_eq!(record.is_free, Some(true));
        assert!(record.genres.is_empty());
        assert_eq!(record.release_date, None);
    }

    #[test]
    fn config_rejects_blank_api_key() {
        assert!(matches!(
            CollectorConfig::new("  "),
            Err(PipelineError::Config(_))
        ));
    }
}
