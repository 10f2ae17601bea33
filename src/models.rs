use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One collected catalog item, as written to the raw JSON snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItemRecord {
    pub item_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub price_original_cents: Option<i64>,
    #[serde(default)]
    pub price_current_cents: Option<i64>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub total_reviews: Option<i64>,
    #[serde(default)]
    pub positive_reviews: Option<i64>,
    #[serde(default)]
    pub owners_estimate: Option<i64>,
    pub snapshot_time: DateTime<Utc>,
    // Audit copies of the upstream payloads; never read past the cleaner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_review_summary: Option<Value>,
}

impl RawItemRecord {
    /// A record carrying only the id and snapshot; every optional field absent.
    pub fn bare(item_id: i64, snapshot_time: DateTime<Utc>) -> Self {
        Self {
            item_id,
            name: None,
            release_date: None,
            price_original_cents: None,
            price_current_cents: None,
            is_free: None,
            genres: Vec::new(),
            total_reviews: None,
            positive_reviews: None,
            owners_estimate: None,
            snapshot_time,
            raw_details: None,
            raw_review_summary: None,
        }
    }
}

/// Column order of the clean dataset. Field order of [`CleanRow`] must match.
pub const CLEAN_COLUMNS: [&str; 11] = [
    "item_id",
    "name",
    "price_original_usd",
    "price_current_usd",
    "is_free",
    "owners_estimate",
    "total_reviews",
    "review_ratio",
    "days_since_release",
    "main_genre",
    "release_date",
];

/// Sentinel used when an item lists no genres.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// One row of the clean dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
    pub item_id: i64,
    pub name: Option<String>,
    pub price_original_usd: f64,
    pub price_current_usd: Option<f64>,
    pub is_free: bool,
    pub owners_estimate: i64,
    pub total_reviews: i64,
    pub review_ratio: Option<f64>,
    pub days_since_release: Option<i64>,
    pub main_genre: String,
    pub release_date: String,
}

/// Row shape of the `games` table.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedGameRow {
    pub item_id: i64,
    pub name: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub price_original_usd: Option<f64>,
    pub price_current_usd: Option<f64>,
    pub review_ratio: Option<f64>,
    pub owners_estimate: Option<i64>,
    pub days_since_release: Option<i64>,
    pub is_free: bool,
    pub main_genre: Option<String>,
    pub total_reviews: Option<i64>,
    pub genres_json: Value,
    pub raw_data_json: Value,
}
