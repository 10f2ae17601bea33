use std::io::Write;

use crate::error::Result;
use crate::models::{CleanRow, RawItemRecord, CLEAN_COLUMNS, UNKNOWN_GENRE};
use crate::normalization::release_date::parse_release_date;

/// Rows with fewer reviews than this are dropped.
pub const MIN_REVIEWS: i64 = 50;

/// True when every field the clean dataset requires is present.
pub fn is_complete(record: &RawItemRecord) -> bool {
    record.release_date.is_some()
        && record.total_reviews.is_some()
        && record.owners_estimate.is_some()
        && record.price_original_cents.is_some()
}

pub fn has_min_reviews(record: &RawItemRecord) -> bool {
    record.total_reviews.is_some_and(|n| n >= MIN_REVIEWS)
}

pub fn cents_to_usd(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// positive / total; None when either side is missing or total is zero.
pub fn review_ratio(positive: Option<i64>, total: Option<i64>) -> Option<f64> {
    match (positive, total) {
        (Some(p), Some(t)) if t != 0 => Some(p as f64 / t as f64),
        _ => None,
    }
}

pub fn main_genre(genres: &[String]) -> String {
    genres
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_GENRE.to_string())
}

/// Build the clean row for a record that already passed both filters.
///
/// Returns None if a required field is absent, which the filters rule out.
fn derive_row(record: &RawItemRecord) -> Option<CleanRow> {
    let release_date = record.release_date.clone()?;
    let snapshot_day = record.snapshot_time.date_naive();
    let days_since_release =
        parse_release_date(&release_date).map(|d| (snapshot_day - d).num_days());
    Some(CleanRow {
        item_id: record.item_id,
        name: record.name.clone(),
        price_original_usd: cents_to_usd(record.price_original_cents?),
        price_current_usd: record.price_current_cents.map(cents_to_usd),
        is_free: record.is_free.unwrap_or(false),
        owners_estimate: record.owners_estimate?,
        total_reviews: record.total_reviews?,
        review_ratio: review_ratio(record.positive_reviews, record.total_reviews),
        days_since_release,
        main_genre: main_genre(&record.genres),
        release_date,
    })
}

/// Filter, derive and project raw records into the clean dataset, preserving input order.
pub fn clean_records(records: &[RawItemRecord]) -> Vec<CleanRow> {
    let complete: Vec<&RawItemRecord> = records.iter().filter(|r| is_complete(r)).collect();
    let reviewed: Vec<&RawItemRecord> = complete
        .into_iter()
        .filter(|r| has_min_reviews(r))
        .collect();
    reviewed.into_iter().filter_map(derive_row).collect()
}

/// Write rows as CSV with the fixed header, even when there are no rows.
pub fn write_clean_csv<W: Write>(rows: &[CleanRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CLEAN_COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
