//! Reading the clean CSV back into typed rows for the `games` table.
//!
//! Every cell arrives as text; absence markers left by upstream tooling
//! (`""`, `NaN`, `null`, `None`, ...) are read uniformly as absent.
use csv::StringRecord;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Read;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::models::{CleanRow, PersistedGameRow, CLEAN_COLUMNS};
use crate::normalization::parse_release_date;

const MISSING_MARKERS: [&str; 7] = ["nan", "null", "none", "nat", "<na>", "n/a", "na"];

fn is_missing(cell: &str) -> bool {
    let c = cell.trim();
    c.is_empty() || MISSING_MARKERS.iter().any(|m| c.eq_ignore_ascii_case(m))
}

/// Names of required columns not present in `headers`, in column order.
pub fn missing_columns<'a, I>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = headers.into_iter().map(str::trim).collect();
    CLEAN_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect()
}

pub fn coerce_f64(column: &str, cell: &str) -> Option<f64> {
    if is_missing(cell) {
        return None;
    }
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_) => {
            warn!(column, value = cell, "non-numeric cell; treating as absent");
            None
        }
    }
}

/// Integers may arrive as float text ("120.0"); those are rounded.
/// Values outside the `i64` range are absent rather than clamped.
pub fn coerce_i64(column: &str, cell: &str) -> Option<i64> {
    if is_missing(cell) {
        return None;
    }
    let c = cell.trim();
    if let Ok(v) = c.parse::<i64>() {
        return Some(v);
    }
    match c.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, hence the exclusive upper bound.
        Ok(v) if v.is_finite() && v.round() >= i64::MIN as f64 && v.round() < i64::MAX as f64 => {
            Some(v.round() as i64)
        }
        Ok(_) => {
            warn!(column, value = cell, "integer cell out of range; treating as absent");
            None
        }
        Err(_) => {
            warn!(column, value = cell, "non-integer cell; treating as absent");
            None
        }
    }
}

/// `1/0`, `true/false`, `t/f`, `yes/no`; absent reads as false.
pub fn coerce_bool(cell: &str) -> bool {
    if is_missing(cell) {
        return false;
    }
    let v = cell.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "t" | "yes" | "1.0" => true,
        "0" | "false" | "f" | "no" | "0.0" => false,
        _ => {
            warn!(column = "is_free", value = cell, "unrecognized flag; treating as false");
            false
        }
    }
}

fn coerce_text(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

pub fn genres_json(main_genre: Option<&str>) -> Value {
    match main_genre {
        Some(g) => json!([g]),
        None => json!([]),
    }
}

pub fn raw_data_json(
    price_original_usd: Option<f64>,
    price_current_usd: Option<f64>,
    main_genre: Option<&str>,
    is_free: bool,
) -> Value {
    json!({
        "price_original_usd": price_original_usd,
        "price_current_usd": price_current_usd,
        "main_genre": main_genre,
        "is_free": is_free,
    })
}

impl From<&CleanRow> for PersistedGameRow {
    fn from(row: &CleanRow) -> Self {
        let price_original_usd = Some(row.price_original_usd).filter(|v| v.is_finite());
        let price_current_usd = row.price_current_usd.filter(|v| v.is_finite());
        let review_ratio = row.review_ratio.filter(|v| v.is_finite());
        let main_genre = Some(row.main_genre.as_str()).filter(|g| !g.is_empty());
        PersistedGameRow {
            item_id: row.item_id,
            name: row.name.clone(),
            release_date: parse_release_date(&row.release_date),
            price_original_usd,
            price_current_usd,
            review_ratio,
            owners_estimate: Some(row.owners_estimate),
            days_since_release: row.days_since_release,
            is_free: row.is_free,
            main_genre: main_genre.map(str::to_string),
            total_reviews: Some(row.total_reviews),
            genres_json: genres_json(main_genre),
            raw_data_json: raw_data_json(
                price_original_usd,
                price_current_usd,
                main_genre,
                row.is_free,
            ),
        }
    }
}

/// Convert in-memory clean rows into table rows.
pub fn persisted_rows(rows: &[CleanRow]) -> Vec<PersistedGameRow> {
    rows.iter().map(PersistedGameRow::from).collect()
}

fn cell_at<'r>(index: &HashMap<&str, usize>, record: &'r StringRecord, name: &str) -> &'r str {
    index
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or_default()
}

/// Validate the header, then coerce every record.
///
/// Fails with `SchemaMismatch` before reading any record if a column is missing,
/// and with `InvalidRow` if a record has no usable `item_id`.
pub fn read_clean_csv<R: Read>(reader: R) -> Result<Vec<PersistedGameRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let missing = missing_columns(headers.iter());
    if !missing.is_empty() {
        return Err(PipelineError::SchemaMismatch { missing });
    }
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cell = |name: &str| cell_at(&index, &record, name);

        let item_id = coerce_i64("item_id", cell("item_id")).ok_or_else(|| {
            PipelineError::InvalidRow {
                line,
                message: format!("item_id {:?} is not an integer", cell("item_id")),
            }
        })?;
        let price_original_usd = coerce_f64("price_original_usd", cell("price_original_usd"));
        let price_current_usd = coerce_f64("price_current_usd", cell("price_current_usd"));
        let is_free = coerce_bool(cell("is_free"));
        let main_genre = coerce_text(cell("main_genre"));
        let release_date = parse_release_date(cell("release_date"));

        out.push(PersistedGameRow {
            item_id,
            name: coerce_text(cell("name")),
            release_date,
            price_original_usd,
            price_current_usd,
            review_ratio: coerce_f64("review_ratio", cell("review_ratio")),
            owners_estimate: coerce_i64("owners_estimate", cell("owners_estimate")),
            days_since_release: coerce_i64("days_since_release", cell("days_since_release")),
            is_free,
            total_reviews: coerce_i64("total_reviews", cell("total_reviews")),
            genres_json: genres_json(main_genre.as_deref()),
            raw_data_json: raw_data_json(
                price_original_usd,
                price_current_usd,
                main_genre.as_deref(),
                is_free,
            ),
            main_genre,
        });
    }
    Ok(out)
}
