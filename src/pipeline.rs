//! File-backed stage runners: raw JSON snapshot → clean CSV → `games` table.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::database_ops::clean_dataset::read_clean_csv;
use crate::database_ops::games::GameLoader;
use crate::database_ops::steam::{SteamCollector, SteamTransport};
use crate::error::Result;
use crate::models::RawItemRecord;
use crate::normalization::{clean_records, write_clean_csv};

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_raw_records(records: &[RawItemRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, records)?;
    out.flush()?;
    Ok(())
}

pub fn read_raw_records(path: &Path) -> Result<Vec<RawItemRecord>> {
    let input = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(input)?)
}

/// Collect a sample and save it as the raw snapshot. Returns the record count.
pub async fn collect_to_file<T: SteamTransport>(
    collector: &SteamCollector<T>,
    max_games: usize,
    output: &Path,
) -> Result<usize> {
    let records = collector.collect(max_games).await?;
    write_raw_records(&records, output)?;
    info!(records = records.len(), path = %output.display(), "collect: raw snapshot saved");
    Ok(records.len())
}

/// Clean a raw snapshot into the CSV dataset. Returns the retained row count.
pub fn clean_file(input: &Path, output: &Path) -> Result<usize> {
    let records = read_raw_records(input)?;
    info!(records = records.len(), path = %input.display(), "clean: raw records read");
    let rows = clean_records(&records);
    ensure_parent_dir(output)?;
    let out = BufWriter::new(File::create(output)?);
    write_clean_csv(&rows, out)?;
    info!(
        retained = rows.len(),
        dropped = records.len() - rows.len(),
        path = %output.display(),
        "clean: dataset saved"
    );
    Ok(rows.len())
}

/// Validate and load the CSV dataset, replacing the table. Returns rows inserted.
pub async fn load_file(loader: &GameLoader, input: &Path) -> Result<u64> {
    let rows = read_clean_csv(BufReader::new(File::open(input)?))?;
    info!(rows = rows.len(), path = %input.display(), table = loader.table(), "load: dataset validated");
    loader.replace_all(&rows).await
}
