use crate::models::CatalogRow;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn neutralize(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", cell),
        _ => cell.to_string(),
    }
}

/// Save the plot catalog as CSV with header.
pub fn save_catalog_csv<P: AsRef<Path>>(rows: &[CatalogRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.write_record(["entity", "anchor_id", "plot_id", "seed"])?;
    for r in rows {
        wtr.write_record([
            neutralize(&r.entity),
            neutralize(&r.anchor_id),
            neutralize(&r.plot_id),
            r.seed.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the plot catalog as a pretty JSON array.
pub fn save_catalog_json<P: AsRef<Path>>(rows: &[CatalogRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Pick CSV or JSON from the file extension (CSV when unknown).
pub fn save_catalog<P: AsRef<Path>>(rows: &[CatalogRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => save_catalog_json(rows, path),
        _ => save_catalog_csv(rows, path),
    }
}
