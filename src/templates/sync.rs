//! Refresh the bundled template CSV from a published spreadsheet.

use crate::error::{Result, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Spreadsheet id and tab (gid) extracted from a sheet URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpreadsheetRef {
    pub id: String,
    pub gid: String,
}

impl SpreadsheetRef {
    /// CSV export URL for this tab.
    pub fn export_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
            self.id, self.gid
        )
    }
}

/// Extract the id from `/d/{id}` and the gid from `#gid=` or `?gid=`
/// (default `0`). Returns None if there is no id.
pub fn parse_spreadsheet_url(url: &str) -> Option<SpreadsheetRef> {
    let id = url.match_indices("/d/").find_map(|(pos, m)| {
        let rest = &url[pos + m.len()..];
        let id: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        (!id.is_empty()).then_some(id)
    })?;

    let gid = url
        .match_indices("gid=")
        .filter(|(pos, _)| *pos > 0 && matches!(url.as_bytes()[pos - 1], b'#' | b'?'))
        .find_map(|(pos, m)| {
            let digits: String = url[pos + m.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            (!digits.is_empty()).then_some(digits)
        })
        .unwrap_or_else(|| "0".to_string());

    Some(SpreadsheetRef { id, gid })
}

/// Check downloaded template CSV and return its data row count.
///
/// Requires a header plus at least one data line, and a header that
/// mentions both `name` and `price`.
pub fn validate_template_csv(text: &str) -> Result<usize> {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    if lines.len() < 2 {
        return Err(StoreError::InvalidTemplateCsv(
            "CSV must have at least a header row and one data row".into(),
        ));
    }

    let header = lines[0];
    if !header.contains("name") || !header.contains("price") {
        return Err(StoreError::InvalidTemplateCsv(
            "CSV must have \"name\" and \"price\" columns".into(),
        ));
    }

    Ok(lines.len() - 1)
}

/// Outcome of a successful sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub sheet: SpreadsheetRef,
    pub rows: usize,
    pub path: PathBuf,
}

/// Write validated template text to `dest`, replacing it atomically.
pub fn write_templates(text: &str, dest: &Path) -> Result<usize> {
    let rows = validate_template_csv(text)?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = dest.with_extension("csv.tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, dest)?;

    Ok(rows)
}

/// Download CSV from `export_url` and write it to `dest`. A non-success
/// status or text that fails validation leaves `dest` untouched.
pub fn fetch_and_write(export_url: &str, dest: &Path) -> Result<usize> {
    let response = reqwest::blocking::get(export_url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::Http(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )));
    }
    let text = response.text()?;

    write_templates(&text, dest)
}

/// Download the sheet behind `url` and overwrite `dest`. Nothing is written
/// unless every check passes.
pub fn sync_templates(url: &str, dest: &Path) -> Result<SyncReport> {
    let sheet = parse_spreadsheet_url(url)
        .ok_or_else(|| StoreError::InvalidSpreadsheetUrl(url.to_string()))?;
    info!(id = %sheet.id, gid = %sheet.gid, "syncing templates");

    let rows = fetch_and_write(&sheet.export_url(), dest)?;
    info!(rows, path = %dest.display(), "templates written");

    Ok(SyncReport {
        sheet,
        rows,
        path: dest.to_path_buf(),
    })
}
