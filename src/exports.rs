//! Discovery of previously exported data files
//!
//! Exports are named `farm-calculator-YYYY-MM-DD.json`. Scanning a directory
//! tree for that pattern lets the newest export be re-imported without
//! typing its path.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

impl fmt::Display for ExportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.date, self.path.display())
    }
}

fn export_name_pattern() -> Result<Regex> {
    Ok(Regex::new(r"^farm-calculator-(\d{4}-\d{2}-\d{2})\.json$")?)
}

/// Find export files under `dir`, oldest first
pub fn find_exports(dir: &Path) -> Result<Vec<ExportFile>> {
    let pattern = export_name_pattern()?;
    let mut exports = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let filename = entry.file_name().to_str().unwrap_or("");
        let Some(cap) = pattern.captures(filename) else {
            continue;
        };

        // The pattern admits impossible dates like 2025-13-40
        match NaiveDate::parse_from_str(&cap[1], "%Y-%m-%d") {
            Ok(date) => exports.push(ExportFile {
                path: entry.path().to_path_buf(),
                date,
            }),
            Err(_) => debug!(file = %entry.path().display(), "skipping export with invalid date"),
        }
    }

    exports.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    Ok(exports)
}

/// The most recent export under `dir`, if there is one
pub fn latest_export(dir: &Path) -> Result<Option<ExportFile>> {
    Ok(find_exports(dir)?.pop())
}
