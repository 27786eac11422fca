//! JSON import/export for default assumptions and saved scenario files
//!
//! Scenario files are named `<name>_<YYYYmmdd>_<HHMMSS>.json` and hold
//! `{ "name", "timestamp", "year_data": { "year1", "year2", "year3" } }`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use regex::Regex;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::projection::Projection;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static SCENARIO_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+)_(?P<stamp>\d{8}_\d{6})\.json$").expect("valid scenario file regex")
});

/// On-disk scenario document
#[derive(Debug, Serialize, Deserialize)]
struct ScenarioFile {
    name: String,
    timestamp: String,
    year_data: Projection,
}

/// A scenario file found on disk, with the name and time encoded in its path
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioFileRef {
    pub path: PathBuf,
    pub name: String,
    pub saved_at: NaiveDateTime,
}

/// Read a `{year1, year2, year3}` defaults document
pub fn load_defaults(path: &Path) -> Result<Projection> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read defaults from {}", path.display()))?;
    let projection: Projection = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse defaults in {}", path.display()))?;
    projection.validate()?;
    Ok(projection)
}

/// Split a scenario file name into its name and timestamp
pub fn parse_scenario_file_name(file_name: &str) -> Option<(String, NaiveDateTime)> {
    let caps = SCENARIO_FILE_RE.captures(file_name)?;
    let saved_at = NaiveDateTime::parse_from_str(&caps["stamp"], FILE_STAMP_FORMAT).ok()?;
    Some((caps["name"].to_string(), saved_at))
}

/// Find all scenario files under a directory
pub fn find_scenario_files(dir: &Path) -> Result<Vec<ScenarioFileRef>> {
    if !dir.is_dir() {
        return Err(anyhow!("{} is not a directory", dir.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some((name, saved_at)) = parse_scenario_file_name(file_name) {
            files.push(ScenarioFileRef {
                path: entry.path().to_path_buf(),
                name,
                saved_at,
            });
        }
    }

    files.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

fn to_local(naive: NaiveDateTime) -> DateTime<Local> {
    // Ambiguous or skipped local times (DST changes) fall back to UTC
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

fn read_scenario_file(file: &ScenarioFileRef) -> Result<(String, DateTime<Local>, Projection)> {
    let content = fs::read_to_string(&file.path)
        .with_context(|| format!("Failed to read {}", file.path.display()))?;
    let doc: ScenarioFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", file.path.display()))?;
    doc.year_data.validate()?;

    // The document's own timestamp wins over the one in the file name
    let saved_at = NaiveDateTime::parse_from_str(&doc.timestamp, TIMESTAMP_FORMAT)
        .unwrap_or(file.saved_at);
    let name = if doc.name.trim().is_empty() {
        file.name.clone()
    } else {
        doc.name
    };
    Ok((name, to_local(saved_at), doc.year_data))
}

/// Import all scenario files under a directory into the database
pub fn import_scenarios(conn: &Connection, dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    info!("Scanning {} for scenario files", dir.display());
    let files = find_scenario_files(dir)?;
    info!("Found {} scenario files", files.len());

    for file in &files {
        match read_scenario_file(file) {
            Ok((name, saved_at, _)) if db::scenario_exists(conn, &name, saved_at)? => {
                stats.skipped += 1;
                info!("  Already stored: {} ({})", name, saved_at.format(TIMESTAMP_FORMAT));
            }
            Ok((name, saved_at, projection)) => {
                db::save_scenario(conn, &name, saved_at, &projection)?;
                stats.imported += 1;
                info!("  Imported: {} ({})", name, saved_at.format(TIMESTAMP_FORMAT));
            }
            Err(e) => {
                warn!("  Error importing {}: {:#}", file.path.display(), e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

/// Write a scenario file into `dir`, returning its path
pub fn export_scenario(
    dir: &Path,
    name: &str,
    saved_at: DateTime<Local>,
    projection: &Projection,
) -> Result<PathBuf> {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(anyhow!("'{}' is not usable as a scenario file name", name));
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let doc = ScenarioFile {
        name: name.to_string(),
        timestamp: saved_at.format(TIMESTAMP_FORMAT).to_string(),
        year_data: *projection,
    };
    let path = dir.join(format!("{}_{}.json", name, saved_at.format(FILE_STAMP_FORMAT)));
    fs::write(&path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    /// Files whose name and timestamp were already in the database
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} scenarios. Skipped: {}. Errors: {}",
            self.imported, self.skipped, self.errors
        )
    }
}
