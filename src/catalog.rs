use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::db::{get_pdf_filenames, upsert_pdf_metadata};
use crate::error::AppError;
use crate::models::UpsertOutcome;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-_]").unwrap());
static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());
static SUFFIX_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]$").unwrap());
static FULL_DOSSIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[A-Za-z]\d*$").unwrap());
static LEADING_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)(.+)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub dossier_number: String,
    pub apar_employee_name: String,
}

/// Derives the dossier number and employee name encoded in a scanned APAR filename,
/// e.g. `6471-A-Smith.pdf` is dossier `6471A` for `Smith`.
pub fn parse_filename(filename: &str) -> ParsedFilename {
    let base_name = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let mut tokens = SEPARATORS.split(base_name).map(str::trim);
    let first = tokens.next().unwrap_or_default().to_string();
    let mut rest: Vec<&str> = tokens.collect();

    let mut name_parts: Vec<String> = Vec::new();
    let dossier_number = if NUMERIC.is_match(&first) {
        let mut dossier = first;
        // Absorb a letter suffix and an optional numeric sub-suffix: 6398-A-1 -> 6398A1
        if let Some(letter) = rest.first().filter(|t| SUFFIX_LETTER.is_match(t)) {
            dossier.push_str(letter);
            rest.remove(0);
            if let Some(number) = rest.first().filter(|t| NUMERIC.is_match(t)) {
                dossier.push_str(number);
                rest.remove(0);
            }
        }
        dossier
    } else if FULL_DOSSIER.is_match(&first) {
        first
    } else if let Some(caps) = LEADING_DIGITS.captures(&first) {
        name_parts.push(caps[2].to_string());
        caps[1].to_string()
    } else {
        first
    };

    name_parts.extend(rest.into_iter().filter(|p| !p.is_empty()).map(str::to_string));
    let apar_employee_name = name_parts
        .join(" ")
        .replace("pdf", "")
        .replace("(2)", "")
        .trim()
        .to_string();

    ParsedFilename {
        dossier_number,
        apar_employee_name,
    }
}

pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Resolves a requested filename to a PDF inside `directory`. Anything that is not a
/// single plain path component, not a `.pdf`, or not an existing file yields `None`.
pub fn resolve_pdf_path(directory: &Path, filename: &str) -> Option<PathBuf> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename => {}
        _ => return None,
    }

    if !is_pdf_filename(filename) {
        return None;
    }

    let path = directory.join(filename);
    path.is_file().then_some(path)
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SyncReport {
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Catalogued filenames no longer present on disk. Their rows are kept.
    pub missing: Vec<String>,
}

impl SyncReport {
    pub fn summary(&self) -> String {
        format!(
            "Catalog synced: {} files scanned, {} added, {} updated, {} missing on disk",
            self.scanned,
            self.inserted,
            self.updated,
            self.missing.len()
        )
    }
}

async fn list_pdf_files(directory: &Path) -> Result<Vec<String>, AppError> {
    let mut entries = tokio::fs::read_dir(directory).await?;
    let mut filenames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(file = ?file_name, "Skipping file with a non UTF-8 name");
            continue;
        };

        if is_pdf_filename(name) {
            filenames.push(name.to_string());
        }
    }

    filenames.sort();
    Ok(filenames)
}

/// Brings the catalog table in line with the PDFs in `directory`. Safe to run repeatedly.
#[instrument(skip(pool))]
pub async fn sync_directory(pool: &Pool<Sqlite>, directory: &Path) -> Result<SyncReport, AppError> {
    info!("Syncing PDF catalog");

    if !directory.exists() {
        info!("Creating PDF directory");
        tokio::fs::create_dir_all(directory).await?;
    }

    let filenames = list_pdf_files(directory).await?;
    let mut report = SyncReport {
        scanned: filenames.len(),
        ..Default::default()
    };

    let mut tx = pool.begin().await?;
    for filename in &filenames {
        let parsed = parse_filename(filename);
        let outcome = upsert_pdf_metadata(
            &mut tx,
            filename,
            &parsed.dossier_number,
            &parsed.apar_employee_name,
        )
        .await?;

        match outcome {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::Updated => report.updated += 1,
            UpsertOutcome::Unchanged => report.unchanged += 1,
        }
    }
    tx.commit().await?;

    let on_disk: BTreeSet<&str> = filenames.iter().map(String::as_str).collect();
    report.missing = get_pdf_filenames(pool)
        .await?
        .into_iter()
        .filter(|f| !on_disk.contains(f.as_str()))
        .collect();

    if !report.missing.is_empty() {
        warn!(missing = ?report.missing, "Catalogued PDFs are missing on disk");
    }

    info!(
        scanned = report.scanned,
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        "PDF catalog synced"
    );
    Ok(report)
}
