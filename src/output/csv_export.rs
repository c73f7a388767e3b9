//! CSV export of normalized records
//!
//! Every exported unit (one subregion) becomes a directory holding
//! `crashes.csv`, `vehicles.csv` and `participants.csv`.

use crate::crashes::{CountryCrashes, CrashPage, RegionCrashes};
use crate::normalize::{normalize, CrashRecord, NormalizedRecords, ParticipantRecord, VehicleRecord};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CRASHES_FILE: &str = "crashes.csv";
pub const VEHICLES_FILE: &str = "vehicles.csv";
pub const PARTICIPANTS_FILE: &str = "participants.csv";

/// Turns a region name into a single path component
pub fn dir_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Writes one table; the header row comes from the first record, or from
/// `headers` when there are no records
fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(headers)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes record sets under a root directory
#[derive(Debug, Clone)]
pub struct CsvExporter {
    root: PathBuf,
}

impl CsvExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the three record files into `root/relative`
    pub fn write_records(&self, relative: &Path, records: &NormalizedRecords) -> Result<PathBuf> {
        let dir = self.root.join(relative);
        std::fs::create_dir_all(&dir)?;

        write_csv(&dir.join(CRASHES_FILE), CrashRecord::HEADERS, &records.crashes)?;
        write_csv(&dir.join(VEHICLES_FILE), VehicleRecord::HEADERS, &records.vehicles)?;
        write_csv(
            &dir.join(PARTICIPANTS_FILE),
            ParticipantRecord::HEADERS,
            &records.participants,
        )?;

        tracing::debug!("Wrote {} crashes to {}", records.crashes.len(), dir.display());
        Ok(dir)
    }

    /// Normalizes pages and writes them into `root/relative`
    pub fn export_pages(&self, relative: &Path, pages: &[CrashPage]) -> Result<NormalizedRecords> {
        let records = normalize(pages);
        self.write_records(relative, &records)?;
        Ok(records)
    }

    /// Writes one directory per subregion under `root/<region>`
    ///
    /// Returns the number of crashes written.
    pub fn export_region(&self, region_name: &str, crashes: &RegionCrashes) -> Result<usize> {
        let region_dir = PathBuf::from(dir_name(region_name));
        let mut written = 0;

        for (subregion, pages) in crashes {
            let records = self.export_pages(&region_dir.join(dir_name(subregion)), pages)?;
            written += records.crashes.len();
        }

        tracing::info!(
            "Exported {} crashes for {} to {}",
            written,
            region_name,
            self.root.join(&region_dir).display()
        );
        Ok(written)
    }

    /// Writes every federal region of a country fetch
    pub fn export_country(&self, crashes: &CountryCrashes) -> Result<usize> {
        let mut written = 0;
        for (region_name, region_crashes) in crashes {
            written += self.export_region(region_name, region_crashes)?;
        }
        Ok(written)
    }
}
