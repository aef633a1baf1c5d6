//! Result persistence
//!
//! Records accumulate in memory and every [`ResultSink::persist`] rewrites the
//! whole table, so the file on disk always holds a complete snapshot up to the
//! last finished unit of work.

use crate::error::{Error, Result};
use crate::table::{read_table, write_table};
use crate::types::{format_percent, CentralBankRecord, PersonaRecord, Profile, Scenario};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A record that maps to one table row
pub trait TableRecord: Sized {
    /// Header of the table, in file order
    const COLUMNS: &'static [&'static str];

    /// Cells in [`COLUMNS`](Self::COLUMNS) order
    fn to_row(&self) -> Vec<String>;

    /// Rebuild a record from cells in [`COLUMNS`](Self::COLUMNS) order
    fn from_row(row: &[String]) -> std::result::Result<Self, String>;
}

/// Destination for survey records
pub trait ResultSink<R> {
    /// Add a record to the in-memory table
    fn push(&mut self, record: R);

    /// Write the full table to durable storage
    fn persist(&mut self) -> Result<()>;

    /// Records accumulated so far
    fn records(&self) -> &[R];

    /// Where the table is written, for log messages
    fn location(&self) -> String;
}

/// Snapshot sink writing a CSV file
#[derive(Debug)]
pub struct CsvSnapshotSink<R> {
    path: PathBuf,
    records: Vec<R>,
}

impl<R: TableRecord> CsvSnapshotSink<R> {
    /// Start from an empty table; the first persist overwrites `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    /// Start from the first `keep` rows already stored at `path`.
    ///
    /// A missing file is an empty table. Fewer than `keep` stored rows is an
    /// error because the resumed table would have a gap.
    pub fn resume(path: impl Into<PathBuf>, keep: usize) -> Result<Self> {
        let path = path.into();
        if keep == 0 || !path.exists() {
            return Ok(Self::new(path));
        }

        let mut records = load_records::<R>(&path)?;
        if records.len() < keep {
            return Err(Error::storage(format!(
                "cannot resume: {} holds {} rows but {} are needed",
                path.display(),
                records.len(),
                keep
            )));
        }

        let dropped = records.len() - keep;
        records.truncate(keep);
        info!(
            path = %path.display(),
            kept = keep,
            dropped,
            "resuming from existing results"
        );

        Ok(Self { path, records })
    }

    /// Output location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the accumulated records
    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

impl<R: TableRecord> ResultSink<R> for CsvSnapshotSink<R> {
    fn push(&mut self, record: R) {
        self.records.push(record);
    }

    fn persist(&mut self) -> Result<()> {
        let rows: Vec<Vec<String>> = self.records.iter().map(R::to_row).collect();
        write_table(&self.path, R::COLUMNS, &rows)?;
        debug!(path = %self.path.display(), rows = rows.len(), "snapshot written");
        Ok(())
    }

    fn records(&self) -> &[R] {
        &self.records
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read every record stored at `path`
pub fn load_records<R: TableRecord>(path: &Path) -> Result<Vec<R>> {
    let table = read_table(path)?;
    let columns = table.require_columns(path, R::COLUMNS)?;

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let ordered: Vec<String> = columns.iter().map(|&c| row[c].clone()).collect();
            R::from_row(&ordered)
                .map_err(|reason| Error::malformed_table(path.display().to_string(), i + 2, reason))
        })
        .collect()
}

fn rate_cell(rate: Option<f64>) -> String {
    rate.map(format_percent).unwrap_or_default()
}

fn parse_rate_cell(cell: &str) -> std::result::Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    cell.parse()
        .map(Some)
        .map_err(|_| format!("interest rate '{}' is not a number", cell))
}

fn parse_cell<T: std::str::FromStr>(cell: &str, name: &str) -> std::result::Result<T, String> {
    cell.trim()
        .parse()
        .map_err(|_| format!("{} '{}' is not valid", name, cell))
}

impl TableRecord for PersonaRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Gender",
        "Age",
        "Kids",
        "Politics",
        "Education",
        "Income",
        "Inflation",
        "Unemployment",
        "Response",
        "Interest Rate",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.profile.gender.clone(),
            self.profile.age.to_string(),
            self.profile.kids.to_string(),
            self.profile.politics.clone(),
            self.profile.education.clone(),
            self.profile.income.clone(),
            format_percent(self.scenario.inflation),
            format_percent(self.scenario.unemployment),
            self.response.clone(),
            rate_cell(self.interest_rate),
        ]
    }

    fn from_row(row: &[String]) -> std::result::Result<Self, String> {
        Ok(Self {
            profile: Profile {
                gender: row[0].clone(),
                age: parse_cell(&row[1], "Age")?,
                kids: parse_cell(&row[2], "Kids")?,
                politics: row[3].clone(),
                education: row[4].clone(),
                income: row[5].clone(),
            },
            scenario: Scenario::new(
                parse_cell(&row[6], "Inflation")?,
                parse_cell(&row[7], "Unemployment")?,
            ),
            response: row[8].clone(),
            interest_rate: parse_rate_cell(&row[9])?,
        })
    }
}

impl TableRecord for CentralBankRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Iteration",
        "Role",
        "Inflation",
        "Unemployment",
        "Response",
        "Interest Rate",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.iteration.to_string(),
            self.role.clone(),
            format_percent(self.scenario.inflation),
            format_percent(self.scenario.unemployment),
            self.response.clone(),
            rate_cell(self.interest_rate),
        ]
    }

    fn from_row(row: &[String]) -> std::result::Result<Self, String> {
        Ok(Self {
            iteration: parse_cell(&row[0], "Iteration")?,
            role: row[1].clone(),
            scenario: Scenario::new(
                parse_cell(&row[2], "Inflation")?,
                parse_cell(&row[3], "Unemployment")?,
            ),
            response: row[4].clone(),
            interest_rate: parse_rate_cell(&row[5])?,
        })
    }
}
