use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::metrics::Weekly;
use crate::models::{
    CollegeRecord, TestingRow, WeeklyCaseRecord, WeeklyParticipationRecord, WeeklyTestingRecord,
};

#[derive(Error, Debug)]
pub enum DataFormatError {
    #[error("failed to read {table}: {source}")]
    Io {
        table: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("{table} row {row}: {message}")]
    InvalidValue {
        table: &'static str,
        row: u64,
        message: String,
    },

    #[error("{table} has no rows")]
    Empty { table: &'static str },
}

/// Where a table's rows come from.
#[derive(Debug, Clone)]
pub enum TableSource {
    Path(PathBuf),
    Inline(String),
}

impl TableSource {
    fn reader(&self, table: &'static str) -> Result<Box<dyn Read + '_>, DataFormatError> {
        match self {
            Self::Path(path) => {
                let file = std::fs::File::open(path)
                    .map_err(|source| DataFormatError::Io { table, source })?;
                Ok(Box::new(file))
            }
            Self::Inline(text) => Ok(Box::new(text.as_bytes())),
        }
    }
}

/// A record type backed by one CSV sheet.
pub trait Table: Sized {
    type Row: DeserializeOwned;

    const FILE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn from_row(row: Self::Row) -> Self;
}

impl Table for WeeklyCaseRecord {
    type Row = Self;

    const FILE: &'static str = "cases.csv";
    const COLUMNS: &'static [&'static str] = &["week_ending", "total_confirmed"];

    fn from_row(row: Self) -> Self {
        row
    }
}

impl Table for CollegeRecord {
    type Row = Self;

    const FILE: &'static str = "colleges.csv";
    const COLUMNS: &'static [&'static str] = &[
        "college",
        "positives",
        "isolating_households",
        "isolating_students",
        "last_updated",
        "source_name",
    ];

    fn from_row(row: Self) -> Self {
        row
    }
}

impl Table for WeeklyTestingRecord {
    type Row = TestingRow;

    const FILE: &'static str = "testing.csv";
    const COLUMNS: &'static [&'static str] = &[
        "week_ending",
        "asym_screened",
        "sym_screened",
        "asym_positive",
        "sym_positive",
        "other_positive",
        "asym_positive_rate",
        "sym_positive_rate",
    ];

    fn from_row(row: TestingRow) -> Self {
        row.into()
    }
}

impl Table for WeeklyParticipationRecord {
    type Row = Self;

    const FILE: &'static str = "participation.csv";
    const COLUMNS: &'static [&'static str] = &[
        "week_ending",
        "consented",
        "declined",
        "undecided",
        "consented_percent",
        "declined_percent",
        "undecided_percent",
    ];

    fn from_row(row: Self) -> Self {
        row
    }
}

pub fn load_table<T: Table>(source: &TableSource) -> Result<Vec<T>, DataFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source.reader(T::FILE)?);

    let headers = reader
        .headers()
        .map_err(|err| csv_error(T::FILE, err))?
        .clone();
    if let Some(column) = T::COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(DataFormatError::MissingColumn {
            table: T::FILE,
            column: *column,
        });
    }

    let mut records = Vec::new();
    for result in reader.deserialize::<T::Row>() {
        let row = result.map_err(|err| csv_error(T::FILE, err))?;
        records.push(T::from_row(row));
    }

    Ok(records)
}

/// Loads a weekly sheet, ordered by week ending. Empty sheets are rejected.
pub fn load_weekly<T: Table + Weekly>(source: &TableSource) -> Result<Vec<T>, DataFormatError> {
    let mut records = load_table::<T>(source)?;
    if records.is_empty() {
        return Err(DataFormatError::Empty { table: T::FILE });
    }
    records.sort_by_key(|record| record.week_ending());
    Ok(records)
}

fn csv_error(table: &'static str, err: csv::Error) -> DataFormatError {
    let row = err.position().map(|position| position.record()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => DataFormatError::Io { table, source },
        csv::ErrorKind::Deserialize { err, .. } => DataFormatError::InvalidValue {
            table,
            row,
            message: err.to_string(),
        },
        other => DataFormatError::InvalidValue {
            table,
            row,
            message: format!("{other:?}"),
        },
    }
}

/// Every sheet the page is built from.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub cases: Vec<WeeklyCaseRecord>,
    pub colleges: Vec<CollegeRecord>,
    pub testing: Vec<WeeklyTestingRecord>,
    pub participation: Vec<WeeklyParticipationRecord>,
}

impl DataSet {
    pub fn load(data_dir: &Path) -> Result<Self, DataFormatError> {
        let source = |file: &str| TableSource::Path(data_dir.join(file));

        let data = Self {
            cases: load_weekly(&source(WeeklyCaseRecord::FILE))?,
            colleges: load_table(&source(CollegeRecord::FILE))?,
            testing: load_weekly(&source(WeeklyTestingRecord::FILE))?,
            participation: load_weekly(&source(WeeklyParticipationRecord::FILE))?,
        };

        info!(
            data_dir = %data_dir.display(),
            cases = data.cases.len(),
            colleges = data.colleges.len(),
            testing = data.testing.len(),
            participation = data.participation.len(),
            "loaded dashboard data"
        );

        Ok(data)
    }
}
