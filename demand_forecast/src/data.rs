//! Loading, validating and normalising uploaded demand records

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reservation class column
pub const REZ_CLASS: &str = "Rez Class";
/// Arrival port column
pub const ARR_PORT: &str = "Seg Arr Port";
/// Departure port column
pub const DEP_PORT: &str = "Seg Dep Port";
/// Demand quantity column
pub const DEMAND: &str = "Demande";
/// Year-month period column
pub const PERIOD: &str = "ds";

/// Columns every uploaded file must carry
pub const REQUIRED_COLUMNS: [&str; 5] = [REZ_CLASS, ARR_PORT, DEP_PORT, DEMAND, PERIOD];

/// Field delimiter of uploaded files
pub const DELIMITER: u8 = b';';

/// The uploaded file as read, before any validation.
///
/// Every column is held as nullable text; empty cells are missing values.
#[derive(Debug, Clone)]
pub struct RawTable {
    df: DataFrame,
}

/// Loader for semicolon-delimited demand files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a table from a file on disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a table from uploaded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<RawTable> {
        Self::from_reader(bytes)
    }

    /// Parse delimited UTF-8 text with a header row into a [`RawTable`].
    ///
    /// Any decoding or structural problem is reported as
    /// [`ForecastError::UnreadableFile`].
    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable> {
        let mut rdr = ::csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(unreadable)?.clone();
        if headers.is_empty() {
            return Err(ForecastError::UnreadableFile(
                "No columns to parse from file".to_string(),
            ));
        }
        let names = column_names(&headers);
        let width = names.len();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
        for result in rdr.records() {
            let record = result.map_err(unreadable)?;
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(ForecastError::UnreadableFile(format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                )));
            }
            for (i, column) in columns.iter_mut().enumerate() {
                let cell = record.get(i).filter(|v| !v.is_empty()).map(str::to_string);
                column.push(cell);
            }
        }

        let series = names
            .iter()
            .zip(columns)
            .map(|(name, values)| Series::new(name, values))
            .collect::<Vec<Series>>();
        let df = DataFrame::new(series).map_err(unreadable)?;

        debug!(rows = df.height(), columns = width, "loaded raw table");
        Ok(RawTable { df })
    }
}

fn unreadable<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::UnreadableFile(err.to_string())
}

/// Header names with a leading byte-order mark stripped, blank names replaced
/// by `Unnamed: i` and repeated names suffixed `.1`, `.2`, ...
fn column_names(headers: &::csv::StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let header = if i == 0 {
            header.trim_start_matches('\u{feff}')
        } else {
            header
        };
        let base = if header.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut dup = 0;
        while seen.contains(&name) {
            dup += 1;
            name = format!("{}.{}", base, dup);
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

impl RawTable {
    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Column headers in file order
    pub fn column_names(&self) -> Vec<&str> {
        self.df.get_column_names()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Required columns absent from this table, in canonical order
    pub fn missing_columns(&self) -> Vec<String> {
        let present = self.column_names();
        REQUIRED_COLUMNS
            .iter()
            .filter(|required| !present.contains(*required))
            .map(|c| c.to_string())
            .collect()
    }

    /// Check that every required column is present.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_columns();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ForecastError::MissingColumns(missing))
        }
    }

    /// Convert validated raw rows into typed [`DemandRecord`]s.
    ///
    /// Rows whose period is not a `YYYY-MM` month are dropped without
    /// notice; only their count is kept on the result. A `Demande` cell that
    /// is neither a number nor a missing-value marker fails the whole table
    /// with [`ForecastError::NonNumericDemand`].
    pub fn normalize(&self) -> Result<DemandTable> {
        self.validate()?;

        let rez_class = self.text_column(REZ_CLASS)?;
        let arr_port = self.text_column(ARR_PORT)?;
        let dep_port = self.text_column(DEP_PORT)?;
        let demand = self.text_column(DEMAND)?;
        let period = self.text_column(PERIOD)?;

        let mut records = Vec::with_capacity(self.len());
        let mut dropped_rows = 0;

        for i in 0..self.len() {
            // Header is line 1
            let quantity = match demand[i] {
                Some(cell) => parse_demand(cell, i + 2)?,
                None => None,
            };
            let Some(date) = period[i].and_then(parse_period) else {
                dropped_rows += 1;
                continue;
            };
            records.push(DemandRecord {
                rez_class: rez_class[i].map(str::to_string),
                arr_port: arr_port[i].map(str::to_string),
                dep_port: dep_port[i].map(str::to_string),
                demand: quantity,
                period: date,
            });
        }

        debug!(
            kept = records.len(),
            dropped = dropped_rows,
            "normalized demand periods"
        );
        Ok(DemandTable {
            records,
            dropped_rows,
        })
    }

    fn text_column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let col = self.df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;
        Ok(col.utf8()?.into_iter().collect())
    }
}

/// Parse a `YYYY-MM` period into the first day of that month.
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    let (year, month) = value.split_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?;
    (FIRST_PERIOD..=LAST_PERIOD).contains(&date).then_some(date)
}

/// Earliest month whose first day fits a nanosecond timestamp
const FIRST_PERIOD: NaiveDate = match NaiveDate::from_ymd_opt(1677, 10, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Latest month whose first day fits a nanosecond timestamp
const LAST_PERIOD: NaiveDate = match NaiveDate::from_ymd_opt(2262, 4, 1) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// Cell texts read as a missing demand
const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse the demand cell found on `line`.
///
/// Missing-value markers and non-finite numbers give `None`. Any other text
/// that does not parse as a number is an error.
pub fn parse_demand(value: &str, line: usize) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() || MISSING_MARKERS.contains(&value) {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) => Ok(Some(v).filter(|v| v.is_finite())),
        Err(_) => Err(ForecastError::NonNumericDemand {
            line,
            value: value.to_string(),
        }),
    }
}

/// One uploaded row with a valid period
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRecord {
    /// Reservation class
    pub rez_class: Option<String>,
    /// Arrival port
    pub arr_port: Option<String>,
    /// Departure port
    pub dep_port: Option<String>,
    /// Demand quantity, missing when the cell was blank or a missing marker
    pub demand: Option<f64>,
    /// First day of the record's month
    pub period: NaiveDate,
}

/// Uploaded rows after period parsing
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    records: Vec<DemandRecord>,
    dropped_rows: usize,
}

impl DemandTable {
    /// Create a table from already-parsed records
    pub fn from_records(records: Vec<DemandRecord>) -> Self {
        Self {
            records,
            dropped_rows: 0,
        }
    }

    /// Retained records in file order
    pub fn records(&self) -> &[DemandRecord] {
        &self.records
    }

    /// Number of rows dropped because of an unparseable period
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Get the number of retained rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no rows were retained
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
