//! One pass from uploaded file to forecast report
//!
//! The pipeline holds no state between runs. Everything a run depends on is
//! passed in through a [`Session`]: the upload, the current selection and the
//! horizon. A run stops early with a [`Notice`] when the file cannot be read,
//! lacks required columns, or no rows match the selection.

use crate::aggregate::aggregate;
use crate::data::{DataLoader, DemandTable};
use crate::error::{ForecastError, Result};
use crate::filters::{FilterOptions, SelectionInput};
use crate::models::{forecast, ForecastModel, Horizon};
use crate::presenter::{present, Report};
use crate::utils::FutureDates;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const UPLOAD_PROMPT: &str = "Please upload a CSV file to begin.";
pub const NO_DATA_WARNING: &str = "No data found for this combination. Try other selections.";

/// How a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk as an upload
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// The user's current inputs
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub upload: Option<Upload>,
    pub selection: SelectionInput,
    pub horizon: Horizon,
}

/// Result of loading and validating an upload
#[derive(Debug, Clone)]
pub enum TableLoad {
    Ready(DemandTable),
    Halted(Notice),
}

/// Result of listing the selectable values of an upload
#[derive(Debug, Clone)]
pub enum OptionsLoad {
    Ready(FilterOptions),
    Halted(Notice),
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No file has been provided yet
    AwaitingUpload(Notice),
    /// The run stopped before producing a forecast
    Halted(Notice),
    /// A forecast was produced
    Rendered(Box<Report>),
}

impl Outcome {
    /// The notice to show, if the run did not produce a report
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Outcome::AwaitingUpload(notice) | Outcome::Halted(notice) => Some(notice),
            Outcome::Rendered(_) => None,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Rendered(report) => Some(report.as_ref()),
            _ => None,
        }
    }
}

/// Parse, validate and normalise an upload.
///
/// Unreadable or incomplete files become error notices, as does a
/// non-numeric demand cell. Other failures propagate.
pub fn load_table(upload: &Upload) -> Result<TableLoad> {
    let raw = match DataLoader::from_bytes(&upload.bytes) {
        Ok(raw) => raw,
        Err(ForecastError::UnreadableFile(reason)) => {
            warn!(file = %upload.name, %reason, "could not read upload");
            return Ok(TableLoad::Halted(Notice::error(format!(
                "Could not read '{}': {}",
                upload.name, reason
            ))));
        }
        Err(err) => return Err(err),
    };

    if let Err(err @ ForecastError::MissingColumns(_)) = raw.validate() {
        warn!(file = %upload.name, "upload is missing required columns");
        return Ok(TableLoad::Halted(Notice::error(err.to_string())));
    }

    match raw.normalize() {
        Ok(table) => Ok(TableLoad::Ready(table)),
        Err(err @ ForecastError::NonNumericDemand { .. }) => {
            warn!(file = %upload.name, %err, "upload has non-numeric demand");
            Ok(TableLoad::Halted(Notice::error(err.to_string())))
        }
        Err(err) => Err(err),
    }
}

/// The full demand forecasting pipeline
#[derive(Debug, Clone)]
pub struct Pipeline<M: ForecastModel> {
    model: M,
    future_dates: FutureDates,
}

impl<M: ForecastModel> Pipeline<M> {
    pub fn new(model: M, future_dates: FutureDates) -> Self {
        Self {
            model,
            future_dates,
        }
    }

    /// Options to offer for the uploaded file
    pub fn options(&self, upload: &Upload) -> Result<OptionsLoad> {
        Ok(match load_table(upload)? {
            TableLoad::Ready(table) => OptionsLoad::Ready(FilterOptions::from_table(&table)),
            TableLoad::Halted(notice) => OptionsLoad::Halted(notice),
        })
    }

    /// Run every stage for the session's current inputs.
    ///
    /// Forecasting failures are returned as errors; every other stop is an
    /// [`Outcome`] carrying a notice.
    pub fn run(&self, session: &Session) -> Result<Outcome> {
        let Some(upload) = &session.upload else {
            return Ok(Outcome::AwaitingUpload(Notice::info(UPLOAD_PROMPT)));
        };

        let table = match load_table(upload)? {
            TableLoad::Ready(table) => table,
            TableLoad::Halted(notice) => return Ok(Outcome::Halted(notice)),
        };

        let options = FilterOptions::from_table(&table);
        debug!(
            rez_classes = options.rez_classes.len(),
            arr_ports = options.arr_ports.len(),
            dep_ports = options.dep_ports.len(),
            "derived filter options"
        );

        let Some(selection) = session.selection.resolve(&options) else {
            warn!("no selectable values in upload");
            return Ok(Outcome::Halted(Notice::warning(NO_DATA_WARNING)));
        };

        let series = aggregate(&table, &selection);
        if series.is_empty() {
            warn!(selection = %selection, "no rows match selection");
            return Ok(Outcome::Halted(Notice::warning(NO_DATA_WARNING)));
        }

        let forecast = forecast(&self.model, &series, session.horizon, self.future_dates)?;
        let report = present(&selection, &series, &forecast, session.horizon);
        Ok(Outcome::Rendered(Box::new(report)))
    }
}
