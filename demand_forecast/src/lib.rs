//! # Demand Forecast
//!
//! A Rust library for forecasting monthly demand from uploaded reservation records.
//!
//! ## Features
//!
//! - Semicolon-delimited file loading with required-column validation
//! - `YYYY-MM` period parsing (unparseable rows are dropped)
//! - Filtering by reservation class, arrival port and departure port
//! - Per-month demand aggregation
//! - Additive trend plus yearly seasonality forecasting with uncertainty bounds,
//!   fitted by Prophet through `augurs`
//! - PNG chart rendering and tabular forecast output
//!
//! ## Pipeline
//!
//! Every interaction re-runs the whole pipeline from a [`Session`]:
//!
//! ```text
//! load -> validate -> normalize -> filter options -> aggregate -> forecast -> present
//! ```
//!
//! A run stops with a [`Notice`] when the file is unreadable, lacks required
//! columns, has a non-numeric demand cell, or when no rows match the selection.
//!
//! ## Quick Start
//!
//! ```no_run
//! use demand_forecast::models::additive::AdditiveModel;
//! use demand_forecast::{FutureDates, Horizon, Outcome, Pipeline, Session, Upload};
//!
//! # fn main() -> demand_forecast::Result<()> {
//! let pipeline = Pipeline::new(AdditiveModel::new(), FutureDates::MonthEnd);
//!
//! let session = Session {
//!     upload: Some(Upload::from_path("demand.csv")?),
//!     horizon: Horizon::new(12)?,
//!     ..Default::default()
//! };
//!
//! match pipeline.run(&session)? {
//!     Outcome::Rendered(report) => {
//!         println!("{}", report.title);
//!         println!("{}", report.table.to_dataframe()?);
//!         report.save_chart(".", (1000, 600))?;
//!     }
//!     other => {
//!         if let Some(notice) = other.notice() {
//!             eprintln!("{}", notice);
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod filters;
pub mod models;
pub mod pipeline;
pub mod presenter;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{aggregate, AggregatedSeries, SeriesPoint};
pub use crate::config::AppConfig;
pub use crate::data::{DataLoader, DemandRecord, DemandTable, RawTable, REQUIRED_COLUMNS};
pub use crate::error::{ForecastError, Result};
pub use crate::filters::{FilterOptions, FilterSelection, SelectionInput};
pub use crate::models::{forecast, Forecast, ForecastModel, ForecastPoint, Horizon};
pub use crate::pipeline::{Notice, OptionsLoad, Outcome, Pipeline, Session, Severity, Upload};
pub use crate::presenter::{ForecastChart, ForecastTable, Report};
pub use crate::utils::FutureDates;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
