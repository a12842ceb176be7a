//! # Demand Forecast Workspace
//!
//! Umbrella crate for the demand forecasting workspace.
//!
//! - [`forecast`]: loading, filtering, aggregation, forecasting and reporting
//!
//! ## Example
//!
//! ```
//! use demand_forecast_workspace::forecast::Horizon;
//!
//! let horizon = Horizon::default();
//! assert_eq!(horizon.months(), 12);
//! assert!(Horizon::new(25).is_err());
//! ```

pub use demand_forecast as forecast;
