//! Forecasting models for aggregated demand series

use crate::aggregate::AggregatedSeries;
use crate::error::{ForecastError, Result};
use crate::utils::{future_month_dates, FutureDates};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

pub mod additive;

/// Number of months to forecast beyond the last observed date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Horizon(u32);

impl Horizon {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 24;
    pub const DEFAULT: u32 = 12;

    /// Create a horizon, rejecting values outside `1..=24`
    pub fn new(months: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&months) {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon must be between {} and {} months, got {}",
                Self::MIN,
                Self::MAX,
                months
            )));
        }
        Ok(Self(months))
    }

    pub fn months(&self) -> usize {
        self.0 as usize
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u32> for Horizon {
    type Error = ForecastError;

    fn try_from(months: u32) -> Result<Self> {
        Self::new(months)
    }
}

/// Point estimate and uncertainty bounds for one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Fitted values over the history followed by the extrapolated horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    points: Vec<ForecastPoint>,
    history_len: usize,
    horizon: usize,
}

impl Forecast {
    /// Create a forecast, checking that the points cover history plus horizon
    pub fn new(points: Vec<ForecastPoint>, history_len: usize, horizon: usize) -> Result<Self> {
        if points.len() != history_len + horizon {
            return Err(ForecastError::ValidationError(format!(
                "Forecast has {} points but history ({}) plus horizon ({}) was expected",
                points.len(),
                history_len,
                horizon
            )));
        }
        Ok(Self {
            points,
            history_len,
            horizon,
        })
    }

    /// Every point, history first
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Fitted points over the observed dates
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.history_len]
    }

    /// The last `horizon` points: exactly the extrapolated period
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len..]
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Predict point estimates and bounds for arbitrary dates
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>>;

    /// Dates the model was trained on
    fn history(&self) -> &[NaiveDate];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on an aggregated series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the series
    fn train(&self, series: &AggregatedSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Fit `model` on `series` and predict its history plus `horizon` future months.
///
/// Depends only on its arguments: identical inputs give identical output.
pub fn forecast<M: ForecastModel>(
    model: &M,
    series: &AggregatedSeries,
    horizon: Horizon,
    anchor: FutureDates,
) -> Result<Forecast> {
    let last = series.last_date().ok_or_else(|| {
        ForecastError::ForecastingError("Cannot forecast an empty series".to_string())
    })?;
    let trained = model.train(series)?;

    let mut dates = trained.history().to_vec();
    dates.extend(future_month_dates(last, horizon.months(), anchor)?);
    let points = trained.predict(&dates)?;

    info!(
        model = trained.name(),
        history = series.len(),
        horizon = horizon.months(),
        "produced forecast"
    );
    Forecast::new(points, series.len(), horizon.months())
}
