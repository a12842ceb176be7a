//! Additive trend plus yearly seasonality model
//!
//! Fitting and prediction are done by Prophet (through `augurs`) with linear
//! growth and additive yearly seasonality. Uncertainty bounds come from
//! Prophet's own predictive sampling at its default 80 % interval width.
//!
//! The yearly Fourier order and the number of potential trend changepoints
//! grow with the history. From six observations on, the model has fewer
//! free terms than observations, so the noise scale stays identifiable and
//! the bounds reflect the spread of the data.

use crate::aggregate::AggregatedSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastPoint, TrainedForecastModel};
use crate::utils::days_since_epoch;
use augurs::prophet::wasmstan::WasmstanOptimizer;
use augurs::prophet::{
    FeatureMode, GrowthType, PredictionData, Prophet, ProphetOptions, SeasonalityOption,
    TrainingData,
};
use chrono::NaiveDate;
use std::fmt;
use std::num::NonZeroU32;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;

/// Additive model with yearly seasonality
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    /// Name of the model
    name: String,
    /// Upper limit on the yearly Fourier order
    max_yearly_fourier_order: u32,
    /// Upper limit on potential trend changepoints
    max_changepoints: u32,
    /// Observations per extra Fourier term or changepoint
    points_per_term: usize,
}

/// Trained additive model
pub struct TrainedAdditiveModel {
    name: String,
    history: Vec<NaiveDate>,
    prophet: Prophet<WasmstanOptimizer>,
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            name: "Additive (linear trend, yearly seasonality)".to_string(),
            max_yearly_fourier_order: 10,
            max_changepoints: 25,
            points_per_term: 6,
        }
    }
}

impl AdditiveModel {
    /// Create the model with its fixed settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Coverage of the uncertainty interval (Prophet's default)
    pub fn interval_width(&self) -> f64 {
        0.8
    }

    /// Yearly Fourier order for a history of `n` points, at least 1
    pub fn yearly_fourier_order(&self, n: usize) -> u32 {
        let order = n.saturating_sub(2) / self.points_per_term;
        (order as u32).clamp(1, self.max_yearly_fourier_order)
    }

    /// Potential changepoints for a history of `n` points
    pub fn n_changepoints(&self, n: usize) -> u32 {
        ((n / self.points_per_term) as u32).min(self.max_changepoints)
    }

    fn options(&self, n: usize) -> ProphetOptions {
        ProphetOptions {
            growth: GrowthType::Linear,
            seasonality_mode: FeatureMode::Additive,
            yearly_seasonality: SeasonalityOption::Fourier(
                NonZeroU32::new(self.yearly_fourier_order(n)).expect("order is at least 1"),
            ),
            weekly_seasonality: SeasonalityOption::Manual(false),
            daily_seasonality: SeasonalityOption::Manual(false),
            n_changepoints: self.n_changepoints(n),
            ..Default::default()
        }
    }
}

fn timestamp(date: NaiveDate) -> i64 {
    i64::from(days_since_epoch(date)) * SECONDS_PER_DAY
}

fn prophet_error<E: fmt::Display>(err: E) -> ForecastError {
    ForecastError::ForecastingError(err.to_string())
}

impl ForecastModel for AdditiveModel {
    type Trained = TrainedAdditiveModel;

    fn train(&self, series: &AggregatedSeries) -> Result<Self::Trained> {
        if series.len() < 2 {
            return Err(ForecastError::ForecastingError(format!(
                "Series has less than 2 non-missing points ({} given)",
                series.len()
            )));
        }

        let history = series.dates();
        let ds = history.iter().map(|d| timestamp(*d)).collect();
        let data = TrainingData::new(ds, series.values()).map_err(prophet_error)?;

        let mut prophet = Prophet::new(self.options(series.len()), WasmstanOptimizer::new());
        prophet
            .fit(data, Default::default())
            .map_err(prophet_error)?;

        debug!(
            points = history.len(),
            fourier_order = self.yearly_fourier_order(series.len()),
            changepoints = self.n_changepoints(series.len()),
            "trained additive model"
        );

        Ok(TrainedAdditiveModel {
            name: self.name.clone(),
            history,
            prophet,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for TrainedAdditiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedAdditiveModel")
            .field("name", &self.name)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl TrainedForecastModel for TrainedAdditiveModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastPoint>> {
        let ds = dates.iter().map(|d| timestamp(*d)).collect();
        let predictions = self
            .prophet
            .predict(PredictionData::new(ds))
            .map_err(prophet_error)?;

        let yhat = predictions.yhat;
        let (Some(lower), Some(upper)) = (yhat.lower, yhat.upper) else {
            return Err(ForecastError::ForecastingError(
                "Prediction has no uncertainty bounds".to_string(),
            ));
        };
        let n = dates.len();
        if yhat.point.len() != n || lower.len() != n || upper.len() != n {
            return Err(ForecastError::ForecastingError(format!(
                "Expected {} predictions, got {}",
                n,
                yhat.point.len()
            )));
        }

        let points = dates
            .iter()
            .zip(yhat.point)
            .zip(lower.into_iter().zip(upper))
            .map(|((&ds, yhat), (yhat_lower, yhat_upper))| ForecastPoint {
                ds,
                yhat,
                yhat_lower,
                yhat_upper,
            })
            .collect();

        Ok(points)
    }

    fn history(&self) -> &[NaiveDate] {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Months;

    fn monthly_series(values: &[f64]) -> AggregatedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        AggregatedSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Months::new(i as u32), *v)),
        )
    }

    #[test]
    fn test_terms_stay_below_history() {
        let model = AdditiveModel::new();
        for n in [6, 12, 24, 36, 60, 120, 240] {
            let terms = 2 + 2 * model.yearly_fourier_order(n) + model.n_changepoints(n);
            assert!((terms as usize) < n, "{} terms for {} points", terms, n);
        }
        assert_eq!(model.yearly_fourier_order(2), 1);
        assert_eq!(model.yearly_fourier_order(500), 10);
        assert_eq!(model.n_changepoints(500), 25);
    }

    #[test]
    fn test_timestamp_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(timestamp(date), 86_400);
    }

    #[test]
    fn test_rejects_single_point() {
        let model = AdditiveModel::new();
        let result = model.train(&monthly_series(&[5.0]));
        assert!(matches!(result, Err(ForecastError::ForecastingError(_))));
    }

    #[test]
    fn test_fits_linear_growth() {
        let values: Vec<f64> = (0..36).map(|i| 100.0 + 2.0 * i as f64).collect();
        let series = monthly_series(&values);
        let trained = AdditiveModel::new().train(&series).unwrap();

        let fitted = trained.predict(&series.dates()).unwrap();
        for (point, actual) in fitted.iter().zip(&values) {
            assert_relative_eq!(point.yhat, *actual, max_relative = 0.05);
        }
    }

    #[test]
    fn test_bounds_contain_estimate() {
        let values: Vec<f64> = (0..24)
            .map(|i| 50.0 + 10.0 * ((i % 12) as f64 / 12.0 * std::f64::consts::TAU).sin())
            .collect();
        let series = monthly_series(&values);
        let trained = AdditiveModel::new().train(&series).unwrap();

        let future: Vec<NaiveDate> = (1..=6)
            .map(|i| series.last_date().unwrap() + Months::new(i))
            .collect();
        for point in trained.predict(&future).unwrap() {
            assert!(point.yhat_lower <= point.yhat);
            assert!(point.yhat <= point.yhat_upper);
        }
    }
}
