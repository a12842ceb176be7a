use chrono::{Datelike, Months, NaiveDate};
use demand_forecast::models::additive::AdditiveModel;
use demand_forecast::models::TrainedForecastModel;
use demand_forecast::{
    forecast, AggregatedSeries, ForecastError, ForecastModel, FutureDates, Horizon,
};
use rstest::rstest;

fn monthly_series(start: NaiveDate, values: &[f64]) -> AggregatedSeries {
    AggregatedSeries::from_pairs(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Months::new(i as u32), *v)),
    )
}

fn seasonal_values(months: usize) -> Vec<f64> {
    (0..months)
        .map(|i| {
            let phase = (i % 12) as f64 / 12.0 * std::f64::consts::TAU;
            200.0 + 0.5 * i as f64 + 40.0 * phase.cos()
        })
        .collect()
}

fn jan_2020() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

#[rstest]
#[case(1)]
#[case(12)]
#[case(24)]
fn test_forecast_length_is_history_plus_horizon(#[case] months: u32) {
    let series = monthly_series(jan_2020(), &seasonal_values(30));
    let horizon = Horizon::new(months).unwrap();

    let result = forecast(&AdditiveModel::new(), &series, horizon, FutureDates::MonthEnd).unwrap();

    assert_eq!(result.len(), series.len() + months as usize);
    assert_eq!(result.history().len(), series.len());
    assert_eq!(result.future().len(), months as usize);
    assert_eq!(result.horizon(), months as usize);
}

#[rstest]
#[case(0)]
#[case(25)]
#[case(100)]
fn test_horizon_out_of_range(#[case] months: u32) {
    assert!(matches!(
        Horizon::new(months),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_history_dates_come_first() {
    let series = monthly_series(jan_2020(), &seasonal_values(18));
    let result = forecast(
        &AdditiveModel::new(),
        &series,
        Horizon::new(3).unwrap(),
        FutureDates::MonthEnd,
    )
    .unwrap();

    let fitted: Vec<NaiveDate> = result.history().iter().map(|p| p.ds).collect();
    assert_eq!(fitted, series.dates());

    let last = series.last_date().unwrap();
    assert!(result.future().iter().all(|p| p.ds > last));
    assert!(result.points().windows(2).all(|w| w[0].ds < w[1].ds));
}

#[rstest]
#[case(FutureDates::MonthEnd, [(2021, 6, 30), (2021, 7, 31), (2021, 8, 31)])]
#[case(FutureDates::MonthStart, [(2021, 7, 1), (2021, 8, 1), (2021, 9, 1)])]
fn test_future_date_anchor(#[case] anchor: FutureDates, #[case] expected: [(i32, u32, u32); 3]) {
    // 18 months from January 2020 ends in June 2021
    let series = monthly_series(jan_2020(), &seasonal_values(18));
    let result = forecast(&AdditiveModel::new(), &series, Horizon::new(3).unwrap(), anchor).unwrap();

    let dates: Vec<(i32, u32, u32)> = result
        .future()
        .iter()
        .map(|p| (p.ds.year(), p.ds.month(), p.ds.day()))
        .collect();
    assert_eq!(dates, expected.to_vec());
}

#[test]
fn test_forecast_is_deterministic() {
    let series = monthly_series(jan_2020(), &seasonal_values(26));
    let model = AdditiveModel::new();
    let horizon = Horizon::default();

    let a = forecast(&model, &series, horizon, FutureDates::MonthEnd).unwrap();
    let b = forecast(&model, &series, horizon, FutureDates::MonthEnd).unwrap();

    // Bounds are sampled; dates and point estimates are not
    let estimates = |f: &demand_forecast::Forecast| -> Vec<(NaiveDate, f64)> {
        f.points().iter().map(|p| (p.ds, p.yhat)).collect()
    };
    assert_eq!(estimates(&a), estimates(&b));
}

#[test]
fn test_bounds_order_and_widening() {
    let series = monthly_series(jan_2020(), &seasonal_values(36));
    let result = forecast(
        &AdditiveModel::new(),
        &series,
        Horizon::new(24).unwrap(),
        FutureDates::MonthEnd,
    )
    .unwrap();

    for point in result.points() {
        assert!(point.yhat.is_finite());
        assert!(point.yhat_lower <= point.yhat);
        assert!(point.yhat <= point.yhat_upper);
    }

    let future = result.future();
    let first = future[0].yhat_upper - future[0].yhat_lower;
    let last = future[future.len() - 1].yhat_upper - future[future.len() - 1].yhat_lower;
    assert!(last >= 0.9 * first);
}

#[test]
fn test_short_noisy_history_has_honest_bounds() {
    let noise = [
        12.0, -9.0, 15.0, -14.0, 7.0, -11.0, 13.0, -6.0, 10.0, -15.0, 8.0, -10.0,
    ];
    let values: Vec<f64> = noise
        .iter()
        .enumerate()
        .map(|(i, e)| 100.0 + 0.5 * i as f64 + e)
        .collect();
    let series = monthly_series(jan_2020(), &values);

    let result = forecast(
        &AdditiveModel::new(),
        &series,
        Horizon::new(3).unwrap(),
        FutureDates::MonthEnd,
    )
    .unwrap();

    let mean = noise.iter().sum::<f64>() / noise.len() as f64;
    let spread =
        (noise.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / noise.len() as f64).sqrt();

    let first = &result.future()[0];
    let width = first.yhat_upper - first.yhat_lower;
    assert!(
        width > 0.5 * spread,
        "interval width {} collapsed against a spread of {}",
        width,
        spread
    );
    assert!(
        width < 10.0 * spread,
        "interval width {} blew up against a spread of {}",
        width,
        spread
    );
}

#[test]
fn test_seasonal_shape_is_extrapolated() {
    let values = seasonal_values(48);
    let series = monthly_series(jan_2020(), &values);
    let result = forecast(
        &AdditiveModel::new(),
        &series,
        Horizon::new(12).unwrap(),
        FutureDates::MonthStart,
    )
    .unwrap();

    // January peaks and July troughs in the history, so the same in the forecast
    let future = result.future();
    let january = future.iter().find(|p| p.ds.month() == 1).unwrap();
    let july = future.iter().find(|p| p.ds.month() == 7).unwrap();
    assert!(january.yhat > july.yhat);
}

#[test]
fn test_two_point_series() {
    let series = monthly_series(jan_2020(), &[15.0, 8.0]);
    let result = forecast(
        &AdditiveModel::new(),
        &series,
        Horizon::new(3).unwrap(),
        FutureDates::MonthEnd,
    )
    .unwrap();
    assert_eq!(result.len(), 5);
    assert!(result.points().iter().all(|p| p.yhat.is_finite()));
}

#[test]
fn test_too_short_series_fails() {
    let model = AdditiveModel::new();
    let single = monthly_series(jan_2020(), &[42.0]);

    let err = forecast(&model, &single, Horizon::default(), FutureDates::MonthEnd).unwrap_err();
    assert!(matches!(err, ForecastError::ForecastingError(_)));

    let empty = AggregatedSeries::default();
    assert!(forecast(&model, &empty, Horizon::default(), FutureDates::MonthEnd).is_err());
}

#[test]
fn test_trained_model_history() {
    let series = monthly_series(jan_2020(), &seasonal_values(12));
    let model = AdditiveModel::new();
    let trained = model.train(&series).unwrap();

    assert_eq!(trained.history(), series.dates().as_slice());
    assert_eq!(trained.name(), model.name());
    assert!((model.interval_width() - 0.8).abs() < f64::EPSILON);
}
