//! Chart, downloadable image and forecast table for one selection

use crate::aggregate::{AggregatedSeries, SeriesPoint};
use crate::error::{ForecastError, Result};
use crate::filters::FilterSelection;
use crate::models::{Forecast, ForecastPoint, Horizon};
use crate::utils::{date_from_epoch_days, days_since_epoch, file_name_safe};
use chrono::NaiveDate;
use plotters::prelude::*;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CHART_TITLE: &str = "Demand Forecast";
pub const X_LABEL: &str = "Date";
pub const Y_LABEL: &str = "Demand";

const FORECAST_COLOR: RGBColor = RGBColor(0, 114, 178);
const BAND_OPACITY: f64 = 0.2;

/// Everything shown for a successful pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Subheader naming the selection
    pub title: String,
    pub selection: FilterSelection,
    pub horizon: Horizon,
    /// Name the chart image is offered under
    pub chart_file_name: String,
    pub chart: ForecastChart,
    pub table: ForecastTable,
}

impl Report {
    /// Render the chart into `dir` under [`Report::chart_file_name`]
    pub fn save_chart<P: AsRef<Path>>(&self, dir: P, size: (u32, u32)) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.chart_file_name);
        self.chart.render_png(&path, size)?;
        info!(path = %path.display(), "saved forecast chart");
        Ok(path)
    }
}

/// Assemble the report for a forecast of `series`
pub fn present(
    selection: &FilterSelection,
    series: &AggregatedSeries,
    forecast: &Forecast,
    horizon: Horizon,
) -> Report {
    Report {
        title: format!("Forecast for {}", selection),
        selection: selection.clone(),
        horizon,
        chart_file_name: chart_file_name(selection),
        chart: ForecastChart::new(series, forecast),
        table: ForecastTable::new(forecast),
    }
}

/// `prevision_{class}_{depPort}_to_{arrPort}.png`
pub fn chart_file_name(selection: &FilterSelection) -> String {
    format!(
        "prevision_{}_{}_to_{}.png",
        file_name_safe(&selection.rez_class),
        file_name_safe(&selection.dep_port),
        file_name_safe(&selection.arr_port)
    )
}

/// Observed demand with the fitted and extrapolated forecast
#[derive(Debug, Clone, Serialize)]
pub struct ForecastChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub observed: Vec<SeriesPoint>,
    pub forecast: Vec<ForecastPoint>,
}

impl ForecastChart {
    pub fn new(series: &AggregatedSeries, forecast: &Forecast) -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
            observed: series.points().to_vec(),
            forecast: forecast.points().to_vec(),
        }
    }

    /// Date range covered by observations and forecast, as epoch days
    fn x_range(&self) -> (f64, f64) {
        let days = self
            .observed
            .iter()
            .map(|p| p.ds)
            .chain(self.forecast.iter().map(|p| p.ds))
            .map(|d| days_since_epoch(d) as f64);
        let (lo, hi) = days.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        });
        if lo < hi {
            (lo, hi)
        } else {
            (lo - 15.0, lo + 15.0)
        }
    }

    /// Value range covering observations and interval bounds, padded 5%
    fn y_range(&self) -> (f64, f64) {
        let values = self
            .observed
            .iter()
            .map(|p| p.y)
            .chain(self.forecast.iter().flat_map(|p| [p.yhat_lower, p.yhat_upper]));
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo >= hi {
            let mid = if lo.is_finite() { lo } else { 0.0 };
            return (mid - 1.0, mid + 1.0);
        }
        let pad = (hi - lo) * 0.05;
        (lo - pad, hi + pad)
    }

    /// Draw the chart as a PNG image at `path`
    pub fn render_png<P: AsRef<Path>>(&self, path: P, size: (u32, u32)) -> Result<()> {
        let root = BitMapBackend::new(path.as_ref(), size).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_label_formatter(&|x| format_epoch_day(*x))
            .draw()
            .map_err(chart_error)?;

        let x = |d: NaiveDate| days_since_epoch(d) as f64;

        let band: Vec<(f64, f64)> = self
            .forecast
            .iter()
            .map(|p| (x(p.ds), p.yhat_upper))
            .chain(self.forecast.iter().rev().map(|p| (x(p.ds), p.yhat_lower)))
            .collect();
        chart
            .draw_series(std::iter::once(Polygon::new(
                band,
                FORECAST_COLOR.mix(BAND_OPACITY).filled(),
            )))
            .map_err(chart_error)?;

        chart
            .draw_series(LineSeries::new(
                self.forecast.iter().map(|p| (x(p.ds), p.yhat)),
                FORECAST_COLOR.stroke_width(2),
            ))
            .map_err(chart_error)?;

        chart
            .draw_series(
                self.observed
                    .iter()
                    .map(|p| Circle::new((x(p.ds), p.y), 3, BLACK.filled())),
            )
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }
}

fn format_epoch_day(day: f64) -> String {
    date_from_epoch_days(day.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn chart_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::ChartError(err.to_string())
}

/// Forecast rows for the extrapolated period only
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastTable {
    rows: Vec<ForecastPoint>,
}

impl ForecastTable {
    /// Take the last `horizon` rows of the forecast
    pub fn new(forecast: &Forecast) -> Self {
        Self {
            rows: forecast.future().to_vec(),
        }
    }

    pub fn rows(&self) -> &[ForecastPoint] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a DataFrame with columns `ds`, `yhat`, `yhat_lower`, `yhat_upper`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let ds: Vec<String> = self
            .rows
            .iter()
            .map(|r| r.ds.format("%Y-%m-%d").to_string())
            .collect();
        let column = |f: fn(&ForecastPoint) -> f64| self.rows.iter().map(f).collect::<Vec<f64>>();

        let df = DataFrame::new(vec![
            Series::new("ds", ds),
            Series::new("yhat", column(|r| r.yhat)),
            Series::new("yhat_lower", column(|r| r.yhat_lower)),
            Series::new("yhat_upper", column(|r| r.yhat_upper)),
        ])?;
        Ok(df)
    }

    /// Write the rows as comma-separated text with a header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(month: u32, yhat: f64) -> ForecastPoint {
        ForecastPoint {
            ds: NaiveDate::from_ymd_opt(2023, month, 1).unwrap(),
            yhat,
            yhat_lower: yhat - 1.0,
            yhat_upper: yhat + 1.0,
        }
    }

    #[test]
    fn test_chart_file_name() {
        let selection = FilterSelection::new("Y", "CDG", "JFK");
        assert_eq!(chart_file_name(&selection), "prevision_Y_JFK_to_CDG.png");

        let odd = FilterSelection::new("A/B", "X", "Y");
        assert_eq!(chart_file_name(&odd), "prevision_A_B_Y_to_X.png");
    }

    #[test]
    fn test_table_keeps_future_rows() {
        let forecast = Forecast::new(
            vec![point(1, 1.0), point(2, 2.0), point(3, 3.0), point(4, 4.0)],
            3,
            1,
        )
        .unwrap();
        let table = ForecastTable::new(&forecast);
        assert_eq!(table.rows(), &[point(4, 4.0)]);

        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.get_column_names(),
            vec!["ds", "yhat", "yhat_lower", "yhat_upper"]
        );
    }

    #[test]
    fn test_table_csv() {
        let forecast = Forecast::new(vec![point(1, 1.0), point(2, 2.5)], 1, 1).unwrap();
        let mut out = Vec::new();
        ForecastTable::new(&forecast).write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "ds,yhat,yhat_lower,yhat_upper\n2023-02-01,2.5,1.5,3.5\n");
    }

    #[test]
    fn test_format_epoch_day() {
        assert_eq!(format_epoch_day(31.2), "1970-02");
    }
}
