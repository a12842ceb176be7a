//! Restricting the table to one selection and summing demand per month

use crate::data::DemandTable;
use crate::filters::FilterSelection;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Total demand observed on one date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub ds: NaiveDate,
    pub y: f64,
}

/// Per-date summed demand for one selection, dates strictly increasing
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregatedSeries {
    points: Vec<SeriesPoint>,
}

impl AggregatedSeries {
    /// Build a series from (date, value) pairs, summing repeated dates
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (ds, y) in pairs {
            *totals.entry(ds).or_insert(0.0) += y;
        }
        Self {
            points: totals
                .into_iter()
                .map(|(ds, y)| SeriesPoint { ds, y })
                .collect(),
        }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.ds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// Sum of demand over the whole series
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.y).sum()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.ds)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Sum demand per date over the rows matching `selection`.
///
/// Missing demand values add nothing, so a date whose matching rows all lack
/// demand still appears with a total of zero. An empty result means no row
/// matched.
pub fn aggregate(table: &DemandTable, selection: &FilterSelection) -> AggregatedSeries {
    let matching = table.records().iter().filter(|r| selection.matches(r));
    let series = AggregatedSeries::from_pairs(matching.map(|r| (r.period, r.demand.unwrap_or(0.0))));
    debug!(
        selection = %selection,
        dates = series.len(),
        "aggregated demand"
    );
    series
}
