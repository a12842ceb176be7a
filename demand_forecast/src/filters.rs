//! Filter options and selections over the three categorical columns

use crate::data::{DemandRecord, DemandTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Sorted distinct values available for each categorical column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Reservation classes
    pub rez_classes: Vec<String>,
    /// Arrival ports
    pub arr_ports: Vec<String>,
    /// Departure ports
    pub dep_ports: Vec<String>,
}

impl FilterOptions {
    /// Collect the distinct non-missing values of each column, sorted ascending
    pub fn from_table(table: &DemandTable) -> Self {
        let mut rez_classes = BTreeSet::new();
        let mut arr_ports = BTreeSet::new();
        let mut dep_ports = BTreeSet::new();

        for record in table.records() {
            if let Some(v) = &record.rez_class {
                rez_classes.insert(v.clone());
            }
            if let Some(v) = &record.arr_port {
                arr_ports.insert(v.clone());
            }
            if let Some(v) = &record.dep_port {
                dep_ports.insert(v.clone());
            }
        }

        Self {
            rez_classes: sorted(rez_classes),
            arr_ports: sorted(arr_ports),
            dep_ports: sorted(dep_ports),
        }
    }
}

/// Distinct values in ascending order, compared as numbers when every value
/// is one and as text otherwise
fn sorted(values: BTreeSet<String>) -> Vec<String> {
    let numbers: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse().ok()).collect();
    match numbers {
        Some(numbers) => {
            let mut keyed: Vec<(f64, String)> = numbers.into_iter().zip(values).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        None => values.into_iter().collect(),
    }
}

/// The (class, arrival port, departure port) triple a forecast is made for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSelection {
    pub rez_class: String,
    pub arr_port: String,
    pub dep_port: String,
}

impl FilterSelection {
    pub fn new(
        rez_class: impl Into<String>,
        arr_port: impl Into<String>,
        dep_port: impl Into<String>,
    ) -> Self {
        Self {
            rez_class: rez_class.into(),
            arr_port: arr_port.into(),
            dep_port: dep_port.into(),
        }
    }

    /// Exact, case-sensitive match on all three fields
    pub fn matches(&self, record: &DemandRecord) -> bool {
        record.rez_class.as_deref() == Some(self.rez_class.as_str())
            && record.arr_port.as_deref() == Some(self.arr_port.as_str())
            && record.dep_port.as_deref() == Some(self.dep_port.as_str())
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} ➔ {}", self.rez_class, self.dep_port, self.arr_port)
    }
}

/// What the user currently has selected; unset fields fall back to the first option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInput {
    pub rez_class: Option<String>,
    pub arr_port: Option<String>,
    pub dep_port: Option<String>,
}

impl SelectionInput {
    /// Resolve against the available options.
    ///
    /// Returns `None` when a field is unset and its column has no values to
    /// pick from.
    pub fn resolve(&self, options: &FilterOptions) -> Option<FilterSelection> {
        let pick = |chosen: &Option<String>, available: &[String]| {
            chosen.clone().or_else(|| available.first().cloned())
        };

        Some(FilterSelection {
            rez_class: pick(&self.rez_class, &options.rez_classes)?,
            arr_port: pick(&self.arr_port, &options.arr_ports)?,
            dep_port: pick(&self.dep_port, &options.dep_ports)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(class: Option<&str>, arr: &str, dep: &str) -> DemandRecord {
        DemandRecord {
            rez_class: class.map(str::to_string),
            arr_port: Some(arr.to_string()),
            dep_port: Some(dep.to_string()),
            demand: Some(1.0),
            period: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_options_sorted_distinct() {
        let table = DemandTable::from_records(vec![
            record(Some("Y"), "CDG", "JFK"),
            record(Some("B"), "AMS", "JFK"),
            record(None, "CDG", "LHR"),
            record(Some("Y"), "CDG", "JFK"),
        ]);
        let options = FilterOptions::from_table(&table);
        assert_eq!(options.rez_classes, vec!["B", "Y"]);
        assert_eq!(options.arr_ports, vec!["AMS", "CDG"]);
        assert_eq!(options.dep_ports, vec!["JFK", "LHR"]);
    }

    #[test]
    fn test_numeric_options_sort_by_value() {
        let table = DemandTable::from_records(vec![
            record(Some("10"), "CDG", "JFK"),
            record(Some("2"), "CDG", "JFK"),
            record(Some("1"), "CDG", "JFK"),
            record(Some("2"), "CDG", "JFK"),
        ]);
        let options = FilterOptions::from_table(&table);
        assert_eq!(options.rez_classes, vec!["1", "2", "10"]);

        // One text value switches the column back to text order
        let mixed = DemandTable::from_records(vec![
            record(Some("10"), "CDG", "JFK"),
            record(Some("2"), "CDG", "JFK"),
            record(Some("Y"), "CDG", "JFK"),
        ]);
        assert_eq!(
            FilterOptions::from_table(&mixed).rez_classes,
            vec!["10", "2", "Y"]
        );
    }

    #[test]
    fn test_matches_is_exact() {
        let selection = FilterSelection::new("Y", "CDG", "JFK");
        assert!(selection.matches(&record(Some("Y"), "CDG", "JFK")));
        assert!(!selection.matches(&record(Some("y"), "CDG", "JFK")));
        assert!(!selection.matches(&record(Some("Y "), "CDG", "JFK")));
        assert!(!selection.matches(&record(None, "CDG", "JFK")));
    }

    #[test]
    fn test_resolve_defaults_to_first_option() {
        let options = FilterOptions {
            rez_classes: vec!["B".into(), "Y".into()],
            arr_ports: vec!["AMS".into()],
            dep_ports: vec!["JFK".into()],
        };
        let input = SelectionInput {
            rez_class: Some("Y".into()),
            ..Default::default()
        };
        assert_eq!(
            input.resolve(&options),
            Some(FilterSelection::new("Y", "AMS", "JFK"))
        );

        let empty = FilterOptions::default();
        assert_eq!(SelectionInput::default().resolve(&empty), None);
    }

    #[test]
    fn test_display() {
        let selection = FilterSelection::new("Y", "CDG", "JFK");
        assert_eq!(selection.to_string(), "Y | JFK ➔ CDG");
    }
}
