//! Application settings loaded from an optional JSON file

use crate::error::{ForecastError, Result};
use crate::models::Horizon;
use crate::utils::FutureDates;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for the command line front end.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Horizon used when none is given on the command line
    pub default_horizon: u32,
    /// Directory the chart image is saved into
    pub output_dir: PathBuf,
    /// Chart width in pixels
    pub chart_width: u32,
    /// Chart height in pixels
    pub chart_height: u32,
    /// Where future monthly dates fall within their month
    pub future_dates: FutureDates,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_horizon: Horizon::DEFAULT,
            output_dir: PathBuf::from("."),
            chart_width: 1000,
            chart_height: 600,
            future_dates: FutureDates::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate settings from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            ForecastError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ForecastError::ConfigError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        self.horizon()?;
        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ForecastError::ConfigError(
                "Chart dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured default horizon
    pub fn horizon(&self) -> Result<Horizon> {
        Horizon::new(self.default_horizon)
            .map_err(|e| ForecastError::ConfigError(format!("default_horizon: {}", e)))
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.chart_width, self.chart_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(AppConfig::from_json("{}").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config =
            AppConfig::from_json(r#"{"default_horizon": 6, "future_dates": "month_start"}"#)
                .unwrap();
        assert_eq!(config.horizon().unwrap().months(), 6);
        assert_eq!(config.future_dates, FutureDates::MonthStart);
        assert_eq!(config.chart_size(), (1000, 600));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            AppConfig::from_json(r#"{"default_horizon": 30}"#),
            Err(ForecastError::ConfigError(_))
        ));
        assert!(AppConfig::from_json(r#"{"chart_width": 0}"#).is_err());
        assert!(AppConfig::from_json(r#"{"colour": "red"}"#).is_err());
        assert!(AppConfig::from_json("not json").is_err());
    }
}
