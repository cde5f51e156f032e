//! Engine configuration.
//!
//! Search bounds, soft-constraint weights and the result reference prefix.
//! Values come from [`EngineConfig::default`] and may be overridden through
//! environment variables:
//!
//! ```bash
//! export TIMETABLE_MAX_BACKTRACKS=500000
//! export TIMETABLE_TIME_BUDGET_SECS=120
//! export TIMETABLE_MAX_PERIODS_PER_DAY=8
//! export TIMETABLE_WEIGHT_IDLE_GAP=4.0
//! export TIMETABLE_RESULT_URL_PREFIX=/api/timetables
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::constraints::ConstraintWeights;
use crate::{Error, Result};

/// Configuration shared by every generation job of a coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on backtracks before the search exits best-effort.
    pub max_backtracks: u64,
    /// Wall-clock budget per job, measured from job start.
    pub time_budget: Duration,
    /// Largest accepted `periods_per_day` in a request grid.
    pub max_periods_per_day: u8,
    /// Default soft-constraint weights (requests may override per job).
    pub weights: ConstraintWeights,
    /// Prefix used to build `resultUrl` for successful jobs.
    pub result_url_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_backtracks: 200_000,
            time_budget: Duration::from_secs(60),
            max_periods_per_day: 10,
            weights: ConstraintWeights::default(),
            result_url_prefix: "/timetable/results".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    ///
    /// Environment variables:
    /// - `TIMETABLE_MAX_BACKTRACKS`
    /// - `TIMETABLE_TIME_BUDGET_SECS`
    /// - `TIMETABLE_MAX_PERIODS_PER_DAY`
    /// - `TIMETABLE_WEIGHT_<NAME>` for each soft constraint (`TIME_PREFERENCE`,
    ///   `IDLE_GAP`, `SAME_DAY_REPEAT`, `BUILDING_MOVE`)
    /// - `TIMETABLE_RESULT_URL_PREFIX`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var::<u64>(&lookup, "TIMETABLE_MAX_BACKTRACKS")? {
            config.max_backtracks = v;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "TIMETABLE_TIME_BUDGET_SECS")? {
            config.time_budget = Duration::from_secs(secs);
        }
        if let Some(v) = parse_var::<u8>(&lookup, "TIMETABLE_MAX_PERIODS_PER_DAY")? {
            config.max_periods_per_day = v;
        }
        for name in ConstraintWeights::NAMES {
            let key = format!("TIMETABLE_WEIGHT_{}", name.to_ascii_uppercase());
            if let Some(v) = parse_var::<f64>(&lookup, &key)? {
                config
                    .weights
                    .set(name, v)
                    .map_err(|e| Error::Config(format!("{key}: {e}")))?;
            }
        }
        if let Some(prefix) = lookup("TIMETABLE_RESULT_URL_PREFIX") {
            config.result_url_prefix = prefix.trim_end_matches('/').to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.max_periods_per_day == 0 {
            return Err(Error::Config(
                "max_periods_per_day must be at least 1".to_string(),
            ));
        }
        if self.time_budget.is_zero() {
            warn!("time budget is zero; every job will exit best-effort immediately");
        }
        Ok(())
    }

    /// Sets the backtrack bound.
    pub fn with_max_backtracks(mut self, max_backtracks: u64) -> Self {
        self.max_backtracks = max_backtracks;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Sets the default soft-constraint weights.
    pub fn with_weights(mut self, weights: ConstraintWeights) -> Self {
        self.weights = weights;
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} has invalid value '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = EngineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_periods_per_day, 10);
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("TIMETABLE_MAX_BACKTRACKS", "42"),
            ("TIMETABLE_TIME_BUDGET_SECS", "5"),
            ("TIMETABLE_WEIGHT_IDLE_GAP", "7.5"),
            ("TIMETABLE_RESULT_URL_PREFIX", "/api/tt/"),
        ]))
        .unwrap();

        assert_eq!(config.max_backtracks, 42);
        assert_eq!(config.time_budget, Duration::from_secs(5));
        assert!((config.weights.idle_gap - 7.5).abs() < 1e-10);
        assert_eq!(config.result_url_prefix, "/api/tt");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[("TIMETABLE_MAX_BACKTRACKS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[(
            "TIMETABLE_WEIGHT_BUILDING_MOVE",
            "-1",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("TIMETABLE_WEIGHT_BUILDING_MOVE"));
    }

    #[test]
    fn test_zero_periods_rejected() {
        assert!(EngineConfig::from_lookup(lookup_from(&[(
            "TIMETABLE_MAX_PERIODS_PER_DAY",
            "0"
        )]))
        .is_err());
    }
}
