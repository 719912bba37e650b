//! Evaluation settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Which metrics must clear the threshold for a case to pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassGate {
    /// Only F1 is compared against the threshold.
    #[default]
    F1,
    /// F1, similarity, and keyword accuracy must all clear the threshold.
    AllMetrics,
}

/// Configuration for an [`Evaluator`](crate::Evaluator) run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    /// Minimum score for a case to pass.
    pub pass_threshold: f64,
    /// Metrics the threshold applies to.
    pub pass_gate: PassGate,
    /// Maximum number of cases in flight at once.
    pub concurrency: usize,
    /// Per-case time limit in milliseconds. Expired cases are scored as failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_timeout_ms: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { pass_threshold: 0.5, pass_gate: PassGate::F1, concurrency: 4, case_timeout_ms: None }
    }
}

impl EvalConfig {
    /// Create a new builder for constructing an [`EvalConfig`].
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }

    /// The per-case time limit, if any.
    pub fn case_timeout(&self) -> Option<Duration> {
        self.case_timeout_ms.map(Duration::from_millis)
    }

    /// Check that all parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Config`] if the threshold is outside `[0, 1]`,
    /// `concurrency == 0`, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pass_threshold) {
            return Err(EvalError::Config(format!(
                "pass_threshold must be within [0, 1], got {}",
                self.pass_threshold
            )));
        }
        if self.concurrency == 0 {
            return Err(EvalError::Config("concurrency must be greater than zero".to_string()));
        }
        if self.case_timeout_ms == Some(0) {
            return Err(EvalError::Config("case_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`EvalConfig`].
#[derive(Debug, Clone, Default)]
pub struct EvalConfigBuilder {
    config: EvalConfig,
}

impl EvalConfigBuilder {
    /// Set the pass threshold.
    pub fn pass_threshold(mut self, threshold: f64) -> Self {
        self.config.pass_threshold = threshold;
        self
    }

    /// Set which metrics the threshold gates.
    pub fn pass_gate(mut self, gate: PassGate) -> Self {
        self.config.pass_gate = gate;
        self
    }

    /// Set the number of cases evaluated concurrently.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the per-case time limit.
    pub fn case_timeout(mut self, timeout: Duration) -> Self {
        self.config.case_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Build the [`EvalConfig`], validating that parameters are consistent.
    pub fn build(self) -> Result<EvalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_gate_on_f1_at_one_half() {
        let config = EvalConfig::default();
        assert_eq!(config.pass_gate, PassGate::F1);
        assert_eq!(config.pass_threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(EvalConfig::builder().pass_threshold(1.5).build().is_err());
        assert!(EvalConfig::builder().pass_threshold(f64::NAN).build().is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        assert!(EvalConfig::builder().concurrency(0).build().is_err());
    }

    #[test]
    fn timeout_round_trips_through_millis() {
        let config = EvalConfig::builder().case_timeout(Duration::from_secs(2)).build().unwrap();
        assert_eq!(config.case_timeout(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn gate_deserializes_from_snake_case() {
        let config: EvalConfig = serde_json::from_str(r#"{"pass_gate":"all_metrics"}"#).unwrap();
        assert_eq!(config.pass_gate, PassGate::AllMetrics);
        assert_eq!(config.concurrency, 4);
    }
}
