use serde::{Deserialize, Serialize};

use crate::error::{MiningError, Result};

fn default_parallel() -> bool {
    true
}

/// Thresholds and scheduling for one mining run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum number of sequences a pattern must occur in.
    pub min_support: f64,
    /// Minimum `umin` for a pattern to be reported.
    pub min_utility: f64,
    /// Spawn one rayon task per child instead of recursing in place.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl MiningConfig {
    pub fn new(min_support: f64, min_utility: f64) -> Self {
        Self {
            min_support,
            min_utility,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check("min_support", self.min_support)?;
        check("min_utility", self.min_utility)
    }
}

fn check(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MiningError::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::MiningConfig;
    use crate::error::MiningError;

    #[test]
    fn test_parallel_defaults_to_true() {
        let config: MiningConfig =
            serde_json::from_str(r#"{"min_support": 2, "min_utility": 10.5}"#).unwrap();

        assert_eq!(config, MiningConfig::new(2.0, 10.5));
        assert!(config.parallel);
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        assert!(MiningConfig::new(0.0, 0.0).validate().is_ok());

        match MiningConfig::new(-1.0, 3.0).validate() {
            Err(MiningError::InvalidThreshold { name, .. }) => assert_eq!(name, "min_support"),
            other => panic!("unexpected {:?}", other),
        }
        match MiningConfig::new(1.0, f64::NAN).validate() {
            Err(MiningError::InvalidThreshold { name, .. }) => assert_eq!(name, "min_utility"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
