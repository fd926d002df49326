//! Machine and workload parameters, loadable from TOML.
//!
//! ```toml
//! total_memory = 1024
//! os_memory = 320
//! admission_slack = 0.15
//! admission_interval = 200
//!
//! [workload]
//! seed = 7
//! jobs = { min = 5, max = 14 }
//! cpu_burst = { min = 10, max = 100 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    core::{Mem, Ticks},
    error::SimError,
};

/// Inclusive `min..=max` range used by the workload generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: u64,
    pub max: u64,
}

impl Span {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    fn check(&self, field: &str, floor: u64) -> Result<(), SimError> {
        if self.min > self.max {
            return Err(SimError::Config(format!(
                "{field}: min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.min < floor {
            return Err(SimError::Config(format!(
                "{field}: min must be at least {floor}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub total_memory: Mem,
    /// Permanently reserved for the OS; never handed to processes.
    pub os_memory: Mem,
    /// Fraction of total memory that must remain free after an admission.
    pub admission_slack: f64,
    pub admission_interval: Ticks,
    /// Idle ticks elapsed before the first step.
    pub boot_delay: Ticks,
    pub workload: WorkloadConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            total_memory: 1024,
            os_memory: 320,
            admission_slack: 0.15,
            admission_interval: 200,
            boot_delay: 0,
            workload: WorkloadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    pub seed: Option<u64>,
    /// Upper bound on the memory a later CPU burst may add.
    pub max_growth: Mem,
    pub jobs: Span,
    pub bursts: Span,
    pub cpu_burst: Span,
    pub io_burst: Span,
    pub initial_memory: Span,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_growth: 40,
            jobs: Span::new(5, 14),
            bursts: Span::new(1, 10),
            cpu_burst: Span::new(10, 100),
            io_burst: Span::new(20, 60),
            initial_memory: Span::new(5, 200),
        }
    }
}

impl SystemConfig {
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| SimError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, SimError> {
        toml::to_string_pretty(self)
            .map_err(|e| SimError::Config(format!("TOML serialise error: {e}")))
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.total_memory == 0 {
            return Err(SimError::Config("total_memory must be positive".into()));
        }
        if self.os_memory > self.total_memory {
            return Err(SimError::Config(format!(
                "os_memory {} exceeds total_memory {}",
                self.os_memory, self.total_memory
            )));
        }
        if !(0.0..1.0).contains(&self.admission_slack) {
            return Err(SimError::Config(format!(
                "admission_slack {} must lie in [0, 1)",
                self.admission_slack
            )));
        }
        if self.admission_interval == 0 {
            return Err(SimError::Config(
                "admission_interval must be positive".into(),
            ));
        }

        self.workload.validate()
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.jobs.check("workload.jobs", 0)?;
        self.bursts.check("workload.bursts", 1)?;
        self.cpu_burst.check("workload.cpu_burst", 1)?;
        self.io_burst.check("workload.io_burst", 1)?;
        self.initial_memory.check("workload.initial_memory", 0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.admission_interval, 200);
        assert_eq!(config.workload.cpu_burst, Span::new(10, 100));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SystemConfig::from_toml(
            r#"
            total_memory = 2048
            [workload]
            seed = 42
            io_burst = { min = 1, max = 3 }
            "#,
        )
        .unwrap();

        assert_eq!(config.total_memory, 2048);
        assert_eq!(config.os_memory, 320);
        assert_eq!(config.workload.seed, Some(42));
        assert_eq!(config.workload.io_burst, Span::new(1, 3));
        assert_eq!(config.workload.bursts, Span::new(1, 10));
    }

    #[test]
    fn toml_round_trip() {
        let config = SystemConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(SystemConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_reservation_above_total() {
        let err = SystemConfig::from_toml("total_memory = 100\nos_memory = 200").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn rejects_bad_slack_and_ranges() {
        let config = SystemConfig {
            admission_slack: 1.0,
            ..SystemConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.workload.cpu_burst = Span::new(0, 5);
        assert!(config.validate().is_err());

        let mut config = SystemConfig::default();
        config.workload.bursts = Span::new(4, 2);
        assert!(config.validate().is_err());
    }
}
