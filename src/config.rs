use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Could not parse flow meter configuration: {source}"))]
    Parse { source: toml::de::Error },

    #[snafu(display("{name} must be a finite, non-negative number of seconds, got {value}"))]
    InvalidTimeout { name: &'static str, value: f64 },

    #[snafu(display("bulk_bound must be at least 1"))]
    ZeroBulkBound,
}

/// Thresholds driving the per-flow state machines. Timeouts share the unit of
/// capture timestamps (seconds).
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FlowMeterConfig {
    /// Largest gap between packets still considered part of the same burst.
    #[serde(default = "default_clump_timeout")]
    pub clump_timeout: f64,

    /// Largest gap before an active period is closed and an idle period
    /// recorded.
    #[serde(default = "default_active_timeout")]
    pub active_timeout: f64,

    /// Packets a forward burst must reach to count as a bulk transfer.
    #[serde(default = "default_bulk_bound")]
    pub bulk_bound: u64,
}

const fn default_clump_timeout() -> f64 {
    1.0
}

const fn default_active_timeout() -> f64 {
    0.005
}

const fn default_bulk_bound() -> u64 {
    4
}

impl Default for FlowMeterConfig {
    fn default() -> Self {
        Self {
            clump_timeout: default_clump_timeout(),
            active_timeout: default_active_timeout(),
            bulk_bound: default_bulk_bound(),
        }
    }
}

impl FlowMeterConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).context(ParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("clump_timeout", self.clump_timeout),
            ("active_timeout", self.active_timeout),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                InvalidTimeoutSnafu { name, value }
            );
        }
        ensure!(self.bulk_bound >= 1, ZeroBulkBoundSnafu);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FlowMeterConfig::from_toml("").unwrap();
        assert_eq!(config, FlowMeterConfig::default());
        assert_eq!(config.clump_timeout, 1.0);
        assert_eq!(config.active_timeout, 0.005);
        assert_eq!(config.bulk_bound, 4);
    }

    #[test]
    fn parses_overrides() {
        let config = FlowMeterConfig::from_toml(indoc! {r#"
            clump_timeout = 0.5
            bulk_bound = 3
        "#})
        .unwrap();
        assert_eq!(config.clump_timeout, 0.5);
        assert_eq!(config.active_timeout, 0.005);
        assert_eq!(config.bulk_bound, 3);
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = FlowMeterConfig::from_toml("idle_timeout = 3.0").unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_negative_timeout() {
        let error = FlowMeterConfig::from_toml("active_timeout = -1.0").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidTimeout {
                name: "active_timeout",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_bulk_bound() {
        let error = FlowMeterConfig::from_toml("bulk_bound = 0").unwrap_err();
        assert!(matches!(error, ConfigError::ZeroBulkBound));
    }
}
