// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2027-02-18

//! Controller configuration.
//!
//! Defaults mirror the shipped platform tables: the four-candidate rate
//! table, a 900 mV operating-point hint, 200 ms governor polling and the
//! 40/20 ondemand thresholds.

use serde::Deserialize;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// The parsed values are out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Tunables consumed at controller initialization and by the surrounding
/// governor framework.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DmcConfig {
    /// Candidate DDR rates probed against firmware at startup, in Hz,
    /// strictly increasing.
    pub candidates_hz: Vec<u32>,
    /// Voltage hint attached to each validated operating point, in µV.
    pub opp_microvolt: u32,
    /// Governor polling interval in milliseconds.
    pub polling_ms: u32,
    /// Load percentage above which the ondemand governor scales up.
    pub upthreshold: u32,
    /// Hysteresis subtracted from `upthreshold` when scaling back down.
    pub downdifferential: u32,
}

impl Default for DmcConfig {
    fn default() -> Self {
        Self {
            candidates_hz: vec![324_000_000, 528_000_000, 780_000_000, 1_056_000_000],
            opp_microvolt: 900_000,
            polling_ms: 200,
            upthreshold: 40,
            downdifferential: 20,
        }
    }
}

impl DmcConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates_hz.is_empty() {
            return Err(ConfigError::Invalid("candidate rate table is empty"));
        }
        if !self.candidates_hz.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(ConfigError::Invalid(
                "candidate rates must be strictly increasing",
            ));
        }
        if self.upthreshold > 100 {
            return Err(ConfigError::Invalid("upthreshold exceeds 100 percent"));
        }
        if self.downdifferential >= self.upthreshold {
            return Err(ConfigError::Invalid(
                "downdifferential must stay below upthreshold",
            ));
        }
        Ok(())
    }
}
