//! Engine configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! standard three-day windows, a one-year recurrence horizon and UTC.
//!
//! ```toml
//! response_window_days = 3
//! cancellation_window_days = 3
//! recurrence_horizon_days = 365
//! timezone = "Asia/Ho_Chi_Minh"
//! ```

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::deadline::DEFAULT_RESPONSE_WINDOW_DAYS;
use crate::error::{EngineError, Result};
use crate::expander::{DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS};
use crate::lifecycle::DEFAULT_CANCELLATION_WINDOW_DAYS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Days before the service date whose end is the accept/reject deadline.
    pub response_window_days: u32,
    /// Client cancellations need strictly more notice than this.
    pub cancellation_window_days: u32,
    /// Ceiling for weekly declarations without an end date.
    pub recurrence_horizon_days: u32,
    /// IANA timezone that defines local wall-clock time.
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_window_days: DEFAULT_RESPONSE_WINDOW_DAYS,
            cancellation_window_days: DEFAULT_CANCELLATION_WINDOW_DAYS,
            recurrence_horizon_days: DEFAULT_HORIZON_DAYS,
            timezone: "UTC".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// The configured timezone.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the name is not a known IANA zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::Config(format!("invalid timezone: {}", self.timezone)))
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.recurrence_horizon_days == 0 {
            return Err(EngineError::Config(
                "recurrence_horizon_days must be positive".to_string(),
            ));
        }
        if self.recurrence_horizon_days > MAX_HORIZON_DAYS {
            return Err(EngineError::Config(format!(
                "recurrence_horizon_days must be at most {}",
                MAX_HORIZON_DAYS
            )));
        }
        Ok(())
    }
}
