// src/common/config.rs

use super::timing;
use core::time::Duration;

/// Timeouts and settle times used by the driver.
///
/// Every wait the driver performs is bounded by one of these values.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DriverConfig {
    pub io_timeout: Duration,
    pub retry_backoff: Duration,
    /// How long `get_meas_data` keeps a triggered measurement pending before
    /// reporting the counter as stale.
    pub measurement_cycle: Duration,
    pub calibration_timeout: Duration,
    pub calibration_poll_interval: Duration,
    pub eeprom_settle: Duration,
    pub restart_settle: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            io_timeout: timing::IO_TIMEOUT,
            retry_backoff: timing::RETRY_BACKOFF,
            measurement_cycle: timing::MEASUREMENT_CYCLE_MAX,
            calibration_timeout: timing::CALIBRATION_TIMEOUT,
            calibration_poll_interval: timing::CALIBRATION_POLL_INTERVAL,
            eeprom_settle: timing::EEPROM_SETTLE,
            restart_settle: timing::RESTART_SETTLE,
        }
    }
}

impl DriverConfig {
    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_measurement_cycle(mut self, cycle: Duration) -> Self {
        self.measurement_cycle = cycle;
        self
    }

    #[must_use]
    pub fn with_calibration_timeout(mut self, timeout: Duration) -> Self {
        self.calibration_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_calibration_poll_interval(mut self, interval: Duration) -> Self {
        self.calibration_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_eeprom_settle(mut self, settle: Duration) -> Self {
        self.eeprom_settle = settle;
        self
    }

    #[must_use]
    pub fn with_restart_settle(mut self, settle: Duration) -> Self {
        self.restart_settle = settle;
        self
    }
}
