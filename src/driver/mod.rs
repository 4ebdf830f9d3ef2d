// src/driver/mod.rs

//! The protocol sequencer.
//!
//! [`S11`] owns the interface and the cached device state. Its `impl` blocks are
//! split by concern: bounded polling in `io_helpers`, register transfers with the
//! retry policy in `transaction`, and the public sensor operations in `operations`.

use crate::common::{
    address::SensorAddress,
    config::DriverConfig,
    error::S11Error,
    hal_traits::{S11Timer, S11Transport},
    types::{CalStatus, CalibrationResult, FilterState, Measurement, SensorInfo, Settings, Status},
};

mod io_helpers;
mod operations;
mod state;
mod transaction;

#[cfg(test)]
pub(crate) mod mock;

use state::{Phase, ReadyCache};

/// Returned by [`S11::set_dev_settings`]: the new settings are stored but only
/// take effect after [`S11::restart`].
#[must_use = "settings take effect only after restart()"]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RestartRequired;

/// Driver for one Senseair Sunrise (S11) sensor.
///
/// Every operation other than [`init`](S11::init) fails with
/// [`S11Error::NotInitialized`] until `init` has succeeded, without touching the bus.
#[derive(Debug)]
pub struct S11<IF>
where
    IF: S11Transport + S11Timer,
{
    interface: IF,
    address: SensorAddress,
    config: DriverConfig,
    phase: Phase<IF::Instant>,
}

impl<IF> S11<IF>
where
    IF: S11Transport + S11Timer,
{
    pub fn new(interface: IF, address: SensorAddress, config: DriverConfig) -> Self {
        S11 {
            interface,
            address,
            config,
            phase: Phase::Uninitialized,
        }
    }

    /// Gives the interface back. Cached state is discarded.
    pub fn release(self) -> IF {
        self.interface
    }

    pub fn address(&self) -> SensorAddress {
        self.address
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.phase.cache().is_some()
    }

    /// True after settings were written and before the sensor was restarted.
    pub fn restart_pending(&self) -> bool {
        self.phase.cache().is_some_and(|cache| cache.restart_pending)
    }

    // --- Readiness gate ---

    fn ready(&self) -> Result<&ReadyCache<IF::Instant>, S11Error<IF::Error>> {
        self.phase.cache().ok_or(S11Error::NotInitialized)
    }

    fn ready_mut(&mut self) -> Result<&mut ReadyCache<IF::Instant>, S11Error<IF::Error>> {
        self.phase.cache_mut().ok_or(S11Error::NotInitialized)
    }

    // --- Cache reads ---

    /// Identity read by `init`.
    pub fn sensor_info(&self) -> Result<SensorInfo, S11Error<IF::Error>> {
        Ok(self.ready()?.info)
    }

    /// Settings as last read or written.
    pub fn settings(&self) -> Result<Settings, S11Error<IF::Error>> {
        Ok(self.ready()?.settings)
    }

    /// Error status from the last `get_status`.
    pub fn status(&self) -> Result<Option<Status>, S11Error<IF::Error>> {
        Ok(self.ready()?.status)
    }

    pub fn cal_status(&self) -> Result<Option<CalStatus>, S11Error<IF::Error>> {
        Ok(self.ready()?.cal_status)
    }

    /// Outcome of the last completed calibration.
    pub fn calibration_result(&self) -> Result<Option<CalibrationResult>, S11Error<IF::Error>> {
        Ok(self.ready()?.calibration)
    }

    /// Last measurement read; `valid` is false when the sensor had not finished it.
    pub fn measurement(&self) -> Result<Option<Measurement>, S11Error<IF::Error>> {
        Ok(self.ready()?.measurement)
    }

    pub fn filter_state(&self) -> Result<Option<FilterState>, S11Error<IF::Error>> {
        Ok(self.ready()?.filter_state)
    }
}
