// src/lib.rs

#![cfg_attr(not(test), no_std)] // no_std everywhere but the unit test harness

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

// Logging macros must be declared before the modules that use them
#[macro_use]
mod fmt;

pub mod common;
pub mod driver;

#[cfg(feature = "impl-native")]
pub mod native;

// Re-export key types for convenience
pub use common::{
    CalStatus, CalibrationKind, CalibrationResult, DriverConfig, FilterState, Measurement, MeasurementMode,
    MeterControl, S11Error, S11Timer, S11Transport, SensorAddress, SensorInfo, Settings, Status,
};
pub use driver::{RestartRequired, S11};

#[cfg(feature = "impl-native")]
pub use native::I2cTransport;
