// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod address;
pub mod codec;
pub mod config;
pub mod error;
pub mod hal_traits;
pub mod registers;
pub mod timing;
pub mod types;

// --- Re-export key types/traits for easier access ---

pub use address::SensorAddress;
pub use codec::{CodecError, FieldValue};
pub use config::DriverConfig;
pub use error::{CommFault, InitFault, S11Error};
pub use hal_traits::{S11Instant, S11Timer, S11Transport};
pub use registers::{Field, REGISTER_MAP_VERSION};

// timing constants stay under common::timing::*

pub use types::{
    CalStatus, CalibrationKind, CalibrationResult, FilterState, FirmwareRevision, Measurement,
    MeasurementMode, MeterControl, ProductCode, SensorInfo, Settings, Status,
};
