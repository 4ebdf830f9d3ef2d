// src/common/timing.rs

use core::time::Duration;

// Nominal values from the Sunrise I2C description. DriverConfig starts from these.

// === Bus ===

/// Upper bound for a single register transfer to finish, including `WouldBlock` polling.
pub const IO_TIMEOUT: Duration = Duration::from_millis(50);
/// Wait before the single retry of a failed transfer.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(15);
/// Poll interval while a transfer returns `WouldBlock`.
pub const IO_POLL_INTERVAL: Duration = Duration::from_micros(100);
/// The sensor sleeps between measurements and needs this long after the wake-up
/// condition before it answers.
pub const WAKE_UP_DELAY: Duration = Duration::from_millis(1);

// === Measurement ===

/// Upper bound of one single measurement with the factory sample count.
pub const MEASUREMENT_CYCLE_MAX: Duration = Duration::from_millis(2400);
/// Interval between measurement counter polls while waiting for a result.
pub const MEASUREMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// === Calibration ===

/// Budget for the calibration status bit to appear.
pub const CALIBRATION_TIMEOUT: Duration = Duration::from_secs(5);
/// Interval between calibration status polls.
pub const CALIBRATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

// === EEPROM / reset ===

/// Settle time after writing EEPROM backed settings.
pub const EEPROM_SETTLE: Duration = Duration::from_millis(25);
/// Time the sensor needs after a soft reset before it answers again.
pub const RESTART_SETTLE: Duration = Duration::from_millis(35);
