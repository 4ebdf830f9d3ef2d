// src/common/hal_traits.rs

use super::address::SensorAddress;
use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in time as reported by [`S11Timer::now`].
///
/// Only differences and deadlines are ever computed, so any monotonic tick
/// counter works.
pub trait S11Instant: Copy + Ord + Add<Duration, Output = Self> + Sub<Self, Output = Duration> {}

impl<T> S11Instant for T where T: Copy + Ord + Add<Duration, Output = T> + Sub<T, Output = Duration> {}

/// Abstraction for timer/delay operations required by the driver.
pub trait S11Timer {
    type Instant: S11Instant;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Delay for at least the specified number of microseconds.
    fn delay_us(&mut self, us: u32);

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Register-oriented byte transport to the sensor.
///
/// Both calls are non-blocking in the `nb` sense: `WouldBlock` means the bus is
/// not ready yet and the driver will poll again until its I/O timeout.
pub trait S11Transport {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Reads `buf.len()` bytes starting at `register`.
    ///
    /// Returns the number of bytes actually read. Fewer than requested is treated
    /// as a malformed response by the driver.
    fn read(&mut self, device: SensorAddress, register: u8, buf: &mut [u8]) -> nb::Result<usize, Self::Error>;

    /// Writes `bytes` starting at `register`.
    ///
    /// Returns the number of bytes the device accepted, which may be fewer than
    /// `bytes.len()` for transports that split long writes.
    fn write(&mut self, device: SensorAddress, register: u8, bytes: &[u8]) -> nb::Result<usize, Self::Error>;
}
