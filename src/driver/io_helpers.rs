// src/driver/io_helpers.rs

use super::S11;
use crate::common::{
    error::CommFault,
    hal_traits::{S11Timer, S11Transport},
    timing,
};
use core::time::Duration;
use nb::Result as NbResult;

/// Whole microseconds of `d`, saturated to the delay API's range.
pub(super) fn micros(d: Duration) -> u32 {
    u32::try_from(d.as_micros()).unwrap_or(u32::MAX)
}

// Implementation block for I/O related helpers
impl<IF> S11<IF>
where
    IF: S11Transport + S11Timer,
{
    /// Executes a non-blocking transfer (`f`) repeatedly until it stops
    /// returning `WouldBlock`, or the configured I/O timeout runs out.
    pub(super) fn execute_with_timeout<FN, T>(&mut self, mut f: FN) -> Result<T, CommFault<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        let deadline = self.interface.now() + self.config.io_timeout;

        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.interface.now() >= deadline {
                        return Err(CommFault::Timeout);
                    }
                    self.interface.delay_us(micros(timing::IO_POLL_INTERVAL));
                }
                Err(nb::Error::Other(e)) => return Err(CommFault::Io(e)),
            }
        }
    }

    /// Blocks for `d` using the interface timer.
    pub(super) fn wait(&mut self, d: Duration) {
        if d.is_zero() {
            return;
        }
        if d.subsec_micros() == 0 {
            self.interface.delay_ms(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
        } else {
            self.interface.delay_us(micros(d));
        }
    }
}
