// src/native.rs

//! Transport over `embedded-hal` 1.0 blocking I2C.
//!
//! The Sunrise sleeps between measurements and does not acknowledge the first
//! address byte after waking, so every transfer is preceded by an empty write
//! whose error is ignored.

use crate::common::{
    address::SensorAddress,
    hal_traits::{S11Timer, S11Transport},
    timing,
};
use arrayvec::ArrayVec;
use core::time::Duration;
use embedded_hal::{delay::DelayNs, i2c::I2c};

/// Largest payload sent in one I2C write, not counting the register byte.
pub const MAX_WRITE_CHUNK: usize = 24;

/// Time as accumulated by the adapter's own delays, in microseconds.
///
/// The adapter has no clock of its own; every wait the driver performs goes
/// through [`S11Timer`], so summing the delays gives a monotonic time base.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickInstant(u64);

impl core::ops::Add<Duration> for TickInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        TickInstant(self.0.saturating_add(u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX)))
    }
}

impl core::ops::Sub<TickInstant> for TickInstant {
    type Output = Duration;
    fn sub(self, rhs: TickInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

/// [`S11Transport`] + [`S11Timer`] over an I2C bus and a delay provider.
#[derive(Debug)]
pub struct I2cTransport<I2C, D> {
    i2c: I2C,
    delay: D,
    elapsed_us: u64,
    max_write_len: usize,
}

impl<I2C, D> I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        I2cTransport {
            i2c,
            delay,
            elapsed_us: 0,
            max_write_len: MAX_WRITE_CHUNK,
        }
    }

    /// Limits the payload of a single write, for buses with small transfer
    /// buffers. Longer writes are reported as partial and continued by the driver.
    #[must_use]
    pub fn with_max_write_len(mut self, len: usize) -> Self {
        self.max_write_len = len.clamp(1, MAX_WRITE_CHUNK);
        self
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn wake(&mut self, device: SensorAddress) {
        // NACK expected while the sensor wakes
        let _ = self.i2c.write(device.as_u8(), &[]);
        self.delay_us(timing::WAKE_UP_DELAY.as_micros() as u32);
    }
}

impl<I2C, D> S11Timer for I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Instant = TickInstant;

    fn now(&self) -> TickInstant {
        TickInstant(self.elapsed_us)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
        self.elapsed_us = self.elapsed_us.saturating_add(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
        self.elapsed_us = self.elapsed_us.saturating_add(u64::from(ms) * 1000);
    }
}

impl<I2C, D> S11Transport for I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn read(&mut self, device: SensorAddress, register: u8, buf: &mut [u8]) -> nb::Result<usize, I2C::Error> {
        self.wake(device);
        self.i2c
            .write_read(device.as_u8(), &[register], buf)
            .map_err(nb::Error::Other)?;
        Ok(buf.len())
    }

    fn write(&mut self, device: SensorAddress, register: u8, bytes: &[u8]) -> nb::Result<usize, I2C::Error> {
        self.wake(device);
        let len = bytes.len().min(self.max_write_len);
        let mut frame: ArrayVec<u8, { MAX_WRITE_CHUNK + 1 }> = ArrayVec::new();
        frame.push(register);
        // len <= max_write_len <= MAX_WRITE_CHUNK
        frame.extend(bytes[..len].iter().copied());
        self.i2c.write(device.as_u8(), &frame).map_err(nb::Error::Other)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DriverConfig, S11};
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    /// Sunrise register file on a fake bus. Empty writes are NACKed like a
    /// sleeping sensor.
    struct MockBus {
        regs: [u8; 256],
        pointer: usize,
        frames: Vec<Vec<u8>>,
        wake_nacks: usize,
    }

    impl MockBus {
        fn new() -> Self {
            let mut regs = [0u8; 256];
            regs[0x38] = 3;
            regs[0x39] = 2;
            MockBus { regs, pointer: 0, frames: Vec::new(), wake_nacks: 0 }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
            assert_eq!(address, 0x68);
            for op in operations.iter_mut() {
                match op {
                    Operation::Write([]) => {
                        self.wake_nacks += 1;
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    Operation::Write(bytes) => {
                        self.frames.push(bytes.to_vec());
                        self.pointer = bytes[0] as usize;
                        for (i, b) in bytes[1..].iter().enumerate() {
                            self.regs[self.pointer + i] = *b;
                        }
                    }
                    Operation::Read(buf) => {
                        let len = buf.len();
                        buf.copy_from_slice(&self.regs[self.pointer..self.pointer + len]);
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    #[test]
    fn test_read_wakes_then_reads_register() {
        let mut transport = I2cTransport::new(MockBus::new(), MockDelay::default());
        let mut buf = [0u8; 2];
        let got = transport.read(SensorAddress::DEFAULT_ADDRESS, 0x38, &mut buf);
        assert_eq!(got, Ok(2));
        assert_eq!(buf, [3, 2]);
        let (bus, _) = transport.release();
        assert_eq!(bus.wake_nacks, 1);
        assert_eq!(bus.frames, vec![vec![0x38]]);
    }

    #[test]
    fn test_write_is_chunked() {
        let mut transport =
            I2cTransport::new(MockBus::new(), MockDelay::default()).with_max_write_len(4);
        let got = transport.write(SensorAddress::DEFAULT_ADDRESS, 0xC4, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(got, Ok(4));
        let (bus, _) = transport.release();
        assert_eq!(bus.frames, vec![vec![0xC4, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_timer_accumulates_delays() {
        let mut transport = I2cTransport::new(MockBus::new(), MockDelay::default());
        let start = transport.now();
        transport.delay_ms(3);
        transport.delay_us(250);
        assert_eq!(transport.now() - start, Duration::from_micros(3_250));
        let (_, delay) = transport.release();
        assert_eq!(delay.total_ns, 3_250_000);
    }

    #[test]
    fn test_uninitialized_driver_keeps_bus_idle() {
        let transport = I2cTransport::new(MockBus::new(), MockDelay::default()).with_max_write_len(8);
        let mut s11 = S11::new(transport, SensorAddress::default(), DriverConfig::default());
        // Not initialized: nothing reaches the bus
        assert_eq!(s11.get_status(), Err(crate::S11Error::NotInitialized));
        let (bus, _) = s11.release().release();
        assert!(bus.frames.is_empty());
        assert_eq!(bus.wake_nacks, 0);
    }
}
