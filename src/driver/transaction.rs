// src/driver/transaction.rs

use super::S11;
use crate::common::{
    codec::{self, FieldBytes, FieldValue},
    error::{CommFault, S11Error},
    hal_traits::{S11Timer, S11Transport},
    registers::{Field, MAX_FIELD_WIDTH},
};
use core::fmt::Debug;

/// A failed transfer is attempted once more after the retry backoff.
const MAX_TRANSFER_ATTEMPTS: usize = 2;

/// A write that stopped before all bytes were accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct WriteStall<E: Debug> {
    /// Bytes accepted before the stall.
    pub written: usize,
    pub fault: CommFault<E>,
}

impl<IF> S11<IF>
where
    IF: S11Transport + S11Timer,
{
    /// Reads exactly `buf.len()` bytes starting at `register`, retrying once.
    pub(super) fn read_exact(
        &mut self,
        field: Field,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), CommFault<IF::Error>> {
        let address = self.address;
        let expected = buf.len();
        let mut last_fault = CommFault::Timeout;

        for attempt in 0..MAX_TRANSFER_ATTEMPTS {
            if attempt > 0 {
                warn!("retrying read of {} at {:#x}", field, register);
                self.wait(self.config.retry_backoff);
            }
            match self.execute_with_timeout(|iface| iface.read(address, register, buf)) {
                Ok(got) if got == expected => {
                    trace!("read {} bytes of {} at {:#x}", got, field, register);
                    return Ok(());
                }
                Ok(got) => last_fault = CommFault::ShortRead { field, expected, got },
                Err(fault) => last_fault = fault,
            }
        }
        Err(last_fault)
    }

    /// Writes all of `bytes` starting at `register`.
    ///
    /// A partial write is continued from the first unwritten byte. Each stall
    /// (an error, a timeout or zero bytes accepted) gets one retry; progress
    /// resets the retry budget.
    pub(super) fn write_bytes(
        &mut self,
        field: Field,
        register: u8,
        bytes: &[u8],
    ) -> Result<(), WriteStall<IF::Error>> {
        let address = self.address;
        let expected = bytes.len();
        let mut written = 0;
        let mut failed_attempts = 0;

        while written < expected {
            let start = register.wrapping_add(written as u8);
            let rest = &bytes[written..];
            let fault = match self.execute_with_timeout(|iface| iface.write(address, start, rest)) {
                Ok(0) => CommFault::ShortWrite { field, written, expected },
                Ok(n) => {
                    trace!("wrote {} bytes of {} at {:#x}", n, field, start);
                    written += n.min(rest.len());
                    failed_attempts = 0;
                    continue;
                }
                Err(fault) => fault,
            };

            failed_attempts += 1;
            if failed_attempts >= MAX_TRANSFER_ATTEMPTS {
                warn!("write of {} stalled after {} of {} bytes", field, written, expected);
                return Err(WriteStall { written, fault });
            }
            warn!("retrying write of {} at {:#x}", field, start);
            self.wait(self.config.retry_backoff);
        }
        Ok(())
    }

    // --- Field level helpers ---

    /// Reads the raw bytes of one field.
    pub(super) fn read_raw(&mut self, field: Field) -> Result<FieldBytes, S11Error<IF::Error>> {
        let mut buf = [0u8; MAX_FIELD_WIDTH];
        let width = field.width();
        self.read_exact(field, field.address(), &mut buf[..width])?;
        Ok(buf[..width].iter().copied().collect())
    }

    pub(super) fn read_u8(&mut self, field: Field) -> Result<u8, S11Error<IF::Error>> {
        let raw = self.read_raw(field)?;
        codec::decode_u8(field, &raw).map_err(S11Error::Decoding)
    }

    pub(super) fn read_u16(&mut self, field: Field) -> Result<u16, S11Error<IF::Error>> {
        let raw = self.read_raw(field)?;
        codec::decode_u16(field, &raw).map_err(S11Error::Decoding)
    }

    pub(super) fn read_u32(&mut self, field: Field) -> Result<u32, S11Error<IF::Error>> {
        let raw = self.read_raw(field)?;
        codec::decode_u32(field, &raw).map_err(S11Error::Decoding)
    }

    /// Writes already encoded bytes of `field`.
    pub(super) fn write_raw(&mut self, field: Field, bytes: &[u8]) -> Result<(), S11Error<IF::Error>> {
        self.write_bytes(field, field.address(), bytes)
            .map_err(|stall| S11Error::Communication(stall.fault))
    }

    /// Encodes `value` and writes it. Nothing is sent if encoding fails.
    pub(super) fn write_field(&mut self, field: Field, value: FieldValue) -> Result<(), S11Error<IF::Error>> {
        let bytes = codec::encode(field, &value).map_err(S11Error::Encoding)?;
        self.write_raw(field, &bytes)
    }
}
