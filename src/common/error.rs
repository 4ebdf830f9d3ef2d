// src/common/error.rs

use super::codec::CodecError;
use super::registers::Field;
use core::fmt::Debug;

/// Every failure the driver reports.
///
/// The sequencer resolves transport and codec failures into exactly one of these
/// kinds before returning; a raw transport error is only ever seen wrapped in
/// [`CommFault::Io`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum S11Error<E = ()>
where
    E: Debug, // Still need Debug for the generic Io error
{
    /// Transport failure or malformed response length, after the single retry.
    #[error("communication error: {0}")]
    Communication(CommFault<E>),

    /// A value did not fit the register field it was meant for.
    #[error("encoding error: {0}")]
    Encoding(CodecError),

    /// Bytes read back did not match the declared width of the field.
    #[error("decoding error: {0}")]
    Decoding(CodecError),

    /// The sensor could not be identified; the device stays uninitialized.
    #[error("init failed: {0}")]
    Init(InitFault<E>),

    /// Operation attempted before a successful `init` (or after `restart`).
    #[error("device not initialized")]
    NotInitialized,

    /// Calibration status never reached the requested state within the budget.
    #[error("calibration timed out")]
    CalibrationTimeout,

    /// The sensor has not completed the measurement cycle yet.
    #[error("measurement not ready")]
    MeasurementNotReady,

    /// A read-only field returned a different value on a repeat read.
    #[error("read-only field {field} changed between reads")]
    Consistency { field: Field },

    /// A settings segment could not be written completely.
    #[error("settings write incomplete: {written} of {expected} bytes")]
    SettingsWriteIncomplete { written: usize, expected: usize },

    /// Provided value is not a usable 7-bit sensor address.
    #[error("invalid sensor address: {0:#04x}")]
    InvalidAddress(u8),
}

/// Detail of a communication failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommFault<E>
where
    E: Debug,
{
    /// Underlying I/O error from the transport implementation.
    #[error("transport error: {0:?}")]
    Io(E),

    /// The transport kept returning `WouldBlock` until the I/O timeout.
    #[error("transport timed out")]
    Timeout,

    /// Fewer bytes came back than the field is wide.
    #[error("short read from {field}: expected {expected}, got {got}")]
    ShortRead { field: Field, expected: usize, got: usize },

    /// The transport stopped accepting bytes part way through a write.
    #[error("write to {field} stalled after {written} of {expected} bytes")]
    ShortWrite { field: Field, written: usize, expected: usize },
}

/// Why `init` could not identify the sensor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitFault<E>
where
    E: Debug,
{
    #[error("{0}")]
    Communication(CommFault<E>),

    #[error("{0}")]
    Decoding(CodecError),

    /// The product code register is blank.
    #[error("sensor reported a blank product code")]
    Unidentified,
}

impl<E: Debug> From<CommFault<E>> for S11Error<E> {
    fn from(e: CommFault<E>) -> Self {
        S11Error::Communication(e)
    }
}

impl<E: Debug> S11Error<E> {
    /// Folds a failure raised during `init` into [`S11Error::Init`].
    ///
    /// `NotInitialized` and the other sequencing kinds cannot occur while reading
    /// identity and settings, so they pass through unchanged.
    pub(crate) fn into_init(self) -> Self {
        match self {
            S11Error::Communication(fault) => S11Error::Init(InitFault::Communication(fault)),
            S11Error::Decoding(e) => S11Error::Init(InitFault::Decoding(e)),
            other => other,
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: Debug> defmt::Format for S11Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            S11Error::Communication(_) => defmt::write!(f, "communication error"),
            S11Error::Encoding(e) => defmt::write!(f, "encoding error: {}", e),
            S11Error::Decoding(e) => defmt::write!(f, "decoding error: {}", e),
            S11Error::Init(_) => defmt::write!(f, "init failed"),
            S11Error::NotInitialized => defmt::write!(f, "device not initialized"),
            S11Error::CalibrationTimeout => defmt::write!(f, "calibration timed out"),
            S11Error::MeasurementNotReady => defmt::write!(f, "measurement not ready"),
            S11Error::Consistency { field } => defmt::write!(f, "read-only field {} changed", field),
            S11Error::SettingsWriteIncomplete { written, expected } => {
                defmt::write!(f, "settings write incomplete: {} of {}", written, expected)
            }
            S11Error::InvalidAddress(a) => defmt::write!(f, "invalid sensor address: {=u8:#x}", *a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String as HeaplessString;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct MockIoError;

    #[test]
    fn test_comm_fault_converts_to_communication() {
        let err: S11Error<MockIoError> = CommFault::Io(MockIoError).into();
        assert_eq!(err, S11Error::Communication(CommFault::Io(MockIoError)));
    }

    #[test]
    fn test_into_init_wraps_io_and_decoding() {
        let comm: S11Error<MockIoError> = S11Error::Communication(CommFault::Timeout);
        assert_eq!(comm.into_init(), S11Error::Init(InitFault::Communication(CommFault::Timeout)));

        let decode: S11Error<MockIoError> = S11Error::Decoding(CodecError::WidthMismatch {
            field: Field::ProductCode,
            expected: 16,
            got: 3,
        });
        assert!(matches!(decode.into_init(), S11Error::Init(InitFault::Decoding(_))));

        let other: S11Error<MockIoError> = S11Error::NotInitialized;
        assert_eq!(other.into_init(), S11Error::NotInitialized);
    }

    #[test]
    fn test_display_messages() {
        let mut out = HeaplessString::<64>::new();
        let err: S11Error<MockIoError> = S11Error::SettingsWriteIncomplete { written: 3, expected: 8 };
        write!(out, "{}", err).unwrap();
        assert_eq!(out.as_str(), "settings write incomplete: 3 of 8 bytes");

        out.clear();
        let err: S11Error<MockIoError> = S11Error::Consistency { field: Field::SensorId };
        write!(out, "{}", err).unwrap();
        assert_eq!(out.as_str(), "read-only field SensorId changed between reads");
    }
}
