// src/common/address.rs

use super::error::S11Error;
use core::convert::TryFrom;
use core::fmt;

/// A 7-bit bus address of a Sunrise sensor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorAddress(u8);

impl SensorAddress {
    /// Factory default address of every Sunrise sensor.
    pub const DEFAULT_ADDRESS: SensorAddress = SensorAddress(0x68);

    /// Creates a new `SensorAddress` if the given value is a usable 7-bit address.
    /// Returns `Result<Self, S11Error<()>>` because validation itself
    /// cannot cause an I/O error.
    pub fn new(address: u8) -> Result<Self, S11Error<()>> {
        if Self::is_valid_address(address) {
            Ok(SensorAddress(address))
        } else {
            Err(S11Error::InvalidAddress(address))
        }
    }

    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// 0x00..=0x07 and 0x78..=0x7F are reserved I2C addresses.
    #[inline]
    pub const fn is_valid_address(address: u8) -> bool {
        matches!(address, 0x08..=0x77)
    }
}

impl Default for SensorAddress {
    fn default() -> Self {
        Self::DEFAULT_ADDRESS
    }
}

impl TryFrom<u8> for SensorAddress {
    type Error = S11Error<()>;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SensorAddress> for u8 {
    fn from(value: SensorAddress) -> Self {
        value.0
    }
}

impl fmt::Display for SensorAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use heapless::String as HeaplessString;

    #[test]
    fn test_valid_addresses() {
        assert!(SensorAddress::new(0x08).is_ok());
        assert!(SensorAddress::new(0x68).is_ok());
        assert!(SensorAddress::new(0x77).is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(matches!(SensorAddress::new(0x00), Err(S11Error::InvalidAddress(0x00))));
        assert!(matches!(SensorAddress::new(0x07), Err(S11Error::InvalidAddress(0x07))));
        assert!(matches!(SensorAddress::new(0x78), Err(S11Error::InvalidAddress(0x78))));
        assert!(matches!(SensorAddress::new(0xFF), Err(S11Error::InvalidAddress(0xFF))));
    }

    #[test]
    fn test_default_address() {
        assert_eq!(SensorAddress::default().as_u8(), 0x68);
    }

    #[test]
    fn test_try_from_and_into_u8() {
        let addr = SensorAddress::try_from(0x69).unwrap();
        assert_eq!(u8::from(addr), 0x69);
        assert!(SensorAddress::try_from(0x03).is_err());
    }

    #[test]
    fn test_display() {
        let mut out = HeaplessString::<8>::new();
        write!(out, "{}", SensorAddress::DEFAULT_ADDRESS).unwrap();
        assert_eq!(out.as_str(), "0x68");
    }
}
