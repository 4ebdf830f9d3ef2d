// src/common/types.rs

use super::codec::{self, CodecError, FieldValue};
use super::registers::{Field, SETTINGS_BLOCK_LEN, SETTINGS_BLOCK_START, SETTINGS_RESERVED};
use arrayvec::ArrayString;
use core::fmt;

// --- Error status (register 0x00..=0x01) ---

/// Sensor-reported error conditions.
///
/// Bits the driver has no name for are kept as reported.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u16);

impl Status {
    pub const FATAL_ERROR: u16 = 1 << 0;
    pub const I2C_ERROR: u16 = 1 << 1;
    pub const ALGORITHM_ERROR: u16 = 1 << 2;
    pub const CALIBRATION_ERROR: u16 = 1 << 3;
    pub const SELF_DIAGNOSTICS_ERROR: u16 = 1 << 4;
    pub const OUT_OF_RANGE: u16 = 1 << 5;
    pub const MEMORY_ERROR: u16 = 1 << 6;
    pub const NO_MEASUREMENT_COMPLETED: u16 = 1 << 7;
    pub const LOW_INTERNAL_VOLTAGE: u16 = 1 << 8;
    pub const MEASUREMENT_TIMEOUT: u16 = 1 << 9;
    pub const ABNORMAL_SIGNAL_LEVEL: u16 = 1 << 10;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    /// True when the sensor reports no error condition at all.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.0 == 0
    }
}

// --- Calibration ---

/// Calibration status flags (register 0x81).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalStatus(u8);

impl CalStatus {
    pub const FACTORY_CALIBRATION_RESTORED: u8 = 1 << 2;
    pub const ABC_CALIBRATION: u8 = 1 << 3;
    pub const TARGET_CALIBRATION: u8 = 1 << 4;
    pub const BACKGROUND_CALIBRATION: u8 = 1 << 5;
    pub const ZERO_CALIBRATION: u8 = 1 << 6;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }
}

/// Built-in calibration routines of the sensor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationKind {
    /// Restore the factory calibration.
    FactoryRestore,
    /// Force an ABC calibration now.
    ForcedAbc,
    /// Calibrate against a known concentration in ppm.
    Target(u16),
    /// Calibrate against fresh air (~400 ppm).
    Background,
    /// Calibrate against 0 ppm (nitrogen).
    Zero,
}

impl CalibrationKind {
    /// Value written to the calibration command register.
    pub const fn command(&self) -> u16 {
        match self {
            CalibrationKind::FactoryRestore => 0x7C02,
            CalibrationKind::ForcedAbc => 0x7C03,
            CalibrationKind::Target(_) => 0x7C05,
            CalibrationKind::Background => 0x7C06,
            CalibrationKind::Zero => 0x7C07,
        }
    }

    /// Calibration status bit the sensor sets when this routine completes.
    pub const fn completion_flag(&self) -> u8 {
        match self {
            CalibrationKind::FactoryRestore => CalStatus::FACTORY_CALIBRATION_RESTORED,
            CalibrationKind::ForcedAbc => CalStatus::ABC_CALIBRATION,
            CalibrationKind::Target(_) => CalStatus::TARGET_CALIBRATION,
            CalibrationKind::Background => CalStatus::BACKGROUND_CALIBRATION,
            CalibrationKind::Zero => CalStatus::ZERO_CALIBRATION,
        }
    }
}

/// Outcome of [`S11::calibrate`](crate::driver::S11::calibrate).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationResult {
    pub kind: CalibrationKind,
    /// Completion bit set and no calibration error reported.
    pub success: bool,
    pub cal_status: CalStatus,
    /// Error status read right after the calibration completed.
    pub status: Status,
}

// --- Identity ---

/// Firmware revision, `main.sub`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareRevision {
    pub main: u8,
    pub sub: u8,
}

impl From<u16> for FirmwareRevision {
    fn from(raw: u16) -> Self {
        let [main, sub] = raw.to_be_bytes();
        FirmwareRevision { main, sub }
    }
}

impl fmt::Display for FirmwareRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.main, self.sub)
    }
}

/// Product code identifier, up to 16 ASCII characters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ProductCode(ArrayString<16>);

impl ProductCode {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decodes the raw 16-byte product code register.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        match codec::decode(Field::ProductCode, bytes)? {
            // decode already bounded the text by the 16 byte field width
            FieldValue::Ascii(text) => ArrayString::from(text.as_str())
                .map(ProductCode)
                .map_err(|_| CodecError::WidthMismatch {
                    field: Field::ProductCode,
                    expected: 16,
                    got: text.len(),
                }),
            _ => Err(CodecError::KindMismatch { field: Field::ProductCode }),
        }
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProductCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// Read-only identity of a sensor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorInfo {
    pub firmware_type: u8,
    pub firmware: FirmwareRevision,
    pub sensor_id: u32,
    pub product_code: ProductCode,
}

impl SensorInfo {
    /// First field that differs between two identity reads.
    pub fn first_difference(&self, other: &SensorInfo) -> Option<Field> {
        if self.firmware_type != other.firmware_type {
            Some(Field::FirmwareType)
        } else if self.firmware != other.firmware {
            Some(Field::FirmwareRevision)
        } else if self.sensor_id != other.sensor_id {
            Some(Field::SensorId)
        } else if self.product_code != other.product_code {
            Some(Field::ProductCode)
        } else {
            None
        }
    }
}

// --- Measurement (block 0x06..=0x15) ---

/// One measurement result.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Filtered, pressure compensated CO2 in ppm.
    pub co2_ppm: i16,
    /// Temperature in 1/100 °C.
    pub temperature_centi_c: i16,
    /// Sensor measurement counter, wraps at 255.
    pub count: u8,
    /// Measurement cycle time in 2 second units.
    pub cycle_time: u16,
    pub co2_unfiltered_pc_ppm: i16,
    pub co2_filtered_ppm: i16,
    pub co2_unfiltered_ppm: i16,
    /// False until the sensor has completed the cycle this result belongs to.
    pub valid: bool,
}

impl Measurement {
    /// Parses the raw measurement block. The result is not marked valid.
    pub fn from_block(bytes: &[u8]) -> Result<Self, CodecError> {
        let block = match codec::decode(Field::MeasurementBlock, bytes)? {
            FieldValue::Blob(blob) => blob,
            _ => return Err(CodecError::KindMismatch { field: Field::MeasurementBlock }),
        };
        let i16_at = |i: usize| i16::from_be_bytes([block[i], block[i + 1]]);
        Ok(Measurement {
            co2_ppm: i16_at(0),
            temperature_centi_c: i16_at(2),
            count: block[7],
            cycle_time: u16::from_be_bytes([block[8], block[9]]),
            co2_unfiltered_pc_ppm: i16_at(10),
            co2_filtered_ppm: i16_at(12),
            co2_unfiltered_ppm: i16_at(14),
            valid: false,
        })
    }

    pub fn temperature_celsius(&self) -> f32 {
        f32::from(self.temperature_centi_c) / 100.0
    }
}

// --- Filter state (0xC4..=0xDB) ---

/// Length of the ABC + IIR filter state blob.
pub const FILTER_STATE_LEN: usize = 24;

/// Opaque ABC + IIR filter state, handed back to the sensor unmodified.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterState([u8; FILTER_STATE_LEN]);

impl FilterState {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut raw = [0u8; FILTER_STATE_LEN];
        match codec::decode(Field::StateData, bytes)? {
            FieldValue::Blob(blob) => raw.copy_from_slice(&blob),
            _ => return Err(CodecError::KindMismatch { field: Field::StateData }),
        }
        Ok(FilterState(raw))
    }

    pub fn as_bytes(&self) -> &[u8; FILTER_STATE_LEN] {
        &self.0
    }
}

// --- Settings (EEPROM, 0x95..=0xA5) ---

/// Measurement mode setting.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementMode {
    Continuous,
    Single,
    /// A mode value this driver does not know, kept as reported.
    Other(u8),
}

impl From<u8> for MeasurementMode {
    fn from(raw: u8) -> Self {
        match raw {
            0 => MeasurementMode::Continuous,
            1 => MeasurementMode::Single,
            other => MeasurementMode::Other(other),
        }
    }
}

impl From<MeasurementMode> for u8 {
    fn from(mode: MeasurementMode) -> Self {
        match mode {
            MeasurementMode::Continuous => 0,
            MeasurementMode::Single => 1,
            MeasurementMode::Other(raw) => raw,
        }
    }
}

/// Meter control flags (register 0xA5).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeterControl(u8);

impl MeterControl {
    pub const NRDY_DISABLED: u8 = 1 << 0;
    pub const ABC_DISABLED: u8 = 1 << 1;
    pub const STATIC_IIR_DISABLED: u8 = 1 << 2;
    pub const DYNAMIC_IIR_DISABLED: u8 = 1 << 3;
    pub const PRESSURE_COMPENSATION_DISABLED: u8 = 1 << 4;
    pub const NRDY_INVERTED: u8 = 1 << 5;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    #[must_use]
    pub const fn with(self, flag: u8, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }
}

/// Persisted sensor settings. Changes take effect after a restart.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub measurement_mode: MeasurementMode,
    /// Seconds between measurements in continuous mode.
    pub measurement_period: u16,
    pub number_of_samples: u16,
    /// Hours between ABC corrections, 0 disables ABC.
    pub abc_period: u16,
    pub abc_target: u16,
    pub static_iir_filter: u8,
    pub meter_control: MeterControl,
    /// Reserved bytes 0x9C and 0xA0, written back as read.
    pub reserved: [u8; 2],
}

impl Default for Settings {
    /// Factory configuration.
    fn default() -> Self {
        Settings {
            measurement_mode: MeasurementMode::Continuous,
            measurement_period: 16,
            number_of_samples: 8,
            abc_period: 180,
            abc_target: 400,
            static_iir_filter: 10,
            meter_control: MeterControl::default(),
            reserved: [0; 2],
        }
    }
}

impl Settings {
    /// Parses the 17-byte settings block read from 0x95.
    pub fn from_block(block: &[u8]) -> Result<Self, CodecError> {
        if block.len() != SETTINGS_BLOCK_LEN {
            return Err(CodecError::WidthMismatch {
                field: Field::MeasurementMode,
                expected: SETTINGS_BLOCK_LEN,
                got: block.len(),
            });
        }
        let u8_of = |field| codec::decode_u8(field, codec::slice_for(field, SETTINGS_BLOCK_START, block)?);
        let u16_of = |field| codec::decode_u16(field, codec::slice_for(field, SETTINGS_BLOCK_START, block)?);
        let reserved_at = |addr: u8| block[(addr - SETTINGS_BLOCK_START) as usize];

        Ok(Settings {
            measurement_mode: MeasurementMode::from(u8_of(Field::MeasurementMode)?),
            measurement_period: u16_of(Field::MeasurementPeriod)?,
            number_of_samples: u16_of(Field::NumberOfSamples)?,
            abc_period: u16_of(Field::AbcPeriod)?,
            abc_target: u16_of(Field::AbcTarget)?,
            static_iir_filter: u8_of(Field::StaticIirFilter)?,
            meter_control: MeterControl::from_bits(u8_of(Field::MeterControl)?),
            reserved: [reserved_at(SETTINGS_RESERVED[0]), reserved_at(SETTINGS_RESERVED[1])],
        })
    }

    /// Encodes every field into a settings block image.
    ///
    /// Command registers inside the block are left zero; they are never part of a
    /// written segment.
    pub fn to_block(&self) -> Result<[u8; SETTINGS_BLOCK_LEN], CodecError> {
        let mut block = [0u8; SETTINGS_BLOCK_LEN];
        let values = [
            (Field::MeasurementMode, FieldValue::U8(self.measurement_mode.into())),
            (Field::MeasurementPeriod, FieldValue::U16(self.measurement_period)),
            (Field::NumberOfSamples, FieldValue::U16(self.number_of_samples)),
            (Field::AbcPeriod, FieldValue::U16(self.abc_period)),
            (Field::AbcTarget, FieldValue::U16(self.abc_target)),
            (Field::StaticIirFilter, FieldValue::U8(self.static_iir_filter)),
            (Field::MeterControl, FieldValue::U8(self.meter_control.bits())),
        ];
        for (field, value) in values.iter() {
            let start = (field.address() - SETTINGS_BLOCK_START) as usize;
            codec::encode_into(*field, value, &mut block[start..start + field.width()])?;
        }
        for (addr, byte) in SETTINGS_RESERVED.iter().zip(self.reserved) {
            block[(addr - SETTINGS_BLOCK_START) as usize] = byte;
        }
        Ok(block)
    }
}
