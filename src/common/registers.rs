// src/common/registers.rs

//! Sunrise (S11) register map.
//!
//! Addresses, widths and ranges follow the Senseair Sunrise I2C register
//! description. All multi-byte registers are big-endian (MSB at the lower
//! address). The table is fixed at compile time and versioned; the driver never
//! probes or infers layout at runtime.

use core::fmt;

/// Version of [`REGISTER_MAP`]. Bump whenever an address, width or range changes.
pub const REGISTER_MAP_VERSION: u16 = 1;

/// A logical field of the sensor register map.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    ErrorStatus,
    /// CO2/temperature/count/cycle-time results, 0x06..=0x15.
    MeasurementBlock,
    FirmwareType,
    FirmwareRevision,
    SensorId,
    ProductCode,
    CalibrationStatus,
    CalibrationCommand,
    CalibrationTarget,
    MeasurementMode,
    MeasurementPeriod,
    NumberOfSamples,
    AbcPeriod,
    ClearErrorStatus,
    AbcTarget,
    StaticIirFilter,
    SoftReset,
    MeterControl,
    StartSingleMeasurement,
    /// ABC + IIR filter state, 0xC4..=0xDB.
    StateData,
    BarometricPressure,
}

/// How the bytes of a field are interpreted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    U8,
    U16,
    U32,
    /// Fixed-width ASCII, NUL padded.
    Ascii,
    /// Opaque bytes, exact width.
    Blob,
}

/// Access rights of a field.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
    ReadWrite,
    /// Read/write, persisted in EEPROM (takes effect after restart).
    Eeprom,
}

/// One row of the register map.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RegisterSpec {
    pub field: Field,
    pub address: u8,
    pub width: usize,
    pub kind: FieldKind,
    pub access: Access,
    /// Inclusive numeric range accepted by `encode`. `None` means the full width.
    pub range: Option<(u32, u32)>,
}

const fn reg(
    field: Field,
    address: u8,
    width: usize,
    kind: FieldKind,
    access: Access,
    range: Option<(u32, u32)>,
) -> RegisterSpec {
    RegisterSpec { field, address, width, kind, access, range }
}

/// Widest field in the map (the filter state blob).
pub const MAX_FIELD_WIDTH: usize = 24;

/// The register map, ordered by address.
pub static REGISTER_MAP: [RegisterSpec; 21] = [
    reg(Field::ErrorStatus, 0x00, 2, FieldKind::U16, Access::Read, None),
    reg(Field::MeasurementBlock, 0x06, 16, FieldKind::Blob, Access::Read, None),
    reg(Field::FirmwareType, 0x2F, 1, FieldKind::U8, Access::Read, None),
    reg(Field::FirmwareRevision, 0x38, 2, FieldKind::U16, Access::Read, None),
    reg(Field::SensorId, 0x3A, 4, FieldKind::U32, Access::Read, None),
    reg(Field::ProductCode, 0x70, 16, FieldKind::Ascii, Access::Read, None),
    reg(Field::CalibrationStatus, 0x81, 1, FieldKind::U8, Access::ReadWrite, None),
    reg(Field::CalibrationCommand, 0x82, 2, FieldKind::U16, Access::Write, Some((0x7C02, 0x7C07))),
    reg(Field::CalibrationTarget, 0x84, 2, FieldKind::U16, Access::ReadWrite, Some((0, 10_000))),
    reg(Field::MeasurementMode, 0x95, 1, FieldKind::U8, Access::Eeprom, Some((0, 1))),
    reg(Field::MeasurementPeriod, 0x96, 2, FieldKind::U16, Access::Eeprom, Some((2, 65_534))),
    reg(Field::NumberOfSamples, 0x98, 2, FieldKind::U16, Access::Eeprom, Some((1, 1024))),
    reg(Field::AbcPeriod, 0x9A, 2, FieldKind::U16, Access::Eeprom, Some((0, 65_534))),
    reg(Field::ClearErrorStatus, 0x9D, 1, FieldKind::U8, Access::Write, Some((0, 0))),
    reg(Field::AbcTarget, 0x9E, 2, FieldKind::U16, Access::Eeprom, Some((0, 10_000))),
    reg(Field::StaticIirFilter, 0xA1, 1, FieldKind::U8, Access::Eeprom, Some((2, 10))),
    reg(Field::SoftReset, 0xA3, 1, FieldKind::U8, Access::Write, Some((0xFF, 0xFF))),
    reg(Field::MeterControl, 0xA5, 1, FieldKind::U8, Access::Eeprom, None),
    reg(Field::StartSingleMeasurement, 0xC3, 1, FieldKind::U8, Access::Write, Some((1, 1))),
    reg(Field::StateData, 0xC4, 24, FieldKind::Blob, Access::ReadWrite, None),
    reg(Field::BarometricPressure, 0xDC, 2, FieldKind::U16, Access::ReadWrite, Some((3000, 13_000))),
];

impl Field {
    /// Every field, in register map order.
    pub const ALL: [Field; 21] = [
        Field::ErrorStatus,
        Field::MeasurementBlock,
        Field::FirmwareType,
        Field::FirmwareRevision,
        Field::SensorId,
        Field::ProductCode,
        Field::CalibrationStatus,
        Field::CalibrationCommand,
        Field::CalibrationTarget,
        Field::MeasurementMode,
        Field::MeasurementPeriod,
        Field::NumberOfSamples,
        Field::AbcPeriod,
        Field::ClearErrorStatus,
        Field::AbcTarget,
        Field::StaticIirFilter,
        Field::SoftReset,
        Field::MeterControl,
        Field::StartSingleMeasurement,
        Field::StateData,
        Field::BarometricPressure,
    ];

    /// Looks up the register map row of this field.
    pub fn spec(self) -> &'static RegisterSpec {
        // REGISTER_MAP and ALL share the same ordering
        &REGISTER_MAP[self as usize]
    }

    #[inline]
    pub fn address(self) -> u8 {
        self.spec().address
    }

    #[inline]
    pub fn width(self) -> usize {
        self.spec().width
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::ErrorStatus => "ErrorStatus",
            Field::MeasurementBlock => "MeasurementBlock",
            Field::FirmwareType => "FirmwareType",
            Field::FirmwareRevision => "FirmwareRevision",
            Field::SensorId => "SensorId",
            Field::ProductCode => "ProductCode",
            Field::CalibrationStatus => "CalibrationStatus",
            Field::CalibrationCommand => "CalibrationCommand",
            Field::CalibrationTarget => "CalibrationTarget",
            Field::MeasurementMode => "MeasurementMode",
            Field::MeasurementPeriod => "MeasurementPeriod",
            Field::NumberOfSamples => "NumberOfSamples",
            Field::AbcPeriod => "AbcPeriod",
            Field::ClearErrorStatus => "ClearErrorStatus",
            Field::AbcTarget => "AbcTarget",
            Field::StaticIirFilter => "StaticIirFilter",
            Field::SoftReset => "SoftReset",
            Field::MeterControl => "MeterControl",
            Field::StartSingleMeasurement => "StartSingleMeasurement",
            Field::StateData => "StateData",
            Field::BarometricPressure => "BarometricPressure",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- Command values ---

/// Value written to `SoftReset` to restart the sensor.
pub const SOFT_RESET_COMMAND: u8 = 0xFF;
/// Value written to `StartSingleMeasurement` to trigger one measurement.
pub const START_SINGLE_MEASUREMENT_COMMAND: u8 = 0x01;
/// Value written to `ClearErrorStatus`.
pub const CLEAR_ERROR_STATUS_COMMAND: u8 = 0x00;

// --- Settings block layout ---

/// First register of the EEPROM settings block.
pub const SETTINGS_BLOCK_START: u8 = 0x95;
/// Length of the settings block read in one transaction (0x95..=0xA5).
pub const SETTINGS_BLOCK_LEN: usize = 17;

/// Contiguous write ranges of the settings block, as `(first field, len)`.
///
/// The block also holds the clear-status (0x9D) and soft-reset (0xA3) command
/// registers, which must never be written as part of a settings update.
pub const SETTINGS_SEGMENTS: [(Field, usize); 3] =
    [(Field::MeasurementMode, 8), (Field::AbcTarget, 4), (Field::MeterControl, 1)];

/// Reserved bytes inside the settings block, preserved verbatim.
pub const SETTINGS_RESERVED: [u8; 2] = [0x9C, 0xA0];
