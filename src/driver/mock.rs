// src/driver/mock.rs

//! Simulated Sunrise sensor for unit tests.
//!
//! A 256 byte register file behind the transport traits, a virtual clock that
//! only moves on delays, and knobs for fault injection. Measurements complete
//! `cycle_us` after a trigger; calibrations set their status bit
//! `calibration_us` after the command.

use crate::common::{
    address::SensorAddress,
    hal_traits::{S11Timer, S11Transport},
    registers::Field,
    types::{CalibrationKind, MeasurementMode, Settings, Status},
};
use core::time::Duration;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SimInstant(pub u64);

impl core::ops::Add<Duration> for SimInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        SimInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl core::ops::Sub<SimInstant> for SimInstant {
    type Output = Duration;
    fn sub(self, rhs: SimInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockCommError;

#[derive(Debug)]
pub(crate) struct SimSensor {
    pub regs: [u8; 256],
    pub now_us: u64,

    // --- behaviour ---
    pub cycle_us: u64,
    pub calibration_us: u64,
    pub calibration_completes: bool,
    pub calibration_reports_error: bool,
    /// CO2 value the next completed measurement reports.
    pub next_co2: i16,

    // --- fault injection (each counter is consumed per call) ---
    pub fail_reads: usize,
    pub fail_writes: usize,
    pub short_reads: usize,
    pub would_block: usize,
    /// Bytes accepted per write call.
    pub max_write_len: Option<usize>,
    /// Total bytes accepted before every further write returns 0.
    pub accept_write_bytes: Option<usize>,

    // --- observation ---
    pub reads: usize,
    pub writes: usize,
    pub write_log: Vec<(u8, Vec<u8>)>,
    pub restarts: usize,
    pub triggers: usize,
    /// Filter state registers at the moment of the last trigger.
    pub filter_at_trigger: Option<[u8; 24]>,

    measuring_until: Option<u64>,
    calibrating: Option<(u64, u8)>,
}

impl SimSensor {
    pub const SENSOR_ID: u32 = 0x0012_3456;
    pub const PRODUCT_CODE: &'static str = "S11-ABC123";
    pub const RESERVED: [u8; 2] = [0x5A, 0xA5];

    pub fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[0x06..0x08].copy_from_slice(&400i16.to_be_bytes());
        regs[0x08..0x0A].copy_from_slice(&2210i16.to_be_bytes());
        regs[Field::FirmwareType.address() as usize] = 0x0A;
        regs[0x38] = 3;
        regs[0x39] = 2;
        regs[0x3A..0x3E].copy_from_slice(&Self::SENSOR_ID.to_be_bytes());
        regs[0x70..0x70 + Self::PRODUCT_CODE.len()].copy_from_slice(Self::PRODUCT_CODE.as_bytes());
        let settings = Settings {
            measurement_mode: MeasurementMode::Single,
            reserved: Self::RESERVED,
            ..Settings::default()
        };
        regs[0x95..0xA6].copy_from_slice(&settings.to_block().unwrap());
        regs[0xDC..0xDE].copy_from_slice(&10_132u16.to_be_bytes());

        SimSensor {
            regs,
            now_us: 0,
            cycle_us: 1_800_000,
            calibration_us: 400_000,
            calibration_completes: true,
            calibration_reports_error: false,
            next_co2: 420,
            fail_reads: 0,
            fail_writes: 0,
            short_reads: 0,
            would_block: 0,
            max_write_len: None,
            accept_write_bytes: None,
            reads: 0,
            writes: 0,
            write_log: Vec::new(),
            restarts: 0,
            triggers: 0,
            filter_at_trigger: None,
            measuring_until: None,
            calibrating: None,
        }
    }

    pub fn measurement_count(&self) -> u8 {
        self.regs[0x0D]
    }

    pub fn filter_state(&self) -> [u8; 24] {
        let mut state = [0u8; 24];
        state.copy_from_slice(&self.regs[0xC4..0xDC]);
        state
    }

    pub fn set_filter_state(&mut self, state: [u8; 24]) {
        self.regs[0xC4..0xDC].copy_from_slice(&state);
    }

    pub fn advance(&mut self, us: u64) {
        self.now_us = self.now_us.saturating_add(us);
    }

    /// Index of the first logged write that starts at `register`.
    pub fn write_index(&self, register: u8) -> Option<usize> {
        self.write_log.iter().position(|(start, _)| *start == register)
    }

    /// True if any logged write touched `register`.
    pub fn wrote_to(&self, register: u8) -> bool {
        self.write_log.iter().any(|(start, bytes)| {
            let start = *start as usize;
            (start..start + bytes.len()).contains(&(register as usize))
        })
    }

    fn tick(&mut self) {
        if let Some(until) = self.measuring_until {
            if self.now_us >= until {
                self.measuring_until = None;
                let co2 = self.next_co2.to_be_bytes();
                self.regs[0x06..0x08].copy_from_slice(&co2);
                self.regs[0x08..0x0A].copy_from_slice(&2350i16.to_be_bytes());
                self.regs[0x0D] = self.regs[0x0D].wrapping_add(1);
                self.regs[0x10..0x12].copy_from_slice(&co2);
                self.regs[0x12..0x14].copy_from_slice(&co2);
                self.regs[0x14..0x16].copy_from_slice(&co2);
                for byte in self.regs[0xC4..0xDC].iter_mut() {
                    *byte = byte.wrapping_add(1);
                }
            }
        }
        if let Some((done_at, flag)) = self.calibrating {
            if self.now_us >= done_at {
                self.calibrating = None;
                self.regs[0x81] |= flag;
                if self.calibration_reports_error {
                    let status = u16::from_be_bytes([self.regs[0], self.regs[1]]) | Status::CALIBRATION_ERROR;
                    self.regs[0..2].copy_from_slice(&status.to_be_bytes());
                }
            }
        }
    }

    fn apply_write(&mut self, register: u8, bytes: &[u8]) {
        let start = register as usize;
        self.regs[start..start + bytes.len()].copy_from_slice(bytes);
        match (register, bytes) {
            (0xC3, [0x01, ..]) => {
                self.triggers += 1;
                self.filter_at_trigger = Some(self.filter_state());
                self.measuring_until = Some(self.now_us + self.cycle_us);
            }
            (0xA3, [0xFF, ..]) => {
                self.restarts += 1;
                self.measuring_until = None;
                self.calibrating = None;
            }
            (0x9D, _) => self.regs[0..2].fill(0),
            (0x82, [hi, lo, ..]) => {
                let command = u16::from_be_bytes([*hi, *lo]);
                let kind = [
                    CalibrationKind::FactoryRestore,
                    CalibrationKind::ForcedAbc,
                    CalibrationKind::Target(0),
                    CalibrationKind::Background,
                    CalibrationKind::Zero,
                ]
                .into_iter()
                .find(|k| k.command() == command);
                if let (Some(kind), true) = (kind, self.calibration_completes) {
                    self.calibrating = Some((self.now_us + self.calibration_us, kind.completion_flag()));
                }
            }
            _ => {}
        }
    }
}

impl S11Timer for SimSensor {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.now_us)
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms) * 1000);
    }
}

impl S11Transport for SimSensor {
    type Error = MockCommError;

    fn read(&mut self, device: SensorAddress, register: u8, buf: &mut [u8]) -> nb::Result<usize, MockCommError> {
        assert_eq!(device, SensorAddress::DEFAULT_ADDRESS);
        self.reads += 1;
        if self.would_block > 0 {
            self.would_block -= 1;
            return Err(nb::Error::WouldBlock);
        }
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(nb::Error::Other(MockCommError));
        }
        self.tick();
        let start = register as usize;
        let len = if self.short_reads > 0 {
            self.short_reads -= 1;
            buf.len() - 1
        } else {
            buf.len()
        };
        if start + len > self.regs.len() {
            return Err(nb::Error::Other(MockCommError));
        }
        buf[..len].copy_from_slice(&self.regs[start..start + len]);
        Ok(len)
    }

    fn write(&mut self, device: SensorAddress, register: u8, bytes: &[u8]) -> nb::Result<usize, MockCommError> {
        assert_eq!(device, SensorAddress::DEFAULT_ADDRESS);
        self.writes += 1;
        if self.would_block > 0 {
            self.would_block -= 1;
            return Err(nb::Error::WouldBlock);
        }
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(nb::Error::Other(MockCommError));
        }
        self.tick();
        let mut len = bytes.len();
        if let Some(max) = self.max_write_len {
            len = len.min(max);
        }
        if let Some(quota) = self.accept_write_bytes.as_mut() {
            len = len.min(*quota);
            *quota -= len;
        }
        if register as usize + len > self.regs.len() {
            return Err(nb::Error::Other(MockCommError));
        }
        if len > 0 {
            self.write_log.push((register, bytes[..len].to_vec()));
            self.apply_write(register, &bytes[..len]);
        }
        Ok(len)
    }
}
