// src/driver/state.rs

use crate::common::types::{
    CalStatus, CalibrationResult, FilterState, Measurement, SensorInfo, Settings, Status,
};

/// A triggered measurement the sensor has not delivered yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PendingMeasurement<I> {
    /// Sensor measurement counter read just before the trigger.
    pub count: u8,
    pub triggered_at: I,
}

/// Everything the driver knows about an identified sensor.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadyCache<I> {
    pub info: SensorInfo,
    /// Settings as stored in EEPROM, last read or written.
    pub settings: Settings,
    /// Settings the sensor runs with, read at `init`. Writes take effect only
    /// after a restart, so this drives measurement sequencing.
    pub running: Settings,
    pub status: Option<Status>,
    pub cal_status: Option<CalStatus>,
    pub calibration: Option<CalibrationResult>,
    pub measurement: Option<Measurement>,
    pub filter_state: Option<FilterState>,
    pub pending: Option<PendingMeasurement<I>>,
    /// Counter of the last measurement handed out as valid.
    pub consumed: Option<u8>,
    pub restart_pending: bool,
}

impl<I> ReadyCache<I> {
    pub fn new(info: SensorInfo, settings: Settings) -> Self {
        ReadyCache {
            info,
            settings,
            running: settings,
            status: None,
            cal_status: None,
            calibration: None,
            measurement: None,
            filter_state: None,
            pending: None,
            consumed: None,
            restart_pending: false,
        }
    }
}

/// Lifecycle of a device. Only `Ready` carries cached sensor data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Phase<I> {
    Uninitialized,
    Ready(ReadyCache<I>),
}

impl<I> Phase<I> {
    pub fn cache(&self) -> Option<&ReadyCache<I>> {
        match self {
            Phase::Ready(cache) => Some(cache),
            Phase::Uninitialized => None,
        }
    }

    pub fn cache_mut(&mut self) -> Option<&mut ReadyCache<I>> {
        match self {
            Phase::Ready(cache) => Some(cache),
            Phase::Uninitialized => None,
        }
    }
}
