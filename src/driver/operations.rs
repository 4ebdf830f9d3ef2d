// src/driver/operations.rs

use super::{state::PendingMeasurement, state::Phase, state::ReadyCache, RestartRequired, S11};
use crate::common::{
    codec::{self, FieldValue},
    error::{CommFault, InitFault, S11Error},
    hal_traits::{S11Timer, S11Transport},
    timing,
    registers::{
        Field, CLEAR_ERROR_STATUS_COMMAND, SETTINGS_BLOCK_LEN, SETTINGS_BLOCK_START, SETTINGS_SEGMENTS,
        SOFT_RESET_COMMAND, START_SINGLE_MEASUREMENT_COMMAND,
    },
    types::{
        CalStatus, CalibrationKind, CalibrationResult, FilterState, FirmwareRevision, Measurement,
        MeasurementMode, ProductCode, SensorInfo, Settings, Status,
    },
};

impl<IF> S11<IF>
where
    IF: S11Transport + S11Timer,
{
    // --- Lifecycle ---

    /// Identifies the sensor and loads its settings.
    ///
    /// This is the only operation allowed on an uninitialized device. On any
    /// failure the device is left uninitialized and the cause is reported as
    /// [`S11Error::Init`]; a blank product code counts as "not identified".
    pub fn init(&mut self) -> Result<SensorInfo, S11Error<IF::Error>> {
        debug!("init sensor at {:#x}", self.address.as_u8());
        self.phase = Phase::Uninitialized;

        let info = self.read_identity().map_err(S11Error::into_init)?;
        if info.product_code.is_blank() {
            warn!("sensor at {:#x} reports a blank product code", self.address.as_u8());
            return Err(S11Error::Init(InitFault::Unidentified));
        }
        let settings = self.read_settings().map_err(S11Error::into_init)?;

        debug!(
            "sensor {} firmware {}.{} id {:#x}",
            info.product_code.as_str(),
            info.firmware.main,
            info.firmware.sub,
            info.sensor_id
        );
        self.phase = Phase::Ready(ReadyCache::new(info, settings));
        Ok(info)
    }

    /// Soft-resets the sensor, waits for it to come back and drops all cached
    /// state. The device must be initialized again afterwards.
    ///
    /// The device is uninitialized afterwards even if the reset command failed,
    /// since it is unknown whether the sensor received it.
    pub fn restart(&mut self) -> Result<(), S11Error<IF::Error>> {
        self.ready()?;
        debug!("restarting sensor at {:#x}", self.address.as_u8());
        let sent = self.write_field(Field::SoftReset, FieldValue::U8(SOFT_RESET_COMMAND));
        self.phase = Phase::Uninitialized;
        sent?;
        self.wait(self.config.restart_settle);
        Ok(())
    }

    // --- Status and identity ---

    /// Reads the error status and refreshes the cached copy.
    pub fn get_status(&mut self) -> Result<Status, S11Error<IF::Error>> {
        self.ready()?;
        let status = Status::from_bits(self.read_u16(Field::ErrorStatus)?);
        trace!("error status {:#x}", status.bits());
        self.ready_mut()?.status = Some(status);
        Ok(status)
    }

    /// Writes the clear command to the error status. The cached status is not
    /// touched; call [`get_status`](S11::get_status) to refresh it.
    pub fn clear_error_status(&mut self) -> Result<(), S11Error<IF::Error>> {
        self.ready()?;
        self.write_field(Field::ClearErrorStatus, FieldValue::U8(CLEAR_ERROR_STATUS_COMMAND))
    }

    /// Re-reads the identity registers and checks them against the values read
    /// at `init`.
    pub fn get_sensor_info(&mut self) -> Result<SensorInfo, S11Error<IF::Error>> {
        self.ready()?;
        let info = self.read_identity()?;
        if let Some(field) = self.ready()?.info.first_difference(&info) {
            warn!("{} changed since init", field);
            return Err(S11Error::Consistency { field });
        }
        Ok(info)
    }

    // --- Calibration ---

    /// Reads the calibration status register.
    pub fn get_cal_status(&mut self) -> Result<CalStatus, S11Error<IF::Error>> {
        self.ready()?;
        let cal_status = CalStatus::from_bits(self.read_u8(Field::CalibrationStatus)?);
        self.ready_mut()?.cal_status = Some(cal_status);
        Ok(cal_status)
    }

    /// Runs one of the sensor's calibration routines and waits for it.
    ///
    /// The sensor calibrates on its next measurement; in single measurement
    /// mode the driver triggers that measurement itself, writing the filter
    /// state back first. Fails with [`S11Error::CalibrationTimeout`] if the
    /// completion bit does not appear within the calibration timeout, leaving
    /// cached state untouched.
    ///
    /// A calibration error bit already set before the command is not counted
    /// against this calibration.
    pub fn calibrate(&mut self, kind: CalibrationKind) -> Result<CalibrationResult, S11Error<IF::Error>> {
        let mode = self.ready()?.running.measurement_mode;
        let target = match kind {
            CalibrationKind::Target(ppm) => Some(
                codec::encode(Field::CalibrationTarget, &FieldValue::U16(ppm)).map_err(S11Error::Encoding)?,
            ),
            _ => None,
        };
        debug!("calibration command {:#x}", kind.command());

        let status_before = Status::from_bits(self.read_u16(Field::ErrorStatus)?);
        self.write_field(Field::CalibrationStatus, FieldValue::U8(0))?;
        if let Some(target) = target {
            self.write_raw(Field::CalibrationTarget, &target)?;
        }
        self.write_field(Field::CalibrationCommand, FieldValue::U16(kind.command()))?;
        let triggered = if mode == MeasurementMode::Single {
            let count = self.trigger_measurement()?;
            Some(PendingMeasurement { count, triggered_at: self.interface.now() })
        } else {
            None
        };

        let deadline = self.interface.now() + self.config.calibration_timeout;
        let cal_status = loop {
            self.wait(self.config.calibration_poll_interval);
            let cal_status = CalStatus::from_bits(self.read_u8(Field::CalibrationStatus)?);
            if cal_status.contains(kind.completion_flag()) {
                break cal_status;
            }
            if self.interface.now() >= deadline {
                warn!("calibration status stuck at {:#x}", cal_status.bits());
                return Err(S11Error::CalibrationTimeout);
            }
        };

        let status = Status::from_bits(self.read_u16(Field::ErrorStatus)?);
        let newly_failed =
            status.contains(Status::CALIBRATION_ERROR) && !status_before.contains(Status::CALIBRATION_ERROR);
        let result = CalibrationResult {
            kind,
            success: !newly_failed,
            cal_status,
            status,
        };
        debug!("calibration finished, success {}", result.success);

        let cache = self.ready_mut()?;
        cache.cal_status = Some(cal_status);
        cache.calibration = Some(result);
        if triggered.is_some() {
            cache.pending = triggered;
        }
        Ok(result)
    }

    // --- Measurement ---

    /// Triggers a single measurement.
    ///
    /// The cached filter state (from [`get_state_data`](S11::get_state_data))
    /// is written back before the trigger so the sensor's filters continue
    /// across measurements.
    pub fn start_meas(&mut self) -> Result<(), S11Error<IF::Error>> {
        if self.ready()?.running.measurement_mode != MeasurementMode::Single {
            warn!("start_meas while the sensor is not in single measurement mode");
        }
        let count = self.trigger_measurement()?;
        let triggered_at = self.interface.now();
        self.ready_mut()?.pending = Some(PendingMeasurement { count, triggered_at });
        Ok(())
    }

    /// Reads the measurement results.
    ///
    /// A measurement is handed out as valid once. If the sensor's measurement
    /// counter has not moved since the trigger or since the last valid read,
    /// or a sensor in single mode has not measured since `init`, the cached
    /// measurement is marked invalid and [`S11Error::MeasurementNotReady`] is
    /// returned.
    pub fn get_meas_data(&mut self) -> Result<Measurement, S11Error<IF::Error>> {
        self.ready()?;
        let raw = self.read_raw(Field::MeasurementBlock)?;
        let mut measurement = Measurement::from_block(&raw).map_err(S11Error::Decoding)?;

        let now = self.interface.now();
        let cycle = self.config.measurement_cycle;
        let cache = self.ready_mut()?;
        let fresh = match (cache.pending, cache.consumed) {
            (Some(pending), _) => {
                if pending.count == measurement.count && now - pending.triggered_at > cycle {
                    warn!("measurement overdue, count still {}", measurement.count);
                }
                pending.count != measurement.count
            }
            (None, Some(last)) => last != measurement.count,
            (None, None) => cache.running.measurement_mode != MeasurementMode::Single,
        };
        if !fresh {
            cache.measurement = Some(measurement);
            return Err(S11Error::MeasurementNotReady);
        }
        measurement.valid = true;
        cache.pending = None;
        cache.consumed = Some(measurement.count);
        cache.measurement = Some(measurement);
        Ok(measurement)
    }

    /// Triggers a measurement, waits for it and reads the results and the new
    /// filter state.
    ///
    /// Waits at most the configured measurement cycle before giving up with
    /// [`S11Error::MeasurementNotReady`].
    pub fn measure(&mut self) -> Result<Measurement, S11Error<IF::Error>> {
        self.start_meas()?;
        let deadline = self.interface.now() + self.config.measurement_cycle;
        let measurement = loop {
            self.wait(timing::MEASUREMENT_POLL_INTERVAL);
            match self.get_meas_data() {
                Ok(measurement) => break measurement,
                Err(S11Error::MeasurementNotReady) if self.interface.now() < deadline => continue,
                Err(e) => return Err(e),
            }
        };
        self.get_state_data()?;
        Ok(measurement)
    }

    /// Reads the ABC + IIR filter state into the cache, unmodified.
    pub fn get_state_data(&mut self) -> Result<FilterState, S11Error<IF::Error>> {
        self.ready()?;
        let raw = self.read_raw(Field::StateData)?;
        let state = FilterState::from_bytes(&raw).map_err(S11Error::Decoding)?;
        self.ready_mut()?.filter_state = Some(state);
        Ok(state)
    }

    /// Forgets the cached filter state. The next measurement starts its
    /// filters from scratch.
    pub fn clear_filter_state(&mut self) -> Result<(), S11Error<IF::Error>> {
        self.ready_mut()?.filter_state = None;
        Ok(())
    }

    /// Sets the barometric pressure used for pressure compensation, in 0.1 hPa.
    pub fn set_pressure(&mut self, deci_hpa: u16) -> Result<(), S11Error<IF::Error>> {
        self.ready()?;
        self.write_field(Field::BarometricPressure, FieldValue::U16(deci_hpa))
    }

    // --- Settings ---

    /// Reads the persisted settings into the cache. The sensor keeps running
    /// with the settings it had at `init` until it is restarted.
    pub fn get_dev_settings(&mut self) -> Result<Settings, S11Error<IF::Error>> {
        self.ready()?;
        let settings = self.read_settings()?;
        self.ready_mut()?.settings = settings;
        Ok(settings)
    }

    /// Writes every setting to the sensor's EEPROM.
    ///
    /// All fields are encoded before anything is sent. The sensor is never
    /// restarted here; the returned [`RestartRequired`] is a reminder that the
    /// new values take effect only after [`restart`](S11::restart).
    pub fn set_dev_settings(&mut self, settings: &Settings) -> Result<RestartRequired, S11Error<IF::Error>> {
        self.ready()?;
        let block = settings.to_block().map_err(S11Error::Encoding)?;
        let expected: usize = SETTINGS_SEGMENTS.iter().map(|(_, len)| len).sum();
        let mut written = 0;

        for (first, len) in SETTINGS_SEGMENTS {
            let offset = (first.address() - SETTINGS_BLOCK_START) as usize;
            if let Err(stall) = self.write_bytes(first, first.address(), &block[offset..offset + len]) {
                written += stall.written;
                let nothing_landed = written == 0 && !matches!(stall.fault, CommFault::ShortWrite { .. });
                return Err(if nothing_landed {
                    S11Error::Communication(stall.fault)
                } else {
                    S11Error::SettingsWriteIncomplete { written, expected }
                });
            }
            written += len;
        }
        self.wait(self.config.eeprom_settle);

        debug!("settings written, restart required");
        let cache = self.ready_mut()?;
        cache.settings = *settings;
        cache.restart_pending = true;
        Ok(RestartRequired)
    }

    // --- Sequences shared by several operations ---

    fn read_identity(&mut self) -> Result<SensorInfo, S11Error<IF::Error>> {
        let firmware_type = self.read_u8(Field::FirmwareType)?;
        let firmware = FirmwareRevision::from(self.read_u16(Field::FirmwareRevision)?);
        let sensor_id = self.read_u32(Field::SensorId)?;
        let raw = self.read_raw(Field::ProductCode)?;
        let product_code = ProductCode::decode(&raw).map_err(S11Error::Decoding)?;
        Ok(SensorInfo { firmware_type, firmware, sensor_id, product_code })
    }

    fn read_settings(&mut self) -> Result<Settings, S11Error<IF::Error>> {
        let mut block = [0u8; SETTINGS_BLOCK_LEN];
        self.read_exact(Field::MeasurementMode, SETTINGS_BLOCK_START, &mut block)?;
        Settings::from_block(&block).map_err(S11Error::Decoding)
    }

    /// Snapshots the measurement counter, writes the cached filter state back
    /// and then triggers. Returns the counter value before the trigger.
    fn trigger_measurement(&mut self) -> Result<u8, S11Error<IF::Error>> {
        let raw = self.read_raw(Field::MeasurementBlock)?;
        let count = Measurement::from_block(&raw).map_err(S11Error::Decoding)?.count;
        if let Some(state) = self.ready()?.filter_state {
            self.write_raw(Field::StateData, state.as_bytes())?;
        }
        self.write_field(Field::StartSingleMeasurement, FieldValue::U8(START_SINGLE_MEASUREMENT_COMMAND))?;
        trace!("measurement triggered at count {}", count);
        Ok(count)
    }
}
