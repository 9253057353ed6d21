//! AP33772S USB-PD sink controller (I2C)
//!
//! The AP33772S runs the PD policy engine and Type-C attach on its own and
//! exposes the result as a register map: the source's capability table,
//! a request register that triggers a negotiation, and a result register
//! reporting the outcome.
//!
//! # Protocol
//!
//! - 7-bit address 0x52, 400 kHz
//! - Write: register byte followed by data bytes
//! - Read: register byte, repeated start, data bytes
//! - Multi-byte registers are little-endian

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use heapless::Vec;

use pdbox_core::config::{DeviceConfig, NtcCalibration};
use pdbox_core::pdo::{
    CapabilityTable, InvalidRequest, NegotiationRequest, Pdo, PowerRange, SourceCapability,
    MIN_CURRENT_MA, PDO_SLOTS, TABLE_BYTES,
};
use pdbox_core::traits::PowerSource;

/// 7-bit I2C address
pub const ADDRESS: u8 = 0x52;

/// AP33772S register addresses
pub mod reg {
    /// Status flags (clear on read)
    pub const STATUS: u8 = 0x01;
    /// Interrupt enable mask
    pub const MASK: u8 = 0x02;
    /// System control (VOUT control field)
    pub const SYSTEM: u8 = 0x06;
    /// Thermistor resistance at 25 °C
    pub const TR25: u8 = 0x0C;
    /// Thermistor resistance at 50 °C
    pub const TR50: u8 = 0x0D;
    /// Thermistor resistance at 75 °C
    pub const TR75: u8 = 0x0E;
    /// Thermistor resistance at 100 °C
    pub const TR100: u8 = 0x0F;
    /// Measured VOUT, 80 mV/LSB
    pub const VOLTAGE: u8 = 0x11;
    /// Measured current, 24 mA/LSB
    pub const CURRENT: u8 = 0x12;
    /// NTC temperature in °C
    pub const TEMP: u8 = 0x13;
    /// Negotiated voltage, 50 mV/LSB
    pub const VREQ: u8 = 0x14;
    /// Negotiated current, 10 mA/LSB
    pub const IREQ: u8 = 0x15;
    /// Minimum selectable voltage, 200 mV/LSB
    pub const VSELMIN: u8 = 0x16;
    /// All 13 source PDOs
    pub const SRCPDO: u8 = 0x20;
    /// Negotiation request
    pub const PD_REQMSG: u8 = 0x31;
    /// PD command message
    pub const PD_CMDMSG: u8 = 0x32;
    /// Result of the last request/command
    pub const PD_MSGRLT: u8 = 0x33;

    /// VOUT governed by the controller with UVP/OVP/OCP/OTP active
    pub const VOUTCTL_AUTO: u8 = 0;
    /// VOUT forced off
    pub const VOUTCTL_FORCE_OFF: u8 = 1;
    /// VOUT forced on, bypassing every protection
    pub const VOUTCTL_FORCE_ON: u8 = 2;
    pub const VOUTCTL_MASK: u8 = 0b11;

    /// PD_MSGRLT response codes (bits 1:0)
    pub const RESPONSE_BUSY: u8 = 0;
    pub const RESPONSE_SUCCESS: u8 = 1;
    pub const RESPONSE_MASK: u8 = 0b11;
}

/// Result register polls before a request counts as timed out
const MAX_RESULT_POLLS: u32 = 100;

/// Delay between result register polls
const RESULT_POLL_INTERVAL_MS: u32 = 5;

/// Polls of the status register while waiting for the first capability table
const CAPABILITY_WAIT_POLLS: u32 = 30;
const CAPABILITY_WAIT_INTERVAL_MS: u32 = 100;

/// AP33772S errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdError {
    /// Bus transfer failed or came back short
    Transport,
    /// Source answered the request with a non-success response code
    Rejected(u8),
    /// No response within the polling budget
    Busy,
    /// Voltage or current below the negotiable floor
    InvalidArgument,
    /// PDO index past the end of the table
    IndexOutOfRange,
}

impl From<InvalidRequest> for PdError {
    fn from(err: InvalidRequest) -> Self {
        match err {
            InvalidRequest::IndexOutOfRange => PdError::IndexOutOfRange,
            InvalidRequest::VoltageBelowFloor | InvalidRequest::CurrentBelowFloor => {
                PdError::InvalidArgument
            }
        }
    }
}

/// Decoded STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Controller finished its own start-up
    pub started: bool,
    /// Ready for commands
    pub ready: bool,
    /// A new capability table is available
    pub new_pdo: bool,
    /// Under-voltage protection tripped
    pub uvp: bool,
    /// Over-voltage protection tripped
    pub ovp: bool,
    /// Over-current protection tripped
    pub ocp: bool,
    /// Over-temperature protection tripped
    pub otp: bool,
}

impl Status {
    /// Parse the raw register value
    pub fn from_register(value: u8) -> Self {
        Self {
            started: (value & (1 << 0)) != 0,
            ready: (value & (1 << 1)) != 0,
            new_pdo: (value & (1 << 2)) != 0,
            uvp: (value & (1 << 3)) != 0,
            ovp: (value & (1 << 4)) != 0,
            ocp: (value & (1 << 5)) != 0,
            otp: (value & (1 << 6)) != 0,
        }
    }

    /// Check if any protection has tripped
    pub fn has_fault(&self) -> bool {
        self.uvp || self.ovp || self.ocp || self.otp
    }
}

/// AP33772S driver
pub struct Ap33772s<I2C, D> {
    i2c: I2C,
    delay: D,
    /// Last capability table read from the controller
    table: CapabilityTable,
}

impl<I2C, D> Ap33772s<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a new driver; no bus traffic until the first call
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            table: CapabilityTable::default(),
        }
    }

    /// Release the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read(&mut self, register: u8, buf: &mut [u8]) -> Result<(), PdError> {
        self.i2c
            .write_read(ADDRESS, &[register], buf)
            .map_err(|_| PdError::Transport)
    }

    fn write(&mut self, register: u8, data: &[u8]) -> Result<(), PdError> {
        let mut frame = [0u8; 3];
        let len = data.len().min(2) + 1;
        frame[0] = register;
        frame[1..len].copy_from_slice(&data[..len - 1]);
        self.i2c
            .write(ADDRESS, &frame[..len])
            .map_err(|_| PdError::Transport)
    }

    /// Write raw bytes to any register
    ///
    /// Escape hatch for settings the typed API deliberately leaves out,
    /// such as [`reg::VOUTCTL_FORCE_ON`].
    pub fn write_raw(&mut self, register: u8, data: &[u8]) -> Result<(), PdError> {
        if data.len() > 2 {
            return Err(PdError::InvalidArgument);
        }
        self.write(register, data)
    }

    /// Read and decode the STATUS register
    pub fn status(&mut self) -> Result<Status, PdError> {
        let mut buf = [0u8; 1];
        self.read(reg::STATUS, &mut buf)?;
        Ok(Status::from_register(buf[0]))
    }

    /// Check the new-capabilities flag (STATUS bit 2)
    ///
    /// Single non-blocking read; a bus error reads as "not yet".
    pub fn new_capabilities_available(&mut self) -> bool {
        self.status().map(|s| s.new_pdo).unwrap_or(false)
    }

    /// Poll for the new-capabilities flag up to `attempts` times
    pub fn wait_for_capabilities(&mut self, attempts: u32, interval_ms: u32) -> bool {
        for _ in 0..attempts {
            if self.new_capabilities_available() {
                return true;
            }
            self.delay.delay_ms(interval_ms);
        }
        false
    }

    /// Read all 13 capability words in one transfer
    ///
    /// The table's `count()` is the number of offered slots. A failed or
    /// short read is an error; callers fall back to an empty table.
    pub fn fetch_capability_table(&mut self) -> Result<CapabilityTable, PdError> {
        let mut buf = [0u8; TABLE_BYTES];
        self.read(reg::SRCPDO, &mut buf)?;
        self.table = CapabilityTable::from_le_bytes(&buf);
        Ok(self.table)
    }

    /// Capability table from the last successful fetch
    pub fn capability_table(&self) -> &CapabilityTable {
        &self.table
    }

    /// Decode slot `index` into a descriptor
    ///
    /// When `probe` is set, a programmable slot that does not encode its
    /// minimum voltage is probed with trial negotiations (see
    /// [`Ap33772s::probe_min_voltage`]). Otherwise, or if no candidate is
    /// accepted, the minimum falls back to the region's probe ceiling.
    pub fn decode(&mut self, index: usize, table: &CapabilityTable, probe: bool) -> Option<Pdo> {
        let cap = SourceCapability::decode(index, table)?;
        let probed = match cap.programmable() {
            Some(p) if probe && cap.needs_probe() => self.probe_min_voltage(index, p.range),
            _ => None,
        };
        Some(Pdo::from_capability(index as u8, &cap, probed))
    }

    /// Discover the lowest voltage slot `index` accepts
    ///
    /// Forces VOUT off first and gives up if that fails. Candidates run
    /// from the region floor to the probe ceiling in region steps at
    /// 1000 mA; the source is left negotiated at the first accepted one,
    /// or un-negotiated if none is.
    pub fn probe_min_voltage(&mut self, index: usize, range: PowerRange) -> Option<u16> {
        self.set_output_enable(false).ok()?;
        range
            .probe_candidates()
            .find(|&mv| self.request_output(index, mv, MIN_CURRENT_MA).is_ok())
    }

    /// Fetch the table and decode every offered slot
    pub fn read_profiles(&mut self, probe: bool) -> Vec<Pdo, PDO_SLOTS> {
        let table = self.fetch_capability_table().unwrap_or_default();
        let mut profiles = Vec::new();
        for index in table.offered() {
            if let Some(pdo) = self.decode(index, &table, probe) {
                let _ = profiles.push(pdo);
            }
        }
        profiles
    }

    /// Negotiate a voltage and current on slot `index`
    ///
    /// Arguments below the floors or past the table are rejected before
    /// any bus traffic. Succeeds only if the result register reports
    /// success within the polling budget.
    pub fn request_output(
        &mut self,
        index: usize,
        voltage_mv: u16,
        current_ma: u16,
    ) -> Result<(), PdError> {
        let request = NegotiationRequest::new(index, voltage_mv, current_ma)?;
        self.write(reg::PD_REQMSG, &request.to_le_bytes())?;

        for _ in 0..MAX_RESULT_POLLS {
            let mut buf = [0u8; 1];
            self.read(reg::PD_MSGRLT, &mut buf)?;
            match buf[0] & reg::RESPONSE_MASK {
                reg::RESPONSE_BUSY => self.delay.delay_ms(RESULT_POLL_INTERVAL_MS),
                reg::RESPONSE_SUCCESS => return Ok(()),
                code => return Err(PdError::Rejected(code)),
            }
        }
        Err(PdError::Busy)
    }

    /// Enable VOUT under controller supervision, or force it off
    ///
    /// Only the VOUTCTL field of SYSTEM changes; the other bits are
    /// written back as read.
    pub fn set_output_enable(&mut self, enable: bool) -> Result<(), PdError> {
        let voutctl = if enable {
            reg::VOUTCTL_AUTO
        } else {
            reg::VOUTCTL_FORCE_OFF
        };
        let mut system = [0u8; 1];
        self.read(reg::SYSTEM, &mut system)?;
        let value = (system[0] & !reg::VOUTCTL_MASK) | (voutctl & reg::VOUTCTL_MASK);
        self.write(reg::SYSTEM, &[value])
    }

    /// Write the four thermistor calibration words
    ///
    /// Stops at the first failed write; words already written stay.
    pub fn set_thermistor_calibration(&mut self, ntc: &NtcCalibration) -> Result<(), PdError> {
        let words = [
            (reg::TR25, ntc.r25),
            (reg::TR50, ntc.r50),
            (reg::TR75, ntc.r75),
            (reg::TR100, ntc.r100),
        ];
        for (register, ohms) in words {
            self.write(register, &ohms.to_le_bytes())?;
        }
        Ok(())
    }

    /// Program the minimum selectable voltage (200 mV per count)
    pub fn set_minimum_selectable_voltage(&mut self, voltage_mv: u16) -> Result<(), PdError> {
        let count = (voltage_mv / 200).min(u8::MAX as u16) as u8;
        self.write(reg::VSELMIN, &[count])
    }

    /// NTC temperature in °C
    pub fn read_temperature(&mut self) -> Result<u8, PdError> {
        let mut buf = [0u8; 1];
        self.read(reg::TEMP, &mut buf)?;
        Ok(buf[0])
    }

    /// Apply the board configuration and leave the output off
    pub fn configure(&mut self, config: &DeviceConfig) -> Result<(), PdError> {
        self.set_thermistor_calibration(&config.ntc)?;
        self.set_minimum_selectable_voltage(config.min_selectable_mv)?;
        self.set_output_enable(false)
    }

    /// Start-up sequence
    ///
    /// Waits (bounded) for the first capability table, configures the
    /// controller and returns the decoded profiles. A source that never
    /// reports capabilities yields an empty list, not an error.
    pub fn init(&mut self, config: &DeviceConfig) -> Result<Vec<Pdo, PDO_SLOTS>, PdError> {
        self.wait_for_capabilities(CAPABILITY_WAIT_POLLS, CAPABILITY_WAIT_INTERVAL_MS);
        self.configure(config)?;
        Ok(self.read_profiles(config.probe_min_voltage))
    }
}

impl<I2C, D> PowerSource for Ap33772s<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = PdError;

    fn request_output(&mut self, index: u8, voltage_mv: u16, current_ma: u16) -> Result<(), PdError> {
        Ap33772s::request_output(self, index as usize, voltage_mv, current_ma)
    }

    fn set_output_enable(&mut self, enable: bool) -> Result<(), PdError> {
        Ap33772s::set_output_enable(self, enable)
    }

    fn read_temperature(&mut self) -> Result<u8, PdError> {
        Ap33772s::read_temperature(self)
    }
}
