//! PD source and power monitor traits

/// A negotiated USB-PD source with a switchable output
///
/// Every call talks to the peripheral and may fail; the control loop
/// treats any error as "not applied" and keeps the previous state.
pub trait PowerSource {
    type Error;

    /// Negotiate `voltage_mv` / `current_ma` on capability slot `index`
    fn request_output(&mut self, index: u8, voltage_mv: u16, current_ma: u16)
        -> Result<(), Self::Error>;

    /// Switch the output on (with protections active) or force it off
    fn set_output_enable(&mut self, enable: bool) -> Result<(), Self::Error>;

    /// Controller NTC temperature in °C
    fn read_temperature(&mut self) -> Result<u8, Self::Error>;
}

impl<T: PowerSource + ?Sized> PowerSource for &mut T {
    type Error = T::Error;

    fn request_output(&mut self, index: u8, voltage_mv: u16, current_ma: u16)
        -> Result<(), Self::Error> {
        (**self).request_output(index, voltage_mv, current_ma)
    }

    fn set_output_enable(&mut self, enable: bool) -> Result<(), Self::Error> {
        (**self).set_output_enable(enable)
    }

    fn read_temperature(&mut self) -> Result<u8, Self::Error> {
        (**self).read_temperature()
    }
}

/// Output voltage and current sensor
pub trait PowerMonitor {
    type Error;

    /// Bus voltage in millivolts
    fn bus_voltage_mv(&mut self) -> Result<u32, Self::Error>;

    /// Load current in milliamps (negative when current flows backwards)
    fn current_ma(&mut self) -> Result<i32, Self::Error>;
}
