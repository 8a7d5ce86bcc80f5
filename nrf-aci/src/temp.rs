//! Die temperature and supply voltage readings.

/// A temperature measurement reported by `GetTemperature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub(crate) i16);

impl Temperature {
    /// The integer part of the temperature in degrees Celsius.
    pub fn degrees(self) -> i32 {
        i32::from(self.0) / 4
    }

    /// The fractional part of the temperature in milli-degrees Celsius.
    pub fn millidegrees(self) -> i32 {
        (i32::from(self.0) % 4) * 250
    }

    /// The temperature in degrees Celsius.
    pub fn celsius(self) -> f32 {
        f32::from(self.0) / 4.0
    }

    /// The raw temperature value, in units of 0.25 degrees Celsius.
    pub fn raw(self) -> i16 {
        self.0
    }
}

/// A supply voltage measurement reported by `GetBatteryLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryLevel(pub(crate) u16);

impl BatteryLevel {
    /// The supply voltage in millivolts.
    pub fn millivolts(self) -> u32 {
        u32::from(self.0) * 352 / 100
    }

    /// The supply voltage in volts.
    pub fn volts(self) -> f32 {
        f32::from(self.0) * 0.00352
    }

    /// The raw value, in units of 3.52 mV.
    pub fn raw(self) -> u16 {
        self.0
    }
}
