//! Sensor adapter trait

/// Errors that can occur while reading rig sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device did not identify itself at startup
    NotDetected,
    /// Bus transaction failed
    Bus,
    /// Device did not become ready in time
    Timeout,
    /// Conversion not ready yet
    NotReady,
}

/// Trait for the dynamometer's measurement front end
///
/// Takes `&mut self` because reads drive a bus or bit-bang pins.
pub trait SensorAdapter {
    /// Shunt current in amps
    fn read_current(&mut self) -> Result<f32, SensorError>;

    /// Bus voltage in volts
    fn read_bus_voltage(&mut self) -> Result<f32, SensorError>;

    /// Load cell force in calibrated units
    fn read_force(&mut self) -> Result<f32, SensorError>;
}
