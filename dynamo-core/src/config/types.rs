//! Configuration type definitions
//!
//! The actuator range, watchdog timeout, and write cadence are the only
//! things that differ between hardware revisions. They are collected in
//! [`HardwareProfile`] so no other component hardcodes bounds or timing.

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min` is greater than `max`
    InvertedRange,
    /// Safe value lies outside `[min, max]`
    SafeOutOfRange,
    /// Startup value lies outside `[min, max]`
    StartupOutOfRange,
    /// Watchdog timeout of zero would trip on every check
    ZeroTimeout,
    /// Throttled write policy with a zero interval
    ZeroInterval,
    /// Load cell scale of zero (or not finite)
    InvalidScale,
}

/// Valid actuator output range
///
/// Unit-agnostic: raw duty for PWM drivers, microseconds for pulse-width
/// ESCs. Invariant `min <= safe <= max` holds for every constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorRange {
    min: i32,
    max: i32,
    safe: i32,
}

impl ActuatorRange {
    /// 8-bit duty output, off when safe
    pub const DUTY_8BIT: Self = Self {
        min: 0,
        max: 255,
        safe: 0,
    };

    /// RC-style ESC pulse width in microseconds, idle when safe
    pub const ESC_PULSE_US: Self = Self {
        min: 1000,
        max: 2000,
        safe: 1000,
    };

    /// Create a validated range
    pub const fn new(min: i32, max: i32, safe: i32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedRange);
        }
        if safe < min || safe > max {
            return Err(ConfigError::SafeOutOfRange);
        }
        Ok(Self { min, max, safe })
    }

    /// Lowest accepted value
    pub const fn min(&self) -> i32 {
        self.min
    }

    /// Highest accepted value
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Value the actuator is forced to on failsafe
    pub const fn safe(&self) -> i32 {
        self.safe
    }

    /// Check if `value` is inside the range
    pub const fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Saturating clamp into `[min, max]`
    pub const fn clamp(&self, value: i32) -> i32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Host watchdog configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogConfig {
    /// Host silence tolerated before failsafe (ms)
    pub timeout_ms: u32,
}

impl WatchdogConfig {
    /// Create a validated watchdog configuration
    pub const fn new(timeout_ms: u32) -> Result<Self, ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self { timeout_ms })
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

/// When the actuator driver writes to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WritePolicy {
    /// Write on every change of the commanded value
    #[default]
    Immediate,
    /// Write at most once per interval; pending values are flushed by
    /// the periodic service call. Forced-safe writes are never delayed.
    Throttled {
        /// Minimum time between hardware writes (ms)
        min_interval_ms: u32,
    },
}

/// Everything that varies between hardware revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareProfile {
    /// Output range and safe value
    pub range: ActuatorRange,
    /// Value written at power-up, before any host command
    pub startup_value: i32,
    /// Host watchdog
    pub watchdog: WatchdogConfig,
    /// Hardware write cadence
    pub write_policy: WritePolicy,
}

impl HardwareProfile {
    /// Brushed motor on a MOSFET/H-bridge PWM input
    pub const DUTY_PWM: Self = Self {
        range: ActuatorRange::DUTY_8BIT,
        startup_value: 0,
        watchdog: WatchdogConfig { timeout_ms: 1000 },
        write_policy: WritePolicy::Immediate,
    };

    /// Brushless motor behind an RC ESC (servo pulse input)
    pub const ESC_PULSE: Self = Self {
        range: ActuatorRange::ESC_PULSE_US,
        startup_value: 1000,
        watchdog: WatchdogConfig { timeout_ms: 2000 },
        write_policy: WritePolicy::Immediate,
    };

    /// Create a validated profile
    ///
    /// A missing startup value defaults to the range's safe value.
    pub fn new(
        range: ActuatorRange,
        startup_value: Option<i32>,
        watchdog: WatchdogConfig,
        write_policy: WritePolicy,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            range,
            startup_value: startup_value.unwrap_or(range.safe()),
            watchdog,
            write_policy,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.range.contains(self.startup_value) {
            return Err(ConfigError::StartupOutOfRange);
        }
        if self.watchdog.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let WritePolicy::Throttled { min_interval_ms: 0 } = self.write_policy {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}
