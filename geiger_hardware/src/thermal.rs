//! Board temperature from a Linux sysfs thermal zone.
use std::path::{Path, PathBuf};

use geiger_traits::{BoxError, TemperatureProbe};

use crate::error::{HwError, Result};

/// CPU thermal zone on a Raspberry Pi.
pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reads a sysfs `temp` file holding millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZone {
    path: PathBuf,
}

impl ThermalZone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default zone, if this machine has one.
    pub fn detect() -> Option<Self> {
        Path::new(DEFAULT_THERMAL_ZONE)
            .exists()
            .then(|| Self::new(DEFAULT_THERMAL_ZONE))
    }

    pub fn read_celsius(&self) -> Result<f64> {
        let text = std::fs::read_to_string(&self.path)?;
        let milli: i32 = text
            .trim()
            .parse()
            .map_err(|_| HwError::Thermal(text.trim().to_string()))?;
        Ok(f64::from(milli) / 1000.0)
    }
}

impl TemperatureProbe for ThermalZone {
    fn celsius(&mut self) -> std::result::Result<f64, BoxError> {
        Ok(self.read_celsius()?)
    }
}
