//! Dimmable output devices.

use std::fs;
use std::io;
use std::path::PathBuf;

/// A dimmable light output.
///
/// Values are linear duty fractions in `[0, 1]`; brightness correction has
/// already been applied by the caller. Implementations clamp out-of-range
/// values rather than reject them.
pub trait Light: Send {
    fn set_value(&mut self, value: f64) -> io::Result<()>;

    fn on(&mut self) -> io::Result<()> {
        self.set_value(1.0)
    }

    fn off(&mut self) -> io::Result<()> {
        self.set_value(0.0)
    }

    fn toggle(&mut self) -> io::Result<()> {
        if self.is_lit() {
            self.off()
        } else {
            self.on()
        }
    }

    fn is_lit(&self) -> bool;

    /// Last value successfully driven to the hardware.
    fn value(&self) -> f64;
}

/// Light backed by a sysfs brightness attribute (`/sys/class/leds/*/brightness`
/// or a PWM duty file). The fraction is scaled to the device's integer range.
pub struct SysfsLight {
    path: PathBuf,
    max_value: u32,
    value: f64,
}

impl SysfsLight {
    pub fn new(path: PathBuf, max_value: u32) -> Self {
        Self {
            path,
            max_value,
            value: 0.0,
        }
    }
}

impl Light for SysfsLight {
    fn set_value(&mut self, value: f64) -> io::Result<()> {
        let clamped = value.clamp(0.0, 1.0);
        let duty = (clamped * f64::from(self.max_value)).round() as u32;
        fs::write(&self.path, format!("{duty}\n"))?;
        self.value = clamped;
        Ok(())
    }

    fn is_lit(&self) -> bool {
        self.value > 0.0
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// In-memory light recording every value driven to it. Clones share the
/// record, so a test can keep a handle while the engine owns the light.
#[cfg(test)]
#[derive(Clone)]
pub struct MemoryLight {
    record: std::sync::Arc<std::sync::Mutex<Vec<f64>>>,
    fail: bool,
}

#[cfg(test)]
impl MemoryLight {
    pub fn new() -> Self {
        Self {
            record: Default::default(),
            fail: false,
        }
    }

    /// A light whose output refuses every value.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn history(&self) -> Vec<f64> {
        self.record.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Light for MemoryLight {
    fn set_value(&mut self, value: f64) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::other("output refused the value"));
        }
        self.record.lock().unwrap().push(value.clamp(0.0, 1.0));
        Ok(())
    }

    fn is_lit(&self) -> bool {
        self.value() > 0.0
    }

    fn value(&self) -> f64 {
        self.record.lock().unwrap().last().copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sysfs_light_writes_scaled_duty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brightness");
        fs::write(&path, "0\n").unwrap();

        let mut light = SysfsLight::new(path.clone(), 255);
        light.set_value(0.5).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "128\n");
        assert!(light.is_lit());

        light.off().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0\n");
        assert!(!light.is_lit());
    }

    #[test]
    fn sysfs_light_clamps_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brightness");

        let mut light = SysfsLight::new(path.clone(), 100);
        light.set_value(1.7).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "100\n");
        assert_eq!(light.value(), 1.0);
    }

    #[test]
    fn toggle_flips_between_full_and_off() {
        let mut light = MemoryLight::new();
        light.toggle().unwrap();
        assert!(light.is_lit());
        light.toggle().unwrap();
        assert!(!light.is_lit());
        assert_eq!(light.history(), vec![1.0, 0.0]);
    }
}
