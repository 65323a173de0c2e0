//! Device discovery.
//!
//! Provides the inputs of the CD-ROM probe:
//! - Enumerate: disk names known to the kernel (`sysctl -n kern.disks`)
//! - Label: config drive signature check (`glabel status -s <device>`)
//!
//! Both are best effort. A failed query means "nothing here", never an error.

mod enumerate;
mod label;

use std::fmt;
use std::path::{Path, PathBuf};

pub use enumerate::list_devices;
pub use label::is_config_drive_device;

/// Raw device name as the kernel reports it, e.g. `cd0` or `vtbd0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Device node path under `device_dir`, e.g. `/dev/cd0`.
    pub fn path_in(&self, device_dir: &Path) -> PathBuf {
        device_dir.join(&self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_in_device_dir() {
        let dev = DeviceId::from("cd0");
        assert_eq!(dev.path_in(Path::new("/dev")), PathBuf::from("/dev/cd0"));
        assert_eq!(dev.to_string(), "cd0");
    }
}
