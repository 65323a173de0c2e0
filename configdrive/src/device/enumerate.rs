//! Disk enumeration via `sysctl -n kern.disks`.

use std::ffi::OsString;

use configdrive_shared::constants::commands;

use super::DeviceId;
use crate::util::{CommandRunner, run_checked};

/// List the disks the kernel currently knows about, in reported order.
///
/// Returns an empty list if the query fails; enumeration is one step in a
/// fallback chain and must not abort discovery.
pub fn list_devices(runner: &dyn CommandRunner, sysctl_program: &str) -> Vec<DeviceId> {
    let args = [OsString::from("-n"), OsString::from(commands::KERN_DISKS)];

    match run_checked(runner, sysctl_program, &args) {
        Ok(output) => {
            let devices: Vec<DeviceId> =
                output.stdout.split_whitespace().map(DeviceId::from).collect();
            tracing::debug!("Found {} disks: {:?}", devices.len(), devices);
            devices
        }
        Err(e) => {
            tracing::debug!("Disk enumeration failed, assuming none: {}", e);
            Vec::new()
        }
    }
}
