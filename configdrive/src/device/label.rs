//! Config drive label check via `glabel status -s <device>`.

use std::ffi::OsString;

use super::DeviceId;
use crate::util::{CommandRunner, run_checked};

/// Whether `device` carries the config drive label.
///
/// `glabel status -s cd0` prints e.g. `iso9660/config-2  N/A  cd0`; the device
/// matches when that output starts with `signature`. Query failures (missing
/// device, no permission, no label) count as no match.
pub fn is_config_drive_device(
    runner: &dyn CommandRunner,
    glabel_program: &str,
    device: &DeviceId,
    signature: &str,
) -> bool {
    let args = [
        OsString::from("status"),
        OsString::from("-s"),
        OsString::from(device.as_str()),
    ];

    match run_checked(runner, glabel_program, &args) {
        Ok(output) => {
            let matched = output.stdout.trim_start().starts_with(signature);
            tracing::debug!("Device {} config drive label: {}", device, matched);
            matched
        }
        Err(e) => {
            tracing::debug!("Label query for {} failed: {}", device, e);
            false
        }
    }
}
