//! Mount table snapshot.
//!
//! Parses the output of `mount` without arguments. On FreeBSD each mounted
//! filesystem is reported as:
//!
//! ```text
//! /dev/cd0 on /mnt/cdrom (cd9660, local, read-only)
//! ```
//!
//! Only block-device mounts with at least two options after the filesystem
//! type are recorded. Pseudo filesystems (`devfs`, `procfs`) and anything that
//! does not match are skipped.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use configdrive_shared::errors::ConfigDriveResult;
use regex::Regex;

use crate::util::{CommandRunner, run_checked};

static MOUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(/dev/\S+) on (/.*) \(([^,]+), (.+)\)$").expect("mount line pattern is valid")
});

/// One mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    /// Canonical device path
    pub device: PathBuf,
    pub filesystem_type: String,
    pub mount_point: PathBuf,
    /// Options after the filesystem type, in reported order
    pub options: Vec<String>,
}

impl MountRecord {
    /// Final option token, e.g. `read-only` for a mounted CD.
    pub fn last_option(&self) -> Option<&str> {
        self.options.last().map(String::as_str)
    }
}

/// Mounts keyed by canonical device path.
///
/// A snapshot is only valid for the moment it was read; callers re-read it
/// rather than keep one around.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    records: HashMap<PathBuf, MountRecord>,
}

impl MountTable {
    /// Parse `mount` output.
    pub fn parse(output: &str) -> Self {
        let mut records = HashMap::new();

        for line in output.lines() {
            let Some(record) = parse_line(line) else {
                continue;
            };
            if let Some(previous) = records.insert(record.device.clone(), record) {
                tracing::debug!(
                    "Device {} listed more than once, keeping the later entry",
                    previous.device.display()
                );
            }
        }

        Self { records }
    }

    /// Look up a device, canonicalizing it the same way the keys were.
    pub fn get(&self, device: &Path) -> Option<&MountRecord> {
        self.records.get(&canonical_device(device))
    }

    pub fn contains(&self, device: &Path) -> bool {
        self.get(device).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountRecord> {
        self.records.values()
    }
}

/// Invoke `mount` and parse the current mount table.
///
/// # Errors
///
/// Returns `ConfigDriveError::Execution` if the command cannot be run or
/// exits unsuccessfully. Unparseable lines are not an error.
pub fn read_mounts(runner: &dyn CommandRunner, mount_program: &str) -> ConfigDriveResult<MountTable> {
    let output = run_checked(runner, mount_program, &[] as &[OsString])?;
    let table = MountTable::parse(&output.stdout);
    tracing::debug!("Read {} mounts from {}", table.len(), mount_program);
    Ok(table)
}

fn parse_line(line: &str) -> Option<MountRecord> {
    let caps = MOUNT_LINE.captures(line.trim_end())?;

    let options: Vec<String> = caps[4]
        .split(',')
        .map(|opt| opt.trim().to_string())
        .filter(|opt| !opt.is_empty())
        .collect();
    if options.len() < 2 {
        return None;
    }

    Some(MountRecord {
        device: canonical_device(Path::new(&caps[1])),
        filesystem_type: caps[3].trim().to_string(),
        mount_point: PathBuf::from(&caps[2]),
        options,
    })
}

/// Resolve symlinks in a device path, keeping the literal path when it
/// cannot be resolved (e.g. the device node is gone).
pub(crate) fn canonical_device(device: &Path) -> PathBuf {
    std::fs::canonicalize(device).unwrap_or_else(|_| device.to_path_buf())
}
