//! Config drive discovery for early guest boot.
//!
//! Probes the attached media in a fixed order (VFAT, raw HDD, CD-ROM), mounts
//! the config drive read-only when needed and copies its tree to a target
//! directory. All OS interaction goes through a [`CommandRunner`], so the
//! decision procedure can be driven by scripted output in tests.
//!
//! ```no_run
//! use configdrive::{ConfigDriveLocator, LocatorOptions, SystemRunner};
//!
//! let locator = ConfigDriveLocator::new(SystemRunner, LocatorOptions::default());
//! let found = locator.locate_default("/var/lib/configdrive".as_ref())?;
//! # Ok::<(), configdrive::ConfigDriveError>(())
//! ```

pub mod device;
pub mod locator;
pub mod options;
pub mod storage;
pub mod util;

pub use configdrive_shared::errors::{ConfigDriveError, ConfigDriveResult};
pub use device::DeviceId;
pub use locator::{ConfigDriveLocator, ConfigDriveProbe, ProbeKind};
pub use options::{CommandNames, LocatorOptions, ProbeFlags};
pub use storage::{MountManager, MountOwnership, MountRecord, MountTable, MountedDevice};
pub use util::{CommandOutput, CommandRunner, SystemRunner};
