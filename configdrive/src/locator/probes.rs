//! Probe strategies, one per class of media.

use std::path::{Path, PathBuf};

use configdrive_shared::errors::ConfigDriveResult;

use crate::device::{is_config_drive_device, list_devices};
use crate::options::{LocatorOptions, ProbeFlags};
use crate::storage::{MountManager, copy_tree};
use crate::util::CommandRunner;

/// Media class a probe looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Vfat,
    RawHdd,
    Cdrom,
}

impl ProbeKind {
    /// Priority order the locator runs probes in.
    pub const ORDER: [ProbeKind; 3] = [ProbeKind::Vfat, ProbeKind::RawHdd, ProbeKind::Cdrom];

    pub fn is_enabled(self, flags: &ProbeFlags) -> bool {
        match self {
            ProbeKind::Vfat => flags.vfat,
            ProbeKind::RawHdd => flags.raw_hdd,
            ProbeKind::Cdrom => flags.cdrom,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ProbeKind::Vfat => "VFAT filesystems",
            ProbeKind::RawHdd => "raw HDDs",
            ProbeKind::Cdrom => "cdrom drives",
        }
    }
}

/// One strategy for finding the config drive.
pub trait ConfigDriveProbe {
    fn kind(&self) -> ProbeKind;

    /// Look for a config drive and copy it to `target`.
    ///
    /// Returns `Ok(false)` when this media class holds no config drive.
    ///
    /// # Errors
    ///
    /// Mount and copy failures are errors, not misses.
    fn probe(&self, target: &Path) -> ConfigDriveResult<bool>;
}

/// Config drive on a VFAT partition. Not supported yet; always misses.
#[derive(Debug, Default)]
pub struct VfatProbe;

impl ConfigDriveProbe for VfatProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Vfat
    }

    fn probe(&self, _target: &Path) -> ConfigDriveResult<bool> {
        Ok(false)
    }
}

/// Config drive written as a raw image to a disk. Not supported yet; always misses.
#[derive(Debug, Default)]
pub struct RawHddProbe;

impl ConfigDriveProbe for RawHddProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::RawHdd
    }

    fn probe(&self, _target: &Path) -> ConfigDriveResult<bool> {
        Ok(false)
    }
}

/// Config drive on optical media labelled `iso9660/config-2`.
pub struct CdromProbe<'a> {
    runner: &'a dyn CommandRunner,
    options: &'a LocatorOptions,
}

impl<'a> CdromProbe<'a> {
    pub fn new(runner: &'a dyn CommandRunner, options: &'a LocatorOptions) -> Self {
        Self { runner, options }
    }

    /// First enumerated device carrying the config drive label.
    ///
    /// Ties are broken by the order the kernel lists disks in.
    pub fn find_device(&self) -> Option<PathBuf> {
        let commands = &self.options.commands;
        list_devices(self.runner, &commands.sysctl)
            .into_iter()
            .find(|dev| {
                is_config_drive_device(
                    self.runner,
                    &commands.glabel,
                    dev,
                    &self.options.label_signature,
                )
            })
            .map(|dev| dev.path_in(&self.options.device_dir))
    }
}

impl ConfigDriveProbe for CdromProbe<'_> {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Cdrom
    }

    fn probe(&self, target: &Path) -> ConfigDriveResult<bool> {
        let Some(device) = self.find_device() else {
            tracing::debug!("No device labelled {}", self.options.label_signature);
            return Ok(false);
        };
        tracing::info!("Config drive candidate: {}", device.display());

        MountManager::new(self.runner, &self.options.commands)
            .with_scratch_base(self.options.scratch_base.as_deref())
            .with_mounted_device(&device, &self.options.cdrom_filesystem, |mount_point| {
                copy_tree(mount_point, target)
            })?;

        Ok(true)
    }
}
