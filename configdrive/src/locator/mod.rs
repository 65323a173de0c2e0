//! Config drive locator.
//!
//! Runs the probes in priority order (VFAT, raw HDD, CD-ROM) and stops at the
//! first one that finds and copies a config drive.

mod probes;

use std::path::Path;

use configdrive_shared::errors::ConfigDriveResult;

use crate::options::{LocatorOptions, ProbeFlags};
use crate::util::CommandRunner;

pub use probes::{CdromProbe, ConfigDriveProbe, ProbeKind, RawHddProbe, VfatProbe};

/// Finds the config drive and copies it to a target directory.
pub struct ConfigDriveLocator<R: CommandRunner> {
    runner: R,
    options: LocatorOptions,
}

impl<R: CommandRunner> ConfigDriveLocator<R> {
    pub fn new(runner: R, options: LocatorOptions) -> Self {
        Self { runner, options }
    }

    pub fn options(&self) -> &LocatorOptions {
        &self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Probe with the flags from [`LocatorOptions::probes`].
    pub fn locate_default(&self, target: &Path) -> ConfigDriveResult<bool> {
        self.locate(target, self.options.probes)
    }

    /// Probe enabled media in priority order and copy the first config drive
    /// found to `target`.
    ///
    /// Returns `Ok(false)` if every enabled probe missed.
    ///
    /// # Errors
    ///
    /// The first probe error ends discovery: later probes are not attempted.
    pub fn locate(&self, target: &Path, flags: ProbeFlags) -> ConfigDriveResult<bool> {
        for probe in self.probes() {
            let kind = probe.kind();
            if !kind.is_enabled(&flags) {
                continue;
            }

            tracing::debug!("Looking for Config Drive in {}", kind.describe());
            if probe.probe(target)? {
                tracing::info!(
                    "Config drive found in {}, copied to {}",
                    kind.describe(),
                    target.display()
                );
                return Ok(true);
            }
        }

        tracing::info!("No config drive found");
        Ok(false)
    }

    /// Probes in priority order.
    fn probes(&self) -> Vec<Box<dyn ConfigDriveProbe + '_>> {
        ProbeKind::ORDER
            .into_iter()
            .map(|kind| -> Box<dyn ConfigDriveProbe + '_> {
                match kind {
                    ProbeKind::Vfat => Box::new(VfatProbe),
                    ProbeKind::RawHdd => Box::new(RawHddProbe),
                    ProbeKind::Cdrom => Box::new(CdromProbe::new(&self.runner, &self.options)),
                }
            })
            .collect()
    }
}
