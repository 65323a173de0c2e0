//! Scoped read-only mounts.
//!
//! [`MountManager::mount`] either reuses an existing mount of the device or
//! mounts it read-only on a fresh scratch directory. The returned
//! [`MountedDevice`] unmounts only what it mounted itself, exactly once, and
//! removes its scratch directory on every exit path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use configdrive_shared::constants::scratch;
use configdrive_shared::errors::{ConfigDriveError, ConfigDriveResult};

use super::mount_table::read_mounts;
use crate::options::CommandNames;
use crate::util::{CommandRunner, display_command, exit_description};

/// Whether a mount point is ours to unmount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOwnership {
    /// Mounted by this run; unmounted on release
    Owned,
    /// Already mounted before discovery started; left untouched
    Existing,
}

// ============================================================================
// Scratch Directory
// ============================================================================

/// Uniquely named, empty directory used as a temporary mount point.
///
/// Removal is non-recursive: if something is still mounted on it, removal
/// fails instead of descending into the mounted filesystem.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Create a scratch directory under `base`, or the system temp dir.
    pub fn create(base: Option<&Path>) -> ConfigDriveResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(scratch::PREFIX);

        let dir = match base {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            ConfigDriveError::Storage(format!("Failed to create scratch mount directory: {}", e))
        })?;

        let path = dir.keep();
        tracing::debug!("Created scratch mount directory {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(mut self) -> ConfigDriveResult<()> {
        self.remove_inner()
    }

    fn remove_inner(&mut self) -> ConfigDriveResult<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;

        std::fs::remove_dir(&self.path).map_err(|e| {
            ConfigDriveError::Storage(format!(
                "Failed to remove scratch mount directory {}: {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::debug!("Removed scratch mount directory {}", self.path.display());
        Ok(())
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = self.remove_inner() {
            tracing::warn!("{}", e);
        }
    }
}

// ============================================================================
// Mounted Device
// ============================================================================

/// A device available at a mount point for the lifetime of this value.
///
/// Call [`release`](Self::release) to clean up and observe failures. Dropping
/// without releasing performs the same cleanup and logs failures.
pub struct MountedDevice<'a> {
    runner: &'a dyn CommandRunner,
    umount_program: String,
    device: PathBuf,
    mount_point: PathBuf,
    ownership: MountOwnership,
    scratch: Option<ScratchDir>,
    released: bool,
}

impl std::fmt::Debug for MountedDevice<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedDevice")
            .field("device", &self.device)
            .field("mount_point", &self.mount_point)
            .field("ownership", &self.ownership)
            .field("released", &self.released)
            .finish()
    }
}

impl MountedDevice<'_> {
    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn ownership(&self) -> MountOwnership {
        self.ownership
    }

    /// Unmount if owned, then remove the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigDriveError::Mount` if the unmount failed. This is
    /// reported only after scratch removal was attempted. A scratch removal
    /// failure after a clean unmount is reported as `ConfigDriveError::Storage`.
    pub fn release(mut self) -> ConfigDriveResult<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> ConfigDriveResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let unmounted = match self.ownership {
            MountOwnership::Owned => self.unmount(),
            MountOwnership::Existing => {
                tracing::debug!(
                    "Leaving pre-existing mount {} in place",
                    self.mount_point.display()
                );
                Ok(())
            }
        };

        let removed = match self.scratch.take() {
            Some(dir) => dir.remove(),
            None => Ok(()),
        };

        match (unmounted, removed) {
            (Err(unmount_err), Err(remove_err)) => {
                tracing::warn!("{}", remove_err);
                Err(unmount_err)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn unmount(&self) -> ConfigDriveResult<()> {
        let args = [self.mount_point.as_os_str().to_os_string()];
        let line = display_command(&self.umount_program, &args);
        tracing::debug!("Running: {}", line);

        let output = self
            .runner
            .run(&self.umount_program, &args)
            .map_err(|e| ConfigDriveError::Mount(format!("Failed to run {}: {}", line, e)))?;

        if !output.success() {
            return Err(ConfigDriveError::Mount(format!(
                "Failed to unmount {} ({} exited with {}): {}",
                self.mount_point.display(),
                line,
                exit_description(output.status),
                output.stderr.trim()
            )));
        }

        tracing::info!(
            "Unmounted {} from {}",
            self.device.display(),
            self.mount_point.display()
        );
        Ok(())
    }
}

impl Drop for MountedDevice<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            tracing::error!("Cleanup of {} failed: {}", self.mount_point.display(), e);
        }
    }
}

// ============================================================================
// Mount Manager
// ============================================================================

/// Establishes read-only views of devices.
pub struct MountManager<'a> {
    runner: &'a dyn CommandRunner,
    commands: &'a CommandNames,
    scratch_base: Option<&'a Path>,
}

impl<'a> MountManager<'a> {
    pub fn new(runner: &'a dyn CommandRunner, commands: &'a CommandNames) -> Self {
        Self {
            runner,
            commands,
            scratch_base: None,
        }
    }

    /// Create scratch mount points under `base` instead of the temp dir.
    pub fn with_scratch_base(mut self, base: Option<&'a Path>) -> Self {
        self.scratch_base = base;
        self
    }

    /// Make `device` available read-only.
    ///
    /// An existing mount of the device is reused and never unmounted. Otherwise
    /// the device is mounted with `mount -o ro -t <filesystem>` on a scratch
    /// directory.
    ///
    /// # Errors
    ///
    /// - `ConfigDriveError::Execution` if the mount table cannot be read
    /// - `ConfigDriveError::Storage` if no scratch directory can be created
    /// - `ConfigDriveError::Mount` if the mount command fails; the scratch
    ///   directory is removed first
    pub fn mount(&self, device: &Path, filesystem: &str) -> ConfigDriveResult<MountedDevice<'a>> {
        let table = read_mounts(self.runner, &self.commands.mount)?;

        if let Some(record) = table.get(device) {
            tracing::info!(
                "{} already mounted at {} ({}), reusing",
                device.display(),
                record.mount_point.display(),
                record.filesystem_type
            );
            return Ok(MountedDevice {
                runner: self.runner,
                umount_program: self.commands.umount.clone(),
                device: device.to_path_buf(),
                mount_point: record.mount_point.clone(),
                ownership: MountOwnership::Existing,
                scratch: None,
                released: false,
            });
        }

        let scratch = ScratchDir::create(self.scratch_base)?;
        let args: Vec<OsString> = vec![
            "-o".into(),
            "ro".into(),
            "-t".into(),
            filesystem.into(),
            device.as_os_str().to_os_string(),
            scratch.path().as_os_str().to_os_string(),
        ];
        let line = display_command(&self.commands.mount, &args);
        tracing::debug!("Running: {}", line);

        let failure = match self.runner.run(&self.commands.mount, &args) {
            Ok(output) if output.success() => None,
            Ok(output) => Some(format!(
                "{} exited with {}: {}",
                line,
                exit_description(output.status),
                output.stderr.trim()
            )),
            Err(e) => Some(format!("Failed to run {}: {}", line, e)),
        };

        if let Some(reason) = failure {
            tracing::debug!(
                "Failed mount of {} on {}: {}",
                device.display(),
                scratch.path().display(),
                reason
            );
            if let Err(e) = scratch.remove() {
                tracing::warn!("{}", e);
            }
            return Err(ConfigDriveError::Mount(reason));
        }

        tracing::info!(
            "Mounted {} → {} (filesystem={}, read-only)",
            device.display(),
            scratch.path().display(),
            filesystem
        );

        Ok(MountedDevice {
            runner: self.runner,
            umount_program: self.commands.umount.clone(),
            device: device.to_path_buf(),
            mount_point: scratch.path().to_path_buf(),
            ownership: MountOwnership::Owned,
            scratch: Some(scratch),
            released: false,
        })
    }

    /// Run `f` against the mounted tree of `device`, releasing afterwards.
    ///
    /// If both `f` and the release fail, the release error is returned since
    /// it means a mount may have been left behind; the error from `f` is
    /// logged.
    pub fn with_mounted_device<T>(
        &self,
        device: &Path,
        filesystem: &str,
        f: impl FnOnce(&Path) -> ConfigDriveResult<T>,
    ) -> ConfigDriveResult<T> {
        let mounted = self.mount(device, filesystem)?;
        let result = f(mounted.mount_point());
        let released = mounted.release();

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Err(body_err), Err(release_err)) => {
                tracing::error!("{} (while using {})", body_err, device.display());
                Err(release_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::CommandOutput;
    use std::cell::RefCell;

    /// Replies by program name and remembers every invocation.
    struct FakeRunner {
        mount_table: String,
        mount_ok: bool,
        umount_ok: bool,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl FakeRunner {
        fn new(mount_table: &str) -> Self {
            Self {
                mount_table: mount_table.to_string(),
                mount_ok: true,
                umount_ok: true,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c[0] == program)
                .cloned()
                .collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<CommandOutput> {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
            self.calls.borrow_mut().push(call);

            Ok(match (program, args.is_empty()) {
                ("mount", true) => CommandOutput::ok(self.mount_table.clone()),
                ("mount", false) if self.mount_ok => CommandOutput::ok(""),
                ("mount", false) => CommandOutput::failed(1, "mount: /dev/cd0: Invalid argument"),
                ("umount", _) if self.umount_ok => CommandOutput::ok(""),
                ("umount", _) => CommandOutput::failed(1, "umount: Device busy"),
                _ => CommandOutput::failed(127, "not found"),
            })
        }
    }

    fn manager<'a>(runner: &'a FakeRunner, commands: &'a CommandNames, base: &'a Path) -> MountManager<'a> {
        MountManager::new(runner, commands).with_scratch_base(Some(base))
    }

    #[test]
    fn test_existing_mount_reused_and_left_alone() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let runner = FakeRunner::new("/dev/cd0 on /mnt/cdrom (cd9660, local, read-only)\n");

        let mounted = manager(&runner, &commands, base.path())
            .mount(Path::new("/dev/cd0"), "cd9660")
            .unwrap();
        assert_eq!(mounted.ownership(), MountOwnership::Existing);
        assert_eq!(mounted.mount_point(), Path::new("/mnt/cdrom"));
        mounted.release().unwrap();

        assert_eq!(runner.calls_to("mount").len(), 1);
        assert!(runner.calls_to("umount").is_empty());
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fresh_mount_is_read_only_and_owned() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let runner = FakeRunner::new("");

        let mounted = manager(&runner, &commands, base.path())
            .mount(Path::new("/dev/cd0"), "cd9660")
            .unwrap();
        let scratch = mounted.mount_point().to_path_buf();
        assert_eq!(mounted.ownership(), MountOwnership::Owned);
        assert!(scratch.is_dir());
        assert!(scratch.starts_with(base.path()));

        let mounts = runner.calls_to("mount");
        assert_eq!(
            mounts[1],
            vec![
                "mount".to_string(),
                "-o".into(),
                "ro".into(),
                "-t".into(),
                "cd9660".into(),
                "/dev/cd0".into(),
                scratch.to_string_lossy().into_owned(),
            ]
        );

        mounted.release().unwrap();
        assert!(!scratch.exists());
        assert_eq!(
            runner.calls_to("umount"),
            vec![vec!["umount".to_string(), scratch.to_string_lossy().into_owned()]]
        );
    }

    #[test]
    fn test_mount_failure_cleans_scratch() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let mut runner = FakeRunner::new("");
        runner.mount_ok = false;

        let err = manager(&runner, &commands, base.path())
            .mount(Path::new("/dev/cd0"), "cd9660")
            .unwrap_err();
        assert!(err.is_mount());
        assert!(err.to_string().contains("Invalid argument"));
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
        assert!(runner.calls_to("umount").is_empty());
    }

    #[test]
    fn test_unmount_failure_surfaces_after_scratch_removal() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let mut runner = FakeRunner::new("");
        runner.umount_ok = false;

        let mounted = manager(&runner, &commands, base.path())
            .mount(Path::new("/dev/cd0"), "cd9660")
            .unwrap();
        let scratch = mounted.mount_point().to_path_buf();

        let err = mounted.release().unwrap_err();
        assert!(err.is_mount());
        assert!(err.to_string().contains("Device busy"));
        // Nothing is really mounted under the fake runner, so removal succeeds
        assert!(!scratch.exists());
        assert_eq!(runner.calls_to("umount").len(), 1);
    }

    #[test]
    fn test_drop_releases_exactly_once() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let runner = FakeRunner::new("");

        let scratch = {
            let mounted = manager(&runner, &commands, base.path())
                .mount(Path::new("/dev/cd0"), "cd9660")
                .unwrap();
            mounted.mount_point().to_path_buf()
        };

        assert!(!scratch.exists());
        assert_eq!(runner.calls_to("umount").len(), 1);
    }

    #[test]
    fn test_with_mounted_device_releases_on_body_error() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let runner = FakeRunner::new("");

        let err = manager(&runner, &commands, base.path())
            .with_mounted_device(Path::new("/dev/cd0"), "cd9660", |_| -> ConfigDriveResult<()> {
                Err(ConfigDriveError::Copy("short read".into()))
            })
            .unwrap_err();

        assert!(err.is_copy());
        assert_eq!(runner.calls_to("umount").len(), 1);
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_with_mounted_device_prefers_release_error() {
        let base = tempfile::tempdir().unwrap();
        let commands = CommandNames::default();
        let mut runner = FakeRunner::new("");
        runner.umount_ok = false;

        let err = manager(&runner, &commands, base.path())
            .with_mounted_device(Path::new("/dev/cd0"), "cd9660", |_| -> ConfigDriveResult<()> {
                Err(ConfigDriveError::Copy("short read".into()))
            })
            .unwrap_err();

        assert!(err.is_mount());
    }

    #[test]
    fn test_mount_table_failure_propagates() {
        struct BrokenMount;
        impl CommandRunner for BrokenMount {
            fn run(&self, _program: &str, _args: &[OsString]) -> std::io::Result<CommandOutput> {
                Ok(CommandOutput::failed(1, "mount: not permitted"))
            }
        }

        let commands = CommandNames::default();
        let err = MountManager::new(&BrokenMount, &commands)
            .mount(Path::new("/dev/cd0"), "cd9660")
            .unwrap_err();
        assert!(matches!(err, ConfigDriveError::Execution(_)));
    }

    #[test]
    fn test_scratch_dir_drop_removes() {
        let base = tempfile::tempdir().unwrap();
        let path = {
            let dir = ScratchDir::create(Some(base.path())).unwrap();
            let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("configdrive-"));
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dir_removal_is_not_recursive() {
        let base = tempfile::tempdir().unwrap();
        let dir = ScratchDir::create(Some(base.path())).unwrap();
        std::fs::write(dir.path().join("meta_data.json"), "{}").unwrap();
        let path = dir.path().to_path_buf();

        assert!(matches!(dir.remove(), Err(ConfigDriveError::Storage(_))));
        assert!(path.join("meta_data.json").exists());
    }
}
