//! Configuration for config drive discovery.

use configdrive_shared::constants::{commands, media};
use configdrive_shared::errors::{ConfigDriveError, ConfigDriveResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Probe Flags
// ============================================================================

/// Which probes the locator may run.
///
/// Probes always run in the order VFAT, raw HDD, CD-ROM; a disabled probe is
/// skipped without affecting the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFlags {
    #[serde(default = "default_true")]
    pub vfat: bool,

    #[serde(default = "default_true")]
    pub raw_hdd: bool,

    #[serde(default = "default_true")]
    pub cdrom: bool,
}

impl Default for ProbeFlags {
    fn default() -> Self {
        Self {
            vfat: true,
            raw_hdd: true,
            cdrom: true,
        }
    }
}

impl ProbeFlags {
    /// Only the CD-ROM probe enabled.
    pub fn cdrom_only() -> Self {
        Self {
            vfat: false,
            raw_hdd: false,
            cdrom: true,
        }
    }

    /// No probe enabled.
    pub fn none() -> Self {
        Self {
            vfat: false,
            raw_hdd: false,
            cdrom: false,
        }
    }
}

// ============================================================================
// Command Names
// ============================================================================

/// Program names for the OS facilities discovery invokes.
///
/// Each is resolved through `PATH` unless given as an absolute path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandNames {
    #[serde(default = "default_mount")]
    pub mount: String,

    #[serde(default = "default_umount")]
    pub umount: String,

    /// Lists disks with `-n kern.disks`.
    #[serde(default = "default_sysctl")]
    pub sysctl: String,

    /// Reports labels with `status -s <device>`.
    #[serde(default = "default_glabel")]
    pub glabel: String,
}

impl Default for CommandNames {
    fn default() -> Self {
        Self {
            mount: default_mount(),
            umount: default_umount(),
            sysctl: default_sysctl(),
            glabel: default_glabel(),
        }
    }
}

// ============================================================================
// Locator Options
// ============================================================================

/// Options for [`ConfigDriveLocator`](crate::ConfigDriveLocator).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorOptions {
    /// Probes enabled by default when the caller has no preference.
    #[serde(default)]
    pub probes: ProbeFlags,

    /// Directory raw device names are resolved under.
    ///
    /// Default: /dev
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,

    /// Parent directory for scratch mount points.
    ///
    /// If None, uses the system temporary directory.
    #[serde(default)]
    pub scratch_base: Option<PathBuf>,

    /// Filesystem type used when mounting optical media.
    ///
    /// Default: cd9660
    #[serde(default = "default_cdrom_filesystem")]
    pub cdrom_filesystem: String,

    /// Label prefix that marks a device as a config drive.
    ///
    /// Default: iso9660/config-2
    #[serde(default = "default_label_signature")]
    pub label_signature: String,

    #[serde(default)]
    pub commands: CommandNames,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            probes: ProbeFlags::default(),
            device_dir: default_device_dir(),
            scratch_base: None,
            cdrom_filesystem: default_cdrom_filesystem(),
            label_signature: default_label_signature(),
            commands: CommandNames::default(),
        }
    }
}

impl LocatorOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigDriveError::Config` if the file cannot be read, is not
    /// valid JSON, or fails validation.
    pub fn load(path: &Path) -> ConfigDriveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigDriveError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ConfigDriveError::Config(msg) => {
                ConfigDriveError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse options from a JSON document.
    pub fn from_json(content: &str) -> ConfigDriveResult<Self> {
        let options: Self = serde_json::from_str(content)
            .map_err(|e| ConfigDriveError::Config(format!("Invalid config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject options discovery cannot work with.
    pub fn validate(&self) -> ConfigDriveResult<()> {
        if self.cdrom_filesystem.trim().is_empty() {
            return Err(ConfigDriveError::Config(
                "cdrom_filesystem must not be empty".to_string(),
            ));
        }
        if self.label_signature.is_empty() {
            return Err(ConfigDriveError::Config(
                "label_signature must not be empty".to_string(),
            ));
        }
        if !self.device_dir.is_absolute() {
            return Err(ConfigDriveError::Config(format!(
                "device_dir must be absolute, got {}",
                self.device_dir.display()
            )));
        }
        let commands = [
            &self.commands.mount,
            &self.commands.umount,
            &self.commands.sysctl,
            &self.commands.glabel,
        ];
        if commands.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigDriveError::Config(
                "command names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_device_dir() -> PathBuf {
    PathBuf::from(media::DEVICE_DIR)
}

fn default_cdrom_filesystem() -> String {
    media::CDROM_FILESYSTEM.to_string()
}

fn default_label_signature() -> String {
    media::CONFIG_DRIVE_SIGNATURE.to_string()
}

fn default_mount() -> String {
    commands::MOUNT.to_string()
}

fn default_umount() -> String {
    commands::UMOUNT.to_string()
}

fn default_sysctl() -> String {
    commands::SYSCTL.to_string()
}

fn default_glabel() -> String {
    commands::GLABEL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LocatorOptions::default();
        assert_eq!(opts.probes, ProbeFlags::default());
        assert!(opts.probes.vfat && opts.probes.raw_hdd && opts.probes.cdrom);
        assert_eq!(opts.device_dir, PathBuf::from("/dev"));
        assert_eq!(opts.cdrom_filesystem, "cd9660");
        assert_eq!(opts.label_signature, "iso9660/config-2");
        assert_eq!(opts.commands.glabel, "glabel");
        assert!(opts.scratch_base.is_none());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let opts = LocatorOptions::from_json("{}").unwrap();
        assert_eq!(opts, LocatorOptions::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let opts = LocatorOptions::from_json(
            r#"{"probes": {"vfat": false}, "commands": {"mount": "/sbin/mount"}}"#,
        )
        .unwrap();
        assert!(!opts.probes.vfat);
        assert!(opts.probes.raw_hdd);
        assert!(opts.probes.cdrom);
        assert_eq!(opts.commands.mount, "/sbin/mount");
        assert_eq!(opts.commands.umount, "umount");
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = LocatorOptions::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigDriveError::Config(_)));
    }

    #[test]
    fn test_relative_device_dir_rejected() {
        let err = LocatorOptions::from_json(r#"{"device_dir": "dev"}"#).unwrap_err();
        assert!(err.to_string().contains("device_dir"));
    }

    #[test]
    fn test_empty_filesystem_rejected() {
        let err = LocatorOptions::from_json(r#"{"cdrom_filesystem": " "}"#).unwrap_err();
        assert!(matches!(err, ConfigDriveError::Config(_)));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configdrive.json");
        std::fs::write(&path, r#"{"label_signature": ""}"#).unwrap();

        let err = LocatorOptions::load(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("configdrive.json"));
        assert!(msg.contains("label_signature"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = LocatorOptions::load(Path::new("/nonexistent/configdrive.json")).unwrap_err();
        assert!(matches!(err, ConfigDriveError::Config(_)));
    }
}
