use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configdrive::LocatorOptions;

use crate::commands::locate::LocateArgs;

/// Locate the instance config drive and copy it out
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe attached media and copy the config drive to a directory
    Locate(LocateArgs),

    /// Show block device mounts as the discovery sees them
    Mounts,

    /// List disks and whether they carry the config drive label
    Devices,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// JSON file with locator options
    #[arg(long, global = true, env = "CONFIGDRIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory device nodes live in (overrides the config file)
    #[arg(long, global = true)]
    pub device_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalFlags {
    /// Options from `--config` (or defaults), with flag overrides applied.
    pub fn load_options(&self) -> anyhow::Result<LocatorOptions> {
        let mut options = match &self.config {
            Some(path) => LocatorOptions::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => LocatorOptions::default(),
        };

        if let Some(dir) = &self.device_dir {
            options.device_dir = dir.clone();
        }
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locate_flags() {
        let cli = Cli::try_parse_from([
            "configdrive",
            "-vv",
            "locate",
            "--no-vfat",
            "--no-raw-hdd",
            "/var/lib/configdrive",
        ])
        .unwrap();

        assert_eq!(cli.global.verbose, 2);
        let Commands::Locate(args) = cli.command else {
            panic!("expected locate");
        };
        assert!(args.no_vfat);
        assert!(args.no_raw_hdd);
        assert!(!args.no_cdrom);
        assert_eq!(args.target, PathBuf::from("/var/lib/configdrive"));
    }

    #[test]
    fn test_device_dir_override() {
        let cli = Cli::try_parse_from(["configdrive", "devices", "--device-dir", "/dev/iso"]).unwrap();
        let options = cli.global.load_options().unwrap();
        assert_eq!(options.device_dir, PathBuf::from("/dev/iso"));
    }

    #[test]
    fn test_relative_device_dir_rejected() {
        let cli = Cli::try_parse_from(["configdrive", "devices", "--device-dir", "dev"]).unwrap();
        assert!(cli.global.load_options().is_err());
    }
}
