use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Args;
use configdrive::{ConfigDriveLocator, ProbeFlags, SystemRunner};

/// Exit status when every enabled probe missed.
pub const EXIT_NOT_FOUND: u8 = 2;

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Directory the config drive contents are copied to
    pub target: PathBuf,

    /// Skip the VFAT probe
    #[arg(long)]
    pub no_vfat: bool,

    /// Skip the raw HDD probe
    #[arg(long)]
    pub no_raw_hdd: bool,

    /// Skip the CD-ROM probe
    #[arg(long)]
    pub no_cdrom: bool,
}

impl LocateArgs {
    /// Flags from the config file, with `--no-*` switches turning probes off.
    fn probe_flags(&self, configured: ProbeFlags) -> ProbeFlags {
        ProbeFlags {
            vfat: configured.vfat && !self.no_vfat,
            raw_hdd: configured.raw_hdd && !self.no_raw_hdd,
            cdrom: configured.cdrom && !self.no_cdrom,
        }
    }
}

pub fn execute(args: LocateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<ExitCode> {
    let options = global.load_options()?;
    let flags = args.probe_flags(options.probes);
    let locator = ConfigDriveLocator::new(SystemRunner, options);

    tracing::debug!(?flags, "Locating config drive");
    let found = locator
        .locate(&args.target, flags)
        .with_context(|| format!("Config drive discovery failed for {}", args.target.display()))?;

    if found {
        tracing::info!("Config drive extracted to {}", args.target.display());
        println!("{}", args.target.display());
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::info!("No enabled probe found a config drive");
        eprintln!("Config drive not found");
        Ok(ExitCode::from(EXIT_NOT_FOUND))
    }
}
