use configdrive::SystemRunner;
use configdrive::device::{is_config_drive_device, list_devices};

pub fn execute(global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let options = global.load_options()?;
    let commands = &options.commands;

    for device in list_devices(&SystemRunner, &commands.sysctl) {
        let labelled = is_config_drive_device(
            &SystemRunner,
            &commands.glabel,
            &device,
            &options.label_signature,
        );
        println!(
            "{}\t{}\t{}",
            device,
            device.path_in(&options.device_dir).display(),
            if labelled { "config-drive" } else { "-" }
        );
    }
    Ok(())
}
