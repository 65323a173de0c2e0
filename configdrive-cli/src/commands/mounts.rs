use configdrive::SystemRunner;
use configdrive::storage::read_mounts;

pub fn execute(global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let options = global.load_options()?;
    let table = read_mounts(&SystemRunner, &options.commands.mount)?;

    let mut records: Vec<_> = table.iter().collect();
    records.sort_by(|a, b| a.device.cmp(&b.device));

    for record in records {
        println!(
            "{}\t{}\t{}\t{}",
            record.device.display(),
            record.mount_point.display(),
            record.filesystem_type,
            record.options.join(",")
        );
    }
    Ok(())
}
