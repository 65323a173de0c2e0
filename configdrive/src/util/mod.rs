mod process;

pub use process::{CommandOutput, CommandRunner, SystemRunner, display_command, run_checked};
pub(crate) use process::exit_description;
