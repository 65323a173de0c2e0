//! Config drive shared code
//!
//! Error types and well-known constants used by both the discovery library
//! (configdrive) and the command-line front end.

pub mod constants;
pub mod errors;

pub use errors::{ConfigDriveError, ConfigDriveResult};
