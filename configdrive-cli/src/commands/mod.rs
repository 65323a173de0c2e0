pub mod devices;
pub mod locate;
pub mod mounts;
