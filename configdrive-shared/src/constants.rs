//! Well-known names and defaults for config drive discovery
//!
//! These values follow the FreeBSD userland the guest boots into.

/// Config drive media constants
pub mod media {
    /// Label prefix reported by `glabel status -s` for a config drive volume
    pub const CONFIG_DRIVE_SIGNATURE: &str = "iso9660/config-2";

    /// Filesystem type passed to `mount -t` for optical media
    pub const CDROM_FILESYSTEM: &str = "cd9660";

    /// Directory device names are resolved under
    pub const DEVICE_DIR: &str = "/dev";
}

/// OS facilities invoked during discovery
pub mod commands {
    pub const MOUNT: &str = "mount";

    pub const UMOUNT: &str = "umount";

    /// Kernel state query tool, used with `-n kern.disks`
    pub const SYSCTL: &str = "sysctl";

    /// GEOM label tool, used with `status -s <device>`
    pub const GLABEL: &str = "glabel";

    /// sysctl OID listing the disks known to the kernel
    pub const KERN_DISKS: &str = "kern.disks";
}

/// Scratch mount directories
pub mod scratch {
    /// Name prefix for scratch mount points
    pub const PREFIX: &str = "configdrive-";
}
