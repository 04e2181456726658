//! Kernel command line parsing.

use basalt_boot::limine_protocol::{BootInfo, RamdiskRegion};

pub const DEFAULT_INIT_PATH: &str = "/usr/bin/init";

/// Parsed boot arguments. Read-only after construction.
#[derive(Clone, Copy, Debug)]
pub struct KernelArgs {
    pub cmdline: &'static str,
    pub init_path: Option<&'static str>,
    pub ramdisk: Option<RamdiskRegion>,
}

impl KernelArgs {
    pub const fn empty() -> Self {
        Self {
            cmdline: "",
            init_path: None,
            ramdisk: None,
        }
    }

    pub fn parse(cmdline: &'static str) -> Self {
        let mut args = Self::empty();
        args.cmdline = cmdline;
        for token in cmdline.split_whitespace() {
            if let Some(path) = token.strip_prefix("init=") {
                if !path.is_empty() {
                    args.init_path = Some(path);
                }
            }
        }
        args
    }

    pub fn from_boot_info(info: &BootInfo) -> Self {
        let mut args = Self::parse(info.cmdline.unwrap_or(""));
        args.ramdisk = info.ramdisk;
        args
    }

    /// Path of the first user program, honoring the `init=` override.
    pub fn init_path(&self) -> &'static str {
        self.init_path.unwrap_or(DEFAULT_INIT_PATH)
    }

    /// `boot.debug=on|off` switch; `None` when the command line does not
    /// mention it.
    pub fn debug_logging(&self) -> Option<bool> {
        if self.cmdline.contains("boot.debug=on") {
            Some(true)
        } else if self.cmdline.contains("boot.debug=off") {
            Some(false)
        } else {
            None
        }
    }
}
