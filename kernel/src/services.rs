//! Collaborator interfaces for the subsystems the boot sequence drives.
//!
//! The kernel core sequences these subsystems but does not implement them;
//! each interface is a struct of function pointers the implementing crate
//! registers at startup. Interfaces stay narrow: only what the boot steps
//! and the in-kernel syscalls actually call.

use basalt_abi::syscall::SyscallArgs;
use basalt_abi::task::ProcessState;
use basalt_lib::define_service;

/// Directory bit of the node mode word.
pub const S_IFDIR: u32 = 0o040000;

/// Opaque handle to a resolved filesystem node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_pages: u64,
    pub free_pages: u64,
}

define_service! {
    fs => FsServices {
        vfs_init() -> i32;
        tmpfs_init() -> i32;
        devtmpfs_init() -> i32;
        mount(source: Option<&'static str>, target: &'static str, fstype: &'static str) -> i32;
        create(path: &'static str, mode: u32) -> i32;
        lookup(path: &'static str) -> Option<NodeId>;
    }
}

define_service! {
    stream => StreamServices {
        streams_init() -> i32;
        random_init() -> i32;
    }
}

define_service! {
    ramdisk => RamdiskServices {
        install(address: u64, length: u64) -> i32;
    }
}

define_service! {
    module => ModuleServices {
        /// Returns 0 on success; any other status is a load failure.
        load(path: &'static str) -> i64;
        report();
    }
}

define_service! {
    video => VideoServices {
        fbdev_init() -> i32;
    }
}

define_service! {
    task => TaskServices {
        create_process(name: &'static str, state: ProcessState, entry_offset: u64, path: &'static str) -> bool;
        process_count() -> u16;
    }
}

define_service! {
    mem => MemServices {
        memory_info() -> MemoryInfo;
    }
}

define_service! {
    clock => ClockServices {
        uptime_ms() -> u64;
    }
}

define_service! {
    sched => SchedServices {
        resched();
    }
}

define_service! {
    /// Externally implemented syscall bodies, one per ABI number. The
    /// in-kernel `sysinfo` handler is not part of this table.
    syscalls => SyscallHandlers {
        read(args: &mut SyscallArgs);
        write(args: &mut SyscallArgs);
        open(args: &mut SyscallArgs);
        close(args: &mut SyscallArgs);
        seek(args: &mut SyscallArgs);
        mmap(args: &mut SyscallArgs);
        munmap(args: &mut SyscallArgs);
        ioctl(args: &mut SyscallArgs);
        fcntl(args: &mut SyscallArgs);
        getcwd(args: &mut SyscallArgs);
        chdir(args: &mut SyscallArgs);
        readdir(args: &mut SyscallArgs);
        openat(args: &mut SyscallArgs);
        mkdirat(args: &mut SyscallArgs);
        fstatat(args: &mut SyscallArgs);
        unlinkat(args: &mut SyscallArgs);
        linkat(args: &mut SyscallArgs);
        readlinkat(args: &mut SyscallArgs);
        fchmodat(args: &mut SyscallArgs);
        dup3(args: &mut SyscallArgs);
        pipe(args: &mut SyscallArgs);
    }
}
