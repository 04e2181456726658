//! Syscall numbers and the register-mapped argument block.
//!
//! Numbers are fixed small integers; existing user binaries depend on them.
//! The argument block mirrors the general-purpose registers captured at the
//! syscall trap, interpreted positionally, plus one return slot. Dispatch
//! owns the return slot and nothing else.

pub const SYSCALL_READ: u64 = 0x0;
pub const SYSCALL_WRITE: u64 = 0x1;
pub const SYSCALL_OPEN: u64 = 0x2;
pub const SYSCALL_CLOSE: u64 = 0x3;
pub const SYSCALL_SEEK: u64 = 0x8;
pub const SYSCALL_MMAP: u64 = 0x9;
pub const SYSCALL_MUNMAP: u64 = 0xb;
pub const SYSCALL_IOCTL: u64 = 0x10;
pub const SYSCALL_FCNTL: u64 = 0x48;
pub const SYSCALL_GETCWD: u64 = 0x4f;
pub const SYSCALL_CHDIR: u64 = 0x50;
pub const SYSCALL_READDIR: u64 = 0x59;
pub const SYSCALL_SYSINFO: u64 = 0x63;
pub const SYSCALL_OPENAT: u64 = 0x101;
pub const SYSCALL_MKDIRAT: u64 = 0x102;
pub const SYSCALL_FSTATAT: u64 = 0x106;
pub const SYSCALL_UNLINKAT: u64 = 0x107;
pub const SYSCALL_LINKAT: u64 = 0x109;
pub const SYSCALL_READLINKAT: u64 = 0x10b;
pub const SYSCALL_FCHMODAT: u64 = 0x10c;
pub const SYSCALL_DUP3: u64 = 0x124;
pub const SYSCALL_PIPE: u64 = 0x125;

/// Register-mapped syscall arguments, 64 bytes.
///
/// `number` is the requested syscall, `arg0`..`arg5` the positional
/// arguments, `ret` the single slot the handler writes back.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyscallArgs {
    pub number: u64,
    pub arg0: u64,
    pub arg1: u64,
    pub arg2: u64,
    pub arg3: u64,
    pub arg4: u64,
    pub arg5: u64,
    pub ret: u64,
}

impl SyscallArgs {
    #[inline]
    pub const fn new(number: u64) -> Self {
        Self {
            number,
            arg0: 0,
            arg1: 0,
            arg2: 0,
            arg3: 0,
            arg4: 0,
            arg5: 0,
            ret: 0,
        }
    }
}
