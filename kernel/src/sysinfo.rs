//! In-kernel `sysinfo` syscall.

use basalt_abi::error::{EFAULT, EINVAL, errno_ret};
use basalt_abi::syscall::SyscallArgs;
use basalt_abi::sysinfo::{PAGE_SIZE, Sysinfo};

use crate::services::{MemoryInfo, clock_services, mem_services, task_services};

const MS_PER_SECOND: u64 = 1000;

/// Populate the record from the current counters. Fields this kernel does
/// not track (load averages, swap, shared and buffer memory, the memory
/// unit) stay zero.
pub fn fill_sysinfo(info: &mut Sysinfo, mem: MemoryInfo, uptime_ms: u64, procs: u16) {
    *info = Sysinfo::zeroed();
    info.uptime = (uptime_ms / MS_PER_SECOND) as i64;
    info.totalram = mem.total_pages * PAGE_SIZE;
    info.freeram = mem.free_pages * PAGE_SIZE;
    info.procs = procs;
}

/// Handler bound to the `sysinfo` ABI number. `arg0` is the user buffer.
pub fn syscall_sysinfo(args: &mut SyscallArgs) {
    if args.arg0 == 0 {
        args.ret = errno_ret(EFAULT);
        return;
    }

    let (Some(mem), Some(clock), Some(task)) = (mem_services(), clock_services(), task_services())
    else {
        args.ret = errno_ret(EINVAL);
        return;
    };

    let mut info = Sysinfo::zeroed();
    fill_sysinfo(
        &mut info,
        (mem.memory_info)(),
        (clock.uptime_ms)(),
        (task.process_count)(),
    );

    // SAFETY: arg0 was validated non-null; the caller guarantees it points
    // at a writable buffer of at least the record size.
    unsafe {
        core::ptr::write_unaligned(args.arg0 as *mut Sysinfo, info);
    }
    args.ret = 0;
}
