//! The `sysinfo` record.
//!
//! Field order and widths follow the Linux layout userland already links
//! against: 112 bytes on x86_64, `procs` at offset 80, `mem_unit` at offset
//! 104, trailing alignment padding to 112. Swap, shared/buffer RAM, high
//! memory, and the load averages are always zero on this kernel.

/// Physical page size used to scale page counts into byte totals.
pub const PAGE_SIZE: u64 = 4096;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sysinfo {
    /// Seconds since boot.
    pub uptime: i64,
    /// 1, 5 and 15 minute load averages (unused, zero).
    pub loads: [u64; 3],
    /// Total usable main memory in bytes.
    pub totalram: u64,
    /// Available memory in bytes.
    pub freeram: u64,
    pub sharedram: u64,
    pub bufferram: u64,
    pub totalswap: u64,
    pub freeswap: u64,
    /// Number of current processes.
    pub procs: u16,
    pub totalhigh: u64,
    pub freehigh: u64,
    /// Memory unit field (always zero; RAM totals are in bytes).
    pub mem_unit: u32,
}

impl Sysinfo {
    #[inline]
    pub const fn zeroed() -> Self {
        Self {
            uptime: 0,
            loads: [0; 3],
            totalram: 0,
            freeram: 0,
            sharedram: 0,
            bufferram: 0,
            totalswap: 0,
            freeswap: 0,
            procs: 0,
            totalhigh: 0,
            freehigh: 0,
            mem_unit: 0,
        }
    }
}
