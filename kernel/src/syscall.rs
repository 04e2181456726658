//! Sparse syscall dispatch table.
//!
//! ABI numbers are sparse (0x0 through 0x125 with gaps), so the table is a
//! sorted fixed-capacity array searched by binary search rather than a
//! dense array indexed by number. Like the gate table it is built in an
//! exclusive phase, sealed, and published through a `spin::Once`; after
//! publication there is no writer, so every core reads it without locks.

use spin::Once;

use basalt_abi::error::{ENOSYS, errno_ret};
use basalt_abi::syscall::SyscallArgs;
use basalt_lib::klog_warn;

pub type SyscallHandler = fn(&mut SyscallArgs);

pub const TABLE_CAPACITY: usize = 64;

#[derive(Clone, Copy)]
pub struct SyscallEntry {
    pub number: u64,
    pub name: &'static str,
    pub handler: SyscallHandler,
}

/// Mutable fill phase. Keeps entries sorted by number as they arrive.
pub struct SyscallTableBuilder {
    entries: [Option<SyscallEntry>; TABLE_CAPACITY],
    len: usize,
}

impl SyscallTableBuilder {
    pub const fn new() -> Self {
        Self {
            entries: [None; TABLE_CAPACITY],
            len: 0,
        }
    }

    /// Register a handler. Registering a number twice replaces the earlier
    /// handler.
    pub fn register(&mut self, number: u64, name: &'static str, handler: SyscallHandler) {
        let entry = SyscallEntry {
            number,
            name,
            handler,
        };

        let mut insert_at = self.len;
        for i in 0..self.len {
            if let Some(existing) = self.entries[i] {
                if existing.number == number {
                    self.entries[i] = Some(entry);
                    return;
                }
                if existing.number > number {
                    insert_at = i;
                    break;
                }
            }
        }

        assert!(self.len < TABLE_CAPACITY, "syscall table full");
        let mut i = self.len;
        while i > insert_at {
            self.entries[i] = self.entries[i - 1];
            i -= 1;
        }
        self.entries[insert_at] = Some(entry);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn seal(self) -> SyscallTable {
        SyscallTable {
            entries: self.entries,
            len: self.len,
        }
    }
}

impl Default for SyscallTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The sealed table. Immutable after construction.
pub struct SyscallTable {
    entries: [Option<SyscallEntry>; TABLE_CAPACITY],
    len: usize,
}

impl SyscallTable {
    pub fn lookup(&self, number: u64) -> Option<&SyscallEntry> {
        let mut lo = 0usize;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.entries[mid].as_ref()?;
            if entry.number == number {
                return Some(entry);
            }
            if entry.number < number {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        None
    }

    pub fn contains(&self, number: u64) -> bool {
        self.lookup(number).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Run the handler for `args.number`. An unknown number writes the
    /// negative `ENOSYS` convention into the return slot and leaves every
    /// other field untouched.
    pub fn dispatch(&self, args: &mut SyscallArgs) {
        match self.lookup(args.number) {
            Some(entry) => (entry.handler)(args),
            None => {
                klog_warn!("syscall: unknown number 0x{:x}", args.number);
                args.ret = errno_ret(ENOSYS);
            }
        }
    }
}

static SYSCALL_TABLE: Once<SyscallTable> = Once::new();

/// Seal and publish the global table. First publication wins.
pub fn publish(builder: SyscallTableBuilder) -> &'static SyscallTable {
    SYSCALL_TABLE.call_once(|| builder.seal())
}

pub fn is_published() -> bool {
    SYSCALL_TABLE.get().is_some()
}

pub fn table() -> Option<&'static SyscallTable> {
    SYSCALL_TABLE.get()
}

/// Dispatch against the published table. Before publication every number
/// behaves as unknown.
pub fn dispatch(args: &mut SyscallArgs) {
    match SYSCALL_TABLE.get() {
        Some(table) => table.dispatch(args),
        None => {
            args.ret = errno_ret(ENOSYS);
        }
    }
}
