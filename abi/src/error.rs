//! Errno constants for the syscall return convention.
//!
//! Syscalls report failure by placing the negated errno in the return slot.
//! Only the values this kernel actually produces are defined here.

/// No such file or directory.
pub const ENOENT: i64 = 2;
/// Exec format error.
pub const ENOEXEC: i64 = 8;
/// Bad address.
pub const EFAULT: i64 = 14;
/// Invalid argument.
pub const EINVAL: i64 = 22;
/// Function not implemented (unmapped syscall number).
pub const ENOSYS: i64 = 38;

/// Encode an errno as the raw return-slot value.
#[inline]
pub const fn errno_ret(errno: i64) -> u64 {
    (-errno) as u64
}

/// True if a raw return-slot value encodes an error.
#[inline]
pub const fn ret_is_error(ret: u64) -> bool {
    (ret as i64) < 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_encoding_round_trips() {
        assert_eq!(errno_ret(ENOSYS) as i64, -38);
        assert!(ret_is_error(errno_ret(ENOENT)));
        assert!(!ret_is_error(0));
        assert!(!ret_is_error(41));
    }
}
