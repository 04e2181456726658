//! Process constants shared with the loader and scheduler paths.

/// Initial scheduling state requested for a newly created process.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Queued = 0,
    ReadyToRun = 1,
    Running = 2,
    Blocked = 3,
}

/// Load offset handed to the ELF loader for the init binary.
pub const INIT_ENTRY_OFFSET: u64 = 400_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_value_is_stable() {
        assert_eq!(ProcessState::ReadyToRun as u32, 1);
    }
}
