//! BasaltOS kernel-userland ABI types.
//!
//! Canonical definitions for everything shared across the kernel/userland
//! boundary: syscall numbers, the register-mapped argument block, the
//! `sysinfo` record, segment selectors, and errno constants. Layout-bearing
//! types are `#[repr(C)]`; their byte layout is part of the contract, not an
//! implementation detail.

#![no_std]
#![forbid(unsafe_code)]

pub mod error;
pub mod gdt;
pub mod syscall;
pub mod sysinfo;
pub mod task;

pub use error::*;
pub use gdt::SegmentSelector;
pub use syscall::*;
pub use sysinfo::{PAGE_SIZE, Sysinfo};
pub use task::*;
