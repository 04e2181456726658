//! Shared kernel support primitives: leveled logging, init-once flags,
//! service registration cells, and CPU intrinsics.

#![no_std]

pub mod cpu;
pub mod init_flag;
pub mod klog;
pub mod service_cell;
pub mod service_macro;

pub use init_flag::{InitFlag, StateFlag};
pub use klog::KlogLevel;
pub use service_cell::ServiceCell;

// Re-exported for `define_service!` expansions.
pub use paste;
