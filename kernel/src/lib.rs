//! Kernel sequencing layer: boot orchestration, syscall dispatch, kernel
//! arguments, and the collaborator service interfaces.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod init;
pub mod kargs;
pub mod services;
pub mod syscall;
pub mod sysinfo;
