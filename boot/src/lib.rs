//! Early boot support: trap gate table, boot console, panic path, Limine
//! protocol requests, and secondary core bring-up.

#![no_std]

pub mod idt;
pub mod kernel_panic;
pub mod limine_protocol;
pub mod serial;
pub mod smp;
