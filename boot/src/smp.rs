//! Secondary core bring-up via the Limine MP protocol.
//!
//! Each application processor loads the already-published gate table and
//! then drops into the idle routine the kernel registered. The bootstrap
//! processor waits a bounded number of spins for each AP to report in.

use core::sync::atomic::Ordering;

use limine::mp::Cpu as MpCpu;
use limine::request::MpRequest;
use spin::Once;

use basalt_lib::{cpu, klog_info};

use crate::idt;

#[used]
#[unsafe(link_section = ".limine_requests")]
static MP_REQUEST: MpRequest = MpRequest::new();

const AP_STARTED_MAGIC: u64 = 0x4241_5341_4C54_4150;

static AP_IDLE: Once<fn() -> !> = Once::new();

unsafe extern "C" fn ap_entry(cpu_info: &MpCpu) -> ! {
    cpu::disable_interrupts();

    if let Some(table) = idt::table() {
        // SAFETY: the table was sealed with a handler in every vector
        // before publication.
        unsafe { table.activate() };
    }
    cpu::enable_interrupts();

    cpu_info.extra.store(AP_STARTED_MAGIC, Ordering::Release);
    klog_info!("mp: cpu online (acpi id {})", cpu_info.id);

    match AP_IDLE.get() {
        Some(idle) => idle(),
        None => cpu::halt_loop(),
    }
}

/// Start every application processor and point it at `idle` once its gate
/// table is loaded. Missing MP support leaves the system single-core.
pub fn release_secondary_cores(idle: fn() -> !) {
    AP_IDLE.call_once(|| idle);

    let Some(resp) = MP_REQUEST.get_response() else {
        klog_info!("mp: no MP response from bootloader, staying single-core");
        return;
    };

    let cpus = resp.cpus();
    let bsp_lapic = resp.bsp_lapic_id();
    klog_info!("mp: {} cpus discovered, bsp lapic 0x{:x}", cpus.len(), bsp_lapic);

    let mut ap_count = 0usize;
    for cpu_info in cpus {
        if cpu_info.lapic_id == bsp_lapic {
            continue;
        }
        cpu_info.extra.store(0, Ordering::Release);
        cpu_info.goto_address.write(ap_entry);
        ap_count += 1;
    }

    if ap_count == 0 {
        klog_info!("mp: no secondary cores to start");
        return;
    }

    for cpu_info in cpus {
        if cpu_info.lapic_id == bsp_lapic {
            continue;
        }

        let mut spins = 2_000_000u32;
        while cpu_info.extra.load(Ordering::Acquire) != AP_STARTED_MAGIC && spins > 0 {
            cpu::pause();
            spins -= 1;
        }

        if cpu_info.extra.load(Ordering::Acquire) == AP_STARTED_MAGIC {
            klog_info!("mp: cpu lapic 0x{:x} reported online", cpu_info.lapic_id);
        } else {
            klog_info!("mp: cpu lapic 0x{:x} did not respond", cpu_info.lapic_id);
        }
    }
}
