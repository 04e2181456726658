//! Fatal error path. Disables interrupts, writes the panic banner to the
//! serial line directly so no log-level filter can swallow it, then parks
//! the core forever.

use basalt_lib::{StateFlag, cpu};

use crate::serial;

static PANICKING: StateFlag = StateFlag::new();

#[cold]
pub fn kernel_panic(message: &str) -> ! {
    cpu::disable_interrupts();

    // A fault inside the panic path must not recurse through it.
    if !PANICKING.enter() {
        cpu::halt_loop();
    }

    serial::write_line("\n\n=== KERNEL PANIC ===");
    serial::write_str("PANIC: ");
    serial::write_line(message);
    serial::write_line("====================");
    serial::write_line("System halted.");

    cpu::halt_loop();
}
