//! COM1 boot console. Brings the UART up and attaches it as the logging
//! sink so everything logged after this point reaches the serial line.

use core::fmt::Write;

use spin::{Mutex, Once};
use uart_16550::SerialPort;

use basalt_lib::klog;

const COM1_BASE: u16 = 0x3F8;

static COM1: Once<Mutex<SerialPort>> = Once::new();

pub fn init() {
    COM1.call_once(|| {
        // SAFETY: 0x3F8 is the standard COM1 I/O port block.
        let mut port = unsafe { SerialPort::new(COM1_BASE) };
        port.init();
        Mutex::new(port)
    });
    klog::attach_sink(write_str);
}

pub fn write_str(s: &str) {
    if let Some(port) = COM1.get() {
        let _ = port.lock().write_str(s);
    }
}

pub fn write_line(s: &str) {
    write_str(s);
    write_str("\n");
}
