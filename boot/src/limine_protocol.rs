//! Hand-rolled Limine boot protocol requests.
//!
//! Only the requests this kernel consumes are declared: the kernel file
//! (for the command line) and the module list (for the ramdisk image). The
//! request statics must live in the `.limine_requests` section between the
//! start and end markers so the bootloader finds them.

use core::ffi::{CStr, c_char};
use core::ptr;

use basalt_lib::klog_debug;

const LIMINE_COMMON_MAGIC: [u64; 2] = [0xc7b1dd30df4c8b88, 0x0a82e883a194f07b];
const LIMINE_BASE_REVISION_MAGIC: [u64; 3] = [
    0xf9562b2d5c95a6c8,
    0x6a7b384944536bdc,
    1, /* base revision 1 */
];

const LIMINE_KERNEL_FILE_ID: [u64; 4] = [
    LIMINE_COMMON_MAGIC[0],
    LIMINE_COMMON_MAGIC[1],
    0xad97e90e83f1ed67,
    0x31eb5d1c5ff23b69,
];
const LIMINE_MODULE_ID: [u64; 4] = [
    LIMINE_COMMON_MAGIC[0],
    LIMINE_COMMON_MAGIC[1],
    0x3e7e279702be32af,
    0xca1c4f3bd1280cee,
];

#[repr(C)]
#[derive(Copy, Clone)]
pub struct LimineUuid {
    pub a: u32,
    pub b: u16,
    pub c: u16,
    pub d: [u8; 8],
}

#[repr(C)]
pub struct LimineFile {
    pub revision: u64,
    pub address: *const u8,
    pub size: u64,
    pub path: *const u8,
    pub cmdline: *const u8,
    pub media_type: u32,
    pub unused: u32,
    pub tftp_ip: u32,
    pub tftp_port: u32,
    pub partition_index: u32,
    pub mbr_disk_id: u32,
    pub gpt_disk_uuid: LimineUuid,
    pub gpt_part_uuid: LimineUuid,
    pub part_uuid: LimineUuid,
}

#[repr(C)]
pub struct LimineBaseRevision {
    pub revision: [u64; 3],
}

impl LimineBaseRevision {
    pub const fn new() -> Self {
        Self {
            revision: LIMINE_BASE_REVISION_MAGIC,
        }
    }

    pub fn supported(&self) -> bool {
        self.revision[2] == 0
    }
}

#[repr(C)]
pub struct LimineKernelFileResponse {
    pub revision: u64,
    pub kernel_file: *const LimineFile,
}

#[repr(C)]
pub struct LimineKernelFileRequest {
    pub id: [u64; 4],
    pub revision: u64,
    pub response: *const LimineKernelFileResponse,
}

impl LimineKernelFileRequest {
    pub const fn new() -> Self {
        Self {
            id: LIMINE_KERNEL_FILE_ID,
            revision: 0,
            response: ptr::null(),
        }
    }
}

#[repr(C)]
pub struct LimineModuleResponse {
    pub revision: u64,
    pub module_count: u64,
    pub modules: *const *const LimineFile,
}

#[repr(C)]
pub struct LimineModuleRequest {
    pub id: [u64; 4],
    pub revision: u64,
    pub response: *const LimineModuleResponse,
}

impl LimineModuleRequest {
    pub const fn new() -> Self {
        Self {
            id: LIMINE_MODULE_ID,
            revision: 0,
            response: ptr::null(),
        }
    }
}

unsafe impl Sync for LimineKernelFileResponse {}
unsafe impl Sync for LimineModuleResponse {}
unsafe impl Sync for LimineKernelFileRequest {}
unsafe impl Sync for LimineModuleRequest {}
unsafe impl Send for LimineKernelFileRequest {}
unsafe impl Send for LimineModuleRequest {}

#[used]
#[unsafe(link_section = ".limine_requests_start_marker")]
static LIMINE_REQUESTS_START_MARKER: [u64; 1] = [0];

#[used]
#[unsafe(link_section = ".limine_requests")]
static BASE_REVISION: LimineBaseRevision = LimineBaseRevision::new();

#[used]
#[unsafe(link_section = ".limine_requests")]
static KERNEL_FILE_REQUEST: LimineKernelFileRequest = LimineKernelFileRequest::new();

#[used]
#[unsafe(link_section = ".limine_requests")]
static MODULE_REQUEST: LimineModuleRequest = LimineModuleRequest::new();

#[used]
#[unsafe(link_section = ".limine_requests_end_marker")]
static LIMINE_REQUESTS_END_MARKER: [u64; 1] = [0];

/// Physical extent of a bootloader-loaded module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RamdiskRegion {
    pub address: u64,
    pub length: u64,
}

/// What the bootloader handed us, reduced to the pieces boot consumes.
#[derive(Clone, Copy, Debug)]
pub struct BootInfo {
    pub cmdline: Option<&'static str>,
    pub ramdisk: Option<RamdiskRegion>,
}

pub fn ensure_base_revision() {
    if !BASE_REVISION.supported() {
        crate::kernel_panic::kernel_panic("Limine base revision not supported");
    }
}

pub fn boot_info() -> BootInfo {
    let mut info = BootInfo {
        cmdline: None,
        ramdisk: None,
    };

    unsafe {
        if let Some(resp) = KERNEL_FILE_REQUEST.response.as_ref() {
            if let Some(kernel_file) = resp.kernel_file.as_ref() {
                if !kernel_file.cmdline.is_null() {
                    info.cmdline = CStr::from_ptr(kernel_file.cmdline as *const c_char)
                        .to_str()
                        .ok();
                    if let Some(cmd) = info.cmdline {
                        klog_debug!("boot: cmdline \"{}\"", cmd);
                    }
                }
            }
        }

        if let Some(resp) = MODULE_REQUEST.response.as_ref() {
            if resp.module_count > 0 {
                if let Some(module) = (*resp.modules).as_ref() {
                    info.ramdisk = Some(RamdiskRegion {
                        address: module.address as u64,
                        length: module.size,
                    });
                    klog_debug!(
                        "boot: ramdisk module at 0x{:x}, {} bytes",
                        module.address as u64,
                        module.size
                    );
                }
            }
        }
    }

    info
}
