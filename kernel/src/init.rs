//! Boot orchestration.
//!
//! Boot is an ordered list of named steps, each with a failure policy. A
//! fatal step stops the sequence and panics the machine; a tolerant step
//! logs and continues; the console-bind step halts quietly on failure
//! because without a console no diagnostic would reach anyone. There is no
//! retry logic anywhere, a step runs exactly once.

use spin::Once;

use basalt_abi::error::{ENOENT, ENOEXEC};
use basalt_abi::syscall::*;
use basalt_abi::task::{INIT_ENTRY_OFFSET, ProcessState};
use basalt_boot::kernel_panic::kernel_panic;
use basalt_boot::smp;
use basalt_lib::klog::{self, KlogLevel};
use basalt_lib::{InitFlag, cpu, klog_error, klog_info, klog_warn};

use crate::kargs::KernelArgs;
use crate::services::{
    ClockServices, FsServices, MemServices, ModuleServices, NodeId, RamdiskServices, S_IFDIR,
    SchedServices, StreamServices, SyscallHandlers, TaskServices, VideoServices,
    register_clock_services, register_mem_services, register_sched_services,
    register_task_services, sched_services,
};
use crate::syscall::{self, SyscallTableBuilder};
use crate::sysinfo;

/// Kernel modules loaded during boot, in order.
pub const MODULE_LIST: [&str; 3] = [
    "/usr/lib/modules/serial.ko",
    "/usr/lib/modules/nvme.ko",
    "/usr/lib/modules/ps2.ko",
];

pub const CONSOLE_PATH: &str = "/dev/stty";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the sequence; the machine panics.
    Fatal,
    /// Log and continue with the next step.
    Tolerant,
    /// Stop the sequence and park without diagnostics.
    HaltQuietly,
}

pub struct BootStep {
    pub name: &'static str,
    pub policy: FailurePolicy,
    pub run: fn(&BootEnv) -> Result<(), i32>,
}

/// Everything a boot step may touch: the parsed arguments plus the
/// collaborator tables of the subsystems being sequenced.
pub struct BootEnv {
    pub args: KernelArgs,
    pub fs: &'static FsServices,
    pub stream: &'static StreamServices,
    pub ramdisk: &'static RamdiskServices,
    pub module: &'static ModuleServices,
    pub video: &'static VideoServices,
    pub task: &'static TaskServices,
    pub mem: &'static MemServices,
    pub clock: &'static ClockServices,
    pub sched: &'static SchedServices,
    pub syscalls: &'static SyscallHandlers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootOutcome {
    Ready,
    ConsoleUnavailable { code: i32 },
    Failed { step: &'static str, code: i32 },
}

static CONSOLE: Once<NodeId> = Once::new();

static BOOT_CLAIM: InitFlag = InitFlag::new();

/// Claim the single boot attempt. Returns `true` exactly once; the boot
/// sequence must never be re-entered.
fn claim_boot() -> bool {
    BOOT_CLAIM.init_once()
}

/// Node the kernel console is bound to, once `console-bind` has run.
pub fn console_node() -> Option<NodeId> {
    CONSOLE.get().copied()
}

fn check(code: i32) -> Result<(), i32> {
    if code < 0 { Err(code) } else { Ok(()) }
}

pub struct ModuleLoadSummary {
    pub attempted: usize,
    pub failed: usize,
}

/// Load every module on the list. Any nonzero status is a failure;
/// individual failures are logged and do not stop the loop.
pub fn load_modules(module: &ModuleServices, paths: &[&'static str]) -> ModuleLoadSummary {
    let mut summary = ModuleLoadSummary {
        attempted: 0,
        failed: 0,
    };
    for &path in paths {
        summary.attempted += 1;
        let code = (module.load)(path);
        if code != 0 {
            summary.failed += 1;
            klog_info!("module: load failed for {} ({})", path, code);
        }
    }
    summary
}

fn step_namespace_init(env: &BootEnv) -> Result<(), i32> {
    check((env.fs.vfs_init)())?;
    check((env.fs.tmpfs_init)())
}

fn step_root_mount(env: &BootEnv) -> Result<(), i32> {
    check((env.fs.mount)(None, "/", "tmpfs"))
}

fn step_device_namespace_init(env: &BootEnv) -> Result<(), i32> {
    check((env.fs.devtmpfs_init)())?;
    check((env.fs.create)("/dev", S_IFDIR | 0o755))
}

fn step_device_mount(env: &BootEnv) -> Result<(), i32> {
    check((env.fs.mount)(None, "/dev", "devtmpfs"))
}

fn step_stream_init(env: &BootEnv) -> Result<(), i32> {
    check((env.stream.streams_init)())
}

fn step_random_device_init(env: &BootEnv) -> Result<(), i32> {
    check((env.stream.random_init)())
}

fn step_ramdisk_install(env: &BootEnv) -> Result<(), i32> {
    match env.args.ramdisk {
        Some(region) => check((env.ramdisk.install)(region.address, region.length)),
        None => {
            klog_info!("ramdisk: no module supplied, skipping");
            Ok(())
        }
    }
}

fn step_module_load(env: &BootEnv) -> Result<(), i32> {
    let summary = load_modules(env.module, &MODULE_LIST);
    klog_info!(
        "module: {} loaded, {} failed",
        summary.attempted - summary.failed,
        summary.failed
    );
    Ok(())
}

fn step_module_report(env: &BootEnv) -> Result<(), i32> {
    (env.module.report)();
    Ok(())
}

fn step_framebuffer_init(env: &BootEnv) -> Result<(), i32> {
    check((env.video.fbdev_init)())
}

fn step_syscall_table(env: &BootEnv) -> Result<(), i32> {
    let handlers = env.syscalls;
    let mut builder = SyscallTableBuilder::new();

    builder.register(SYSCALL_READ, "read", handlers.read);
    builder.register(SYSCALL_WRITE, "write", handlers.write);
    builder.register(SYSCALL_OPEN, "open", handlers.open);
    builder.register(SYSCALL_CLOSE, "close", handlers.close);
    builder.register(SYSCALL_SEEK, "seek", handlers.seek);
    builder.register(SYSCALL_MMAP, "mmap", handlers.mmap);
    builder.register(SYSCALL_MUNMAP, "munmap", handlers.munmap);
    builder.register(SYSCALL_IOCTL, "ioctl", handlers.ioctl);
    builder.register(SYSCALL_FCNTL, "fcntl", handlers.fcntl);
    builder.register(SYSCALL_GETCWD, "getcwd", handlers.getcwd);
    builder.register(SYSCALL_CHDIR, "chdir", handlers.chdir);
    builder.register(SYSCALL_READDIR, "readdir", handlers.readdir);
    builder.register(SYSCALL_SYSINFO, "sysinfo", sysinfo::syscall_sysinfo);
    builder.register(SYSCALL_OPENAT, "openat", handlers.openat);
    builder.register(SYSCALL_MKDIRAT, "mkdirat", handlers.mkdirat);
    builder.register(SYSCALL_FSTATAT, "fstatat", handlers.fstatat);
    builder.register(SYSCALL_UNLINKAT, "unlinkat", handlers.unlinkat);
    builder.register(SYSCALL_LINKAT, "linkat", handlers.linkat);
    builder.register(SYSCALL_READLINKAT, "readlinkat", handlers.readlinkat);
    builder.register(SYSCALL_FCHMODAT, "fchmodat", handlers.fchmodat);
    builder.register(SYSCALL_DUP3, "dup3", handlers.dup3);
    builder.register(SYSCALL_PIPE, "pipe", handlers.pipe);

    let table = syscall::publish(builder);

    // The sysinfo handler reads these at dispatch time.
    register_mem_services(env.mem);
    register_clock_services(env.clock);
    register_task_services(env.task);

    klog_info!("syscall: {} handlers registered", table.len());
    Ok(())
}

fn step_console_bind(env: &BootEnv) -> Result<(), i32> {
    match (env.fs.lookup)(CONSOLE_PATH) {
        Some(node) => {
            CONSOLE.call_once(|| node);
            klog_info!("console: bound to {}", CONSOLE_PATH);
            Ok(())
        }
        None => Err(-(ENOENT as i32)),
    }
}

fn step_init_process(env: &BootEnv) -> Result<(), i32> {
    let path = env.args.init_path();
    let created =
        (env.task.create_process)("init", ProcessState::ReadyToRun, INIT_ENTRY_OFFSET, path);
    if created {
        klog_info!("init: first process created from {}", path);
        Ok(())
    } else {
        Err(-(ENOEXEC as i32))
    }
}

pub const BOOT_STEPS: [BootStep; 13] = [
    BootStep {
        name: "namespace-init",
        policy: FailurePolicy::Fatal,
        run: step_namespace_init,
    },
    BootStep {
        name: "root-mount",
        policy: FailurePolicy::Fatal,
        run: step_root_mount,
    },
    BootStep {
        name: "device-namespace-init",
        policy: FailurePolicy::Fatal,
        run: step_device_namespace_init,
    },
    BootStep {
        name: "device-mount",
        policy: FailurePolicy::Fatal,
        run: step_device_mount,
    },
    BootStep {
        name: "stream-init",
        policy: FailurePolicy::Fatal,
        run: step_stream_init,
    },
    BootStep {
        name: "random-device-init",
        policy: FailurePolicy::Fatal,
        run: step_random_device_init,
    },
    BootStep {
        name: "ramdisk-install",
        policy: FailurePolicy::Fatal,
        run: step_ramdisk_install,
    },
    BootStep {
        name: "module-load",
        policy: FailurePolicy::Tolerant,
        run: step_module_load,
    },
    BootStep {
        name: "module-report",
        policy: FailurePolicy::Tolerant,
        run: step_module_report,
    },
    BootStep {
        name: "framebuffer-init",
        policy: FailurePolicy::Tolerant,
        run: step_framebuffer_init,
    },
    BootStep {
        name: "syscall-table-populate",
        policy: FailurePolicy::Fatal,
        run: step_syscall_table,
    },
    BootStep {
        name: "console-bind",
        policy: FailurePolicy::HaltQuietly,
        run: step_console_bind,
    },
    BootStep {
        name: "init-process-create",
        policy: FailurePolicy::Fatal,
        run: step_init_process,
    },
];

pub fn run_boot_sequence(env: &BootEnv) -> BootOutcome {
    for step in &BOOT_STEPS {
        klog_info!("boot: {}", step.name);
        if let Err(code) = (step.run)(env) {
            match step.policy {
                FailurePolicy::Tolerant => {
                    klog_warn!("boot: {} failed ({}), continuing", step.name, code);
                }
                FailurePolicy::HaltQuietly => {
                    return BootOutcome::ConsoleUnavailable { code };
                }
                FailurePolicy::Fatal => {
                    return BootOutcome::Failed {
                        step: step.name,
                        code,
                    };
                }
            }
        }
    }
    BootOutcome::Ready
}

/// Library entry point. The platform glue calls this on the bootstrap core
/// after the loader handoff, with the gate table already active.
pub fn kernel_main(env: &'static BootEnv) -> ! {
    if !claim_boot() {
        kernel_panic("boot sequence re-entered");
    }

    if let Some(debug) = env.args.debug_logging() {
        klog::set_level(if debug { KlogLevel::Debug } else { KlogLevel::Info });
    }

    match run_boot_sequence(env) {
        BootOutcome::Failed { step, code } => {
            klog_error!("boot: fatal failure in {} ({})", step, code);
            kernel_panic("boot sequence failed");
        }
        BootOutcome::ConsoleUnavailable { code } => {
            klog_error!("console: unavailable ({}), parking", code);
            halted_idle();
        }
        BootOutcome::Ready => {
            register_sched_services(env.sched);
            smp::release_secondary_cores(idle_loop);
            klog_info!("boot: sequence complete");
            idle_loop();
        }
    }
}

/// Terminal idle: sleep until the next interrupt, then offer the core to
/// the scheduler. Runs forever on every core.
pub fn idle_loop() -> ! {
    loop {
        cpu::hlt();
        if let Some(sched) = sched_services() {
            (sched.resched)();
        }
    }
}

/// Park loop for the console-unavailable outcome. Never reschedules.
pub fn halted_idle() -> ! {
    loop {
        cpu::hlt();
        cpu::pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kargs::DEFAULT_INIT_PATH;
    use crate::services::MemoryInfo;
    use basalt_abi::syscall::SyscallArgs;
    use basalt_boot::limine_protocol::RamdiskRegion;
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::vec::Vec;

    fn ret0() -> i32 {
        0
    }

    fn mount_ok(_source: Option<&'static str>, _target: &'static str, _fstype: &'static str) -> i32 {
        0
    }

    fn create_ok(_path: &'static str, _mode: u32) -> i32 {
        0
    }

    fn lookup_some(_path: &'static str) -> Option<NodeId> {
        Some(NodeId(7))
    }

    fn load_ok(_path: &'static str) -> i64 {
        0
    }

    fn report_noop() {}

    fn install_ok(_address: u64, _length: u64) -> i32 {
        0
    }

    fn create_process_ok(
        _name: &'static str,
        _state: ProcessState,
        _entry: u64,
        _path: &'static str,
    ) -> bool {
        true
    }

    fn one_process() -> u16 {
        1
    }

    fn memory_stub() -> MemoryInfo {
        MemoryInfo {
            total_pages: 64,
            free_pages: 32,
        }
    }

    fn uptime_stub() -> u64 {
        0
    }

    fn resched_noop() {}

    fn handler_noop(args: &mut SyscallArgs) {
        args.ret = 0;
    }

    static OK_FS: FsServices = FsServices {
        vfs_init: ret0,
        tmpfs_init: ret0,
        devtmpfs_init: ret0,
        mount: mount_ok,
        create: create_ok,
        lookup: lookup_some,
    };
    static OK_STREAM: StreamServices = StreamServices {
        streams_init: ret0,
        random_init: ret0,
    };
    static OK_RAMDISK: RamdiskServices = RamdiskServices {
        install: install_ok,
    };
    static OK_MODULE: ModuleServices = ModuleServices {
        load: load_ok,
        report: report_noop,
    };
    static OK_VIDEO: VideoServices = VideoServices { fbdev_init: ret0 };
    static OK_TASK: TaskServices = TaskServices {
        create_process: create_process_ok,
        process_count: one_process,
    };
    static OK_MEM: MemServices = MemServices {
        memory_info: memory_stub,
    };
    static OK_CLOCK: ClockServices = ClockServices {
        uptime_ms: uptime_stub,
    };
    static OK_SCHED: SchedServices = SchedServices {
        resched: resched_noop,
    };
    static NOOP_SYSCALLS: SyscallHandlers = SyscallHandlers {
        read: handler_noop,
        write: handler_noop,
        open: handler_noop,
        close: handler_noop,
        seek: handler_noop,
        mmap: handler_noop,
        munmap: handler_noop,
        ioctl: handler_noop,
        fcntl: handler_noop,
        getcwd: handler_noop,
        chdir: handler_noop,
        readdir: handler_noop,
        openat: handler_noop,
        mkdirat: handler_noop,
        fstatat: handler_noop,
        unlinkat: handler_noop,
        linkat: handler_noop,
        readlinkat: handler_noop,
        fchmodat: handler_noop,
        dup3: handler_noop,
        pipe: handler_noop,
    };

    fn env(args: KernelArgs, fs: &'static FsServices, task: &'static TaskServices) -> BootEnv {
        BootEnv {
            args,
            fs,
            stream: &OK_STREAM,
            ramdisk: &OK_RAMDISK,
            module: &OK_MODULE,
            video: &OK_VIDEO,
            task,
            mem: &OK_MEM,
            clock: &OK_CLOCK,
            sched: &OK_SCHED,
            syscalls: &NOOP_SYSCALLS,
        }
    }

    // Ordering test: records the externally visible milestones and checks
    // they happen in sequence, with the syscall table live before the
    // console lookup.

    static SEQ: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn seq_mount(_source: Option<&'static str>, target: &'static str, _fstype: &'static str) -> i32 {
        SEQ.lock().unwrap().push(target);
        0
    }

    fn seq_lookup(path: &'static str) -> Option<NodeId> {
        assert!(
            crate::syscall::is_published(),
            "console lookup ran before the syscall table was published"
        );
        SEQ.lock().unwrap().push(path);
        Some(NodeId(1))
    }

    fn seq_create_process(
        _name: &'static str,
        state: ProcessState,
        entry: u64,
        path: &'static str,
    ) -> bool {
        assert_eq!(state, ProcessState::ReadyToRun);
        assert_eq!(entry, INIT_ENTRY_OFFSET);
        SEQ.lock().unwrap().push(path);
        true
    }

    static SEQ_FS: FsServices = FsServices {
        vfs_init: ret0,
        tmpfs_init: ret0,
        devtmpfs_init: ret0,
        mount: seq_mount,
        create: create_ok,
        lookup: seq_lookup,
    };
    static SEQ_TASK: TaskServices = TaskServices {
        create_process: seq_create_process,
        process_count: one_process,
    };

    #[test]
    fn full_sequence_runs_in_order() {
        let env = env(KernelArgs::empty(), &SEQ_FS, &SEQ_TASK);
        let outcome = run_boot_sequence(&env);
        assert_eq!(outcome, BootOutcome::Ready);
        assert!(console_node().is_some());

        let seq = SEQ.lock().unwrap();
        assert_eq!(&seq[..], &["/", "/dev", CONSOLE_PATH, DEFAULT_INIT_PATH]);
    }

    // Module tolerance: a failing module never stops the loop.

    static MOD_CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn flaky_load(path: &'static str) -> i64 {
        MOD_CALLS.lock().unwrap().push(path);
        if path.contains("nvme") { -5 } else { 0 }
    }

    static FLAKY_MODULE: ModuleServices = ModuleServices {
        load: flaky_load,
        report: report_noop,
    };

    #[test]
    fn module_failures_do_not_stop_the_loop() {
        let summary = load_modules(&FLAKY_MODULE, &MODULE_LIST);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.failed, 1);

        let calls = MOD_CALLS.lock().unwrap();
        assert_eq!(&calls[..], &MODULE_LIST);
    }

    // Loaders report status, not errno: any nonzero value is a failure.

    static STATUS_CALLS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

    fn positive_status_load(path: &'static str) -> i64 {
        STATUS_CALLS.lock().unwrap().push(path);
        if path.contains("ps2") { 3 } else { 0 }
    }

    static POSITIVE_STATUS_MODULE: ModuleServices = ModuleServices {
        load: positive_status_load,
        report: report_noop,
    };

    #[test]
    fn positive_module_status_counts_as_failure() {
        let summary = load_modules(&POSITIVE_STATUS_MODULE, &MODULE_LIST);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(STATUS_CALLS.lock().unwrap().len(), 3);
    }

    #[test]
    fn boot_is_claimed_exactly_once() {
        assert!(claim_boot());
        assert!(!claim_boot());
    }

    // Console failure: the sequence stops before init-process creation.

    static INIT_ATTEMPTED: AtomicBool = AtomicBool::new(false);

    fn lookup_none(_path: &'static str) -> Option<NodeId> {
        None
    }

    fn tracking_create_process(
        _name: &'static str,
        _state: ProcessState,
        _entry: u64,
        _path: &'static str,
    ) -> bool {
        INIT_ATTEMPTED.store(true, Ordering::SeqCst);
        true
    }

    static NO_CONSOLE_FS: FsServices = FsServices {
        vfs_init: ret0,
        tmpfs_init: ret0,
        devtmpfs_init: ret0,
        mount: mount_ok,
        create: create_ok,
        lookup: lookup_none,
    };
    static TRACKING_TASK: TaskServices = TaskServices {
        create_process: tracking_create_process,
        process_count: one_process,
    };

    #[test]
    fn missing_console_halts_before_init_process() {
        let env = env(KernelArgs::empty(), &NO_CONSOLE_FS, &TRACKING_TASK);
        let outcome = run_boot_sequence(&env);
        assert_eq!(
            outcome,
            BootOutcome::ConsoleUnavailable {
                code: -(ENOENT as i32)
            }
        );
        assert!(!INIT_ATTEMPTED.load(Ordering::SeqCst));
    }

    // Fatal failure in an early step surfaces the step name and code.

    fn vfs_broken() -> i32 {
        -5
    }

    static BROKEN_FS: FsServices = FsServices {
        vfs_init: vfs_broken,
        tmpfs_init: ret0,
        devtmpfs_init: ret0,
        mount: mount_ok,
        create: create_ok,
        lookup: lookup_some,
    };

    #[test]
    fn fatal_step_failure_names_the_step() {
        let env = env(KernelArgs::empty(), &BROKEN_FS, &OK_TASK);
        let outcome = run_boot_sequence(&env);
        assert_eq!(
            outcome,
            BootOutcome::Failed {
                step: "namespace-init",
                code: -5
            }
        );
    }

    // Ramdisk region from the boot arguments reaches the installer.

    static INSTALLED: Mutex<Option<(u64, u64)>> = Mutex::new(None);

    fn recording_install(address: u64, length: u64) -> i32 {
        *INSTALLED.lock().unwrap() = Some((address, length));
        0
    }

    static RECORDING_RAMDISK: RamdiskServices = RamdiskServices {
        install: recording_install,
    };

    #[test]
    fn ramdisk_region_reaches_installer() {
        let mut args = KernelArgs::empty();
        args.ramdisk = Some(RamdiskRegion {
            address: 0x10_0000,
            length: 0x2000,
        });
        let mut env = env(args, &OK_FS, &OK_TASK);
        env.ramdisk = &RECORDING_RAMDISK;

        let outcome = run_boot_sequence(&env);
        assert_eq!(outcome, BootOutcome::Ready);
        assert_eq!(*INSTALLED.lock().unwrap(), Some((0x10_0000, 0x2000)));
    }
}
