use std::sync::atomic::{AtomicI32, Ordering};

use log::{debug, error};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// Last signal caught by the interactive shell, 0 when none is pending.
static PENDING_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(signo: libc::c_int) {
    let saved = errno::errno();
    PENDING_SIGNAL.store(signo, Ordering::SeqCst);
    errno::set_errno(saved);
}

fn install(signal: Signal, handler: SigHandler, flags: SaFlags) -> nix::Result<()> {
    let action = SigAction::new(handler, flags, SigSet::empty());
    // SAFETY: record_signal only touches an atomic and errno.
    unsafe { sigaction(signal, &action) }.map(|_| ())
}

pub fn setup_shell_signals() {
    if let Err(err) = install(
        Signal::SIGINT,
        SigHandler::Handler(record_signal),
        SaFlags::SA_RESTART,
    ) {
        error!("安装 SIGINT 处理器失败: {}", err);
    }
    if let Err(err) = install(Signal::SIGQUIT, SigHandler::SigIgn, SaFlags::empty()) {
        error!("忽略 SIGQUIT 失败: {}", err);
    }
    debug!("信号处理器已安装");
}

// Rust 运行时默认忽略 SIGPIPE，子进程需要恢复
pub fn restore_default_signals() {
    for signal in [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE] {
        let _ = install(signal, SigHandler::SigDfl, SaFlags::empty());
    }
}

pub fn take_interrupt() -> bool {
    PENDING_SIGNAL.swap(0, Ordering::SeqCst) == libc::SIGINT
}
