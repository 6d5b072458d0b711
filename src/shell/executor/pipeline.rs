use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use log::{debug, error, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{dup2, fork, pipe2, ForkResult, Pid};

use super::builtins::Builtin;
use super::exec::exec_external;
use super::executor::Executor;
use super::redirect;
use crate::shell::parser::ast::{Command, Pipeline};
use crate::shell::signals;
use crate::utils::error::{io_error_text, report, report_message, ShellError, EXIT_FAILURE};

fn exit_child(status: i32) -> ! {
    // SAFETY: _exit has no preconditions.
    unsafe { libc::_exit(status) }
}

fn wire(fd: &OwnedFd, stream: libc::c_int) {
    if let Err(errno) = dup2(fd.as_raw_fd(), stream) {
        report(&ShellError::sys("dup2", errno));
        exit_child(EXIT_FAILURE);
    }
}

impl Executor<'_> {
    pub fn run_pipeline(&mut self, pipeline: &Pipeline) -> i32 {
        if let [command] = pipeline.commands.as_slice() {
            if command.redirections.is_empty() {
                let Some(name) = command.program() else {
                    return 0;
                };
                // 内建命令在 shell 进程中直接执行，才能修改 shell 状态
                if let Some(builtin) = Builtin::from_name(name) {
                    let mut stdout = io::stdout().lock();
                    let status = builtin.run(&command.argv[1..], self.state, &mut stdout);
                    let _ = stdout.flush();
                    return status;
                }
            }
        }

        self.spawn_pipeline(&pipeline.commands)
    }

    fn spawn_pipeline(&mut self, commands: &[Command]) -> i32 {
        let count = commands.len();
        let mut pids: Vec<Pid> = Vec::new();
        if pids.try_reserve_exact(count).is_err() {
            report(&ShellError::sys("malloc", Errno::ENOMEM));
            return EXIT_FAILURE;
        }

        // 子进程会继承未刷新的缓冲区
        let _ = io::stdout().flush();

        let mut failed = false;
        let mut previous_read: Option<OwnedFd> = None;
        for (index, command) in commands.iter().enumerate() {
            let pipe = if index + 1 < count {
                match pipe2(OFlag::O_CLOEXEC) {
                    Ok(pipe) => Some(pipe),
                    Err(errno) => {
                        report(&ShellError::sys("pipe", errno));
                        failed = true;
                        break;
                    }
                }
            } else {
                None
            };

            // SAFETY: the shell is single-threaded; the child only rewires
            // descriptors before running a builtin or calling execve.
            match unsafe { fork() } {
                Ok(ForkResult::Child) => self.run_child(command, previous_read.take(), pipe),
                Ok(ForkResult::Parent { child }) => {
                    debug!("启动子进程 {}: {:?}", child, command.argv);
                    pids.push(child);
                }
                Err(errno) => {
                    report(&ShellError::sys("fork", errno));
                    failed = true;
                    break;
                }
            }

            // 父进程：上一个读端和当前写端都已交给子进程，只保留当前读端
            previous_read = pipe.map(|(read, _write)| read);
        }
        drop(previous_read);

        let status = wait_children(&pids);
        if failed {
            EXIT_FAILURE
        } else {
            status
        }
    }

    fn run_child(
        &mut self,
        command: &Command,
        stdin: Option<OwnedFd>,
        pipe: Option<(OwnedFd, OwnedFd)>,
    ) -> ! {
        signals::restore_default_signals();
        self.state.enter_child();

        if let Some(read) = stdin {
            wire(&read, libc::STDIN_FILENO);
        }
        if let Some((read, write)) = pipe {
            drop(read);
            wire(&write, libc::STDOUT_FILENO);
        }

        // 显式重定向在管道连接之后应用，因此优先生效
        if let Err(err) = redirect::apply(&command.redirections) {
            report(&err);
            exit_child(err.exit_status());
        }

        let Some(name) = command.program() else {
            exit_child(0);
        };
        let status = match Builtin::from_name(name) {
            // 不使用 io::stdout() 的锁：fork 时它可能被其他线程持有
            Some(builtin) => match io::stdout().as_fd().try_clone_to_owned() {
                Ok(fd) => {
                    let mut stdout = File::from(fd);
                    let status = builtin.run(&command.argv[1..], self.state, &mut stdout);
                    let _ = stdout.flush();
                    status
                }
                Err(err) => {
                    report_message(format!("dup: {}", io_error_text(&err)));
                    EXIT_FAILURE
                }
            },
            None => {
                let err = exec_external(&command.argv, &self.state.environment);
                report(&err);
                err.exit_status()
            }
        };
        exit_child(status)
    }
}

fn wait_children(pids: &[Pid]) -> i32 {
    let mut status = EXIT_FAILURE;
    let mut last_signal = None;

    for (index, pid) in pids.iter().enumerate() {
        let result = loop {
            match waitpid(*pid, None) {
                Ok(WaitStatus::Exited(_, code)) => break Some((code, None)),
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    break Some((128 + signal as i32, Some(signal)))
                }
                Ok(other) => debug!("子进程状态变化: {:?}", other),
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    error!("waitpid {} 失败: {}", pid, errno);
                    break None;
                }
            }
        };
        debug!("子进程 {} 结束: {:?}", pid, result);
        if index + 1 == pids.len() {
            if let Some((code, signal)) = result {
                status = code;
                last_signal = signal;
            }
        }
    }

    match last_signal {
        Some(Signal::SIGINT) => {
            let _ = writeln!(io::stderr());
        }
        Some(Signal::SIGQUIT) => {
            warn!("子进程因 SIGQUIT 退出");
            let _ = writeln!(io::stderr(), "Quit: 3");
        }
        _ => {}
    }
    status
}
