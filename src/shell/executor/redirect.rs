use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;

use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::unistd::{dup2, pipe2};

use crate::shell::parser::ast::{PipelineList, Redirection};
use crate::shell::parser::lexer::RedirectOp;
use crate::shell::readline::{Input, LineSource};
use crate::utils::error::{report_message, ShellError};

// 不超过管道缓冲区，写入不会阻塞
const HEREDOC_PIPE_LIMIT: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
pub struct Interrupted;

fn redirect_error(target: &str) -> impl FnOnce(io::Error) -> ShellError + '_ {
    move |source| ShellError::Redirect {
        target: target.to_string(),
        source,
    }
}

fn open_target(redirection: &Redirection) -> Result<OwnedFd, ShellError> {
    let target = redirection.target.as_str();
    let file = match redirection.operator {
        RedirectOp::Input => File::open(target),
        RedirectOp::Output => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(target),
        RedirectOp::Append => OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o644)
            .open(target),
        RedirectOp::HereDoc => return heredoc_fd(redirection.body.as_deref().unwrap_or("")),
    };
    file.map(OwnedFd::from).map_err(redirect_error(target))
}

fn heredoc_fd(body: &str) -> Result<OwnedFd, ShellError> {
    if body.len() <= HEREDOC_PIPE_LIMIT {
        let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(|errno| ShellError::sys("pipe", errno))?;
        let mut writer = File::from(write);
        writer
            .write_all(body.as_bytes())
            .map_err(redirect_error("here-document"))?;
        return Ok(read);
    }

    let mut file = tempfile::tempfile().map_err(redirect_error("here-document"))?;
    file.write_all(body.as_bytes())
        .and_then(|_| file.seek(SeekFrom::Start(0)))
        .map_err(redirect_error("here-document"))?;
    Ok(OwnedFd::from(file))
}

/// Binds every redirection onto stdin/stdout in order; the last one per
/// stream wins. The first failure stops processing.
pub fn apply(redirections: &[Redirection]) -> Result<(), ShellError> {
    for redirection in redirections {
        if redirection.ambiguous {
            return Err(ShellError::AmbiguousRedirect(redirection.target.clone()));
        }
        let fd = open_target(redirection)?;
        let stream = match redirection.operator {
            RedirectOp::Input | RedirectOp::HereDoc => libc::STDIN_FILENO,
            RedirectOp::Output | RedirectOp::Append => libc::STDOUT_FILENO,
        };
        dup2(fd.as_raw_fd(), stream).map_err(|errno| ShellError::sys("dup2", errno))?;
        debug!(
            "重定向 {} {} -> fd {}",
            redirection.operator.as_str(),
            redirection.target,
            stream
        );
    }
    Ok(())
}

/// Reads the raw body of every heredoc on the line, in the order the
/// operators appear, before any pipeline runs. Bodies are expanded later,
/// together with the rest of their command.
pub fn collect_heredocs(
    list: &mut PipelineList,
    source: &mut dyn LineSource,
    prompt: &str,
) -> Result<(), Interrupted> {
    let heredocs = list
        .iter_mut()
        .flat_map(|pipeline| pipeline.commands.iter_mut())
        .flat_map(|command| command.redirections.iter_mut())
        .filter(|redirection| {
            redirection.operator == RedirectOp::HereDoc && redirection.body.is_none()
        });

    for redirection in heredocs {
        let mut body = String::new();
        loop {
            match source.read_line(prompt) {
                Input::Line(line) if line == redirection.target => break,
                Input::Line(line) => {
                    body.push_str(&line);
                    body.push('\n');
                }
                Input::Interrupted => return Err(Interrupted),
                Input::Eof => {
                    warn!("heredoc 遇到 EOF: {}", redirection.target);
                    report_message(format!(
                        "warning: here-document delimited by end-of-file (wanted `{}')",
                        redirection.target
                    ));
                    break;
                }
            }
        }
        debug!("heredoc 收集完成: {} 字节", body.len());
        redirection.body = Some(body);
    }
    Ok(())
}
