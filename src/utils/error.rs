use std::fmt::Display;
use std::io::{self, Write};

use log::{error, warn};
use nix::errno::Errno;
use thiserror::Error;

pub const SHELL_NAME: &str = "minishell";

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_INTERRUPTED: i32 = 130;
pub const EXIT_NUMERIC_ARGUMENT: i32 = 255;
pub const EXIT_SYNTAX: i32 = 258;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error near unexpected token `{0}'")]
    Syntax(String),

    #[error("unexpected EOF while looking for matching `{0}'")]
    UnexpectedEof(char),

    #[error("{call}: {}", .errno.desc())]
    Sys { call: &'static str, errno: Errno },

    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{path}: {}", .errno.desc())]
    Exec { path: String, errno: Errno },

    #[error("{target}: {}", io_error_text(.source))]
    Redirect { target: String, source: io::Error },

    #[error("{0}: ambiguous redirect")]
    AmbiguousRedirect(String),

    #[error("{0}")]
    Builtin(String),
}

impl ShellError {
    pub fn sys(call: &'static str, errno: Errno) -> Self {
        ShellError::Sys { call, errno }
    }

    pub fn exit_status(&self) -> i32 {
        match self {
            ShellError::Syntax(_) | ShellError::UnexpectedEof(_) => EXIT_SYNTAX,
            ShellError::CommandNotFound(_) => EXIT_NOT_FOUND,
            ShellError::Exec { errno, .. } if *errno == Errno::ENOENT => EXIT_NOT_FOUND,
            ShellError::Exec { .. } => EXIT_NOT_EXECUTABLE,
            ShellError::Sys { .. }
            | ShellError::Redirect { .. }
            | ShellError::AmbiguousRedirect(_)
            | ShellError::Builtin(_) => EXIT_FAILURE,
        }
    }
}

pub fn io_error_text(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}

pub fn report(err: &ShellError) {
    match err {
        ShellError::Syntax(_) | ShellError::UnexpectedEof(_) => warn!("{}", err),
        _ => error!("{}", err),
    }
    report_message(err);
}

pub fn report_message(message: impl Display) {
    let _ = writeln!(io::stderr().lock(), "{}: {}", SHELL_NAME, message);
}
