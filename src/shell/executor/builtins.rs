use std::env;
use std::io::{self, Write};

use log::debug;

use crate::shell::environment::is_valid_identifier;
use crate::shell::state::ShellState;
use crate::utils::error::{
    io_error_text, report, report_message, ShellError, EXIT_FAILURE, EXIT_NUMERIC_ARGUMENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Cd,
    Pwd,
    Export,
    Unset,
    Env,
    Exit,
    History,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "echo" => Some(Builtin::Echo),
            "cd" => Some(Builtin::Cd),
            "pwd" => Some(Builtin::Pwd),
            "export" => Some(Builtin::Export),
            "unset" => Some(Builtin::Unset),
            "env" => Some(Builtin::Env),
            "exit" => Some(Builtin::Exit),
            "history" => Some(Builtin::History),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Echo => "echo",
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Export => "export",
            Builtin::Unset => "unset",
            Builtin::Env => "env",
            Builtin::Exit => "exit",
            Builtin::History => "history",
        }
    }

    pub fn run(self, args: &[String], state: &mut ShellState, out: &mut dyn Write) -> i32 {
        debug!("执行内建命令: {} {:?}", self.name(), args);
        let result = match self {
            Builtin::Echo => echo(args, out),
            Builtin::Cd => cd(args, state, out),
            Builtin::Pwd => pwd(out),
            Builtin::Export => export(args, state, out),
            Builtin::Unset => Ok(unset(args, state)),
            Builtin::Env => env_builtin(args, state, out),
            Builtin::Exit => Ok(exit(args, state)),
            Builtin::History => history(state, out),
        };
        match result {
            Ok(status) => status,
            Err(err) => {
                report_message(format!("{}: write error: {}", self.name(), io_error_text(&err)));
                EXIT_FAILURE
            }
        }
    }
}

fn fail(message: String) -> i32 {
    report(&ShellError::Builtin(message));
    EXIT_FAILURE
}

fn is_n_flag(arg: &str) -> bool {
    arg.len() >= 2 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'n')
}

fn echo(args: &[String], out: &mut dyn Write) -> io::Result<i32> {
    let flags = args.iter().take_while(|arg| is_n_flag(arg)).count();
    write!(out, "{}", args[flags..].join(" "))?;
    if flags == 0 {
        writeln!(out)?;
    }
    Ok(0)
}

fn cd(args: &[String], state: &mut ShellState, out: &mut dyn Write) -> io::Result<i32> {
    if args.len() > 1 {
        return Ok(fail("cd: too many arguments".to_string()));
    }

    let environment = &state.environment;
    let mut print_target = false;
    let target = match args.first().map(String::as_str) {
        None => match environment.get("HOME") {
            Some(home) => home.to_string(),
            None => return Ok(fail("cd: HOME not set".to_string())),
        },
        Some("-") => match environment.get("OLDPWD") {
            Some(old) => {
                print_target = true;
                old.to_string()
            }
            None => return Ok(fail("cd: OLDPWD not set".to_string())),
        },
        Some(dir) => shellexpand::tilde_with_context(dir, || environment.get("HOME")).into_owned(),
    };

    let previous = match environment.get("PWD") {
        Some(pwd) => Some(pwd.to_string()),
        None => env::current_dir()
            .ok()
            .map(|dir| dir.to_string_lossy().into_owned()),
    };

    if let Err(err) = env::set_current_dir(&target) {
        return Ok(fail(format!("cd: {}: {}", target, io_error_text(&err))));
    }

    if let Some(previous) = previous {
        state.environment.set("OLDPWD", previous);
    }
    match env::current_dir() {
        Ok(dir) => state.environment.set("PWD", dir.to_string_lossy()),
        Err(_) => state.environment.set("PWD", target.as_str()),
    }
    if print_target {
        writeln!(out, "{}", target)?;
    }
    Ok(0)
}

fn pwd(out: &mut dyn Write) -> io::Result<i32> {
    match env::current_dir() {
        Ok(dir) => {
            writeln!(out, "{}", dir.display())?;
            Ok(0)
        }
        Err(err) => Ok(fail(format!("pwd: {}", io_error_text(&err)))),
    }
}

fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn export(args: &[String], state: &mut ShellState, out: &mut dyn Write) -> io::Result<i32> {
    if args.is_empty() {
        for (name, value) in state.environment.iter() {
            match value {
                Some(value) => writeln!(out, "declare -x {}={}", name, quote_value(value))?,
                None => writeln!(out, "declare -x {}", name)?,
            }
        }
        return Ok(0);
    }

    let mut status = 0;
    for arg in args {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (arg.as_str(), None),
        };
        if !is_valid_identifier(name) {
            status = fail(format!("export: `{}': not a valid identifier", arg));
            continue;
        }
        match value {
            Some(value) => state.environment.set(name, value),
            None => state.environment.declare(name),
        }
    }
    Ok(status)
}

fn unset(args: &[String], state: &mut ShellState) -> i32 {
    let mut status = 0;
    for arg in args {
        if !is_valid_identifier(arg) {
            status = fail(format!("unset: `{}': not a valid identifier", arg));
            continue;
        }
        state.environment.unset(arg);
    }
    status
}

fn env_builtin(args: &[String], state: &ShellState, out: &mut dyn Write) -> io::Result<i32> {
    if !args.is_empty() {
        return Ok(fail("env: too many arguments".to_string()));
    }
    for entry in state.environment.to_exec_array() {
        writeln!(out, "{}", entry)?;
    }
    Ok(0)
}

fn parse_exit_code(arg: &str) -> Option<i32> {
    arg.trim()
        .parse::<i64>()
        .ok()
        .map(|code| code.rem_euclid(256) as i32)
}

fn exit(args: &[String], state: &mut ShellState) -> i32 {
    if state.interactive {
        let _ = writeln!(io::stderr(), "exit");
    }

    let Some(arg) = args.first() else {
        state.should_exit = true;
        return state.last_status;
    };

    match parse_exit_code(arg) {
        None => {
            report(&ShellError::Builtin(format!(
                "exit: {}: numeric argument required",
                arg
            )));
            state.should_exit = true;
            EXIT_NUMERIC_ARGUMENT
        }
        Some(_) if args.len() > 1 => fail("exit: too many arguments".to_string()),
        Some(code) => {
            state.should_exit = true;
            code
        }
    }
}

fn history(state: &ShellState, out: &mut dyn Write) -> io::Result<i32> {
    for (index, entry) in state.history.entries().iter().enumerate() {
        writeln!(out, "{:5}  {}", index + 1, entry)?;
    }
    Ok(0)
}
