use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use log::debug;
use nix::errno::Errno;
use nix::unistd::execve;

use crate::shell::environment::Environment;
use crate::utils::error::ShellError;
use crate::utils::path::find_file_in_path;

fn errno_of(err: &std::io::Error) -> Errno {
    Errno::from_raw(err.raw_os_error().unwrap_or(libc::EIO))
}

pub fn resolve(name: &str, environment: &Environment) -> Result<PathBuf, ShellError> {
    if name.is_empty() {
        return Err(ShellError::CommandNotFound(String::new()));
    }

    if name.contains('/') {
        let path = PathBuf::from(name);
        return match fs::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => Err(ShellError::Exec {
                path: name.to_string(),
                errno: Errno::EISDIR,
            }),
            Ok(_) => Ok(path),
            Err(err) => Err(ShellError::Exec {
                path: name.to_string(),
                errno: errno_of(&err),
            }),
        };
    }

    environment
        .get("PATH")
        .and_then(|path_var| find_file_in_path(name, path_var))
        .ok_or_else(|| ShellError::CommandNotFound(name.to_string()))
}

/// Replaces the current process image with `argv[0]`. Only returns when
/// that failed, with the error to report.
pub fn exec_external(argv: &[String], environment: &Environment) -> ShellError {
    let Some(name) = argv.first() else {
        return ShellError::CommandNotFound(String::new());
    };
    let path = match resolve(name, environment) {
        Ok(path) => path,
        Err(err) => return err,
    };
    debug!("执行外部命令: {} ({})", shell_words::join(argv), path.display());

    let invalid = || ShellError::Exec {
        path: name.clone(),
        errno: Errno::EINVAL,
    };
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return invalid();
    };
    let Ok(c_argv) = argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
    else {
        return invalid();
    };
    let c_env: Vec<CString> = environment
        .to_exec_array()
        .into_iter()
        .filter_map(|entry| CString::new(entry).ok())
        .collect();

    match execve(&c_path, &c_argv, &c_env) {
        Ok(never) => match never {},
        Err(errno) => ShellError::Exec {
            path: name.clone(),
            errno,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn env_with_path(path: &str) -> Environment {
        let mut environment = Environment::new();
        environment.set("PATH", path);
        environment
    }

    #[test]
    fn test_resolve_through_path() {
        let environment = env_with_path("/nonexistent:/bin:/usr/bin");
        let path = resolve("sh", &environment).ok();
        assert!(path.is_some_and(|p| p.ends_with("sh")));
    }

    #[test]
    fn test_resolve_not_found() {
        let environment = env_with_path("/bin:/usr/bin");
        let err = resolve("surely-not-a-command-xyz", &environment).err();
        assert_matches!(err, Some(ShellError::CommandNotFound(ref n)) if n == "surely-not-a-command-xyz");
        assert_matches!(
            resolve("", &environment),
            Err(ShellError::CommandNotFound(_))
        );
        assert_matches!(
            resolve("sh", &Environment::new()),
            Err(ShellError::CommandNotFound(_))
        );
    }

    #[test]
    fn test_resolve_explicit_paths() {
        let environment = Environment::new();
        assert_matches!(
            resolve("/", &environment),
            Err(ShellError::Exec { errno: Errno::EISDIR, .. })
        );
        let err = resolve("./no/such/file", &environment).err();
        assert_matches!(err, Some(ShellError::Exec { errno: Errno::ENOENT, .. }));
        assert_eq!(err.map(|e| e.exit_status()), Some(127));
    }
}
