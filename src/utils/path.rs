use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::{debug, error};

pub fn find_file_in_path(filename: &str, path_var: &str) -> Option<PathBuf> {
    let mut fallback = None;
    for dir in path_var.split(':') {
        // 空目录项表示当前目录
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = Path::new(dir).join(filename);
        let metadata = match fs::metadata(&candidate) {
            Ok(x) => x,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound && e.kind() != ErrorKind::PermissionDenied {
                    error!("minishell: metadata error: {}: {}", candidate.display(), e);
                }
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        if metadata.permissions().mode() & 0o111 != 0 {
            debug!("在 PATH 中找到命令: {}", candidate.display());
            return Some(candidate);
        }
        if fallback.is_none() {
            fallback = Some(candidate);
        }
    }
    fallback
}
