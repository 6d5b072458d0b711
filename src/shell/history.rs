use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use log::{debug, warn};

// 多行条目（引号续行）在文件中以 `\n` 转义保存为一行
fn escape(entry: &str) -> String {
    entry.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct History {
    path: Option<PathBuf>,
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(content) => content.lines().map(unescape).collect(),
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!("无法加载历史记录: {} {}", path.display(), err);
                }
                Vec::new()
            }
        };
        debug!("历史记录加载成功: {} 条", entries.len());
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn record(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        if self.entries.last().is_some_and(|last| last == line) {
            return false;
        }
        self.entries.push(line.to_string());
        true
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = fs::File::create(path)?;
        for entry in &self.entries {
            writeln!(file, "{}", escape(entry))?;
        }
        debug!("历史记录保存成功: {}", path.display());
        Ok(())
    }
}
