use std::io::BufRead;

use crate::shell::parser::lexer::{ends_with_continuation, unclosed_quote};
use crate::utils::config::Config;
use crate::utils::error::ShellError;
use crate::utils::theme::Theme;
use log::{debug, error, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupted,
    Eof,
}

/// Where physical lines come from: the terminal, a script, or a test.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Input;

    fn add_history(&mut self, _line: &str) {}
}

pub struct ReadlineManager {
    editor: Editor<(), FileHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        Ok(Self { editor })
    }
}

impl LineSource for ReadlineManager {
    fn read_line(&mut self, prompt: &str) -> Input {
        match self.editor.readline(prompt) {
            Ok(line) => Input::Line(line),
            Err(ReadlineError::Interrupted) => {
                warn!("接收到中断信号...");
                Input::Interrupted
            }
            Err(ReadlineError::Eof) => {
                debug!("接收到 EOF");
                Input::Eof
            }
            Err(err) => {
                error!("读取输入失败: {}", err);
                Input::Eof
            }
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!("添加历史记录失败: {}", err);
        }
    }
}

pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self, _prompt: &str) -> Input {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Input::Eof,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                    if line.ends_with('\r') {
                        line.pop();
                    }
                }
                Input::Line(line)
            }
            Err(err) => {
                error!("读取输入失败: {}", err);
                Input::Eof
            }
        }
    }
}

/// Reads one logical line, asking for continuation lines as needed.
///
/// An unclosed quote joins the next physical line with a newline, which
/// becomes part of the quoted text. A trailing unquoted backslash is
/// dropped and the next line is appended with no separator.
pub fn read_logical_line(source: &mut dyn LineSource, theme: &Theme) -> Result<Input, ShellError> {
    let mut line = match source.read_line(&theme.prompt) {
        Input::Line(line) => line,
        other => return Ok(other),
    };

    loop {
        if let Some(quote) = unclosed_quote(&line) {
            match source.read_line(&theme.continuation_prompt) {
                Input::Line(next) => {
                    line.push('\n');
                    line.push_str(&next);
                }
                Input::Interrupted => return Ok(Input::Interrupted),
                Input::Eof => return Err(ShellError::UnexpectedEof(quote)),
            }
        } else if ends_with_continuation(&line) {
            line.pop();
            match source.read_line(&theme.continuation_prompt) {
                Input::Line(next) => line.push_str(&next),
                Input::Interrupted => return Ok(Input::Interrupted),
                Input::Eof => break,
            }
        } else {
            break;
        }
    }

    Ok(Input::Line(line))
}
