use log::{debug, info, warn};
use std::io::{self, Write};

use crate::shell::environment::Environment;
use crate::shell::executor::Executor;
use crate::shell::history::History;
use crate::shell::parser::parse_line;
use crate::shell::readline::{read_logical_line, Input, LineSource};
use crate::shell::signals;
use crate::shell::state::ShellState;
use crate::utils::config::Config;
use crate::utils::error::{report, EXIT_INTERRUPTED};
use crate::utils::theme::{load_theme, Theme};

pub struct Shell {
    theme: Theme,
    input: Box<dyn LineSource>,
    state: ShellState,
}

impl Shell {
    pub fn new(config: &Config, input: Box<dyn LineSource>, interactive: bool) -> Self {
        let history = if interactive {
            History::load(config.history_file.clone())
        } else {
            History::new()
        };
        Self::with_environment(
            config,
            input,
            Environment::from_process(),
            history,
            interactive,
        )
    }

    pub fn with_environment(
        config: &Config,
        mut input: Box<dyn LineSource>,
        environment: Environment,
        history: History,
        interactive: bool,
    ) -> Self {
        for entry in history.entries() {
            input.add_history(entry);
        }
        let theme = if interactive {
            load_theme(&config.theme)
        } else {
            Theme::plain()
        };
        Self {
            theme,
            input,
            state: ShellState::new(environment, history, interactive),
        }
    }

    pub fn run(&mut self) -> i32 {
        debug!("初始化 minishell (交互模式: {})", self.state.interactive);

        if self.state.interactive {
            signals::setup_shell_signals();
        }

        self.run_loop();

        if self.state.interactive {
            if let Err(err) = self.state.history.save() {
                warn!("保存历史记录失败: {}", err);
            }
        }

        info!("退出 minishell，状态 {}", self.state.last_status);
        self.state.last_status
    }

    fn run_loop(&mut self) {
        while !self.state.should_exit {
            let _ = io::stdout().flush();
            signals::take_interrupt();

            match read_logical_line(&mut *self.input, &self.theme) {
                Ok(Input::Line(line)) => self.handle_input(&line),
                Ok(Input::Interrupted) => {
                    debug!("输入被中断");
                    self.state.last_status = EXIT_INTERRUPTED;
                }
                Ok(Input::Eof) => {
                    debug!("接收到 EOF，退出");
                    if self.state.interactive {
                        let _ = writeln!(io::stderr(), "exit");
                    }
                    break;
                }
                Err(err) => {
                    report(&err);
                    self.state.last_status = err.exit_status();
                }
            }
        }
    }

    fn handle_input(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        if self.state.history.record(line) {
            self.input.add_history(line);
        }

        let list = match parse_line(line) {
            Ok(list) => list,
            Err(err) => {
                report(&err);
                self.state.last_status = err.exit_status();
                return;
            }
        };
        debug!("解析结果: {:?}", list);

        let mut executor = Executor::new(
            &mut self.state,
            &mut *self.input,
            &self.theme.heredoc_prompt,
        );
        executor.execute(list);

        if signals::take_interrupt() {
            debug!("命令执行期间收到 SIGINT");
        }
    }
}
