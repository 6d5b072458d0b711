use super::environment::Environment;
use super::history::History;

#[derive(Debug)]
pub struct ShellState {
    pub environment: Environment,
    pub last_status: i32,
    pub should_exit: bool,
    pub interactive: bool,
    pub history: History,
}

impl ShellState {
    pub fn new(environment: Environment, history: History, interactive: bool) -> Self {
        Self {
            environment,
            last_status: 0,
            should_exit: false,
            interactive,
            history,
        }
    }

    /// A forked pipeline stage is not the interactive shell: `exit` there
    /// ends only the stage, silently.
    pub fn enter_child(&mut self) {
        self.interactive = false;
        self.should_exit = false;
    }
}
