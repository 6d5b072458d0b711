use log::debug;

use crate::shell::expander::expand_pipeline;
use crate::shell::parser::ast::{LogicOp, PipelineList};
use crate::shell::readline::LineSource;
use crate::shell::state::ShellState;
use crate::utils::error::EXIT_INTERRUPTED;

use super::redirect::collect_heredocs;

pub struct Executor<'a> {
    pub(super) state: &'a mut ShellState,
    input: &'a mut dyn LineSource,
    heredoc_prompt: &'a str,
}

impl<'a> Executor<'a> {
    pub fn new(
        state: &'a mut ShellState,
        input: &'a mut dyn LineSource,
        heredoc_prompt: &'a str,
    ) -> Self {
        Self {
            state,
            input,
            heredoc_prompt,
        }
    }

    /// A failed `&&` or a successful `||` ends the whole line, not just the
    /// next pipeline.
    pub fn execute(&mut self, mut list: PipelineList) -> i32 {
        // 整行的 heredoc 先全部读入，跳过的管道也不能把正文留在输入里
        if collect_heredocs(&mut list, &mut *self.input, self.heredoc_prompt).is_err() {
            debug!("heredoc 输入被中断");
            self.state.last_status = EXIT_INTERRUPTED;
            return EXIT_INTERRUPTED;
        }

        for pipeline in list.iter_mut() {
            expand_pipeline(pipeline, &self.state.environment, self.state.last_status);

            let status = self.run_pipeline(pipeline);
            self.state.last_status = status;

            if self.state.should_exit {
                break;
            }
            let stop = match pipeline.logic_op {
                LogicOp::And => status != 0,
                LogicOp::Or => status == 0,
                LogicOp::None => false,
            };
            if stop {
                debug!("{:?} 短路，跳过剩余命令 (状态 {})", pipeline.logic_op, status);
                break;
            }
        }
        self.state.last_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::environment::Environment;
    use crate::shell::history::History;
    use crate::shell::parser::parse_line;
    use crate::shell::readline::tests::ScriptedSource;
    use crate::shell::readline::Input;
    use std::fs;

    fn state() -> ShellState {
        let mut environment = Environment::new();
        environment.set("PATH", "/bin:/usr/bin");
        ShellState::new(environment, History::new(), false)
    }

    #[allow(clippy::unwrap_used)]
    fn execute(line: &str, state: &mut ShellState, source: &mut ScriptedSource) -> i32 {
        let list = parse_line(line).unwrap();
        Executor::new(state, source, "> ").execute(list)
    }

    fn run(line: &str) -> (i32, ShellState) {
        let mut state = state();
        let status = execute(line, &mut state, &mut ScriptedSource::new(&[]));
        (status, state)
    }

    #[test]
    fn test_and_or() {
        assert_eq!(run("true && false").0, 1);
        assert_eq!(run("false || true").0, 0);
        assert_eq!(run("true || false").0, 0);
        assert_eq!(run("false && true").0, 1);
    }

    #[test]
    fn test_short_circuit_ends_the_line() {
        // `false && A || B` 不会执行 B
        let (status, state) = run("false && export A=1 || export B=1");
        assert_eq!(status, 1);
        assert!(!state.environment.contains("A"));
        assert!(!state.environment.contains("B"));

        let (status, state) = run("true || export A=1 && export B=1");
        assert_eq!(status, 0);
        assert!(!state.environment.contains("A"));
        assert!(!state.environment.contains("B"));
    }

    #[test]
    fn test_status_expands_per_pipeline() {
        let (status, state) = run("sh -c 'exit 7' || export SEEN=$?");
        assert_eq!(status, 0);
        assert_eq!(state.environment.get("SEEN"), Some("7"));
    }

    #[test]
    fn test_not_found_sets_status() {
        let (status, state) = run("definitely-not-here-xyz || export S=$?");
        assert_eq!(status, 0);
        assert_eq!(state.environment.get("S"), Some("127"));
    }

    #[test]
    fn test_exit_stops_the_line() {
        let (status, state) = run("exit 42 || export AFTER=1");
        assert_eq!(status, 42);
        assert!(state.should_exit);
        assert!(!state.environment.contains("AFTER"));
    }

    #[test]
    fn test_interrupted_heredoc() {
        let mut state = state();
        let mut source = ScriptedSource::new(&["line"]);
        source.lines.push_back(Input::Interrupted);
        let status = execute("true && export BEFORE=1 && cat << EOF", &mut state, &mut source);
        assert_eq!(status, 130);
        assert!(!state.environment.contains("BEFORE"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_skipped_heredoc_is_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let line = format!("false && cat << ONE || cat << TWO > {}", out.display());
        let mut state = state();
        let mut source =
            ScriptedSource::new(&["echo leaked", "ONE", "echo leaked", "TWO", "next"]);
        assert_eq!(execute(&line, &mut state, &mut source), 1);
        assert!(!out.exists());
        assert_eq!(source.lines, [Input::Line("next".into())]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_heredocs_read_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let line = format!(
            "cat << ONE > {0} && cat << TWO >> {0}",
            out.display()
        );
        let mut state = state();
        let mut source = ScriptedSource::new(&["first", "ONE", "second", "TWO"]);
        assert_eq!(execute(&line, &mut state, &mut source), 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");
    }
}
