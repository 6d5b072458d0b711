use super::lexer::RedirectOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub operator: RedirectOp,
    pub target: String,
    /// Heredoc only: the delimiter was quoted, so the body is not expanded.
    pub quoted: bool,
    /// Heredoc only: read with the rest of the line, expanded with its command.
    pub body: Option<String>,
    pub ambiguous: bool,
}

impl Redirection {
    pub fn new(operator: RedirectOp, target: impl Into<String>) -> Self {
        Self {
            operator,
            target: target.into(),
            quoted: false,
            body: None,
            ambiguous: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
    pub redirections: Vec<Redirection>,
    pub expanded: bool,
}

impl Command {
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub logic_op: LogicOp,
}

pub type PipelineList = Vec<Pipeline>;
