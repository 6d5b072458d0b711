use super::ast::{Command, LogicOp, Pipeline, PipelineList, Redirection};
use super::lexer::{RedirectOp, Token};
use crate::shell::expander::remove_quotes;
use crate::utils::error::ShellError;

pub struct Parser {
    tokens: std::vec::IntoIter<Token>,
    current_token: Token,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter();
        let current_token = tokens.next().unwrap_or(Token::EOF);
        Parser {
            tokens,
            current_token,
        }
    }

    fn next_token(&mut self) {
        self.current_token = self.tokens.next().unwrap_or(Token::EOF);
    }

    fn unexpected(&self) -> ShellError {
        ShellError::Syntax(self.current_token.text().to_string())
    }

    pub fn parse_pipeline_list(&mut self) -> Result<PipelineList, ShellError> {
        let mut list = Vec::new();

        while self.current_token != Token::EOF {
            let commands = self.parse_pipeline()?;
            let logic_op = match self.current_token {
                Token::And => LogicOp::And,
                Token::Or => LogicOp::Or,
                Token::EOF => LogicOp::None,
                _ => return Err(self.unexpected()),
            };
            list.push(Pipeline { commands, logic_op });
            if logic_op == LogicOp::None {
                break;
            }
            self.next_token();
            if self.current_token == Token::EOF {
                return Err(self.unexpected());
            }
        }

        Ok(list)
    }

    fn parse_pipeline(&mut self) -> Result<Vec<Command>, ShellError> {
        let mut commands = Vec::new();
        loop {
            commands.push(self.parse_simple_command()?);
            if self.current_token != Token::Pipe {
                break;
            }
            self.next_token();
        }
        Ok(commands)
    }

    fn parse_simple_command(&mut self) -> Result<Command, ShellError> {
        let mut command = Command::default();

        loop {
            match &self.current_token {
                Token::Word(word) => {
                    command.argv.push(word.clone());
                    self.next_token();
                }
                Token::Redirect(op) => {
                    let redirection = self.parse_redirection(*op)?;
                    command.redirections.push(redirection);
                }
                _ => break,
            }
        }

        if command.argv.is_empty() && command.redirections.is_empty() {
            return Err(self.unexpected());
        }
        Ok(command)
    }

    fn parse_redirection(&mut self, operator: RedirectOp) -> Result<Redirection, ShellError> {
        self.next_token(); // 跳过重定向操作符

        let word = match &self.current_token {
            Token::Word(word) => word.clone(),
            _ => return Err(self.unexpected()),
        };
        self.next_token();

        if operator == RedirectOp::HereDoc {
            let mut redirection = Redirection::new(operator, remove_quotes(&word));
            redirection.quoted = word.contains(['\'', '"']);
            return Ok(redirection);
        }
        Ok(Redirection::new(operator, word))
    }
}

pub fn parse(tokens: Vec<Token>) -> Result<PipelineList, ShellError> {
    Parser::new(tokens).parse_pipeline_list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::lexer::tokenize;

    #[allow(clippy::unwrap_used)]
    fn parse_str(line: &str) -> PipelineList {
        parse(tokenize(line)).unwrap()
    }

    #[test]
    fn test_simple_command() {
        let list = parse_str("ls -l");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].logic_op, LogicOp::None);
        let cmd = &list[0].commands[0];
        assert_eq!(cmd.argv, vec!["ls", "-l"]);
        assert!(cmd.redirections.is_empty());
        assert!(!cmd.expanded);
    }

    #[test]
    fn test_pipeline() {
        let list = parse_str("ls -l | grep foo | wc -l");
        assert_eq!(list.len(), 1);
        let cmds = &list[0].commands;
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].argv, vec!["ls", "-l"]);
        assert_eq!(cmds[1].argv, vec!["grep", "foo"]);
        assert_eq!(cmds[2].argv, vec!["wc", "-l"]);
    }

    #[test]
    fn test_logic_operators_thread_onto_pipelines() {
        let list = parse_str("a | b && c || d");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].commands.len(), 2);
        assert_eq!(list[0].logic_op, LogicOp::And);
        assert_eq!(list[1].logic_op, LogicOp::Or);
        assert_eq!(list[2].logic_op, LogicOp::None);
        assert_eq!(list[2].commands[0].argv, vec!["d"]);
    }

    #[test]
    fn test_interleaved_redirection() {
        let list = parse_str("echo hello > out.txt world >> log");
        let cmd = &list[0].commands[0];
        assert_eq!(cmd.argv, vec!["echo", "hello", "world"]);
        assert_eq!(
            cmd.redirections,
            vec![
                Redirection::new(RedirectOp::Output, "out.txt"),
                Redirection::new(RedirectOp::Append, "log"),
            ]
        );
    }

    #[test]
    fn test_raw_words_keep_quotes() {
        let list = parse_str("echo \"$HOME\" '$USER' > \"my file\"");
        let cmd = &list[0].commands[0];
        assert_eq!(cmd.argv, vec!["echo", "\"$HOME\"", "'$USER'"]);
        assert_eq!(cmd.redirections[0].target, "\"my file\"");
    }

    #[test]
    fn test_heredoc_delimiter() {
        let list = parse_str("cat << EOF << 'E'\"ND\"");
        let redirs = &list[0].commands[0].redirections;
        assert_eq!(redirs[0].target, "EOF");
        assert!(!redirs[0].quoted);
        assert_eq!(redirs[1].target, "END");
        assert!(redirs[1].quoted);
    }

    #[test]
    fn test_missing_redirection_target_does_not_panic() {
        let err = parse(tokenize("cat >")).err();
        assert!(matches!(err, Some(ShellError::Syntax(ref t)) if t == "newline"));
    }

    #[test]
    fn test_unvalidated_garbage_is_an_error() {
        assert!(parse(tokenize("ls ;")).is_err());
        assert!(parse(tokenize("ls &&")).is_err());
        assert!(parse(tokenize("| ls")).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_str("").is_empty());
    }
}
