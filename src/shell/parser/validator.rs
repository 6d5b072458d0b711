use log::debug;

use super::lexer::{RedirectOp, Token};
use crate::utils::error::ShellError;

/// Rejects token sequences the parser must never see.
///
/// The first offending token wins; its text (or `newline` for end of input)
/// goes into the `syntax error near unexpected token` message.
pub fn validate(tokens: &[Token]) -> Result<(), ShellError> {
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        match token {
            Token::Semi => return Err(unexpected(token.text())),
            _ if i == 0 && (token.is_control() || token.is_redirect()) => {
                return Err(unexpected(token.text()));
            }
            _ if token.is_control() => match next {
                None => return Err(unexpected("newline")),
                Some(next) if !next.is_word() => return Err(unexpected(next.text())),
                _ => {}
            },
            Token::Redirect(_) => match next {
                None => return Err(unexpected("newline")),
                Some(next) if next.is_redirect() => {
                    return Err(unexpected(&redirection_run_token(&tokens[i..])));
                }
                Some(next) if !next.is_word() => return Err(unexpected(next.text())),
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

fn unexpected(token: &str) -> ShellError {
    debug!("语法错误，位置: {}", token);
    ShellError::Syntax(token.to_string())
}

fn direction(op: RedirectOp) -> char {
    match op {
        RedirectOp::Input | RedirectOp::HereDoc => '<',
        RedirectOp::Output | RedirectOp::Append => '>',
    }
}

fn redirection_run_token(tokens: &[Token]) -> String {
    let ops: Vec<RedirectOp> = tokens
        .iter()
        .map_while(|token| match token {
            Token::Redirect(op) => Some(*op),
            _ => None,
        })
        .collect();
    let first = direction(ops[0]);
    let run: Vec<RedirectOp> = ops
        .iter()
        .copied()
        .take_while(|op| direction(*op) == first)
        .collect();
    let length: usize = run.iter().map(|op| op.as_str().len()).sum();
    let second = ops[1].as_str().to_string();
    let followed_by_word = tokens.get(run.len()).is_some_and(Token::is_word);

    match first {
        '>' if length == 2 && !followed_by_word => "newline".to_string(),
        '>' if length > 3 => ">>".to_string(),
        '<' if length == 4 => "<".to_string(),
        '<' if length == 5 => "<<".to_string(),
        _ => second,
    }
}
