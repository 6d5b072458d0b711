pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod validator;

use log::debug;

use crate::utils::error::ShellError;
use ast::PipelineList;

pub fn parse_line(line: &str) -> Result<PipelineList, ShellError> {
    let tokens = lexer::tokenize(line);
    debug!("词法分析结果: {:?}", tokens);
    validator::validate(&tokens)?;
    parser::parse(tokens)
}
