//! Parameter expansion and quote removal.
//!
//! Words arrive from the parser exactly as typed. Expansion substitutes
//! `$NAME` and `$?` outside single quotes, then drops the quote delimiters
//! and escaping backslashes while keeping what they protected.

use std::iter::Peekable;
use std::str::Chars;

use log::trace;

use super::environment::Environment;
use super::parser::ast::{Command, Pipeline, PipelineList};
use super::parser::lexer::RedirectOp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// The raw word contained at least one quote delimiter.
    pub quoted: bool,
}

#[derive(Clone, Copy)]
struct Context<'a> {
    environment: &'a Environment,
    last_status: i32,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn expand_dollar(chars: &mut Peekable<Chars<'_>>, out: &mut String, context: Context<'_>) {
    match chars.peek() {
        Some('?') => {
            chars.next();
            out.push_str(&context.last_status.to_string());
        }
        Some(&c) if is_name_char(c) => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if !is_name_char(c) {
                    break;
                }
                name.push(c);
                chars.next();
            }
            if let Some(value) = context.environment.get(&name) {
                out.push_str(value);
            }
        }
        _ => out.push('$'),
    }
}

fn process(raw: &str, context: Option<Context<'_>>) -> Expanded {
    let mut out = String::with_capacity(raw.len());
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, '\\') => match chars.next() {
                Some('\n') => {}
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            },
            (None, '\'' | '"') => {
                quote = Some(c);
                quoted = true;
            }
            (Some('"'), '\\') => match chars.peek() {
                Some(&escaped) if matches!(escaped, '\\' | '"' | '`' | '$') => {
                    out.push(escaped);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            (Some(q), c) if c == q => quote = None,
            (None | Some('"'), '$') => match context {
                Some(context) => expand_dollar(&mut chars, &mut out, context),
                None => out.push('$'),
            },
            _ => out.push(c),
        }
    }

    Expanded { text: out, quoted }
}

pub fn expand_word(raw: &str, environment: &Environment, last_status: i32) -> Expanded {
    let expanded = process(
        raw,
        Some(Context {
            environment,
            last_status,
        }),
    );
    trace!("展开: {:?} -> {:?}", raw, expanded.text);
    expanded
}

pub fn remove_quotes(raw: &str) -> String {
    process(raw, None).text
}

pub fn expand_heredoc_line(line: &str, environment: &Environment, last_status: i32) -> String {
    let context = Context {
        environment,
        last_status,
    };
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&escaped) if matches!(escaped, '\\' | '$' | '`') => {
                    out.push(escaped);
                    chars.next();
                }
                _ => out.push('\\'),
            },
            '$' => expand_dollar(&mut chars, &mut out, context),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrites `argv`, redirection targets and heredoc bodies in place. A
/// command is expanded at most once.
pub fn expand_command(command: &mut Command, environment: &Environment, last_status: i32) {
    if command.expanded {
        return;
    }

    let argv = std::mem::take(&mut command.argv);
    command.argv = argv
        .iter()
        .filter_map(|raw| {
            let expanded = expand_word(raw, environment, last_status);
            // 未加引号且展开为空的参数直接丢弃
            if expanded.text.is_empty() && !expanded.quoted {
                None
            } else {
                Some(expanded.text)
            }
        })
        .collect();

    for redirection in &mut command.redirections {
        if redirection.operator == RedirectOp::HereDoc {
            if redirection.quoted {
                continue;
            }
            if let Some(body) = redirection.body.take() {
                let expanded = body
                    .lines()
                    .map(|line| expand_heredoc_line(line, environment, last_status) + "\n")
                    .collect();
                redirection.body = Some(expanded);
            }
            continue;
        }
        let expanded = expand_word(&redirection.target, environment, last_status);
        if expanded.text.is_empty() && !expanded.quoted {
            // 保留原始文本，用于 ambiguous redirect 报错
            redirection.ambiguous = true;
        } else {
            redirection.target = expanded.text;
        }
    }

    command.expanded = true;
}

pub fn expand_pipeline(pipeline: &mut Pipeline, environment: &Environment, last_status: i32) {
    for command in &mut pipeline.commands {
        expand_command(command, environment, last_status);
    }
}

pub fn expand(list: &mut PipelineList, environment: &Environment, last_status: i32) {
    for pipeline in list {
        expand_pipeline(pipeline, environment, last_status);
    }
}
