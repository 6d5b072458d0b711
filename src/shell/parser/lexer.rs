use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    And,
    Or,
    Redirect(RedirectOp),
    Semi,
    EOF,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectOp {
    Input,   // <
    Output,  // >
    Append,  // >>
    HereDoc, // <<
}

impl RedirectOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::Output => ">",
            RedirectOp::Append => ">>",
            RedirectOp::HereDoc => "<<",
        }
    }
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Word(word) => word,
            Token::Pipe => "|",
            Token::And => "&&",
            Token::Or => "||",
            Token::Redirect(op) => op.as_str(),
            Token::Semi => ";",
            Token::EOF => "newline",
        }
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Token::Pipe | Token::And | Token::Or)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Token::Redirect(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.peek_char() {
            None => Token::EOF,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    if self.peek_char() == Some('|') {
                        self.read_char();
                        Token::Or
                    } else {
                        Token::Pipe
                    }
                }
                // 单独的 '&' 不是运算符，属于单词的一部分
                '&' if self.peek_second() == Some('&') => {
                    self.read_char();
                    self.read_char();
                    Token::And
                }
                ';' => {
                    self.read_char();
                    Token::Semi
                }
                '<' => {
                    self.read_char();
                    if self.peek_char() == Some('<') {
                        self.read_char();
                        Token::Redirect(RedirectOp::HereDoc)
                    } else {
                        Token::Redirect(RedirectOp::Input)
                    }
                }
                '>' => {
                    self.read_char();
                    if self.peek_char() == Some('>') {
                        self.read_char();
                        Token::Redirect(RedirectOp::Append)
                    } else {
                        Token::Redirect(RedirectOp::Output)
                    }
                }
                _ => self.read_word(),
            },
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.input.clone();
        ahead.next();
        ahead.next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_blank(c) {
                break;
            }
            self.read_char();
        }
    }

    fn at_operator(&mut self) -> bool {
        match self.peek_char() {
            Some('|' | '<' | '>' | ';') => true,
            Some('&') => self.peek_second() == Some('&'),
            _ => false,
        }
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        let mut quote: Option<char> = None;

        while let Some(c) = self.peek_char() {
            match quote {
                Some(q) => {
                    self.read_char();
                    word.push(c);
                    if c == q {
                        quote = None;
                    } else if c == '\\' && q == '"' {
                        if let Some(escaped) = self.read_char() {
                            word.push(escaped);
                        }
                    }
                }
                None => {
                    if is_blank(c) || self.at_operator() {
                        break;
                    }
                    self.read_char();
                    word.push(c);
                    match c {
                        '\'' | '"' => quote = Some(c),
                        '\\' => {
                            if let Some(escaped) = self.read_char() {
                                word.push(escaped);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        Token::Word(word)
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

pub fn tokenize(line: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    loop {
        match lexer.next_token() {
            Token::EOF => break,
            token => tokens.push(token),
        }
    }
    tokens
}

/// Returns the quote character left open at the end of `line`, if any.
pub fn unclosed_quote(line: &str) -> Option<char> {
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') | (Some('"'), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    quote
}

pub fn has_unclosed_quotes(line: &str) -> bool {
    unclosed_quote(line).is_some()
}

pub fn ends_with_continuation(line: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => {
                if chars.next().is_none() {
                    return true;
                }
            }
            (Some('"'), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    false
}
