// this started as a recursive descent parser, the recursion now lives in an explicit
// stack of open calls so nesting depth is only bounded by the heap
use crate::{
    expr::{Call, Expr},
    lexer::{LexError, Lexer, Paren, Token},
    reader::Position,
};
use std::str::Chars;
use thiserror::Error;

/// Enum representing parser errors.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ParseError {
    #[error("call target must be a name at {pos}")]
    CallTarget { pos: Position },
    #[error("unexpected end of input inside call to {function} at {pos}")]
    UnexpectedEof { function: String, pos: Position },
    #[error("unexpected ')' at {pos}")]
    UnexpectedRParen { pos: Position },
    #[error("expected an expression, found end of input")]
    EmptyInput,
    #[error("unexpected tokens after the expression!")]
    UnexpectedTokens,
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// Result of reading a single atom.
#[derive(Debug, PartialEq)]
pub enum Atom {
    Expr(Expr),
    /// a closing parenthesis, only meaningful to an enclosing call
    End,
}

/// A call whose closing parenthesis has not been read yet.
#[derive(Default)]
struct Frame {
    function: Option<String>,
    arguments: Vec<Expr>,
}

impl Frame {
    fn push(&mut self, exp: Expr, pos: Position) -> Result<(), ParseError> {
        if self.function.is_some() {
            self.arguments.push(exp);
            return Ok(());
        }
        let Expr::Variable(name) = exp else {
            return Err(ParseError::CallTarget { pos });
        };
        self.function = Some(name);
        Ok(())
    }

    fn finish(self, pos: Position) -> Result<Expr, ParseError> {
        let function = self.function.ok_or(ParseError::CallTarget { pos })?;
        Ok(Expr::Call(Call {
            function,
            arguments: self.arguments,
        }))
    }
}

/// Identifiers `true` and `false` are the boolean literals.
fn parse_identifier(name: String) -> Expr {
    match name.as_str() {
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        _ => Expr::Variable(name),
    }
}

/// Pulls top-level forms out of a [`Lexer`].
#[derive(Debug)]
pub struct Parser<I: Iterator<Item = char>> {
    tokens: Lexer<I>,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(tokens: Lexer<I>) -> Self {
        Self { tokens }
    }

    pub fn pos(&self) -> Position {
        self.tokens.pos()
    }

    /// Reads one atom: a literal, a whole call, or the [`Atom::End`] of an enclosing call.
    /// Returns `None` once the tokens run out.
    pub fn parse_atom(&mut self) -> Result<Option<Atom>, ParseError> {
        let Some(token) = self.tokens.read_next()? else {
            return Ok(None);
        };
        Ok(Some(match token {
            Token::Paren(Paren::Open) => Atom::Expr(self.parse_call()?),
            Token::Paren(Paren::Close) => Atom::End,
            Token::Integer(i) => Atom::Expr(Expr::Integer(i)),
            Token::String(s) => Atom::Expr(Expr::String(s)),
            Token::Identifier(name) => Atom::Expr(parse_identifier(name)),
        }))
    }

    /// Parses the rest of a call whose opening parenthesis was just consumed.
    pub fn parse_call(&mut self) -> Result<Expr, ParseError> {
        let mut open = vec![Frame::default()];
        loop {
            let token = self.tokens.read_next()?;
            let pos = self.pos();
            let exp = match token {
                None => {
                    // innermost frame, the stack is never empty here
                    let frame = open.pop().unwrap_or_default();
                    return Err(match frame.function {
                        Some(function) => ParseError::UnexpectedEof { function, pos },
                        None => ParseError::CallTarget { pos },
                    });
                }
                Some(Token::Paren(Paren::Open)) => {
                    open.push(Frame::default());
                    continue;
                }
                Some(Token::Paren(Paren::Close)) => {
                    let Some(frame) = open.pop() else {
                        return Err(ParseError::UnexpectedRParen { pos });
                    };
                    frame.finish(pos)?
                }
                Some(Token::Integer(i)) => Expr::Integer(i),
                Some(Token::String(s)) => Expr::String(s),
                Some(Token::Identifier(name)) => parse_identifier(name),
            };
            match open.last_mut() {
                Some(frame) => frame.push(exp, pos)?,
                None => return Ok(exp),
            }
        }
    }

    /// Parses the next top-level form, `None` when the input is exhausted.
    pub fn parse_next(&mut self) -> Result<Option<Expr>, ParseError> {
        match self.parse_atom()? {
            Some(Atom::Expr(exp)) => {
                log::debug!("parsed a form ending at {}", self.pos());
                Ok(Some(exp))
            }
            Some(Atom::End) => Err(ParseError::UnexpectedRParen {
                pos: self.pos(),
            }),
            None => Ok(None),
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Parser<I> {
    type Item = Result<Expr, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_next().transpose()
    }
}

impl<'a> From<&'a str> for Parser<Chars<'a>> {
    fn from(source: &'a str) -> Self {
        Self::new(source.into())
    }
}

/// Parses exactly one form.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::from(source);
    let exp = parser.parse_next()?.ok_or(ParseError::EmptyInput)?;
    if parser.tokens.read_next()?.is_some() {
        return Err(ParseError::UnexpectedTokens);
    }
    Ok(exp)
}

pub fn parse_script(source: &str) -> Result<Vec<Expr>, ParseError> {
    Parser::from(source).collect()
}
