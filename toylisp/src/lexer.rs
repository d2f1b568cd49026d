use crate::reader::{CharReader, Position};
use std::str::Chars;
use thiserror::Error;
use variantly::Variantly;

const COMMENT: char = ';';
const QUOTE: char = '"';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Paren {
    Open,
    Close,
}

#[derive(Variantly, Debug, Clone, Eq, PartialEq)]
pub enum Token {
    /// decimal integer literal
    Integer(i64),
    /// double-quoted string literal, escapes already resolved
    String(String),
    Identifier(String),
    /// ( or )
    Paren(Paren),
}

impl Token {
    pub fn ident(s: &str) -> Self {
        Self::Identifier(s.to_owned())
    }

    pub fn text(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum LexError {
    #[error("Unable to parse character '{char}'(ord#{code}) at {pos}")]
    UnexpectedChar { char: char, code: u32, pos: Position },
    #[error("Unterminated string starting at {pos}")]
    UnterminatedString { pos: Position },
    #[error("Integer literal {digits} at {pos} does not fit in 64 bits")]
    IntegerOverflow { digits: String, pos: Position },
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

fn is_begin_identifier(ch: char) -> bool {
    ch.is_ascii_alphabetic() || "_?!+-*/%=<>".contains(ch)
}

fn is_identifier(ch: char) -> bool {
    is_begin_identifier(ch) || ch.is_ascii_digit()
}

/// Pulls [`Token`]s out of a [`CharReader`] one at a time.
#[derive(Debug)]
pub struct Lexer<I: Iterator<Item = char>> {
    reader: CharReader<I>,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(reader: CharReader<I>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> Position {
        self.reader.position()
    }

    fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut lexeme = String::new();
        while let Some(ch) = self.reader.peek().filter(|&ch| predicate(ch)) {
            lexeme.push(ch);
            self.reader.next();
        }
        lexeme
    }

    fn skip_comment(&mut self) {
        self.read_while(|ch| ch != '\n');
    }

    fn read_escaped(&mut self, end: char) -> Result<String, LexError> {
        let pos = self.pos();
        // opening delimiter
        self.reader.next();
        let mut string = String::new();
        let mut escaped = false;
        for ch in self.reader.by_ref() {
            match ch {
                _ if escaped => {
                    string.push(ch);
                    escaped = false;
                }
                ESCAPE => escaped = true,
                _ if ch == end => return Ok(string),
                _ => string.push(ch),
            }
        }
        Err(LexError::UnterminatedString { pos })
    }

    fn read_integer(&mut self) -> Result<Token, LexError> {
        let pos = self.pos();
        let digits = self.read_while(|ch| ch.is_ascii_digit());
        digits
            .parse()
            .map(Token::Integer)
            .map_err(|_| LexError::IntegerOverflow { digits, pos })
    }

    /// Reads the next token, or `None` once only whitespace and comments remain.
    pub fn read_next(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            self.read_while(is_whitespace);
            let Some(ch) = self.reader.peek() else {
                return Ok(None);
            };
            let token = match ch {
                COMMENT => {
                    self.skip_comment();
                    continue;
                }
                QUOTE => Token::String(self.read_escaped(QUOTE)?),
                '0'..='9' => self.read_integer()?,
                _ if is_begin_identifier(ch) => Token::Identifier(self.read_while(is_identifier)),
                '(' | ')' => {
                    self.reader.next();
                    Token::Paren(if ch == '(' { Paren::Open } else { Paren::Close })
                }
                _ => {
                    return Err(LexError::UnexpectedChar {
                        char: ch,
                        code: ch.into(),
                        pos: self.pos(),
                    })
                }
            };
            log::trace!("read token {:?}", token);
            return Ok(Some(token));
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

impl<'a> From<&'a str> for Lexer<Chars<'a>> {
    fn from(source: &'a str) -> Self {
        Self::new(source.into())
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::from(source).collect()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use super::Paren::{Close, Open};
    use super::*;

    /// macro to setup test boilerplate for lexer::tokenize
    macro_rules! lexer_test {
        ($fn_name:ident, $code:literal, $expected:expr) => {
            #[test]
            fn $fn_name() -> Result<()> {
                let tokens = tokenize($code)?;
                assert_eq!(tokens, $expected);
                Ok(())
            }
        };
    }

    lexer_test!(empty, "", vec![]);

    lexer_test!(only_whitespace, " \t\n  \n", vec![]);

    lexer_test!(identifier, "test", vec![Token::ident("test")]);

    lexer_test!(
        identifier_symbols,
        "empty? set! snake_case x1 <= %",
        vec![
            Token::ident("empty?"),
            Token::ident("set!"),
            Token::ident("snake_case"),
            Token::ident("x1"),
            Token::ident("<="),
            Token::ident("%"),
        ]
    );

    lexer_test!(integer, "42", vec![Token::Integer(42)]);

    lexer_test!(
        long_digit_run,
        "9223372036854775807",
        vec![Token::Integer(i64::MAX)]
    );

    // digits never start an identifier, so the run stops at the first letter
    lexer_test!(
        digits_then_letters,
        "12ab",
        vec![Token::Integer(12), Token::ident("ab")]
    );

    lexer_test!(string, r#""hello world""#, vec![Token::text("hello world")]);

    lexer_test!(
        string_escapes,
        r#""say \"hi\" \\ \n""#,
        vec![Token::text(r#"say "hi" \ n"#)]
    );

    lexer_test!(
        comments,
        "; leading comment
(+ 1 ; trailing comment
 2) ; done",
        vec![
            Token::Paren(Open),
            Token::ident("+"),
            Token::Integer(1),
            Token::Integer(2),
            Token::Paren(Close),
        ]
    );

    lexer_test!(
        addition,
        "(+ 1 1)",
        vec![
            Token::Paren(Open),
            Token::ident("+"),
            Token::Integer(1),
            Token::Integer(1),
            Token::Paren(Close),
        ]
    );

    lexer_test!(
        nested,
        "(* (+ 1 2) (- 5 3))",
        vec![
            Token::Paren(Open),
            Token::ident("*"),
            Token::Paren(Open),
            Token::ident("+"),
            Token::Integer(1),
            Token::Integer(2),
            Token::Paren(Close),
            Token::Paren(Open),
            Token::ident("-"),
            Token::Integer(5),
            Token::Integer(3),
            Token::Paren(Close),
            Token::Paren(Close),
        ]
    );

    #[test]
    fn digit_runs_are_one_token() -> Result<()> {
        for n in [0_i64, 7, 10, 123, 4096, 1_000_000_007] {
            let [token]: [Token; 1] = tokenize(&n.to_string())?
                .try_into()
                .map_err(|tokens| anyhow::anyhow!("{n} lexed as {tokens:?}"))?;
            assert!(token.is_integer());
            assert_eq!(token.unwrap_integer(), n);
        }
        Ok(())
    }

    #[test]
    fn token_accessors() -> Result<()> {
        let tokens = tokenize(r#"(f "x")"#)?;
        assert!(tokens[0].is_paren());
        assert_eq!(tokens[1].identifier_ref().map(String::as_str), Some("f"));
        assert_eq!(tokens[2].string_ref().map(String::as_str), Some("x"));
        assert_eq!(tokens[3].paren_ref(), Some(&Close));
        assert!(tokens[1].integer_ref().is_none());
        Ok(())
    }

    lexer_test!(
        carriage_returns,
        "(a\r\n b)\r\n",
        vec![
            Token::Paren(Open),
            Token::ident("a"),
            Token::ident("b"),
            Token::Paren(Close),
        ]
    );

    #[test]
    fn escape_before_end_of_input() {
        let err = tokenize(r#""abc\"#).unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedString {
                pos: Position { line: 0, column: 0 }
            }
        );
    }

    #[test]
    fn pos_follows_consumed_tokens() -> Result<()> {
        let mut lexer = Lexer::from("(ab\n  12");
        assert_eq!(lexer.pos(), Position { line: 0, column: 0 });
        lexer.read_next()?;
        lexer.read_next()?;
        assert_eq!(lexer.pos(), Position { line: 0, column: 3 });
        assert_eq!(lexer.read_next()?, Some(Token::Integer(12)));
        assert_eq!(lexer.pos(), Position { line: 1, column: 4 });
        Ok(())
    }

    #[test]
    fn unexpected_char_position() {
        let err = tokenize("(+ 1\n  @)").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                char: '@',
                code: 64,
                pos: Position { line: 1, column: 2 },
            }
        );
        assert_eq!(err.to_string(), "Unable to parse character '@'(ord#64) at [1:2]");
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize(r#"(print "oops)"#).unwrap_err();
        assert_eq!(
            err,
            LexError::UnterminatedString {
                pos: Position { line: 0, column: 7 }
            }
        );
    }

    #[test]
    fn integer_overflow() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(matches!(err, LexError::IntegerOverflow { .. }));
    }

    #[test]
    fn lexer_is_lazy() -> Result<()> {
        let mut lexer = Lexer::from("(a @");
        assert_eq!(lexer.read_next()?, Some(Token::Paren(Open)));
        assert_eq!(lexer.read_next()?, Some(Token::ident("a")));
        assert!(lexer.read_next().is_err());
        Ok(())
    }

    #[test]
    fn exhausted_lexer_keeps_returning_none() -> Result<()> {
        let mut lexer = Lexer::from("x ; the end");
        assert_eq!(lexer.read_next()?, Some(Token::ident("x")));
        assert_eq!(lexer.read_next()?, None);
        assert_eq!(lexer.read_next()?, None);
        Ok(())
    }
}
