use crate::prelude::*;
use std::{fmt, mem};

/// A call of the procedure bound to `function`.
///
/// The head of a call is always a name, the grammar has no way
/// to call the result of another expression.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Call {
    pub function: String,
    pub arguments: Vec<Expr>,
}

// the recursive drop glue would overflow the stack on deeply nested calls
impl Drop for Call {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.arguments);
        while let Some(mut expr) = pending.pop() {
            if let Expr::Call(call) = &mut expr {
                pending.append(&mut call.arguments);
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Expr {
    Integer(i64),
    String(String),
    Bool(bool),
    Variable(String),
    Call(Call),
}

impl Expr {
    pub fn var(name: &str) -> Self {
        Self::Variable(name.to_owned())
    }

    pub fn text(s: &str) -> Self {
        Self::String(s.to_owned())
    }

    pub fn call(function: &str, arguments: Vec<Expr>) -> Self {
        Self::Call(Call {
            function: function.to_owned(),
            arguments,
        })
    }
}

/// Writes `s` as a string literal the lexer reads back unchanged.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        if matches!(ch, '"' | '\\') {
            f.write_str("\\")?;
        }
        write!(f, "{}", ch)?;
    }
    f.write_str("\"")
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "({})", self.function)
        } else {
            write!(f, "({} {})", self.function, self.arguments.iter().join(" "))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(i) => write!(f, "{}", i),
            Expr::String(s) => write_quoted(f, s),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Variable(name) => f.write_str(name),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

/// Creates an [`Expr::Call`] like `vec!`, the first element names the procedure.
///
/// ```
/// # use toylisp::expr::{call, Expr};
/// let c = call!["+", Expr::Integer(1), Expr::Integer(2)];
/// assert_eq!(c.to_string(), "(+ 1 2)");
/// ```
#[macro_export]
macro_rules! call {
    [$name:expr] => (
        $crate::expr::Expr::call($name, vec![])
    );
    [$name:expr, $($x:expr),+ $(,)?] => (
        $crate::expr::Expr::call($name, vec![$($x),+])
    );
}

pub use call;
