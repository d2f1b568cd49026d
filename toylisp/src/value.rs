use crate::expr::write_quoted;
use std::{fmt, rc::Rc};
use thiserror::Error;
use variantly::Variantly;

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Not an Integer!")]
    NotAnInt,
    #[error("Not a String!")]
    NotAString,
    #[error("Not a Bool!")]
    NotABool,
    #[error("Not a Procedure!")]
    NotAProc,
}

pub trait Call {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
}

type ProcFn = dyn Fn(&[Value]) -> anyhow::Result<Value>;

/// A host-side procedure bound into an environment.
#[derive(Clone)]
pub struct Proc(Rc<ProcFn>);

impl Proc {
    pub fn new(f: impl Fn(&[Value]) -> anyhow::Result<Value> + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl Call for Proc {
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}

impl fmt::Debug for Proc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Proc")
    }
}

/// Two procedures are equal only if they are the same closure.
impl PartialEq for Proc {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

#[derive(Variantly, Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    String(String),
    Bool(bool),
    Proc(Proc),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write_quoted(f, s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Proc(_) => f.write_str("#<procedure>"),
        }
    }
}

// copy types

macro_rules! impl_from_copy {
    ($type:ty, $body:expr, $unwrap_or:ident, $ref_unwrap_or:ident, $err:expr) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                $body(value)
            }
        }

        impl TryFrom<Value> for $type {
            type Error = ValueError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                value.$unwrap_or($err)
            }
        }

        impl TryFrom<&Value> for $type {
            type Error = ValueError;

            fn try_from(value: &Value) -> Result<Self, Self::Error> {
                value.$ref_unwrap_or($err).map(|x| *x)
            }
        }
    };
}

impl_from_copy!(i64, Value::Integer, integer_or, integer_ref_or, ValueError::NotAnInt);
impl_from_copy!(bool, Value::Bool, bool_or, bool_ref_or, ValueError::NotABool);

// non-copy types

macro_rules! impl_from {
    ($type:ty, $body:expr, $unwrap_or:ident, $ref_unwrap_or:ident, $err:expr) => {
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                $body(value)
            }
        }

        impl TryFrom<Value> for $type {
            type Error = ValueError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                value.$unwrap_or($err)
            }
        }

        impl TryFrom<&Value> for $type {
            type Error = ValueError;

            fn try_from(value: &Value) -> Result<Self, Self::Error> {
                value.$ref_unwrap_or($err).cloned()
            }
        }
    };
}

impl_from!(String, Value::String, string_or, string_ref_or, ValueError::NotAString);
impl_from!(Proc, Value::Proc, proc_or, proc_ref_or, ValueError::NotAProc);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}
