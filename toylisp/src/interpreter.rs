use crate::{env::Env, eval, parser, prelude::*, value::Value};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ParseErr(#[from] parser::ParseError),
    #[error(transparent)]
    EvalErr(#[from] eval::EvalError),
    #[error(transparent)]
    IOErr(#[from] io::Error),
}

/// Value of the last top-level form, `None` for a program without forms.
pub type Result<T = Option<Value>> = std::result::Result<T, Error>;

/// Parses and evaluates `code` one top-level form at a time.
///
/// A form is only parsed once the previous one has been evaluated,
/// the first error stops the program.
pub fn eval_with_env(code: &str, env: &Env) -> Result {
    let mut last = None;
    for exp in parser::Parser::from(code) {
        let value = eval::eval(&exp?, env)?;
        last = Some(value.tap(|value| log::debug!("form evaluated to {}", value)));
    }
    Ok(last)
}

#[derive(Debug, Default)]
pub struct Interpreter {
    env: Env,
}

impl Interpreter {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    /// The base environment, host procedures are bound here.
    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn eval(&mut self, code: &str) -> Result {
        eval_with_env(code, &self.env)
    }

    pub fn run(&mut self, mut source: impl io::Read) -> Result {
        let code = {
            let mut s = String::new();
            source.read_to_string(&mut s)?;
            s
        };
        self.eval(&code)
    }
}

pub fn eval(code: &str, env: Env) -> Result {
    Interpreter::new(env).eval(code)
}

pub fn run(source: impl io::Read, env: Env) -> Result {
    Interpreter::new(env).run(source)
}
