use crate::{
    env::Env,
    expr::{self, Expr},
    value::{Call, Proc, Value},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Unknown variable '{0}'")]
    Unbound(String),
    #[error("'{0}' is not a procedure!")]
    NotAProc(String),
    /// error raised by a host procedure, left untouched
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

/// A call whose arguments are still being evaluated.
struct Pending<'a> {
    call: &'a expr::Call,
    proc: Proc,
    values: Vec<Value>,
}

impl<'a> Pending<'a> {
    fn new(call: &'a expr::Call, env: &Env) -> Result<Self, EvalError> {
        let Value::Proc(proc) = env.get_var(&call.function)? else {
            return Err(EvalError::NotAProc(call.function.clone()));
        };
        Ok(Self {
            call,
            proc,
            values: Vec::with_capacity(call.arguments.len()),
        })
    }

    fn apply(self) -> Result<Value, EvalError> {
        log::trace!(
            "apply {} to {} argument(s)",
            self.call.function,
            self.values.len()
        );
        Ok(self.proc.call(&self.values)?)
    }
}

/// Evaluates `exp` in `env`.
///
/// Arguments are evaluated left to right before their procedure is applied.
/// Calls waiting for their arguments live on an explicit stack,
/// so the nesting depth of `exp` does not grow the native stack.
pub fn eval(exp: &Expr, env: &Env) -> Result<Value, EvalError> {
    let mut stack: Vec<Pending> = vec![];
    let mut next = exp;
    loop {
        let mut value = match next {
            Expr::Integer(i) => Value::Integer(*i),
            Expr::String(s) => Value::String(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Variable(name) => env.get_var(name)?,
            Expr::Call(call) => {
                let pending = Pending::new(call, env)?;
                match call.arguments.first() {
                    Some(first) => {
                        stack.push(pending);
                        next = first;
                        continue;
                    }
                    None => pending.apply()?,
                }
            }
        };

        // hand the value to the innermost pending call,
        // applying every call whose arguments are complete
        loop {
            let Some(mut pending) = stack.pop() else {
                return Ok(value);
            };
            pending.values.push(value);
            let call = pending.call;
            if let Some(arg) = call.arguments.get(pending.values.len()) {
                stack.push(pending);
                next = arg;
                break;
            }
            value = pending.apply()?;
        }
    }
}

/// Evaluates every expression in order, returning the value of the last one.
pub fn eval_script<'a>(
    exps: impl IntoIterator<Item = &'a Expr>,
    env: &Env,
) -> Result<Option<Value>, EvalError> {
    let mut last = None;
    for exp in exps {
        last = Some(eval(exp, env)?);
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, test_utils::arithmetic};
    use anyhow::Result;
    use std::{cell::RefCell, rc::Rc};

    fn eval_str(code: &str, env: &Env) -> Result<Value> {
        Ok(eval(&parser::parse_expr(code)?, env)?)
    }

    macro_rules! eval_test {
        ($fn_name:ident, $code:literal, $expected:expr) => {
            #[test]
            fn $fn_name() -> Result<()> {
                let result = eval_str($code, &arithmetic())?;
                assert_eq!(result, Value::from($expected));
                Ok(())
            }
        };
    }

    eval_test!(integer, "42", 42_i64);
    eval_test!(string, r#""hi""#, "hi");
    eval_test!(boolean, "false", false);
    eval_test!(addition, "(+ 1 1)", 2_i64);
    eval_test!(variadic_addition, "(+ 1 10 100 1000 10000)", 11111_i64);
    eval_test!(empty_addition, "(+)", 0_i64);
    eval_test!(nested_addition, "(+ 1 (+ 1 1))", 3_i64);
    eval_test!(subtraction_folds_left, "(- 10 1 1)", 8_i64);
    eval_test!(nested_subtraction, "(- 10 (+ 1 1 1) 1)", 6_i64);
    eval_test!(inner_calls_first, "(* (+ 1 2) (- 5 3))", 6_i64);

    #[test]
    fn variables() -> Result<()> {
        let env = arithmetic();
        env.define("x", 40_i64);
        assert_eq!(eval_str("(+ x 2)", &env.extend())?, Value::Integer(42));
        Ok(())
    }

    #[test]
    fn unbound_variable() {
        let err = eval_str("(+ 1 missing)", &arithmetic()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EvalError>(),
            Some(EvalError::Unbound(name)) if name == "missing"
        ));
    }

    #[test]
    fn unbound_procedure() {
        let err = eval_str("(frobnicate 1)", &arithmetic()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown variable 'frobnicate'");
    }

    #[test]
    fn not_a_procedure() {
        let env = arithmetic();
        env.define("answer", 42_i64);
        let err = eval_str("(answer 1)", &env).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EvalError>(),
            Some(EvalError::NotAProc(name)) if name == "answer"
        ));
    }

    #[test]
    fn host_errors_are_not_wrapped() {
        let err = eval_str(r#"(+ 1 "two")"#, &arithmetic()).unwrap_err();
        let Some(EvalError::Host(host)) = err.downcast_ref::<EvalError>() else {
            panic!("expected a host error, got {err}");
        };
        assert!(host.downcast_ref::<crate::value::ValueError>().is_some());
    }

    #[test]
    fn arguments_evaluated_left_to_right() -> Result<()> {
        let seen = Rc::new(RefCell::new(vec![]));
        let env = arithmetic();
        let log = seen.clone();
        env.define(
            "note",
            Proc::new(move |args| {
                let n = i64::try_from(&args[0])?;
                log.borrow_mut().push(n);
                Ok(n.into())
            }),
        );
        let result = eval_str("(+ (note 1) (note (+ (note 2) (note 3))) (note 4))", &env)?;
        assert_eq!(result, Value::Integer(10));
        assert_eq!(*seen.borrow(), vec![1, 2, 3, 5, 4]);
        Ok(())
    }

    #[test]
    fn deep_nesting() -> Result<()> {
        const DEPTH: usize = 20_000;
        let code = "(+ 1 1 ".repeat(DEPTH) + &")".repeat(DEPTH);
        assert_eq!(eval_str(&code, &arithmetic())?, Value::Integer(2 * DEPTH as i64));
        Ok(())
    }

    #[test]
    fn script_returns_last_value() -> Result<()> {
        let env = arithmetic();
        let exps = parser::parse_script("(+ 1 2) (- 9 4)")?;
        assert_eq!(eval_script(&exps, &env)?, Some(Value::Integer(5)));
        assert_eq!(eval_script(&[], &env)?, None);
        Ok(())
    }
}
