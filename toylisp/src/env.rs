use crate::{eval::EvalError, value::Value};
use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

#[derive(Default)]
struct Scope {
    parent: Option<Env>,
    vars: HashMap<String, Value>,
}

/// Shared handle to one scope of a parent-linked chain.
///
/// Cloning the handle shares the scope. A child keeps its parent alive,
/// parents never reference their children.
#[derive(Clone, Default)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scope nested in `self`.
    pub fn extend(&self) -> Self {
        Self(Rc::new(RefCell::new(Scope {
            parent: Some(self.clone()),
            vars: HashMap::new(),
        })))
    }

    pub fn parent(&self) -> Option<Env> {
        self.0.borrow().parent.clone()
    }

    /// Finds the innermost scope that binds `name`.
    pub fn lookup(&self, name: &str) -> Option<Env> {
        let mut scope = Some(self.clone());
        while let Some(env) = scope {
            if env.0.borrow().vars.contains_key(name) {
                return Some(env);
            }
            scope = env.parent();
        }
        None
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: &str, val: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().vars.insert(name.to_owned(), val.into())
    }

    /// Updates the closest visible binding of `name`,
    /// or binds it here when no scope knows it yet.
    pub fn set_var(&self, name: &str, val: impl Into<Value>) -> Option<Value> {
        self.lookup(name).unwrap_or_else(|| self.clone()).define(name, val)
    }

    pub fn get_var(&self, name: &str) -> Result<Value, EvalError> {
        self.lookup(name)
            .and_then(|env| env.get_local(name))
            .ok_or_else(|| EvalError::Unbound(name.to_owned()))
    }

    fn get_local(&self, name: &str) -> Option<Value> {
        self.0.borrow().vars.get(name).cloned()
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.0.borrow().vars.contains_key(name)
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Env {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let env = Env::new();
        env.0
            .borrow_mut()
            .vars
            .extend(iter.into_iter().map(|(name, val)| (name.into(), val.into())));
        env
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        let mut names: Vec<_> = scope.vars.keys().collect();
        names.sort();
        f.debug_struct("Env")
            .field("vars", &names)
            .field("parent", &scope.parent)
            .finish()
    }
}
