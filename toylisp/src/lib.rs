mod prelude {
    pub use itertools::Itertools;
    pub use tap::prelude::*;
}

pub mod env;
pub mod eval;
pub mod expr;
/// Module representing high-level entry-point of the interpreter.
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod value;

pub use env::Env;
pub use interpreter::Interpreter;
pub use value::{Proc, Value};
