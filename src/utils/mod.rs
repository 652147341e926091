//! Utility module

mod error;
mod loc;

pub use error::{CompileError, LexicalError, Result, SyntaxError, TypeError};
pub use loc::SourceLoc;
