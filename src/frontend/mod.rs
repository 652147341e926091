//! Frontend module - Lexer, Parser, Type Checking

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod token;

use crate::utils::Result;

/// Run the whole front end over one source text: lex, parse, type check.
///
/// On success the returned type map holds a type for every expression in the
/// program, plus any inserted coercions.
pub fn compile(source: &str) -> Result<(ast::Program, semantic::TypeMap)> {
    let program = parser::Parser::new(source).parse()?;
    let types = semantic::TypeChecker::check(&program)?;
    Ok((program, types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::CompileError;

    #[test]
    fn test_compile_pipeline() {
        let source = "\
int brighten(image img, int amount)
    # lift every channel by a constant
    image out = img;
    out[x, y] = img[x, y] + <<amount, amount, amount>>;
    write out -> console;
    ^ getWidth out;
";
        let (program, types) = compile(source).unwrap();
        assert_eq!(program.name, "brighten");
        assert_eq!(program.items.len(), 4);
        let ast::Item::Statement(ast::Stmt::Return { expr, .. }) = &program.items[3] else {
            panic!("expected return");
        };
        assert_eq!(types.type_of(expr.id), Some(ast::Type::Int));
    }

    #[test]
    fn test_compile_reports_stage_errors() {
        assert!(matches!(
            compile("void f() int x = @;"),
            Err(CompileError::Lexical(_))
        ));
        assert!(matches!(
            compile("void f() int x = ;"),
            Err(CompileError::Syntax(_))
        ));
        assert!(matches!(
            compile("void f() int x = true;"),
            Err(CompileError::Type(_))
        ));
    }
}
