//! Semantic Analysis for Pict
//!
//! Performs:
//! - Symbol table management (declarations, initialization tracking)
//! - Bottom-up type inference over expressions
//! - Coercion insertion and statement validation
//!
//! One pass, one direction; the first violation aborts the check. Results are
//! recorded in a [`TypeMap`] keyed by expression id instead of mutating the
//! tree.

use std::collections::HashMap;

use log::debug;

use crate::frontend::ast::*;
use crate::utils::{Result, SourceLoc, TypeError};

// ==================== Type Map ====================

/// Side table holding the checker's per-expression results.
///
/// After a successful check every expression id has a recorded type. A
/// coercion, when present, differs from the recorded type and names the type
/// the value must be converted to downstream.
#[derive(Debug, Default, Clone)]
pub struct TypeMap {
    types: HashMap<ExprId, Type>,
    coercions: HashMap<ExprId, Type>,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded static type of a node.
    pub fn type_of(&self, id: ExprId) -> Option<Type> {
        self.types.get(&id).copied()
    }

    /// The coercion target of a node, if one was inserted.
    pub fn coercion_of(&self, id: ExprId) -> Option<Type> {
        self.coercions.get(&id).copied()
    }

    fn record(&mut self, id: ExprId, ty: Type) {
        self.types.insert(id, ty);
    }

    /// Request a conversion to `target`. A coercion equal to the node's own
    /// type is dropped; a later request overwrites an earlier one.
    fn coerce(&mut self, id: ExprId, target: Type) {
        if self.types.get(&id) == Some(&target) {
            self.coercions.remove(&id);
        } else {
            self.coercions.insert(id, target);
        }
    }
}

// ==================== Symbol Table ====================

/// A declared name
#[derive(Debug, Clone)]
pub struct Binding {
    pub ty: Type,
    pub initialized: bool,
}

/// Flat name-to-declaration map, scoped to one check call.
///
/// The program's own name is reserved and never insertable.
pub struct SymbolTable {
    entries: HashMap<String, Binding>,
    program_name: String,
}

impl SymbolTable {
    pub fn new(program_name: &str) -> Self {
        Self {
            entries: HashMap::new(),
            program_name: program_name.to_string(),
        }
    }

    /// Insert a new binding, uninitialized. Returns false if the name is
    /// already bound or collides with the program name.
    pub fn insert(&mut self, name: &str, ty: Type) -> bool {
        if name == self.program_name || self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(
            name.to_string(),
            Binding {
                ty,
                initialized: false,
            },
        );
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn init(&mut self, name: &str) {
        if let Some(binding) = self.entries.get_mut(name) {
            binding.initialized = true;
        }
    }
}

// ==================== Type Checker ====================

/// The type checker. Constructed fresh per program; owns the symbol table and
/// the accumulating type map for the duration of one check.
pub struct TypeChecker {
    symbols: SymbolTable,
    types: TypeMap,
    ret_type: Type,
}

impl TypeChecker {
    /// Validate a program and return the type annotations for its
    /// expressions.
    pub fn check(program: &Program) -> Result<TypeMap> {
        debug!("type checking program {}", program.name);
        let mut checker = Self {
            symbols: SymbolTable::new(&program.name),
            types: TypeMap::new(),
            ret_type: program.ret_type,
        };
        checker.check_program(program)?;
        Ok(checker.types)
    }

    fn check_program(&mut self, program: &Program) -> Result<()> {
        // parameters are bound and count as initialized
        for param in &program.params {
            self.check_name_def(param)?;
            self.symbols.init(&param.name);
        }
        for item in &program.items {
            match item {
                Item::Declaration(dec) => self.check_declaration(dec)?,
                Item::Statement(stmt) => self.check_statement(stmt)?,
            }
        }
        Ok(())
    }

    // ==================== Declarations ====================

    fn check_name_def(&mut self, def: &NameDef) -> Result<()> {
        if let Some(dim) = &def.dimension {
            self.check_dimension(dim)?;
        }
        if !self.symbols.insert(&def.name, def.ty) {
            return Err(TypeError::DuplicateDeclaration {
                name: def.name.clone(),
                loc: def.loc,
            }
            .into());
        }
        Ok(())
    }

    fn check_dimension(&mut self, dim: &Dimension) -> Result<()> {
        let width = self.check_expr(&dim.width)?;
        if width != Type::Int {
            return Err(TypeError::BadDimension { loc: dim.loc }.into());
        }
        let height = self.check_expr(&dim.height)?;
        if height != Type::Int {
            return Err(TypeError::BadDimension { loc: dim.loc }.into());
        }
        Ok(())
    }

    fn check_declaration(&mut self, dec: &Declaration) -> Result<()> {
        let dec_type = dec.name_def.ty;
        self.check_name_def(&dec.name_def)?;

        if dec_type == Type::Image {
            // an image needs a dimension or an initializer; either way the
            // name stays uninitialized until a later assignment
            match (&dec.name_def.dimension, &dec.init) {
                (None, None) => {
                    return Err(TypeError::ImageWithoutDimension { loc: dec.loc }.into())
                }
                // without a dimension the initializer must itself be an image
                (None, Some(init)) => {
                    self.check_expr(&init.expr)?;
                    let expr_type = self.node_type(&init.expr);
                    if expr_type != Type::Image {
                        return Err(TypeError::IncompatibleAssignment { loc: dec.loc }.into());
                    }
                }
                // a dimensioned image fills from its initializer like a
                // whole-image assignment: scalars become fill colors
                (Some(_), Some(init)) => match init.op {
                    InitOp::Assign => {
                        self.check_expr(&init.expr)?;
                        let expr_type = self.node_type(&init.expr);
                        if !assignment_compatible(dec_type, expr_type) {
                            return Err(TypeError::IncompatibleAssignment { loc: dec.loc }.into());
                        }
                        if expr_type == Type::Int {
                            self.types.coerce(init.expr.id, Type::Color);
                        } else if expr_type == Type::Float {
                            self.types.coerce(init.expr.id, Type::ColorFloat);
                        }
                    }
                    InitOp::Read => self.check_initializer(&dec.name_def, init, dec_type)?,
                },
                (Some(_), None) => {}
            }
            return Ok(());
        }

        if let Some(init) = &dec.init {
            self.check_initializer(&dec.name_def, init, dec_type)?;
            self.symbols.init(&dec.name_def.name);
        }
        Ok(())
    }

    fn check_initializer(&mut self, def: &NameDef, init: &Initializer, dec_type: Type) -> Result<()> {
        match init.op {
            InitOp::Assign => {
                self.check_expr(&init.expr)?;
                let expr_type = self.node_type(&init.expr);
                if !assignment_compatible(dec_type, expr_type) {
                    return Err(TypeError::IncompatibleAssignment { loc: def.loc }.into());
                }
                self.types.coerce(init.expr.id, dec_type);
            }
            InitOp::Read => {
                let source_type = self.check_expr(&init.expr)?;
                if source_type != Type::String && source_type != Type::Console {
                    return Err(TypeError::BadReadSource { loc: def.loc }.into());
                }
                if source_type == Type::Console {
                    self.types.coerce(init.expr.id, dec_type);
                }
            }
        }
        Ok(())
    }

    // ==================== Statements ====================

    fn check_statement(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Assign {
                name,
                selector,
                expr,
                loc,
            } => {
                let dec_type = match self.symbols.lookup(name) {
                    Some(binding) => binding.ty,
                    None => {
                        return Err(TypeError::UndefinedIdent {
                            name: name.clone(),
                            loc: *loc,
                        }
                        .into())
                    }
                };

                if dec_type != Type::Image {
                    if selector.is_some() {
                        return Err(TypeError::SelectorOnNonImage { loc: *loc }.into());
                    }
                    self.check_expr(expr)?;
                    let expr_type = self.node_type(expr);
                    if !assignment_compatible(dec_type, expr_type) {
                        return Err(TypeError::IncompatibleAssignment { loc: *loc }.into());
                    }
                    self.types.coerce(expr.id, dec_type);
                } else if let Some(selector) = selector {
                    // selector identifiers become temporary int bindings for
                    // the duration of this statement's check
                    let bound = self.bind_selector_vars(selector)?;
                    let result = self.check_pixel_assignment(selector, expr, dec_type, *loc);
                    for name in &bound {
                        self.symbols.remove(name);
                    }
                    result?;
                } else {
                    self.check_expr(expr)?;
                    let expr_type = self.node_type(expr);
                    if !assignment_compatible(dec_type, expr_type) {
                        return Err(TypeError::IncompatibleAssignment { loc: *loc }.into());
                    }
                    if expr_type == Type::Int {
                        self.types.coerce(expr.id, Type::Color);
                    } else if expr_type == Type::Float {
                        self.types.coerce(expr.id, Type::ColorFloat);
                    }
                }

                self.symbols.init(name);
                Ok(())
            }

            Stmt::Read {
                name,
                selector,
                source,
                loc,
            } => {
                let target_type = match self.symbols.lookup(name) {
                    Some(binding) => binding.ty,
                    None => {
                        return Err(TypeError::UndefinedIdent {
                            name: name.clone(),
                            loc: *loc,
                        }
                        .into())
                    }
                };
                if selector.is_some() {
                    return Err(TypeError::SelectorInRead { loc: *loc }.into());
                }
                let source_type = self.check_expr(source)?;
                if source_type != Type::String && source_type != Type::Console {
                    return Err(TypeError::BadReadSource { loc: *loc }.into());
                }
                if source_type == Type::Console {
                    self.types.coerce(source.id, target_type);
                }
                self.symbols.init(name);
                Ok(())
            }

            Stmt::Write { source, dest, loc } => {
                let source_type = self.check_expr(source)?;
                let dest_type = self.check_expr(dest)?;
                if dest_type != Type::String && dest_type != Type::Console {
                    return Err(TypeError::BadWriteDest { loc: *loc }.into());
                }
                if source_type == Type::Console {
                    return Err(TypeError::ConsoleWriteSource { loc: *loc }.into());
                }
                Ok(())
            }

            Stmt::Return { expr, loc } => {
                let expr_type = self.check_expr(expr)?;
                // exact match; no coercion on return
                if expr_type != self.ret_type {
                    return Err(TypeError::ReturnTypeMismatch { loc: *loc }.into());
                }
                Ok(())
            }
        }
    }

    /// Insert temporary int bindings for the selector coordinates that are
    /// plain identifiers. On failure any binding made so far is removed.
    fn bind_selector_vars(&mut self, selector: &PixelSelector) -> Result<Vec<String>> {
        let mut bound = Vec::new();
        for coord in [&selector.x, &selector.y] {
            if let ExprKind::Ident(name) = &coord.kind {
                if self.symbols.insert(name, Type::Int) {
                    self.symbols.init(name);
                    bound.push(name.clone());
                } else {
                    for name in &bound {
                        self.symbols.remove(name);
                    }
                    return Err(TypeError::DuplicateDeclaration {
                        name: name.clone(),
                        loc: coord.loc,
                    }
                    .into());
                }
            }
        }
        Ok(bound)
    }

    fn check_pixel_assignment(
        &mut self,
        selector: &PixelSelector,
        expr: &Expr,
        dec_type: Type,
        loc: SourceLoc,
    ) -> Result<()> {
        self.check_pixel_selector(selector)?;
        self.check_expr(expr)?;
        let expr_type = self.node_type(expr);
        if !assignment_compatible(dec_type, expr_type) {
            return Err(TypeError::IncompatibleAssignment { loc }.into());
        }
        self.types.coerce(expr.id, Type::Color);
        Ok(())
    }

    fn check_pixel_selector(&mut self, selector: &PixelSelector) -> Result<()> {
        let x = self.check_expr(&selector.x)?;
        if x != Type::Int {
            return Err(TypeError::BadPixelSelector {
                loc: selector.x.loc,
            }
            .into());
        }
        let y = self.check_expr(&selector.y)?;
        if y != Type::Int {
            return Err(TypeError::BadPixelSelector {
                loc: selector.y.loc,
            }
            .into());
        }
        Ok(())
    }

    // ==================== Expressions ====================

    /// Compute, record, and return the type of an expression bottom-up.
    ///
    /// The returned type is what the enclosing expression sees; it equals the
    /// recorded type everywhere except pixel access, which records int (the
    /// raw packed pixel) but presents as color.
    fn check_expr(&mut self, expr: &Expr) -> Result<Type> {
        match &expr.kind {
            ExprKind::BooleanLit(_) => Ok(self.record(expr, Type::Boolean)),
            ExprKind::IntLit(_) => Ok(self.record(expr, Type::Int)),
            ExprKind::FloatLit(_) => Ok(self.record(expr, Type::Float)),
            ExprKind::StringLit(_) => Ok(self.record(expr, Type::String)),
            ExprKind::ColorConst(_) => Ok(self.record(expr, Type::Color)),
            ExprKind::Console => Ok(self.record(expr, Type::Console)),

            ExprKind::Ident(name) => {
                let binding = self.symbols.lookup(name).ok_or_else(|| {
                    TypeError::UndefinedIdent {
                        name: name.clone(),
                        loc: expr.loc,
                    }
                })?;
                if !binding.initialized {
                    return Err(TypeError::UninitializedIdent {
                        name: name.clone(),
                        loc: expr.loc,
                    }
                    .into());
                }
                let ty = binding.ty;
                Ok(self.record(expr, ty))
            }

            ExprKind::ColorExpr { red, green, blue } => {
                let red_type = self.check_expr(red)?;
                let green_type = self.check_expr(green)?;
                let blue_type = self.check_expr(blue)?;
                if red_type != green_type || red_type != blue_type {
                    return Err(TypeError::BadColorComponents { loc: expr.loc }.into());
                }
                let result = match red_type {
                    Type::Int => Type::Color,
                    Type::Float => Type::ColorFloat,
                    _ => return Err(TypeError::BadColorComponents { loc: expr.loc }.into()),
                };
                Ok(self.record(expr, result))
            }

            ExprKind::Unary { op, expr: inner } => {
                let inner_type = self.check_expr(inner)?;
                let result = match (*op, inner_type) {
                    (UnOp::Not, Type::Boolean) => Type::Boolean,
                    (UnOp::Neg, Type::Int) => Type::Int,
                    (UnOp::Neg, Type::Float) => Type::Float,
                    (op, Type::Int | Type::Color) if op.is_color_op() => Type::Int,
                    (op, Type::Image) if op.is_color_op() => Type::Image,
                    (op, Type::Image) if op.is_image_op() => Type::Int,
                    _ => return Err(TypeError::BadUnaryOperand { loc: expr.loc }.into()),
                };
                Ok(self.record(expr, result))
            }

            ExprKind::Binary { left, op, right } => {
                let left_type = self.check_expr(left)?;
                let right_type = self.check_expr(right)?;
                let result = self.binary_result(expr, left, left_type, *op, right, right_type)?;
                Ok(self.record(expr, result))
            }

            ExprKind::Conditional {
                cond,
                true_case,
                false_case,
            } => {
                let cond_type = self.check_expr(cond)?;
                if cond_type != Type::Boolean {
                    return Err(TypeError::NonBooleanCondition { loc: expr.loc }.into());
                }
                let true_type = self.check_expr(true_case)?;
                let false_type = self.check_expr(false_case)?;
                if true_type != false_type {
                    return Err(TypeError::ConditionalArmMismatch { loc: expr.loc }.into());
                }
                Ok(self.record(expr, true_type))
            }

            ExprKind::PixelAccess {
                expr: inner,
                selector,
            } => {
                let inner_type = self.check_expr(inner)?;
                if inner_type != Type::Image {
                    return Err(TypeError::SelectorOnNonImage { loc: expr.loc }.into());
                }
                self.check_pixel_selector(selector)?;
                // records the raw packed-pixel type but reads as a color
                self.types.record(expr.id, Type::Int);
                self.types.coerce(expr.id, Type::Color);
                Ok(Type::Color)
            }
        }
    }

    fn binary_result(
        &mut self,
        expr: &Expr,
        left: &Expr,
        left_type: Type,
        op: BinOp,
        right: &Expr,
        right_type: Type,
    ) -> Result<Type> {
        use Type::*;

        let bad = || TypeError::BadBinaryOperands { loc: expr.loc }.into();

        if op.is_logical() {
            return if left_type == Boolean && right_type == Boolean {
                Ok(Boolean)
            } else {
                Err(bad())
            };
        }

        if op.is_equality() {
            return if left_type == right_type {
                Ok(Boolean)
            } else {
                Err(bad())
            };
        }

        if op.is_ordering() {
            return match (left_type, right_type) {
                (Int, Int) | (Float, Float) => Ok(Boolean),
                (Int, Float) => {
                    self.types.coerce(left.id, Float);
                    Ok(Boolean)
                }
                (Float, Int) => {
                    self.types.coerce(right.id, Float);
                    Ok(Boolean)
                }
                _ => Err(bad()),
            };
        }

        // arithmetic: the shared promotion rule first
        if let Some(result) = self.promote(left, left_type, right, right_type) {
            return Ok(result);
        }

        // *, / and % additionally accept image and color scalar forms
        if matches!(op, BinOp::Mul | BinOp::Div | BinOp::Mod) {
            let result = match (left_type, right_type) {
                (Image, Int) | (Image, Float) => Image,
                (Int, Color) => {
                    self.types.coerce(left.id, Color);
                    Color
                }
                (Color, Int) => {
                    self.types.coerce(right.id, Color);
                    Color
                }
                (Float, Color) | (Color, Float) => {
                    self.types.coerce(left.id, ColorFloat);
                    self.types.coerce(right.id, ColorFloat);
                    ColorFloat
                }
                _ => return Err(bad()),
            };
            return Ok(result);
        }

        Err(bad())
    }

    /// Shared promotion rule for `+ - * / %`. Returns None when the pair is
    /// not covered; callers decide whether further forms apply.
    fn promote(&mut self, left: &Expr, left_type: Type, right: &Expr, right_type: Type) -> Option<Type> {
        use Type::*;
        match (left_type, right_type) {
            (Int, Int) => Some(Int),
            (Float, Float) => Some(Float),
            (Color, Color) => Some(Color),
            (ColorFloat, ColorFloat) => Some(ColorFloat),
            (Image, Image) => Some(Image),
            (Int, Float) => {
                self.types.coerce(left.id, Float);
                Some(Float)
            }
            (Float, Int) => {
                self.types.coerce(right.id, Float);
                Some(Float)
            }
            (ColorFloat, Color) => {
                self.types.coerce(right.id, ColorFloat);
                Some(ColorFloat)
            }
            (Color, ColorFloat) => {
                self.types.coerce(left.id, ColorFloat);
                Some(ColorFloat)
            }
            _ => None,
        }
    }

    // ==================== Helpers ====================

    fn record(&mut self, expr: &Expr, ty: Type) -> Type {
        self.types.record(expr.id, ty);
        ty
    }

    /// The recorded type of an already-checked node. Assignment and
    /// declaration checks read this rather than the presented type.
    fn node_type(&self, expr: &Expr) -> Type {
        self.types.type_of(expr.id).unwrap_or(Type::Void)
    }
}

/// The assignment compatibility relation.
fn assignment_compatible(target: Type, source: Type) -> bool {
    use Type::*;
    target == source
        || matches!(
            (target, source),
            (Int, Float)
                | (Float, Int)
                | (Int, Color)
                | (Color, Int)
                | (Image, Int)
                | (Image, Float)
                | (Image, Color)
                | (Image, ColorFloat)
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use crate::utils::CompileError;
    use pretty_assertions::assert_eq;

    fn check(source: &str) -> Result<(Program, TypeMap)> {
        let program = Parser::new(source).parse()?;
        let types = TypeChecker::check(&program)?;
        Ok((program, types))
    }

    fn check_ok(source: &str) -> (Program, TypeMap) {
        check(source).unwrap()
    }

    fn check_err(source: &str) -> TypeError {
        match check(source).unwrap_err() {
            CompileError::Type(e) => e,
            other => panic!("expected type error, got {other:?}"),
        }
    }

    /// Initializer expression of the n-th item, which must be a declaration.
    fn init_expr(program: &Program, n: usize) -> &Expr {
        let Item::Declaration(dec) = &program.items[n] else {
            panic!("expected declaration");
        };
        &dec.init.as_ref().unwrap().expr
    }

    #[test]
    fn test_literal_types() {
        let (program, types) = check_ok(
            "void f() int a = 1; float b = 1.5; boolean c = true; string d = \"s\"; color e = RED;",
        );
        let expected = [
            Type::Int,
            Type::Float,
            Type::Boolean,
            Type::String,
            Type::Color,
        ];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(types.type_of(init_expr(&program, n).id), Some(*want));
        }
    }

    #[test]
    fn test_numeric_assignment_coercion() {
        let (program, types) = check_ok("void f() int x = 1.5; float y = 2;");
        assert_eq!(types.coercion_of(init_expr(&program, 0).id), Some(Type::Int));
        assert_eq!(
            types.coercion_of(init_expr(&program, 1).id),
            Some(Type::Float)
        );
    }

    #[test]
    fn test_no_coercion_when_types_match() {
        let (program, types) = check_ok("void f() int x = 3;");
        assert_eq!(types.coercion_of(init_expr(&program, 0).id), None);
    }

    #[test]
    fn test_string_to_int_rejected() {
        assert!(matches!(
            check_err("void f() int x = \"s\";"),
            TypeError::IncompatibleAssignment { .. }
        ));
    }

    #[test]
    fn test_undefined_identifier() {
        assert!(matches!(
            check_err("void f() x = 3;"),
            TypeError::UndefinedIdent { .. }
        ));
        assert!(matches!(
            check_err("void f() int y = x;"),
            TypeError::UndefinedIdent { .. }
        ));
    }

    #[test]
    fn test_uninitialized_use() {
        assert!(matches!(
            check_err("void f() int x; int y = x;"),
            TypeError::UninitializedIdent { .. }
        ));
        // initialization by assignment clears the restriction
        check_ok("void f() int x; x = 1; int y = x;");
    }

    #[test]
    fn test_duplicate_declaration() {
        assert!(matches!(
            check_err("void f() int x; float x;"),
            TypeError::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn test_program_name_reserved() {
        assert!(matches!(
            check_err("void f() int f;"),
            TypeError::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn test_params_are_initialized() {
        check_ok("int g(int a, int b) ^ a + b;");
    }

    #[test]
    fn test_return_type_must_match_exactly() {
        check_ok("int g() ^ 3;");
        assert!(matches!(
            check_err("int g() ^ 3.5;"),
            TypeError::ReturnTypeMismatch { .. }
        ));
        assert!(matches!(
            check_err("float g(int a) ^ a;"),
            TypeError::ReturnTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_conditional_rules() {
        check_ok("int g(boolean b) ^ if (b) 1 else 2 fi;");
        assert!(matches!(
            check_err("int g() ^ if (1) 2 else 3 fi;"),
            TypeError::NonBooleanCondition { .. }
        ));
        assert!(matches!(
            check_err("int g(boolean b) ^ if (b) 1 else 2.5 fi;"),
            TypeError::ConditionalArmMismatch { .. }
        ));
    }

    #[test]
    fn test_color_literal_typing() {
        let (program, types) = check_ok("void f() color c = <<1, 2, 3>>;");
        assert_eq!(
            types.type_of(init_expr(&program, 0).id),
            Some(Type::Color)
        );
        assert!(matches!(
            check_err("void f() color c = <<1, 2.0, 3>>;"),
            TypeError::BadColorComponents { .. }
        ));
        assert!(matches!(
            check_err("void f() color c = <<true, true, true>>;"),
            TypeError::BadColorComponents { .. }
        ));
    }

    #[test]
    fn test_float_components_make_colorfloat() {
        // colorfloat is not assignment compatible with a color target
        assert!(matches!(
            check_err("void f() color c = <<1.0, 2.0, 3.0>>;"),
            TypeError::IncompatibleAssignment { .. }
        ));
        check_ok("void f(image img) img = <<1.0, 2.0, 3.0>>;");
    }

    #[test]
    fn test_unary_operator_table() {
        check_ok("boolean g(boolean b) ^ !b;");
        check_ok("float g(float x) ^ -x;");
        check_ok("int g(color c) ^ getRed c;");
        check_ok("image g(image i) ^ getBlue i;");
        check_ok("int g(image i) ^ getWidth i;");
        assert!(matches!(
            check_err("int g(int x) ^ getWidth x;"),
            TypeError::BadUnaryOperand { .. }
        ));
        assert!(matches!(
            check_err("int g(int x) ^ !x;"),
            TypeError::BadUnaryOperand { .. }
        ));
    }

    #[test]
    fn test_binary_arithmetic_promotion() {
        let (program, types) = check_ok("void f(int a, float b) float x = a + b;");
        // the int side picks up a float coercion
        let expr = init_expr(&program, 0);
        let ExprKind::Binary { left, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(types.coercion_of(left.id), Some(Type::Float));
        assert_eq!(types.type_of(expr.id), Some(Type::Float));
    }

    #[test]
    fn test_image_arithmetic() {
        check_ok("image g(image a, image b) ^ a + b;");
        check_ok("image g(image a) ^ a * 2;");
        check_ok("image g(image a) ^ a / 0.5;");
        // scalar image forms only exist for * / %
        assert!(matches!(
            check_err("image g(image a) ^ a + 2;"),
            TypeError::BadBinaryOperands { .. }
        ));
    }

    #[test]
    fn test_scalar_color_multiplication() {
        let (program, types) = check_ok("void f(color c) color d = 3 * c;");
        let ExprKind::Binary { left, .. } = &init_expr(&program, 0).kind else {
            panic!("expected binary");
        };
        assert_eq!(types.coercion_of(left.id), Some(Type::Color));
        // a float factor widens to colorfloat, which a color target rejects
        assert!(matches!(
            check_err("void f(color c) c = c * 0.5;"),
            TypeError::IncompatibleAssignment { .. }
        ));
        check_ok("void f(image i, color c) i = c * 0.5;");
    }

    #[test]
    fn test_equality_requires_identical_types() {
        check_ok("boolean g(int a) ^ a == 3;");
        assert!(matches!(
            check_err("boolean g(int a) ^ a == 3.0;"),
            TypeError::BadBinaryOperands { .. }
        ));
    }

    #[test]
    fn test_ordering_coerces_mixed_numeric() {
        let (program, types) = check_ok("void f(int a) boolean b = a < 2.5;");
        let ExprKind::Binary { left, .. } = &init_expr(&program, 0).kind else {
            panic!("expected binary");
        };
        assert_eq!(types.coercion_of(left.id), Some(Type::Float));
        assert!(matches!(
            check_err("boolean g(string s) ^ s < \"t\";"),
            TypeError::BadBinaryOperands { .. }
        ));
    }

    #[test]
    fn test_logical_requires_booleans() {
        check_ok("boolean g(boolean a, boolean b) ^ a & b | a;");
        assert!(matches!(
            check_err("boolean g(int a) ^ a & a;"),
            TypeError::BadBinaryOperands { .. }
        ));
    }

    #[test]
    fn test_pixel_access_records_int_presents_color() {
        let (program, types) =
            check_ok("void f(image img, int a, int b) int p = img[a, b];");
        let expr = init_expr(&program, 0);
        assert_eq!(types.type_of(expr.id), Some(Type::Int));
        assert_eq!(types.coercion_of(expr.id), None);
        // as a return value the same expression presents as color
        check_ok("color g(image img, int a, int b) ^ img[a, b];");
        assert!(matches!(
            check_err("int g(image img, int a, int b) ^ img[a, b];"),
            TypeError::ReturnTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_pixel_access_requires_image_and_int_coords() {
        assert!(matches!(
            check_err("void f(int a) int x = a[1, 2];"),
            TypeError::SelectorOnNonImage { .. }
        ));
        assert!(matches!(
            check_err("void f(image img) int x = img[1.5, 2];"),
            TypeError::BadPixelSelector { .. }
        ));
    }

    #[test]
    fn test_per_pixel_assignment_binds_coords_temporarily() {
        check_ok("void f(image img) img[x, y] = <<x, y, 0>>;");
        // the bindings do not leak into later statements
        assert!(matches!(
            check_err("void f(image img) img[x, y] = RED; int z = x;"),
            TypeError::UndefinedIdent { .. }
        ));
    }

    #[test]
    fn test_per_pixel_assignment_coerces_to_color() {
        let (program, types) = check_ok("void f(image img) img[x, y] = x + y;");
        let Item::Statement(Stmt::Assign { expr, .. }) = &program.items[0] else {
            panic!("expected assignment");
        };
        assert_eq!(types.coercion_of(expr.id), Some(Type::Color));
    }

    #[test]
    fn test_selector_vars_cannot_shadow_declarations() {
        assert!(matches!(
            check_err("void f(image img, int x) img[x, y] = RED;"),
            TypeError::DuplicateDeclaration { .. }
        ));
    }

    #[test]
    fn test_selector_on_non_image_assignment() {
        assert!(matches!(
            check_err("void f(int a) a[1, 2] = 3;"),
            TypeError::SelectorOnNonImage { .. }
        ));
    }

    #[test]
    fn test_whole_image_assignment_coercions() {
        let (program, types) = check_ok("void f(image img) img = 255;");
        let Item::Statement(Stmt::Assign { expr, .. }) = &program.items[0] else {
            panic!("expected assignment");
        };
        assert_eq!(types.coercion_of(expr.id), Some(Type::Color));

        let (program, types) = check_ok("void f(image img) img = 0.5;");
        let Item::Statement(Stmt::Assign { expr, .. }) = &program.items[0] else {
            panic!("expected assignment");
        };
        assert_eq!(types.coercion_of(expr.id), Some(Type::ColorFloat));
    }

    #[test]
    fn test_read_statement_rules() {
        let (program, types) = check_ok("void f() int x <- console;");
        // a console source adopts the target's type
        assert_eq!(
            types.coercion_of(init_expr(&program, 0).id),
            Some(Type::Int)
        );
        check_ok("void f() string s = \"data\"; int x <- s;");
        assert!(matches!(
            check_err("void f(int y) int x <- y;"),
            TypeError::BadReadSource { .. }
        ));
        assert!(matches!(
            check_err("void f(image img) img[x, y] <- console;"),
            TypeError::SelectorInRead { .. }
        ));
    }

    #[test]
    fn test_write_statement_rules() {
        check_ok("void f(int x) write x -> console;");
        check_ok("void f(int x, string s) write x -> s;");
        assert!(matches!(
            check_err("void f() write console -> console;"),
            TypeError::ConsoleWriteSource { .. }
        ));
        assert!(matches!(
            check_err("void f(int x, int y) write x -> y;"),
            TypeError::BadWriteDest { .. }
        ));
    }

    #[test]
    fn test_image_declaration_needs_dimension_or_initializer() {
        check_ok("void f(int w) image[w, 480] img;");
        check_ok("void f(image a) image b = a;");
        assert!(matches!(
            check_err("void f() image img;"),
            TypeError::ImageWithoutDimension { .. }
        ));
        assert!(matches!(
            check_err("void f() image img = 3;"),
            TypeError::IncompatibleAssignment { .. }
        ));
    }

    #[test]
    fn test_dimensioned_image_scalar_initializer_coerces_to_fill() {
        let (program, types) = check_ok("void f() image[4, 4] a = 5; image[4, 4] b = 0.5;");
        assert_eq!(
            types.coercion_of(init_expr(&program, 0).id),
            Some(Type::Color)
        );
        assert_eq!(
            types.coercion_of(init_expr(&program, 1).id),
            Some(Type::ColorFloat)
        );
        assert!(matches!(
            check_err("void f() image[4, 4] a = true;"),
            TypeError::IncompatibleAssignment { .. }
        ));
    }

    #[test]
    fn test_dimension_components_must_be_int() {
        assert!(matches!(
            check_err("void f() image[1.5, 2] img;"),
            TypeError::BadDimension { .. }
        ));
    }

    #[test]
    fn test_image_initialized_by_assignment_not_declaration() {
        // a declared image becomes usable only after an assignment or read
        assert!(matches!(
            check_err("void f(image a) image b = a; write b -> console;"),
            TypeError::UninitializedIdent { .. }
        ));
        check_ok("void f(image a) image b = a; b = a; write b -> console;");
    }

    #[test]
    fn test_symbol_table_basics() {
        let mut table = SymbolTable::new("prog");
        assert!(table.insert("x", Type::Int));
        assert!(!table.insert("x", Type::Float));
        assert!(!table.insert("prog", Type::Int));
        assert!(!table.lookup("x").unwrap().initialized);
        table.init("x");
        assert!(table.lookup("x").unwrap().initialized);
        assert!(table.remove("x"));
        assert!(table.lookup("x").is_none());
    }
}
