//! Abstract Syntax Tree definitions for Pict
//!
//! The tree is immutable after parsing. The type checker records its results
//! in a side table keyed by `ExprId` rather than mutating nodes.

use std::fmt;

use crate::utils::SourceLoc;

/// Identity of an expression node, assigned by the parser in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

/// A complete program (compilation unit)
#[derive(Debug, Clone)]
pub struct Program {
    /// Declared return type; `void` means no value is returned
    pub ret_type: Type,
    pub name: String,
    pub params: Vec<NameDef>,
    /// Declarations and statements in source order
    pub items: Vec<Item>,
    pub loc: SourceLoc,
}

/// A body item: either a declaration or a statement
#[derive(Debug, Clone)]
pub enum Item {
    Declaration(Declaration),
    Statement(Stmt),
}

/// Variable declaration, with an optional initializer
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name_def: NameDef,
    pub init: Option<Initializer>,
    pub loc: SourceLoc,
}

/// The initializing half of a declaration
#[derive(Debug, Clone)]
pub struct Initializer {
    pub op: InitOp,
    pub expr: Expr,
}

/// How a declaration is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOp {
    /// `=` (value assignment)
    Assign,
    /// `<-` (read from a source)
    Read,
}

/// A name with its declared type and, for images, an optional dimension
#[derive(Debug, Clone)]
pub struct NameDef {
    pub ty: Type,
    pub name: String,
    pub dimension: Option<Dimension>,
    pub loc: SourceLoc,
}

/// Image dimension `[width, height]`
#[derive(Debug, Clone)]
pub struct Dimension {
    pub width: Expr,
    pub height: Expr,
    pub loc: SourceLoc,
}

/// Pixel selector `[x, y]`
#[derive(Debug, Clone)]
pub struct PixelSelector {
    pub x: Expr,
    pub y: Expr,
    pub loc: SourceLoc,
}

/// Statement
#[derive(Debug, Clone)]
pub enum Stmt {
    /// name [selector] = expr
    Assign {
        name: String,
        selector: Option<PixelSelector>,
        expr: Expr,
        loc: SourceLoc,
    },
    /// name [selector] <- source
    Read {
        name: String,
        selector: Option<PixelSelector>,
        source: Expr,
        loc: SourceLoc,
    },
    /// write source -> dest
    Write {
        source: Expr,
        dest: Expr,
        loc: SourceLoc,
    },
    /// ^ expr
    Return { expr: Expr, loc: SourceLoc },
}

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub loc: SourceLoc,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: ExprId, loc: SourceLoc, kind: ExprKind) -> Self {
        Self { id, loc, kind }
    }
}

/// Expression shapes
#[derive(Debug, Clone)]
pub enum ExprKind {
    BooleanLit(bool),
    IntLit(i32),
    FloatLit(f32),
    /// Literal value with quotes stripped and escapes resolved
    StringLit(String),
    /// Named color constant (BLACK, RED, ...)
    ColorConst(String),
    /// The `console` standard input/output device
    Console,
    /// `<< r, g, b >>`
    ColorExpr {
        red: Box<Expr>,
        green: Box<Expr>,
        blue: Box<Expr>,
    },
    Ident(String),
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `if (cond) true_case else false_case fi`
    Conditional {
        cond: Box<Expr>,
        true_case: Box<Expr>,
        false_case: Box<Expr>,
    },
    /// Pixel access `expr [x, y]`
    PixelAccess {
        expr: Box<Expr>,
        // boxed: the selector holds expressions, so the type is recursive
        selector: Box<PixelSelector>,
    },
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary (prefix) operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// Logical not (!)
    Not,
    /// Negation (-)
    Neg,
    // Color channel extraction
    GetRed,
    GetGreen,
    GetBlue,
    // Image size queries
    GetWidth,
    GetHeight,
}

impl UnOp {
    /// getRed / getGreen / getBlue
    pub fn is_color_op(self) -> bool {
        matches!(self, UnOp::GetRed | UnOp::GetGreen | UnOp::GetBlue)
    }

    /// getWidth / getHeight
    pub fn is_image_op(self) -> bool {
        matches!(self, UnOp::GetWidth | UnOp::GetHeight)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&",
            BinOp::Or => "|",
        };
        write!(f, "{symbol}")
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnOp::Not => "!",
            UnOp::Neg => "-",
            UnOp::GetRed => "getRed",
            UnOp::GetGreen => "getGreen",
            UnOp::GetBlue => "getBlue",
            UnOp::GetWidth => "getWidth",
            UnOp::GetHeight => "getHeight",
        };
        write!(f, "{symbol}")
    }
}

/// Fully parenthesized rendering; binary and unary nodes print their grouping,
/// which makes the parse shape visible.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::BooleanLit(b) => write!(f, "{b}"),
            ExprKind::IntLit(n) => write!(f, "{n}"),
            ExprKind::FloatLit(x) => write!(f, "{x}"),
            ExprKind::StringLit(s) => write!(f, "{s:?}"),
            ExprKind::ColorConst(name) => write!(f, "{name}"),
            ExprKind::Console => write!(f, "console"),
            ExprKind::ColorExpr { red, green, blue } => {
                write!(f, "<<{red}, {green}, {blue}>>")
            }
            ExprKind::Ident(name) => write!(f, "{name}"),
            ExprKind::Unary { op, expr } => write!(f, "({op} {expr})"),
            ExprKind::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
            ExprKind::Conditional {
                cond,
                true_case,
                false_case,
            } => write!(f, "if ({cond}) {true_case} else {false_case} fi"),
            ExprKind::PixelAccess { expr, selector } => {
                write!(f, "{expr}[{}, {}]", selector.x, selector.y)
            }
        }
    }
}

/// Types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Boolean,
    String,
    Color,
    /// Color with float components; only arises through widening
    ColorFloat,
    Image,
    /// The standard input/output device
    Console,
    /// Return type of a program that produces no value
    Void,
}

impl Type {
    /// Resolve a type name as it appears in source. `colorfloat` has no
    /// surface syntax and is not included.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "int" => Some(Type::Int),
            "float" => Some(Type::Float),
            "boolean" => Some(Type::Boolean),
            "string" => Some(Type::String),
            "color" => Some(Type::Color),
            "image" => Some(Type::Image),
            "void" => Some(Type::Void),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Boolean => "boolean",
            Type::String => "string",
            Type::Color => "color",
            Type::ColorFloat => "colorfloat",
            Type::Image => "image",
            Type::Console => "console",
            Type::Void => "void",
        };
        write!(f, "{name}")
    }
}
