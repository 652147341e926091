//! Error handling for the Pict front end
//!
//! Three error tiers, strictly fail-fast: a lexical error (malformed lexeme),
//! a syntax error (malformed token sequence), or a type error (well-formed but
//! semantically invalid). Every detected problem aborts the compile; there is
//! no warning tier and no recovery.

use crate::utils::SourceLoc;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;

/// A malformed lexeme, detected during scanning but raised when the offending
/// token is consumed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexicalError {
    #[error("unrecognized character {ch:?}")]
    UnrecognizedChar { ch: char, loc: SourceLoc },

    #[error("invalid escape sequence \\{ch}")]
    InvalidEscape { ch: char, loc: SourceLoc },

    #[error("unterminated string literal")]
    UnterminatedString { loc: SourceLoc },

    #[error("integer literal {text} out of range")]
    IntOutOfRange { text: String, loc: SourceLoc },
}

impl LexicalError {
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::UnrecognizedChar { loc, .. } => *loc,
            Self::InvalidEscape { loc, .. } => *loc,
            Self::UnterminatedString { loc } => *loc,
            Self::IntOutOfRange { loc, .. } => *loc,
        }
    }
}

/// A grammar violation. The parser aborts on the first one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        loc: SourceLoc,
    },

    #[error("unexpected end of input")]
    UnexpectedEof { loc: SourceLoc },
}

impl SyntaxError {
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::UnexpectedToken { loc, .. } => *loc,
            Self::UnexpectedEof { loc } => *loc,
        }
    }
}

/// A violation of the typing, scoping, or assignment rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("undefined identifier {name}")]
    UndefinedIdent { name: String, loc: SourceLoc },

    #[error("use of uninitialized variable {name}")]
    UninitializedIdent { name: String, loc: SourceLoc },

    #[error("variable {name} already declared")]
    DuplicateDeclaration { name: String, loc: SourceLoc },

    #[error("incompatible operand type for unary operator")]
    BadUnaryOperand { loc: SourceLoc },

    #[error("incompatible operand types for binary operator")]
    BadBinaryOperands { loc: SourceLoc },

    #[error("color components must all be int or all be float")]
    BadColorComponents { loc: SourceLoc },

    #[error("condition of a conditional expression must be boolean")]
    NonBooleanCondition { loc: SourceLoc },

    #[error("true case and false case of a conditional must have the same type")]
    ConditionalArmMismatch { loc: SourceLoc },

    #[error("pixel selector components must be int")]
    BadPixelSelector { loc: SourceLoc },

    #[error("pixel selector can only be applied to an image")]
    SelectorOnNonImage { loc: SourceLoc },

    #[error("dimension components must be int")]
    BadDimension { loc: SourceLoc },

    #[error("incompatible types in assignment")]
    IncompatibleAssignment { loc: SourceLoc },

    #[error("illegal source type for read")]
    BadReadSource { loc: SourceLoc },

    #[error("read statement must not have a pixel selector")]
    SelectorInRead { loc: SourceLoc },

    #[error("illegal destination type for write")]
    BadWriteDest { loc: SourceLoc },

    #[error("console is not a legal source for write")]
    ConsoleWriteSource { loc: SourceLoc },

    #[error("an image without a dimension must have an image initializer")]
    ImageWithoutDimension { loc: SourceLoc },

    #[error("return expression type does not match the declared return type")]
    ReturnTypeMismatch { loc: SourceLoc },
}

impl TypeError {
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::UndefinedIdent { loc, .. }
            | Self::UninitializedIdent { loc, .. }
            | Self::DuplicateDeclaration { loc, .. }
            | Self::BadUnaryOperand { loc }
            | Self::BadBinaryOperands { loc }
            | Self::BadColorComponents { loc }
            | Self::NonBooleanCondition { loc }
            | Self::ConditionalArmMismatch { loc }
            | Self::BadPixelSelector { loc }
            | Self::SelectorOnNonImage { loc }
            | Self::BadDimension { loc }
            | Self::IncompatibleAssignment { loc }
            | Self::BadReadSource { loc }
            | Self::SelectorInRead { loc }
            | Self::BadWriteDest { loc }
            | Self::ConsoleWriteSource { loc }
            | Self::ImageWithoutDimension { loc }
            | Self::ReturnTypeMismatch { loc } => *loc,
        }
    }
}

/// Any front-end failure: exactly one of the three tiers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl CompileError {
    /// The source location the error points at.
    pub fn loc(&self) -> SourceLoc {
        match self {
            Self::Lexical(e) => e.loc(),
            Self::Syntax(e) => e.loc(),
            Self::Type(e) => e.loc(),
        }
    }
}
