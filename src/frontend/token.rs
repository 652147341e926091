//! Token definitions for Pict

use crate::utils::{LexicalError, SourceLoc};

/// A token produced by the lexer
///
/// Tokens are immutable once created. Literal tokens keep their raw source
/// text (strings keep their quotes and escape sequences); the typed accessors
/// parse lazily and are meaningful only when the kind matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text of the token
    pub text: String,
    /// Position of the token's first character
    pub loc: SourceLoc,
    /// Overall length in characters
    pub len: usize,
    /// Populated only for `TokenKind::Error`; raised when the token is consumed
    pub error: Option<LexicalError>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, loc: SourceLoc) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            kind,
            text,
            loc,
            len,
            error: None,
        }
    }

    pub fn error(text: impl Into<String>, loc: SourceLoc, error: LexicalError) -> Self {
        let mut token = Self::new(TokenKind::Error, text, loc);
        token.error = Some(error);
        token
    }

    pub fn eof(loc: SourceLoc) -> Self {
        Self::new(TokenKind::Eof, "", loc)
    }

    /// Parsed integer value. Meaningful only for `IntLit` tokens; the lexer
    /// guarantees those fit an i32.
    pub fn int_value(&self) -> i32 {
        self.text.parse().unwrap_or_default()
    }

    /// Parsed float value. Meaningful only for `FloatLit` tokens.
    pub fn float_value(&self) -> f32 {
        self.text.parse().unwrap_or_default()
    }

    /// Parsed boolean value. Meaningful only for `BooleanLit` tokens.
    pub fn boolean_value(&self) -> bool {
        self.text == "true"
    }

    /// For `StringLit` tokens, the literal's value: quotes stripped and escape
    /// sequences replaced. For any other kind, the raw text.
    pub fn string_value(&self) -> String {
        if self.kind != TokenKind::StringLit {
            return self.text.clone();
        }
        let inner: Vec<char> = self.text.chars().collect();
        let mut value = String::new();
        let mut i = 0;
        while i < inner.len() {
            let c = inner[i];
            if c == '"' {
                i += 1;
                continue;
            }
            if c == '\\' && i + 1 < inner.len() {
                let escaped = match inner[i + 1] {
                    'b' => '\u{0008}',
                    't' => '\t',
                    'n' => '\n',
                    'f' => '\u{000C}',
                    'r' => '\r',
                    '"' => '"',
                    '\'' => '\'',
                    '\\' => '\\',
                    other => other,
                };
                value.push(escaped);
                i += 2;
                continue;
            }
            value.push(c);
            i += 1;
        }
        value
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ============ Identifiers and Literals ============
    Ident,
    IntLit,
    FloatLit,
    StringLit,
    BooleanLit,
    /// One of the named color constants (BLACK, RED, ...)
    ColorConst,

    // ============ Keywords ============
    KwIf,
    KwFi,
    KwElse,
    KwWrite,
    KwConsole,
    KwVoid,
    /// One of the primitive type names (int, float, string, boolean, color, image)
    Type,
    /// getRed, getGreen, getBlue
    ColorOp,
    /// getWidth, getHeight
    ImageOp,

    // ============ Operators ============
    Plus,
    Minus,
    Times,
    Div,
    Mod,
    And,
    Or,
    Bang,
    Lt,
    Gt,
    Le,
    Ge,
    Equals,
    NotEquals,
    Assign,
    /// `->` (write destination)
    RArrow,
    /// `<-` (read source)
    LArrow,
    /// `^` (return marker)
    Return,

    // ============ Delimiters ============
    LParen,
    RParen,
    LSquare,
    RSquare,
    /// `<<` (color literal open)
    LAngle,
    /// `>>` (color literal close)
    RAngle,
    Semi,
    Comma,

    // ============ Special ============
    Eof,
    /// Malformed lexeme; consuming it raises the stored lexical error
    Error,
}

impl TokenKind {
    /// Resolve an identifier against the reserved-word table.
    pub fn reserved_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "true" | "false" => Some(TokenKind::BooleanLit),
            "BLACK" | "BLUE" | "CYAN" | "DARK_GRAY" | "GRAY" | "GREEN" | "LIGHT_GRAY"
            | "MAGENTA" | "ORANGE" | "PINK" | "RED" | "WHITE" | "YELLOW" => {
                Some(TokenKind::ColorConst)
            }
            "if" => Some(TokenKind::KwIf),
            "fi" => Some(TokenKind::KwFi),
            "else" => Some(TokenKind::KwElse),
            "write" => Some(TokenKind::KwWrite),
            "console" => Some(TokenKind::KwConsole),
            "void" => Some(TokenKind::KwVoid),
            "int" | "float" | "string" | "boolean" | "color" | "image" => Some(TokenKind::Type),
            "getRed" | "getGreen" | "getBlue" => Some(TokenKind::ColorOp),
            "getWidth" | "getHeight" => Some(TokenKind::ImageOp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_accessor() {
        let token = Token::new(TokenKind::IntLit, "123", SourceLoc::default());
        assert_eq!(token.int_value(), 123);
    }

    #[test]
    fn test_string_accessor_unescapes() {
        let token = Token::new(TokenKind::StringLit, r#""a\tb\nc""#, SourceLoc::default());
        assert_eq!(token.string_value(), "a\tb\nc");
    }

    #[test]
    fn test_string_accessor_passes_raw_text_through() {
        let token = Token::new(TokenKind::Ident, "someName", SourceLoc::default());
        assert_eq!(token.string_value(), "someName");
    }

    #[test]
    fn test_reserved_lookup() {
        assert_eq!(TokenKind::reserved_from_str("fi"), Some(TokenKind::KwFi));
        assert_eq!(TokenKind::reserved_from_str("getRed"), Some(TokenKind::ColorOp));
        assert_eq!(TokenKind::reserved_from_str("getWidth"), Some(TokenKind::ImageOp));
        assert_eq!(TokenKind::reserved_from_str("MAGENTA"), Some(TokenKind::ColorConst));
        assert_eq!(TokenKind::reserved_from_str("magenta"), None);
    }
}
