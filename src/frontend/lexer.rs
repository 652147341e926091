//! Lexer for Pict
//!
//! Converts source code into a stream of tokens in a single forward scan.
//! Malformed lexemes become `Error` tokens; the stored lexical error is
//! raised only when the cursor reaches such a token via `peek`/`next`.

use log::trace;

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{LexicalError, SourceLoc};

/// The lexer state
///
/// The whole input is scanned on construction; `peek`/`next` then provide
/// single-token lookahead and consumption over the resulting sequence, which
/// always ends in exactly one `Eof` token.
pub struct Lexer {
    /// Source code as characters
    chars: Vec<char>,
    /// Start position of the token being scanned
    start: usize,
    /// Current scan position
    pos: usize,
    /// Current line (0-based)
    line: usize,
    /// Current column (0-based); advances by token length, resets on newline
    col: usize,
    /// Position of the first character of the token being scanned
    start_loc: SourceLoc,
    /// The scanned token sequence
    tokens: Vec<Token>,
    /// Cursor for peek/next
    index: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut lexer = Self {
            chars: source.chars().collect(),
            start: 0,
            pos: 0,
            line: 0,
            col: 0,
            start_loc: SourceLoc::default(),
            tokens: Vec::new(),
            index: 0,
        };
        lexer.scan();
        lexer
    }

    /// The current token without consuming it.
    pub fn peek(&self) -> Result<&Token, LexicalError> {
        let token = &self.tokens[self.index];
        match &token.error {
            Some(err) => Err(err.clone()),
            None => Ok(token),
        }
    }

    /// Consume and return the current token. Once the `Eof` token is reached
    /// it is returned indefinitely.
    pub fn next(&mut self) -> Result<Token, LexicalError> {
        let token = self.tokens[self.index].clone();
        if let Some(err) = &token.error {
            return Err(err.clone());
        }
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        Ok(token)
    }

    /// The full scanned sequence, `Error` tokens included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    // ==================== Scanning ====================

    fn scan(&mut self) {
        while !self.is_at_end() {
            self.start = self.pos;
            self.start_loc = SourceLoc::new(self.line, self.col);
            let c = self.advance();

            match c {
                '(' => self.add_token(TokenKind::LParen),
                ')' => self.add_token(TokenKind::RParen),
                '[' => self.add_token(TokenKind::LSquare),
                ']' => self.add_token(TokenKind::RSquare),
                '+' => self.add_token(TokenKind::Plus),
                '*' => self.add_token(TokenKind::Times),
                '/' => self.add_token(TokenKind::Div),
                '%' => self.add_token(TokenKind::Mod),
                '&' => self.add_token(TokenKind::And),
                '|' => self.add_token(TokenKind::Or),
                ';' => self.add_token(TokenKind::Semi),
                ',' => self.add_token(TokenKind::Comma),
                '^' => self.add_token(TokenKind::Return),

                '!' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::NotEquals);
                    } else {
                        self.add_token(TokenKind::Bang);
                    }
                }
                '<' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::Le);
                    } else if self.matches('<') {
                        self.add_token(TokenKind::LAngle);
                    } else if self.matches('-') {
                        self.add_token(TokenKind::LArrow);
                    } else {
                        self.add_token(TokenKind::Lt);
                    }
                }
                '>' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::Ge);
                    } else if self.matches('>') {
                        self.add_token(TokenKind::RAngle);
                    } else {
                        self.add_token(TokenKind::Gt);
                    }
                }
                '=' => {
                    if self.matches('=') {
                        self.add_token(TokenKind::Equals);
                    } else {
                        self.add_token(TokenKind::Assign);
                    }
                }
                '-' => {
                    if self.matches('>') {
                        self.add_token(TokenKind::RArrow);
                    } else {
                        self.add_token(TokenKind::Minus);
                    }
                }

                // line comment; end of input also terminates it
                '#' => {
                    while self.peek_char() != Some('\n') && !self.is_at_end() {
                        self.pos += 1;
                    }
                }

                ' ' | '\r' | '\t' => self.col += 1,
                '\n' => {
                    self.line += 1;
                    self.col = 0;
                }

                '"' => self.string(),

                _ => {
                    if c.is_ascii_digit() {
                        self.number(c);
                    } else if is_ident_start(c) {
                        self.identifier();
                    } else {
                        self.add_error(LexicalError::UnrecognizedChar {
                            ch: c,
                            loc: self.start_loc,
                        });
                    }
                }
            }
        }

        self.tokens.push(Token::eof(SourceLoc::new(self.line, 0)));
    }

    fn string(&mut self) {
        loop {
            if self.is_at_end() {
                self.add_error(LexicalError::UnterminatedString {
                    loc: self.start_loc,
                });
                return;
            }
            match self.peek_char() {
                Some('"') => {
                    self.pos += 1;
                    self.add_token(TokenKind::StringLit);
                    return;
                }
                Some('\\') => match self.peek_next() {
                    Some('b' | 't' | 'n' | 'f' | 'r' | '"' | '\'' | '\\') => self.pos += 2,
                    other => {
                        self.add_error(LexicalError::InvalidEscape {
                            ch: other.unwrap_or('\0'),
                            loc: self.start_loc,
                        });
                        return;
                    }
                },
                Some('\n') => {
                    self.line += 1;
                    self.col = 0;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn number(&mut self, first: char) {
        // two leading zeros lex as a single INT token `0`
        if first == '0' && self.peek_char() == Some('0') {
            self.add_token(TokenKind::IntLit);
            return;
        }

        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }

        if self.peek_char() == Some('.')
            && matches!(self.peek_next(), Some(c) if c.is_ascii_digit())
        {
            self.pos += 1; // skip '.'
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
            self.add_token(TokenKind::FloatLit);
        } else {
            let text: String = self.chars[self.start..self.pos].iter().collect();
            if text.parse::<i32>().is_ok() {
                self.add_token(TokenKind::IntLit);
            } else {
                self.add_error(LexicalError::IntOutOfRange {
                    text,
                    loc: self.start_loc,
                });
            }
        }
    }

    fn identifier(&mut self) {
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.pos += 1;
        }
        let text: String = self.chars[self.start..self.pos].iter().collect();
        let kind = TokenKind::reserved_from_str(&text).unwrap_or(TokenKind::Ident);
        self.add_token(kind);
    }

    // ==================== Helpers ====================

    fn add_token(&mut self, kind: TokenKind) {
        let text: String = self.chars[self.start..self.pos].iter().collect();
        let token = Token::new(kind, text, self.start_loc);
        trace!("lexed {:?} {:?} at {}", token.kind, token.text, token.loc);
        // strings may span lines; the column continues from the last newline
        self.col = match token.text.rfind('\n') {
            Some(i) => token.text[i + 1..].chars().count(),
            None => self.start_loc.column + token.len,
        };
        self.tokens.push(token);
    }

    fn add_error(&mut self, error: LexicalError) {
        let text: String = self.chars[self.start..self.pos].iter().collect();
        let loc = error.loc();
        trace!("lexed error token {:?} at {}", text, loc);
        self.col = match text.rfind('\n') {
            Some(i) => text[i + 1..].chars().count(),
            None => self.start_loc.column + text.chars().count(),
        };
        self.tokens.push(Token::error(text, loc, error));
    }

    /// Consume the next character if it matches.
    fn matches(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        c
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokens().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) [ ] + - * / % & | ; , ^"),
            vec![
                LParen, RParen, LSquare, RSquare, Plus, Minus, Times, Div, Mod, And, Or, Semi,
                Comma, Return, Eof
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("== != <= >= -> <- < > = !"),
            vec![Equals, NotEquals, Le, Ge, RArrow, LArrow, Lt, Gt, Assign, Bang, Eof]
        );
    }

    #[test]
    fn test_angle_brackets_lex_without_error() {
        use TokenKind::*;
        assert_eq!(
            kinds("<<1, 2, 3>>"),
            vec![LAngle, IntLit, Comma, IntLit, Comma, IntLit, RAngle, Eof]
        );
    }

    #[test]
    fn test_reserved_words() {
        use TokenKind::*;
        assert_eq!(
            kinds("if fi else write console void int image getRed getWidth RED true"),
            vec![
                KwIf, KwFi, KwElse, KwWrite, KwConsole, KwVoid, Type, Type, ColorOp, ImageOp,
                ColorConst, BooleanLit, Eof
            ]
        );
    }

    #[test]
    fn test_identifiers_with_dollar_and_underscore() {
        let lexer = Lexer::new("$abc _x9 getRedder");
        let tokens = lexer.tokens();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "$abc");
        assert_eq!(tokens[1].text, "_x9");
        // longest match: not the getRed reserved word
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert_eq!(tokens[2].text, "getRedder");
    }

    #[test]
    fn test_positions() {
        let lexer = Lexer::new("a bb\n  ccc");
        let tokens = lexer.tokens();
        assert_eq!(tokens[0].loc, SourceLoc::new(0, 0));
        assert_eq!(tokens[1].loc, SourceLoc::new(0, 2));
        assert_eq!(tokens[2].loc, SourceLoc::new(1, 2));
    }

    #[test]
    fn test_positions_after_error_token() {
        let lexer = Lexer::new("a @ b");
        let tokens = lexer.tokens();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].loc, SourceLoc::new(0, 2));
        assert_eq!(tokens[2].loc, SourceLoc::new(0, 4));
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        use TokenKind::*;
        assert_eq!(kinds("a # b + @ anything\nc"), vec![Ident, Ident, Eof]);
        // end of input terminates a comment without error
        assert_eq!(kinds("# trailing"), vec![Eof]);
    }

    #[test]
    fn test_string_with_escapes() {
        let lexer = Lexer::new(r#""it\'s \"fine\"\n""#);
        let token = &lexer.tokens()[0];
        assert_eq!(token.kind, TokenKind::StringLit);
        assert_eq!(token.string_value(), "it's \"fine\"\n");
    }

    #[test]
    fn test_invalid_escape_is_error_token() {
        let lexer = Lexer::new(r#""bad \q escape""#);
        assert_eq!(lexer.tokens()[0].kind, TokenKind::Error);
        assert!(matches!(
            lexer.tokens()[0].error,
            Some(LexicalError::InvalidEscape { ch: 'q', .. })
        ));
    }

    #[test]
    fn test_unterminated_string_is_error_token() {
        let lexer = Lexer::new("\"never closed");
        assert_eq!(lexer.tokens()[0].kind, TokenKind::Error);
        assert!(matches!(
            lexer.tokens()[0].error,
            Some(LexicalError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn test_int_literals() {
        let lexer = Lexer::new("0 5 2147483647");
        let tokens = lexer.tokens();
        assert_eq!(tokens[0].int_value(), 0);
        assert_eq!(tokens[1].int_value(), 5);
        assert_eq!(tokens[2].int_value(), i32::MAX);
    }

    #[test]
    fn test_int_out_of_range() {
        let lexer = Lexer::new("2147483648");
        assert_eq!(lexer.tokens()[0].kind, TokenKind::Error);
        assert!(matches!(
            lexer.tokens()[0].error,
            Some(LexicalError::IntOutOfRange { .. })
        ));
    }

    #[test]
    fn test_two_leading_zeros() {
        // `00` is a single INT token `0`; the second zero lexes on its own
        let lexer = Lexer::new("00");
        let tokens = lexer.tokens();
        assert_eq!(tokens[0].kind, TokenKind::IntLit);
        assert_eq!(tokens[0].text, "0");
        assert_eq!(tokens[1].kind, TokenKind::IntLit);
        assert_eq!(tokens[1].text, "0");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn test_float_literals() {
        let lexer = Lexer::new("1.5 0.25");
        assert_eq!(lexer.tokens()[0].kind, TokenKind::FloatLit);
        assert_eq!(lexer.tokens()[0].float_value(), 1.5);
        assert_eq!(lexer.tokens()[1].float_value(), 0.25);
    }

    #[test]
    fn test_float_requires_digit_after_point() {
        use TokenKind::*;
        // `3.` is an int followed by an unrecognized '.'
        assert_eq!(kinds("3."), vec![IntLit, Error, Eof]);
    }

    #[test]
    fn test_error_raised_on_consumption_not_scan() {
        // scanning succeeds even with a bad character in the input
        let mut lexer = Lexer::new("a @");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Ident);
        let err = lexer.next().unwrap_err();
        assert!(matches!(err, LexicalError::UnrecognizedChar { ch: '@', .. }));
        // peek at the same position keeps failing
        assert!(lexer.peek().is_err());
    }

    #[test]
    fn test_next_sticks_at_eof() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Ident);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
    }
}
