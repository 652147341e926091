//! Parser for Pict
//!
//! Recursive descent with an explicit precedence ladder for expressions,
//! pulling tokens from the lexer with one token of lookahead. The parser
//! aborts on the first violation; there is no recovery.

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Result, SourceLoc, SyntaxError};

/// The parser
pub struct Parser {
    lexer: Lexer,
    /// Next expression id to hand out
    next_id: u32,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            lexer: Lexer::new(source),
            next_id: 0,
        }
    }

    /// Parse a complete program.
    pub fn parse(mut self) -> Result<Program> {
        let program = self.parse_program()?;
        debug!(
            "parsed program {} with {} params, {} items",
            program.name,
            program.params.len(),
            program.items.len()
        );
        Ok(program)
    }

    /// Parse a single expression. Mainly useful for tests and tooling; does
    /// not require the input to be fully consumed.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_expr()
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> Result<&Token> {
        Ok(self.lexer.peek()?)
    }

    fn advance(&mut self) -> Result<Token> {
        Ok(self.lexer.next()?)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.lexer.peek().map_or(false, |t| t.kind == kind)
    }

    /// Kind of the current token, or None on a malformed lexeme. The error
    /// itself surfaces at the next `current`/`advance`/`expect`.
    fn peek_kind(&self) -> Option<TokenKind> {
        self.lexer.peek().ok().map(|t| t.kind)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(expected) {
            self.advance()
        } else {
            self.unexpected(&format!("{expected:?}"))
        }
    }

    fn unexpected<T>(&self, expected: &str) -> Result<T> {
        let token = self.current()?;
        if token.kind == TokenKind::Eof {
            return Err(SyntaxError::UnexpectedEof { loc: token.loc }.into());
        }
        Err(SyntaxError::UnexpectedToken {
            expected: expected.to_string(),
            got: format!("{:?}", token.kind),
            loc: token.loc,
        }
        .into())
    }

    fn mk_expr(&mut self, loc: SourceLoc, kind: ExprKind) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        Expr::new(id, loc, kind)
    }

    fn fold_binary(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let loc = left.loc;
        self.mk_expr(
            loc,
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
        )
    }

    fn declared_type(token: &Token) -> Result<Type> {
        Type::from_name(&token.text).ok_or_else(|| {
            SyntaxError::UnexpectedToken {
                expected: "type name".to_string(),
                got: token.text.clone(),
                loc: token.loc,
            }
            .into()
        })
    }

    // ==================== Program Structure ====================

    fn parse_program(&mut self) -> Result<Program> {
        let ret_tok = match self.current()?.kind {
            TokenKind::KwVoid | TokenKind::Type => self.advance()?,
            _ => return self.unexpected("return type"),
        };
        let ret_type = Self::declared_type(&ret_tok)?;

        let name = self.expect(TokenKind::Ident)?;

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.parse_name_def()?);
            while self.check(TokenKind::Comma) {
                self.advance()?;
                params.push(self.parse_name_def()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let mut items = Vec::new();
        loop {
            if self.check(TokenKind::Type) {
                items.push(Item::Declaration(self.parse_declaration()?));
            } else if self.check(TokenKind::Ident)
                || self.check(TokenKind::KwWrite)
                || self.check(TokenKind::Return)
            {
                items.push(Item::Statement(self.parse_statement()?));
            } else {
                break;
            }
            self.expect(TokenKind::Semi)?;
        }

        // anything left over is a violation
        if !self.check(TokenKind::Eof) {
            return self.unexpected("declaration or statement");
        }

        Ok(Program {
            ret_type,
            name: name.text,
            params,
            items,
            loc: ret_tok.loc,
        })
    }

    fn parse_name_def(&mut self) -> Result<NameDef> {
        let type_tok = self.expect(TokenKind::Type)?;
        let ty = Self::declared_type(&type_tok)?;
        let dimension = if self.check(TokenKind::LSquare) {
            Some(self.parse_dimension()?)
        } else {
            None
        };
        let name = self.expect(TokenKind::Ident)?;
        Ok(NameDef {
            ty,
            name: name.text,
            dimension,
            loc: type_tok.loc,
        })
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let name_def = self.parse_name_def()?;
        let loc = name_def.loc;
        let init = if self.check(TokenKind::Assign) || self.check(TokenKind::LArrow) {
            let op = match self.advance()?.kind {
                TokenKind::Assign => InitOp::Assign,
                _ => InitOp::Read,
            };
            Some(Initializer {
                op,
                expr: self.parse_expr()?,
            })
        } else {
            None
        };
        Ok(Declaration {
            name_def,
            init,
            loc,
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.current()?.kind {
            TokenKind::Ident => {
                let name_tok = self.advance()?;
                let selector = if self.check(TokenKind::LSquare) {
                    self.advance()?;
                    Some(self.parse_pixel_selector()?)
                } else {
                    None
                };
                if self.check(TokenKind::Assign) {
                    self.advance()?;
                    let expr = self.parse_expr()?;
                    Ok(Stmt::Assign {
                        name: name_tok.text,
                        selector,
                        expr,
                        loc: name_tok.loc,
                    })
                } else if self.check(TokenKind::LArrow) {
                    self.advance()?;
                    let source = self.parse_expr()?;
                    Ok(Stmt::Read {
                        name: name_tok.text,
                        selector,
                        source,
                        loc: name_tok.loc,
                    })
                } else {
                    self.unexpected("`=` or `<-`")
                }
            }
            TokenKind::KwWrite => {
                let kw = self.advance()?;
                let source = self.parse_expr()?;
                self.expect(TokenKind::RArrow)?;
                let dest = self.parse_expr()?;
                Ok(Stmt::Write {
                    source,
                    dest,
                    loc: kw.loc,
                })
            }
            TokenKind::Return => {
                let kw = self.advance()?;
                let expr = self.parse_expr()?;
                Ok(Stmt::Return { expr, loc: kw.loc })
            }
            _ => self.unexpected("statement"),
        }
    }

    fn parse_dimension(&mut self) -> Result<Dimension> {
        let open = self.expect(TokenKind::LSquare)?;
        let width = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let height = self.parse_expr()?;
        self.expect(TokenKind::RSquare)?;
        Ok(Dimension {
            width,
            height,
            loc: open.loc,
        })
    }

    /// Parse the inside of a pixel selector; the opening `[` has already been
    /// consumed.
    fn parse_pixel_selector(&mut self) -> Result<PixelSelector> {
        let loc = self.current()?.loc;
        let x = self.parse_expr()?;
        self.expect(TokenKind::Comma)?;
        let y = self.parse_expr()?;
        self.expect(TokenKind::RSquare)?;
        Ok(PixelSelector { x, y, loc })
    }

    // ==================== Expressions ====================
    //
    // One method per precedence level, lowest binding first. Each binary
    // level folds iteratively so repeated operators build a left-leaning
    // tree.

    fn parse_expr(&mut self) -> Result<Expr> {
        if self.check(TokenKind::KwIf) {
            self.parse_conditional()
        } else {
            self.parse_logical_or()
        }
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let kw = self.expect(TokenKind::KwIf)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        let true_case = self.parse_expr()?;
        self.expect(TokenKind::KwElse)?;
        let false_case = self.parse_expr()?;
        self.expect(TokenKind::KwFi)?;
        Ok(self.mk_expr(
            kw.loc,
            ExprKind::Conditional {
                cond: Box::new(cond),
                true_case: Box::new(true_case),
                false_case: Box::new(false_case),
            },
        ))
    }

    fn parse_logical_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_logical_and()?;
        while self.check(TokenKind::Or) {
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = self.fold_binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.check(TokenKind::And) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = self.fold_binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinOp::Lt,
                Some(TokenKind::Gt) => BinOp::Gt,
                Some(TokenKind::Le) => BinOp::Le,
                Some(TokenKind::Ge) => BinOp::Ge,
                Some(TokenKind::Equals) => BinOp::Eq,
                Some(TokenKind::NotEquals) => BinOp::Ne,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = self.fold_binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.fold_binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Times) => BinOp::Mul,
                Some(TokenKind::Div) => BinOp::Div,
                Some(TokenKind::Mod) => BinOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = self.fold_binary(left, op, right);
        }
        Ok(left)
    }

    /// Right-recursive, so stacked prefixes nest: `getGreen getRed x`.
    fn parse_unary(&mut self) -> Result<Expr> {
        let (op, loc) = {
            let token = self.current()?;
            let op = match token.kind {
                TokenKind::Bang => Some(UnOp::Not),
                TokenKind::Minus => Some(UnOp::Neg),
                TokenKind::ColorOp | TokenKind::ImageOp => match token.text.as_str() {
                    "getRed" => Some(UnOp::GetRed),
                    "getGreen" => Some(UnOp::GetGreen),
                    "getBlue" => Some(UnOp::GetBlue),
                    "getWidth" => Some(UnOp::GetWidth),
                    "getHeight" => Some(UnOp::GetHeight),
                    _ => None,
                },
                _ => None,
            };
            (op, token.loc)
        };
        match op {
            Some(op) => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(self.mk_expr(
                    loc,
                    ExprKind::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                ))
            }
            None => self.parse_unary_postfix(),
        }
    }

    fn parse_unary_postfix(&mut self) -> Result<Expr> {
        let expr = self.parse_primary()?;
        if self.check(TokenKind::LSquare) {
            self.advance()?;
            let selector = self.parse_pixel_selector()?;
            let loc = expr.loc;
            Ok(self.mk_expr(
                loc,
                ExprKind::PixelAccess {
                    expr: Box::new(expr),
                    selector: Box::new(selector),
                },
            ))
        } else {
            Ok(expr)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.current()?.kind {
            TokenKind::BooleanLit => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::BooleanLit(token.boolean_value())))
            }
            TokenKind::IntLit => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::IntLit(token.int_value())))
            }
            TokenKind::FloatLit => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::FloatLit(token.float_value())))
            }
            TokenKind::StringLit => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::StringLit(token.string_value())))
            }
            TokenKind::Ident => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::Ident(token.text)))
            }
            TokenKind::ColorConst => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::ColorConst(token.text)))
            }
            TokenKind::KwConsole => {
                let token = self.advance()?;
                Ok(self.mk_expr(token.loc, ExprKind::Console))
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LAngle => {
                let open = self.advance()?;
                let red = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let green = self.parse_expr()?;
                self.expect(TokenKind::Comma)?;
                let blue = self.parse_expr()?;
                self.expect(TokenKind::RAngle)?;
                Ok(self.mk_expr(
                    open.loc,
                    ExprKind::ColorExpr {
                        red: Box::new(red),
                        green: Box::new(green),
                        blue: Box::new(blue),
                    },
                ))
            }
            _ => self.unexpected("expression"),
        }
    }
}
