//! Placeholder expression syntax tree and parser.
//!
//! Grammar:
//! ```text
//! expr    := primary postfix*
//! primary := IDENT | STRING | NUMBER | true | false | null | '(' expr ')'
//! postfix := '.' (IDENT | NUMBER) ('(' args ')')?
//!          | '[' expr ']'
//! args    := (expr (',' expr)*)?
//! ```

use crate::error::ExpressionError;
use crate::tokenizer::{tokenize, unquote, SpannedToken, Token};
use crate::value::Value;

pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),

    /// Root context key
    Variable(String),

    /// `base.key` or `base[key]`
    Member { object: Box<Expr>, property: Key },

    /// `receiver.method(args)`
    Call {
        receiver: Box<Expr>,
        method: String,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Name(String),
    Computed(Box<Expr>),
}

impl Expr {
    /// Root variable this expression reads from, if any
    pub fn root(&self) -> Option<&str> {
        match self {
            Expr::Literal(_) => None,
            Expr::Variable(name) => Some(name),
            Expr::Member { object, .. } => object.root(),
            Expr::Call { receiver, .. } => receiver.root(),
        }
    }
}

pub struct Parser<'src> {
    tokens: Vec<SpannedToken<'src>>,
    pos: usize,
    source_len: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ExpressionResult<Self> {
        let tokens = tokenize(source).map_err(|pos| ExpressionError::Lexer { pos })?;
        Ok(Self {
            tokens,
            pos: 0,
            source_len: source.len(),
        })
    }

    /// Parse one expression that spans the whole input
    pub fn parse(mut self) -> ExpressionResult<Expr> {
        if self.tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let expr = self.parse_expression()?;
        if let Some((token, span)) = self.peek() {
            return Err(ExpressionError::unexpected_token(
                span.start,
                "end of expression",
                token.to_string(),
            ));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> ExpressionResult<Expr> {
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_primary(&mut self) -> ExpressionResult<Expr> {
        let pos = self.current_pos();
        let (token, _) = self
            .advance()
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd { pos })?;

        match token {
            Token::Ident(name) => Ok(Expr::Variable(name.to_string())),
            Token::String(raw) => Ok(Expr::Literal(Value::String(unquote(raw)))),
            Token::Number(raw) => Ok(Expr::Literal(
                raw.parse::<f64>().map(Value::Number).unwrap_or(Value::Null),
            )),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, ")")?;
                Ok(expr)
            }
            other => Err(ExpressionError::unexpected_token(
                pos,
                "value or identifier",
                other.to_string(),
            )),
        }
    }

    /// Handles: obj.prop, obj.0, obj.method(), obj["key"], obj.prop.method()
    fn parse_postfix(&mut self, mut expr: Expr) -> ExpressionResult<Expr> {
        loop {
            if self.match_token(Token::Dot) {
                let pos = self.current_pos();
                let (token, _) = self
                    .advance()
                    .cloned()
                    .ok_or(ExpressionError::UnexpectedEnd { pos })?;

                match token {
                    Token::Ident(name) => {
                        if self.match_token(Token::LParen) {
                            let arguments = self.parse_arguments()?;
                            expr = Expr::Call {
                                receiver: Box::new(expr),
                                method: name.to_string(),
                                arguments,
                            };
                        } else {
                            expr = member(expr, name);
                        }
                    }
                    // `items.0.1` lexes the last two segments as one number
                    Token::Number(raw) if !raw.starts_with('-') => {
                        for segment in raw.split('.') {
                            expr = member(expr, segment);
                        }
                    }
                    Token::True | Token::False | Token::Null => {
                        expr = member(expr, &token.to_string());
                    }
                    other => {
                        return Err(ExpressionError::unexpected_token(
                            pos,
                            "property name",
                            other.to_string(),
                        ))
                    }
                }
            } else if self.match_token(Token::LBracket) {
                let key = self.parse_expression()?;
                self.expect(Token::RBracket, "]")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: match key {
                        Expr::Literal(value) => Key::Name(value.to_text()),
                        computed => Key::Computed(Box::new(computed)),
                    },
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> ExpressionResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        while !self.check(Token::RParen) && !self.is_at_end() {
            arguments.push(self.parse_expression()?);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen, ")")?;
        Ok(arguments)
    }

    fn peek(&self) -> Option<&SpannedToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken<'src>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        match self.peek() {
            Some((t, _)) => std::mem::discriminant(t) == std::mem::discriminant(&token),
            None => false,
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> ExpressionResult<()> {
        if self.check(token) {
            self.pos += 1;
            return Ok(());
        }
        let pos = self.current_pos();
        match self.peek() {
            Some((found, _)) => Err(ExpressionError::unexpected_token(
                pos,
                expected,
                found.to_string(),
            )),
            None => Err(ExpressionError::UnexpectedEnd { pos }),
        }
    }

    fn current_pos(&self) -> usize {
        self.peek()
            .map(|(_, span)| span.start)
            .unwrap_or(self.source_len)
    }
}

fn member(object: Expr, name: &str) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: Key::Name(name.to_string()),
    }
}

pub fn parse_expression(source: &str) -> ExpressionResult<Expr> {
    Parser::new(source)?.parse()
}
