use etch_blocks::ParseError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid context JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from parsing a placeholder expression. Rendering never surfaces these: an
/// unparseable placeholder stays literal text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of expression at {pos}")]
    UnexpectedEnd { pos: usize },

    #[error("Lexer error at {pos}")]
    Lexer { pos: usize },

    #[error("Empty expression")]
    Empty,
}

impl ExpressionError {
    pub fn unexpected_token(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }
}
