use etch_blocks::ParseError;
use thiserror::Error;

/// Common error type that can hold any store or boundary error
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SVG fetch failed for {url}: {reason}")]
    SvgFetch { url: String, reason: String },
}

/// Result alias for store and boundary operations
pub type CommonResult<T> = Result<T, CommonError>;
