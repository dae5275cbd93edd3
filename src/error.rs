use std::io;

use thiserror::Error;

use crate::answer::Answer;
use crate::dns_parser::{self, ResponseCode};

/// Error of a lookup
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no name servers configured")]
    NoServers,
    #[error("invalid resolver options: {0}")]
    InvalidOptions(&'static str),
    #[error("malformed message: {0}")]
    Parse(#[from] dns_parser::Error),
    #[error("query timed out")]
    Timeout,
    #[error("query was cancelled")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A blocking call was made from within an async runtime
    #[error("blocking lookup inside an async runtime, use the async methods")]
    BlockingInRuntime,
    /// No server gave any usable response
    #[error("no name server answered after {attempts} attempts")]
    Connectivity {
        attempts: usize,
        #[source]
        last: Option<Box<ResolveError>>,
    },
    #[error("name server answered {code}")]
    ErrorResponse {
        code: ResponseCode,
        answer: Box<Answer>,
    },
}

impl ResolveError {
    /// The response code describing this error.
    ///
    /// Failures that never got a response map to `ConnectionFailure`.
    pub fn code(&self) -> ResponseCode {
        match *self {
            ResolveError::ErrorResponse { code, .. } => code,
            ResolveError::Parse(..) => ResponseCode::FormatError,
            _ => ResponseCode::ConnectionFailure,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self, ResolveError::Cancelled)
    }
}
