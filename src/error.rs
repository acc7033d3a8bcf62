use hyper::StatusCode;

/// Errors returned by handlers and passed back to the [`App`](crate::App).
///
/// The router never produces these itself; a route that does not match is
/// not an error, the request is simply handed to the next middleware.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An application error carrying the status code to respond with.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    /// Any other failure, answered with `500 Internal Server Error`.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Creates an error that will be answered with the given status.
    /// ```rust
    /// use nestrouter::Error;
    /// use hyper::StatusCode;
    ///
    /// let err = Error::status(StatusCode::PAYMENT_REQUIRED, "this is an error");
    /// assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
    /// assert_eq!(err.to_string(), "this is an error");
    /// ```
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Status {
            status,
            message: message.into(),
        }
    }

    /// Wraps an arbitrary error.
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Other(Box::new(err))
    }

    /// The status code the final stage responds with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Status { status, .. } => *status,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Represents errors that can occur when compiling a route pattern.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    /// Patterns must begin with '/'.
    #[error("expect pattern beginning with '/', found: '{0}'")]
    MissingLeadingSlash(String),
    /// A ':' was not followed by a parameter name.
    #[error("missing parameter name at {0}")]
    MissingName(usize),
    /// A custom parameter pattern was opened but never closed.
    #[error("unbalanced pattern at {0}")]
    UnbalancedPattern(usize),
    /// A custom parameter pattern was empty, e.g. `:id()`.
    #[error("missing pattern at {0}")]
    EmptyPattern(usize),
    /// Custom parameter patterns may only use non-capturing groups.
    #[error("capturing groups are not allowed at {0}")]
    CapturingGroup(usize),
    /// Custom parameter patterns must not start with '?'.
    #[error("pattern cannot start with \"?\" at {0}")]
    QuestionMarkPattern(usize),
    /// A '\' was the last character of the pattern.
    #[error("dangling escape at {0}")]
    DanglingEscape(usize),
    /// A token appeared where it is not allowed, e.g. a modifier after a
    /// literal segment or an unclosed group.
    #[error("unexpected {kind} at {index}, expected {expected}")]
    Unexpected {
        kind: &'static str,
        index: usize,
        expected: &'static str,
    },
    /// The compiled expression was rejected by the regex engine.
    #[error("invalid pattern: {0}")]
    Regex(String),
}
