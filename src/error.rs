use thiserror::Error;

/// The taxonomy from the error-handling design: every failure the core
/// surfaces to a caller fits one of these, which is what lets the scheduler
/// and the API adapter map failures to the right terminal status / HTTP code
/// without string-matching messages.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Retryable venue error (rate limit, transport, timeout). Consumes an
    /// attempt; on exhaustion a worker turns this into `VenuePermanent` or
    /// `SwapRejected`.
    #[error("venue '{venue}' transient error: {message}")]
    VenueTransient { venue: String, message: String },

    /// The venue refused the request terminally; no further retries apply.
    #[error("venue '{venue}' permanent error: {message}")]
    VenuePermanent { venue: String, message: String },

    #[error("no valid quotes received for order")]
    NoQuotes,

    #[error("quote collection deadline exceeded with fewer than 2 valid quotes")]
    DeadlineExceeded,

    #[error("swap exhausted retries: {0}")]
    SwapRejected(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl EngineError {
    /// The machine-readable tag a client sees alongside `failed`'s message,
    /// per the client-facing streaming protocol in the external interfaces.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::NotFound(_) => "not_found",
            EngineError::VenueTransient { .. } => "venue_transient",
            EngineError::VenuePermanent { .. } => "venue_permanent",
            EngineError::NoQuotes => "no_quotes",
            EngineError::DeadlineExceeded => "deadline_exceeded",
            EngineError::SwapRejected(_) => "swap_rejected",
            EngineError::Internal(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::VenueTransient { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
