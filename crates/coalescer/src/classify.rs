//! Error classification
//!
//! Maps a failed store write onto the action the batch writer takes next.
//! Matching is done on the lowercased error text, including every error in
//! the `source()` chain, against ordered signature tables. Anything that
//! matches no signature is `Fatal`: unknown failures are not retried blindly.

use std::error::Error;
use std::fmt;

/// What kind of failure a store write hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transient transport failure; retry the same batch
    Retryable,
    /// Batch body exceeded a string-size limit; split it
    StringOverflow,
    /// Store rejected the payload as too large; truncate fields
    OversizedPayload,
    /// Anything else; stop retrying this cycle
    Fatal,
}

impl ErrorClass {
    /// Short name for logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retryable => "retryable",
            Self::StringOverflow => "string_overflow",
            Self::OversizedPayload => "oversized_payload",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signatures checked in order; first match wins
const SIGNATURES: &[(ErrorClass, &[&str])] = &[
    (
        ErrorClass::StringOverflow,
        &[
            "invalid string length",
            "string length exceeds",
            "exceeds maximum string size",
        ],
    ),
    (
        ErrorClass::OversizedPayload,
        &[
            "payload too large",
            "request entity too large",
            "too large",
            "max_query_size",
            "size of json object is extremely large",
            "memory limit exceeded",
        ],
    ),
    (
        ErrorClass::Retryable,
        &[
            "connection reset",
            "econnreset",
            "socket hang up",
            "broken pipe",
            "connection refused",
            "connection closed",
            "timed out",
            "timeout",
            "temporarily unavailable",
            "service unavailable",
            "bad gateway",
            "gateway timeout",
        ],
    ),
];

/// Classify an error by its message and its source chain
pub fn classify(error: &(dyn Error + 'static)) -> ErrorClass {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    classify_message(&text)
}

/// Classify raw error text
pub fn classify_message(message: &str) -> ErrorClass {
    let message = message.to_lowercase();
    SIGNATURES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| message.contains(p)))
        .map(|(class, _)| *class)
        .unwrap_or(ErrorClass::Fatal)
}
