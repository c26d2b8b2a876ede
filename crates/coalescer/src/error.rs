//! Coalescer errors

/// Errors from constructing or driving a `Coalescer`
#[derive(Debug, thiserror::Error)]
pub enum CoalescerError {
    /// Construction happened outside a tokio runtime
    #[error("coalescer must be built inside a tokio runtime")]
    NoRuntime,

    /// No backing store was supplied to the builder
    #[error("coalescer builder is missing a backing store")]
    MissingStore,

    /// `start()` was called twice
    #[error("flush scheduler already started")]
    AlreadyStarted,

    /// `start()` was called after `shutdown()`
    #[error("coalescer has been shut down")]
    ShutDown,

    /// Writer settings rejected
    #[error("configuration error: {0}")]
    Config(#[from] spool_config::ConfigError),
}
