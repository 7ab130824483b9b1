pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by bulk operations.
///
/// `Configuration` and `UnsupportedExpression` abort a call before any SQL is
/// executed. `Driver` wraps whatever the underlying connection raised; a
/// failure in the middle of the temp-table merge protocol is propagated
/// unmodified with no automatic cleanup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The mapping model or accessor table cannot satisfy the request. Raised
    /// when an entity set resolves to no storage fragment or a named property
    /// does not exist on the target type.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The predicate or modifier contains a node kind outside the supported
    /// subset.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// An error raised by the underlying database driver.
    #[error("driver error: {0}")]
    Driver(#[source] anyhow::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedExpression(msg.into())
    }

    pub fn driver(err: impl Into<anyhow::Error>) -> Self {
        Self::Driver(err.into())
    }
}
