/// Errors surfaced by a [`crate::Driver`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The backing store or connection is unreachable.
    #[error("driver backend unavailable: {0}")]
    Unavailable(String),

    /// A listing was saved or removed after it had already been removed.
    #[error("room listing {0} not found")]
    NotFound(String),

    /// A query or storage operation was rejected by the backend.
    #[error("driver command failed: {0}")]
    Command(String),
}
