#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to connect to the ephemeral store: {0}")]
    Connection(#[source] redis::RedisError),

    /// A break-marker write failed: the durable reservation row stays
    /// consistent, but break-budget enforcement is broken until the store
    /// recovers, so this is surfaced rather than swallowed.
    #[error("Ephemeral store write failed: {0}")]
    Write(#[source] redis::RedisError),

    #[error("Ephemeral store read failed: {0}")]
    Read(#[source] redis::RedisError),

    #[error("Malformed ephemeral store value: {0}")]
    Decode(#[source] serde_json::Error),
}
