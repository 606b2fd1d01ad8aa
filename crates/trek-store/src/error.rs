use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
    /// A row was read but does not have the expected shape.
    #[error("malformed {table} record {id}: {reason}")]
    Malformed {
        table: &'static str,
        id: String,
        reason: String,
    },
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
