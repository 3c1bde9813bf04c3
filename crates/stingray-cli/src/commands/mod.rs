pub mod node;
pub mod pool;
pub mod pool_op;

/// Invalid combination or content of command-line arguments.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(pub String);
