use thiserror::Error;

pub type Result<T> = core::result::Result<T, NeatError>;

/// Everything the engine reports to its caller. Broken internal invariants are not listed here,
/// they panic.
#[derive(Debug, Error)]
pub enum NeatError {
    #[error("no organism reached the fitness threshold within {generations} generations")]
    SearchExhausted { generations: usize },

    #[error("run cancelled by hook in generation {generation}")]
    Cancelled { generation: usize },

    #[error("population went extinct in generation {generation}")]
    Extinct { generation: usize },

    #[error("connection {inno} references unknown node {node}")]
    MissingNode { node: usize, inno: usize },

    #[error("network expects {expected} sensor values, got {got}")]
    InputSize { expected: usize, got: usize },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
