/// Errors surfaced by home-chain queries and broadcasts.
#[derive(Debug, thiserror::Error)]
pub enum HomeError {
    /// The underlying transport (gRPC or otherwise) failed. Tick-level
    /// callers log this and retry on the next tick.
    #[error("home chain transport: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The home chain reports this validator as not bonded.
    #[error("validator is not staking")]
    NotStaking,
}

impl HomeError {
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}
