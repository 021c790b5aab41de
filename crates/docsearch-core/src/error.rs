use thiserror::Error;

/// Failures reported by an embedding provider.
///
/// Messages never carry the provider credential.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbedError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("provider failure: {0}")]
    Provider(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("no corpus has been indexed; ingest documents before searching")]
    EmptyCorpus,

    #[error("embedding provider '{provider}' failed: {source}")]
    EmbeddingProvider {
        provider: String,
        #[source]
        source: EmbedError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn provider(provider: impl Into<String>, source: EmbedError) -> Self {
        Self::EmbeddingProvider { provider: provider.into(), source }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
