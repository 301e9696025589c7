use thiserror::Error;

pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    /// Connect failure, timeout, or a non-success HTTP status.
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// The body arrived but is not the envelope the endpoint promises.
    #[error("unexpected response shape from {endpoint}: {source}")]
    UnexpectedResponseShape {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// The local HTTP client could not be constructed; nothing was sent.
    #[error("failed to build http client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },
    #[error("no task is open; open a task before submitting a key")]
    NoActiveTask,
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

impl BoardError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub fn is_unexpected_shape(&self) -> bool {
        matches!(self, Self::UnexpectedResponseShape { .. })
    }
}
