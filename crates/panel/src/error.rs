#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("failed to fetch sessions: {0}")]
    Fetch(String),

    #[error("session mutation failed: {0}")]
    Mutation(String),

    #[error("unknown session: {0}")]
    UnknownRecord(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;
