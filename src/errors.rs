use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Preferences store failed: {source}")]
    Store {
        #[from]
        source: StoreError,
    },

    #[error("Invalid ticker symbol: cannot be empty")]
    EmptySymbol,
}

impl StoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Read { .. } => "STORE_READ_FAILED",
            StoreError::Write { .. } => "STORE_WRITE_FAILED",
            StoreError::Parse { .. } => "STORE_PARSE_FAILED",
            StoreError::Serialize { .. } => "STORE_SERIALIZE_FAILED",
        }
    }
}

impl DashboardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DashboardError::Store { source } => source.error_code(),
            DashboardError::EmptySymbol => "EMPTY_SYMBOL",
        }
    }
}
