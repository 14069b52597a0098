use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkwiseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown load strategy: {0}")]
    UnknownStrategy(String),
}
