use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML writing error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("Document error: {0}")]
    Document(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
