#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration Error: {0} should be {1}")]
    Configuration(String, String),

    #[error("Differentiation Error: {0}")]
    Differentiation(String),

    #[error("Unimplemented Path Error: {0}")]
    UnimplementedPath(String),

    #[error("Unsupported Mode Error: {0:?} should be one of {1}")]
    UnsupportedMode(String, String),
}
