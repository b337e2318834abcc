use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("window error: {0}")]
    Window(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("LeapMotion support not compiled in (rebuild with --features leap)")]
    LeapUnavailable,
}
