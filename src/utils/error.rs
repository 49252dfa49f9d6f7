use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZitatError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Catalog error at {file}:{line}: {message}")]
    CatalogError {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Display error: {message}")]
    DisplayError { message: String },
}

pub type Result<T> = std::result::Result<T, ZitatError>;
