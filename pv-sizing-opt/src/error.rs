use thiserror::Error;

#[derive(Debug, Error)]
pub enum SizingError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("reference series `{0}` is empty")]
    EmptySeries(String),

    #[error("chart error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, SizingError>;
