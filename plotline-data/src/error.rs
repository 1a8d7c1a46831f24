use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotlineDataError {
    #[error("Unsupported data source type: {0}")]
    UnsupportedSource(String),

    #[error("No computed data producer registered under '{0}'")]
    ComputedProducerLookupError(String),

    #[error("Failed to load '{url}': {message}")]
    LoadError { url: String, message: String },

    #[error("Transform '{transform}' error: {message}")]
    TransformError { transform: String, message: String },

    #[error("Dataset not found: {0}")]
    DatasetLookupError(String),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl PlotlineDataError {
    pub fn transform(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransformError {
            transform: transform.into(),
            message: message.into(),
        }
    }
}
