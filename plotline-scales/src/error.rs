use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotlineScaleError {
    #[error("empty domain")]
    EmptyDomain,

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("unknown color scheme: {0}")]
    UnknownScheme(String),

    #[error("dataset not found for domain inference: {0}")]
    DatasetLookupError(String),

    #[error("unknown domain method: {0}")]
    UnknownDomainMethod(String),
}
