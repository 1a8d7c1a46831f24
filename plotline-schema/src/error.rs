use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotlineSchemaError {
    #[error("Schema document is not valid: {0}")]
    InvalidSchema(String),

    #[error("Cannot infer a schema from an empty dataset")]
    EmptyData,

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
