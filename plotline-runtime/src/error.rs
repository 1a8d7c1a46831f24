use thiserror::Error;

use plotline_data::PlotlineDataError;
use plotline_scales::PlotlineScaleError;
use plotline_schema::PlotlineSchemaError;

#[derive(Error, Debug)]
pub enum PlotlineChartError {
    #[error("schema error: {0}")]
    SchemaError(#[from] PlotlineSchemaError),

    #[error("data pipeline error: {0}")]
    DataError(#[from] PlotlineDataError),

    #[error("scale error: {0}")]
    ScaleError(#[from] PlotlineScaleError),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("mark error in layer '{layer}': {message}")]
    MarkError { layer: String, message: String },

    #[error("chart not found: {0}")]
    ChartLookupError(String),
}
