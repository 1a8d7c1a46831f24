//! Source loading: dispatch on the source tag and produce rows.
//!
//! Only this stage of the pipeline suspends on I/O; everything downstream
//! is synchronous CPU work.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use plotline_schema::{DataSource, GeneratedOptions, SourceFormat};

use crate::error::PlotlineDataError;
use crate::generate;
use crate::Dataset;

/// Caller-registered producer for `computed` sources.
pub type ComputedProducer =
    Arc<dyn Fn(&IndexMap<String, Value>) -> Result<Dataset, PlotlineDataError> + Send + Sync>;

/// Loads a dataset for any [`DataSource`] variant.
#[derive(Default, Clone)]
pub struct SourceLoader {
    producers: HashMap<String, ComputedProducer>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named producer for `computed` sources.
    pub fn register_computed<F>(&mut self, name: impl Into<String>, producer: F)
    where
        F: Fn(&IndexMap<String, Value>) -> Result<Dataset, PlotlineDataError>
            + Send
            + Sync
            + 'static,
    {
        self.producers.insert(name.into(), Arc::new(producer));
    }

    pub async fn load(&self, source: &DataSource) -> Result<Dataset, PlotlineDataError> {
        match source {
            DataSource::Inline { data } => Ok(wrap_rows(data.clone())),
            DataSource::File { path, format, options } => {
                let text = tokio::fs::read_to_string(path).await?;
                parse_text(&text, format_for(path, *format), options)
            }
            DataSource::Url { url, format, options } => {
                let text = fetch_url(url).await?;
                parse_text(&text, format_for(url, *format), options)
            }
            DataSource::Generated { options } => Ok(generate_rows(options)),
            DataSource::Computed { name, options } => {
                let producer = self
                    .producers
                    .get(name)
                    .ok_or_else(|| PlotlineDataError::ComputedProducerLookupError(name.clone()))?;
                producer(options)
            }
            DataSource::Stream { .. } => {
                // Live feeds integrate through the chart handle; the load
                // step contributes no rows.
                tracing::warn!("stream source declared; loading an empty dataset");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(feature = "http")]
async fn fetch_url(url: &str) -> Result<String, PlotlineDataError> {
    let response = reqwest::get(url).await?;
    Ok(response.text().await?)
}

#[cfg(not(feature = "http"))]
async fn fetch_url(url: &str) -> Result<String, PlotlineDataError> {
    Err(PlotlineDataError::LoadError {
        url: url.to_string(),
        message: "url sources require the 'http' feature".to_string(),
    })
}

fn generate_rows(options: &GeneratedOptions) -> Dataset {
    generate::generate(options)
}

/// A non-array inline value becomes a one-row dataset.
fn wrap_rows(data: Value) -> Dataset {
    match data {
        Value::Array(rows) => rows,
        other => vec![other],
    }
}

fn format_for(path: &str, explicit: Option<SourceFormat>) -> SourceFormat {
    if let Some(format) = explicit {
        return format;
    }
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("csv") => SourceFormat::Csv,
        Some("tsv") => SourceFormat::Tsv,
        // unknown extensions parse as JSON
        _ => SourceFormat::Json,
    }
}

fn parse_text(
    text: &str,
    format: SourceFormat,
    _options: &IndexMap<String, Value>,
) -> Result<Dataset, PlotlineDataError> {
    match format {
        SourceFormat::Json => {
            let value: Value = serde_json::from_str(text)?;
            Ok(wrap_rows(value))
        }
        SourceFormat::Csv => parse_dsv(text, ','),
        SourceFormat::Tsv => parse_dsv(text, '\t'),
    }
}

/// RFC 4180 reader over the `csv` crate: the header row becomes object
/// keys and numeric-looking cells become numbers.
fn parse_dsv(text: &str, delimiter: char) -> Result<Dataset, PlotlineDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (key, cell) in header.iter().zip(&record) {
            row.insert(key.to_string(), coerce_cell(cell));
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

fn coerce_cell(cell: &str) -> Value {
    match cell.parse::<f64>() {
        Ok(number) if !cell.is_empty() => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        _ => Value::String(cell.to_string()),
    }
}
