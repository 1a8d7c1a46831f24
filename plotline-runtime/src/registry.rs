//! Explicit chart instance registry. Callers own one of these; there is
//! no process-global chart table.

use indexmap::IndexMap;
use tracing::warn;

use crate::error::PlotlineChartError;
use crate::renderer::ChartHandle;

/// Mounted charts by id.
#[derive(Default)]
pub struct ChartRegistry {
    charts: IndexMap<String, ChartHandle>,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under its schema id. A duplicate id replaces the
    /// previous chart and warns.
    pub fn insert(&mut self, handle: ChartHandle) {
        let id = handle.schema().id.clone();
        if self.charts.insert(id.clone(), handle).is_some() {
            warn!(chart = %id, "replacing already-registered chart");
        }
    }

    pub fn get(&self, id: &str) -> Option<&ChartHandle> {
        self.charts.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChartHandle> {
        self.charts.get_mut(id)
    }

    /// Drop a chart and all of its derived state.
    pub fn remove(&mut self, id: &str) -> Result<ChartHandle, PlotlineChartError> {
        self.charts
            .shift_remove(id)
            .ok_or_else(|| PlotlineChartError::ChartLookupError(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }
}
