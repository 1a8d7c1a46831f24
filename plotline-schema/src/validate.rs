//! Pure structural validation of a schema document.
//!
//! Runs before any data loading or drawing work; errors are fatal to a
//! render attempt, warnings are advisory.

use crate::document::ChartSchema;

/// Result of a validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    /// Single descriptive message combining all errors, for surfacing to
    /// a caller as one failure.
    pub fn message(&self) -> String {
        self.errors.join("; ")
    }
}

/// Check a schema document's structural completeness. Pure, no I/O.
pub fn validate(schema: &ChartSchema) -> Validation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if schema.id.trim().is_empty() {
        errors.push("Schema must have an id".to_string());
    }

    match &schema.data.source {
        crate::data::DataSource::Inline { data } if data.is_null() => {
            errors.push("Inline data source must carry data".to_string());
        }
        _ => {}
    }

    if schema.data.fields.is_empty() {
        warnings.push("No field definitions provided - domains will be inferred".to_string());
    }

    if schema.space.width <= 0.0 {
        errors.push("Space must have positive width".to_string());
    }
    if schema.space.height <= 0.0 {
        errors.push("Space must have positive height".to_string());
    }

    if schema.layers.is_empty() {
        errors.push("Schema must have at least one layer".to_string());
    }
    for (index, layer) in schema.layers.iter().enumerate() {
        if layer.mark.mark_type.trim().is_empty() {
            errors.push(format!("Layer {index} must have a mark definition"));
        }
        if layer.encoding.is_empty() {
            warnings.push(format!("Layer {index} has no encoding - will use mark params only"));
        }
        if let Some(clip) = &layer.clip {
            if !schema.space.clips.iter().any(|c| &c.id == clip) {
                warnings.push(format!("Layer {index} references undefined clip '{clip}'"));
            }
        }
    }

    // Dataset references that no transform outputs and that are not the
    // reserved names are probably authoring mistakes.
    let mut known = vec!["source".to_string(), "main".to_string()];
    for step in &schema.data.transforms {
        if let Some(output) = &step.output {
            known.push(output.clone());
            // force layouts also publish their link subset
            if step.transform_type == "force" {
                known.push(format!("{output}_links"));
            }
        }
    }
    for layer in &schema.layers {
        if let Some(data) = &layer.data {
            if !known.contains(data) {
                warnings.push(format!("Layer references unknown dataset '{data}'"));
            }
        }
    }
    for (name, scale) in &schema.scales {
        if let Some(from) = &scale.domain_from {
            if let Some(data) = &from.data {
                if !known.contains(data) {
                    warnings.push(format!(
                        "Scale '{name}' infers its domain from unknown dataset '{data}'"
                    ));
                }
            }
        }
    }

    Validation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataPipelineSpec, DataSource};
    use crate::document::VisualSpace;
    use crate::layer::{LayerSpec, MarkSpec};
    use indexmap::IndexMap;
    use serde_json::json;

    fn minimal_schema() -> ChartSchema {
        ChartSchema {
            id: "test".to_string(),
            title: None,
            description: None,
            data: DataPipelineSpec {
                source: DataSource::Inline {
                    data: json!([{"a": 1}]),
                },
                transforms: vec![],
                fields: vec![],
            },
            space: VisualSpace {
                width: 800.0,
                height: 400.0,
                background: None,
                clips: vec![],
            },
            scales: IndexMap::new(),
            layers: vec![LayerSpec {
                id: None,
                data: None,
                mark: MarkSpec::new("circle"),
                encoding: IndexMap::new(),
                style: None,
                when: None,
                order: None,
                blend_mode: None,
                clip: None,
            }],
            behaviors: vec![],
            animations: vec![],
            metadata: None,
        }
    }

    #[test]
    fn test_minimal_schema_is_valid() {
        let report = validate(&minimal_schema());
        assert!(report.valid, "errors: {:?}", report.errors);
        // missing fields and missing encoding are warnings, not errors
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_required_errors() {
        let mut schema = minimal_schema();
        schema.id = String::new();
        schema.space.width = 0.0;
        schema.layers.clear();
        let report = validate(&schema);
        assert!(!report.valid);
        assert!(report.errors.contains(&"Schema must have an id".to_string()));
        assert!(report
            .errors
            .contains(&"Space must have positive width".to_string()));
        assert!(report
            .errors
            .contains(&"Schema must have at least one layer".to_string()));
    }

    #[test]
    fn test_layer_without_mark_type() {
        let mut schema = minimal_schema();
        schema.layers[0].mark.mark_type = String::new();
        let report = validate(&schema);
        assert!(!report.valid);
        assert!(report
            .errors
            .contains(&"Layer 0 must have a mark definition".to_string()));
    }

    #[test]
    fn test_unknown_dataset_reference_warns() {
        let mut schema = minimal_schema();
        schema.layers[0].data = Some("links".to_string());
        let report = validate(&schema);
        assert!(report.valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("unknown dataset 'links'")));
    }
}
