//! Animation binding: load-triggered sequences become a flat timeline
//! with absolute start offsets; other triggers stay declarative and are
//! left to the caller.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use plotline_schema::AnimationSpec;

/// Per-step stagger applied when a step has no explicit delay.
const STEP_STAGGER_MS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationTimeline {
    pub entries: Vec<TimelineEntry>,
    /// update / interaction / time triggered sequences, recorded but not
    /// scheduled
    pub deferred: Vec<AnimationSpec>,
}

impl AnimationTimeline {
    pub fn total_duration(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.start_ms + entry.duration_ms)
            .fold(0.0, f64::max)
    }
}

/// One scheduled property change on a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub animation_id: Option<String>,
    /// Layer id the step applies to
    pub target: String,
    pub properties: IndexMap<String, Value>,
    pub start_ms: f64,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

/// Schedule `load`-triggered animations; everything else lands on the
/// deferred list untouched.
pub fn bind_animations(specs: &[AnimationSpec]) -> AnimationTimeline {
    let mut timeline = AnimationTimeline::default();
    for spec in specs {
        if spec.trigger != "load" {
            timeline.deferred.push(spec.clone());
            continue;
        }
        for (index, step) in spec.sequence.iter().enumerate() {
            let start = spec.delay
                + step
                    .delay
                    .unwrap_or(index as f64 * STEP_STAGGER_MS);
            timeline.entries.push(TimelineEntry {
                animation_id: spec.id.clone(),
                target: step.target.clone(),
                properties: step.properties.clone(),
                start_ms: start,
                duration_ms: step.duration.unwrap_or(spec.duration),
                easing: step.easing.clone().or_else(|| spec.easing.clone()),
            });
        }
    }
    timeline
}
