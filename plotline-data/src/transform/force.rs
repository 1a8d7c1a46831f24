//! Force-directed layout. The transform runs the simulation to
//! quiescence up front; the live [`ForceSimulation`] is also handed back
//! so a runtime can keep ticking it for animated layouts.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::datum::value_as_string;
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

const INITIAL_RADIUS: f64 = 10.0;
const MAX_TICKS: usize = 300;

#[derive(Debug, Clone)]
pub struct ForceNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct ForceLink {
    pub source: usize,
    pub target: usize,
    pub data: Value,
}

/// Velocity Verlet simulation with link, many-body, centering and axis
/// positioning forces.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    pub nodes: Vec<ForceNode>,
    pub links: Vec<ForceLink>,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    velocity_decay: f64,
    link_distance: f64,
    charge_strength: f64,
    center: Option<(f64, f64)>,
    x_target: Option<f64>,
    y_target: Option<f64>,
    degrees: Vec<usize>,
}

impl ForceSimulation {
    pub fn new(
        nodes: Vec<ForceNode>,
        links: Vec<ForceLink>,
        params: &IndexMap<String, Value>,
    ) -> ForceSimulation {
        let mut degrees = vec![0usize; nodes.len()];
        for link in &links {
            degrees[link.source] += 1;
            degrees[link.target] += 1;
        }
        let center = match params.get("center") {
            Some(Value::Array(point)) if point.len() == 2 => Some((
                point[0].as_f64().unwrap_or(0.0),
                point[1].as_f64().unwrap_or(0.0),
            )),
            _ => None,
        };
        let mut simulation = ForceSimulation {
            nodes,
            links,
            alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: params
                .get("alphaDecay")
                .and_then(Value::as_f64)
                .unwrap_or(1.0 - 0.001f64.powf(1.0 / MAX_TICKS as f64)),
            velocity_decay: params
                .get("velocityDecay")
                .and_then(Value::as_f64)
                .unwrap_or(0.4),
            link_distance: params
                .get("linkDistance")
                .and_then(Value::as_f64)
                .unwrap_or(30.0),
            charge_strength: params
                .get("chargeStrength")
                .and_then(Value::as_f64)
                .unwrap_or(-30.0),
            center,
            x_target: params.get("x").and_then(Value::as_f64),
            y_target: params.get("y").and_then(Value::as_f64),
            degrees,
        };
        simulation.seed_positions();
        simulation
    }

    /// Deterministic phyllotaxis spiral so untouched nodes never overlap.
    fn seed_positions(&mut self) {
        let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if node.x == 0.0 && node.y == 0.0 {
                let radius = INITIAL_RADIUS * (0.5 + index as f64).sqrt();
                let angle = golden_angle * index as f64;
                node.x = radius * angle.cos();
                node.y = radius * angle.sin();
            }
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Advance one step; returns false once the simulation has cooled.
    pub fn tick(&mut self) -> bool {
        if self.alpha < self.alpha_min {
            return false;
        }
        self.alpha -= self.alpha * self.alpha_decay;
        self.apply_links();
        self.apply_charge();
        self.apply_positioning();
        let damping = 1.0 - self.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= damping;
            node.vy *= damping;
            node.x += node.vx;
            node.y += node.vy;
        }
        self.apply_center();
        true
    }

    /// Run until cooled, capped at 300 iterations.
    pub fn run(&mut self) {
        for _ in 0..MAX_TICKS {
            if !self.tick() {
                break;
            }
        }
    }

    fn apply_links(&mut self) {
        for link in &self.links {
            let (source, target) = (link.source, link.target);
            let mut dx = (self.nodes[target].x + self.nodes[target].vx)
                - (self.nodes[source].x + self.nodes[source].vx);
            let mut dy = (self.nodes[target].y + self.nodes[target].vy)
                - (self.nodes[source].y + self.nodes[source].vy);
            if dx == 0.0 && dy == 0.0 {
                dx = 1e-6;
                dy = 1e-6;
            }
            let length = (dx * dx + dy * dy).sqrt();
            let strength = 1.0 / self.degrees[source].min(self.degrees[target]).max(1) as f64;
            let pull = (length - self.link_distance) / length * self.alpha * strength;
            let bias = self.degrees[source] as f64
                / (self.degrees[source] + self.degrees[target]).max(1) as f64;
            self.nodes[target].vx -= dx * pull * bias;
            self.nodes[target].vy -= dy * pull * bias;
            self.nodes[source].vx += dx * pull * (1.0 - bias);
            self.nodes[source].vy += dy * pull * (1.0 - bias);
        }
    }

    // Pairwise many-body; fine for the graph sizes charts carry.
    fn apply_charge(&mut self) {
        let count = self.nodes.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 && dy == 0.0 {
                    dx = 1e-6;
                    dy = 1e-6;
                }
                let distance_squared = dx * dx + dy * dy;
                let force = self.charge_strength * self.alpha / distance_squared;
                self.nodes[j].vx += dx * force;
                self.nodes[j].vy += dy * force;
                self.nodes[i].vx -= dx * force;
                self.nodes[i].vy -= dy * force;
            }
        }
    }

    fn apply_positioning(&mut self) {
        let strength = 0.1 * self.alpha;
        if let Some(x) = self.x_target {
            for node in &mut self.nodes {
                node.vx += (x - node.x) * strength;
            }
        }
        if let Some(y) = self.y_target {
            for node in &mut self.nodes {
                node.vy += (y - node.y) * strength;
            }
        }
    }

    fn apply_center(&mut self) {
        let Some((cx, cy)) = self.center else {
            return;
        };
        let count = self.nodes.len().max(1) as f64;
        let mean_x = self.nodes.iter().map(|n| n.x).sum::<f64>() / count;
        let mean_y = self.nodes.iter().map(|n| n.y).sum::<f64>() / count;
        for node in &mut self.nodes {
            node.x += cx - mean_x;
            node.y += cy - mean_y;
        }
    }

    /// Node rows with current positions merged over the original fields.
    pub fn nodes_dataset(&self) -> Dataset {
        self.nodes
            .iter()
            .map(|node| {
                let mut row = node.data.clone();
                if let Value::Object(fields) = &mut row {
                    fields.insert("x".to_string(), json!(node.x));
                    fields.insert("y".to_string(), json!(node.y));
                }
                row
            })
            .collect()
    }

    /// Link rows with endpoint coordinates for segment marks.
    pub fn links_dataset(&self) -> Dataset {
        self.links
            .iter()
            .map(|link| {
                let source = &self.nodes[link.source];
                let target = &self.nodes[link.target];
                let mut row = link.data.clone();
                if let Value::Object(fields) = &mut row {
                    fields.insert("x1".to_string(), json!(source.x));
                    fields.insert("y1".to_string(), json!(source.y));
                    fields.insert("x2".to_string(), json!(target.x));
                    fields.insert("y2".to_string(), json!(target.y));
                }
                row
            })
            .collect()
    }
}

/// Splits rows into nodes and links, runs the simulation, and emits the
/// positioned nodes as the main output with links as an extra dataset.
pub struct ForceTransform;

impl Transform for ForceTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let mut node_rows = Vec::new();
        let mut link_rows = Vec::new();
        for row in data {
            if row.get("source").is_some() && row.get("target").is_some() {
                link_rows.push(row);
            } else {
                node_rows.push(row);
            }
        }

        let mut ids: IndexMap<String, usize> = IndexMap::new();
        let mut nodes = Vec::new();
        for row in &node_rows {
            let id = row
                .get("id")
                .map(value_as_string)
                .unwrap_or_else(|| nodes.len().to_string());
            ids.insert(id.clone(), nodes.len());
            nodes.push(ForceNode {
                id,
                x: row.get("x").and_then(Value::as_f64).unwrap_or(0.0),
                y: row.get("y").and_then(Value::as_f64).unwrap_or(0.0),
                vx: 0.0,
                vy: 0.0,
                data: row.clone(),
            });
        }
        // links may reference nodes that were never listed explicitly
        let mut links = Vec::new();
        for row in &link_rows {
            let endpoint = |key: &str, ids: &mut IndexMap<String, usize>, nodes: &mut Vec<ForceNode>| {
                let id = row.get(key).map(value_as_string).unwrap_or_default();
                *ids.entry(id.clone()).or_insert_with(|| {
                    nodes.push(ForceNode {
                        id: id.clone(),
                        x: 0.0,
                        y: 0.0,
                        vx: 0.0,
                        vy: 0.0,
                        data: json!({"id": id}),
                    });
                    nodes.len() - 1
                })
            };
            let source = endpoint("source", &mut ids, &mut nodes);
            let target = endpoint("target", &mut ids, &mut nodes);
            links.push(ForceLink {
                source,
                target,
                data: row.clone(),
            });
        }
        if nodes.is_empty() {
            return Err(PlotlineDataError::transform("force", "no nodes in input"));
        }

        let mut simulation = ForceSimulation::new(nodes, links, params);
        simulation.run();

        Ok(TransformOutput {
            data: simulation.nodes_dataset(),
            extras: vec![("links".to_string(), simulation.links_dataset())],
            simulation: Some(simulation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Dataset {
        vec![
            json!({"id": "a", "group": 1}),
            json!({"id": "b", "group": 1}),
            json!({"id": "c", "group": 2}),
            json!({"source": "a", "target": "b"}),
            json!({"source": "b", "target": "c"}),
        ]
    }

    #[test]
    fn test_splits_nodes_and_links() {
        let out = ForceTransform.apply(graph(), &IndexMap::new()).unwrap();
        assert_eq!(out.data.len(), 3);
        assert_eq!(out.extras.len(), 1);
        assert_eq!(out.extras[0].0, "links");
        assert_eq!(out.extras[0].1.len(), 2);
        assert!(out.simulation.is_some());
    }

    #[test]
    fn test_positions_written_onto_rows() {
        let out = ForceTransform.apply(graph(), &IndexMap::new()).unwrap();
        for row in &out.data {
            assert!(row.get("x").and_then(Value::as_f64).is_some());
            assert!(row.get("y").and_then(Value::as_f64).is_some());
        }
        let link = &out.extras[0].1[0];
        assert!(link.get("x1").is_some() && link.get("y2").is_some());
    }

    #[test]
    fn test_simulation_cools() {
        let out = ForceTransform.apply(graph(), &IndexMap::new()).unwrap();
        let simulation = out.simulation.unwrap();
        assert!(simulation.alpha() < 0.01);
    }

    #[test]
    fn test_linked_nodes_settle_near_link_distance() {
        let data = vec![
            json!({"id": "a"}),
            json!({"id": "b"}),
            json!({"source": "a", "target": "b"}),
        ];
        let params: IndexMap<String, Value> =
            [("chargeStrength".to_string(), json!(0.0))].into_iter().collect();
        let out = ForceTransform.apply(data, &params).unwrap();
        let a = &out.data[0];
        let b = &out.data[1];
        let dx = a["x"].as_f64().unwrap() - b["x"].as_f64().unwrap();
        let dy = a["y"].as_f64().unwrap() - b["y"].as_f64().unwrap();
        let distance = (dx * dx + dy * dy).sqrt();
        assert!((distance - 30.0).abs() < 5.0);
    }

    #[test]
    fn test_implicit_nodes_from_link_endpoints() {
        let data = vec![json!({"source": "x", "target": "y"})];
        let out = ForceTransform.apply(data, &IndexMap::new()).unwrap();
        assert_eq!(out.data.len(), 2);
        assert_eq!(out.data[0]["id"], json!("x"));
    }
}
