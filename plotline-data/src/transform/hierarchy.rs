//! Hierarchy layouts: flatten, treemap, partition, pack, tree, cluster.
//!
//! All six transforms share an arena-built tree. Nested rows are walked
//! through a `children` key (configurable); a dataset with multiple top
//! level rows gets a synthetic root so a forest still lays out.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::datum::{field_path, value_as_f64};
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    value: f64,
    depth: usize,
    height: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    data: Value,
    // layout slots, filled by the individual transforms
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    r: f64,
}

struct Tree {
    nodes: Vec<Node>,
    max_depth: usize,
}

impl Tree {
    fn build(data: &Dataset, params: &IndexMap<String, Value>) -> Result<Tree, PlotlineDataError> {
        let children_key = params
            .get("children")
            .and_then(Value::as_str)
            .unwrap_or("children");
        let value_key = params.get("value").and_then(Value::as_str).unwrap_or("value");

        let root_value = match data.len() {
            0 => return Err(PlotlineDataError::transform("hierarchy", "empty input")),
            1 => data[0].clone(),
            _ => {
                let mut root = serde_json::Map::new();
                root.insert("name".to_string(), json!("root"));
                root.insert(children_key.to_string(), Value::Array(data.clone()));
                Value::Object(root)
            }
        };

        let mut tree = Tree {
            nodes: Vec::new(),
            max_depth: 0,
        };
        tree.insert(&root_value, children_key, value_key, 0, None);
        tree.accumulate(0);
        tree.measure_heights(0);
        match params.get("sort").and_then(Value::as_str) {
            Some("ascending") => tree.sort_siblings(false),
            Some("descending") => tree.sort_siblings(true),
            _ => {}
        }
        Ok(tree)
    }

    /// Reorder every node's children by accumulated value.
    fn sort_siblings(&mut self, descending: bool) {
        for index in 0..self.nodes.len() {
            let mut children = self.nodes[index].children.clone();
            children.sort_by(|a, b| {
                let ordering = self.nodes[*a]
                    .value
                    .partial_cmp(&self.nodes[*b].value)
                    .unwrap_or(std::cmp::Ordering::Equal);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
            self.nodes[index].children = children;
        }
    }

    fn insert(
        &mut self,
        row: &Value,
        children_key: &str,
        value_key: &str,
        depth: usize,
        parent: Option<usize>,
    ) -> usize {
        let index = self.nodes.len();
        self.max_depth = self.max_depth.max(depth);
        let name = row
            .get("name")
            .or_else(|| row.get("id"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let own_value = field_path(row, value_key).and_then(value_as_f64);
        self.nodes.push(Node {
            name,
            value: own_value.unwrap_or(0.0),
            depth,
            height: 0,
            parent,
            children: Vec::new(),
            data: row.clone(),
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
            r: 0.0,
        });
        if let Some(Value::Array(children)) = row.get(children_key) {
            for child in children {
                let child_index = self.insert(child, children_key, value_key, depth + 1, Some(index));
                self.nodes[index].children.push(child_index);
            }
        }
        if self.nodes[index].children.is_empty() && own_value.is_none() {
            // valueless leaves still occupy space
            self.nodes[index].value = 1.0;
        }
        index
    }

    /// Internal node values become the sum of their children.
    fn accumulate(&mut self, index: usize) -> f64 {
        let children = self.nodes[index].children.clone();
        if children.is_empty() {
            return self.nodes[index].value;
        }
        let sum: f64 = children.iter().map(|c| self.accumulate(*c)).sum();
        self.nodes[index].value = sum;
        sum
    }

    fn measure_heights(&mut self, index: usize) -> usize {
        let children = self.nodes[index].children.clone();
        let height = children
            .iter()
            .map(|c| self.measure_heights(*c) + 1)
            .max()
            .unwrap_or(0);
        self.nodes[index].height = height;
        height
    }

    fn leaves(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|i| self.nodes[*i].children.is_empty())
            .collect()
    }

    fn node_row(&self, index: usize, extra: Value) -> Value {
        let node = &self.nodes[index];
        let mut row = json!({
            "name": node.name,
            "depth": node.depth,
            "height": node.height,
            "value": node.value,
            "parent": node.parent.map(|p| self.nodes[p].name.clone()),
            "index": index,
            "data": node.data,
        });
        if let (Value::Object(target), Value::Object(source)) = (&mut row, extra) {
            target.extend(source);
        }
        row
    }
}

fn layout_size(params: &IndexMap<String, Value>) -> (f64, f64) {
    match params.get("size") {
        Some(Value::Array(size)) if size.len() == 2 => (
            size[0].as_f64().unwrap_or(1.0),
            size[1].as_f64().unwrap_or(1.0),
        ),
        _ => (1.0, 1.0),
    }
}

/// Flattens nested rows into one node row per member.
pub struct HierarchyTransform;

impl Transform for HierarchyTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let tree = Tree::build(&data, params)?;
        let rows = (0..tree.nodes.len())
            .map(|i| tree.node_row(i, json!({})))
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Slice-and-dice treemap: rows carry the `x0/y0/x1/y1` tile rectangle.
pub struct TreemapTransform;

impl Transform for TreemapTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let mut tree = Tree::build(&data, params)?;
        let (width, height) = layout_size(params);
        tree.nodes[0].x1 = width;
        tree.nodes[0].y1 = height;
        slice_dice(&mut tree, 0);
        let rows = (0..tree.nodes.len())
            .map(|i| {
                let n = &tree.nodes[i];
                tree.node_row(i, json!({"x0": n.x0, "y0": n.y0, "x1": n.x1, "y1": n.y1}))
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Alternate the split axis by depth, children sized by value share.
fn slice_dice(tree: &mut Tree, index: usize) {
    let node = tree.nodes[index].clone();
    if node.children.is_empty() || node.value <= 0.0 {
        return;
    }
    let horizontal = node.depth % 2 == 0;
    let mut offset = if horizontal { node.x0 } else { node.y0 };
    for child_index in node.children.clone() {
        let share = tree.nodes[child_index].value / node.value;
        if horizontal {
            let span = (node.x1 - node.x0) * share;
            let child = &mut tree.nodes[child_index];
            child.x0 = offset;
            child.x1 = offset + span;
            child.y0 = node.y0;
            child.y1 = node.y1;
            offset += span;
        } else {
            let span = (node.y1 - node.y0) * share;
            let child = &mut tree.nodes[child_index];
            child.y0 = offset;
            child.y1 = offset + span;
            child.x0 = node.x0;
            child.x1 = node.x1;
            offset += span;
        }
        slice_dice(tree, child_index);
    }
}

/// Icicle partition: horizontal span by value share, one band per depth.
pub struct PartitionTransform;

impl Transform for PartitionTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let mut tree = Tree::build(&data, params)?;
        let (width, height) = layout_size(params);
        let band = height / (tree.max_depth + 1) as f64;
        tree.nodes[0].x1 = width;
        tree.nodes[0].y1 = band;
        partition_children(&mut tree, 0, band);
        let rows = (0..tree.nodes.len())
            .map(|i| {
                let n = &tree.nodes[i];
                tree.node_row(i, json!({"x0": n.x0, "y0": n.y0, "x1": n.x1, "y1": n.y1}))
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

fn partition_children(tree: &mut Tree, index: usize, band: f64) {
    let node = tree.nodes[index].clone();
    if node.children.is_empty() || node.value <= 0.0 {
        return;
    }
    let mut offset = node.x0;
    for child_index in node.children.clone() {
        let share = tree.nodes[child_index].value / node.value;
        let span = (node.x1 - node.x0) * share;
        let depth = tree.nodes[child_index].depth as f64;
        let child = &mut tree.nodes[child_index];
        child.x0 = offset;
        child.x1 = offset + span;
        child.y0 = depth * band;
        child.y1 = (depth + 1.0) * band;
        offset += span;
        partition_children(tree, child_index, band);
    }
}

/// Circle packing, simplified: leaf circles sized by sqrt(value) and laid
/// on a phyllotaxis spiral inside the layout extent.
pub struct PackTransform;

impl Transform for PackTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let mut tree = Tree::build(&data, params)?;
        let (width, height) = layout_size(params);
        let leaves = tree.leaves();
        let total: f64 = leaves.iter().map(|i| tree.nodes[*i].value).sum();
        // size circles so their combined area fills about half the extent
        let area_scale = if total > 0.0 {
            (width * height * 0.5) / (total * std::f64::consts::PI)
        } else {
            1.0
        };
        let bound = width.min(height) / 2.0;
        let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        for (rank, leaf) in leaves.iter().enumerate() {
            let radius_step = bound / (leaves.len().max(1) as f64).sqrt();
            let distance = radius_step * (rank as f64 + 0.5).sqrt();
            let angle = golden_angle * rank as f64;
            let node = &mut tree.nodes[*leaf];
            node.x0 = width / 2.0 + distance * angle.cos();
            node.y0 = height / 2.0 + distance * angle.sin();
            node.r = (node.value * area_scale).sqrt();
        }
        let rows = (0..tree.nodes.len())
            .map(|i| {
                let n = &tree.nodes[i];
                tree.node_row(i, json!({"x": n.x0, "y": n.y0, "r": n.r}))
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Tidy-ish node-link tree: leaves evenly spaced, parents centered over
/// their children, depth mapped to y.
pub struct TreeTransform;

impl Transform for TreeTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        node_link_layout(data, params, false)
    }
}

/// Dendrogram variant: every leaf sits on the deepest band.
pub struct ClusterTransform;

impl Transform for ClusterTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        node_link_layout(data, params, true)
    }
}

fn node_link_layout(
    data: Dataset,
    params: &IndexMap<String, Value>,
    align_leaves: bool,
) -> Result<TransformOutput, PlotlineDataError> {
    let mut tree = Tree::build(&data, params)?;
    let (width, height) = layout_size(params);
    let leaves = tree.leaves();
    let leaf_count = leaves.len().max(1) as f64;
    for (rank, leaf) in leaves.iter().enumerate() {
        tree.nodes[*leaf].x0 = width * (rank as f64 + 0.5) / leaf_count;
    }
    position_parents(&mut tree, 0);
    let band = height / tree.max_depth.max(1) as f64;
    for node in &mut tree.nodes {
        let depth = if align_leaves && node.children.is_empty() {
            tree.max_depth
        } else {
            node.depth
        };
        node.y0 = depth as f64 * band;
    }
    let radial = params
        .get("radial")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let rows = (0..tree.nodes.len())
        .map(|i| {
            let n = &tree.nodes[i];
            if radial {
                // the horizontal spread becomes the angle, depth the radius
                let angle = std::f64::consts::TAU * n.x0 / width;
                let radius = n.y0 / height * (width.min(height) / 2.0);
                tree.node_row(i, json!({"angle": angle, "radius": radius}))
            } else {
                tree.node_row(i, json!({"x": n.x0, "y": n.y0}))
            }
        })
        .collect::<Vec<_>>();
    Ok(Dataset::from(rows).into())
}

fn position_parents(tree: &mut Tree, index: usize) -> f64 {
    let children = tree.nodes[index].children.clone();
    if children.is_empty() {
        return tree.nodes[index].x0;
    }
    let sum: f64 = children.iter().map(|c| position_parents(tree, *c)).sum();
    let x = sum / children.len() as f64;
    tree.nodes[index].x0 = x;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn nested() -> Dataset {
        vec![json!({
            "name": "root",
            "children": [
                {"name": "a", "value": 3.0},
                {"name": "b", "children": [
                    {"name": "b1", "value": 1.0},
                    {"name": "b2", "value": 2.0},
                ]},
            ],
        })]
    }

    fn with_size(width: f64, height: f64) -> IndexMap<String, Value> {
        [("size".to_string(), json!([width, height]))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_flatten_sums_internal_values() {
        let out = HierarchyTransform.apply(nested(), &IndexMap::new()).unwrap();
        assert_eq!(out.data.len(), 5);
        let root = &out.data[0];
        assert_eq!(root["value"], json!(6.0));
        assert_eq!(root["depth"], json!(0));
        assert_eq!(root["height"], json!(2));
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        assert_eq!(b1["parent"], json!("b"));
    }

    #[test]
    fn test_forest_gets_synthetic_root() {
        let data = vec![json!({"name": "x", "value": 1.0}), json!({"name": "y", "value": 1.0})];
        let out = HierarchyTransform.apply(data, &IndexMap::new()).unwrap();
        assert_eq!(out.data[0]["name"], json!("root"));
        assert_eq!(out.data.len(), 3);
    }

    #[test]
    fn test_treemap_tiles_partition_the_extent() {
        let out = TreemapTransform.apply(nested(), &with_size(100.0, 50.0)).unwrap();
        let a = out.data.iter().find(|r| r["name"] == json!("a")).unwrap();
        // a holds 3/6 of the value, split on x at depth 1
        assert_approx_eq!(f64, a["x1"].as_f64().unwrap() - a["x0"].as_f64().unwrap(), 50.0);
        assert_approx_eq!(f64, a["y1"].as_f64().unwrap(), 50.0);
        // b2 lives inside b's right-hand half
        let b2 = out.data.iter().find(|r| r["name"] == json!("b2")).unwrap();
        assert!(b2["x0"].as_f64().unwrap() >= 50.0);
    }

    #[test]
    fn test_partition_bands_by_depth() {
        let out = PartitionTransform.apply(nested(), &with_size(90.0, 30.0)).unwrap();
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        assert_approx_eq!(f64, b1["y0"].as_f64().unwrap(), 20.0);
        assert_approx_eq!(f64, b1["y1"].as_f64().unwrap(), 30.0);
    }

    #[test]
    fn test_cluster_aligns_leaves_at_max_depth() {
        let out = ClusterTransform.apply(nested(), &with_size(100.0, 40.0)).unwrap();
        let a = out.data.iter().find(|r| r["name"] == json!("a")).unwrap();
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        assert_approx_eq!(f64, a["y"].as_f64().unwrap(), b1["y"].as_f64().unwrap());
    }

    #[test]
    fn test_tree_centers_parent_over_children() {
        let out = TreeTransform.apply(nested(), &with_size(90.0, 40.0)).unwrap();
        let b = out.data.iter().find(|r| r["name"] == json!("b")).unwrap();
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        let b2 = out.data.iter().find(|r| r["name"] == json!("b2")).unwrap();
        let mid = (b1["x"].as_f64().unwrap() + b2["x"].as_f64().unwrap()) / 2.0;
        assert_approx_eq!(f64, b["x"].as_f64().unwrap(), mid);
    }

    #[test]
    fn test_sibling_sort_reorders_layout() {
        let mut params = with_size(100.0, 50.0);
        params.insert("sort".to_string(), json!("descending"));
        let out = TreemapTransform.apply(nested(), &params).unwrap();
        // a (value 3) holds the left half even after b's subtree grows
        let a = out.data.iter().find(|r| r["name"] == json!("a")).unwrap();
        assert_approx_eq!(f64, a["x0"].as_f64().unwrap(), 0.0);
        let b2 = out.data.iter().find(|r| r["name"] == json!("b2")).unwrap();
        // inside b, descending order puts b2 (value 2) before b1
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        assert!(b2["y0"].as_f64().unwrap() <= b1["y0"].as_f64().unwrap());
    }

    #[test]
    fn test_radial_tree_emits_angle_and_radius() {
        let mut params = with_size(100.0, 40.0);
        params.insert("radial".to_string(), json!(true));
        let out = TreeTransform.apply(nested(), &params).unwrap();
        let root = &out.data[0];
        assert!(root.get("x").is_none());
        assert_approx_eq!(f64, root["radius"].as_f64().unwrap(), 0.0);
        let a = out.data.iter().find(|r| r["name"] == json!("a")).unwrap();
        let angle = a["angle"].as_f64().unwrap();
        assert!(angle > 0.0 && angle < std::f64::consts::TAU);
        assert!(a["radius"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_pack_radius_scales_with_value() {
        let out = PackTransform.apply(nested(), &with_size(100.0, 100.0)).unwrap();
        let a = out.data.iter().find(|r| r["name"] == json!("a")).unwrap();
        let b1 = out.data.iter().find(|r| r["name"] == json!("b1")).unwrap();
        assert!(a["r"].as_f64().unwrap() > b1["r"].as_f64().unwrap());
    }
}
