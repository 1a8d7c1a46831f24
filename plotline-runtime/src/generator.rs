//! Path generators for the path-like marks: polyline/area strings and
//! annular arc wedges, SVG path syntax.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    #[default]
    Linear,
    /// Horizontal-then-vertical steps between points
    Step,
}

impl Curve {
    /// Unknown names fall back to linear.
    pub fn from_name(name: Option<&str>) -> Curve {
        match name {
            None | Some("linear") => Curve::Linear,
            Some("step") => Curve::Step,
            Some(other) => {
                warn!(curve = other, "unknown curve, using linear");
                Curve::Linear
            }
        }
    }
}

/// Polyline through the points. Empty input yields an empty path.
pub fn line_path(points: &[(f64, f64)], curve: Curve) -> String {
    let mut d = String::new();
    let mut previous: Option<(f64, f64)> = None;
    for (x, y) in points {
        match previous {
            None => d.push_str(&format!("M{x},{y}")),
            Some((_, py)) => match curve {
                Curve::Linear => d.push_str(&format!("L{x},{y}")),
                Curve::Step => d.push_str(&format!("L{x},{py}L{x},{y}")),
            },
        }
        previous = Some((*x, *y));
    }
    d
}

/// Closed region between a top line and a baseline, traversed forward
/// along the top and back along the baseline.
pub fn area_path(top: &[(f64, f64)], baseline: &[(f64, f64)], curve: Curve) -> String {
    if top.is_empty() {
        return String::new();
    }
    let mut d = line_path(top, curve);
    let reversed: Vec<(f64, f64)> = baseline.iter().rev().copied().collect();
    for (x, y) in &reversed {
        d.push_str(&format!("L{x},{y}"));
    }
    d.push('Z');
    d
}

/// Annular wedge centered on `(cx, cy)`. Angles are radians, measured
/// clockwise from 12 o'clock (the pie transform's convention).
pub fn arc_path(
    cx: f64,
    cy: f64,
    inner_radius: f64,
    outer_radius: f64,
    start_angle: f64,
    end_angle: f64,
) -> String {
    let point = |radius: f64, angle: f64| {
        (cx + radius * angle.sin(), cy - radius * angle.cos())
    };
    let large_arc = if (end_angle - start_angle).abs() > std::f64::consts::PI {
        1
    } else {
        0
    };
    let (x0, y0) = point(outer_radius, start_angle);
    let (x1, y1) = point(outer_radius, end_angle);
    if inner_radius <= 0.0 {
        format!(
            "M{cx},{cy}L{x0},{y0}A{outer_radius},{outer_radius} 0 {large_arc} 1 {x1},{y1}Z"
        )
    } else {
        let (x2, y2) = point(inner_radius, end_angle);
        let (x3, y3) = point(inner_radius, start_angle);
        format!(
            "M{x0},{y0}A{outer_radius},{outer_radius} 0 {large_arc} 1 {x1},{y1}L{x2},{y2}A{inner_radius},{inner_radius} 0 {large_arc} 0 {x3},{y3}Z"
        )
    }
}
