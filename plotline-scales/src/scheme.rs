//! Named color schemes: categorical palettes and continuous
//! interpolators. Colors come out as CSS `rgb(...)` / hex strings, the
//! form the scene graph carries through to renderers.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::PlotlineScaleError;

/// Continuous color ramp over `t` in `[0, 1]`.
pub type Interpolator = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Categorical palette by name.
pub fn palette(name: &str) -> Result<Vec<Value>, PlotlineScaleError> {
    let hex: &[&str] = match name {
        "category10" => &[
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
            "#7f7f7f", "#bcbd22", "#17becf",
        ],
        "accent" => &[
            "#7fc97f", "#beaed4", "#fdc086", "#ffff99", "#386cb0", "#f0027f", "#bf5b17",
            "#666666",
        ],
        "dark2" => &[
            "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d",
            "#666666",
        ],
        "paired" => &[
            "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f",
            "#ff7f00", "#cab2d6", "#6a3d9a", "#ffff99", "#b15928",
        ],
        "pastel1" => &[
            "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd",
            "#fddaec", "#f2f2f2",
        ],
        "set1" => &[
            "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628",
            "#f781bf", "#999999",
        ],
        "set2" => &[
            "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494",
            "#b3b3b3",
        ],
        "set3" => &[
            "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69",
            "#fccde5", "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
        ],
        "tableau10" => &[
            "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1",
            "#ff9da7", "#9c755f", "#bab0ab",
        ],
        _ => return Err(PlotlineScaleError::UnknownScheme(name.to_string())),
    };
    Ok(hex.iter().map(|h| json!(h)).collect())
}

/// Continuous interpolator by name.
pub fn interpolator(name: &str) -> Result<Interpolator, PlotlineScaleError> {
    let stops: &[(u8, u8, u8)] = match name {
        "viridis" => &[
            (68, 1, 84),
            (59, 82, 139),
            (33, 145, 140),
            (94, 201, 98),
            (253, 231, 37),
        ],
        "plasma" => &[
            (13, 8, 135),
            (126, 3, 168),
            (204, 71, 120),
            (248, 149, 64),
            (240, 249, 33),
        ],
        "inferno" => &[
            (0, 0, 4),
            (87, 16, 110),
            (188, 55, 84),
            (249, 142, 9),
            (252, 255, 164),
        ],
        "magma" => &[
            (0, 0, 4),
            (81, 18, 124),
            (183, 55, 121),
            (252, 137, 97),
            (252, 253, 191),
        ],
        "blues" => &[(247, 251, 255), (107, 174, 214), (8, 48, 107)],
        "greens" => &[(247, 252, 245), (116, 196, 118), (0, 68, 27)],
        "reds" => &[(255, 245, 240), (251, 106, 74), (103, 0, 13)],
        "oranges" => &[(255, 245, 235), (253, 141, 60), (127, 39, 4)],
        "purples" => &[(252, 251, 253), (158, 154, 200), (63, 0, 125)],
        "greys" => &[(255, 255, 255), (0, 0, 0)],
        "turbo" => &[
            (48, 18, 59),
            (70, 134, 251),
            (27, 229, 181),
            (193, 229, 52),
            (249, 137, 24),
            (122, 4, 3),
        ],
        "warm" => &[(110, 64, 170), (255, 94, 99), (175, 240, 91)],
        "cool" => &[(110, 64, 170), (35, 171, 216), (175, 240, 91)],
        "rainbow" => return Ok(Arc::new(rainbow)),
        _ => return Err(PlotlineScaleError::UnknownScheme(name.to_string())),
    };
    let stops = stops.to_vec();
    Ok(Arc::new(move |t| ramp(&stops, t)))
}

/// Piecewise-linear interpolation through the stop list.
fn ramp(stops: &[(u8, u8, u8)], t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let segments = (stops.len() - 1) as f64;
    let position = t * segments;
    let index = (position.floor() as usize).min(stops.len() - 2);
    let fraction = position - index as f64;
    let (r0, g0, b0) = stops[index];
    let (r1, g1, b1) = stops[index + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * fraction).round() as u8;
    format!("rgb({}, {}, {})", lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

fn rainbow(t: f64) -> String {
    let hue = t.clamp(0.0, 1.0) * 360.0;
    let (r, g, b) = hsl_to_rgb(hue, 1.0, 0.5);
    format!("rgb({r}, {g}, {b})")
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f64| ((v + m) * 255.0).round() as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_lookup() {
        let colors = palette("category10").unwrap();
        assert_eq!(colors.len(), 10);
        assert_eq!(colors[0], json!("#1f77b4"));
        assert!(palette("pastel99").is_err());
    }

    #[test]
    fn test_interpolator_endpoints() {
        let viridis = interpolator("viridis").unwrap();
        assert_eq!(viridis(0.0), "rgb(68, 1, 84)");
        assert_eq!(viridis(1.0), "rgb(253, 231, 37)");
    }

    #[test]
    fn test_interpolator_clamps() {
        let blues = interpolator("blues").unwrap();
        assert_eq!(blues(-1.0), blues(0.0));
        assert_eq!(blues(2.0), blues(1.0));
    }

    #[test]
    fn test_rainbow_is_pure_hue() {
        let rainbow = interpolator("rainbow").unwrap();
        assert_eq!(rainbow(0.0), "rgb(255, 0, 0)");
    }
}
