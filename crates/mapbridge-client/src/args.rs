//! Typed arguments for façade calls with optional parameters.
//!
//! Unset options are left out of the encoded argument map entirely, so the
//! host applies its own defaults.

use serde::Serialize;

/// Source for `add_vector_layer` and `add_raster_layer`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerSource {
    pub path: String,
    /// Data provider key, e.g. `ogr` or `gdal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Display name in the layer tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LayerSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UniqueValues {
    pub layer_name: String,
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleFeatures {
    pub layer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Filter expression in the host's expression language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Arguments for `trace_downstream`.
///
/// Starts at the segment nearest to the given WGS84 point and follows the
/// `next_down_field` pointers of the network.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceDownstream {
    pub layer_name: String,
    pub start_lon: f64,
    pub start_lat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_down_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
}

impl TraceDownstream {
    pub fn new(layer_name: impl Into<String>, start_lon: f64, start_lat: f64) -> Self {
        Self {
            layer_name: layer_name.into(),
            start_lon,
            start_lat,
            ..Self::default()
        }
    }
}

/// Bounding box in WGS84 degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleSimple {
    pub layer_name: String,
    /// Fill or stroke color as `#rrggbb`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleCategorized {
    pub layer_name: String,
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_ramp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Line widths interpolated over the values of `width_field`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleLineGraduated {
    pub layer_name: String,
    pub width_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    /// `0` lets the host pick the class count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Labels {
    pub layer_name: String,
    pub field_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Curve labels along line geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_line: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrintLayout {
    pub name: String,
    /// `A3`, `A4`, `letter` or `tabloid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Legend {
    pub layout_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `[x, y]` in millimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Restrict the legend to these layer names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InsetMap {
    pub layout_name: String,
    /// `[xmin, ymin, xmax, ymax]` in WGS84.
    pub extent: [f64; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_extent_indicator: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportLayout {
    pub layout_name: String,
    /// Output format follows the extension: `.pdf`, `.png` or `.jpg`.
    pub output_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderMap {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl RenderMap {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}
