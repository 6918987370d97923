//! Well-known command names.
//!
//! A deployment registers whichever of these its host supports; the table
//! itself accepts any name.

// Connectivity and introspection
pub const PING: &str = "ping";
pub const GET_INFO: &str = "get_info";
pub const GET_PROJECT_INFO: &str = "get_project_info";
pub const LIST_LAYERS: &str = "list_layers";
/// Older spelling of [`LIST_LAYERS`].
pub const GET_LAYERS: &str = "get_layers";

// Project lifecycle
pub const LOAD_PROJECT: &str = "load_project";
pub const SAVE_PROJECT: &str = "save_project";
pub const CREATE_NEW_PROJECT: &str = "create_new_project";

// Layer management
pub const ADD_VECTOR_LAYER: &str = "add_vector_layer";
pub const ADD_RASTER_LAYER: &str = "add_raster_layer";
pub const REMOVE_LAYER: &str = "remove_layer";
pub const ZOOM_TO_LAYER: &str = "zoom_to_layer";
pub const GET_LAYER_FEATURES: &str = "get_layer_features";
pub const GET_LAYER_FIELDS: &str = "get_layer_fields";
pub const GET_UNIQUE_VALUES: &str = "get_unique_values";
pub const SAMPLE_FEATURES: &str = "sample_features";
pub const GET_LAYER_EXTENT: &str = "get_layer_extent";

// Spatial operations
pub const FILTER_LAYER: &str = "filter_layer";
pub const TRACE_DOWNSTREAM: &str = "trace_downstream";

// View and visibility
pub const SET_LAYER_VISIBILITY: &str = "set_layer_visibility";
pub const SET_CANVAS_EXTENT: &str = "set_canvas_extent";

// Styling
pub const STYLE_SIMPLE: &str = "style_simple";
pub const STYLE_CATEGORIZED: &str = "style_categorized";
pub const STYLE_LINE_GRADUATED: &str = "style_line_graduated";
pub const ADD_LABELS: &str = "add_labels";

// Cartographic layout
pub const CREATE_PRINT_LAYOUT: &str = "create_print_layout";
pub const ADD_LEGEND: &str = "add_legend";
pub const ADD_INSET_MAP: &str = "add_inset_map";
pub const EXPORT_LAYOUT: &str = "export_layout";

// Rendering
pub const RENDER_MAP: &str = "render_map";

// Extensibility
pub const EXECUTE_CODE: &str = "execute_code";
pub const EXECUTE_PROCESSING: &str = "execute_processing";

/// Every well-known command name, grouped as above.
pub const ALL: &[&str] = &[
    PING,
    GET_INFO,
    GET_PROJECT_INFO,
    LIST_LAYERS,
    GET_LAYERS,
    LOAD_PROJECT,
    SAVE_PROJECT,
    CREATE_NEW_PROJECT,
    ADD_VECTOR_LAYER,
    ADD_RASTER_LAYER,
    REMOVE_LAYER,
    ZOOM_TO_LAYER,
    GET_LAYER_FEATURES,
    GET_LAYER_FIELDS,
    GET_UNIQUE_VALUES,
    SAMPLE_FEATURES,
    GET_LAYER_EXTENT,
    FILTER_LAYER,
    TRACE_DOWNSTREAM,
    SET_LAYER_VISIBILITY,
    SET_CANVAS_EXTENT,
    STYLE_SIMPLE,
    STYLE_CATEGORIZED,
    STYLE_LINE_GRADUATED,
    ADD_LABELS,
    CREATE_PRINT_LAYOUT,
    ADD_LEGEND,
    ADD_INSET_MAP,
    EXPORT_LAYOUT,
    RENDER_MAP,
    EXECUTE_CODE,
    EXECUTE_PROCESSING,
];

/// True if `name` is one of the well-known command names.
pub fn is_known(name: &str) -> bool {
    ALL.contains(&name)
}
