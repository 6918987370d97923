use std::time::Duration;

use mapbridge_dispatch::names;
use mapbridge_frame::{Command, Params, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::args::{
    ExportLayout, Extent, InsetMap, Labels, LayerSource, Legend, PrintLayout, RenderMap,
    SampleFeatures, StyleCategorized, StyleLineGraduated, StyleSimple, TraceDownstream,
    UniqueValues,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::link::{Connector, TcpConnector};
use crate::manager::ConnectionManager;

/// Typed entry points for every host command.
///
/// Each call returns the host's envelope unchanged: a command the host
/// rejected is `Ok(Response::Failure { .. })`, and `Err` is reserved for
/// failures to talk to the host at all.
#[derive(Debug)]
pub struct Bridge<C: Connector = TcpConnector> {
    manager: ConnectionManager<C>,
}

impl Bridge<TcpConnector> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_manager(ConnectionManager::new(config))
    }
}

impl Default for Bridge<TcpConnector> {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl<C: Connector> Bridge<C> {
    pub fn with_manager(manager: ConnectionManager<C>) -> Self {
        Self { manager }
    }

    /// Try to reach the host up front.
    ///
    /// Failure is only logged; the next call connects lazily.
    pub fn connect(&mut self) -> bool {
        let connected = self.manager.connect();
        if !connected {
            warn!("host not reachable yet; will retry on first command");
        }
        connected
    }

    /// Drop the connection. The next call reconnects.
    pub fn close(&mut self) {
        self.manager.disconnect();
    }

    pub fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager<C> {
        &mut self.manager
    }

    /// Send an arbitrary command with the default timeout.
    pub fn call(&mut self, command: &Command) -> Result<Response> {
        self.manager.send_command(command, None)
    }

    /// Send an arbitrary command with a timeout for this call only.
    pub fn call_with_timeout(&mut self, command: &Command, timeout: Duration) -> Result<Response> {
        self.manager.send_command(command, Some(timeout))
    }

    fn invoke<A: Serialize + ?Sized>(&mut self, name: &str, args: &A) -> Result<Response> {
        let command = Command::with_params(name, params_of(args)?);
        self.call(&command)
    }

    pub fn ping(&mut self) -> Result<Response> {
        self.call(&Command::new(names::PING))
    }

    pub fn get_info(&mut self) -> Result<Response> {
        self.call(&Command::new(names::GET_INFO))
    }

    pub fn get_project_info(&mut self) -> Result<Response> {
        self.call(&Command::new(names::GET_PROJECT_INFO))
    }

    /// Layers with field definitions for vector and band info for raster layers.
    pub fn list_layers(&mut self) -> Result<Response> {
        self.call(&Command::new(names::LIST_LAYERS))
    }

    /// Older, flatter form of [`Bridge::list_layers`].
    pub fn get_layers(&mut self) -> Result<Response> {
        self.call(&Command::new(names::GET_LAYERS))
    }

    pub fn load_project(&mut self, path: &str) -> Result<Response> {
        self.invoke(names::LOAD_PROJECT, &json!({ "path": path }))
    }

    /// Save the project, to `path` if given, otherwise to its current file.
    pub fn save_project(&mut self, path: Option<&str>) -> Result<Response> {
        let mut command = Command::new(names::SAVE_PROJECT);
        if let Some(path) = path {
            command = command.arg("path", path);
        }
        self.call(&command)
    }

    pub fn create_new_project(&mut self, path: &str) -> Result<Response> {
        self.invoke(names::CREATE_NEW_PROJECT, &json!({ "path": path }))
    }

    pub fn add_vector_layer(&mut self, source: &LayerSource) -> Result<Response> {
        self.invoke(names::ADD_VECTOR_LAYER, source)
    }

    pub fn add_raster_layer(&mut self, source: &LayerSource) -> Result<Response> {
        self.invoke(names::ADD_RASTER_LAYER, source)
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Response> {
        self.invoke(names::REMOVE_LAYER, &json!({ "layer_id": layer_id }))
    }

    pub fn zoom_to_layer(&mut self, layer_id: &str) -> Result<Response> {
        self.invoke(names::ZOOM_TO_LAYER, &json!({ "layer_id": layer_id }))
    }

    pub fn get_layer_features(&mut self, layer_id: &str, limit: Option<u32>) -> Result<Response> {
        let mut command = Command::new(names::GET_LAYER_FEATURES).arg("layer_id", layer_id);
        if let Some(limit) = limit {
            command = command.arg("limit", limit);
        }
        self.call(&command)
    }

    pub fn get_layer_fields(&mut self, layer_name: &str) -> Result<Response> {
        self.invoke(names::GET_LAYER_FIELDS, &json!({ "layer_name": layer_name }))
    }

    pub fn get_unique_values(&mut self, args: &UniqueValues) -> Result<Response> {
        self.invoke(names::GET_UNIQUE_VALUES, args)
    }

    pub fn sample_features(&mut self, args: &SampleFeatures) -> Result<Response> {
        self.invoke(names::SAMPLE_FEATURES, args)
    }

    pub fn get_layer_extent(&mut self, layer_name: &str) -> Result<Response> {
        self.invoke(names::GET_LAYER_EXTENT, &json!({ "layer_name": layer_name }))
    }

    /// Copy the features matching `expression` into a new layer.
    pub fn filter_layer(
        &mut self,
        layer_name: &str,
        expression: &str,
        output_name: &str,
    ) -> Result<Response> {
        let args = json!({
            "layer_name": layer_name,
            "expression": expression,
            "output_name": output_name,
        });
        self.invoke(names::FILTER_LAYER, &args)
    }

    pub fn trace_downstream(&mut self, args: &TraceDownstream) -> Result<Response> {
        self.invoke(names::TRACE_DOWNSTREAM, args)
    }

    pub fn set_layer_visibility(&mut self, layer_name: &str, visible: bool) -> Result<Response> {
        let args = json!({ "layer_name": layer_name, "visible": visible });
        self.invoke(names::SET_LAYER_VISIBILITY, &args)
    }

    pub fn set_canvas_extent(&mut self, extent: Extent) -> Result<Response> {
        self.invoke(names::SET_CANVAS_EXTENT, &extent)
    }

    pub fn style_simple(&mut self, args: &StyleSimple) -> Result<Response> {
        self.invoke(names::STYLE_SIMPLE, args)
    }

    pub fn style_categorized(&mut self, args: &StyleCategorized) -> Result<Response> {
        self.invoke(names::STYLE_CATEGORIZED, args)
    }

    pub fn style_line_graduated(&mut self, args: &StyleLineGraduated) -> Result<Response> {
        self.invoke(names::STYLE_LINE_GRADUATED, args)
    }

    pub fn add_labels(&mut self, args: &Labels) -> Result<Response> {
        self.invoke(names::ADD_LABELS, args)
    }

    pub fn create_print_layout(&mut self, args: &PrintLayout) -> Result<Response> {
        self.invoke(names::CREATE_PRINT_LAYOUT, args)
    }

    pub fn add_legend(&mut self, args: &Legend) -> Result<Response> {
        self.invoke(names::ADD_LEGEND, args)
    }

    pub fn add_inset_map(&mut self, args: &InsetMap) -> Result<Response> {
        self.invoke(names::ADD_INSET_MAP, args)
    }

    pub fn export_layout(&mut self, args: &ExportLayout) -> Result<Response> {
        self.invoke(names::EXPORT_LAYOUT, args)
    }

    pub fn render_map(&mut self, args: &RenderMap) -> Result<Response> {
        self.invoke(names::RENDER_MAP, args)
    }

    /// Run host scripting code; the result carries its captured output.
    pub fn execute_code(&mut self, code: &str) -> Result<Response> {
        self.invoke(names::EXECUTE_CODE, &json!({ "code": code }))
    }

    pub fn execute_processing(&mut self, algorithm: &str, parameters: Value) -> Result<Response> {
        let args = json!({ "algorithm": algorithm, "parameters": parameters });
        self.invoke(names::EXECUTE_PROCESSING, &args)
    }
}

/// Encode typed arguments as a command's argument map.
pub fn params_of<A: Serialize + ?Sized>(args: &A) -> Result<Params> {
    match serde_json::to_value(args).map_err(ClientError::Encode)? {
        Value::Object(params) => Ok(params),
        Value::Null => Ok(Params::new()),
        other => Err(ClientError::InvalidArguments(format!(
            "expected an object, got {other}"
        ))),
    }
}
