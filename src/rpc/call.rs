use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::RpcError;

/// Parameters of `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceParams {
    pub uri: String,
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl CallToolParams {
    /// Integer argument, failing with InvalidParams naming `key` when absent.
    pub fn require_i64(&self, key: &str) -> Result<i64, RpcError> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Err(RpcError::missing_param(key)),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| RpcError::invalid_param(format!("Parameter '{key}' must be an integer"))),
        }
    }
}

/// A decoded JSON-RPC method call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    Initialize,
    ListResources,
    ReadResource(ReadResourceParams),
    ListTools,
    CallTool(CallToolParams),
}

impl RpcCall {
    pub fn decode(method: &str, params: Option<Value>) -> Result<Self, RpcError> {
        match method {
            "initialize" => Ok(Self::Initialize),
            "resources/list" => Ok(Self::ListResources),
            "resources/read" => decode_params(params, &["uri"]).map(Self::ReadResource),
            "tools/list" => Ok(Self::ListTools),
            "tools/call" => decode_params(params, &["name"]).map(Self::CallTool),
            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }
}

fn decode_params<T: DeserializeOwned>(
    params: Option<Value>,
    required: &[&str],
) -> Result<T, RpcError> {
    let params = match params {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => Map::new(),
        Some(_) => return Err(RpcError::invalid_param("params must be an object")),
    };

    if let Some(missing) = required
        .iter()
        .find(|key| matches!(params.get(**key), None | Some(Value::Null)))
    {
        return Err(RpcError::missing_param(missing));
    }

    serde_json::from_value(Value::Object(params)).map_err(|e| RpcError::invalid_param(e.to_string()))
}
