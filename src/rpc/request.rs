use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 ID, a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RpcId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>, id: RpcId) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }
}

/// The parts of a request body the gate needs before the handler runs.
///
/// Decoding is lenient: a body that is not JSON, or not an object, yields an
/// envelope with neither method nor id so the gate can still authenticate and
/// the handler can report the parse error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub method: Option<String>,
    pub id: Option<RpcId>,
}

impl Envelope {
    pub fn peek(body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default)]
            method: Option<String>,
            #[serde(default)]
            id: Option<RpcId>,
        }

        match serde_json::from_slice::<Probe>(body) {
            Ok(probe) => Self {
                method: probe.method,
                id: probe.id,
            },
            Err(_) => Self::default(),
        }
    }

    pub fn method_or_empty(&self) -> &str {
        self.method.as_deref().unwrap_or_default()
    }
}
