//! The JSON-RPC 2.0 envelope, as seen from the client side.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every request is sent with this id. Requests are not batched, so the
/// response on the same connection is always the one to this request.
pub const REQUEST_ID: u64 = 1;

#[derive(Debug, PartialEq, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: REQUEST_ID,
            method,
            params,
        }
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A response carries either a `result`, which may well be `null`, or an
/// `error`.
#[derive(Debug, PartialEq)]
pub enum RpcResponse {
    Result(Value),
    Error(ErrorObject),
}

impl<'de> Deserialize<'de> for RpcResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct Helper {
            jsonrpc: String,
            // Double-bag the result. This is required because serde maps both None and Null to
            // None.
            //
            // The first Option lets us distinguish between a missing result and null.
            #[serde(default, deserialize_with = "deserialize_some")]
            result: Option<Option<Value>>,
            #[serde(default)]
            error: Option<ErrorObject>,
        }

        // Any value that is present is considered Some value, including null.
        fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: Deserialize<'de>,
            D: serde::Deserializer<'de>,
        {
            Deserialize::deserialize(deserializer).map(Some)
        }

        let helper = Helper::deserialize(deserializer)?;

        if helper.jsonrpc != "2.0" {
            return Err(D::Error::custom("Jsonrpc version must be 2.0"));
        }

        match (helper.result, helper.error) {
            (Some(result), None) => Ok(RpcResponse::Result(result.unwrap_or(Value::Null))),
            (None, Some(error)) => Ok(RpcResponse::Error(error)),
            (Some(_), Some(_)) => Err(D::Error::custom("both result and error are set")),
            (None, None) => Err(D::Error::custom("neither result nor error is set")),
        }
    }
}
