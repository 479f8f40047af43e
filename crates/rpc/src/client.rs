//! A client of a Starknet JSON-RPC node.
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;

use crate::catalog::{self, MethodContract, RpcMethod};
use crate::error::RpcClientError;
use crate::jsonrpc::{RpcRequest, RpcResponse};

/// Sends requests to a single JSON-RPC endpoint.
///
/// Only methods of the [catalog](crate::catalog) are sent; error responses
/// are classified against the error kinds the method declares. Nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct RpcClient {
    /// This client is internally refcounted
    inner: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Uses `inner` for the requests, for example to share its connection
    /// pool or to configure timeouts.
    pub fn with_client(inner: reqwest::Client, url: Url) -> Self {
        Self { inner, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Calls `M` with `params`.
    #[tracing::instrument(skip(self, params), fields(method = M::NAME))]
    pub async fn call<M: RpcMethod>(&self, params: &M::Params) -> Result<M::Output, RpcClientError> {
        let method = contract(M::NAME)?;
        let params = courier_serde::json::to_wire_value(params)?;
        // Methods without parameters are sent with an empty list.
        let params = match params {
            Value::Object(fields) if fields.is_empty() => Value::Array(Vec::new()),
            params => params,
        };

        let result = self.send(method, params).await?;
        serde_json::from_value(result).map_err(|e| RpcClientError::InvalidResponse(e.to_string()))
    }

    /// Calls the method called `method`, which must be part of the catalog,
    /// with by-name (an object) or positional (an array) `params`. `null`
    /// is sent as an empty list.
    #[tracing::instrument(skip(self, params))]
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcClientError> {
        let method = contract(method)?;
        let params = match params {
            Value::Null => Value::Array(Vec::new()),
            params => params,
        };
        method
            .check_params(&params)
            .map_err(|reason| RpcClientError::InvalidParams {
                method: method.name,
                reason,
            })?;

        self.send(method, params).await
    }

    async fn send(&self, method: &MethodContract, params: Value) -> Result<Value, RpcClientError> {
        let body = courier_serde::json::to_wire_json(&RpcRequest::new(method.name, params))?;

        tracing::trace!(url=%self.url, method=%method.name, "Sending request");

        let response = self
            .inner
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::trace!(%status, "Received response");

        let status_error = response.error_for_status_ref().err();
        let body = response.bytes().await?;

        match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(RpcResponse::Result(result)) => Ok(result),
            Ok(RpcResponse::Error(error)) => Err(RpcClientError::from_error_object(
                method,
                error.code,
                error.message,
                error.data,
            )),
            // Only the status is meaningful when the body is not a JSON-RPC response.
            Err(e) => Err(match status_error {
                Some(status_error) => RpcClientError::Transport(status_error),
                None => RpcClientError::InvalidResponse(e.to_string()),
            }),
        }
    }
}

fn contract(name: &str) -> Result<&'static MethodContract, RpcClientError> {
    catalog::lookup(name).ok_or_else(|| RpcClientError::MethodNotInCatalog(name.to_owned()))
}
