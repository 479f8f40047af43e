//! Typed catalog of the Starknet JSON-RPC methods, and a client speaking
//! them.
//!
//! ```ignore
//! use courier_rpc::catalog::{GetNonce, GetNonceParams};
//!
//! let client = RpcClient::new("http://localhost:9545/rpc/v0_7".parse()?);
//! let nonce = client
//!     .call::<GetNonce>(&GetNonceParams { block_id: BlockId::Latest, contract_address })
//!     .await?;
//! ```
pub mod catalog;
mod client;
pub mod error;
pub mod jsonrpc;
pub mod types;

pub use catalog::{MethodContract, MethodGroup, RpcMethod, CATALOG};
pub use client::RpcClient;
pub use error::{ApplicationError, RpcClientError};
