//! The catalog of the Starknet JSON-RPC methods this crate speaks.
//!
//! Every method is described by a marker type implementing [RpcMethod],
//! which fixes its name, the shape of its parameters and result, and the
//! closed set of [ApplicationError] kinds it may answer with. [CATALOG]
//! holds the same information for lookups by name.
use courier_common::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApplicationError;
use crate::types::reply::*;
use crate::types::request::*;

/// The sub-groups of the catalog, which differ in idempotence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MethodGroup {
    /// Queries of the node's state.
    Read,
    /// Submissions of transactions.
    Write,
    /// Execution traces and simulations.
    Trace,
}

impl MethodGroup {
    /// Writes are not retried: resubmitting an accepted transaction fails
    /// with [ApplicationError::DuplicateTransaction].
    pub fn is_retryable(self) -> bool {
        match self {
            MethodGroup::Read | MethodGroup::Trace => true,
            MethodGroup::Write => false,
        }
    }
}

/// A JSON-RPC method, implemented by the marker types of this module.
pub trait RpcMethod {
    const NAME: &'static str;
    const GROUP: MethodGroup;
    /// Names of the parameters, in positional order.
    const PARAMS: &'static [&'static str];
    /// The error kinds the method may answer with.
    const ERRORS: &'static [ApplicationError];

    type Params: Serialize + Send + Sync;
    type Output: DeserializeOwned;
}

/// The type erased description of an [RpcMethod].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MethodContract {
    pub name: &'static str,
    pub group: MethodGroup,
    pub params: &'static [&'static str],
    pub errors: &'static [ApplicationError],
}

impl MethodContract {
    pub const fn of<M: RpcMethod>() -> Self {
        Self {
            name: M::NAME,
            group: M::GROUP,
            params: M::PARAMS,
            errors: M::ERRORS,
        }
    }

    /// Maps an error code to one of the declared kinds. Codes the method
    /// does not declare map to `None`, even if they are known to the API.
    pub fn classify(&self, code: i32) -> Option<ApplicationError> {
        ApplicationError::from_code(code).filter(|kind| self.errors.contains(kind))
    }

    /// Checks that `params` fits the parameter names of the method: by-name
    /// params must name every declared parameter and nothing else,
    /// positional ones must match their number.
    pub fn check_params(&self, params: &Value) -> Result<(), String> {
        match params {
            Value::Object(fields) => {
                if let Some(unknown) = fields
                    .keys()
                    .find(|key| !self.params.contains(&key.as_str()))
                {
                    return Err(format!("unknown parameter {unknown}"));
                }
                match self.params.iter().find(|name| !fields.contains_key(**name)) {
                    Some(missing) => Err(format!("missing parameter {missing}")),
                    None => Ok(()),
                }
            }
            Value::Array(values) if values.len() != self.params.len() => Err(format!(
                "expected {} parameters, got {}",
                self.params.len(),
                values.len()
            )),
            Value::Array(_) => Ok(()),
            other => Err(format!("params must be an object or an array, got {other}")),
        }
    }
}

/// Finds the method called `name`.
pub fn lookup(name: &str) -> Option<&'static MethodContract> {
    CATALOG.iter().find(|method| method.name == name)
}

/// Generates a marker type and a params struct per method, and the
/// [CATALOG] listing all of them.
///
/// ## Usage
/// ```ignore
/// methods! {
///     /// Docs of the marker.
///     <Marker> = "<name>", <group> { <param>: <type>, .. } -> <output> [<error kind>, ..];
/// }
/// ```
/// generates `pub struct <Marker>;` and `pub struct <Marker>Params { .. }`
/// serialized by name.
macro_rules! methods {
    ($(
        $(#[$doc:meta])*
        $marker:ident = $name:literal, $group:ident
            { $($param:ident: $ty:ty),* $(,)? } -> $output:ty
            [$($error:ident),* $(,)?];
    )*) => {
        paste::paste! {
            $(
                $(#[$doc])*
                #[derive(Copy, Clone, Debug)]
                pub struct $marker;

                #[derive(Clone, Debug, PartialEq, Serialize)]
                pub struct [<$marker Params>] {
                    $(pub $param: $ty,)*
                }

                impl RpcMethod for $marker {
                    const NAME: &'static str = $name;
                    const GROUP: MethodGroup = MethodGroup::$group;
                    const PARAMS: &'static [&'static str] = &[$(stringify!($param)),*];
                    const ERRORS: &'static [ApplicationError] = &[$(ApplicationError::$error),*];

                    type Params = [<$marker Params>];
                    type Output = $output;
                }
            )*

            /// All methods, by name.
            pub static CATALOG: &[MethodContract] = &[$(MethodContract::of::<$marker>()),*];
        }
    };
}

methods! {
    /// The version of the JSON-RPC specification the node implements.
    SpecVersion = "starknet_specVersion", Read {} -> String [];
    GetBlockWithTxHashes = "starknet_getBlockWithTxHashes", Read
        { block_id: BlockId } -> Value [BlockNotFound];
    GetBlockWithTxs = "starknet_getBlockWithTxs", Read
        { block_id: BlockId } -> Value [BlockNotFound];
    GetStateUpdate = "starknet_getStateUpdate", Read
        { block_id: BlockId } -> Value [BlockNotFound];
    GetStorageAt = "starknet_getStorageAt", Read
        { contract_address: ContractAddress, key: StorageAddress, block_id: BlockId }
        -> StorageValue [ContractNotFound, BlockNotFound];
    GetTransactionStatus = "starknet_getTransactionStatus", Read
        { transaction_hash: TransactionHash } -> TransactionStatus [TxnHashNotFound];
    GetTransactionByHash = "starknet_getTransactionByHash", Read
        { transaction_hash: TransactionHash } -> Value [TxnHashNotFound];
    GetTransactionByBlockIdAndIndex = "starknet_getTransactionByBlockIdAndIndex", Read
        { block_id: BlockId, index: u64 } -> Value [BlockNotFound, InvalidTxnIndex];
    GetTransactionReceipt = "starknet_getTransactionReceipt", Read
        { transaction_hash: TransactionHash } -> Value [TxnHashNotFound];
    GetClass = "starknet_getClass", Read
        { block_id: BlockId, class_hash: ClassHash } -> Value [BlockNotFound, ClassHashNotFound];
    GetClassHashAt = "starknet_getClassHashAt", Read
        { block_id: BlockId, contract_address: ContractAddress }
        -> ClassHash [BlockNotFound, ContractNotFound];
    GetClassAt = "starknet_getClassAt", Read
        { block_id: BlockId, contract_address: ContractAddress }
        -> Value [BlockNotFound, ContractNotFound];
    GetBlockTransactionCount = "starknet_getBlockTransactionCount", Read
        { block_id: BlockId } -> u64 [BlockNotFound];
    /// Executes a view call, nothing is submitted.
    Call = "starknet_call", Read
        { request: FunctionCall, block_id: BlockId }
        -> Vec<CallResultValue> [ContractNotFound, ContractError, BlockNotFound];
    EstimateFee = "starknet_estimateFee", Read
        {
            request: Vec<BroadcastedTransaction>,
            simulation_flags: Vec<SimulationFlagForEstimateFee>,
            block_id: BlockId,
        } -> Value [TransactionExecutionError, BlockNotFound];
    EstimateMessageFee = "starknet_estimateMessageFee", Read
        { message: MsgFromL1, block_id: BlockId } -> Value [ContractError, BlockNotFound];
    BlockNumber = "starknet_blockNumber", Read {} -> courier_common::BlockNumber [NoBlocks];
    BlockHashAndNumber = "starknet_blockHashAndNumber", Read
        {} -> crate::types::reply::BlockHashAndNumber [NoBlocks];
    ChainId = "starknet_chainId", Read {} -> courier_common::ChainId [];
    Syncing = "starknet_syncing", Read {} -> SyncStatus [];
    GetEvents = "starknet_getEvents", Read
        { filter: EventFilter }
        -> EventsChunk [PageSizeTooBig, InvalidContinuationToken, BlockNotFound, TooManyKeysInFilter];
    GetNonce = "starknet_getNonce", Read
        { block_id: BlockId, contract_address: ContractAddress }
        -> TransactionNonce [BlockNotFound, ContractNotFound];

    AddInvokeTransaction = "starknet_addInvokeTransaction", Write
        { invoke_transaction: BroadcastedInvokeTransaction }
        -> AddInvokeTransactionResult [
            InsufficientAccountBalance,
            InsufficientMaxFee,
            InvalidTransactionNonce,
            ValidationFailure,
            NonAccount,
            DuplicateTransaction,
            UnsupportedTxVersion,
            UnexpectedError,
        ];
    AddDeclareTransaction = "starknet_addDeclareTransaction", Write
        { declare_transaction: BroadcastedDeclareTransaction }
        -> AddDeclareTransactionResult [
            ClassAlreadyDeclared,
            CompilationFailed,
            CompiledClassHashMismatch,
            InsufficientAccountBalance,
            InsufficientMaxFee,
            InvalidTransactionNonce,
            ValidationFailure,
            NonAccount,
            DuplicateTransaction,
            ContractClassSizeIsTooLarge,
            UnsupportedTxVersion,
            UnsupportedContractClassVersion,
            UnexpectedError,
        ];
    AddDeployAccountTransaction = "starknet_addDeployAccountTransaction", Write
        { deploy_account_transaction: BroadcastedDeployAccountTransaction }
        -> AddDeployAccountTransactionResult [
            InsufficientAccountBalance,
            InsufficientMaxFee,
            InvalidTransactionNonce,
            ValidationFailure,
            NonAccount,
            ClassHashNotFound,
            DuplicateTransaction,
            UnsupportedTxVersion,
            UnexpectedError,
        ];

    TraceTransaction = "starknet_traceTransaction", Trace
        { transaction_hash: TransactionHash } -> Value [TxnHashNotFound, NoTraceAvailable];
    TraceBlockTransactions = "starknet_traceBlockTransactions", Trace
        { block_id: BlockId } -> Value [BlockNotFound];
    SimulateTransactions = "starknet_simulateTransactions", Trace
        {
            block_id: BlockId,
            transactions: Vec<BroadcastedTransaction>,
            simulation_flags: Vec<SimulationFlag>,
        } -> Value [BlockNotFound, TransactionExecutionError];
}
