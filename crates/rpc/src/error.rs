//! Defines [ApplicationError], the Starknet JSON-RPC specification's error
//! kinds, and [RpcClientError], the errors of [RpcClient](crate::RpcClient).
use serde_json::Value;

use crate::catalog::MethodContract;

/// The Starknet JSON-RPC error kinds.
///
/// Each method of the [catalog](crate::catalog) declares the closed subset of
/// these it may answer with.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApplicationError {
    #[error("Failed to write transaction")]
    FailedToReceiveTxn,
    #[error("No trace available for transaction")]
    NoTraceAvailable,
    #[error("Contract not found")]
    ContractNotFound,
    #[error("Requested entrypoint does not exist in the contract")]
    EntrypointNotFound,
    #[error("Block not found")]
    BlockNotFound,
    #[error("Invalid transaction hash")]
    InvalidTxnHash,
    #[error("Invalid block hash")]
    InvalidBlockHash,
    #[error("Invalid transaction index in a block")]
    InvalidTxnIndex,
    #[error("Class hash not found")]
    ClassHashNotFound,
    #[error("Transaction hash not found")]
    TxnHashNotFound,
    #[error("Requested page size is too big")]
    PageSizeTooBig,
    #[error("There are no blocks")]
    NoBlocks,
    #[error("The supplied continuation token is invalid or unknown")]
    InvalidContinuationToken,
    #[error("Too many keys provided in a filter")]
    TooManyKeysInFilter,
    #[error("Contract error")]
    ContractError,
    #[error("Transaction execution error")]
    TransactionExecutionError,
    #[error("Invalid contract class")]
    InvalidContractClass,
    #[error("Class already declared")]
    ClassAlreadyDeclared,
    #[error("Invalid transaction nonce")]
    InvalidTransactionNonce,
    #[error("Max fee is smaller than the minimal transaction cost (validation plus fee transfer)")]
    InsufficientMaxFee,
    #[error("Account balance is smaller than the transaction's max_fee")]
    InsufficientAccountBalance,
    #[error("Account validation failed")]
    ValidationFailure,
    #[error("Compilation failed")]
    CompilationFailed,
    #[error("Contract class size is too large")]
    ContractClassSizeIsTooLarge,
    #[error("Sender address is not an account contract")]
    NonAccount,
    #[error("A transaction with the same hash already exists in the mempool")]
    DuplicateTransaction,
    #[error("The compiled class hash did not match the one supplied in the transaction")]
    CompiledClassHashMismatch,
    #[error("The transaction version is not supported")]
    UnsupportedTxVersion,
    #[error("The contract class version is not supported")]
    UnsupportedContractClassVersion,
    #[error("An unexpected error occurred")]
    UnexpectedError,
}

impl ApplicationError {
    pub const ALL: [ApplicationError; 30] = [
        ApplicationError::FailedToReceiveTxn,
        ApplicationError::NoTraceAvailable,
        ApplicationError::ContractNotFound,
        ApplicationError::EntrypointNotFound,
        ApplicationError::BlockNotFound,
        ApplicationError::InvalidTxnHash,
        ApplicationError::InvalidBlockHash,
        ApplicationError::InvalidTxnIndex,
        ApplicationError::ClassHashNotFound,
        ApplicationError::TxnHashNotFound,
        ApplicationError::PageSizeTooBig,
        ApplicationError::NoBlocks,
        ApplicationError::InvalidContinuationToken,
        ApplicationError::TooManyKeysInFilter,
        ApplicationError::ContractError,
        ApplicationError::TransactionExecutionError,
        ApplicationError::InvalidContractClass,
        ApplicationError::ClassAlreadyDeclared,
        ApplicationError::InvalidTransactionNonce,
        ApplicationError::InsufficientMaxFee,
        ApplicationError::InsufficientAccountBalance,
        ApplicationError::ValidationFailure,
        ApplicationError::CompilationFailed,
        ApplicationError::ContractClassSizeIsTooLarge,
        ApplicationError::NonAccount,
        ApplicationError::DuplicateTransaction,
        ApplicationError::CompiledClassHashMismatch,
        ApplicationError::UnsupportedTxVersion,
        ApplicationError::UnsupportedContractClassVersion,
        ApplicationError::UnexpectedError,
    ];

    pub const fn code(&self) -> i32 {
        match self {
            // Taken from the official starknet json rpc api.
            // https://github.com/starkware-libs/starknet-specs
            ApplicationError::FailedToReceiveTxn => 1,
            ApplicationError::NoTraceAvailable => 10,
            ApplicationError::ContractNotFound => 20,
            ApplicationError::EntrypointNotFound => 21,
            ApplicationError::BlockNotFound => 24,
            ApplicationError::InvalidTxnHash => 25,
            ApplicationError::InvalidBlockHash => 26,
            ApplicationError::InvalidTxnIndex => 27,
            ApplicationError::ClassHashNotFound => 28,
            ApplicationError::TxnHashNotFound => 29,
            ApplicationError::PageSizeTooBig => 31,
            ApplicationError::NoBlocks => 32,
            ApplicationError::InvalidContinuationToken => 33,
            ApplicationError::TooManyKeysInFilter => 34,
            ApplicationError::ContractError => 40,
            ApplicationError::TransactionExecutionError => 41,
            ApplicationError::InvalidContractClass => 50,
            ApplicationError::ClassAlreadyDeclared => 51,
            ApplicationError::InvalidTransactionNonce => 52,
            ApplicationError::InsufficientMaxFee => 53,
            ApplicationError::InsufficientAccountBalance => 54,
            ApplicationError::ValidationFailure => 55,
            ApplicationError::CompilationFailed => 56,
            ApplicationError::ContractClassSizeIsTooLarge => 57,
            ApplicationError::NonAccount => 58,
            ApplicationError::DuplicateTransaction => 59,
            ApplicationError::CompiledClassHashMismatch => 60,
            ApplicationError::UnsupportedTxVersion => 61,
            ApplicationError::UnsupportedContractClassVersion => 62,
            ApplicationError::UnexpectedError => 63,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

/// Errors of [RpcClient](crate::RpcClient) calls.
#[derive(thiserror::Error, Debug)]
pub enum RpcClientError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The method is not part of the catalog, nothing was sent.
    #[error("method {0} is not in the catalog")]
    MethodNotInCatalog(String),
    /// The parameters do not fit the shape of the method, nothing was sent.
    #[error("invalid params for {method}: {reason}")]
    InvalidParams {
        method: &'static str,
        reason: String,
    },
    /// An error the method declares.
    #[error("{method} failed with {kind}: {message}")]
    Protocol {
        method: &'static str,
        kind: ApplicationError,
        message: String,
        data: Option<Value>,
    },
    /// An error code outside of the set the method declares.
    #[error("{method} failed with undeclared error code {code}: {message}")]
    UnexpectedProtocol {
        method: &'static str,
        code: i32,
        message: String,
        data: Option<Value>,
    },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Serialization(#[from] courier_serde::SerializationError),
}

impl RpcClientError {
    /// Classifies an error object returned for `method`.
    pub(crate) fn from_error_object(
        method: &MethodContract,
        code: i32,
        message: String,
        data: Option<Value>,
    ) -> Self {
        match method.classify(code) {
            Some(kind) => RpcClientError::Protocol {
                method: method.name,
                kind,
                message,
                data,
            },
            None => RpcClientError::UnexpectedProtocol {
                method: method.name,
                code,
                message,
                data,
            },
        }
    }

    /// The declared error kind, if the node answered with one.
    pub fn kind(&self) -> Option<ApplicationError> {
        match self {
            RpcClientError::Protocol { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
