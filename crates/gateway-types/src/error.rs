//! Gateway related error types.
use courier_serde::SerializationError;
use serde::{Deserialize, Serialize};

use crate::transaction::EncodeError;

/// Errors of a gateway or feeder gateway call.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// The gateway answered with a Starknet error. Codes we do not know are
    /// kept verbatim in [StarknetErrorCode::Unknown].
    #[error(transparent)]
    StarknetError(#[from] StarknetError),
    /// Transport failures and unexpected HTTP statuses, straight from reqwest.
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    /// The gateway signalled an error but its body was not a Starknet error.
    #[error("error decoding response body: invalid error variant")]
    InvalidStarknetErrorVariant,
    /// The transaction could not be turned into a payload. Nothing was sent.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The request body could not be serialized. Nothing was sent.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl SequencerError {
    /// The known Starknet error code carried by this error, if any.
    pub fn known_code(&self) -> Option<KnownStarknetErrorCode> {
        match self {
            SequencerError::StarknetError(StarknetError {
                code: StarknetErrorCode::Known(code),
                ..
            }) => Some(*code),
            _ => None,
        }
    }
}

/// Body of a failed gateway request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StarknetError {
    pub code: StarknetErrorCode,
    pub message: String,
}

/// Represents a starknet error code reported by the gateway.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StarknetErrorCode {
    Known(KnownStarknetErrorCode),
    /// A code outside of [KnownStarknetErrorCode]. Surfaced as is, never
    /// mapped onto a known code.
    Unknown(String),
}

impl From<KnownStarknetErrorCode> for StarknetErrorCode {
    fn from(value: KnownStarknetErrorCode) -> Self {
        Self::Known(value)
    }
}

impl std::fmt::Display for StarknetErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StarknetErrorCode::Known(code) => write!(f, "{code:?}"),
            StarknetErrorCode::Unknown(code) => write!(f, "unknown error code {code}"),
        }
    }
}

/// Well-known error codes reported by the gateway.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub enum KnownStarknetErrorCode {
    #[serde(rename = "StarknetErrorCode.BLOCK_NOT_FOUND")]
    BlockNotFound,
    #[serde(rename = "StarknetErrorCode.CLASS_ALREADY_DECLARED")]
    ClassAlreadyDeclared,
    #[serde(rename = "StarknetErrorCode.COMPILATION_FAILED")]
    CompilationFailed,
    #[serde(rename = "StarknetErrorCode.CONTRACT_BYTECODE_SIZE_TOO_LARGE")]
    ContractBytecodeSizeTooLarge,
    #[serde(rename = "StarknetErrorCode.CONTRACT_CLASS_OBJECT_SIZE_TOO_LARGE")]
    ContractClassObjectSizeTooLarge,
    /// Resubmission of a transaction the gateway already holds.
    #[serde(rename = "StarknetErrorCode.DUPLICATED_TRANSACTION")]
    DuplicatedTransaction,
    #[serde(rename = "StarknetErrorCode.ENTRY_POINT_NOT_FOUND_IN_CONTRACT")]
    EntryPointNotFound,
    #[serde(rename = "StarknetErrorCode.INSUFFICIENT_ACCOUNT_BALANCE")]
    InsufficientAccountBalance,
    #[serde(rename = "StarknetErrorCode.INSUFFICIENT_MAX_FEE")]
    InsufficientMaxFee,
    #[serde(rename = "StarknetErrorCode.INVALID_COMPILED_CLASS_HASH")]
    InvalidCompiledClassHash,
    #[serde(rename = "StarknetErrorCode.INVALID_CONTRACT_CLASS")]
    InvalidContractClass,
    #[serde(rename = "StarknetErrorCode.INVALID_CONTRACT_DEFINITION")]
    InvalidContractDefinition,
    #[serde(rename = "StarknetErrorCode.INVALID_PROGRAM")]
    InvalidProgram,
    #[serde(rename = "StarkErrorCode.INVALID_SIGNATURE")]
    InvalidSignature,
    #[serde(rename = "StarknetErrorCode.INVALID_TRANSACTION_NONCE")]
    InvalidTransactionNonce,
    #[serde(rename = "StarknetErrorCode.INVALID_TRANSACTION_VERSION")]
    InvalidTransactionVersion,
    #[serde(rename = "StarkErrorCode.MALFORMED_REQUEST")]
    MalformedRequest,
    #[serde(rename = "StarknetErrorCode.NON_PERMITTED_CONTRACT")]
    NotPermittedContract,
    #[serde(rename = "StarknetErrorCode.OUT_OF_RANGE_BLOCK_HASH")]
    OutOfRangeBlockHash,
    #[serde(rename = "StarknetErrorCode.OUT_OF_RANGE_CONTRACT_ADDRESS")]
    OutOfRangeContractAddress,
    #[serde(rename = "StarknetErrorCode.OUT_OF_RANGE_FEE")]
    OutOfRangeFee,
    #[serde(rename = "StarknetErrorCode.OUT_OF_RANGE_TRANSACTION_HASH")]
    OutOfRangeTransactionHash,
    #[serde(rename = "StarkErrorCode.SCHEMA_VALIDATION_ERROR")]
    SchemaValidationError,
    #[serde(rename = "StarknetErrorCode.TRANSACTION_FAILED")]
    TransactionFailed,
    #[serde(rename = "StarknetErrorCode.TRANSACTION_LIMIT_EXCEEDED")]
    TransactionLimitExceeded,
    #[serde(rename = "StarknetErrorCode.UNDECLARED_CLASS")]
    UndeclaredClass,
    #[serde(rename = "StarknetErrorCode.UNINITIALIZED_CONTRACT")]
    UninitializedContract,
    #[serde(rename = "StarknetErrorCode.UNSUPPORTED_SELECTOR_FOR_FEE")]
    UnsupportedSelectorForFee,
    #[serde(rename = "StarknetErrorCode.VALIDATE_FAILURE")]
    ValidateFailure,
}
