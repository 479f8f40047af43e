//! Structures used for deserializing replies from the gateway and feeder
//! gateway REST API.
use courier_common::prelude::*;
use serde::Deserialize;

/// Block and transaction status values.
///
/// Newer gateways report `ACCEPTED_ON_L2` and `ACCEPTED_ON_L1` where older
/// ones reported `PENDING` and `ACCEPTED_ONCHAIN`. Both spellings are read.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub enum Status {
    #[serde(rename = "NOT_RECEIVED")]
    NotReceived,
    #[serde(rename = "RECEIVED")]
    Received,
    #[serde(rename = "PENDING", alias = "ACCEPTED_ON_L2")]
    Pending,
    #[serde(rename = "ACCEPTED_ONCHAIN", alias = "ACCEPTED_ON_L1")]
    AcceptedOnchain,
    #[serde(rename = "REJECTED")]
    Rejected,
    /// Included in a block, but execution failed and its state changes were
    /// discarded.
    #[serde(rename = "REVERTED")]
    Reverted,
    #[serde(rename = "ABORTED")]
    Aborted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Status::NotReceived => "NOT_RECEIVED",
            Status::Received => "RECEIVED",
            Status::Pending => "PENDING",
            Status::AcceptedOnchain => "ACCEPTED_ONCHAIN",
            Status::Rejected => "REJECTED",
            Status::Reverted => "REVERTED",
            Status::Aborted => "ABORTED",
        })
    }
}

/// Used to deserialize replies to `get_transaction_status`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct TransactionStatus {
    pub tx_status: Status,
    #[serde(default)]
    pub block_hash: Option<BlockHash>,
    #[serde(default)]
    pub tx_failure_reason: Option<FailureReason>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct FailureReason {
    pub code: String,
    pub error_message: String,
}

/// Used to deserialize replies to `get_transaction`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct TransactionReply {
    pub status: Status,
    #[serde(default)]
    pub block_hash: Option<BlockHash>,
    #[serde(default)]
    pub block_number: Option<BlockNumber>,
    #[serde(default)]
    pub transaction_index: Option<u64>,
    /// Absent when the status is `NOT_RECEIVED`.
    #[serde(default)]
    pub transaction: Option<transaction::Transaction>,
}

/// Used to deserialize replies to `get_block`.
///
/// Pending blocks carry neither a hash nor a number.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct Block {
    #[serde(default)]
    pub block_hash: Option<BlockHash>,
    #[serde(default)]
    pub block_number: Option<BlockNumber>,
    pub parent_block_hash: BlockHash,
    #[serde(default, alias = "state_commitment")]
    pub state_root: Option<StateRoot>,
    pub status: Status,
    pub timestamp: u64,
    pub transactions: Vec<transaction::Transaction>,
    #[serde(default)]
    pub transaction_receipts: Vec<transaction::Receipt>,
}

/// Used to deserialize replies to `get_code`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct Code {
    pub bytecode: Vec<Felt>,
    #[serde(default)]
    pub abi: serde_json::Value,
}

/// Used to deserialize replies to `call_contract`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
#[serde(deny_unknown_fields)]
pub struct CallResponse {
    pub result: Vec<CallResultValue>,
}

/// Used to deserialize replies to `get_contract_addresses`. The values are
/// L1 addresses.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct ContractAddresses {
    #[serde(rename = "Starknet")]
    pub starknet: String,
    #[serde(rename = "GpsStatementVerifier")]
    pub gps_statement_verifier: String,
}

/// Used to deserialize replies to `add_transaction`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
pub struct AddTransactionResponse {
    /// `TRANSACTION_RECEIVED` on success.
    pub code: String,
    pub transaction_hash: TransactionHash,
    /// Present for `DEPLOY` and `DEPLOY_ACCOUNT`.
    #[serde(default)]
    pub address: Option<ContractAddress>,
    /// Present for `DECLARE`.
    #[serde(default)]
    pub class_hash: Option<ClassHash>,
}

/// Types used when deserializing transactions and receipts.
pub mod transaction {
    use courier_common::prelude::*;
    use courier_serde::HexOrDecimalFelt;
    use serde::Deserialize;
    use serde_with::serde_as;

    /// A transaction as the feeder gateway reports it.
    ///
    /// Only string fields appear in the variants: numbers inside an
    /// internally tagged enum lose their exact form while being buffered.
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    #[serde(tag = "type")]
    pub enum Transaction {
        #[serde(rename = "INVOKE_FUNCTION")]
        Invoke(InvokeTransaction),
        #[serde(rename = "DECLARE")]
        Declare(DeclareTransaction),
        #[serde(rename = "DEPLOY")]
        Deploy(DeployTransaction),
        #[serde(rename = "DEPLOY_ACCOUNT")]
        DeployAccount(DeployAccountTransaction),
        #[serde(rename = "L1_HANDLER")]
        L1Handler(L1HandlerTransaction),
    }

    impl Transaction {
        pub fn hash(&self) -> TransactionHash {
            match self {
                Transaction::Invoke(t) => t.transaction_hash,
                Transaction::Declare(t) => t.transaction_hash,
                Transaction::Deploy(t) => t.transaction_hash,
                Transaction::DeployAccount(t) => t.transaction_hash,
                Transaction::L1Handler(t) => t.transaction_hash,
            }
        }
    }

    #[serde_as]
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct InvokeTransaction {
        pub transaction_hash: TransactionHash,
        #[serde(alias = "sender_address")]
        pub contract_address: ContractAddress,
        #[serde(default)]
        pub entry_point_selector: Option<EntryPoint>,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        pub calldata: Vec<CallParam>,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        #[serde(default)]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde(default)]
        pub max_fee: Option<Fee>,
        #[serde(default)]
        pub nonce: Option<TransactionNonce>,
        #[serde(default)]
        pub version: Option<TransactionVersion>,
    }

    #[serde_as]
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct DeclareTransaction {
        pub transaction_hash: TransactionHash,
        pub class_hash: ClassHash,
        pub sender_address: ContractAddress,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        #[serde(default)]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde(default)]
        pub max_fee: Option<Fee>,
        #[serde(default)]
        pub nonce: Option<TransactionNonce>,
        #[serde(default)]
        pub version: Option<TransactionVersion>,
    }

    #[serde_as]
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct DeployTransaction {
        pub transaction_hash: TransactionHash,
        pub contract_address: ContractAddress,
        pub contract_address_salt: ContractAddressSalt,
        #[serde(default)]
        pub class_hash: Option<ClassHash>,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        pub constructor_calldata: Vec<ConstructorParam>,
        #[serde(default)]
        pub version: Option<TransactionVersion>,
    }

    #[serde_as]
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct DeployAccountTransaction {
        pub transaction_hash: TransactionHash,
        pub contract_address: ContractAddress,
        pub contract_address_salt: ContractAddressSalt,
        pub class_hash: ClassHash,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        pub constructor_calldata: Vec<ConstructorParam>,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        #[serde(default)]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde(default)]
        pub max_fee: Option<Fee>,
        #[serde(default)]
        pub nonce: Option<TransactionNonce>,
        #[serde(default)]
        pub version: Option<TransactionVersion>,
    }

    #[serde_as]
    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct L1HandlerTransaction {
        pub transaction_hash: TransactionHash,
        pub contract_address: ContractAddress,
        pub entry_point_selector: EntryPoint,
        #[serde_as(as = "Vec<HexOrDecimalFelt>")]
        pub calldata: Vec<CallParam>,
        #[serde(default)]
        pub nonce: Option<TransactionNonce>,
        #[serde(default)]
        pub version: Option<TransactionVersion>,
    }

    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct Receipt {
        pub transaction_hash: TransactionHash,
        pub transaction_index: u64,
        #[serde(default)]
        pub actual_fee: Option<Fee>,
        #[serde(default)]
        pub events: Vec<Event>,
        #[serde(default)]
        pub l2_to_l1_messages: Vec<serde_json::Value>,
    }

    #[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
    #[cfg_attr(any(test, feature = "test-utils"), derive(serde::Serialize))]
    pub struct Event {
        pub from_address: ContractAddress,
        pub keys: Vec<EventKey>,
        pub data: Vec<EventData>,
    }
}
