//! Common data structures used by the JSON-RPC API methods.
//!
//! Felts are sent as `0x` prefixed hex strings, block numbers as JSON
//! numbers and block ids as `"latest"`, `"pending"`, `{"block_number": 1}`
//! or `{"block_hash": "0x1"}`.

/// Groups all strictly input types of the RPC API.
pub mod request {
    use courier_common::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct FunctionCall {
        pub contract_address: ContractAddress,
        pub entry_point_selector: EntryPoint,
        pub calldata: Vec<CallParam>,
    }

    /// A message sent from L1, used to estimate the fee of its handler.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct MsgFromL1 {
        /// The Ethereum address of the sender.
        pub from_address: String,
        pub to_address: ContractAddress,
        pub entry_point_selector: EntryPoint,
        pub payload: Vec<CallParam>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    #[serde(tag = "type", rename = "INVOKE")]
    pub struct BroadcastedInvokeTransaction {
        pub version: TransactionVersion,
        pub sender_address: ContractAddress,
        pub calldata: Vec<CallParam>,
        pub max_fee: Fee,
        pub signature: Vec<TransactionSignatureElem>,
        pub nonce: TransactionNonce,
    }

    #[derive(Clone, Debug, PartialEq, Serialize)]
    #[serde(tag = "type", rename = "DECLARE")]
    pub struct BroadcastedDeclareTransaction {
        pub version: TransactionVersion,
        pub sender_address: ContractAddress,
        pub compiled_class_hash: CasmHash,
        pub max_fee: Fee,
        pub signature: Vec<TransactionSignatureElem>,
        pub nonce: TransactionNonce,
        /// The Sierra class, passed through as is.
        pub contract_class: serde_json::Value,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    #[serde(tag = "type", rename = "DEPLOY_ACCOUNT")]
    pub struct BroadcastedDeployAccountTransaction {
        pub version: TransactionVersion,
        pub max_fee: Fee,
        pub signature: Vec<TransactionSignatureElem>,
        pub nonce: TransactionNonce,
        pub contract_address_salt: ContractAddressSalt,
        pub constructor_calldata: Vec<CallParam>,
        pub class_hash: ClassHash,
    }

    /// Any transaction that can be broadcasted, each kind carries its own
    /// `type` tag.
    #[derive(Clone, Debug, PartialEq, Serialize)]
    #[serde(untagged)]
    pub enum BroadcastedTransaction {
        Invoke(BroadcastedInvokeTransaction),
        Declare(BroadcastedDeclareTransaction),
        DeployAccount(BroadcastedDeployAccountTransaction),
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
    pub struct EventFilter {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub from_block: Option<BlockId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub to_block: Option<BlockId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub address: Option<ContractAddress>,
        /// Keys by position, an empty position matches any key.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        pub keys: Vec<Vec<EventKey>>,
        pub chunk_size: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub continuation_token: Option<String>,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
    pub enum SimulationFlag {
        #[serde(rename = "SKIP_VALIDATE")]
        SkipValidate,
        #[serde(rename = "SKIP_FEE_CHARGE")]
        SkipFeeCharge,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
    pub enum SimulationFlagForEstimateFee {
        #[serde(rename = "SKIP_VALIDATE")]
        SkipValidate,
    }
}

/// Groups all strictly output types of the RPC API.
pub mod reply {
    use courier_common::prelude::*;
    use courier_gateway_types::reply::Status;
    use serde::Deserialize;

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct BlockHashAndNumber {
        pub block_hash: BlockHash,
        pub block_number: BlockNumber,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
    pub enum FinalityStatus {
        #[serde(rename = "RECEIVED")]
        Received,
        #[serde(rename = "REJECTED")]
        Rejected,
        #[serde(rename = "ACCEPTED_ON_L2")]
        AcceptedOnL2,
        #[serde(rename = "ACCEPTED_ON_L1")]
        AcceptedOnL1,
    }

    /// The legacy gateway's view of a finality status, so that the same
    /// poller drives both surfaces.
    impl From<FinalityStatus> for Status {
        fn from(status: FinalityStatus) -> Self {
            match status {
                FinalityStatus::Received => Status::Received,
                FinalityStatus::Rejected => Status::Rejected,
                FinalityStatus::AcceptedOnL2 => Status::Pending,
                FinalityStatus::AcceptedOnL1 => Status::AcceptedOnchain,
            }
        }
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
    pub enum ExecutionStatus {
        #[serde(rename = "SUCCEEDED")]
        Succeeded,
        #[serde(rename = "REVERTED")]
        Reverted,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct TransactionStatus {
        pub finality_status: FinalityStatus,
        #[serde(default)]
        pub execution_status: Option<ExecutionStatus>,
        #[serde(default)]
        pub failure_reason: Option<String>,
    }

    impl TransactionStatus {
        /// The finality status in the form the confirmation poller expects.
        ///
        /// A reverted transaction is still final: it is included in a block
        /// and its fee is charged.
        pub fn status(&self) -> Status {
            self.finality_status.into()
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct SyncProgress {
        pub starting_block_hash: BlockHash,
        pub starting_block_num: BlockNumber,
        pub current_block_hash: BlockHash,
        pub current_block_num: BlockNumber,
        pub highest_block_hash: BlockHash,
        pub highest_block_num: BlockNumber,
    }

    /// Either `false` or the progress of the node's sync.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SyncStatus {
        NotSyncing,
        Syncing(SyncProgress),
    }

    // Untagged enums buffer numbers, which breaks with `arbitrary_precision`,
    // so the variant is picked by hand.
    impl<'de> Deserialize<'de> for SyncStatus {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            use serde::de::Error;

            match serde_json::Value::deserialize(deserializer)? {
                serde_json::Value::Bool(false) => Ok(SyncStatus::NotSyncing),
                progress @ serde_json::Value::Object(_) => serde_json::from_value(progress)
                    .map(SyncStatus::Syncing)
                    .map_err(D::Error::custom),
                other => Err(D::Error::custom(format!(
                    "expected false or a sync status object, got {other}"
                ))),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct EmittedEvent {
        pub from_address: ContractAddress,
        pub keys: Vec<EventKey>,
        pub data: Vec<EventData>,
        /// Not set for events of the pending block.
        #[serde(default)]
        pub block_hash: Option<BlockHash>,
        #[serde(default)]
        pub block_number: Option<BlockNumber>,
        pub transaction_hash: TransactionHash,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct EventsChunk {
        pub events: Vec<EmittedEvent>,
        #[serde(default)]
        pub continuation_token: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct AddInvokeTransactionResult {
        pub transaction_hash: TransactionHash,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct AddDeclareTransactionResult {
        pub transaction_hash: TransactionHash,
        pub class_hash: ClassHash,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
    pub struct AddDeployAccountTransactionResult {
        pub transaction_hash: TransactionHash,
        pub contract_address: ContractAddress,
    }
}

#[cfg(test)]
mod tests {
    use courier_common::prelude::*;
    use courier_gateway_types::reply::Status;
    use pretty_assertions_sorted::assert_eq;
    use serde_json::json;

    use super::reply::*;
    use super::request::*;

    #[test]
    fn broadcasted_transactions_carry_their_type() {
        let invoke = BroadcastedInvokeTransaction {
            version: TransactionVersion::ONE,
            sender_address: contract_address!("0x1"),
            calldata: vec![call_param!("0x2")],
            max_fee: fee!("0x3"),
            signature: vec![],
            nonce: transaction_nonce!("0x0"),
        };
        let value = serde_json::to_value(BroadcastedTransaction::Invoke(invoke)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "INVOKE",
                "version": "0x1",
                "sender_address": "0x1",
                "calldata": ["0x2"],
                "max_fee": "0x3",
                "signature": [],
                "nonce": "0x0",
            })
        );
    }

    #[test]
    fn event_filter_skips_unset_fields() {
        let filter = EventFilter {
            from_block: Some(BlockId::Latest),
            chunk_size: 10,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({"from_block": "latest", "chunk_size": 10})
        );
    }

    #[rstest::rstest]
    #[case::received("RECEIVED", Status::Received)]
    #[case::rejected("REJECTED", Status::Rejected)]
    #[case::accepted_on_l2("ACCEPTED_ON_L2", Status::Pending)]
    #[case::accepted_on_l1("ACCEPTED_ON_L1", Status::AcceptedOnchain)]
    fn finality_status(#[case] finality: &str, #[case] expected: Status) {
        let status = serde_json::from_value::<TransactionStatus>(
            json!({"finality_status": finality, "execution_status": "SUCCEEDED"}),
        )
        .unwrap();
        assert_eq!(status.status(), expected);
    }

    #[test]
    fn sync_status() {
        let not_syncing = serde_json::from_str::<SyncStatus>("false").unwrap();
        assert_eq!(not_syncing, SyncStatus::NotSyncing);

        let syncing = serde_json::from_str::<SyncStatus>(
            r#"{
                "starting_block_hash": "0x1",
                "starting_block_num": 1,
                "current_block_hash": "0x2",
                "current_block_num": 2,
                "highest_block_hash": "0x3",
                "highest_block_num": 3
            }"#,
        )
        .unwrap();
        let SyncStatus::Syncing(progress) = syncing else {
            panic!("expected sync progress");
        };
        assert_eq!(progress.highest_block_num, BlockNumber::new_or_panic(3));

        serde_json::from_str::<SyncStatus>("true").unwrap_err();
    }
}
