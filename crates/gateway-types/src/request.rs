//! Structures used for serializing requests to the gateway REST API.
use courier_common::prelude::*;
use courier_serde::{DecimalFelt, HexFelt};
use serde_with::serde_as;

/// Body of `call_contract`.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Call {
    pub contract_address: ContractAddress,
    #[serde_as(as = "HexFelt")]
    pub entry_point_selector: EntryPoint,
    #[serde_as(as = "Vec<DecimalFelt>")]
    pub calldata: Vec<CallParam>,
    #[serde_as(as = "Vec<HexFelt>")]
    pub signature: Vec<TransactionSignatureElem>,
}

pub mod add_transaction {
    use courier_common::prelude::*;
    use courier_serde::{DecimalFelt, HexFelt};
    use serde_with::serde_as;

    /// Definition of a contract as the gateway accepts it.
    ///
    /// Entry points and ABI travel as they were compiled. The program is
    /// replaced by its compressed form, see [crate::program::compress].
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    pub struct ContractDefinition {
        // gzip + base64 encoded JSON of the compiled program
        pub program: String,
        pub entry_points_by_type: serde_json::Value,
        pub abi: Option<serde_json::Value>,
    }

    /// Contract deployment transaction details.
    #[serde_as]
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct Deploy {
        #[serde_as(as = "HexFelt")]
        pub version: TransactionVersion,

        #[serde_as(as = "HexFelt")]
        pub contract_address_salt: ContractAddressSalt,
        pub contract_definition: ContractDefinition,
        #[serde_as(as = "Vec<DecimalFelt>")]
        pub constructor_calldata: Vec<ConstructorParam>,
    }

    /// Account deployment transaction details.
    #[serde_as]
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct DeployAccount {
        #[serde_as(as = "HexFelt")]
        pub version: TransactionVersion,

        #[serde_as(as = "HexFelt")]
        pub max_fee: Fee,
        #[serde_as(as = "Vec<HexFelt>")]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde_as(as = "HexFelt")]
        pub nonce: TransactionNonce,

        #[serde_as(as = "HexFelt")]
        pub class_hash: ClassHash,
        #[serde_as(as = "HexFelt")]
        pub contract_address_salt: ContractAddressSalt,
        #[serde_as(as = "Vec<DecimalFelt>")]
        pub constructor_calldata: Vec<ConstructorParam>,
    }

    /// Invoke contract transaction details.
    #[serde_as]
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct InvokeFunction {
        #[serde_as(as = "HexFelt")]
        pub version: TransactionVersion,

        #[serde_as(as = "HexFelt")]
        pub max_fee: Fee,
        #[serde_as(as = "Vec<HexFelt>")]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde_as(as = "Option<HexFelt>")]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub nonce: Option<TransactionNonce>,

        pub contract_address: ContractAddress,
        #[serde_as(as = "Option<HexFelt>")]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub entry_point_selector: Option<EntryPoint>,
        #[serde_as(as = "Vec<DecimalFelt>")]
        pub calldata: Vec<CallParam>,
    }

    /// Declare transaction details.
    #[serde_as]
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct Declare {
        #[serde_as(as = "HexFelt")]
        pub version: TransactionVersion,

        #[serde_as(as = "HexFelt")]
        pub max_fee: Fee,
        #[serde_as(as = "Vec<HexFelt>")]
        pub signature: Vec<TransactionSignatureElem>,
        #[serde_as(as = "HexFelt")]
        pub nonce: TransactionNonce,

        pub sender_address: ContractAddress,
        pub contract_class: ContractDefinition,
    }

    /// Add transaction API operation.
    ///
    /// This adds the "type" attribute to the JSON request according to the
    /// kind of the transaction. Each variant carries only its own fields.
    #[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
    #[serde(tag = "type")]
    pub enum AddTransaction {
        #[serde(rename = "INVOKE_FUNCTION")]
        Invoke(InvokeFunction),
        #[serde(rename = "DEPLOY")]
        Deploy(Deploy),
        #[serde(rename = "DECLARE")]
        Declare(Declare),
        #[serde(rename = "DEPLOY_ACCOUNT")]
        DeployAccount(DeployAccount),
    }

    #[cfg(test)]
    mod test {
        use pretty_assertions_sorted::assert_eq;
        use serde_json::json;

        use super::*;

        #[test]
        fn invoke_wire_shape() {
            let tx = AddTransaction::Invoke(InvokeFunction {
                version: TransactionVersion::ONE,
                max_fee: fee!("0x2386f26fc10000"),
                signature: vec![
                    transaction_signature_elem!("0x1"),
                    transaction_signature_elem!("0xabc"),
                ],
                nonce: Some(transaction_nonce!("0x5")),
                contract_address: contract_address!("0x123"),
                entry_point_selector: None,
                calldata: vec![call_param!("0x10"), call_param!("0x0")],
            });

            let json = serde_json::to_value(&tx).unwrap();
            assert_eq!(
                json,
                json!({
                    "type": "INVOKE_FUNCTION",
                    "version": "0x1",
                    "max_fee": "0x2386f26fc10000",
                    "signature": ["0x1", "0xabc"],
                    "nonce": "0x5",
                    "contract_address": "0x123",
                    "calldata": ["16", "0"],
                })
            );
        }

        #[test]
        fn deploy_wire_shape() {
            let tx = AddTransaction::Deploy(Deploy {
                version: TransactionVersion::ZERO,
                contract_address_salt: contract_address_salt!("0xff"),
                contract_definition: ContractDefinition {
                    program: "H4sI".to_owned(),
                    entry_points_by_type: json!({"EXTERNAL": []}),
                    abi: None,
                },
                constructor_calldata: vec![constructor_param!("0xa")],
            });

            let json = serde_json::to_value(&tx).unwrap();
            assert_eq!(
                json,
                json!({
                    "type": "DEPLOY",
                    "version": "0x0",
                    "contract_address_salt": "0xff",
                    "contract_definition": {
                        "program": "H4sI",
                        "entry_points_by_type": {"EXTERNAL": []},
                        "abi": null,
                    },
                    "constructor_calldata": ["10"],
                })
            );
        }

        #[test]
        fn fields_of_other_kinds_are_refused() {
            let json = json!({
                "type": "INVOKE_FUNCTION",
                "version": "0x1",
                "max_fee": "0x0",
                "signature": [],
                "contract_address": "0x1",
                "calldata": [],
                "contract_address_salt": "0x1",
            });
            serde_json::from_value::<AddTransaction>(json).unwrap_err();
        }
    }
}
