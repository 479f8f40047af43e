//! Transactions as callers describe them, and their encoding into the
//! payloads accepted by `add_transaction`.
//!
//! Callers supply integers in whatever form they hold them, see
//! [NumericLiteral]. [encode] normalizes every value into a felt, fills in a
//! random salt where a deployment has none and compresses contract programs.
//! Each [Transaction] variant holds only the fields of its own kind, so a
//! payload can never carry a field belonging to another kind.
use std::str::FromStr;

use courier_common::prelude::*;
use courier_serde::numeric::to_felts;
use courier_serde::{to_felt, InvalidNumericLiteral, NumericLiteral, SerializationError};
use serde::Deserialize;
use serde_json::Value;

use crate::program::compress;
use crate::request::add_transaction::{self, AddTransaction, ContractDefinition};

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    InvalidNumericLiteral(#[from] InvalidNumericLiteral),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("unsupported transaction kind {0:?}")]
    UnsupportedTransactionKind(String),
}

/// A compiled contract, as produced by the compiler.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CompiledContract {
    pub program: Value,
    #[serde(default)]
    pub entry_points_by_type: Value,
    #[serde(default)]
    pub abi: Option<Value>,
}

impl CompiledContract {
    /// Swaps the program for its compressed form.
    pub fn to_definition(&self) -> Result<ContractDefinition, SerializationError> {
        Ok(ContractDefinition {
            program: compress(&self.program)?,
            entry_points_by_type: self.entry_points_by_type.clone(),
            abi: self.abi.clone(),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransactionKind {
    InvokeFunction,
    Declare,
    Deploy,
    DeployAccount,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::InvokeFunction => "INVOKE_FUNCTION",
            TransactionKind::Declare => "DECLARE",
            TransactionKind::Deploy => "DEPLOY",
            TransactionKind::DeployAccount => "DEPLOY_ACCOUNT",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVOKE_FUNCTION" => Ok(Self::InvokeFunction),
            "DECLARE" => Ok(Self::Declare),
            "DEPLOY" => Ok(Self::Deploy),
            "DEPLOY_ACCOUNT" => Ok(Self::DeployAccount),
            other => Err(EncodeError::UnsupportedTransactionKind(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InvokeFunction {
    pub contract_address: NumericLiteral,
    #[serde(default)]
    pub entry_point_selector: Option<NumericLiteral>,
    #[serde(default)]
    pub calldata: Vec<NumericLiteral>,
    #[serde(default)]
    pub signature: Vec<NumericLiteral>,
    #[serde(default)]
    pub max_fee: Option<NumericLiteral>,
    #[serde(default)]
    pub nonce: Option<NumericLiteral>,
    #[serde(default)]
    pub version: Option<NumericLiteral>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Declare {
    pub sender_address: NumericLiteral,
    pub contract_class: CompiledContract,
    #[serde(default)]
    pub signature: Vec<NumericLiteral>,
    #[serde(default)]
    pub max_fee: Option<NumericLiteral>,
    #[serde(default)]
    pub nonce: Option<NumericLiteral>,
    #[serde(default)]
    pub version: Option<NumericLiteral>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Deploy {
    pub contract_definition: CompiledContract,
    #[serde(default)]
    pub constructor_calldata: Vec<NumericLiteral>,
    /// A random salt is drawn when this is not set.
    #[serde(default)]
    pub contract_address_salt: Option<NumericLiteral>,
    #[serde(default)]
    pub version: Option<NumericLiteral>,
}

impl Deploy {
    pub fn new(
        contract: CompiledContract,
        constructor_calldata: Vec<NumericLiteral>,
        contract_address_salt: Option<NumericLiteral>,
    ) -> Self {
        Self {
            contract_definition: contract,
            constructor_calldata,
            contract_address_salt,
            version: None,
        }
    }
}

/// Account deployment. The account class is declared beforehand and is
/// referred to by its hash.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DeployAccount {
    pub class_hash: NumericLiteral,
    #[serde(default)]
    pub constructor_calldata: Vec<NumericLiteral>,
    /// A random salt is drawn when this is not set.
    #[serde(default)]
    pub contract_address_salt: Option<NumericLiteral>,
    #[serde(default)]
    pub signature: Vec<NumericLiteral>,
    #[serde(default)]
    pub max_fee: Option<NumericLiteral>,
    #[serde(default)]
    pub nonce: Option<NumericLiteral>,
    #[serde(default)]
    pub version: Option<NumericLiteral>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Transaction {
    InvokeFunction(InvokeFunction),
    Declare(Declare),
    Deploy(Deploy),
    DeployAccount(DeployAccount),
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::InvokeFunction(_) => TransactionKind::InvokeFunction,
            Transaction::Declare(_) => TransactionKind::Declare,
            Transaction::Deploy(_) => TransactionKind::Deploy,
            Transaction::DeployAccount(_) => TransactionKind::DeployAccount,
        }
    }
}

/// Reads a transaction from its JSON description, dispatching on `type`.
///
/// Fields that do not belong to the transaction's kind are ignored.
impl TryFrom<Value> for Transaction {
    type Error = EncodeError;

    fn try_from(mut value: Value) -> Result<Self, Self::Error> {
        let kind = match value.as_object_mut().and_then(|fields| fields.remove("type")) {
            Some(Value::String(kind)) => kind.parse::<TransactionKind>()?,
            Some(other) => return Err(EncodeError::UnsupportedTransactionKind(other.to_string())),
            None => return Err(EncodeError::UnsupportedTransactionKind(String::new())),
        };

        let parse_error = |e: serde_json::Error| EncodeError::from(SerializationError::from(e));

        Ok(match kind {
            TransactionKind::InvokeFunction => {
                Transaction::InvokeFunction(serde_json::from_value(value).map_err(parse_error)?)
            }
            TransactionKind::Declare => {
                Transaction::Declare(serde_json::from_value(value).map_err(parse_error)?)
            }
            TransactionKind::Deploy => {
                Transaction::Deploy(serde_json::from_value(value).map_err(parse_error)?)
            }
            TransactionKind::DeployAccount => {
                Transaction::DeployAccount(serde_json::from_value(value).map_err(parse_error)?)
            }
        })
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Transaction::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Encodes `tx` into its `add_transaction` payload, drawing missing salts
/// from the thread local generator.
pub fn encode(tx: &Transaction) -> Result<AddTransaction, EncodeError> {
    encode_with_rng(tx, &mut rand::thread_rng())
}

/// Same as [encode] with an explicit source of randomness for salts.
pub fn encode_with_rng<R: rand::Rng + ?Sized>(
    tx: &Transaction,
    rng: &mut R,
) -> Result<AddTransaction, EncodeError> {
    let encoded = match tx {
        Transaction::InvokeFunction(invoke) => {
            AddTransaction::Invoke(add_transaction::InvokeFunction {
                version: version(&invoke.version)?,
                max_fee: Fee(felt_or_zero(&invoke.max_fee)?),
                signature: to_felts(&invoke.signature)?,
                nonce: invoke
                    .nonce
                    .as_ref()
                    .map(|nonce| to_felt(nonce).map(TransactionNonce))
                    .transpose()?,
                contract_address: address(&invoke.contract_address)?,
                entry_point_selector: invoke
                    .entry_point_selector
                    .as_ref()
                    .map(|selector| to_felt(selector).map(EntryPoint))
                    .transpose()?,
                calldata: to_felts(&invoke.calldata)?,
            })
        }
        Transaction::Declare(declare) => AddTransaction::Declare(add_transaction::Declare {
            version: version(&declare.version)?,
            max_fee: Fee(felt_or_zero(&declare.max_fee)?),
            signature: to_felts(&declare.signature)?,
            nonce: TransactionNonce(felt_or_zero(&declare.nonce)?),
            sender_address: address(&declare.sender_address)?,
            contract_class: declare.contract_class.to_definition()?,
        }),
        Transaction::Deploy(deploy) => AddTransaction::Deploy(add_transaction::Deploy {
            version: version(&deploy.version)?,
            contract_address_salt: salt(&deploy.contract_address_salt, rng)?,
            contract_definition: deploy.contract_definition.to_definition()?,
            constructor_calldata: to_felts(&deploy.constructor_calldata)?,
        }),
        Transaction::DeployAccount(deploy) => {
            AddTransaction::DeployAccount(add_transaction::DeployAccount {
                version: version(&deploy.version)?,
                max_fee: Fee(felt_or_zero(&deploy.max_fee)?),
                signature: to_felts(&deploy.signature)?,
                nonce: TransactionNonce(felt_or_zero(&deploy.nonce)?),
                class_hash: ClassHash(to_felt(&deploy.class_hash)?),
                contract_address_salt: salt(&deploy.contract_address_salt, rng)?,
                constructor_calldata: to_felts(&deploy.constructor_calldata)?,
            })
        }
    };

    Ok(encoded)
}

fn felt_or_zero(value: &Option<NumericLiteral>) -> Result<Felt, InvalidNumericLiteral> {
    value.as_ref().map_or(Ok(Felt::ZERO), to_felt)
}

fn version(value: &Option<NumericLiteral>) -> Result<TransactionVersion, InvalidNumericLiteral> {
    felt_or_zero(value).map(TransactionVersion)
}

fn address(value: &NumericLiteral) -> Result<ContractAddress, InvalidNumericLiteral> {
    let felt = to_felt(value)?;
    ContractAddress::new(felt).ok_or_else(|| InvalidNumericLiteral {
        literal: value.to_string(),
        reason: "addresses are limited to 251 bits",
    })
}

fn salt<R: rand::Rng + ?Sized>(
    value: &Option<NumericLiteral>,
    rng: &mut R,
) -> Result<ContractAddressSalt, InvalidNumericLiteral> {
    match value {
        Some(salt) => to_felt(salt).map(ContractAddressSalt),
        None => Ok(ContractAddressSalt::random(rng)),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use courier_serde::to_hex;
    use pretty_assertions_sorted::assert_eq;
    use rand::SeedableRng;
    use serde_json::json;

    use super::*;

    fn contract() -> CompiledContract {
        serde_json::from_value(json!({
            "program": {
                "builtins": ["pedersen"],
                "data": ["0x40780017fff7fff", "0x1"],
                "main_scope": "__main__",
            },
            "entry_points_by_type": {
                "CONSTRUCTOR": [],
                "EXTERNAL": [{"selector": "0x362398bec32bc0ebb411203221a35a0301193a96f317ebe5e40be9f60d15320", "offset": "0x3a"}],
                "L1_HANDLER": [],
            },
            "abi": [],
        }))
        .unwrap()
    }

    fn encode_to_json(tx: &Transaction) -> Value {
        let encoded = encode_with_rng(tx, &mut rand::rngs::StdRng::seed_from_u64(0)).unwrap();
        serde_json::to_value(encoded).unwrap()
    }

    #[test]
    fn invoke_never_carries_deploy_fields() {
        let tx = Transaction::try_from(json!({
            "type": "INVOKE_FUNCTION",
            "contract_address": "0x1234",
            "entry_point_selector": "0x15d40a3d6ca2ac30f4031e42be28da9b056fef9bb7357ac5e85627ee876e5ad",
            "calldata": [1, "2", "0x3"],
            "signature": ["0x10", 17],
            "contract_address_salt": "0x99",
        }))
        .unwrap();

        let json = encode_to_json(&tx);
        assert_eq!(
            json,
            json!({
                "type": "INVOKE_FUNCTION",
                "version": "0x0",
                "max_fee": "0x0",
                "signature": ["0x10", "0x11"],
                "contract_address": "0x1234",
                "entry_point_selector": "0x15d40a3d6ca2ac30f4031e42be28da9b056fef9bb7357ac5e85627ee876e5ad",
                "calldata": ["1", "2", "3"],
            })
        );
    }

    #[test]
    fn empty_signature_is_emitted() {
        let tx = Transaction::InvokeFunction(InvokeFunction {
            contract_address: "0x1".into(),
            entry_point_selector: None,
            calldata: vec![],
            signature: vec![],
            max_fee: None,
            nonce: Some(3u64.into()),
            version: Some(1u64.into()),
        });

        let json = encode_to_json(&tx);
        assert_eq!(json["signature"], json!([]));
        assert_eq!(json["nonce"], json!("0x3"));
        assert_eq!(json["version"], json!("0x1"));
        assert!(json.get("entry_point_selector").is_none());
    }

    #[test]
    fn deploy_never_carries_a_signature() {
        let tx = Transaction::try_from(json!({
            "type": "DEPLOY",
            "contract_definition": {
                "program": contract().program,
                "entry_points_by_type": {},
            },
            "constructor_calldata": [],
            "signature": ["0x1"],
        }))
        .unwrap();

        let json = encode_to_json(&tx);
        assert!(json.get("signature").is_none());
        assert!(json.get("calldata").is_none());
        assert!(json.get("contract_address_salt").is_some());
    }

    #[test]
    fn deploy_with_fixed_salt() {
        let contract = contract();
        let salt = NumericLiteral::from("123456789012345678901234567890");
        let tx = Transaction::Deploy(Deploy::new(
            contract.clone(),
            vec![5u64.into()],
            Some(salt.clone()),
        ));

        let json = encode_to_json(&tx);
        assert_eq!(
            json["contract_address_salt"],
            json!(to_hex(&salt.to_big_int().unwrap()))
        );
        assert_eq!(
            json["contract_definition"]["program"],
            json!(compress(&contract.program).unwrap())
        );
        assert_eq!(
            json["contract_definition"]["entry_points_by_type"],
            contract.entry_points_by_type
        );
        assert_eq!(json["constructor_calldata"], json!(["5"]));
    }

    #[test]
    fn deploy_without_salt_draws_one() {
        let tx = Transaction::Deploy(Deploy::new(contract(), vec![], None));

        let first = encode_with_rng(&tx, &mut rand::rngs::StdRng::seed_from_u64(1)).unwrap();
        let second = encode_with_rng(&tx, &mut rand::rngs::StdRng::seed_from_u64(2)).unwrap();

        let (AddTransaction::Deploy(first), AddTransaction::Deploy(second)) = (first, second) else {
            panic!("Expected deploy payloads");
        };
        assert_ne!(first.contract_address_salt, second.contract_address_salt);
        assert_ne!(first.contract_address_salt, ContractAddressSalt::ZERO);
    }

    #[test]
    fn deploy_account_shape() {
        let tx = Transaction::try_from(json!({
            "type": "DEPLOY_ACCOUNT",
            "class_hash": "0x25ec026985a3bf9d0cc1fe17326b245dfdc3ff89b8fde106542a3ea56c5a918",
            "contract_address_salt": 7,
            "constructor_calldata": ["0x1"],
            "signature": [],
            "max_fee": "1000",
            "nonce": 0,
            "version": 1,
        }))
        .unwrap();

        let json = encode_to_json(&tx);
        assert_eq!(
            json,
            json!({
                "type": "DEPLOY_ACCOUNT",
                "version": "0x1",
                "max_fee": "0x3e8",
                "signature": [],
                "nonce": "0x0",
                "class_hash": "0x25ec026985a3bf9d0cc1fe17326b245dfdc3ff89b8fde106542a3ea56c5a918",
                "contract_address_salt": "0x7",
                "constructor_calldata": ["1"],
            })
        );
    }

    #[test]
    fn declare_compresses_the_class() {
        let contract = contract();
        let tx = Transaction::Declare(Declare {
            sender_address: "0x1".into(),
            contract_class: contract.clone(),
            signature: vec!["0x2".into()],
            max_fee: None,
            nonce: Some(0u64.into()),
            version: Some(1u64.into()),
        });

        let json = encode_to_json(&tx);
        assert_eq!(json["type"], json!("DECLARE"));
        assert_eq!(
            json["contract_class"]["program"],
            json!(compress(&contract.program).unwrap())
        );
        assert!(json.get("contract_address_salt").is_none());
    }

    #[test]
    fn unsupported_kind() {
        assert_matches!(
            Transaction::try_from(json!({"type": "L1_HANDLER"})),
            Err(EncodeError::UnsupportedTransactionKind(kind)) => assert_eq!(kind, "L1_HANDLER")
        );
        assert_matches!(
            Transaction::try_from(json!({"contract_address": "0x1"})),
            Err(EncodeError::UnsupportedTransactionKind(_))
        );
    }

    #[test]
    fn invalid_literals_are_reported() {
        let tx = Transaction::InvokeFunction(InvokeFunction {
            contract_address: "0x1".into(),
            entry_point_selector: None,
            calldata: vec!["12abc".into()],
            signature: vec![],
            max_fee: None,
            nonce: None,
            version: None,
        });
        assert_matches!(encode(&tx), Err(EncodeError::InvalidNumericLiteral(_)));

        let tx = Transaction::InvokeFunction(InvokeFunction {
            contract_address: Felt::MAX.into(),
            entry_point_selector: None,
            calldata: vec![],
            signature: vec![],
            max_fee: None,
            nonce: None,
            version: None,
        });
        assert_matches!(
            encode(&tx),
            Err(EncodeError::InvalidNumericLiteral(e)) => assert_eq!(e.reason, "addresses are limited to 251 bits")
        );
    }

    #[test]
    fn encoded_payload_is_safe_for_the_wire() {
        let tx = Transaction::Deploy(Deploy::new(
            contract(),
            vec![u128::MAX.into()],
            Some(Felt::MAX.into()),
        ));
        let encoded = encode(&tx).unwrap();
        courier_serde::json::to_wire_json(&encoded).unwrap();
    }
}
