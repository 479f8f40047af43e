//! Contains core types that are shared by the gateway and JSON-RPC crates.
//!
//! This includes many trivial wrappers around [Felt] which help by providing
//! additional type safety.
use serde::{Deserialize, Serialize};

pub mod consts;
pub mod felt;
mod macros;
pub mod test_utils;

pub use felt::{Felt, HexParseError, OverflowError};
pub use macros::safe_u64::MAX_SAFE_INTEGER;

pub mod prelude {
    pub use super::macro_prelude::*;
    pub use super::{
        BlockHash,
        BlockId,
        BlockNumber,
        CallParam,
        CallResultValue,
        CasmHash,
        ChainId,
        ClassHash,
        ConstructorParam,
        ContractAddress,
        ContractAddressSalt,
        EntryPoint,
        EventData,
        EventKey,
        Fee,
        Felt,
        StateRoot,
        StorageAddress,
        StorageValue,
        TransactionHash,
        TransactionNonce,
        TransactionSignatureElem,
        TransactionVersion,
    };
}

macros::felt_newtypes!(
    [
        BlockHash,
        CallParam,
        CallResultValue,
        CasmHash,
        ClassHash,
        ConstructorParam,
        ContractAddressSalt,
        EntryPoint,
        EventData,
        EventKey,
        Fee,
        StateRoot,
        StorageValue,
        TransactionHash,
        TransactionNonce,
        TransactionSignatureElem,
        TransactionVersion,
    ];
    [
        ContractAddress,
        StorageAddress,
    ]
);

/// Block height. Block numbers are sent as native JSON numbers, so they are
/// restricted to integers JSON consumers hold exactly.
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockNumber(u64);

macros::safe_u64::new_get_partialeq!(BlockNumber);
macros::safe_u64::serdes!(BlockNumber);
macros::fmt::thin_display!(BlockNumber);

impl BlockNumber {
    pub const GENESIS: BlockNumber = BlockNumber::new_or_panic(0);
}

impl From<BlockNumber> for Felt {
    fn from(x: BlockNumber) -> Self {
        Felt::from(x.0)
    }
}

/// A way of identifying a specific block.
///
/// Serializes in the JSON-RPC form: `"latest"`, `"pending"`,
/// `{"block_number": 1}` or `{"block_hash": "0x1"}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum BlockId {
    #[serde(rename = "block_number")]
    Number(BlockNumber),
    #[serde(rename = "block_hash")]
    Hash(BlockHash),
    #[serde(rename = "latest")]
    Latest,
    #[serde(rename = "pending")]
    Pending,
}

impl BlockId {
    pub fn is_pending(&self) -> bool {
        self == &BlockId::Pending
    }

    pub fn is_latest(&self) -> bool {
        self == &BlockId::Latest
    }
}

impl From<BlockNumber> for BlockId {
    fn from(number: BlockNumber) -> Self {
        Self::Number(number)
    }
}

impl From<BlockHash> for BlockId {
    fn from(hash: BlockHash) -> Self {
        Self::Hash(hash)
    }
}

impl TransactionVersion {
    pub const ONE: Self = Self(Felt::from_u64(1));
    pub const TWO: Self = Self(Felt::from_u64(2));
}

impl EntryPoint {
    /// Returns the selector of the function called `input`: its keccak
    /// digest truncated to 250 bits.
    ///
    /// See: <https://docs.starknet.io/architecture-and-concepts/smart-contracts/contract-abi/#function_selector>
    pub fn hashed(input: &[u8]) -> Self {
        use sha3::Digest;
        EntryPoint(truncated_keccak(<[u8; 32]>::from(
            sha3::Keccak256::digest(input),
        )))
    }

    /// The constructor [EntryPoint], defined as the truncated keccak of
    /// b"constructor".
    pub const CONSTRUCTOR: Self =
        entry_point!("0x028FFE4FF0F226A9107253E17A904099AA4F63A02A5621DE0576E5AA71BC5194");
}

impl ContractAddressSalt {
    /// A salt drawn uniformly from the whole field.
    pub fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Felt::random(rng))
    }
}

/// Starknet chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Mainnet,
    SepoliaTestnet,
    Custom,
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Mainnet => f.write_str("Mainnet"),
            Chain::SepoliaTestnet => f.write_str("Sepolia testnet"),
            Chain::Custom => f.write_str("Custom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainId(pub Felt);

impl ChainId {
    /// Convenience function for the constants because unwrap() is not const.
    const fn from_slice_unwrap(slice: &[u8]) -> Self {
        Self(match Felt::from_be_slice(slice) {
            Ok(v) => v,
            Err(_) => panic!("Bad value"),
        })
    }

    pub const MAINNET: Self = Self::from_slice_unwrap(b"SN_MAIN");
    pub const SEPOLIA_TESTNET: Self = Self::from_slice_unwrap(b"SN_SEPOLIA");
}

/// See:
/// <https://github.com/starkware-libs/cairo-lang/blob/64a7f6aed9757d3d8d6c28bd972df73272b0cb0a/src/starkware/starknet/public/abi.py#L21-L26>
pub fn truncated_keccak(mut plain: [u8; 32]) -> Felt {
    // Masking with 2^250 - 1 keeps the value below the modulus.
    plain[0] &= 0x03;
    Felt::from_be_bytes(plain).expect("cannot overflow: smaller than modulus")
}

#[cfg(test)]
mod tests {
    use pretty_assertions_sorted::assert_eq;

    use super::*;
    use crate::macro_prelude::*;

    #[test]
    fn constructor_entry_point() {
        assert_eq!(EntryPoint::CONSTRUCTOR, EntryPoint::hashed(b"constructor"));
    }

    #[test]
    fn transfer_selector() {
        assert_eq!(
            EntryPoint::hashed(b"transfer"),
            entry_point!("0x83afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e")
        );
    }

    #[test]
    fn block_number_is_bounded_by_the_json_safe_range() {
        assert_eq!(BlockNumber::new(MAX_SAFE_INTEGER).map(|n| n.get()), Some(MAX_SAFE_INTEGER));
        assert_eq!(BlockNumber::new(MAX_SAFE_INTEGER + 1), None);

        let too_large = format!("{}", MAX_SAFE_INTEGER + 1);
        serde_json::from_str::<BlockNumber>(&too_large).unwrap_err();
    }

    #[test]
    fn contract_address_is_limited_to_251_bits() {
        assert_eq!(ContractAddress::new(Felt::MAX), None);
        let json = format!(r#""{}""#, Felt::MAX);
        serde_json::from_str::<ContractAddress>(&json).unwrap_err();

        let address = serde_json::from_str::<ContractAddress>(r#""0x123""#).unwrap();
        assert_eq!(address, contract_address!("0x123"));
    }

    #[test]
    fn transaction_versions() {
        assert_eq!(TransactionVersion::ZERO, TransactionVersion::default());
        assert_eq!(TransactionVersion::ZERO.to_string(), "0x0");
        assert_eq!(TransactionVersion::ONE.to_string(), "0x1");
        assert_eq!(TransactionVersion::TWO, transaction_version!("0x2"));
    }

    mod block_id {
        use pretty_assertions_sorted::assert_eq;
        use serde_json::json;

        use super::*;

        #[test]
        fn serde() {
            let cases = [
                (BlockId::Latest, json!("latest")),
                (BlockId::Pending, json!("pending")),
                (
                    BlockId::Number(BlockNumber::new_or_panic(10)),
                    json!({"block_number": 10}),
                ),
                (
                    BlockId::Hash(block_hash!("0xabc")),
                    json!({"block_hash": "0xabc"}),
                ),
            ];

            for (id, expected) in cases {
                assert_eq!(serde_json::to_value(id).unwrap(), expected);
                assert_eq!(serde_json::from_value::<BlockId>(expected).unwrap(), id);
            }
        }
    }

    #[test]
    fn chain_ids() {
        assert_eq!(ChainId::MAINNET.0.to_hex_str(), "0x534e5f4d41494e");
        assert_eq!(ChainId::SEPOLIA_TESTNET.0.to_hex_str(), "0x534e5f5345504f4c4941");
    }
}
