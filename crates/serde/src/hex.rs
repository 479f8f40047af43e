//! [serde_with] adapters for felt newtypes.
//!
//! ```ignore
//! #[serde_with::serde_as]
//! #[derive(serde::Serialize)]
//! struct Call {
//!     #[serde_as(as = "Vec<DecimalFelt>")]
//!     calldata: Vec<CallParam>,
//!     #[serde_as(as = "Vec<HexFelt>")]
//!     signature: Vec<TransactionSignatureElem>,
//! }
//! ```
use courier_common::Felt;
use num_bigint::BigUint;

use crate::newtype::NewType;

/// `0x` prefixed hex string. The prefix is mandatory when deserializing.
pub struct HexFelt;

/// Base 10 string, as the legacy gateway expects calldata.
pub struct DecimalFelt;

/// Reads either form: `0x` prefixed hex or a decimal string. Writes hex.
///
/// Older gateway versions reply with decimal calldata, newer ones with hex.
pub struct HexOrDecimalFelt;

impl<T> serde_with::SerializeAs<T> for HexFelt
where
    T: NewType<Felt> + Copy,
{
    fn serialize_as<S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&value.into_inner().to_hex_str())
    }
}

impl<'de, T> serde_with::DeserializeAs<'de, T> for HexFelt
where
    T: NewType<Felt>,
{
    fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HexVisitor;

        impl serde::de::Visitor<'_> for HexVisitor {
            type Value = Felt;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("'0x' prefix followed by a hex string of up to 64 digits")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v.as_bytes() {
                    [b'0', b'x', ..] => Felt::from_hex_str(v).map_err(E::custom),
                    _missing_prefix => Err(E::custom("Missing '0x' prefix")),
                }
            }
        }

        deserializer.deserialize_str(HexVisitor).map(T::from_inner)
    }
}

impl<T> serde_with::SerializeAs<T> for DecimalFelt
where
    T: NewType<Felt> + Copy,
{
    fn serialize_as<S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&value.into_inner().to_decimal_str())
    }
}

impl<'de, T> serde_with::DeserializeAs<'de, T> for DecimalFelt
where
    T: NewType<Felt>,
{
    fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl serde::de::Visitor<'_> for DecimalVisitor {
            type Value = Felt;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a decimal string of a field element")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                parse_decimal(v)
            }
        }

        deserializer.deserialize_str(DecimalVisitor).map(T::from_inner)
    }
}

fn parse_decimal<E: serde::de::Error>(v: &str) -> Result<Felt, E> {
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return Err(E::custom(format!("{v:?} is not a decimal string")));
    }
    let big = BigUint::parse_bytes(v.as_bytes(), 10)
        .ok_or_else(|| E::custom(format!("{v:?} is not a decimal string")))?;
    Felt::try_from(&big).map_err(E::custom)
}

impl<T> serde_with::SerializeAs<T> for HexOrDecimalFelt
where
    T: NewType<Felt> + Copy,
{
    fn serialize_as<S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        <HexFelt as serde_with::SerializeAs<T>>::serialize_as(value, serializer)
    }
}

impl<'de, T> serde_with::DeserializeAs<'de, T> for HexOrDecimalFelt
where
    T: NewType<Felt>,
{
    fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AnyRadixVisitor;

        impl serde::de::Visitor<'_> for AnyRadixVisitor {
            type Value = Felt;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a hex or decimal string of a field element")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v.strip_prefix("0x") {
                    Some(_) => Felt::from_hex_str(v).map_err(E::custom),
                    None => parse_decimal(v),
                }
            }
        }

        deserializer.deserialize_str(AnyRadixVisitor).map(T::from_inner)
    }
}
