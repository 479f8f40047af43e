//! Conversions between user supplied integers and their exact big integer
//! and wire representations.
//!
//! Values may be given as native integers, decimal strings, `0x` prefixed
//! hex strings or [BigUint]s. Nothing here passes through a floating point
//! type, so any value round trips exactly.
use courier_common::Felt;
use num_bigint::BigUint;
use num_traits::Zero;

/// An integer as supplied by a caller, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumericLiteral {
    Native(i128),
    Text(String),
    Big(BigUint),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid numeric literal {literal:?}: {reason}")]
pub struct InvalidNumericLiteral {
    pub literal: String,
    pub reason: &'static str,
}

impl InvalidNumericLiteral {
    fn new(literal: impl ToString, reason: &'static str) -> Self {
        Self {
            literal: literal.to_string(),
            reason,
        }
    }
}

macro_rules! from_native {
    ($($int:ty),+ $(,)?) => {
        $(
            impl From<$int> for NumericLiteral {
                fn from(value: $int) -> Self {
                    Self::Native(i128::from(value))
                }
            }
        )+
    };
}

from_native!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<usize> for NumericLiteral {
    fn from(value: usize) -> Self {
        Self::Big(BigUint::from(value))
    }
}

impl From<u128> for NumericLiteral {
    fn from(value: u128) -> Self {
        Self::Big(BigUint::from(value))
    }
}

impl From<&str> for NumericLiteral {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for NumericLiteral {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<BigUint> for NumericLiteral {
    fn from(value: BigUint) -> Self {
        Self::Big(value)
    }
}

impl From<Felt> for NumericLiteral {
    fn from(value: Felt) -> Self {
        Self::Big(value.into())
    }
}

impl std::fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Big(value) => write!(f, "{value}"),
        }
    }
}

impl NumericLiteral {
    pub fn to_big_int(&self) -> Result<BigUint, InvalidNumericLiteral> {
        to_big_int(self)
    }

    pub fn to_felt(&self) -> Result<Felt, InvalidNumericLiteral> {
        to_felt(self)
    }
}

/// Interprets `value` as an unsigned integer.
///
/// Text must be either all decimal digits or `0x` followed by at least one
/// hex digit. Signs, whitespace, fractions and exponents are rejected.
pub fn to_big_int(value: &NumericLiteral) -> Result<BigUint, InvalidNumericLiteral> {
    match value {
        NumericLiteral::Native(native) if *native < 0 => {
            Err(InvalidNumericLiteral::new(native, "negative value"))
        }
        NumericLiteral::Native(native) => Ok(BigUint::from(native.unsigned_abs())),
        NumericLiteral::Big(big) => Ok(big.clone()),
        NumericLiteral::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Result<BigUint, InvalidNumericLiteral> {
    let (digits, radix) = match text.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };

    if digits.is_empty() {
        return Err(InvalidNumericLiteral::new(text, "no digits"));
    }

    let valid = match radix {
        16 => digits.bytes().all(|b| b.is_ascii_hexdigit()),
        _ => digits.bytes().all(|b| b.is_ascii_digit()),
    };
    if !valid {
        return Err(InvalidNumericLiteral::new(
            text,
            "expected decimal digits or a 0x prefixed hex string",
        ));
    }

    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| InvalidNumericLiteral::new(text, "not an unsigned integer"))
}

/// Lower-case, `0x` prefixed, without leading zeros. Zero is `0x0`.
pub fn to_hex(value: &BigUint) -> String {
    if value.is_zero() {
        return "0x0".to_owned();
    }
    format!("{value:#x}")
}

/// Interprets `value` as a field element, rejecting values at or above the
/// field prime.
pub fn to_felt(value: &NumericLiteral) -> Result<Felt, InvalidNumericLiteral> {
    let big = to_big_int(value)?;
    Felt::try_from(&big).map_err(|_| InvalidNumericLiteral::new(value, "exceeds the field prime"))
}

/// Normalizes a sequence of literals into field element newtypes, keeping
/// their order.
pub fn to_felts<T: From<Felt>>(values: &[NumericLiteral]) -> Result<Vec<T>, InvalidNumericLiteral> {
    values.iter().map(|v| to_felt(v).map(T::from)).collect()
}

impl serde::Serialize for NumericLiteral {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Accepts JSON strings and JSON integers. Integers outside the 64 bit range
/// are accepted only when they were parsed exactly; floats are rejected.
impl<'de> serde::Deserialize<'de> for NumericLiteral {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde_json::Value;

        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    Ok(Self::Native(value.into()))
                } else if let Some(value) = number.as_i64() {
                    Ok(Self::Native(value.into()))
                } else {
                    let text = number.to_string();
                    let big = BigUint::parse_bytes(text.as_bytes(), 10).ok_or_else(|| {
                        D::Error::custom(format!("{text} is not an exact unsigned integer"))
                    })?;
                    Ok(Self::Big(big))
                }
            }
            other => Err(D::Error::custom(format!(
                "expected an integer or a numeric string, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions_sorted::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::decimal("1234", 1234u64)]
    #[case::leading_zeros("000042", 42u64)]
    #[case::hex("0x4d2", 1234u64)]
    #[case::upper_case_hex("0xABC", 0xabcu64)]
    #[case::zero("0", 0u64)]
    #[case::hex_zero("0x0", 0u64)]
    fn accepted_text(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(
            to_big_int(&input.into()).unwrap(),
            BigUint::from(expected)
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::bare_prefix("0x")]
    #[case::negative("-1")]
    #[case::plus_sign("+1")]
    #[case::fraction("1.5")]
    #[case::exponent("1e3")]
    #[case::whitespace(" 12")]
    #[case::bad_hex_digit("0xg1")]
    #[case::hex_without_prefix("ff")]
    #[case::upper_case_prefix("0X1")]
    fn rejected_text(#[case] input: &str) {
        assert_matches!(to_big_int(&input.into()), Err(InvalidNumericLiteral { .. }));
    }

    #[test]
    fn negative_native_is_rejected() {
        let error = to_big_int(&(-5i64).into()).unwrap_err();
        assert_eq!(error.reason, "negative value");
    }

    #[test]
    fn values_beyond_u128_keep_full_precision() {
        let text = "3618502788666131213697322783095070105623107215331596699973092056135872020480";
        let big = to_big_int(&text.into()).unwrap();
        assert_eq!(big.to_string(), text);
        assert_eq!(
            to_hex(&big),
            "0x800000000000011000000000000000000000000000000000000000000000000"
        );
        assert_eq!(to_felt(&text.into()).unwrap(), Felt::MAX);
    }

    #[test]
    fn felt_range_is_enforced() {
        let prime = "0x800000000000011000000000000000000000000000000000000000000000001";
        let error = to_felt(&prime.into()).unwrap_err();
        assert_eq!(error.reason, "exceeds the field prime");
    }

    #[test]
    fn to_hex_is_canonical() {
        assert_eq!(to_hex(&BigUint::from(0u32)), "0x0");
        assert_eq!(to_hex(&BigUint::from(0xABCu32)), "0xabc");
        assert_eq!(to_hex(&to_big_int(&"0x000f".into()).unwrap()), "0xf");
    }

    mod deserialize {
        use pretty_assertions_sorted::assert_eq;

        use super::*;

        #[test]
        fn string_and_integer() {
            let literals: Vec<NumericLiteral> =
                serde_json::from_str(r#"["0x10", "16", 16]"#).unwrap();
            let values = literals
                .iter()
                .map(|l| to_big_int(l).unwrap())
                .collect::<Vec<_>>();
            assert_eq!(values, vec![BigUint::from(16u32); 3]);
        }

        #[test]
        fn large_integer_is_exact() {
            let literal: NumericLiteral =
                serde_json::from_str("123456789012345678901234567890").unwrap();
            assert_eq!(literal.to_string(), "123456789012345678901234567890");
        }

        #[test]
        fn float_is_rejected() {
            serde_json::from_str::<NumericLiteral>("1.5").unwrap_err();
        }
    }

    mod round_trip {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn hex_round_trip_over_the_felt_range(mut bytes in any::<[u8; 32]>()) {
                bytes[0] &= 0x0f;
                let Ok(felt) = Felt::from_be_bytes(bytes) else {
                    return Ok(());
                };
                let n = BigUint::from(felt);
                let hex = to_hex(&n);
                prop_assert_eq!(to_big_int(&hex.as_str().into()).unwrap(), n.clone());
                prop_assert_eq!(to_felt(&hex.into()).unwrap(), felt);
            }

            #[test]
            fn decimal_round_trip(n in any::<u128>()) {
                let decimal = n.to_string();
                prop_assert_eq!(to_big_int(&decimal.into()).unwrap(), BigUint::from(n));
            }
        }
    }
}
