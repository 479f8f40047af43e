use std::borrow::Cow;

use num_bigint::BigUint;
use rand::Rng;

/// The Starknet field element.
///
/// An unsigned integer strictly below the field prime
/// `P = 2^251 + 17 * 2^192 + 1`, stored as big-endian bytes. Every value on
/// the wire (addresses, hashes, calldata, signatures) is a [Felt].
#[derive(Clone, Copy, Default, PartialEq, Hash, Eq, PartialOrd, Ord)]
pub struct Felt([u8; 32]);

/// The field prime in big-endian bytes.
const MODULUS: [u8; 32] = [
    8, 0, 0, 0, 0, 0, 0, 17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
];

impl std::fmt::Debug for Felt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Felt({self})")
    }
}

/// Canonical form: `0x` prefixed lower-case hex without leading zeros.
impl std::fmt::Display for Felt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex_str())
    }
}

/// Zero padded to the full 64 digits, without prefix.
impl std::fmt::LowerHex for Felt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.iter().try_for_each(|&b| write!(f, "{b:02x}"))
    }
}

/// Error returned by [Felt::from_be_bytes] indicating that the field prime
/// was reached or exceeded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
#[error("The felt maximum value was exceeded.")]
pub struct OverflowError;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum HexParseError {
    #[error("Invalid nibble found: 0x{0:x}")]
    InvalidNibble(u8),
    #[error("More than {max} digits found: {actual}")]
    InvalidLength { max: usize, actual: usize },
    #[error("The felt maximum value was exceeded.")]
    Overflow,
}

impl From<OverflowError> for HexParseError {
    fn from(_: OverflowError) -> Self {
        Self::Overflow
    }
}

impl Felt {
    pub const ZERO: Felt = Felt([0u8; 32]);
    pub const ONE: Felt = Felt::from_u64(1);
    /// `P - 1`, the largest representable value.
    pub const MAX: Felt = {
        let mut bytes = MODULUS;
        bytes[31] -= 1;
        Felt(bytes)
    };

    pub fn is_zero(&self) -> bool {
        self == &Felt::ZERO
    }

    pub const fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }

    pub const fn as_be_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Creates a [Felt] from big-endian bytes.
    ///
    /// Returns [OverflowError] if not less than the field modulus.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Result<Self, OverflowError> {
        let mut i = 0;
        while i < 32 {
            if bytes[i] < MODULUS[i] {
                return Ok(Felt(bytes));
            }
            if bytes[i] > MODULUS[i] {
                return Err(OverflowError);
            }
            i += 1;
        }
        // Equal to the modulus.
        Err(OverflowError)
    }

    /// Same as [Felt::from_be_bytes] for slices of at most 32 bytes.
    pub const fn from_be_slice(bytes: &[u8]) -> Result<Self, OverflowError> {
        if bytes.len() > 32 {
            return Err(OverflowError);
        }

        let mut buf = [0u8; 32];
        let offset = 32 - bytes.len();
        let mut i = 0;
        while i < bytes.len() {
            buf[offset + i] = bytes[i];
            i += 1;
        }

        Felt::from_be_bytes(buf)
    }

    pub const fn from_u64(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        let mut buf = [0u8; 32];
        let mut i = 0;
        while i < 8 {
            buf[24 + i] = bytes[i];
            i += 1;
        }
        Felt(buf)
    }

    pub const fn from_u128(value: u128) -> Self {
        let bytes = value.to_be_bytes();
        let mut buf = [0u8; 32];
        let mut i = 0;
        while i < 16 {
            buf[16 + i] = bytes[i];
            i += 1;
        }
        Felt(buf)
    }

    /// Returns `true` if the value is larger than `2^251 - 1`.
    ///
    /// Contract and storage addresses are restricted to 251 bits.
    pub const fn has_more_than_251_bits(&self) -> bool {
        self.0[0] & 0b1111_1000 > 0
    }

    /// Samples a value uniformly from `[0, P)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // 252 bits, P is a little above 2^251 so roughly every second draw is kept.
            bytes[0] &= 0x0f;
            if let Ok(felt) = Felt::from_be_bytes(bytes) {
                return felt;
            }
        }
    }

    /// Parses a hex string into a [Felt].
    ///
    /// Supports both upper and lower case digits, as well as an optional "0x"
    /// prefix.
    pub const fn from_hex_str(hex_str: &str) -> Result<Self, HexParseError> {
        const fn nibble(digit: u8) -> Result<u8, HexParseError> {
            match digit {
                b'0'..=b'9' => Ok(digit - b'0'),
                b'A'..=b'F' => Ok(digit - b'A' + 10),
                b'a'..=b'f' => Ok(digit - b'a' + 10),
                other => Err(HexParseError::InvalidNibble(other)),
            }
        }

        let bytes = hex_str.as_bytes();
        let start = if bytes.len() >= 2 && bytes[0] == b'0' && bytes[1] == b'x' {
            2
        } else {
            0
        };
        let digits = bytes.len() - start;

        if digits > 64 {
            return Err(HexParseError::InvalidLength {
                max: 64,
                actual: digits,
            });
        }

        let mut buf = [0u8; 32];
        // Walk the digits from the least significant end.
        let mut i = 0;
        while i < digits {
            let value = match nibble(bytes[bytes.len() - 1 - i]) {
                Ok(value) => value,
                Err(e) => return Err(e),
            };
            let byte = 31 - i / 2;
            buf[byte] |= if i % 2 == 0 { value } else { value << 4 };
            i += 1;
        }

        match Felt::from_be_bytes(buf) {
            Ok(felt) => Ok(felt),
            Err(OverflowError) => Err(HexParseError::Overflow),
        }
    }

    /// Produces the canonical "0x" prefixed, lower-case hex string without
    /// leading zeros.
    pub fn to_hex_str(&self) -> Cow<'static, str> {
        match self.0.iter().position(|&b| b != 0) {
            None => Cow::Borrowed("0x0"),
            Some(first) => {
                let tail: String = self.0[first + 1..]
                    .iter()
                    .map(|b| format!("{b:02x}"))
                    .collect();
                Cow::Owned(format!("0x{:x}{tail}", self.0[first]))
            }
        }
    }

    /// Base 10 representation, as used by the legacy gateway for calldata
    /// and storage keys.
    pub fn to_decimal_str(&self) -> String {
        BigUint::from_bytes_be(&self.0).to_str_radix(10)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u128> for Felt {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl From<Felt> for BigUint {
    fn from(felt: Felt) -> Self {
        BigUint::from_bytes_be(&felt.0)
    }
}

impl TryFrom<&BigUint> for Felt {
    type Error = OverflowError;

    fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
        Felt::from_be_slice(&value.to_bytes_be())
    }
}

impl serde::Serialize for Felt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_str())
    }
}

impl<'de> serde::Deserialize<'de> for Felt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct FeltVisitor;

        impl serde::de::Visitor<'_> for FeltVisitor {
            type Value = Felt;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a hex string of a field element")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Felt::from_hex_str(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(FeltVisitor)
    }
}
