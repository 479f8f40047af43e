//! Starknet specific serialization utilities.
//!
//! - [numeric] converts user supplied integers into exact big integers and
//!   canonical hex.
//! - [json] is the one place outgoing payloads are turned into JSON.
//! - [HexFelt], [DecimalFelt] and [HexOrDecimalFelt] are [serde_with]
//!   adapters for felt newtypes.
mod hex;
pub mod json;
mod newtype;
pub mod numeric;

pub use hex::{DecimalFelt, HexFelt, HexOrDecimalFelt};
pub use json::SerializationError;
pub use newtype::NewType;
pub use numeric::{to_big_int, to_felt, to_hex, InvalidNumericLiteral, NumericLiteral};
