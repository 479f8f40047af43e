//! Transport encoding of contract programs.
//!
//! The gateway receives a program as the base64 encoding of the gzipped JSON
//! text of the program. The JSON is written with object keys in sorted order
//! so that the output depends only on the structure of the program.
use std::io::Read;

use courier_serde::json::ensure_integral;
use courier_serde::SerializationError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Value;

/// Compresses `program` into its transport form.
///
/// Fails if the program holds non-integral numbers. Integers of any size are
/// carried exactly.
pub fn compress(program: &Value) -> Result<String, SerializationError> {
    ensure_integral(program)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, &Canonical(program))?;
    let gzipped = encoder.finish()?;

    Ok(base64::encode(gzipped))
}

/// Reverses [compress].
pub fn decompress(encoded: &str) -> Result<Value, SerializationError> {
    let gzipped = base64::decode(encoded)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut json = Vec::new();
    GzDecoder::new(gzipped.as_slice()).read_to_end(&mut json)?;

    Ok(serde_json::from_slice(&json)?)
}

/// Serializes a [Value] with its object keys in sorted order, independent of
/// the `preserve_order` feature of `serde_json`.
struct Canonical<'a>(&'a Value);

impl serde::Serialize for Canonical<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.0 {
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Canonical(item))?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut keys = fields.iter().collect::<Vec<_>>();
                keys.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

                let mut map = serializer.serialize_map(Some(keys.len()))?;
                for (key, value) in keys {
                    map.serialize_entry(key, &Canonical(value))?;
                }
                map.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}
