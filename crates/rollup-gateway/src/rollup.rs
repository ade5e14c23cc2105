//! Rollup status types and the schema validator.
//!
//! `rollup_getInfo` payloads cross a trust boundary: the validator is the
//! only way an untyped [`RawPayload`] becomes a [`RollupInfo`]. Validation is
//! structural and fails on the first violation with the offending field path;
//! it never returns a best-effort partial object.

use std::fmt;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de,
};
use serde_json::Value;

use crate::{
    error::{
        GatewayError,
        Result,
    },
    transport::RawPayload,
};

/// Integer-like rollup counter.
///
/// The upstream emits these either as native JSON numbers or as decimal
/// strings once they outgrow the 53-bit safe range, so both forms are
/// accepted. Stored as `u128`; serialized back as a number when it fits in
/// `u64`, as a decimal string otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RollupNumber(pub u128);

impl RollupNumber {
    pub fn value(self) -> u128 {
        self.0
    }
}

impl From<u64> for RollupNumber {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl fmt::Display for RollupNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for RollupNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match u64::try_from(self.0) {
            Ok(small) => serializer.serialize_u64(small),
            Err(_) => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for RollupNumber {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct NumberVisitor;

        impl de::Visitor<'_> for NumberVisitor {
            type Value = RollupNumber;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(RollupNumber(u128::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                u128::try_from(v)
                    .map(RollupNumber)
                    .map_err(|_| E::custom("negative values are not valid rollup counters"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                v.parse::<u128>()
                    .map(RollupNumber)
                    .map_err(|_| E::custom(format!("{v:?} is not a decimal integer")))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

/// L1 context the rollup is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthContext {
    pub block_number: RollupNumber,
    pub timestamp: RollupNumber,
}

/// Queue/index positions of the rollup itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupContext {
    pub queue_index: RollupNumber,
    pub index: RollupNumber,
    pub verified_index: RollupNumber,
}

/// Validated `rollup_getInfo` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupInfo {
    pub mode: String,
    pub syncing: bool,
    pub eth_context: EthContext,
    pub rollup_context: RollupContext,
}

/// Validate a raw upstream payload into a [`RollupInfo`].
///
/// Pure transform: no I/O, deterministic, fails on the first structural
/// violation encountered.
pub fn validate_rollup_info(raw: RawPayload) -> Result<RollupInfo> {
    let value = raw.into_value();
    let root = as_object(&value, "rollup info")?;

    let mode = match field(root, "mode")? {
        Value::String(mode) => mode.clone(),
        other => return Err(type_mismatch("mode", "a string", other)),
    };
    let syncing = match field(root, "syncing")? {
        Value::Bool(syncing) => *syncing,
        other => return Err(type_mismatch("syncing", "a boolean", other)),
    };

    let eth = as_object(field(root, "ethContext")?, "ethContext")?;
    let eth_context = EthContext {
        block_number: number_like(field_at(eth, "ethContext", "blockNumber")?, "ethContext.blockNumber")?,
        timestamp: number_like(field_at(eth, "ethContext", "timestamp")?, "ethContext.timestamp")?,
    };

    let rollup = as_object(field(root, "rollupContext")?, "rollupContext")?;
    let rollup_context = RollupContext {
        queue_index: number_like(
            field_at(rollup, "rollupContext", "queueIndex")?,
            "rollupContext.queueIndex",
        )?,
        index: number_like(field_at(rollup, "rollupContext", "index")?, "rollupContext.index")?,
        verified_index: number_like(
            field_at(rollup, "rollupContext", "verifiedIndex")?,
            "rollupContext.verifiedIndex",
        )?,
    };

    Ok(RollupInfo {
        mode,
        syncing,
        eth_context,
        rollup_context,
    })
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| type_mismatch(path, "an object", value))
}

fn field<'a>(object: &'a serde_json::Map<String, Value>, name: &str) -> Result<&'a Value> {
    object
        .get(name)
        .ok_or_else(|| GatewayError::Validation(format!("missing field `{name}`")))
}

fn field_at<'a>(
    object: &'a serde_json::Map<String, Value>,
    parent: &str,
    name: &str,
) -> Result<&'a Value> {
    object
        .get(name)
        .ok_or_else(|| GatewayError::Validation(format!("missing field `{parent}.{name}`")))
}

/// Accept a non-negative JSON number or a decimal string.
fn number_like(value: &Value, path: &str) -> Result<RollupNumber> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(RollupNumber::from)
            .ok_or_else(|| type_mismatch(path, "a non-negative integer", value)),
        Value::String(text) => text
            .parse::<u128>()
            .map(RollupNumber)
            .map_err(|_| type_mismatch(path, "a decimal integer string", value)),
        other => Err(type_mismatch(path, "a number or a decimal string", other)),
    }
}

fn type_mismatch(path: &str, expected: &str, got: &Value) -> GatewayError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    GatewayError::Validation(format!("field `{path}`: expected {expected}, got {got}"))
}
