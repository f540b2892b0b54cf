//! Serde adapters for `U256` values in human edited files.

use {
    primitive_types::U256,
    serde::{Deserialize, Deserializer, Serializer, de},
    serde_with::{DeserializeAs, SerializeAs},
    std::borrow::Cow,
};

/// Serializes a `U256` as a decimal string and deserializes it from either a
/// decimal string, a `0x` prefixed hex string or a plain integer.
pub struct HexOrDecimalU256;

impl SerializeAs<U256> for HexOrDecimalU256 {
    fn serialize_as<S>(source: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&source.to_string())
    }
}

impl<'de> DeserializeAs<'de, U256> for HexOrDecimalU256 {
    fn deserialize_as<D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<'a> {
            Integer(u64),
            #[serde(borrow)]
            String(Cow<'a, str>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Integer(value) => Ok(U256::from(value)),
            Raw::String(value) => parse(&value).map_err(de::Error::custom),
        }
    }
}

fn parse(value: &str) -> Result<U256, String> {
    let value = value.trim().replace('_', "");
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|err| err.to_string()),
        None => U256::from_dec_str(&value).map_err(|err| err.to_string()),
    };
    parsed.map_err(|err| format!("invalid U256 {value:?}: {err}"))
}
