//! Typed registry values and the persisted key record.

use crate::{KeyMaterial, ValueNames};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Format marker written alongside every generated key.
pub const KEY_FORMAT_VERSION: i32 = 2;

/// Ticks (100 ns intervals since 0001-01-01T00:00:00 UTC) at the Unix epoch.
const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// A typed value stored under a registry key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RegistryValue {
    #[serde(rename = "binary")]
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    #[serde(rename = "qword")]
    QWord(i64),
    #[serde(rename = "dword")]
    DWord(i32),
    #[serde(rename = "string")]
    String(String),
}

impl RegistryValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RegistryValue::Binary(_) => "binary",
            RegistryValue::QWord(_) => "qword",
            RegistryValue::DWord(_) => "dword",
            RegistryValue::String(_) => "string",
        }
    }
}

impl Zeroize for RegistryValue {
    fn zeroize(&mut self) {
        match self {
            RegistryValue::Binary(bytes) => bytes.zeroize(),
            RegistryValue::QWord(v) => v.zeroize(),
            RegistryValue::DWord(v) => v.zeroize(),
            RegistryValue::String(v) => v.zeroize(),
        }
    }
}

impl fmt::Debug for RegistryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryValue::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
            RegistryValue::QWord(v) => write!(f, "QWord({v})"),
            RegistryValue::DWord(v) => write!(f, "DWord({v})"),
            RegistryValue::String(v) => write!(f, "String({v:?})"),
        }
    }
}

/// The unit persisted per key location.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    key: KeyMaterial,
    created_at: DateTime<Utc>,
}

impl KeyRecord {
    pub fn new(key: KeyMaterial, created_at: DateTime<Utc>) -> Self {
        Self { key, created_at }
    }

    /// Values written to the backend in a single `set_values` call.
    ///
    /// The returned key bytes are a copy; callers wipe them once written.
    pub fn to_values(&self) -> Vec<(&'static str, RegistryValue)> {
        vec![
            (
                ValueNames::AUTO_GEN_KEY,
                RegistryValue::Binary(self.key.as_bytes().to_vec()),
            ),
            (
                ValueNames::AUTO_GEN_KEY_CREATION_TIME,
                RegistryValue::QWord(to_ticks(self.created_at)),
            ),
            (
                ValueNames::AUTO_GEN_KEY_FORMAT,
                RegistryValue::DWord(KEY_FORMAT_VERSION),
            ),
        ]
    }
}

/// Diagnostic view of a stored record. Never contains key bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecordInfo {
    /// Type of the stored `AutoGenKey` value.
    pub value_type: &'static str,
    /// Length of the stored key, when it is binary.
    pub key_length: Option<usize>,
    /// Whether the stored key would be accepted by `get_key`.
    pub valid: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub format: Option<i32>,
}

/// Convert a timestamp to 100 ns ticks since 0001-01-01 UTC.
pub fn to_ticks(at: DateTime<Utc>) -> i64 {
    TICKS_AT_UNIX_EPOCH
        + at.timestamp() * TICKS_PER_SECOND
        + i64::from(at.timestamp_subsec_nanos() / 100)
}

/// Convert ticks back to a timestamp. `None` when out of chrono's range.
pub fn from_ticks(ticks: i64) -> Option<DateTime<Utc>> {
    let since_epoch = ticks.checked_sub(TICKS_AT_UNIX_EPOCH)?;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = (since_epoch.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticks_match_known_values() {
        let unix_epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(to_ticks(unix_epoch), TICKS_AT_UNIX_EPOCH);

        // 2000-01-01T00:00:00Z
        let y2k = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_ticks(y2k), 630_822_816_000_000_000);
        assert_eq!(from_ticks(630_822_816_000_000_000), Some(y2k));
    }

    #[test]
    fn ticks_keep_sub_second_precision() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_700).unwrap();
        assert_eq!(from_ticks(to_ticks(at)), Some(at));
    }

    #[test]
    fn record_values_carry_format_marker() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = KeyRecord::new(KeyMaterial::new(vec![1u8; 64]), created);
        let values = record.to_values();

        assert_eq!(values.len(), 3);
        assert_eq!(values[0].0, ValueNames::AUTO_GEN_KEY);
        assert_eq!(values[0].1, RegistryValue::Binary(vec![1u8; 64]));
        assert_eq!(values[1].1, RegistryValue::QWord(to_ticks(created)));
        assert_eq!(values[2].1, RegistryValue::DWord(2));
    }

    #[test]
    fn values_serialize_with_type_tags() {
        let json = serde_json::to_string(&RegistryValue::Binary(vec![0, 1, 2])).unwrap();
        assert_eq!(json, r#"{"type":"binary","data":"AAEC"}"#);

        let json = serde_json::to_string(&RegistryValue::DWord(2)).unwrap();
        assert_eq!(json, r#"{"type":"dword","data":2}"#);

        let parsed: RegistryValue =
            serde_json::from_str(r#"{"type":"qword","data":42}"#).unwrap();
        assert_eq!(parsed, RegistryValue::QWord(42));
    }

    #[test]
    fn invalid_base64_fails_to_parse() {
        let parsed = serde_json::from_str::<RegistryValue>(r#"{"type":"binary","data":"!!"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn zeroize_clears_binary_payload() {
        let mut value = RegistryValue::Binary(vec![7u8; 64]);
        value.zeroize();
        assert_eq!(value, RegistryValue::Binary(Vec::new()));

        let mut value = RegistryValue::DWord(2);
        value.zeroize();
        assert_eq!(value, RegistryValue::DWord(0));
    }

    #[test]
    fn debug_hides_binary_payload() {
        let rendered = format!("{:?}", RegistryValue::Binary(vec![9u8; 64]));
        assert_eq!(rendered, "Binary(64 bytes)");
    }
}
