//! Key kinds.

use crate::KeyStoreError;
use std::fmt;
use std::str::FromStr;

/// Length in bytes of an auto-generated validation key.
pub const VALIDATION_KEY_LENGTH: usize = 64;

/// Length in bytes of an auto-generated encryption key.
pub const ENCRYPTION_KEY_LENGTH: usize = 64;

/// Purpose a key serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Data validation (HMAC) key.
    Validation,
    /// Data encryption key.
    Encryption,
}

impl KeyKind {
    /// All kinds, in ordinal order.
    pub const ALL: [KeyKind; 2] = [KeyKind::Validation, KeyKind::Encryption];

    /// Expected key length in bytes.
    pub const fn key_length(self) -> usize {
        match self {
            KeyKind::Validation => VALIDATION_KEY_LENGTH,
            KeyKind::Encryption => ENCRYPTION_KEY_LENGTH,
        }
    }

    /// Ordinal used as the storage path suffix.
    pub const fn ordinal(self) -> i32 {
        match self {
            KeyKind::Validation => 0,
            KeyKind::Encryption => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Validation => "validation",
            KeyKind::Encryption => "encryption",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for KeyKind {
    type Error = KeyStoreError;

    fn try_from(ordinal: i32) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(KeyKind::Validation),
            1 => Ok(KeyKind::Encryption),
            other => Err(KeyStoreError::UnknownKeyKind(other.to_string())),
        }
    }
}

impl FromStr for KeyKind {
    type Err = KeyStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "validation" => Ok(KeyKind::Validation),
            "encryption" => Ok(KeyKind::Encryption),
            _ => Err(KeyStoreError::UnknownKeyKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_kinds_use_64_byte_keys() {
        assert_eq!(KeyKind::Validation.key_length(), 64);
        assert_eq!(KeyKind::Encryption.key_length(), 64);
    }

    #[test]
    fn ordinals_round_trip() {
        for kind in KeyKind::ALL {
            assert_eq!(KeyKind::try_from(kind.ordinal()).unwrap(), kind);
        }
        assert_ne!(KeyKind::Validation.ordinal(), KeyKind::Encryption.ordinal());
    }

    #[test]
    fn unknown_ordinal_is_rejected() {
        let err = KeyKind::try_from(7).unwrap_err();
        assert!(matches!(err, KeyStoreError::UnknownKeyKind(ref v) if v == "7"));
        assert!(KeyKind::try_from(-1).is_err());
    }

    #[test]
    fn parse_from_str() {
        assert_eq!("Validation".parse::<KeyKind>().unwrap(), KeyKind::Validation);
        assert_eq!(" encryption ".parse::<KeyKind>().unwrap(), KeyKind::Encryption);
        assert!(matches!(
            "decryption".parse::<KeyKind>(),
            Err(KeyStoreError::UnknownKeyKind(_))
        ));
    }
}
