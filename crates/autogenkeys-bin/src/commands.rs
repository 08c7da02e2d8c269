//! Subcommand implementations. Output goes to the given writer.

use std::io::Write;

use autogenkeys_storage::{KeyKind, KeyMaterial, KeyStore, KeyStoreError};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::ValueEnum;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Encoding used when printing key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyFormat {
    Hex,
    Base64,
}

impl KeyFormat {
    fn encode(self, key: &KeyMaterial) -> String {
        match self {
            KeyFormat::Hex => key.as_bytes().iter().map(|b| format!("{:02X}", b)).collect(),
            KeyFormat::Base64 => BASE64.encode(key.as_bytes()),
        }
    }
}

pub fn retrieve(store: &KeyStore, kind: KeyKind, format: KeyFormat, out: &mut impl Write) -> CommandResult {
    let key = store.retrieve(kind)?;
    writeln!(out, "{}", format.encode(&key))?;
    Ok(())
}

pub fn locate(store: &KeyStore, kind: Option<KeyKind>, out: &mut impl Write) -> CommandResult {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => KeyKind::ALL.to_vec(),
    };

    for kind in kinds {
        let path = store
            .locator()
            .path_for(kind)
            .ok_or(KeyStoreError::KeyUnavailable)?;
        writeln!(out, "{}\t{}", kind, path)?;
    }
    Ok(())
}

pub fn inspect(store: &KeyStore, kind: KeyKind, out: &mut impl Write) -> CommandResult {
    let Some(info) = store.inspect(kind)? else {
        writeln!(out, "No stored {} key", kind)?;
        return Ok(());
    };

    writeln!(out, "Kind:        {}", kind)?;
    writeln!(out, "Value type:  {}", info.value_type)?;
    match info.key_length {
        Some(length) => writeln!(out, "Key length:  {} bytes", length)?,
        None => writeln!(out, "Key length:  n/a")?,
    }
    writeln!(out, "Valid:       {}", if info.valid { "yes" } else { "no (will be regenerated)" })?;
    match info.created_at {
        Some(created) => writeln!(out, "Created:     {}", created.to_rfc3339())?,
        None => writeln!(out, "Created:     unknown")?,
    }
    match info.format {
        Some(format) => writeln!(out, "Format:      {}", format)?,
        None => writeln!(out, "Format:      unknown")?,
    }
    Ok(())
}
