//! Windows registry implementation (`HKEY_CURRENT_USER`).

use crate::{KeyRegistry, RegistryError, RegistryPath, RegistryResult, RegistryValue};
use tracing::debug;
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR};
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegFlushKey, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW,
    HKEY, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_BINARY, REG_DWORD, REG_OPTION_NON_VOLATILE,
    REG_QWORD, REG_SZ, REG_VALUE_TYPE,
};

/// Registry key handle closed on drop.
struct OwnedKey(HKEY);

impl Drop for OwnedKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

/// Native registry storage under `HKEY_CURRENT_USER`.
#[derive(Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, path: &RegistryPath) -> RegistryResult<Option<OwnedKey>> {
        let subkey = HSTRING::from(path.to_string());
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                0,
                KEY_READ,
                &mut hkey,
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "RegOpenKeyExW")?;
        Ok(Some(OwnedKey(hkey)))
    }

    fn create(&self, path: &RegistryPath) -> RegistryResult<OwnedKey> {
        let subkey = HSTRING::from(path.to_string());
        let mut hkey = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_READ | KEY_WRITE,
                None,
                &mut hkey,
                None,
            )
        };
        check(status, "RegCreateKeyExW")?;
        Ok(OwnedKey(hkey))
    }
}

impl KeyRegistry for WindowsRegistry {
    fn get_value(&self, path: &RegistryPath, name: &str) -> RegistryResult<Option<RegistryValue>> {
        debug!(path = %path, name, "Querying registry value");

        let Some(key) = self.open(path)? else {
            return Ok(None);
        };
        let value_name = HSTRING::from(name);
        let mut value_type = REG_VALUE_TYPE::default();
        let mut size: u32 = 0;

        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                Some(&mut value_type as *mut _),
                None,
                Some(&mut size as *mut _),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "RegQueryValueExW")?;

        let mut data = vec![0u8; size as usize];
        let status = unsafe {
            RegQueryValueExW(
                key.0,
                PCWSTR(value_name.as_ptr()),
                None,
                Some(&mut value_type as *mut _),
                Some(data.as_mut_ptr()),
                Some(&mut size as *mut _),
            )
        };
        check(status, "RegQueryValueExW")?;
        data.truncate(size as usize);

        decode_value(value_type, data).map(Some)
    }

    fn set_values(&self, path: &RegistryPath, values: &[(&str, RegistryValue)]) -> RegistryResult<()> {
        debug!(path = %path, count = values.len(), "Setting registry values");

        let key = self.create(path)?;
        for (name, value) in values {
            let value_name = HSTRING::from(*name);
            let (value_type, data) = encode_value(value);
            let status = unsafe {
                RegSetValueExW(key.0, PCWSTR(value_name.as_ptr()), 0, value_type, Some(&data))
            };
            check(status, "RegSetValueExW")?;
        }

        // Synchronous: the key must be on disk before we report success.
        check(unsafe { RegFlushKey(key.0) }, "RegFlushKey")
    }

    fn backend_name(&self) -> &'static str {
        "windows_registry"
    }
}

fn check(status: WIN32_ERROR, operation: &str) -> RegistryResult<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(RegistryError::Platform(format!(
            "{} failed with error code {}",
            operation, status.0
        )))
    }
}

fn encode_value(value: &RegistryValue) -> (REG_VALUE_TYPE, Vec<u8>) {
    match value {
        RegistryValue::Binary(bytes) => (REG_BINARY, bytes.clone()),
        RegistryValue::DWord(v) => (REG_DWORD, v.to_le_bytes().to_vec()),
        RegistryValue::QWord(v) => (REG_QWORD, v.to_le_bytes().to_vec()),
        RegistryValue::String(s) => {
            let data = s
                .encode_utf16()
                .chain(std::iter::once(0))
                .flat_map(u16::to_le_bytes)
                .collect();
            (REG_SZ, data)
        }
    }
}

fn decode_value(value_type: REG_VALUE_TYPE, data: Vec<u8>) -> RegistryResult<RegistryValue> {
    match value_type {
        REG_BINARY => Ok(RegistryValue::Binary(data)),
        REG_DWORD => {
            let bytes: [u8; 4] = data
                .as_slice()
                .try_into()
                .map_err(|_| RegistryError::Encoding(format!("DWORD of {} bytes", data.len())))?;
            Ok(RegistryValue::DWord(i32::from_le_bytes(bytes)))
        }
        REG_QWORD => {
            let bytes: [u8; 8] = data
                .as_slice()
                .try_into()
                .map_err(|_| RegistryError::Encoding(format!("QWORD of {} bytes", data.len())))?;
            Ok(RegistryValue::QWord(i64::from_le_bytes(bytes)))
        }
        REG_SZ => {
            let wide: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .take_while(|&unit| unit != 0)
                .collect();
            String::from_utf16(&wide)
                .map(RegistryValue::String)
                .map_err(|e| RegistryError::Encoding(e.to_string()))
        }
        other => Err(RegistryError::Encoding(format!(
            "unsupported registry value type {}",
            other.0
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_scalars() {
        for value in [
            RegistryValue::DWord(2),
            RegistryValue::QWord(638_500_000_000_000_000),
            RegistryValue::String("asp.net".into()),
            RegistryValue::Binary(vec![1, 2, 3]),
        ] {
            let (value_type, data) = encode_value(&value);
            assert_eq!(decode_value(value_type, data).unwrap(), value);
        }
    }

    #[test]
    #[ignore] // Writes to HKEY_CURRENT_USER
    fn test_registry_operations() {
        let registry = WindowsRegistry::new();
        let path = RegistryPath::parse(r"software\autogenkeys-test\key-0").unwrap();

        registry
            .set_values(&path, &[("AutoGenKey", RegistryValue::Binary(vec![3u8; 64]))])
            .unwrap();
        assert_eq!(
            registry.get_value(&path, "AutoGenKey").unwrap(),
            Some(RegistryValue::Binary(vec![3u8; 64]))
        );
        assert_eq!(registry.get_value(&path, "Missing").unwrap(), None);
    }
}
