//! Pluggable policy configuration sources (§10.4): a `ConfigSource` trait
//! with a portable TOML-file backend and a `cfg(windows)` registry
//! backend, layering parsed config over defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::policy::OperationMode;

/// The policy snapshot a [`ConfigSource`] produces for
/// [`crate::policy::PolicyStore::reload_from_config`].
#[derive(Debug, Clone, Default)]
pub struct LoadedPolicy {
    pub mode: OperationMode,
    pub report_rate: u32,
    pub watch_paths: Vec<String>,
}

pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<LoadedPolicy>;
}

#[derive(Debug, Deserialize, Default)]
struct TomlPolicy {
    #[serde(default)]
    mode: u32,
    #[serde(default)]
    report_rate: u32,
    #[serde(default)]
    watch_paths: Vec<String>,
}

/// Reads policy from a TOML file on disk; used by the CLI's `--config`
/// flag and by tests in place of the registry backend.
pub struct TomlConfigSource {
    path: std::path::PathBuf,
}

impl TomlConfigSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        TomlConfigSource {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigSource for TomlConfigSource {
    fn load(&self) -> Result<LoadedPolicy> {
        let text = std::fs::read_to_string(&self.path)?;
        let parsed: TomlPolicy = toml::from_str(&text)
            .map_err(|e| Error::InvalidInput(format!("malformed config: {e}")))?;
        Ok(LoadedPolicy {
            mode: OperationMode::from_bits(parsed.mode),
            report_rate: parsed.report_rate,
            watch_paths: parsed.watch_paths,
        })
    }
}

#[cfg(windows)]
pub mod registry {
    //! Registry-backed `ConfigSource`, grounded on §6's "external
    //! key/value store" interface. Reads `OperationMode`, `ReportRate`,
    //! and `WatchPaths` (REG_MULTI_SZ) from a fixed key path; absent
    //! values fall back to zero/empty rather than erroring, matching
    //! the fail-soft-on-read/fail-closed-on-reload-failure split in §4.6.

    use super::*;
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        HKEY, HKEY_LOCAL_MACHINE, RRF_RT_REG_DWORD, RRF_RT_REG_MULTI_SZ, RegGetValueW,
    };

    pub struct RegistryConfigSource {
        subkey: Vec<u16>,
    }

    impl RegistryConfigSource {
        pub fn new(subkey: &str) -> Self {
            RegistryConfigSource {
                subkey: subkey.encode_utf16().chain(std::iter::once(0)).collect(),
            }
        }

        fn read_dword(&self, value_name: &[u16]) -> Option<u32> {
            let mut data: u32 = 0;
            let mut size: u32 = std::mem::size_of::<u32>() as u32;
            let status = unsafe {
                RegGetValueW(
                    HKEY_LOCAL_MACHINE as HKEY,
                    self.subkey.as_ptr(),
                    value_name.as_ptr(),
                    RRF_RT_REG_DWORD,
                    std::ptr::null_mut(),
                    &mut data as *mut u32 as *mut _,
                    &mut size,
                )
            };
            (status == ERROR_SUCCESS).then_some(data)
        }

        fn read_multi_sz(&self, value_name: &[u16]) -> Vec<String> {
            let mut size: u32 = 0;
            let status = unsafe {
                RegGetValueW(
                    HKEY_LOCAL_MACHINE as HKEY,
                    self.subkey.as_ptr(),
                    value_name.as_ptr(),
                    RRF_RT_REG_MULTI_SZ,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                    &mut size,
                )
            };
            if status != ERROR_SUCCESS || size == 0 {
                return Vec::new();
            }
            let mut buf = vec![0u16; size as usize / 2];
            let status = unsafe {
                RegGetValueW(
                    HKEY_LOCAL_MACHINE as HKEY,
                    self.subkey.as_ptr(),
                    value_name.as_ptr(),
                    RRF_RT_REG_MULTI_SZ,
                    std::ptr::null_mut(),
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if status != ERROR_SUCCESS {
                return Vec::new();
            }
            buf.split(|&c| c == 0)
                .filter(|s| !s.is_empty())
                .map(String::from_utf16_lossy)
                .collect()
        }
    }

    impl ConfigSource for RegistryConfigSource {
        fn load(&self) -> Result<LoadedPolicy> {
            let mode_name: Vec<u16> = "OperationMode\0".encode_utf16().collect();
            let rate_name: Vec<u16> = "ReportRate\0".encode_utf16().collect();
            let paths_name: Vec<u16> = "WatchPaths\0".encode_utf16().collect();

            Ok(LoadedPolicy {
                mode: OperationMode::from_bits(self.read_dword(&mode_name).unwrap_or(0)),
                report_rate: self.read_dword(&rate_name).unwrap_or(0),
                watch_paths: self.read_multi_sz(&paths_name),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn toml_source_parses_expected_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            mode = 3
            report_rate = 250
            watch_paths = ["C:\\data\\", "C:\\shared\\"]
            "#
        )
        .unwrap();

        let source = TomlConfigSource::new(file.path());
        let loaded = source.load().unwrap();
        assert_eq!(loaded.mode, OperationMode::from_bits(3));
        assert_eq!(loaded.report_rate, 250);
        assert_eq!(loaded.watch_paths, vec!["C:\\data\\", "C:\\shared\\"]);
    }

    #[test]
    fn toml_source_defaults_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "mode = 1").unwrap();

        let source = TomlConfigSource::new(file.path());
        let loaded = source.load().unwrap();
        assert_eq!(loaded.mode, OperationMode::from_bits(1));
        assert_eq!(loaded.report_rate, 0);
        assert!(loaded.watch_paths.is_empty());
    }

    #[test]
    fn toml_source_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml {{{{").unwrap();

        let source = TomlConfigSource::new(file.path());
        assert!(source.load().is_err());
    }
}
