//! Native converter bridge.
//!
//! The vendor ships one converter library per tuner domain. They are only
//! available as Windows DLLs; other platforms get a stub that reports them
//! as missing.

use chanmap_core::TunerDomain;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "windows")]
pub use windows::*;

/// Library and entry point names of one converter.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterLibrary {
    pub dll: &'static str,
    pub to_xml: &'static str,
    pub to_binary: &'static str,
}

pub fn converter_library(domain: TunerDomain) -> ConverterLibrary {
    match domain {
        TunerDomain::Terrestrial => ConverterLibrary {
            dll: "Air.dll",
            to_xml: "ConvertToXML_Air",
            to_binary: "ConvertToBIN_Air",
        },
        TunerDomain::Cable => ConverterLibrary {
            dll: "Cable.dll",
            to_xml: "ConvertToXML_Cable",
            to_binary: "ConvertToBIN_Cable",
        },
        TunerDomain::Satellite => ConverterLibrary {
            dll: "dvbs2_cte.dll",
            to_xml: "ConvertToXML_Satellite",
            to_binary: "ConvertToBin_Satellite",
        },
    }
}

/// Message shown when a converter DLL cannot be used.
pub fn missing_message(lib: &ConverterLibrary) -> String {
    format!("DLL file '{}' from Philips Channel Editor", lib.dll)
}

#[cfg(not(target_os = "windows"))]
mod stub {
    //! Stub implementation for non-Windows platforms.

    use std::path::{Path, PathBuf};

    use chanmap_core::{ConverterBridge, MissingComponent, TunerDomain};

    use super::{converter_library, missing_message};

    pub struct NativeConverters {
        _dir: PathBuf,
    }

    impl NativeConverters {
        pub fn new(dir: &Path) -> Self {
            Self {
                _dir: dir.to_path_buf(),
            }
        }

        fn unsupported(domain: TunerDomain) -> MissingComponent {
            MissingComponent(format!(
                "{} (the converters only run on Windows)",
                missing_message(&converter_library(domain))
            ))
        }
    }

    impl ConverterBridge for NativeConverters {
        fn to_xml(&self, domain: TunerDomain, _dir: &Path) -> Result<(i32, String), MissingComponent> {
            Err(Self::unsupported(domain))
        }

        fn to_binary(&self, domain: TunerDomain, _xml: &str) -> Result<i32, MissingComponent> {
            Err(Self::unsupported(domain))
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;

/// Path argument as the converters expect it: ASCII, trailing backslash, NUL terminated.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub fn converter_path_arg(dir: &std::path::Path) -> Vec<u8> {
    let mut path: String = dir
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect();
    if !path.ends_with('\\') && !path.ends_with('/') {
        path.push('\\');
    }
    let mut bytes = path.into_bytes();
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_library_names() {
        assert_eq!(converter_library(TunerDomain::Terrestrial).dll, "Air.dll");
        assert_eq!(
            converter_library(TunerDomain::Satellite).to_binary,
            "ConvertToBin_Satellite"
        );
        assert!(missing_message(&converter_library(TunerDomain::Cable)).contains("'Cable.dll'"));
    }

    #[test]
    fn test_path_arg() {
        assert_eq!(converter_path_arg(Path::new("D:\\ChannelList\\channellib")), b"D:\\ChannelList\\channellib\\\0".to_vec());
        assert_eq!(converter_path_arg(Path::new("Kanäle")), b"Kan?le\\\0".to_vec());
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_stub_reports_missing_converter() {
        use chanmap_core::ConverterBridge;

        let bridge = NativeConverters::new(Path::new("."));
        let err = bridge.to_xml(TunerDomain::Cable, Path::new("lib")).unwrap_err();
        assert!(err.0.contains("Cable.dll"));
    }
}
