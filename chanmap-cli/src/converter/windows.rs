//! Windows converter bridge backed by the vendor DLLs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chanmap_core::converter::buffer_to_string;
use chanmap_core::{ConverterBridge, MissingComponent, TunerDomain, XML_BUFFER_SIZE};
use libloading::{Library, Symbol};
use log::{debug, info};

use super::{converter_library, converter_path_arg, missing_message, ConverterLibrary};

type ConvertToXmlFn = unsafe extern "system" fn(path: *const u8, buffer: *mut u8) -> i32;
type ConvertToBinFn = unsafe extern "system" fn(xml: *const u8) -> i32;

/// Converter DLLs loaded from one directory.
///
/// A DLL stays loaded once used. The write entry point takes no path and
/// writes back to the directory the same DLL last read from.
pub struct NativeConverters {
    dir: PathBuf,
    loaded: RefCell<HashMap<TunerDomain, Library>>,
}

impl NativeConverters {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            loaded: RefCell::new(HashMap::new()),
        }
    }

    fn with_library<T>(
        &self,
        domain: TunerDomain,
        f: impl FnOnce(&Library, &ConverterLibrary) -> Result<T, MissingComponent>,
    ) -> Result<T, MissingComponent> {
        let names = converter_library(domain);
        let mut loaded = self.loaded.borrow_mut();
        if !loaded.contains_key(&domain) {
            let path = self.dir.join(names.dll);
            info!("Loading converter {}", path.display());
            // SAFETY: the vendor DLLs have no initialization side effects beyond their own state.
            let lib = unsafe { Library::new(&path) }.map_err(|e| {
                debug!("Failed to load {}: {}", path.display(), e);
                MissingComponent(missing_message(&names))
            })?;
            loaded.insert(domain, lib);
        }
        let lib = loaded
            .get(&domain)
            .ok_or_else(|| MissingComponent(missing_message(&names)))?;
        f(lib, &names)
    }
}

fn symbol_name(name: &str) -> Vec<u8> {
    let mut bytes = name.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

impl ConverterBridge for NativeConverters {
    fn to_xml(&self, domain: TunerDomain, dir: &Path) -> Result<(i32, String), MissingComponent> {
        self.with_library(domain, |lib, names| {
            // SAFETY: signature taken from the vendor's converter header.
            let convert: Symbol<ConvertToXmlFn> = unsafe { lib.get(&symbol_name(names.to_xml)) }
                .map_err(|_| MissingComponent(missing_message(names)))?;

            let path = converter_path_arg(dir);
            let mut buffer = vec![0u8; XML_BUFFER_SIZE];
            debug!("{}({})", names.to_xml, dir.display());
            // SAFETY: `path` is NUL terminated and `buffer` has the size the converter expects.
            let code = unsafe { convert(path.as_ptr(), buffer.as_mut_ptr()) };
            Ok((code, buffer_to_string(&buffer)))
        })
    }

    fn to_binary(&self, domain: TunerDomain, xml: &str) -> Result<i32, MissingComponent> {
        self.with_library(domain, |lib, names| {
            // SAFETY: signature taken from the vendor's converter header.
            let convert: Symbol<ConvertToBinFn> = unsafe { lib.get(&symbol_name(names.to_binary)) }
                .map_err(|_| MissingComponent(missing_message(names)))?;

            let mut bytes = xml.as_bytes().to_vec();
            bytes.push(0);
            debug!("{}({} bytes)", names.to_binary, xml.len());
            // SAFETY: `bytes` is NUL terminated and outlives the call.
            let code = unsafe { convert(bytes.as_ptr()) };
            Ok(code)
        })
    }
}
