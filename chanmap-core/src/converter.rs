//! Contract of the external binary <-> XML converters.

use std::path::Path;

use log::error;

use crate::error::{ChanMapError, ConverterStatus, MissingComponent, Result};
use crate::types::TunerDomain;

/// Output buffer size the converters expect (10 MiB).
pub const XML_BUFFER_SIZE: usize = 10 * 1024 * 1024;

/// One converter per tuner domain, invoked as a black box.
///
/// Implementations return the raw vendor status code; interpretation is
/// done by [`read_channel_xml`] and [`write_channel_xml`]. `Err` means the
/// converter itself is not available.
pub trait ConverterBridge {
    /// Convert the binary list in `dir` to XML. Returns `(status, xml)`.
    fn to_xml(&self, domain: TunerDomain, dir: &Path) -> std::result::Result<(i32, String), MissingComponent>;

    /// Convert `xml` back and overwrite the binary list. Returns the status.
    fn to_binary(&self, domain: TunerDomain, xml: &str) -> std::result::Result<i32, MissingComponent>;
}

/// Run the read converter and check its status.
pub fn read_channel_xml(bridge: &dyn ConverterBridge, domain: TunerDomain, dir: &Path) -> Result<String> {
    let (code, xml) = bridge.to_xml(domain, dir)?;
    let status = ConverterStatus::from_read_code(domain, code);
    if !status.is_success() {
        error!("{} converter returned {} for {}", domain, code, dir.display());
        return Err(ChanMapError::ConverterFailed {
            domain,
            status,
            code,
            path: dir.to_path_buf(),
        });
    }
    Ok(xml.trim().to_string())
}

/// Run the write converter and check its status.
pub fn write_channel_xml(
    bridge: &dyn ConverterBridge,
    domain: TunerDomain,
    dir: &Path,
    xml: &str,
) -> Result<()> {
    let code = bridge.to_binary(domain, xml)?;
    let status = ConverterStatus::from_write_code(code);
    if !status.is_success() {
        error!("Could not write {} channel list: {} (status {})", domain, status, code);
        return Err(ChanMapError::ConverterFailed {
            domain,
            status,
            code,
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Extract the text before the first NUL of a converter output buffer.
pub fn buffer_to_string(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}
