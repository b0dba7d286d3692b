//! Finds the channel list directory structure on a USB export.
//!
//! ```text
//! ChannelList/
//! ├── chanLst.bin            marker for the whole structure
//! ├── channellib/            terrestrial + cable
//! │   ├── AntennaDigSrvTable
//! │   └── CableDigSrvTable
//! └── s2channellib/          satellite
//!     └── service.dat
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ChanMapError, Result};
use crate::types::TunerDomain;

pub const MARKER_FILE: &str = "chanLst.bin";
pub const CHANNEL_LIB_DIR: &str = "channellib";
pub const SAT_CHANNEL_LIB_DIR: &str = "s2channellib";

/// A located channel list directory structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelListLayout {
    pub root: PathBuf,
    pub marker: PathBuf,
}

impl ChannelListLayout {
    /// Directory the given domain's converter reads from.
    pub fn domain_dir(&self, domain: TunerDomain) -> PathBuf {
        match domain {
            TunerDomain::Terrestrial | TunerDomain::Cable => self.root.join(CHANNEL_LIB_DIR),
            TunerDomain::Satellite => self.root.join(SAT_CHANNEL_LIB_DIR),
        }
    }
}

/// Locate the structure from a file or directory inside it.
pub fn locate(path: &Path) -> Result<ChannelListLayout> {
    let mut dir = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let is_lib_dir = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            n.eq_ignore_ascii_case(CHANNEL_LIB_DIR) || n.eq_ignore_ascii_case(SAT_CHANNEL_LIB_DIR)
        })
        .unwrap_or(false);
    if is_lib_dir {
        if let Some(parent) = dir.parent() {
            dir = parent.to_path_buf();
        }
    }

    let marker = dir.join(MARKER_FILE);
    if !marker.is_file() {
        debug!("No {} in {}", MARKER_FILE, dir.display());
        return Err(ChanMapError::InputNotFound { path: dir });
    }

    info!("Found channel list structure at {}", dir.display());
    Ok(ChannelListLayout { root: dir, marker })
}

/// In-memory copy of the files below a layout root.
///
/// Taken before the converters overwrite the binary files so a failed
/// save can put the previous state back.
#[derive(Debug, Default)]
pub struct Snapshot {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl Snapshot {
    pub fn capture(layout: &ChannelListLayout) -> Result<Self> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&layout.root) {
            let entry = entry.map_err(|e| ChanMapError::Io(e.into()))?;
            if entry.file_type().is_file() {
                let data = fs::read(entry.path())?;
                files.push((entry.path().to_path_buf(), data));
            }
        }
        debug!("Captured {} files below {}", files.len(), layout.root.display());
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every captured file back. Continues past individual failures
    /// and returns the first error.
    pub fn restore(&self) -> Result<()> {
        let mut first_err = None;
        for (path, data) in &self.files {
            if let Err(e) = fs::write(path, data) {
                warn!("Failed to restore {}: {}", path.display(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_layout() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join(MARKER_FILE), b"marker").unwrap();
        fs::create_dir(root.join(CHANNEL_LIB_DIR)).unwrap();
        fs::create_dir(root.join(SAT_CHANNEL_LIB_DIR)).unwrap();
        fs::write(root.join(CHANNEL_LIB_DIR).join("CableDigSrvTable"), b"cable").unwrap();
        fs::write(root.join(SAT_CHANNEL_LIB_DIR).join("service.dat"), b"sat").unwrap();
        tmp
    }

    #[test]
    fn test_locate_from_marker_and_directory() {
        let tmp = make_layout();
        let root = tmp.path();

        let layout = locate(&root.join(MARKER_FILE)).unwrap();
        assert_eq!(layout.root, root);
        assert_eq!(layout.marker, root.join(MARKER_FILE));

        assert_eq!(locate(root).unwrap().root, root);
    }

    #[test]
    fn test_locate_from_lib_subdirectories() {
        let tmp = make_layout();
        let root = tmp.path();

        let from_file = locate(&root.join(CHANNEL_LIB_DIR).join("CableDigSrvTable")).unwrap();
        assert_eq!(from_file.root, root);
        let from_dir = locate(&root.join(SAT_CHANNEL_LIB_DIR)).unwrap();
        assert_eq!(from_dir.root, root);
        assert_eq!(
            from_dir.domain_dir(TunerDomain::Satellite),
            root.join(SAT_CHANNEL_LIB_DIR)
        );
        assert_eq!(
            from_dir.domain_dir(TunerDomain::Cable),
            root.join(CHANNEL_LIB_DIR)
        );
    }

    #[test]
    fn test_missing_marker_fails_fast() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("CableDigSrvTable.dat"), b"x").unwrap();
        let err = locate(&tmp.path().join("CableDigSrvTable.dat")).unwrap_err();
        assert!(matches!(err, ChanMapError::InputNotFound { ref path } if path == tmp.path()));
    }

    #[test]
    fn test_snapshot_restore() {
        let tmp = make_layout();
        let layout = locate(tmp.path()).unwrap();
        let snapshot = Snapshot::capture(&layout).unwrap();
        assert_eq!(snapshot.len(), 3);

        let cable = tmp.path().join(CHANNEL_LIB_DIR).join("CableDigSrvTable");
        fs::write(&cable, b"half written").unwrap();
        snapshot.restore().unwrap();
        assert_eq!(fs::read(&cable).unwrap(), b"cable");
    }
}
