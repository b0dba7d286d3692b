//! Edit files for the `apply` command.
//!
//! ```toml
//! [[channel]]
//! domain = "cable"
//! index = 0
//! program_nr = 12
//! name = "Das Erste HD"
//! favorite = true
//!
//! [[channel]]
//! domain = "satellite"
//! index = 4
//! delete = true
//! ```

use std::path::{Path, PathBuf};

use chanmap_core::{ChannelList, TunerDomain, UNSET};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct EditFile {
    #[serde(default, rename = "channel")]
    pub channels: Vec<ChannelEdit>,
}

/// Changes to one record, addressed by domain and record index.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelEdit {
    pub domain: TunerDomain,
    pub index: usize,
    pub program_nr: Option<i32>,
    pub name: Option<String>,
    pub favorite: Option<bool>,
    pub lock: Option<bool>,
    pub hidden: Option<bool>,
    #[serde(default)]
    pub delete: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("Failed to read edit file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid edit file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("No {domain} list loaded")]
    NoList { domain: TunerDomain },
    #[error("{domain} list has no record {index}")]
    NoRecord { domain: TunerDomain, index: usize },
}

pub fn load_edits(path: &Path) -> Result<EditFile, EditError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EditError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| EditError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply every edit; stops at the first one addressing a missing record.
///
/// Returns the number of records touched.
pub fn apply_edits(lists: &mut [ChannelList], edits: &EditFile) -> Result<usize, EditError> {
    for edit in &edits.channels {
        let list = lists
            .iter_mut()
            .find(|l| l.domain == edit.domain)
            .ok_or(EditError::NoList { domain: edit.domain })?;
        let ch = list.get_mut(edit.index).ok_or(EditError::NoRecord {
            domain: edit.domain,
            index: edit.index,
        })?;

        if let Some(nr) = edit.program_nr {
            ch.new_program_nr = nr;
        }
        if let Some(name) = &edit.name {
            ch.set_name(name.as_str());
        }
        if let Some(lock) = edit.lock {
            ch.lock = lock;
        }
        if let Some(hidden) = edit.hidden {
            ch.hidden = hidden;
        }
        match edit.favorite {
            Some(true) if !ch.is_favorite() => ch.fav_index = ch.new_program_nr.max(0),
            Some(false) => ch.fav_index = UNSET,
            _ => {}
        }
        if edit.delete {
            ch.is_deleted = true;
        }
        debug!("Edited {} record {}", edit.domain, edit.index);
    }
    Ok(edits.channels.len())
}
