//! Channel list types shared with the host application.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChanMapError;
use crate::xml::NodeId;

/// Display name of this loader.
pub const PLUGIN_NAME: &str = "Philips .dat";

/// File dialog filter for files this loader accepts.
pub const FILE_FILTER: &str = "*.dat;*.bin";

/// Sentinel for "no program number / no favorite position".
pub const UNSET: i32 = -1;

/// Tuner domain of a channel list.
///
/// Each domain has its own converter and its own XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunerDomain {
    /// DVB-T
    #[serde(rename = "air", alias = "terrestrial")]
    Terrestrial,
    /// DVB-C
    Cable,
    /// DVB-S
    Satellite,
}

impl TunerDomain {
    /// All domains in load order.
    pub const ALL: [TunerDomain; 3] = [
        TunerDomain::Terrestrial,
        TunerDomain::Cable,
        TunerDomain::Satellite,
    ];

    /// Short file type name used by the converters.
    pub fn file_type(&self) -> &'static str {
        match self {
            TunerDomain::Terrestrial => "air",
            TunerDomain::Cable => "cable",
            TunerDomain::Satellite => "satellite",
        }
    }

    /// Caption of the channel list shown by the host.
    pub fn caption(&self) -> &'static str {
        match self {
            TunerDomain::Terrestrial => "DVB-T",
            TunerDomain::Cable => "DVB-C",
            TunerDomain::Satellite => "DVB-S",
        }
    }
}

impl fmt::Display for TunerDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_type())
    }
}

impl FromStr for TunerDomain {
    type Err = ChanMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "air" | "terrestrial" | "dvb-t" | "dvbt" => Ok(TunerDomain::Terrestrial),
            "cable" | "dvb-c" | "dvbc" => Ok(TunerDomain::Cable),
            "satellite" | "sat" | "dvb-s" | "dvbs" => Ok(TunerDomain::Satellite),
            _ => Err(ChanMapError::UnsupportedDomain(s.to_string())),
        }
    }
}

/// Kind of service carried by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Tv,
    Radio,
    /// Data services and anything unrecognized.
    #[default]
    Data,
}

impl ServiceKind {
    /// Classify the `SvcType` field.
    pub fn from_field(value: &str) -> Self {
        match value {
            "TV" => ServiceKind::Tv,
            "RADIO" => ServiceKind::Radio,
            _ => ServiceKind::Data,
        }
    }

    /// Numeric service type (1 = SD-TV, 2 = radio, 0 = other).
    pub fn service_type(&self) -> i32 {
        match self {
            ServiceKind::Tv => 1,
            ServiceKind::Radio => 2,
            ServiceKind::Data => 0,
        }
    }
}

/// Satellite transponder polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

impl Polarity {
    pub fn from_field(value: &str) -> Self {
        if value == "HORIZONTAL" {
            Polarity::Horizontal
        } else {
            Polarity::Vertical
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Polarity::Horizontal => 'H',
            Polarity::Vertical => 'V',
        }
    }
}

/// One channel of a tuner domain.
///
/// Created by the document loader; afterwards the host edits the public
/// fields (program number, favorites, flags) and the tree patcher writes
/// them back into the originating node.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelRecord {
    pub domain: TunerDomain,
    /// Position in the source document (creation order).
    pub record_index: usize,
    /// Stable identity key within the domain.
    pub unique_id: usize,

    pub old_program_nr: i32,
    /// Program number to save; [`UNSET`] removes the channel on save.
    pub new_program_nr: i32,

    /// `ChName` exactly as read, if present.
    pub raw_name: Option<String>,
    pub name: String,
    /// `SatName` exactly as read, if present (satellite only).
    pub raw_satellite: Option<String>,
    pub satellite: Option<String>,

    pub lock: bool,
    pub hidden: bool,
    /// Favorite position at load time, [`UNSET`] if not a favorite.
    pub old_fav_index: i32,
    /// Favorite position to save, [`UNSET`] if not a favorite.
    pub fav_index: i32,

    pub original_network_id: i32,
    pub transport_stream_id: i32,
    pub service_id: i32,
    pub freq_mhz: f64,
    pub symbol_rate: i32,
    pub polarity: Option<Polarity>,
    pub service_kind: ServiceKind,
    pub service_type: i32,
    /// Channel or transponder label derived from the frequency.
    pub channel_or_transponder: String,

    pub is_deleted: bool,
    pub is_name_modified: bool,

    #[serde(skip)]
    pub(crate) node: NodeId,
}

impl ChannelRecord {
    pub(crate) fn new(domain: TunerDomain, record_index: usize, node: NodeId) -> Self {
        Self {
            domain,
            record_index,
            unique_id: record_index,
            old_program_nr: UNSET,
            new_program_nr: UNSET,
            raw_name: None,
            name: String::new(),
            raw_satellite: None,
            satellite: None,
            lock: false,
            hidden: false,
            old_fav_index: UNSET,
            fav_index: UNSET,
            original_network_id: 0,
            transport_stream_id: 0,
            service_id: 0,
            freq_mhz: 0.0,
            symbol_rate: 0,
            polarity: None,
            service_kind: ServiceKind::Data,
            service_type: 0,
            channel_or_transponder: String::new(),
            is_deleted: false,
            is_name_modified: false,
            node,
        }
    }

    /// Rename the channel; the new name is encoded on save.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.is_name_modified = true;
        }
    }

    pub fn is_favorite(&self) -> bool {
        self.fav_index >= 0
    }

    /// Whether the patcher removes this channel from the document.
    pub fn is_removed_on_save(&self) -> bool {
        self.is_deleted || self.new_program_nr < 0
    }

    /// Handle of the node this record was read from.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Channels of one tuner domain, in the host's current order.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelList {
    pub domain: TunerDomain,
    pub caption: &'static str,
    pub channels: Vec<ChannelRecord>,
}

impl ChannelList {
    pub fn new(domain: TunerDomain) -> Self {
        Self {
            domain,
            caption: domain.caption(),
            channels: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, record_index: usize) -> Option<&ChannelRecord> {
        self.channels.iter().find(|c| c.record_index == record_index)
    }

    pub fn get_mut(&mut self, record_index: usize) -> Option<&mut ChannelRecord> {
        self.channels.iter_mut().find(|c| c.record_index == record_index)
    }
}

/// How deleted channels are handled by the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeleteMode {
    /// The channel is removed from the file.
    Physically,
}

/// Editing capabilities this format offers to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Features {
    pub channel_name_edit: bool,
    pub can_skip_channels: bool,
    pub can_lock_channels: bool,
    pub can_hide_channels: bool,
    pub delete_mode: DeleteMode,
    pub can_save_as: bool,
    pub allow_gaps_in_fav_numbers: bool,
    /// Number of favorite lists ("A" only).
    pub supported_favorites: u8,
    pub sorted_favorites: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            channel_name_edit: true,
            can_skip_channels: false,
            can_lock_channels: true,
            can_hide_channels: true,
            delete_mode: DeleteMode::Physically,
            can_save_as: false,
            allow_gaps_in_fav_numbers: false,
            supported_favorites: 1,
            sorted_favorites: true,
        }
    }
}

/// Check a file name against [`FILE_FILTER`].
pub fn matches_file_filter(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("dat") || e.eq_ignore_ascii_case("bin"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_domain_parse() {
        assert_eq!("air".parse::<TunerDomain>().unwrap(), TunerDomain::Terrestrial);
        assert_eq!("DVB-C".parse::<TunerDomain>().unwrap(), TunerDomain::Cable);
        assert_eq!("Satellite".parse::<TunerDomain>().unwrap(), TunerDomain::Satellite);
        assert!(matches!(
            "analog".parse::<TunerDomain>(),
            Err(ChanMapError::UnsupportedDomain(ref s)) if s == "analog"
        ));
    }

    #[test]
    fn test_service_kind() {
        assert_eq!(ServiceKind::from_field("TV"), ServiceKind::Tv);
        assert_eq!(ServiceKind::from_field("RADIO"), ServiceKind::Radio);
        assert_eq!(ServiceKind::from_field("DATA"), ServiceKind::Data);
        assert_eq!(ServiceKind::from_field("tv"), ServiceKind::Data);
        assert_eq!(ServiceKind::Radio.service_type(), 2);
    }

    #[test]
    fn test_polarity() {
        assert_eq!(Polarity::from_field("HORIZONTAL"), Polarity::Horizontal);
        assert_eq!(Polarity::from_field("VERTICAL"), Polarity::Vertical);
        assert_eq!(Polarity::from_field(""), Polarity::Vertical);
    }

    #[test]
    fn test_set_name_marks_modified() {
        let mut ch = ChannelRecord::new(TunerDomain::Cable, 0, NodeId::default());
        ch.name = "Das Erste".to_string();
        ch.set_name("Das Erste");
        assert!(!ch.is_name_modified);
        ch.set_name("ARD");
        assert!(ch.is_name_modified);
        assert_eq!(ch.name, "ARD");
    }

    #[test]
    fn test_file_filter() {
        assert!(matches_file_filter(Path::new("ChannelList/chanLst.bin")));
        assert!(matches_file_filter(Path::new("channellib/CableDigSrvTable.DAT")));
        assert!(!matches_file_filter(Path::new("channellib/readme.txt")));
    }
}
