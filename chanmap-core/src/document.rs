//! Document loader: converter XML to channel records.
//!
//! Expected converter output:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <ChannelMap>
//!   <ChannelData>
//!     <ChannelCount>2</ChannelCount>
//!     <Channel>
//!       <ChNum>1</ChNum>
//!       <ChName>0x41 0x00 0x52 0x00 0x44 0x00</ChName>
//!       ...
//!     </Channel>
//!     ...
//!   </ChannelData>
//! </ChannelMap>
//! ```

use log::debug;

use crate::error::{ChanMapError, Result};
use crate::lookup::FrequencyLookup;
use crate::name_codec::NameCodec;
use crate::types::{ChannelRecord, Polarity, ServiceKind, TunerDomain, UNSET};
use crate::xml::{self, NodeId, WriterSettings, XmlTree};

pub const ROOT_ELEMENT: &str = "ChannelMap";
pub const DATA_ELEMENT: &str = "ChannelData";
pub const CHANNEL_ELEMENT: &str = "Channel";

/// Line ending convention of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Newline {
    Lf,
    CrLf,
}

impl Newline {
    /// `CrLf` if the text contains `"\r\n"` anywhere.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Newline::CrLf
        } else {
            Newline::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Newline::Lf => "\n",
            Newline::CrLf => "\r\n",
        }
    }
}

/// Parsed converter output of one tuner domain.
#[derive(Debug, Clone)]
pub struct TunerDocument {
    pub domain: TunerDomain,
    pub tree: XmlTree,
    /// Text as returned by the converter.
    pub text_content: String,
    pub newline: Newline,
}

impl TunerDocument {
    /// Serialize the (possibly patched) tree with the original newline convention.
    pub fn serialize(&self) -> String {
        xml::write(&self.tree, &WriterSettings::with_newline(self.newline.as_str()))
    }
}

/// Child element name/text pairs of one channel node.
///
/// Lookups ignore ASCII case; the first occurrence of a name wins.
#[derive(Debug, Default, Clone)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn from_node(tree: &XmlTree, node: NodeId) -> Self {
        FieldMap(
            tree.element_children(node)
                .filter_map(|c| tree.name(c).map(|n| (n.to_string(), tree.inner_text(c))))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn is(&self, name: &str, expected: &str) -> bool {
        self.get(name) == Some(expected)
    }

    fn int(&self, name: &str) -> i32 {
        self.get(name).map(parse_int).unwrap_or(0)
    }
}

/// Parse a converter document and read its channels.
pub fn load(
    domain: TunerDomain,
    text: &str,
    codec: &NameCodec,
    lookup: &dyn FrequencyLookup,
) -> Result<(TunerDocument, Vec<ChannelRecord>)> {
    let newline = Newline::detect(text);

    let tree = xml::parse(text).map_err(|e| ChanMapError::Format {
        domain,
        reason: format!("converter did not return valid XML: {}", e),
    })?;

    let root = tree
        .root()
        .filter(|r| tree.local_name(*r) == Some(ROOT_ELEMENT))
        .ok_or_else(|| ChanMapError::Format {
            domain,
            reason: format!("converter did not return a <{}> document", ROOT_ELEMENT),
        })?;

    let data = tree
        .child_by_name(root, DATA_ELEMENT)
        .ok_or_else(|| ChanMapError::Format {
            domain,
            reason: format!("missing <{}> element", DATA_ELEMENT),
        })?;

    let channels: Vec<ChannelRecord> = tree
        .element_children(data)
        .filter(|c| tree.local_name(*c) == Some(CHANNEL_ELEMENT))
        .enumerate()
        .map(|(row, node)| read_channel(&tree, domain, node, row, codec, lookup))
        .collect();

    debug!(
        "Loaded {} {} channels ({:?} line endings)",
        channels.len(),
        domain,
        newline
    );

    let doc = TunerDocument {
        domain,
        tree,
        text_content: text.to_string(),
        newline,
    };
    Ok((doc, channels))
}

fn read_channel(
    tree: &XmlTree,
    domain: TunerDomain,
    node: NodeId,
    row: usize,
    codec: &NameCodec,
    lookup: &dyn FrequencyLookup,
) -> ChannelRecord {
    let data = FieldMap::from_node(tree, node);
    let mut ch = ChannelRecord::new(domain, row, node);

    ch.old_program_nr = data.int("ChNum");
    ch.new_program_nr = ch.old_program_nr;

    ch.raw_name = data.get("ChName").map(str::to_string);
    ch.name = codec.decode_opt(ch.raw_name.as_deref()).unwrap_or_default();

    if domain == TunerDomain::Satellite {
        ch.raw_satellite = data.get("SatName").map(str::to_string);
        ch.satellite = codec.decode_opt(ch.raw_satellite.as_deref());
    }

    ch.lock = data.is("ChLock", "true");
    ch.hidden = data.is("UserHide", "1") || data.is("SysHide", "1");

    let fav = data.is("Fav", "true");
    ch.old_fav_index = if fav { ch.old_program_nr } else { UNSET };
    ch.fav_index = ch.old_fav_index;

    ch.original_network_id = data.int("OnId");
    ch.transport_stream_id = data.int("TsId");
    ch.service_id = data.int("SvcId");
    ch.freq_mhz = data.get("Freq").and_then(parse_decimal).unwrap_or(0.0);
    ch.service_kind = data
        .get("SvcType")
        .map(ServiceKind::from_field)
        .unwrap_or_default();
    ch.service_type = ch.service_kind.service_type();
    ch.symbol_rate = data.int("SymRate");
    ch.polarity = data.get("Polarity").map(Polarity::from_field);

    if domain != TunerDomain::Satellite {
        ch.channel_or_transponder = lookup
            .channel_label(domain, ch.freq_mhz)
            .unwrap_or_default();
    }

    ch
}

/// Lenient integer parse: `0x` prefixed hex or decimal, anything else is 0.
pub fn parse_int(text: &str) -> i32 {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map(|v| v as i32).unwrap_or(0);
    }
    text.parse().unwrap_or(0)
}

/// Decimal parse with `.` as the decimal point; no exponents, no grouping.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !valid {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{EuropeanBandPlan, NoLookup};

    const CABLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\r\n<ChannelMap>\r\n  <ChannelData>\r\n    <ChannelCount>3</ChannelCount>\r\n    <Channel>\r\n      <ChNum>5</ChNum>\r\n      <ChName>0x41 0x00 0x52 0x00 0x44 0x00</ChName>\r\n      <ChLock>true</ChLock>\r\n      <UserHide>0</UserHide>\r\n      <SysHide>1</SysHide>\r\n      <Fav>true</Fav>\r\n      <OnId>1</OnId>\r\n      <TsId>1051</TsId>\r\n      <SvcId>28106</SvcId>\r\n      <Freq>346.000</Freq>\r\n      <SvcType>TV</SvcType>\r\n      <SymRate>6900</SymRate>\r\n    </Channel>\r\n    <Channel>\r\n      <chnum>7</chnum>\r\n      <ChName>Plain</ChName>\r\n      <SvcType>RADIO</SvcType>\r\n      <Fav>false</Fav>\r\n    </Channel>\r\n    <Channel>\r\n    </Channel>\r\n  </ChannelData>\r\n</ChannelMap>";

    #[test]
    fn test_load_cable_channels() {
        let (doc, channels) =
            load(TunerDomain::Cable, CABLE, &NameCodec::default(), &EuropeanBandPlan).unwrap();
        assert_eq!(doc.newline, Newline::CrLf);
        assert_eq!(channels.len(), 3);

        let ard = &channels[0];
        assert_eq!(ard.record_index, 0);
        assert_eq!(ard.old_program_nr, 5);
        assert_eq!(ard.new_program_nr, 5);
        assert_eq!(ard.name, "ARD");
        assert_eq!(ard.raw_name.as_deref(), Some("0x41 0x00 0x52 0x00 0x44 0x00"));
        assert!(ard.lock);
        assert!(ard.hidden, "SysHide counts as hidden");
        assert_eq!(ard.old_fav_index, 5);
        assert_eq!(ard.fav_index, 5);
        assert_eq!(ard.transport_stream_id, 1051);
        assert_eq!(ard.service_id, 28106);
        assert_eq!(ard.freq_mhz, 346.0);
        assert_eq!(ard.service_kind, ServiceKind::Tv);
        assert_eq!(ard.service_type, 1);
        assert_eq!(ard.symbol_rate, 6900);
        assert_eq!(ard.channel_or_transponder, "S26");
        assert_eq!(ard.satellite, None);

        let radio = &channels[1];
        assert_eq!(radio.unique_id, 1);
        assert_eq!(radio.old_program_nr, 7, "field names are case-insensitive");
        assert_eq!(radio.name, "Plain");
        assert_eq!(radio.service_kind, ServiceKind::Radio);
        assert_eq!(radio.fav_index, UNSET);
    }

    #[test]
    fn test_missing_fields_default() {
        let (_, channels) =
            load(TunerDomain::Cable, CABLE, &NameCodec::default(), &NoLookup).unwrap();
        let empty = &channels[2];
        assert_eq!(empty.old_program_nr, 0);
        assert_eq!(empty.freq_mhz, 0.0);
        assert_eq!(empty.service_kind, ServiceKind::Data);
        assert_eq!(empty.raw_name, None);
        assert_eq!(empty.name, "");
        assert_eq!(empty.polarity, None);
        assert!(!empty.lock && !empty.hidden);
    }

    #[test]
    fn test_frequency_outside_band_plan_has_no_label() {
        let text = "<ChannelMap><ChannelData><ChannelCount>1</ChannelCount><Channel><ChNum>1</ChNum><Freq>99999999999</Freq></Channel></ChannelData></ChannelMap>";
        for domain in [TunerDomain::Terrestrial, TunerDomain::Cable] {
            let (_, channels) =
                load(domain, text, &NameCodec::default(), &EuropeanBandPlan).unwrap();
            assert_eq!(channels[0].freq_mhz, 99_999_999_999.0);
            assert_eq!(channels[0].channel_or_transponder, "");
        }
    }

    #[test]
    fn test_satellite_fields() {
        let text = "<ChannelMap><ChannelData><ChannelCount>1</ChannelCount><Channel><ChNum>x1</ChNum><SatName>0x41 0x00 0x53 0x00 0x54 0x00 0x52 0x00 0x41 0x00</SatName><Polarity>HORIZONTAL</Polarity><Freq>11493,75</Freq><UserHide>1</UserHide></Channel></ChannelData></ChannelMap>";
        let (doc, channels) =
            load(TunerDomain::Satellite, text, &NameCodec::default(), &EuropeanBandPlan).unwrap();
        assert_eq!(doc.newline, Newline::Lf);
        let ch = &channels[0];
        assert_eq!(ch.old_program_nr, 0, "non-numeric yields zero");
        assert_eq!(ch.satellite.as_deref(), Some("ASTRA"));
        assert_eq!(ch.polarity, Some(Polarity::Horizontal));
        assert_eq!(ch.freq_mhz, 0.0, "comma is not a decimal point");
        assert!(ch.hidden);
        assert_eq!(ch.channel_or_transponder, "");
    }

    #[test]
    fn test_structure_errors() {
        let codec = NameCodec::default();
        for text in [
            "<ChannelMap><ChannelData>",
            "<?xml version=\"1.0\"?><Other><ChannelData/></Other>",
            "<?xml version=\"1.0\"?><!--c--><ChannelMap><ChannelData/></ChannelMap>",
            "<ChannelMap><Data/></ChannelMap>",
        ] {
            let err = load(TunerDomain::Terrestrial, text, &codec, &NoLookup).unwrap_err();
            assert!(
                matches!(err, ChanMapError::Format { domain: TunerDomain::Terrestrial, .. }),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int(" 7 "), 7);
        assert_eq!(parse_int("-3"), -3);
        assert_eq!(parse_int("0x1F"), 31);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int("1.5"), 0);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("474.000"), Some(474.0));
        assert_eq!(parse_decimal("11493.75"), Some(11493.75));
        assert_eq!(parse_decimal("482"), Some(482.0));
        assert_eq!(parse_decimal("1e3"), None);
        assert_eq!(parse_decimal("1,5"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("."), None);
        assert_eq!(parse_decimal(""), None);
    }
}
