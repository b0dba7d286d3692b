//! Channel list loader for Philips TV channel maps.
//!
//! The TV stores its channel lists in a proprietary binary structure that
//! is converted to and from XML by three vendor converters (terrestrial,
//! cable, satellite). This crate drives those converters through the
//! [`ConverterBridge`] trait, reads the XML into [`ChannelRecord`]s and
//! writes edits back by patching the original XML tree, so untouched parts
//! of the file stay byte-for-byte identical.
//!
//! ```text
//! chanLst.bin ──locate──▶ ConverterBridge::to_xml ──▶ document::load ──▶ ChannelList
//!                                                                           │ edits
//! ConverterBridge::to_binary ◀── TunerDocument::serialize ◀── patcher::patch ◀┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use chanmap_core::{NameCodec, TunerDomain};
//!
//! let codec = NameCodec::default();
//! assert_eq!(codec.decode("0x41 0x00 0x52 0x00 0x44 0x00"), "ARD");
//! assert_eq!(codec.encode("ZDF"), "0x5A 0x00 0x44 0x00 0x46 0x00");
//!
//! let domain: TunerDomain = "cable".parse().unwrap();
//! assert_eq!(domain.caption(), "DVB-C");
//! ```

pub mod channel_map;
pub mod converter;
pub mod document;
pub mod error;
pub mod locator;
pub mod lookup;
pub mod name_codec;
pub mod patcher;
pub mod types;
pub mod xml;

pub use channel_map::ChannelMap;
pub use converter::{ConverterBridge, XML_BUFFER_SIZE};
pub use document::{Newline, TunerDocument};
pub use error::{ChanMapError, ConverterStatus, MissingComponent, Result};
pub use locator::{locate, ChannelListLayout};
pub use lookup::{EuropeanBandPlan, FrequencyLookup, NoLookup};
pub use name_codec::NameCodec;
pub use types::{
    matches_file_filter, ChannelList, ChannelRecord, DeleteMode, Features, Polarity, ServiceKind,
    TunerDomain, FILE_FILTER, PLUGIN_NAME, UNSET,
};
