//! Load and save of a complete channel list structure.

use std::path::Path;

use encoding_rs::Encoding;
use log::{error, info, warn};

use crate::converter::{read_channel_xml, write_channel_xml, ConverterBridge};
use crate::document::{self, TunerDocument};
use crate::error::Result;
use crate::locator::{self, ChannelListLayout, Snapshot};
use crate::lookup::FrequencyLookup;
use crate::name_codec::NameCodec;
use crate::patcher;
use crate::types::{ChannelList, Features, TunerDomain};

/// All three tuner domains of one channel list structure.
#[derive(Debug)]
pub struct ChannelMap {
    layout: ChannelListLayout,
    codec: NameCodec,
    features: Features,
    documents: Vec<TunerDocument>,
    lists: Vec<ChannelList>,
}

impl ChannelMap {
    /// Locate the structure at `path` and load every domain through `bridge`.
    pub fn load(
        path: &Path,
        bridge: &dyn ConverterBridge,
        lookup: &dyn FrequencyLookup,
        codec: NameCodec,
    ) -> Result<Self> {
        let layout = locator::locate(path)?;

        let mut documents = Vec::with_capacity(TunerDomain::ALL.len());
        let mut lists = Vec::with_capacity(TunerDomain::ALL.len());
        for domain in TunerDomain::ALL {
            let dir = layout.domain_dir(domain);
            let xml = read_channel_xml(bridge, domain, &dir)?;
            let (doc, channels) = document::load(domain, &xml, &codec, lookup)?;

            let mut list = ChannelList::new(domain);
            list.channels = channels;
            info!("{}: {} channels", list.caption, list.len());

            documents.push(doc);
            lists.push(list);
        }

        Ok(Self {
            layout,
            codec,
            features: Features::default(),
            documents,
            lists,
        })
    }

    pub fn layout(&self) -> &ChannelListLayout {
        &self.layout
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn codec(&self) -> &NameCodec {
        &self.codec
    }

    pub fn lists(&self) -> &[ChannelList] {
        &self.lists
    }

    pub fn lists_mut(&mut self) -> &mut [ChannelList] {
        &mut self.lists
    }

    pub fn list(&self, domain: TunerDomain) -> Option<&ChannelList> {
        self.lists.iter().find(|l| l.domain == domain)
    }

    pub fn list_mut(&mut self, domain: TunerDomain) -> Option<&mut ChannelList> {
        self.lists.iter_mut().find(|l| l.domain == domain)
    }

    pub fn document(&self, domain: TunerDomain) -> Option<&TunerDocument> {
        self.documents.iter().find(|d| d.domain == domain)
    }

    /// Switch the text encoding and re-decode all names from their raw text.
    ///
    /// Encodings that cannot write names back are rejected and leave the
    /// map unchanged.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) -> Result<()> {
        if encoding == self.codec.encoding() {
            return Ok(());
        }
        let codec = NameCodec::try_new(encoding)?;
        info!("Changing name encoding to {}", encoding.name());
        self.codec = codec;
        for list in &mut self.lists {
            for ch in &mut list.channels {
                // a pending rename is dropped; the name is the raw text again
                ch.name = self.codec.decode_opt(ch.raw_name.as_deref()).unwrap_or_default();
                ch.is_name_modified = false;
                ch.satellite = self.codec.decode_opt(ch.raw_satellite.as_deref());
            }
        }
        Ok(())
    }

    /// Patch and serialize every document without writing anything.
    pub fn render(&mut self) -> Vec<(TunerDomain, String)> {
        let codec = self.codec;
        let mut out = Vec::with_capacity(self.documents.len());
        for doc in &mut self.documents {
            if let Some(list) = self.lists.iter().find(|l| l.domain == doc.domain) {
                patcher::patch(doc, &list.channels, &codec);
            }
            out.push((doc.domain, doc.serialize()));
        }
        out
    }

    /// Write all domains back through `bridge`.
    ///
    /// All documents are serialized before the first converter call. If a
    /// converter fails, the files below the layout root are restored to
    /// their state before the save.
    pub fn save(&mut self, bridge: &dyn ConverterBridge) -> Result<()> {
        let rendered = self.render();
        let snapshot = Snapshot::capture(&self.layout)?;

        for (domain, xml) in &rendered {
            let dir = self.layout.domain_dir(*domain);
            if let Err(e) = write_channel_xml(bridge, *domain, &dir, xml) {
                error!("Saving {} failed, restoring {} files", domain, snapshot.len());
                if let Err(restore_err) = snapshot.restore() {
                    warn!("Restore incomplete: {}", restore_err);
                }
                return Err(e);
            }
        }

        info!("Saved channel lists to {}", self.layout.root.display());
        Ok(())
    }
}
