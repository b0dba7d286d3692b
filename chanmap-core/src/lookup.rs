//! Frequency to channel/transponder label lookup.

use crate::types::TunerDomain;

/// Derives a human readable channel label from a frequency.
pub trait FrequencyLookup {
    /// Returns the label for `freq_mhz`, or `None` if the frequency is not
    /// on a known raster. Satellite frequencies are not looked up.
    fn channel_label(&self, domain: TunerDomain, freq_mhz: f64) -> Option<String>;
}

/// Lookup that never finds a label.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl FrequencyLookup for NoLookup {
    fn channel_label(&self, _domain: TunerDomain, _freq_mhz: f64) -> Option<String> {
        None
    }
}

/// European broadcast band plan (CENELEC / CCIR).
///
/// | Band        | Channels | Raster | Centre of first channel |
/// |-------------|----------|--------|-------------------------|
/// | VHF III     | 5-12     | 7 MHz  | 177.5 MHz               |
/// | Hyperband   | S21-S41  | 8 MHz  | 306 MHz (cable only)    |
/// | UHF IV/V    | 21-69    | 8 MHz  | 474 MHz                 |
#[derive(Debug, Clone, Copy, Default)]
pub struct EuropeanBandPlan;

struct Band {
    first: i32,
    last: i32,
    first_centre: f64,
    raster: f64,
    prefix: &'static str,
}

const VHF_III: Band = Band {
    first: 5,
    last: 12,
    first_centre: 177.5,
    raster: 7.0,
    prefix: "",
};

const HYPERBAND: Band = Band {
    first: 21,
    last: 41,
    first_centre: 306.0,
    raster: 8.0,
    prefix: "S",
};

const UHF: Band = Band {
    first: 21,
    last: 69,
    first_centre: 474.0,
    raster: 8.0,
    prefix: "",
};

impl Band {
    fn channel(&self, freq_mhz: f64) -> Option<i32> {
        let offset = (freq_mhz - self.first_centre) / self.raster;
        // tolerate offsets below half a raster; NaN fails both comparisons
        let span = f64::from(self.last - self.first);
        if !(offset > -0.5 && offset < span + 0.5) {
            return None;
        }
        Some(self.first + offset.round() as i32)
    }

    fn label(&self, freq_mhz: f64) -> Option<String> {
        self.channel(freq_mhz).map(|ch| format!("{}{}", self.prefix, ch))
    }
}

impl EuropeanBandPlan {
    /// DVB-T channel number for a frequency.
    pub fn dvbt_transponder(&self, freq_mhz: f64) -> Option<i32> {
        VHF_III.channel(freq_mhz).or_else(|| UHF.channel(freq_mhz))
    }

    /// DVB-C channel name (`"S25"`, `"34"`, ...) for a frequency.
    pub fn dvbc_channel_name(&self, freq_mhz: f64) -> Option<String> {
        VHF_III
            .label(freq_mhz)
            .or_else(|| HYPERBAND.label(freq_mhz))
            .or_else(|| UHF.label(freq_mhz))
    }
}

impl FrequencyLookup for EuropeanBandPlan {
    fn channel_label(&self, domain: TunerDomain, freq_mhz: f64) -> Option<String> {
        match domain {
            TunerDomain::Terrestrial => self.dvbt_transponder(freq_mhz).map(|ch| ch.to_string()),
            TunerDomain::Cable => self.dvbc_channel_name(freq_mhz),
            TunerDomain::Satellite => None,
        }
    }
}
