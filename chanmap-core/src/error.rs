//! Error types for loading and saving channel maps.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::TunerDomain;

/// Errors raised while loading or saving a channel map.
#[derive(Error, Debug)]
pub enum ChanMapError {
    /// No vendor channel list directory at the given path.
    #[error("\"{}\" does not contain a Philips channel list", path.display())]
    InputNotFound { path: PathBuf },

    /// A converter library (or one of its entry points) could not be loaded.
    #[error("Required component missing: {component}. Please reinstall it and try again.")]
    ConverterUnavailable { component: String },

    /// The converter ran but returned a nonzero status.
    #[error("{domain} converter failed for \"{}\": {status} (status {code})", path.display())]
    ConverterFailed {
        domain: TunerDomain,
        status: ConverterStatus,
        code: i32,
        path: PathBuf,
    },

    /// The converter output did not parse or lacked the expected structure.
    #[error("{domain} channel list has an invalid format: {reason}")]
    Format { domain: TunerDomain, reason: String },

    /// The channel content names a tuner domain this loader does not know.
    #[error("Unsupported tuner domain: {0}")]
    UnsupportedDomain(String),

    /// The configured text encoding label is not known.
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// The encoding can decode names but not write them back.
    #[error("Text encoding {0} cannot be used to write names")]
    UnsupportedEncoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChanMapError>;

/// Returned by a converter bridge when the converter itself cannot be reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MissingComponent(pub String);

impl From<MissingComponent> for ChanMapError {
    fn from(value: MissingComponent) -> Self {
        ChanMapError::ConverterUnavailable { component: value.0 }
    }
}

/// Decoded converter status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterStatus {
    /// 0
    Success,
    /// -1: the directory holds no channel list for this domain.
    NoChannelList,
    /// 1
    PathNotFound,
    /// 2
    IncorrectFormat,
    /// 3
    IncompatibleVersion,
    /// 4 on read (terrestrial/cable only).
    InvalidProduct,
    /// 4 on write.
    MalformedXml,
    /// Any other nonzero code.
    Unknown(i32),
}

impl ConverterStatus {
    /// Decode a status returned by a binary-to-XML conversion.
    pub fn from_read_code(domain: TunerDomain, code: i32) -> Self {
        match code {
            0 => ConverterStatus::Success,
            -1 => ConverterStatus::NoChannelList,
            1 => ConverterStatus::PathNotFound,
            2 => ConverterStatus::IncorrectFormat,
            3 => ConverterStatus::IncompatibleVersion,
            4 if domain != TunerDomain::Satellite => ConverterStatus::InvalidProduct,
            other => ConverterStatus::Unknown(other),
        }
    }

    /// Decode a status returned by an XML-to-binary conversion.
    pub fn from_write_code(code: i32) -> Self {
        match code {
            0 => ConverterStatus::Success,
            -1 | 1 => ConverterStatus::PathNotFound,
            4 => ConverterStatus::MalformedXml,
            other => ConverterStatus::Unknown(other),
        }
    }

    pub fn is_success(self) -> bool {
        self == ConverterStatus::Success
    }
}

impl fmt::Display for ConverterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterStatus::Success => f.write_str("success"),
            ConverterStatus::NoChannelList => f.write_str("no channel list found"),
            ConverterStatus::PathNotFound => f.write_str("path not found"),
            ConverterStatus::IncorrectFormat => f.write_str("incorrect file format"),
            ConverterStatus::IncompatibleVersion => f.write_str("incompatible version"),
            ConverterStatus::InvalidProduct => f.write_str("channel list is from an invalid product"),
            ConverterStatus::MalformedXml => f.write_str("error in XML string"),
            ConverterStatus::Unknown(_) => f.write_str("unknown error"),
        }
    }
}
