use std::fmt;
use std::io;
use thiserror::Error;

/// Why a record failed to decode.
///
/// Separates "the bytes are damaged" from "the bytes belong to a layout this
/// codec does not speak", so operators can tell corruption from a version
/// mismatch when a migration aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Ran out of bytes before the layout was complete
    Truncated,
    /// Bytes left over after the last field of the layout
    TrailingBytes,
    /// A field held a value outside its domain
    InvalidField,
    /// The codec has no layout for the requested version
    UnsupportedVersion,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeErrorKind::Truncated => "truncated",
            DecodeErrorKind::TrailingBytes => "trailing bytes",
            DecodeErrorKind::InvalidField => "invalid field",
            DecodeErrorKind::UnsupportedVersion => "unsupported version",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum KeystoneError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A bucket could not be created or has an unexpected shape
    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// A leaf operation targeted a nested bucket, or the other way around
    #[error("Incompatible value: {0}")]
    IncompatibleValue(String),

    #[error("Failed to decode {record} ({kind}): {detail}")]
    Decode {
        record: &'static str,
        kind: DecodeErrorKind,
        detail: String,
    },

    #[error("Failed to encode {record}: {detail}")]
    Encode {
        record: &'static str,
        detail: String,
    },

    #[error("Migration v{version} ({name}) failed: {source}")]
    Migration {
        version: u32,
        name: String,
        #[source]
        source: Box<KeystoneError>,
    },

    #[error("Store is at schema version {stored}, newer than the latest known version {latest}")]
    FutureVersion { stored: u32, latest: u32 },

    #[error("Two migrations target version {0}")]
    DuplicateMigration(u32),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl KeystoneError {
    pub fn decode(record: &'static str, kind: DecodeErrorKind, detail: impl Into<String>) -> Self {
        KeystoneError::Decode {
            record,
            kind,
            detail: detail.into(),
        }
    }

    pub fn encode(record: &'static str, detail: impl Into<String>) -> Self {
        KeystoneError::Encode {
            record,
            detail: detail.into(),
        }
    }

    /// Unwrap `Migration` layers down to the error a step actually raised.
    pub fn root_cause(&self) -> &KeystoneError {
        match self {
            KeystoneError::Migration { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, KeystoneError>;
