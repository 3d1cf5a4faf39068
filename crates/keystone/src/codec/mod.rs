//! Record codecs, parameterized by schema version
//!
//! Each record type knows how its layout changed across schema versions.
//! Migrations decode with the version they start from and encode with the
//! version they produce.

pub mod edge;
pub mod forwarding;
pub mod invoice;
pub mod node;
pub mod payment;
pub mod wire;

pub use edge::{EdgePolicy, EDGE_KEY_LEN};
pub use forwarding::{ForwardEventType, ForwardingEvent};
pub use invoice::{ChannelPoint, Invoice};
pub use node::{NodeRecord, NODE_PUB_KEY_LEN, NODE_UPDATE_TIME_LEN, NODE_UPDATE_TIME_OFFSET};
pub use payment::OutgoingPayment;
pub use wire::{Reader, Writer};

use crate::version::LATEST_VERSION;
use keystone_core::{DecodeErrorKind, KeystoneError, Result};

/// Versioned binary codec for one record type
pub trait RecordCodec: Sized {
    /// Record name used in error messages
    const RECORD: &'static str;

    /// Read the record's fields as laid out at `version`
    fn read_from(r: &mut Reader<'_>, version: u32) -> Result<Self>;

    /// Write the record's fields as laid out at `version`
    fn write_to(&self, w: &mut Writer, version: u32) -> Result<()>;

    /// Decode a complete record; trailing bytes are an error
    fn decode(bytes: &[u8], version: u32) -> Result<Self> {
        if version > LATEST_VERSION {
            return Err(KeystoneError::decode(
                Self::RECORD,
                DecodeErrorKind::UnsupportedVersion,
                format!("no layout for version {}", version),
            ));
        }
        let mut r = Reader::new(Self::RECORD, bytes);
        let record = Self::read_from(&mut r, version)?;
        r.finish()?;
        Ok(record)
    }

    fn encode(&self, version: u32) -> Result<Vec<u8>> {
        if version > LATEST_VERSION {
            return Err(KeystoneError::encode(
                Self::RECORD,
                format!("no layout for version {}", version),
            ));
        }
        let mut w = Writer::new(Self::RECORD);
        self.write_to(&mut w, version)?;
        Ok(w.into_bytes())
    }
}
