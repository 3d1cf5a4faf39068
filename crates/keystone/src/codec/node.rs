//! Graph node records
//!
//! The layout is identical at every schema version. Its first field is the
//! node's last update time, and the update index relies on that: the index
//! builder reads the timestamp straight out of the encoded bytes.

use super::{RecordCodec, Reader, Writer};
use keystone_core::{DecodeErrorKind, KeystoneError, Result};

/// Width of a node's compressed public key, which is also its bucket key
pub const NODE_PUB_KEY_LEN: usize = 33;

/// Byte offset of `last_update` inside an encoded node
pub const NODE_UPDATE_TIME_OFFSET: usize = 0;
pub const NODE_UPDATE_TIME_LEN: usize = 8;

/// Smallest possible encoding: fixed fields plus three empty var fields
const NODE_MIN_ENCODED_LEN: usize = 8 + NODE_PUB_KEY_LEN + 3 + 2 + 2 + 2;

const _: () = assert!(NODE_UPDATE_TIME_OFFSET + NODE_UPDATE_TIME_LEN <= NODE_MIN_ENCODED_LEN);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Unix seconds of the last announcement
    pub last_update: u64,
    pub pub_key: [u8; NODE_PUB_KEY_LEN],
    pub color: [u8; 3],
    pub alias: String,
    pub features: Vec<u8>,
    pub auth_sig: Vec<u8>,
}

impl RecordCodec for NodeRecord {
    const RECORD: &'static str = "node";

    fn read_from(r: &mut Reader<'_>, _version: u32) -> Result<Self> {
        Ok(Self {
            last_update: r.read_u64("last update")?,
            pub_key: r.read_array("pub key")?,
            color: r.read_array("color")?,
            alias: r.read_string("alias")?,
            features: r.read_var_bytes("features")?,
            auth_sig: r.read_var_bytes("auth sig")?,
        })
    }

    fn write_to(&self, w: &mut Writer, _version: u32) -> Result<()> {
        w.put_u64(self.last_update);
        w.put_slice(&self.pub_key);
        w.put_slice(&self.color);
        w.put_var_bytes("alias", self.alias.as_bytes())?;
        w.put_var_bytes("features", &self.features)?;
        w.put_var_bytes("auth sig", &self.auth_sig)
    }
}

/// Big-endian update time of an encoded node, read without decoding it
pub fn update_time_prefix(encoded: &[u8]) -> Result<[u8; NODE_UPDATE_TIME_LEN]> {
    encoded
        .get(NODE_UPDATE_TIME_OFFSET..NODE_UPDATE_TIME_OFFSET + NODE_UPDATE_TIME_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            KeystoneError::decode(
                NodeRecord::RECORD,
                DecodeErrorKind::Truncated,
                format!("{} bytes cannot hold an update time", encoded.len()),
            )
        })
}
