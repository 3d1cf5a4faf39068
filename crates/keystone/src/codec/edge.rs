//! Channel edge policies
//!
//! An edge policy is keyed by `node pub key (33) || channel id (8)`. The
//! signature comes first and has a variable length, so the update time has
//! no fixed offset: reading it means decoding the whole policy.

use super::node::NODE_PUB_KEY_LEN;
use super::{RecordCodec, Reader, Writer};
use keystone_core::Result;

/// Width of an edge policy key: node key followed by channel id
pub const EDGE_KEY_LEN: usize = NODE_PUB_KEY_LEN + 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePolicy {
    pub signature: Vec<u8>,
    pub channel_id: u64,
    /// Unix seconds of the last policy update
    pub last_update: u64,
    pub message_flags: u8,
    pub channel_flags: u8,
    pub time_lock_delta: u16,
    pub min_htlc_msat: u64,
    pub fee_base_msat: u64,
    pub fee_rate_ppm: u64,
    pub to_node: [u8; NODE_PUB_KEY_LEN],
}

impl RecordCodec for EdgePolicy {
    const RECORD: &'static str = "edge policy";

    fn read_from(r: &mut Reader<'_>, _version: u32) -> Result<Self> {
        Ok(Self {
            signature: r.read_var_bytes("signature")?,
            channel_id: r.read_u64("channel id")?,
            last_update: r.read_u64("last update")?,
            message_flags: r.read_u8("message flags")?,
            channel_flags: r.read_u8("channel flags")?,
            time_lock_delta: r.read_u16("time lock delta")?,
            min_htlc_msat: r.read_u64("min htlc")?,
            fee_base_msat: r.read_u64("fee base")?,
            fee_rate_ppm: r.read_u64("fee rate")?,
            to_node: r.read_array("to node")?,
        })
    }

    fn write_to(&self, w: &mut Writer, _version: u32) -> Result<()> {
        w.put_var_bytes("signature", &self.signature)?;
        w.put_u64(self.channel_id);
        w.put_u64(self.last_update);
        w.put_u8(self.message_flags);
        w.put_u8(self.channel_flags);
        w.put_u16(self.time_lock_delta);
        w.put_u64(self.min_htlc_msat);
        w.put_u64(self.fee_base_msat);
        w.put_u64(self.fee_rate_ppm);
        w.put_slice(&self.to_node);
        Ok(())
    }
}

/// Split an edge key into its node key and big-endian channel id
pub fn split_edge_key(key: &[u8]) -> Option<(&[u8], [u8; 8])> {
    if key.len() != EDGE_KEY_LEN {
        return None;
    }
    let (node, chan_id) = key.split_at(NODE_PUB_KEY_LEN);
    Some((node, chan_id.try_into().ok()?))
}
