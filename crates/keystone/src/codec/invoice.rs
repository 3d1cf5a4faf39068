//! Invoices
//!
//! Version 2 appended the channel point the invoice was settled over.
//! Invoices written before then decode with the zero channel point.

use super::{RecordCodec, Reader, Writer};
use crate::version::INVOICE_CHANNEL_POINT_VERSION;
use keystone_core::Result;

/// Funding outpoint of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPoint {
    pub txid: [u8; 32],
    pub output_index: u32,
}

impl ChannelPoint {
    pub fn is_zero(&self) -> bool {
        *self == ChannelPoint::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// Unix seconds
    pub creation_date: u64,
    /// Unix seconds, zero while unsettled
    pub settle_date: u64,
    pub memo: Vec<u8>,
    pub receipt: Vec<u8>,
    pub payment_request: Vec<u8>,
    pub preimage: [u8; 32],
    pub value_msat: u64,
    pub settled: bool,
    /// Present in the encoding from version 2 on
    pub channel_point: ChannelPoint,
}

impl RecordCodec for Invoice {
    const RECORD: &'static str = "invoice";

    fn read_from(r: &mut Reader<'_>, version: u32) -> Result<Self> {
        let mut invoice = Self {
            creation_date: r.read_u64("creation date")?,
            settle_date: r.read_u64("settle date")?,
            memo: r.read_var_bytes("memo")?,
            receipt: r.read_var_bytes("receipt")?,
            payment_request: r.read_var_bytes("payment request")?,
            preimage: r.read_array("preimage")?,
            value_msat: r.read_u64("value")?,
            settled: r.read_bool("settled")?,
            channel_point: ChannelPoint::default(),
        };

        if version >= INVOICE_CHANNEL_POINT_VERSION {
            invoice.channel_point = ChannelPoint {
                txid: r.read_array("channel point txid")?,
                output_index: r.read_u32("channel point index")?,
            };
        }

        Ok(invoice)
    }

    fn write_to(&self, w: &mut Writer, version: u32) -> Result<()> {
        w.put_u64(self.creation_date);
        w.put_u64(self.settle_date);
        w.put_var_bytes("memo", &self.memo)?;
        w.put_var_bytes("receipt", &self.receipt)?;
        w.put_var_bytes("payment request", &self.payment_request)?;
        w.put_slice(&self.preimage);
        w.put_u64(self.value_msat);
        w.put_bool(self.settled);

        if version >= INVOICE_CHANNEL_POINT_VERSION {
            w.put_slice(&self.channel_point.txid);
            w.put_u32(self.channel_point.output_index);
        }
        Ok(())
    }
}
