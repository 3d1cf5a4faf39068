//! Outgoing payments
//!
//! A payment embeds the invoice it paid, so its layout follows the invoice
//! layout of the same schema version.

use super::invoice::Invoice;
use super::node::NODE_PUB_KEY_LEN;
use super::{RecordCodec, Reader, Writer};
use keystone_core::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPayment {
    pub invoice: Invoice,
    pub fee_msat: u64,
    /// Hops from the first peer to the destination
    pub path: Vec<[u8; NODE_PUB_KEY_LEN]>,
    pub timelock_height: u32,
    pub payment_preimage: [u8; 32],
}

impl RecordCodec for OutgoingPayment {
    const RECORD: &'static str = "outgoing payment";

    fn read_from(r: &mut Reader<'_>, version: u32) -> Result<Self> {
        let invoice = Invoice::read_from(r, version)?;
        let fee_msat = r.read_u64("fee")?;

        let hops = r.read_u32("path length")? as usize;
        // Each hop needs a full key; a larger count cannot be honest
        if hops > r.remaining() / NODE_PUB_KEY_LEN {
            return Err(r.invalid("path length", format!("{} hops exceed the record", hops)));
        }
        let mut path = Vec::with_capacity(hops);
        for _ in 0..hops {
            path.push(r.read_array("path hop")?);
        }

        Ok(Self {
            invoice,
            fee_msat,
            path,
            timelock_height: r.read_u32("timelock")?,
            payment_preimage: r.read_array("payment preimage")?,
        })
    }

    fn write_to(&self, w: &mut Writer, version: u32) -> Result<()> {
        self.invoice.write_to(w, version)?;
        w.put_u64(self.fee_msat);
        w.put_count("path", self.path.len())?;
        for hop in &self.path {
            w.put_slice(hop);
        }
        w.put_u32(self.timelock_height);
        w.put_slice(&self.payment_preimage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::invoice::ChannelPoint;
    use crate::version::{INVOICE_CHANNEL_POINT_VERSION, NODE_EDGE_UPDATE_INDEX_VERSION};
    use keystone_core::{DecodeErrorKind, KeystoneError};

    fn sample() -> OutgoingPayment {
        OutgoingPayment {
            invoice: Invoice {
                creation_date: 1_546_300_800,
                settle_date: 1_546_300_860,
                memo: b"rent".to_vec(),
                receipt: Vec::new(),
                payment_request: b"lnbc2m1p...".to_vec(),
                preimage: [0; 32],
                value_msat: 200_000_000,
                settled: true,
                channel_point: ChannelPoint::default(),
            },
            fee_msat: 1_010,
            path: vec![[2; NODE_PUB_KEY_LEN], [3; NODE_PUB_KEY_LEN]],
            timelock_height: 560_144,
            payment_preimage: [5; 32],
        }
    }

    #[test]
    fn test_upgrade_preserves_payment_fields() {
        let old = sample().encode(NODE_EDGE_UPDATE_INDEX_VERSION).unwrap();
        let payment = OutgoingPayment::decode(&old, NODE_EDGE_UPDATE_INDEX_VERSION).unwrap();
        let new = payment.encode(INVOICE_CHANNEL_POINT_VERSION).unwrap();
        let upgraded = OutgoingPayment::decode(&new, INVOICE_CHANNEL_POINT_VERSION).unwrap();

        assert_eq!(upgraded, sample());
        assert!(upgraded.invoice.channel_point.is_zero());
    }

    #[test]
    fn test_oversized_path_count_rejected() {
        let mut bytes = sample().encode(INVOICE_CHANNEL_POINT_VERSION).unwrap();
        // Path count follows the v2 invoice and the fee
        let invoice_len = sample()
            .invoice
            .encode(INVOICE_CHANNEL_POINT_VERSION)
            .unwrap()
            .len();
        let at = invoice_len + 8;
        bytes[at..at + 4].copy_from_slice(&u32::MAX.to_be_bytes());

        assert!(matches!(
            OutgoingPayment::decode(&bytes, INVOICE_CHANNEL_POINT_VERSION),
            Err(KeystoneError::Decode {
                kind: DecodeErrorKind::InvalidField,
                ..
            })
        ));
    }
}
