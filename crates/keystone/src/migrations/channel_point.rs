//! v2: give every invoice a channel point
//!
//! Payments embed the invoice they paid, so both buckets are rewritten. The
//! new field is the zero channel point.

use super::reencode_records;
use crate::codec::{Invoice, OutgoingPayment};
use crate::migration::Migration;
use crate::schema;
use crate::version::INVOICE_CHANNEL_POINT_VERSION;
use keystone_core::{observe, BucketTxn, Result};

pub struct InvoiceChannelPoint;

impl Migration for InvoiceChannelPoint {
    fn version(&self) -> u32 {
        INVOICE_CHANNEL_POINT_VERSION
    }

    fn name(&self) -> &str {
        "invoice_channel_point"
    }

    fn apply(&self, txn: &mut dyn BucketTxn) -> Result<()> {
        let from = INVOICE_CHANNEL_POINT_VERSION - 1;
        let to = INVOICE_CHANNEL_POINT_VERSION;

        let payments = schema::payment_bucket();
        if txn.bucket_exists(&payments)? {
            tracing::info!("Migrating outgoing payments to new invoice format");
            let count = reencode_records::<OutgoingPayment, _>(txn, &payments, from, to, |_| {})?;
            observe::record_records_migrated("payments", count);
            tracing::info!("Re-encoded {} payments", count);
        }

        let invoices = schema::invoice_bucket();
        if txn.bucket_exists(&invoices)? {
            tracing::info!("Migrating invoices to new invoice format");
            let count = reencode_records::<Invoice, _>(txn, &invoices, from, to, |_| {})?;
            observe::record_records_migrated("invoices", count);
            tracing::info!("Re-encoded {} invoices", count);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ChannelPoint, RecordCodec};
    use keystone_core::{BucketStore, DecodeErrorKind, KeystoneError, MemoryStore};

    fn invoice(memo: &str) -> Invoice {
        Invoice {
            creation_date: 1_500_000_000,
            settle_date: 0,
            memo: memo.as_bytes().to_vec(),
            receipt: Vec::new(),
            payment_request: b"lnbc1".to_vec(),
            preimage: [9; 32],
            value_msat: 42_000,
            settled: false,
            channel_point: ChannelPoint::default(),
        }
    }

    #[test]
    fn test_missing_buckets_are_noop() {
        let store = MemoryStore::new();
        let mut txn = store.write_txn().unwrap();
        InvoiceChannelPoint.apply(&mut txn).unwrap();
        txn.commit().unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_invoices_upgraded_and_sub_buckets_skipped() {
        let store = MemoryStore::new();
        let invoices = schema::invoice_bucket();
        let mut txn = store.write_txn().unwrap();
        txn.create_bucket_if_absent(&invoices).unwrap();
        txn.create_bucket_if_absent(&invoices.child("invoice-index")).unwrap();
        txn.put(&invoices, b"\x00\x00\x00\x01", &invoice("coffee").encode(1).unwrap())
            .unwrap();

        InvoiceChannelPoint.apply(&mut txn).unwrap();

        let raw = txn.get(&invoices, b"\x00\x00\x00\x01").unwrap().unwrap();
        let upgraded = Invoice::decode(&raw, 2).unwrap();
        assert_eq!(upgraded, invoice("coffee"));
        assert!(upgraded.channel_point.is_zero());
        assert!(txn.bucket_exists(&invoices.child("invoice-index")).unwrap());
    }

    #[test]
    fn test_bad_invoice_fails_step() {
        let store = MemoryStore::new();
        let invoices = schema::invoice_bucket();
        let mut txn = store.write_txn().unwrap();
        txn.create_bucket_if_absent(&invoices).unwrap();
        txn.put(&invoices, b"k", &[0; 5]).unwrap();

        let err = InvoiceChannelPoint.apply(&mut txn).unwrap_err();
        assert!(matches!(
            err,
            KeystoneError::Decode {
                record: "invoice",
                kind: DecodeErrorKind::Truncated,
                ..
            }
        ));
    }
}
