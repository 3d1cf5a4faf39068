//! v3: classify forwarding events
//!
//! Only successful forwards were logged before events had a type, so every
//! existing event becomes a success with no failure code.

use crate::codec::{self, ForwardingEvent, RecordCodec};
use crate::index_key::HexKey;
use crate::migration::Migration;
use crate::scanner::for_each_entry;
use crate::schema;
use crate::version::FORWARD_EVENT_TYPE_VERSION;
use keystone_core::{observe, BucketTxn, KeystoneError, Result};

pub struct ForwardEventTypeBackfill;

impl Migration for ForwardEventTypeBackfill {
    fn version(&self) -> u32 {
        FORWARD_EVENT_TYPE_VERSION
    }

    fn name(&self) -> &str {
        "forward_event_type"
    }

    fn apply(&self, txn: &mut dyn BucketTxn) -> Result<()> {
        let log = schema::forwarding_log();
        if !txn.bucket_exists(&log)? {
            tracing::info!("No forwarding log, nothing to migrate");
            return Ok(());
        }

        tracing::info!("Adding event type to forwarding events");
        let from = FORWARD_EVENT_TYPE_VERSION - 1;
        let count = for_each_entry(txn, &log, |txn, key, value| {
            // Every entry of the log is an event
            let value = value.ok_or_else(|| {
                KeystoneError::Structural(format!(
                    "nested bucket {} inside the forwarding log",
                    HexKey(key)
                ))
            })?;

            let mut event = ForwardingEvent::decode(value, from)?;
            event.event_type = codec::ForwardEventType::Success;
            event.fail_code = 0;
            txn.put(&log, key, &event.encode(FORWARD_EVENT_TYPE_VERSION)?)
        })?;

        observe::record_records_migrated("forwarding_events", count);
        tracing::info!("Migrated {} forwarding events", count);
        Ok(())
    }
}
