//! Forwarding log events, keyed by their 8-byte big-endian timestamp
//!
//! Version 3 added an outcome type and a failure code. Before that only
//! successful forwards were logged.

use super::{RecordCodec, Reader, Writer};
use crate::version::FORWARD_EVENT_TYPE_VERSION;
use keystone_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ForwardEventType {
    #[default]
    Success = 0,
    Failure = 1,
}

impl ForwardEventType {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ForwardEventType::Success),
            1 => Some(ForwardEventType::Failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingEvent {
    pub incoming_chan_id: u64,
    pub outgoing_chan_id: u64,
    pub amt_in_msat: u64,
    pub amt_out_msat: u64,
    /// Present in the encoding from version 3 on
    pub event_type: ForwardEventType,
    /// Present in the encoding from version 3 on; zero for successes
    pub fail_code: u16,
}

impl RecordCodec for ForwardingEvent {
    const RECORD: &'static str = "forwarding event";

    fn read_from(r: &mut Reader<'_>, version: u32) -> Result<Self> {
        let mut event = Self {
            incoming_chan_id: r.read_u64("incoming channel")?,
            outgoing_chan_id: r.read_u64("outgoing channel")?,
            amt_in_msat: r.read_u64("amount in")?,
            amt_out_msat: r.read_u64("amount out")?,
            event_type: ForwardEventType::default(),
            fail_code: 0,
        };

        if version >= FORWARD_EVENT_TYPE_VERSION {
            let raw = r.read_u8("event type")?;
            event.event_type = ForwardEventType::from_u8(raw)
                .ok_or_else(|| r.invalid("event type", format!("unknown type {}", raw)))?;
            event.fail_code = r.read_u16("fail code")?;
        }

        Ok(event)
    }

    fn write_to(&self, w: &mut Writer, version: u32) -> Result<()> {
        w.put_u64(self.incoming_chan_id);
        w.put_u64(self.outgoing_chan_id);
        w.put_u64(self.amt_in_msat);
        w.put_u64(self.amt_out_msat);

        if version >= FORWARD_EVENT_TYPE_VERSION {
            w.put_u8(self.event_type as u8);
            w.put_u16(self.fail_code);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::INVOICE_CHANNEL_POINT_VERSION;
    use keystone_core::{DecodeErrorKind, KeystoneError};

    fn sample() -> ForwardingEvent {
        ForwardingEvent {
            incoming_chan_id: 11,
            outgoing_chan_id: 22,
            amt_in_msat: 10_001_000,
            amt_out_msat: 10_000_000,
            event_type: ForwardEventType::Success,
            fail_code: 0,
        }
    }

    #[test]
    fn test_old_layout_has_no_type() {
        let old = sample().encode(INVOICE_CHANNEL_POINT_VERSION).unwrap();
        assert_eq!(old.len(), 32);
        let new = sample().encode(FORWARD_EVENT_TYPE_VERSION).unwrap();
        assert_eq!(new.len(), 35);
    }

    #[test]
    fn test_failure_round_trip() {
        let mut event = sample();
        event.event_type = ForwardEventType::Failure;
        event.fail_code = 0x400f;
        let bytes = event.encode(FORWARD_EVENT_TYPE_VERSION).unwrap();
        assert_eq!(
            ForwardingEvent::decode(&bytes, FORWARD_EVENT_TYPE_VERSION).unwrap(),
            event
        );
    }

    #[test]
    fn test_unknown_event_type() {
        let mut bytes = sample().encode(FORWARD_EVENT_TYPE_VERSION).unwrap();
        bytes[32] = 9;
        assert!(matches!(
            ForwardingEvent::decode(&bytes, FORWARD_EVENT_TYPE_VERSION),
            Err(KeystoneError::Decode {
                kind: DecodeErrorKind::InvalidField,
                ..
            })
        ));
    }

    #[test]
    fn test_future_version_unsupported() {
        let bytes = sample().encode(FORWARD_EVENT_TYPE_VERSION).unwrap();
        assert!(matches!(
            ForwardingEvent::decode(&bytes, FORWARD_EVENT_TYPE_VERSION + 1),
            Err(KeystoneError::Decode {
                kind: DecodeErrorKind::UnsupportedVersion,
                ..
            })
        ));
    }
}
