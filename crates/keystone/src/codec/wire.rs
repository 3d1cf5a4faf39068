//! Big-endian primitives shared by the record codecs
//!
//! Variable-length byte fields carry a `u16` length prefix; lists carry a
//! `u32` element count.

use keystone_core::{DecodeErrorKind, KeystoneError, Result};

/// Cursor over an encoded record
pub struct Reader<'a> {
    record: &'static str,
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(record: &'static str, bytes: &'a [u8]) -> Self {
        Self { record, bytes }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn take(&mut self, n: usize, field: &str) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return Err(KeystoneError::decode(
                self.record,
                DecodeErrorKind::Truncated,
                format!(
                    "{} needs {} bytes, {} left",
                    field,
                    n,
                    self.bytes.len()
                ),
            ));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16(&mut self, field: &str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_bool(&mut self, field: &str) -> Result<bool> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.invalid(field, format!("expected 0 or 1, got {}", other))),
        }
    }

    pub fn read_var_bytes(&mut self, field: &str) -> Result<Vec<u8>> {
        let len = self.read_u16(field)? as usize;
        Ok(self.take(len, field)?.to_vec())
    }

    pub fn read_string(&mut self, field: &str) -> Result<String> {
        let bytes = self.read_var_bytes(field)?;
        String::from_utf8(bytes).map_err(|e| self.invalid(field, e.to_string()))
    }

    /// Error for a field whose bytes were present but meaningless
    pub fn invalid(&self, field: &str, detail: impl std::fmt::Display) -> KeystoneError {
        KeystoneError::decode(
            self.record,
            DecodeErrorKind::InvalidField,
            format!("{}: {}", field, detail),
        )
    }

    /// Fail if any bytes are left unread
    pub fn finish(self) -> Result<()> {
        if !self.bytes.is_empty() {
            return Err(KeystoneError::decode(
                self.record,
                DecodeErrorKind::TrailingBytes,
                format!("{} unread bytes", self.bytes.len()),
            ));
        }
        Ok(())
    }
}

/// Growable output buffer for an encoded record
pub struct Writer {
    record: &'static str,
    buf: Vec<u8>,
}

impl Writer {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            buf: Vec::new(),
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u8(v as u8);
    }

    pub fn put_var_bytes(&mut self, field: &str, bytes: &[u8]) -> Result<()> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            KeystoneError::encode(
                self.record,
                format!("{} is {} bytes, limit is {}", field, bytes.len(), u16::MAX),
            )
        })?;
        self.put_u16(len);
        self.put_slice(bytes);
        Ok(())
    }

    /// Write a list element count
    pub fn put_count(&mut self, field: &str, count: usize) -> Result<()> {
        let count = u32::try_from(count).map_err(|_| {
            KeystoneError::encode(self.record, format!("{} has too many elements", field))
        })?;
        self.put_u32(count);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
