//! Flattening of the bucket hierarchy onto LMDB keys
//!
//! Every entry (leaf or nested bucket marker) is stored under the
//! concatenation of its escaped path segments followed by its escaped key.
//! Escaping maps `0x00` to `0x00 0xFF` and terminates each segment with
//! `0x00 0x01`, which keeps the encoding prefix-free and order-preserving:
//! the direct children of a bucket sort by raw key bytes, exactly as the
//! unflattened bucket would.

use keystone_core::BucketPath;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// Value tag for a leaf record
pub const TAG_LEAF: u8 = 0x00;
/// Value tag for a nested bucket marker
pub const TAG_BUCKET: u8 = 0x01;

/// Append one escaped, terminated segment
pub fn push_segment(out: &mut Vec<u8>, segment: &[u8]) {
    for &b in segment {
        if b == ESCAPE {
            out.push(ESCAPE);
            out.push(ESCAPED_ZERO);
        } else {
            out.push(b);
        }
    }
    out.push(ESCAPE);
    out.push(TERMINATOR);
}

/// Prefix shared by every entry inside `path` (and its descendants)
pub fn bucket_prefix(path: &BucketPath) -> Vec<u8> {
    let mut out = Vec::new();
    for segment in path.segments() {
        push_segment(&mut out, segment);
    }
    out
}

/// LMDB key of the marker that records `path` as a bucket
pub fn bucket_marker_key(path: &BucketPath) -> Vec<u8> {
    bucket_prefix(path)
}

/// LMDB key of `key` inside `path`
pub fn entry_key(path: &BucketPath, key: &[u8]) -> Vec<u8> {
    let mut out = bucket_prefix(path);
    push_segment(&mut out, key);
    out
}

/// Decode a run of escaped segments
///
/// Returns `None` if the bytes are not a well-formed encoding.
pub fn decode_segments(mut bytes: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut segments = Vec::new();
    while !bytes.is_empty() {
        let mut segment = Vec::new();
        loop {
            match bytes {
                [ESCAPE, TERMINATOR, rest @ ..] => {
                    bytes = rest;
                    break;
                }
                [ESCAPE, ESCAPED_ZERO, rest @ ..] => {
                    segment.push(ESCAPE);
                    bytes = rest;
                }
                [ESCAPE, ..] | [] => return None,
                [b, rest @ ..] => {
                    segment.push(*b);
                    bytes = rest;
                }
            }
        }
        segments.push(segment);
    }
    Some(segments)
}
