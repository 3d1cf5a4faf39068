//! Bucket layout of the channel store

use keystone_core::BucketPath;

pub const NODE_BUCKET: &[u8] = b"graph-node";
pub const NODE_UPDATE_INDEX_BUCKET: &[u8] = b"graph-node-update-index";
pub const EDGE_BUCKET: &[u8] = b"graph-edge";
pub const EDGE_UPDATE_INDEX_BUCKET: &[u8] = b"edge-update-index";
pub const PAYMENT_BUCKET: &[u8] = b"payments";
pub const INVOICE_BUCKET: &[u8] = b"invoices";
pub const FORWARDING_LOG_BUCKET: &[u8] = b"circuit-fwd-log";

/// Holds the version marker and the migration history
pub const META_BUCKET: &[u8] = b"metadata";
pub const VERSION_KEY: &[u8] = b"dbp";
pub const HISTORY_BUCKET: &[u8] = b"migration-history";

/// Every top-level bucket a fully initialized store has
pub const TOP_LEVEL_BUCKETS: [&[u8]; 6] = [
    NODE_BUCKET,
    EDGE_BUCKET,
    PAYMENT_BUCKET,
    INVOICE_BUCKET,
    FORWARDING_LOG_BUCKET,
    META_BUCKET,
];

pub fn node_bucket() -> BucketPath {
    BucketPath::root(NODE_BUCKET)
}

pub fn node_update_index() -> BucketPath {
    node_bucket().child(NODE_UPDATE_INDEX_BUCKET)
}

pub fn edge_bucket() -> BucketPath {
    BucketPath::root(EDGE_BUCKET)
}

pub fn edge_update_index() -> BucketPath {
    edge_bucket().child(EDGE_UPDATE_INDEX_BUCKET)
}

pub fn payment_bucket() -> BucketPath {
    BucketPath::root(PAYMENT_BUCKET)
}

pub fn invoice_bucket() -> BucketPath {
    BucketPath::root(INVOICE_BUCKET)
}

pub fn forwarding_log() -> BucketPath {
    BucketPath::root(FORWARDING_LOG_BUCKET)
}

pub fn meta_bucket() -> BucketPath {
    BucketPath::root(META_BUCKET)
}

pub fn history_bucket() -> BucketPath {
    meta_bucket().child(HISTORY_BUCKET)
}
