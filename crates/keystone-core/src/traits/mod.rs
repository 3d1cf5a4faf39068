pub mod bucket;

pub use bucket::{BucketStore, BucketTxn};
