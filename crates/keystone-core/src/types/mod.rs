pub mod entry;
pub mod path;

pub use entry::BucketEntry;
pub use path::BucketPath;
