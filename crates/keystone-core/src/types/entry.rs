/// One direct child of a bucket, as seen by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketEntry {
    pub key: Vec<u8>,

    /// `None` when the key names a nested bucket rather than a leaf record
    pub value: Option<Vec<u8>>,
}

impl BucketEntry {
    pub fn leaf(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn bucket(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn is_bucket(&self) -> bool {
        self.value.is_none()
    }
}
